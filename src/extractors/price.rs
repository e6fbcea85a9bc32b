//! Isolation of prices embedded in larger text runs.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::node::{node_text, significant_children, DomNode};

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d[\d,]*(?:\.\d+)?)").unwrap());

/// First number in `input`, as written.
pub fn match_amount(input: &str) -> Option<&str> {
    AMOUNT.find(input).map(|m| m.as_str())
}

/// First `$`-prefixed amount in `input`, without the symbol.
pub fn dollar_amount(input: &str) -> Option<&str> {
    DOLLAR_AMOUNT
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether the last whitespace-separated token of `text` is the item number.
pub fn ends_with_item(text: &str, item_number: &str) -> bool {
    !item_number.is_empty() && text.split_whitespace().last() == Some(item_number)
}

/// Amount following the last `$` of `text`.
fn amount_after_last_dollar(text: &str) -> Option<&str> {
    let idx = text.rfind('$')?;
    match_amount(&text[idx + 1..])
}

/// Price of a cell laid out as `$88.00 item 29234`.
///
/// The trailing item token guards against picking up the price of a related
/// product rendered on the same page. Sale cells look like
/// `was $59.50 <font>select colors $39.99</font> item 29234`; there the
/// current price is the last amount inside the element after the first text.
pub fn item_price(node: DomNode<'_>, item_number: &str) -> Option<String> {
    let mut children = significant_children(node);
    let first = children.next()?;
    let first_text = node_text(first)?.trim();

    let tokens: Vec<&str> = first_text.split_whitespace().collect();
    if tokens.len() > 1 && ends_with_item(first_text, item_number) {
        let idx = first_text.find('$')?;
        return match_amount(&first_text[idx + 1..]).map(str::to_string);
    }

    let last = significant_children(node).last()?;
    let last_text = node_text(last)?;
    if !ends_with_item(last_text, item_number) {
        return None;
    }

    if let Some(old_price) = amount_after_last_dollar(first_text) {
        debug!(item = item_number, old_price, "previous price before markdown");
    }

    let sale = children.next()?;
    let sale_text = significant_children(sale).next().and_then(node_text)?.trim();
    amount_after_last_dollar(sale_text).map(str::to_string)
}
