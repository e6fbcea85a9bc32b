//! URL classification: decides whether a page is a product page for a vendor
//! and recovers the identifiers embedded in its URL.
//!
//! This runs before any tree walk, so it has to stay cheap; most crawled
//! pages are rejected here.

mod consistency;

use regex::Regex;
use tracing::debug;

pub use consistency::{normalize_slug, ConsistencyRule};

use crate::error::RejectReason;
use crate::page::PageDescriptor;

/// Recognition rule for the product pages of one vendor.
#[derive(Debug, Clone)]
pub struct VendorPattern {
    pub vendor: String,
    pub url_regex: Regex,
    /// Capture groups that must all participate in the match.
    pub identifier_groups: Vec<usize>,
    pub consistency: Option<ConsistencyRule>,
    /// Group holding the item number.
    pub item_group: usize,
    /// Group holding a hyphenated product title, if the URL carries one.
    pub title_group: Option<usize>,
}

impl VendorPattern {
    pub fn new(vendor: impl Into<String>, url_regex: Regex, item_group: usize) -> Self {
        Self {
            vendor: vendor.into(),
            url_regex,
            identifier_groups: vec![item_group],
            consistency: None,
            item_group,
            title_group: None,
        }
    }

    pub fn with_groups(mut self, groups: &[usize]) -> Self {
        self.identifier_groups = groups.to_vec();
        self
    }

    pub fn with_consistency(mut self, rule: ConsistencyRule) -> Self {
        self.consistency = Some(rule);
        self
    }

    pub fn with_title_group(mut self, group: usize) -> Self {
        self.title_group = Some(group);
        self
    }
}

/// Identifiers recovered from a matching URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
    /// Declared groups, in declaration order.
    pub groups: Vec<String>,
    pub item_number: String,
    pub url_title: Option<String>,
}

/// Matches the page's base URL against `pattern`.
///
/// The base URL is used rather than the final URL, which may differ after
/// redirects.
pub fn classify(page: &PageDescriptor, pattern: &VendorPattern) -> Result<Identifiers, RejectReason> {
    let not_product = || RejectReason::NotProductPage {
        vendor: pattern.vendor.clone(),
    };

    let caps = pattern.url_regex.captures(&page.base_url).ok_or_else(not_product)?;

    let groups = pattern
        .identifier_groups
        .iter()
        .map(|&index| caps.get(index).map(|m| m.as_str().to_string()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(not_product)?;

    if let Some(rule) = pattern.consistency {
        let (a, b) = rule.groups();
        let consistent = match (caps.get(a), caps.get(b)) {
            (Some(left), Some(right)) => rule.holds(left.as_str(), right.as_str()),
            _ => false,
        };
        if !consistent {
            debug!(vendor = %pattern.vendor, url = %page.base_url, ?groups, "URL identifiers disagree");
            return Err(RejectReason::InconsistentIdentifiers {
                vendor: pattern.vendor.clone(),
                groups,
            });
        }
    }

    let item_number = caps
        .get(pattern.item_group)
        .map(|m| m.as_str().to_string())
        .ok_or_else(not_product)?;

    let url_title = pattern
        .title_group
        .and_then(|index| caps.get(index))
        .map(|m| m.as_str().replace('-', " "));

    Ok(Identifiers {
        groups,
        item_number,
        url_title,
    })
}
