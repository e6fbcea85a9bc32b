//! Normalisation of raw field strings into a [`ValidatedRecord`].
//!
//! Nothing here fails: a value that does not survive validation is simply
//! dropped from the record.

use tracing::debug;
use url::Url;

use crate::extractors::{ExtractedFields, Field};

const CURRENCY_PREFIXES: [&str; 1] = ["USD"];

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    /// Surviving values; `price` is normalised to two decimals.
    pub fields: ExtractedFields,
    pub price: Option<f64>,
    /// Every required field is present.
    pub complete: bool,
    pub missing: Vec<Field>,
}

impl ValidatedRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(field)
    }
}

pub fn validate(raw: &ExtractedFields, required: &[Field], base_url: &str) -> ValidatedRecord {
    let mut fields = ExtractedFields::new();
    let mut price = None;

    for (field, value) in raw.iter() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match field {
            Field::Price => match parse_price(value) {
                Some(amount) => {
                    price = Some(amount);
                    fields.set(field, format!("{:.2}", amount));
                }
                None => debug!(raw = value, "price discarded"),
            },
            Field::ImageUrl => {
                fields.set(field, resolve_url(base_url, value));
            }
            _ => {
                fields.set(field, value);
            }
        }
    }

    let missing: Vec<Field> = required
        .iter()
        .copied()
        .filter(|field| !fields.is_set(*field))
        .collect();

    ValidatedRecord {
        fields,
        price,
        complete: missing.is_empty(),
        missing,
    }
}

/// Parses a displayed price such as `$1,295.00` or `USD 88`.
/// Returns `None` unless the result is a finite amount above zero.
pub fn parse_price(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',') && !c.is_whitespace())
        .collect();
    for prefix in CURRENCY_PREFIXES {
        if let Some(rest) = cleaned.strip_prefix(prefix) {
            cleaned = rest.to_string();
        }
    }

    let amount: f64 = cleaned.parse().ok()?;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Makes a relative image reference absolute. Unresolvable input is kept as is.
fn resolve_url(base_url: &str, value: &str) -> String {
    if let Ok(absolute) = Url::parse(value) {
        return absolute.to_string();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(value))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [Field; 3] = [Field::ProductTitle, Field::Price, Field::ImageUrl];

    #[test]
    fn prices_are_normalised() {
        assert_eq!(parse_price("88.00"), Some(88.0));
        assert_eq!(parse_price("$1,295.00"), Some(1295.0));
        assert_eq!(parse_price("USD 49"), Some(49.0));
        assert_eq!(parse_price(" £ 12.5 "), Some(12.5));
        assert_eq!(parse_price("0"), None);
        assert_eq!(parse_price("-3.00"), None);
        assert_eq!(parse_price("call for price"), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn complete_record() {
        let mut raw = ExtractedFields::new();
        raw.set(Field::Brand, "jcrew");
        raw.set(Field::ProductTitle, "  Crewneck sweater ");
        raw.set(Field::Price, "88");
        raw.set(Field::ImageUrl, "/images/29234.jpg");

        let record = validate(&raw, &REQUIRED, "http://www.jcrew.com/mens/PRDOVR~29234/29234.jsp");
        assert!(record.complete);
        assert!(record.missing.is_empty());
        assert_eq!(record.price, Some(88.0));
        assert_eq!(record.get(Field::Price), Some("88.00"));
        assert_eq!(record.get(Field::ProductTitle), Some("Crewneck sweater"));
        assert_eq!(record.get(Field::ImageUrl), Some("http://www.jcrew.com/images/29234.jpg"));
    }

    #[test]
    fn unparseable_price_makes_the_record_partial() {
        let mut raw = ExtractedFields::new();
        raw.set(Field::ProductTitle, "Tee");
        raw.set(Field::Price, "sold out");
        raw.set(Field::ImageUrl, "http://img.example/tee.jpg");
        raw.set(Field::PageTitle, "   ");

        let record = validate(&raw, &REQUIRED, "http://shop.example/");
        assert!(!record.complete);
        assert_eq!(record.missing, [Field::Price]);
        assert_eq!(record.price, None);
        assert_eq!(record.get(Field::PageTitle), None);
    }

    #[test]
    fn nothing_extracted_is_not_an_error() {
        let record = validate(&ExtractedFields::new(), &REQUIRED, "not a url");
        assert!(!record.complete);
        assert!(record.fields.is_empty());
        assert_eq!(record.missing, REQUIRED);
    }
}
