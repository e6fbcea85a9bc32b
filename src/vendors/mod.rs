//! Declarative per-vendor tables: URL pattern, field rules, required fields
//! and metadata key names. The traversal itself lives in
//! [`crate::extractors`]; vendors differ only in data.

mod anntaylor;
mod burberry;
mod jcrew;

pub use anntaylor::anntaylor;
pub use burberry::burberry;
pub use jcrew::jcrew;

use crate::classifier::VendorPattern;
use crate::extractors::{Field, FieldRule, Locator, NodeTest};

pub const BUILTIN: [&str; 3] = ["jcrew", "burberry", "anntaylor"];

#[derive(Debug, Clone)]
pub struct VendorProfile {
    pub name: String,
    /// Constant written to the `brand` field.
    pub brand: String,
    pub pattern: VendorPattern,
    /// Evaluated in order at every node.
    pub rules: Vec<FieldRule>,
    pub required: Vec<Field>,
    key_overrides: Vec<(Field, String)>,
}

impl VendorProfile {
    pub fn new(name: &str, pattern: VendorPattern) -> Self {
        Self {
            name: name.to_string(),
            brand: name.to_string(),
            pattern,
            rules: vec![page_title_rule()],
            required: vec![Field::ProductTitle, Field::Price, Field::ImageUrl],
            key_overrides: Vec::new(),
        }
    }

    pub fn rule(mut self, field: Field, test: NodeTest, locate: Locator) -> Self {
        self.rules.push(FieldRule::new(field, test, locate));
        self
    }

    pub fn meta_key_for(mut self, field: Field, key: &str) -> Self {
        self.key_overrides.retain(|(f, _)| *f != field);
        self.key_overrides.push((field, key.to_string()));
        self
    }

    /// Metadata key under which `field` is published.
    pub fn meta_key(&self, field: Field) -> &str {
        self.key_overrides
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, key)| key.as_str())
            .unwrap_or_else(|| field.default_key())
    }
}

/// `<title>` text, shared by every vendor.
fn page_title_rule() -> FieldRule {
    FieldRule::new(Field::PageTitle, NodeTest::element("title"), Locator::FirstChildText)
}

/// Looks up a built-in vendor by name.
pub fn by_name(name: &str) -> Option<VendorProfile> {
    match name.trim().to_ascii_lowercase().as_str() {
        "jcrew" => Some(jcrew()),
        "burberry" => Some(burberry()),
        "anntaylor" => Some(anntaylor()),
        _ => None,
    }
}

/// Resolves the enabled vendor names, failing on the first unknown one.
pub fn builtin<S: AsRef<str>>(names: &[S]) -> Result<Vec<VendorProfile>, String> {
    names
        .iter()
        .map(|name| by_name(name.as_ref()).ok_or_else(|| name.as_ref().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_resolves() {
        let profiles = builtin(&BUILTIN).unwrap();
        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, BUILTIN);
        assert_eq!(builtin(&["jcrew", "gap"]).unwrap_err(), "gap");
    }

    #[test]
    fn meta_keys_follow_vendor_overrides() {
        let profile = burberry();
        assert_eq!(profile.meta_key(Field::ItemNumber), "id");
        assert_eq!(profile.meta_key(Field::ProductTitle), "name");
        assert_eq!(profile.meta_key(Field::Price), "price");
        assert_eq!(jcrew().meta_key(Field::ItemNumber), "itemNumber");
    }
}
