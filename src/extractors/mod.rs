//! Recursive document walk that fills [`ExtractedFields`] from a vendor's
//! rule table.
//!
//! Every node is visited, even after all fields are set: vendor templates
//! repeat their markers for related products, and only the first occurrence
//! belongs to the page's own product. Rules therefore never overwrite a field
//! that is already set.

mod fields;
mod locator;
mod node;
pub mod price;

use scraper::Html;
use tracing::debug;

pub use fields::{ExtractedFields, Field};
pub use locator::{ChildIndex, Locator};
pub use node::{one_of, AttributeTest, DomNode, NodeKind, NodeTest, ValueTest};

use crate::classifier::Identifiers;
use crate::error::TreeWalkError;
use crate::vendors::VendorProfile;

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Structural marker for one field and where its value lives.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pub test: NodeTest,
    pub locate: Locator,
}

impl FieldRule {
    pub fn new(field: Field, test: NodeTest, locate: Locator) -> Self {
        Self { field, test, locate }
    }
}

/// Result of one walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub fields: ExtractedFields,
    /// Nodes visited, in pre-order.
    pub visited: usize,
}

pub struct TreeExtractor<'p> {
    profile: &'p VendorProfile,
    max_depth: usize,
}

impl<'p> TreeExtractor<'p> {
    pub fn new(profile: &'p VendorProfile) -> Self {
        Self {
            profile,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn extract_document(&self, document: &Html, ids: &Identifiers) -> Result<Extraction, TreeWalkError> {
        self.extract(document.tree.root(), ids)
    }

    /// Walks the whole subtree under `root`. Only values found in the tree are
    /// returned; `ids` supplies the item number the price rules check against.
    pub fn extract(&self, root: DomNode<'_>, ids: &Identifiers) -> Result<Extraction, TreeWalkError> {
        let mut fields = ExtractedFields::new();
        let mut visited = 0;
        self.walk(root, 0, &ids.item_number, &mut fields, &mut visited)?;

        Ok(Extraction { fields, visited })
    }

    fn walk(
        &self,
        node: DomNode<'_>,
        depth: usize,
        item_number: &str,
        fields: &mut ExtractedFields,
        visited: &mut usize,
    ) -> Result<(), TreeWalkError> {
        if depth > self.max_depth {
            return Err(TreeWalkError::TooDeep {
                max_depth: self.max_depth,
            });
        }
        *visited += 1;

        for rule in &self.profile.rules {
            if fields.is_set(rule.field) || !rule.test.matches(node, item_number) {
                continue;
            }
            match rule.locate.locate(node, item_number) {
                Some(value) if !value.trim().is_empty() => {
                    debug!(vendor = %self.profile.name, item = item_number, field = %rule.field, value = %value, "field found");
                    fields.set(rule.field, value);
                }
                _ => {
                    debug!(vendor = %self.profile.name, item = item_number, field = %rule.field, "marker without expected structure");
                }
            }
        }

        for child in node.children() {
            self.walk(child, depth + 1, item_number, fields, visited)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use crate::vendors;

    fn ids(item: &str) -> Identifiers {
        Identifiers {
            groups: vec![item.to_string(), item.to_string()],
            item_number: item.to_string(),
            url_title: None,
        }
    }

    #[test]
    fn every_node_is_visited_once() {
        let profile = vendors::jcrew();
        let doc = Html::parse_document(
            r#"<html><head><title>J.Crew</title></head><body>
               <table><tr><td class="prodtitle">Tee</td></tr></table>
               <div><p>one</p><p>two<span>three</span></p></div>
               </body></html>"#,
        );
        let extraction = TreeExtractor::new(&profile).extract_document(&doc, &ids("1")).unwrap();
        assert_eq!(extraction.visited, doc.tree.root().descendants().count());
    }

    #[test]
    fn later_markers_do_not_overwrite_earlier_ones() {
        let profile = vendors::jcrew();
        let doc = Html::parse_document(
            r#"<table>
                 <tr><td class="prodtitle">Main product</td></tr>
                 <tr><td class="producttitle">Related product</td></tr>
               </table>
               <img id="mainImg" src="http://images.example/main.jpg">
               <img id="mainImg" src="http://images.example/other.jpg">"#,
        );
        let extraction = TreeExtractor::new(&profile).extract_document(&doc, &ids("29234")).unwrap();
        assert_eq!(extraction.fields.get(Field::ProductTitle), Some("Main product"));
        assert_eq!(extraction.fields.get(Field::ImageUrl), Some("http://images.example/main.jpg"));
        assert_eq!(extraction.visited, doc.tree.root().descendants().count());
    }

    #[test]
    fn tree_without_markers_yields_no_fields() {
        let profile = vendors::burberry();
        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        let ids = Identifiers {
            url_title: Some("reflective graphic t shirt".to_string()),
            ..ids("37400701001")
        };
        let extraction = TreeExtractor::new(&profile).extract_document(&doc, &ids).unwrap();
        assert!(extraction.fields.is_empty());

        let record = validate(&extraction.fields, &profile.required, "http://us.burberry.com/");
        assert!(record.fields.is_empty());
        assert!(!record.complete);
        assert_eq!(record.missing, profile.required);
    }

    #[test]
    fn unexpected_structure_leaves_the_field_open() {
        let profile = vendors::jcrew();
        let doc = Html::parse_document(
            r#"<table>
                 <tr><td class="prodtitle"><b>bold</b></td></tr>
                 <tr><td class="prodtitle">Second try</td></tr>
               </table>"#,
        );
        let extraction = TreeExtractor::new(&profile).extract_document(&doc, &ids("1")).unwrap();
        assert_eq!(extraction.fields.get(Field::ProductTitle), Some("Second try"));
    }

    #[test]
    fn nesting_beyond_the_bound_aborts() {
        let profile = vendors::jcrew();
        let doc = Html::parse_document(&format!("{}x{}", "<div>".repeat(20), "</div>".repeat(20)));
        let err = TreeExtractor::new(&profile)
            .with_max_depth(8)
            .extract_document(&doc, &ids("1"))
            .unwrap_err();
        assert_eq!(err, TreeWalkError::TooDeep { max_depth: 8 });
    }
}
