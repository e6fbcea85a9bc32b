//! Per-page state machine:
//! `Pending -> Classified -> Extracted -> Validated -> {Complete, Partial, Rejected}`.
//!
//! Nothing here returns an error. Every failure degrades to less metadata,
//! and the page is always handed back to the caller.

use std::fmt;

use scraper::Html;
use tracing::{debug, info, warn};

use crate::classifier::{classify, Identifiers};
use crate::error::{IssuanceError, RejectReason};
use crate::extractors::{ExtractedFields, Field, TreeExtractor, DEFAULT_MAX_DEPTH};
use crate::id_issuer::{IdIssuer, ProductId};
use crate::page::{PageDescriptor, ParseResult};
use crate::validator::{validate, ValidatedRecord};
use crate::vendors::VendorProfile;

/// Metadata key carrying the issued id.
pub const PRODUCT_ID_KEY: &str = "productId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Pending,
    Classified,
    Extracted,
    Validated,
    Complete,
    Partial,
    Rejected,
}

impl PageState {
    pub fn as_str(self) -> &'static str {
        match self {
            PageState::Pending => "pending",
            PageState::Classified => "classified",
            PageState::Extracted => "extracted",
            PageState::Validated => "validated",
            PageState::Complete => "complete",
            PageState::Partial => "partial",
            PageState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the synchronous half of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    Rejected(RejectReason),
    Validated {
        vendor: String,
        item_number: String,
        record: ValidatedRecord,
    },
}

#[derive(Debug)]
pub struct Report {
    pub vendor: String,
    pub item_number: String,
    pub record: ValidatedRecord,
    /// An issuance failure never demotes the outcome.
    pub product_id: Result<ProductId, IssuanceError>,
}

#[derive(Debug)]
pub enum Outcome {
    Rejected(RejectReason),
    Complete(Report),
    Partial(Report),
}

impl Outcome {
    pub fn state(&self) -> PageState {
        match self {
            Outcome::Rejected(_) => PageState::Rejected,
            Outcome::Complete(_) => PageState::Complete,
            Outcome::Partial(_) => PageState::Partial,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Rejected(_) => None,
            Outcome::Complete(report) | Outcome::Partial(report) => Some(report),
        }
    }
}

pub struct Coordinator<I> {
    vendors: Vec<VendorProfile>,
    issuer: I,
    max_depth: usize,
}

impl<I: IdIssuer> Coordinator<I> {
    pub fn new(vendors: Vec<VendorProfile>, issuer: I) -> Self {
        Self {
            vendors,
            issuer,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn vendors(&self) -> &[VendorProfile] {
        &self.vendors
    }

    /// Classification, extraction and validation against a pre-built tree.
    pub fn analyze(&self, page: &PageDescriptor, document: &Html) -> Analysis {
        match self.classify_page(page) {
            Ok((profile, ids)) => self.extract_page(profile, &ids, page, document),
            Err(reason) => Analysis::Rejected(reason),
        }
    }

    /// Runs the whole pipeline against a pre-built tree and merges the
    /// result into `parse`.
    pub async fn process(&self, page: &PageDescriptor, document: &Html, parse: &mut ParseResult) -> Outcome {
        let analysis = self.analyze(page, document);
        self.finish(analysis, parse).await
    }

    /// Like [`Coordinator::process`], but builds the tree from the page
    /// content, and only for pages that classify.
    pub async fn process_page(&self, page: &PageDescriptor, parse: &mut ParseResult) -> Outcome {
        let analysis = match self.classify_page(page) {
            Ok((profile, ids)) => {
                let document = page.parse_document();
                self.extract_page(profile, &ids, page, &document)
            }
            Err(reason) => Analysis::Rejected(reason),
        };
        self.finish(analysis, parse).await
    }

    /// Writes a validated record into `parse` and issues its id.
    pub async fn finish(&self, analysis: Analysis, parse: &mut ParseResult) -> Outcome {
        let (vendor, item_number, record) = match analysis {
            Analysis::Rejected(reason) => {
                debug!(url = %parse.url, state = %PageState::Rejected, %reason, "page passed through");
                return Outcome::Rejected(reason);
            }
            Analysis::Validated {
                vendor,
                item_number,
                record,
            } => (vendor, item_number, record),
        };

        let profile = self.vendors.iter().find(|profile| profile.name == vendor);
        for (field, value) in record.fields.iter() {
            let key = profile.map_or_else(|| field.default_key(), |profile| profile.meta_key(field));
            parse.metadata.add(key, value);
        }

        let product_id = self.issuer.issue(&vendor).await;
        match &product_id {
            Ok(id) => parse.metadata.add(PRODUCT_ID_KEY, id.to_string()),
            Err(err) => {
                warn!(url = %parse.url, vendor = %vendor, item = %item_number, error = %err, "no id issued")
            }
        }

        let report = Report {
            vendor,
            item_number,
            record,
            product_id,
        };
        if report.record.complete {
            info!(
                url = %parse.url,
                vendor = %report.vendor,
                item = %report.item_number,
                id = ?report.product_id.as_ref().ok(),
                state = %PageState::Complete,
                "product extracted"
            );
            Outcome::Complete(report)
        } else {
            warn!(
                url = %parse.url,
                vendor = %report.vendor,
                item = %report.item_number,
                missing = ?report.record.missing,
                state = %PageState::Partial,
                "partial product"
            );
            Outcome::Partial(report)
        }
    }

    /// First enabled vendor whose pattern accepts the page. An inconsistent
    /// match rejects the page outright.
    fn classify_page(&self, page: &PageDescriptor) -> Result<(&VendorProfile, Identifiers), RejectReason> {
        debug!(url = %page.url, state = %PageState::Pending, "classifying");
        for profile in &self.vendors {
            match classify(page, &profile.pattern) {
                Ok(ids) => {
                    if !page.is_html() {
                        return Err(RejectReason::NotHtml {
                            content_type: page.content_type.clone().unwrap_or_default(),
                        });
                    }
                    debug!(url = %page.url, vendor = %profile.name, item = %ids.item_number, state = %PageState::Classified, "classified");
                    return Ok((profile, ids));
                }
                Err(RejectReason::NotProductPage { .. }) => continue,
                Err(reason) => return Err(reason),
            }
        }

        let vendors: Vec<&str> = self.vendors.iter().map(|profile| profile.name.as_str()).collect();
        Err(RejectReason::NotProductPage {
            vendor: vendors.join(", "),
        })
    }

    fn extract_page(
        &self,
        profile: &VendorProfile,
        ids: &Identifiers,
        page: &PageDescriptor,
        document: &Html,
    ) -> Analysis {
        let extraction = match TreeExtractor::new(profile)
            .with_max_depth(self.max_depth)
            .extract_document(document, ids)
        {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!(url = %page.url, vendor = %profile.name, error = %err, "tree walk aborted");
                return Analysis::Rejected(RejectReason::MalformedTree {
                    vendor: profile.name.clone(),
                    reason: err.to_string(),
                });
            }
        };
        debug!(url = %page.url, vendor = %profile.name, visited = extraction.visited, state = %PageState::Extracted, "tree walked");

        let mut fields = url_fields(profile, ids);
        fields.merge(&extraction.fields);
        let record = validate(&fields, &profile.required, &page.base_url);
        debug!(url = %page.url, vendor = %profile.name, complete = record.complete, state = %PageState::Validated, "validated");

        Analysis::Validated {
            vendor: profile.name.clone(),
            item_number: ids.item_number.clone(),
            record,
        }
    }
}

/// Fields known from classification alone: the vendor's brand, the item
/// number and, for vendors that encode it, the title slug.
pub fn url_fields(profile: &VendorProfile, ids: &Identifiers) -> ExtractedFields {
    let mut fields = ExtractedFields::new();
    fields.set(Field::Brand, profile.brand.as_str());
    fields.set(Field::ItemNumber, ids.item_number.as_str());
    if let Some(title) = &ids.url_title {
        fields.set(Field::ProductTitle, title.as_str());
    }
    fields
}

/// Keys a profile writes, in metadata order.
pub fn metadata_keys(profile: &VendorProfile) -> Vec<&str> {
    Field::ALL.iter().map(|field| profile.meta_key(*field)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_issuer::MemoryIdIssuer;
    use crate::vendors;

    const JCREW_URL: &str = "http://www.jcrew.com/mens_category/sweaters/cottoncashmere/PRDOVR~29234/29234.jsp";

    fn coordinator() -> Coordinator<MemoryIdIssuer> {
        Coordinator::new(vendors::builtin(&vendors::BUILTIN).unwrap(), MemoryIdIssuer::new())
    }

    fn jcrew_page(body: &str) -> PageDescriptor {
        PageDescriptor::new(JCREW_URL, JCREW_URL, body.as_bytes().to_vec())
    }

    #[test]
    fn inconsistent_url_is_rejected_before_parsing() {
        let url = "http://www.jcrew.com/mens_category/sweaters/PRDOVR~29234/29235.jsp";
        let page = PageDescriptor::new(url, url, Vec::new());
        let analysis = coordinator().analyze(&page, &Html::parse_document(""));
        assert!(matches!(
            analysis,
            Analysis::Rejected(RejectReason::InconsistentIdentifiers { ref vendor, .. }) if vendor == "jcrew"
        ));
    }

    #[test]
    fn declared_non_html_is_rejected() {
        let page = jcrew_page("%PDF-1.4").with_content_type("application/pdf");
        let analysis = coordinator().analyze(&page, &page.parse_document());
        assert_eq!(
            analysis,
            Analysis::Rejected(RejectReason::NotHtml {
                content_type: "application/pdf".to_string()
            })
        );
    }

    #[tokio::test]
    async fn deep_documents_pass_through_untouched() {
        let coordinator = coordinator().with_max_depth(4);
        let page = jcrew_page(&format!("{}x{}", "<div>".repeat(10), "</div>".repeat(10)));
        let mut parse = ParseResult::new(JCREW_URL);
        let outcome = coordinator.process_page(&page, &mut parse).await;

        assert!(matches!(outcome, Outcome::Rejected(RejectReason::MalformedTree { .. })));
        assert!(parse.metadata.is_empty());
        assert_eq!(outcome.state(), PageState::Rejected);
    }

    #[test]
    fn url_fields_fill_in_what_the_tree_lacks() {
        let url = "http://us.burberry.com/store/womenswear/sport/view-all/reflective-graphic-t-shirt/sku-37400701001-reflective-graphic-t-shirt/";
        let page = PageDescriptor::new(url, url, b"<p>nothing</p>".to_vec());

        match coordinator().analyze(&page, &page.parse_document()) {
            Analysis::Validated { record, .. } => {
                assert_eq!(record.get(Field::Brand), Some("burberry"));
                assert_eq!(record.get(Field::ItemNumber), Some("37400701001"));
                assert_eq!(record.get(Field::ProductTitle), Some("reflective graphic t shirt"));
                assert_eq!(record.missing, [Field::Price, Field::ImageUrl]);
            }
            other => panic!("unexpected analysis {:?}", other),
        }
    }

    #[test]
    fn metadata_keys_follow_the_vendor() {
        let profile = vendors::burberry();
        let keys = metadata_keys(&profile);
        assert_eq!(keys, ["brand", "id", "name", "price", "imgURL", "pageTitle"]);
    }
}
