use std::sync::LazyLock;

use regex::Regex;

use super::VendorProfile;
use crate::classifier::{ConsistencyRule, VendorPattern};
use crate::extractors::{Field, Locator, NodeTest};

// http://us.burberry.com/store/womenswear/sport/view-all/reflective-graphic-t-shirt/sku-37400701001-reflective-graphic-t-shirt/
static PRODUCT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://us\.burberry\.com/.*/([^/]+)/sku-(\d+)-([^/]+)/").unwrap()
});

/// The product title comes from the URL slug, not from the page.
pub fn burberry() -> VendorProfile {
    let pattern = VendorPattern::new("burberry", PRODUCT_URL.clone(), 2)
        .with_groups(&[1, 2, 3])
        .with_consistency(ConsistencyRule::SlugEqual(1, 3))
        .with_title_group(3);

    VendorProfile::new("burberry", pattern)
        .rule(
            Field::Price,
            NodeTest::element("span").with_class(&["product-price-amount"]),
            Locator::DollarAmount,
        )
        .rule(
            Field::ImageUrl,
            NodeTest::element("div").with_class(&["product-image"]),
            Locator::child_attribute(&[&["img"], &["a", "img"]], "src"),
        )
        .meta_key_for(Field::ItemNumber, "id")
        .meta_key_for(Field::ProductTitle, "name")
}
