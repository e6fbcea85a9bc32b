use std::sync::LazyLock;

use regex::Regex;

use super::VendorProfile;
use crate::classifier::VendorPattern;
use crate::extractors::{ChildIndex, Field, Locator, NodeTest, ValueTest};

// http://www.anntaylor.com/catalog/product.jsp?productId=28307&viewAll=true&categoryId=3944
static PRODUCT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://www\.anntaylor\.com/catalog/product\.jsp\?productId=(\d+)").unwrap()
});

pub fn anntaylor() -> VendorProfile {
    let pattern = VendorPattern::new("anntaylor", PRODUCT_URL.clone(), 1);
    let hd_info = || NodeTest::element("div").with_class(&["hd-info"]);

    VendorProfile::new("anntaylor", pattern)
        // <div class="hd-info"><h1>title</h1>...
        .rule(
            Field::ProductTitle,
            hd_info(),
            Locator::child(ChildIndex::First, NodeTest::element("h1"), Locator::ElementText),
        )
        // ...<div class="price"><p class="price"><sup class="dollars">$</sup>69.00</p></div></div>
        .rule(
            Field::Price,
            hd_info(),
            Locator::child(
                ChildIndex::Nth(1),
                NodeTest::element("div").with_class(&["price"]),
                Locator::child(
                    ChildIndex::First,
                    NodeTest::element("p").with_class(&["price"]),
                    Locator::guard(
                        ChildIndex::First,
                        NodeTest::element("sup").with_class(&["dollars"]),
                        Locator::LastChildText,
                    ),
                ),
            ),
        )
        .rule(
            Field::ImageUrl,
            NodeTest::element("img").with_attr("id", ValueTest::OneOf(vec!["productImage".to_string()])),
            Locator::Attribute("src".to_string()),
        )
        .meta_key_for(Field::ItemNumber, "itemNum")
}
