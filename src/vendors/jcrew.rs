use std::sync::LazyLock;

use regex::Regex;

use super::VendorProfile;
use crate::classifier::{ConsistencyRule, VendorPattern};
use crate::extractors::{one_of, Field, Locator, NodeTest, ValueTest};

// http://www.jcrew.com/mens_category/sweaters/cottoncashmere/PRDOVR~29234/29234.jsp
// Sale items carry extra segments between the two item numbers:
// http://www.jcrew.com/AST/Navigation/Sale/AllProducts/PRDOVR~18212/99102181471/ENE~1+2+3/18212.jsp
static PRODUCT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://www\.jcrew\.com/.*/PRDOVR~(\d+).*/(\d+)\.jsp").unwrap());

pub fn jcrew() -> VendorProfile {
    let pattern = VendorPattern::new("jcrew", PRODUCT_URL.clone(), 1)
        .with_groups(&[1, 2])
        .with_consistency(ConsistencyRule::NumericEqual(1, 2));

    VendorProfile::new("jcrew", pattern)
        .rule(
            Field::ProductTitle,
            NodeTest::element("td").with_class(&["prodtitle", "producttitle"]),
            Locator::FirstChildText,
        )
        // $88.00 item 29234
        .rule(
            Field::Price,
            NodeTest::element("td").with_class(&["standard_nopad", "standard"]),
            Locator::ItemPrice,
        )
        .rule(
            Field::ImageUrl,
            NodeTest::element("img").with_attr("id", one_of(&["mainImg"])),
            Locator::Attribute("src".to_string()),
        )
        // Pages bundling related products have no mainImg, only
        // productOnFigureImage<item> per product.
        .rule(
            Field::ImageUrl,
            NodeTest::element("img").with_attr(
                "id",
                ValueTest::ItemSuffixed {
                    prefix: "productOnFigureImage".to_string(),
                },
            ),
            Locator::Attribute("src".to_string()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::extractors::TreeExtractor;
    use crate::page::PageDescriptor;

    const PAGE: &str = r#"<html><head><title>J.Crew - Cotton-cashmere crewneck sweater</title></head>
<body>
  <img id="productOnFigureImage11111" src="http://images.jcrew.com/other.tif">
  <table>
    <tr><td class="prodtitle">Cotton-cashmere crewneck sweater</td></tr>
    <tr><td class="standard_nopad">$88.00 item 29234</td></tr>
  </table>
  <img id="productOnFigureImage29234" src="http://images.jcrew.com/29234.tif">
  <table class="related">
    <tr><td class="prodtitle">Slim wool trousers</td></tr>
    <tr><td class="standard_nopad">$120.00 item 11111</td></tr>
  </table>
</body></html>"#;

    #[test]
    fn product_page_yields_all_fields() {
        let page = PageDescriptor::new(
            "http://www.jcrew.com/mens_category/sweaters/cottoncashmere/PRDOVR~29234/29234.jsp",
            "http://www.jcrew.com/mens_category/sweaters/cottoncashmere/PRDOVR~29234/29234.jsp",
            PAGE.as_bytes().to_vec(),
        );
        let profile = jcrew();
        let ids = classify(&page, &profile.pattern).unwrap();
        let extraction = TreeExtractor::new(&profile)
            .extract_document(&page.parse_document(), &ids)
            .unwrap();
        let fields = &extraction.fields;

        assert_eq!(fields.get(Field::ProductTitle), Some("Cotton-cashmere crewneck sweater"));
        assert_eq!(fields.get(Field::Price), Some("88.00"));
        assert_eq!(fields.get(Field::ImageUrl), Some("http://images.jcrew.com/29234.tif"));
        assert_eq!(fields.get(Field::PageTitle), Some("J.Crew - Cotton-cashmere crewneck sweater"));
    }
}
