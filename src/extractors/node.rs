use ego_tree::NodeRef;
use regex::Regex;
use scraper::node::Node;
use scraper::ElementRef;

/// A node of the `scraper` document tree.
pub type DomNode<'a> = NodeRef<'a, Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// How an attribute value is compared.
#[derive(Debug, Clone)]
pub enum ValueTest {
    /// The attribute only has to be present.
    Any,
    /// Case-insensitive exact match against any of the values.
    OneOf(Vec<String>),
    /// Free-form pattern match.
    Pattern(Regex),
    /// Value starts with `prefix` and ends with the current item number.
    ItemSuffixed { prefix: String },
}

#[derive(Debug, Clone)]
pub struct AttributeTest {
    pub name: String,
    pub value: ValueTest,
}

/// Structural marker: node kind, tag name and an optional attribute or text
/// condition.
#[derive(Debug, Clone)]
pub struct NodeTest {
    pub kind: NodeKind,
    /// Compared case-insensitively.
    pub tag: Option<String>,
    pub attribute: Option<AttributeTest>,
    /// Pattern the node's own text has to match (text nodes only).
    pub text: Option<Regex>,
}

impl NodeTest {
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element,
            tag: Some(tag.to_string()),
            attribute: None,
            text: None,
        }
    }

    pub fn text() -> Self {
        Self {
            kind: NodeKind::Text,
            tag: None,
            attribute: None,
            text: None,
        }
    }

    pub fn with_attr(mut self, name: &str, value: ValueTest) -> Self {
        self.attribute = Some(AttributeTest {
            name: name.to_string(),
            value,
        });
        self
    }

    /// Shorthand for a case-insensitive `class` match.
    pub fn with_class(self, classes: &[&str]) -> Self {
        self.with_attr("class", one_of(classes))
    }

    pub fn with_text(mut self, pattern: Regex) -> Self {
        self.text = Some(pattern);
        self
    }

    pub fn matches(&self, node: DomNode<'_>, item_number: &str) -> bool {
        match (self.kind, node.value()) {
            (NodeKind::Element, Node::Element(element)) => {
                if let Some(tag) = &self.tag {
                    if !tag.eq_ignore_ascii_case(element.name()) {
                        return false;
                    }
                }
                match &self.attribute {
                    None => true,
                    Some(test) => element
                        .attr(&test.name)
                        .map_or(false, |value| test.value.accepts(value, item_number)),
                }
            }
            (NodeKind::Text, Node::Text(text)) => match &self.text {
                None => true,
                Some(pattern) => pattern.is_match(text),
            },
            _ => false,
        }
    }
}

impl ValueTest {
    pub fn accepts(&self, value: &str, item_number: &str) -> bool {
        match self {
            ValueTest::Any => true,
            ValueTest::OneOf(candidates) => candidates
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(value)),
            ValueTest::Pattern(pattern) => pattern.is_match(value),
            ValueTest::ItemSuffixed { prefix } => {
                !item_number.is_empty() && value.starts_with(prefix.as_str()) && value.ends_with(item_number)
            }
        }
    }
}

pub fn one_of(values: &[&str]) -> ValueTest {
    ValueTest::OneOf(values.iter().map(|v| v.to_string()).collect())
}

/// Children that carry content: elements and non-blank text.
pub fn significant_children<'a>(node: DomNode<'a>) -> impl Iterator<Item = DomNode<'a>> {
    node.children().filter(|child| match child.value() {
        Node::Element(_) => true,
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    })
}

/// Own text of a text node.
pub fn node_text<'a>(node: DomNode<'a>) -> Option<&'a str> {
    node.value().as_text().map(|text| &**text)
}

/// Concatenated text of an element and its descendants.
pub fn element_text(node: DomNode<'_>) -> Option<String> {
    ElementRef::wrap(node).map(|element| element.text().collect::<String>())
}

/// First element child with the given tag name.
pub fn named_child<'a>(node: DomNode<'a>, tag: &str) -> Option<DomNode<'a>> {
    node.children().find(|child| {
        child
            .value()
            .as_element()
            .map_or(false, |element| element.name().eq_ignore_ascii_case(tag))
    })
}

pub fn attribute<'a>(node: DomNode<'a>, name: &str) -> Option<&'a str> {
    node.value().as_element().and_then(|element| element.attr(name))
}
