use super::node::{
    attribute, element_text, named_child, node_text, significant_children, DomNode, NodeTest,
};
use super::price;

/// Position among a node's significant children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildIndex {
    First,
    Last,
    Nth(usize),
}

impl ChildIndex {
    fn pick<'a>(self, node: DomNode<'a>) -> Option<DomNode<'a>> {
        let mut children = significant_children(node);
        match self {
            ChildIndex::First => children.next(),
            ChildIndex::Last => children.last(),
            ChildIndex::Nth(n) => children.nth(n),
        }
    }
}

/// Where a field value sits relative to the node a rule matched.
#[derive(Debug, Clone)]
pub enum Locator {
    /// The first significant child, which must be a text node.
    FirstChildText,
    /// The last significant child, which must be a text node.
    LastChildText,
    /// All text below the node.
    ElementText,
    /// A named attribute of the node itself.
    Attribute(String),
    /// An attribute of the element reached by the first child path that
    /// resolves, e.g. `img` or `a > img`.
    ChildAttribute {
        paths: Vec<Vec<String>>,
        attribute: String,
    },
    /// Descend into a child that passes `test`.
    Child {
        index: ChildIndex,
        test: NodeTest,
        then: Box<Locator>,
    },
    /// Require a child that passes `test`, then keep locating on this node.
    Guard {
        index: ChildIndex,
        test: NodeTest,
        then: Box<Locator>,
    },
    /// Price followed by the item token, see [`price::item_price`].
    ItemPrice,
    /// First `$` amount of the first child text.
    DollarAmount,
}

impl Locator {
    pub fn child(index: ChildIndex, test: NodeTest, then: Locator) -> Self {
        Locator::Child {
            index,
            test,
            then: Box::new(then),
        }
    }

    pub fn guard(index: ChildIndex, test: NodeTest, then: Locator) -> Self {
        Locator::Guard {
            index,
            test,
            then: Box::new(then),
        }
    }

    pub fn child_attribute(paths: &[&[&str]], attribute: &str) -> Self {
        Locator::ChildAttribute {
            paths: paths
                .iter()
                .map(|path| path.iter().map(|tag| tag.to_string()).collect())
                .collect(),
            attribute: attribute.to_string(),
        }
    }

    /// Pulls the raw value. `None` means the expected structure is absent.
    pub fn locate(&self, node: DomNode<'_>, item_number: &str) -> Option<String> {
        match self {
            Locator::FirstChildText => ChildIndex::First
                .pick(node)
                .and_then(node_text)
                .map(str::to_string),
            Locator::LastChildText => ChildIndex::Last
                .pick(node)
                .and_then(node_text)
                .map(str::to_string),
            Locator::ElementText => element_text(node),
            Locator::Attribute(name) => attribute(node, name).map(str::to_string),
            Locator::ChildAttribute { paths, attribute: name } => paths.iter().find_map(|path| {
                let target = path
                    .iter()
                    .try_fold(node, |current, tag| named_child(current, tag))?;
                attribute(target, name).map(str::to_string)
            }),
            Locator::Child { index, test, then } => {
                let child = index.pick(node)?;
                if !test.matches(child, item_number) {
                    return None;
                }
                then.locate(child, item_number)
            }
            Locator::Guard { index, test, then } => {
                let child = index.pick(node)?;
                if !test.matches(child, item_number) {
                    return None;
                }
                then.locate(node, item_number)
            }
            Locator::ItemPrice => price::item_price(node, item_number),
            Locator::DollarAmount => ChildIndex::First
                .pick(node)
                .and_then(node_text)
                .and_then(price::dollar_amount)
                .map(str::to_string),
        }
    }
}
