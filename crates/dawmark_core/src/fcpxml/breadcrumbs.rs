//! Ancestor chains.
//!
//! A breadcrumb list is built fresh per query by following parent links
//! from the target up to the document root, then reversed so the outermost
//! ancestor comes first. The target itself is not included.

use super::attributes::{lane, time_attr, MalformedAttribute, TimeAttr};
use super::element_type::ElementType;

/// One ancestor with its timing attributes read once.
#[derive(Debug, Clone)]
pub struct Breadcrumb<'a, 'input> {
    pub node: roxmltree::Node<'a, 'input>,
    /// `None` for elements the classifier does not recognise.
    pub element_type: Option<ElementType>,
    /// Local timeline origin. For a sequence this is its `tcStart`.
    pub start: TimeAttr,
    /// Position in the parent's timeline.
    pub offset: TimeAttr,
    /// Anchor layer: 0 = contained, otherwise anchored.
    pub lane: Result<i32, MalformedAttribute>,
}

impl<'a, 'input> Breadcrumb<'a, 'input> {
    pub fn new(node: roxmltree::Node<'a, 'input>) -> Self {
        let element_type = ElementType::of(node);
        let start_attribute = if element_type.is_some_and(|t| t.is_sequence()) {
            "tcStart"
        } else {
            "start"
        };
        Self {
            node,
            element_type,
            start: time_attr(node, start_attribute),
            offset: time_attr(node, "offset"),
            lane: lane(node),
        }
    }

    pub fn is_anchored(&self) -> bool {
        matches!(self.lane, Ok(lane) if lane != 0)
    }
}

/// Ancestors of `target`, outermost first, ending at its immediate parent.
///
/// The root element has no ancestors and yields an empty list.
pub fn breadcrumbs<'a, 'input>(
    target: roxmltree::Node<'a, 'input>,
) -> Vec<Breadcrumb<'a, 'input>> {
    let mut chain: Vec<_> = target
        .ancestors()
        .skip(1)
        .filter(|n| n.is_element())
        .map(Breadcrumb::new)
        .collect();
    chain.reverse();
    chain
}
