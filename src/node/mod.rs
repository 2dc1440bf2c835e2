//! Node types for XML trees.
//!
//! This module provides `Element`, `Node`, `Text`, and `Document`. The same
//! tree holds LaTeXML input, HTML question fragments, and Moodle output.
//!
//! # Key Features
//!
//! - Qualified names kept as written, `local_name()` for prefix-free matching
//! - Builder methods for constructing output trees
//! - CDATA text kept distinct from escaped text

mod element;
mod text;
mod document;

pub use element::Element;
pub use text::{Text, TextKind};
pub use document::{Document, ElementIterator};

use smallvec::SmallVec;

/// Node in an XML tree - either Element or Text.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Box<Element>),
    Text(Text),
}

impl Node {
    /// Check if this is an element node.
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Check if this is a text node.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Get as element reference.
    #[inline]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get as text reference.
    #[inline]
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Node::Element(Box::new(elem))
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// Type alias for children collection.
pub type Children = SmallVec<[Node; 8]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_accessors() {
        let node: Node = Element::new("quiz").into();
        assert!(node.is_element());
        assert!(!node.is_text());
        assert_eq!(node.as_element().map(|e| e.tag.as_str()), Some("quiz"));

        let node: Node = Text::new("hello").into();
        assert!(node.is_text());
        assert!(node.as_element().is_none());
        assert_eq!(node.as_text().map(|t| t.content.as_str()), Some("hello"));
    }

    #[test]
    fn test_builder_chain() {
        let root = Element::new("question")
            .attr("type", "multichoice")
            .child(Element::new("name").child(Element::new("text").text("q1")))
            .text("tail");

        assert_eq!(root.child_count(), 2);
        assert_eq!(root.element_count(), 1);
        assert_eq!(root.text_content(), "q1tail");
        assert_eq!(root.get_attr("type"), Some("multichoice"));
    }
}
