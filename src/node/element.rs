//! Element type - XML elements with attributes and children
//!
//! The core building block of the tree.

use smallvec::SmallVec;

use crate::attr::{self, Attrs, AttrsExt};

use super::{Children, Node, Text};

// =============================================================================
// Element
// =============================================================================

/// XML element with attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name as written, possibly prefixed (`ltx:para`)
    pub tag: String,
    /// Element attributes
    pub attrs: Attrs,
    /// Child nodes
    pub children: Children,
}

impl Element {
    /// Create an empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: SmallVec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set_attr(name, value);
        self
    }

    /// Append a child element
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several child elements
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children.into_iter().map(Node::from));
        self
    }

    /// Append escaped text
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.children.push(Text::new(content).into());
        self
    }

    /// Append a CDATA section
    pub fn cdata(mut self, content: impl Into<String>) -> Self {
        self.children.push(Text::cdata(content).into());
        self
    }

    /// Append any node
    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Names and attributes
    // ─────────────────────────────────────────────────────────────────────────

    /// Tag name without namespace prefix
    pub fn local_name(&self) -> &str {
        attr::local_name(&self.tag)
    }

    /// Check the prefix-free tag name
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Get attribute value by name (prefix-insensitive)
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_attr(name)
    }

    /// Set attribute value (update if exists, add if not)
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.set_attr(name, value);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Other helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if element has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if element is a leaf (no child elements, may have text)
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|n| !n.is_element())
    }

    /// Number of direct children (all node types)
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Number of direct child elements
    pub fn element_count(&self) -> usize {
        self.children.iter().filter(|n| n.is_element()).count()
    }

    /// Iterate over child element references
    pub fn children_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| n.as_element())
    }

    /// First direct child with the given local name
    pub fn first_child(&self, local: &str) -> Option<&Element> {
        self.children_elements().find(|e| e.is(local))
    }

    /// Get text content of this element (concatenated from all text nodes)
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => buf.push_str(&t.content),
                Node::Element(e) => e.collect_text(buf),
            }
        }
    }
}
