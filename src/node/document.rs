//! Document type and related utilities
//!
//! The root container for XML trees, with query and traversal APIs.

use super::Element;

// =============================================================================
// Document
// =============================================================================

/// Root document container
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root element
    pub root: Element,
}

impl Document {
    /// Create a new document with a root element
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query API
    // ─────────────────────────────────────────────────────────────────────────

    /// Find first element matching predicate (depth-first search)
    pub fn find_element<F>(&self, predicate: F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        self.iter_elements().find(|e| predicate(e))
    }

    /// Find all elements matching predicate, in document order
    pub fn find_all<F>(&self, predicate: F) -> Vec<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        self.iter_elements().filter(|e| predicate(e)).collect()
    }

    /// Check if any element matches predicate
    pub fn has_element<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Element) -> bool,
    {
        self.find_element(predicate).is_some()
    }

    /// Count total elements in document
    pub fn element_count(&self) -> usize {
        self.iter_elements().count()
    }

    /// Iterate over all elements (depth-first, document order)
    pub fn iter_elements(&self) -> ElementIterator<'_> {
        ElementIterator::new(&self.root)
    }
}

// =============================================================================
// ElementIterator - depth-first element traversal
// =============================================================================

/// Depth-first iterator over elements
pub struct ElementIterator<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> ElementIterator<'a> {
    /// Start a traversal at `root` (included)
    pub fn new(root: &'a Element) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for ElementIterator<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let elem = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        for child in elem.children.iter().rev() {
            if let Some(child_elem) = child.as_element() {
                self.stack.push(child_elem);
            }
        }
        Some(elem)
    }
}
