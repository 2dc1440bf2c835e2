//! Text node type
//!
//! Character data in the tree, either escaped on output or wrapped in CDATA.

// =============================================================================
// Text
// =============================================================================

/// How text is written back out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextKind {
    /// Escaped character data
    #[default]
    Normal,
    /// Wrapped in `<![CDATA[ ... ]]>`
    CData,
}

/// Text content node
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Text content, unescaped
    pub content: String,
    /// Output form
    pub kind: TextKind,
}

impl Text {
    /// Create a new text node
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::Normal,
        }
    }

    /// Create a CDATA text node
    pub fn cdata(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::CData,
        }
    }

    /// Check if text content is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check if text is only whitespace
    pub fn is_whitespace(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Check if this is a CDATA section
    pub fn is_cdata(&self) -> bool {
        self.kind == TextKind::CData
    }
}
