//! XML and HTML rendering
//!
//! Renders trees to strings, either as XML documents (Moodle output) or as
//! HTML fragments (question and answer bodies).

use crate::attr::Attrs;
use crate::node::{Document, Element, Node, TextKind};

// =============================================================================
// RenderConfig
// =============================================================================

/// XML declaration written before the root element.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Markup dialect, decides how empty elements are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// Empty elements self-close: `<hidden/>`
    Xml,
    /// Only void elements self-close: `<br />`, `<p></p>`
    Html,
}

/// Configuration for rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Markup dialect.
    pub markup: Markup,
    /// Indent element-only content, one element per line.
    pub pretty: bool,
    /// Spaces per nesting level in pretty mode.
    pub indent_width: usize,
    /// Emit the XML declaration (document rendering only).
    pub declaration: bool,
}

impl RenderConfig {
    /// Compact XML document with declaration.
    pub const XML: Self = Self {
        markup: Markup::Xml,
        pretty: false,
        indent_width: 2,
        declaration: true,
    };

    /// Compact HTML fragment.
    pub const HTML: Self = Self {
        markup: Markup::Html,
        pretty: false,
        indent_width: 2,
        declaration: false,
    };

    /// Switch pretty printing on or off.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the indentation width.
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::XML
    }
}

// =============================================================================
// Document Rendering
// =============================================================================

/// Render a document to a string.
pub fn render_document(doc: &Document, config: &RenderConfig) -> String {
    let mut output = String::new();
    if config.declaration {
        output.push_str(XML_DECLARATION);
        output.push('\n');
    }
    render_element(&doc.root, config, 0, config.pretty, &mut output);
    output.push('\n');
    output
}

/// Render a sequence of nodes without a wrapping element.
pub fn render_fragment(nodes: &[Node], config: &RenderConfig) -> String {
    let mut output = String::new();
    for node in nodes {
        render_node(node, config, 0, false, &mut output);
    }
    output
}

/// Render an element.
///
/// `block` is true while every ancestor holds element-only content; once
/// mixed content is entered everything below is written inline.
fn render_element(elem: &Element, config: &RenderConfig, depth: usize, block: bool, output: &mut String) {
    if block && depth > 0 {
        output.push('\n');
        push_indent(config, depth, output);
    }

    output.push('<');
    output.push_str(&elem.tag);
    render_attrs(&elem.attrs, output);

    if elem.children.is_empty() {
        match config.markup {
            Markup::Xml => {
                output.push_str("/>");
                return;
            }
            Markup::Html if is_void_element(&elem.tag) => {
                output.push_str(" />");
                return;
            }
            Markup::Html => {}
        }
    }

    output.push('>');

    let child_block = block && elem.children.iter().all(Node::is_element);
    for child in &elem.children {
        render_node(child, config, depth + 1, child_block, output);
    }

    if child_block && !elem.children.is_empty() {
        output.push('\n');
        push_indent(config, depth, output);
    }
    output.push_str("</");
    output.push_str(&elem.tag);
    output.push('>');
}

/// Render a node.
fn render_node(node: &Node, config: &RenderConfig, depth: usize, block: bool, output: &mut String) {
    match node {
        Node::Element(elem) => render_element(elem, config, depth, block, output),
        Node::Text(text) => match text.kind {
            TextKind::Normal => output.push_str(&escape_text(&text.content)),
            TextKind::CData => push_cdata(&text.content, output),
        },
    }
}

/// Render attributes.
fn render_attrs(attrs: &Attrs, output: &mut String) {
    for (name, value) in attrs.iter() {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(&escape_attr(value));
        output.push('"');
    }
}

fn push_indent(config: &RenderConfig, depth: usize, output: &mut String) {
    output.extend(std::iter::repeat_n(' ', depth * config.indent_width));
}

/// Write a CDATA section; a `]]>` inside the content is split across two
/// sections so the output stays well formed.
fn push_cdata(content: &str, output: &mut String) {
    output.push_str("<![CDATA[");
    output.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
    output.push_str("]]>");
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute value special characters.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Check if element is an HTML void element (self-closing).
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "param" | "source" | "track" | "wbr"
    )
}

// =============================================================================
// Tests
// =============================================================================
