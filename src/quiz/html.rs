//! LaTeXML content → HTML for question and answer bodies.
//!
//! The LaTeXML schema is much richer than what a Moodle question needs.
//! Structural elements map to their HTML counterpart, formulas go back to
//! TeX between MathJax delimiters, and anything unknown is transparent.

use tracing::warn;

use super::media::MediaStore;
use super::{EmbeddedFile, RichText};
use crate::node::{Element, Node, Text};
use crate::render::{self, RenderConfig};

/// Moodle placeholder for files attached to a text field.
pub const PLUGINFILE: &str = "@@PLUGINFILE@@";

/// Quiz markup handled by the extractor, never part of a body.
const QUIZ_ELEMENTS: [&str; 4] = ["choices", "explain", "scoring", "element"];

/// LaTeXML bookkeeping with no visible content.
const SKIPPED: [&str; 7] = ["note", "indexmark", "tags", "tag", "rdf", "resource", "TOC"];

// =============================================================================
// HtmlWriter
// =============================================================================

/// Converts LaTeXML nodes to HTML, embedding pictures on the way.
pub struct HtmlWriter<'m, 'r> {
    media: &'m mut MediaStore<'r>,
    files: Vec<EmbeddedFile>,
}

impl<'m, 'r> HtmlWriter<'m, 'r> {
    pub fn new(media: &'m mut MediaStore<'r>) -> Self {
        Self {
            media,
            files: Vec::new(),
        }
    }

    /// Convert a list of LaTeXML nodes.
    pub fn write(mut self, nodes: &[Node]) -> RichText {
        let mut out = Vec::new();
        for node in nodes {
            self.convert_node(node, &mut out);
        }
        RichText {
            html: render::render_fragment(&out, &RenderConfig::HTML).trim().to_string(),
            files: self.files,
        }
    }

    fn convert_node(&mut self, node: &Node, out: &mut Vec<Node>) {
        match node {
            Node::Text(text) => {
                let collapsed = collapse_whitespace(&text.content);
                if !collapsed.is_empty() {
                    out.push(Text::new(collapsed).into());
                }
            }
            Node::Element(elem) => self.convert_element(elem, out),
        }
    }

    fn convert_children(&mut self, elem: &Element) -> Vec<Node> {
        let mut out = Vec::new();
        for child in &elem.children {
            self.convert_node(child, &mut out);
        }
        out
    }

    /// Wrap converted children in `tag`.
    fn wrap(&mut self, tag: &str, elem: &Element, out: &mut Vec<Node>) {
        let mut wrapper = Element::new(tag);
        wrapper.children.extend(self.convert_children(elem));
        out.push(wrapper.into());
    }

    fn convert_element(&mut self, elem: &Element, out: &mut Vec<Node>) {
        let name = elem.local_name();
        if QUIZ_ELEMENTS.contains(&name) || SKIPPED.contains(&name) {
            return;
        }
        match name {
            "p" => self.wrap("p", elem, out),
            "emph" => self.wrap("em", elem, out),
            "itemize" | "description" => self.wrap("ul", elem, out),
            "enumerate" => self.wrap("ol", elem, out),
            "item" => self.wrap("li", elem, out),
            "tabular" => self.wrap("table", elem, out),
            "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" => self.wrap(name, elem, out),
            "text" => self.convert_font(elem, out),
            "Math" => out.push(Text::new(math_source(elem)).into()),
            "verbatim" => {
                out.push(Element::new("pre").text(elem.text_content()).into());
            }
            "break" => out.push(Element::new("br").into()),
            "ref" | "a" => match elem.get_attr("href") {
                Some(href) => {
                    let mut link = Element::new("a").attr("href", href);
                    link.children.extend(self.convert_children(elem));
                    out.push(link.into());
                }
                None => out.extend(self.convert_children(elem)),
            },
            "graphics" => self.convert_graphics(elem, out),
            "ERROR" => {
                warn!(content = %elem.text_content(), "LaTeXML error node dropped");
            }
            _ => out.extend(self.convert_children(elem)),
        }
    }

    /// `<text font="bold italic">` → nested `<b><i>`.
    fn convert_font(&mut self, elem: &Element, out: &mut Vec<Node>) {
        let font = elem.get_attr("font").unwrap_or_default();
        let mut content = self.convert_children(elem);
        for (keyword, tag) in [("typewriter", "code"), ("italic", "i"), ("slanted", "i"), ("bold", "b")] {
            if font.split_whitespace().any(|w| w == keyword) {
                let mut wrapper = Element::new(tag);
                wrapper.children.extend(content);
                content = vec![wrapper.into()];
            }
        }
        out.extend(content);
    }

    fn convert_graphics(&mut self, elem: &Element, out: &mut Vec<Node>) {
        let Some(graphic) = elem.get_attr("graphic") else {
            return;
        };
        let Some(file) = self.media.embed(graphic, elem.get_attr("candidates")) else {
            return;
        };
        out.push(
            Element::new("img")
                .attr("src", format!("{PLUGINFILE}/{}", file.name))
                .attr("alt", graphic)
                .into(),
        );
        if !self.files.iter().any(|f| f.name == file.name) {
            self.files.push(file);
        }
    }
}

/// TeX source of a formula between MathJax delimiters.
fn math_source(elem: &Element) -> String {
    let tex = elem
        .get_attr("tex")
        .map(str::to_string)
        .unwrap_or_else(|| elem.text_content());
    let tex = tex.trim();
    match elem.get_attr("mode") {
        Some("display") => format!("\\[{tex}\\]"),
        _ => format!("\\({tex}\\)"),
    }
}

/// Collapse whitespace runs to one space, keeping one at either end.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                result.push(' ');
            }
            in_space = true;
        } else {
            result.push(c);
            in_space = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseConfig, parse_str};
    use crate::runner::SystemRunner;

    fn html_of(xml: &str) -> RichText {
        let doc = parse_str(xml, "<memory>", ParseConfig::MIXED).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut media = MediaStore::new(dir.path(), dir.path(), None, &SystemRunner);
        HtmlWriter::new(&mut media).write(&doc.root.children)
    }

    #[test]
    fn test_paragraphs_and_fonts() {
        let rich = html_of(
            r#"<q><para><p>Is  <text font="bold">this</text>
            <emph>true</emph>?</p></para><p><text font="bold italic">x</text></p></q>"#,
        );
        assert_eq!(rich.html, "<p>Is <b>this</b> <em>true</em>?</p><p><b><i>x</i></b></p>");
        assert!(rich.files.is_empty());
    }

    #[test]
    fn test_math() {
        let rich = html_of(
            r#"<q><p>Solve <Math mode="inline" tex="x^2 &lt; 1"><XMath>x</XMath></Math></p><equation><Math mode="display" tex="\int f"/><tags><tag>(1)</tag></tags></equation></q>"#,
        );
        assert_eq!(rich.html, "<p>Solve \\(x^2 &lt; 1\\)</p>\\[\\int f\\]");
    }

    #[test]
    fn test_lists_tables_and_quiz_markup() {
        let rich = html_of(
            r#"<q><itemize><item><tags><tag>•</tag></tags><para><p>a</p></para></item></itemize><tabular><tbody><tr><td>1</td></tr></tbody></tabular><choices><correctchoice>no</correctchoice></choices><scoring value="b=1"/><explain>no</explain><break/><ERROR>\foo</ERROR></q>"#,
        );
        assert_eq!(
            rich.html,
            "<ul><li><p>a</p></li></ul><table><tbody><tr><td>1</td></tr></tbody></table><br />"
        );
    }

    #[test]
    fn test_verbatim_and_links() {
        let rich = html_of(
            r#"<q><verbatim>if a &lt; b:
    pass</verbatim><ref href="https://moodle.org">Moodle</ref><ref>plain</ref></q>"#,
        );
        assert_eq!(
            rich.html,
            "<pre>if a &lt; b:\n    pass</pre><a href=\"https://moodle.org\">Moodle</a>plain"
        );
    }

    #[test]
    fn test_missing_graphic_is_dropped() {
        let rich = html_of(r#"<q><p>see <graphics graphic="nowhere"/></p></q>"#);
        assert_eq!(rich.html, "<p>see </p>");
        assert!(rich.files.is_empty());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b "), " a b ");
        assert_eq!(collapse_whitespace("ab"), "ab");
    }
}
