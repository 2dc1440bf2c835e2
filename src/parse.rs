//! XML text to tree conversion
//!
//! Reads LaTeXML output (and our own Moodle output, for native indenting)
//! into a [`Document`]. Built on quick-xml's pull reader.
//!
//! # Flow
//!
//! ```text
//! tex2xml.xml
//!         │
//!         ▼ parse_file()
//! Document  (qualified names kept, entities resolved)
//!         │
//!         ▼ quiz::extract()
//! Quiz
//! ```

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{ConvertError, ConvertResult};
use crate::node::{Document, Element, Node, Text};

// =============================================================================
// ParseConfig
// =============================================================================

/// Configuration for XML parsing.
#[derive(Debug, Clone, Copy)]
pub struct ParseConfig {
    /// Keep text nodes that contain only whitespace.
    ///
    /// Needed for mixed content (`a <b>x</b> c`), useless for
    /// element-only documents that are about to be re-indented.
    pub keep_whitespace: bool,
}

impl ParseConfig {
    /// Mixed content documents such as LaTeXML output.
    pub const MIXED: Self = Self {
        keep_whitespace: true,
    };

    /// Data documents whose layout whitespace can be dropped.
    pub const DATA: Self = Self {
        keep_whitespace: false,
    };
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self::MIXED
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Internal state for tree construction
struct TreeBuilder<'a> {
    origin: &'a str,
    config: ParseConfig,
    /// Open elements, innermost last
    stack: Vec<Element>,
    root: Option<Element>,
}

impl<'a> TreeBuilder<'a> {
    fn new(origin: &'a str, config: ParseConfig) -> Self {
        Self {
            origin,
            config,
            stack: Vec::new(),
            root: None,
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) -> ConvertResult<()> {
        let element = self.element(start)?;
        self.stack.push(element);
        Ok(())
    }

    fn empty(&mut self, start: &BytesStart<'_>) -> ConvertResult<()> {
        let element = self.element(start)?;
        self.attach(element)
    }

    fn close(&mut self) -> ConvertResult<()> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| ConvertError::xml(self.origin, "unexpected closing tag"))?;
        self.attach(element)
    }

    fn text(&mut self, text: Text) {
        if !self.config.keep_whitespace && !text.is_cdata() && text.is_whitespace() {
            return;
        }
        // Text outside the root element is layout only
        if let Some(parent) = self.stack.last_mut() {
            // Merge adjacent text so `a &amp; b` stays one node
            if let Some(Node::Text(last)) = parent.children.last_mut() {
                if last.kind == text.kind {
                    last.content.push_str(&text.content);
                    return;
                }
            }
            parent.push(text);
        }
    }

    fn attach(&mut self, element: Element) -> ConvertResult<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.push(element);
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(element);
                Ok(())
            }
            None => Err(ConvertError::xml(self.origin, "more than one root element")),
        }
    }

    fn element(&self, start: &BytesStart<'_>) -> ConvertResult<Element> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new(tag);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ConvertError::xml(self.origin, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ConvertError::xml(self.origin, e))?
                .into_owned();
            element.attrs.push((key, value));
        }
        Ok(element)
    }

    fn finish(self) -> ConvertResult<Document> {
        if let Some(open) = self.stack.last() {
            return Err(ConvertError::xml(
                self.origin,
                format!("unclosed element <{}>", open.tag),
            ));
        }
        self.root
            .map(Document::new)
            .ok_or_else(|| ConvertError::xml(self.origin, "no root element"))
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Parse an XML string.
///
/// `origin` only labels error messages.
pub fn parse_str(xml: &str, origin: &str, config: ParseConfig) -> ConvertResult<Document> {
    let mut reader = Reader::from_str(xml);
    let mut builder = TreeBuilder::new(origin, config);

    loop {
        let event = reader.read_event().map_err(|e| {
            ConvertError::xml(origin, format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => builder.open(&start)?,
            Event::Empty(start) => builder.empty(&start)?,
            Event::End(_) => builder.close()?,
            Event::Text(text) => {
                let content = text.unescape().map_err(|e| ConvertError::xml(origin, e))?;
                builder.text(Text::new(content.into_owned()));
            }
            Event::CData(cdata) => {
                let content = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                builder.text(Text::cdata(content));
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    builder.finish()
}

/// Read and parse an XML file.
pub fn parse_file(path: &Path, config: ParseConfig) -> ConvertResult<Document> {
    let xml = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    parse_str(&xml, &path.display().to_string(), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_with_namespaces() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<?latexml class="article"?>
<document xmlns="http://dlmf.nist.gov/LaTeXML" xmlns:amc="urn:amc2moodle:quiz">
  <amc:question name="q1" type="single">
    <para><p>How much is <Math mode="inline" tex="2+2"/>?</p></para>
  </amc:question>
</document>"#;
        let doc = parse_str(xml, "<memory>", ParseConfig::MIXED).unwrap();

        assert_eq!(doc.root.tag, "document");
        let question = doc.root.first_child("question").unwrap();
        assert_eq!(question.tag, "amc:question");
        assert_eq!(question.get_attr("name"), Some("q1"));
        let math = doc.find_element(|e| e.is("Math")).unwrap();
        assert_eq!(math.get_attr("tex"), Some("2+2"));
        assert!(doc.find_element(|e| e.is("p")).unwrap().text_content().contains("How much is"));
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = "<a t=\"x &amp; y\">1 &lt; 2 &#233;<b><![CDATA[<p>]]></b></a>";
        let doc = parse_str(xml, "<memory>", ParseConfig::MIXED).unwrap();

        assert_eq!(doc.root.get_attr("t"), Some("x & y"));
        assert_eq!(doc.root.children[0].as_text().unwrap().content, "1 < 2 é");
        let b = doc.root.first_child("b").unwrap();
        assert!(b.children[0].as_text().unwrap().is_cdata());
        assert_eq!(b.text_content(), "<p>");
    }

    #[test]
    fn test_whitespace_handling() {
        let xml = "<quiz>\n  <question> <x/> </question>\n</quiz>";

        let doc = parse_str(xml, "<memory>", ParseConfig::DATA).unwrap();
        assert_eq!(doc.root.child_count(), 1);
        assert_eq!(doc.root.first_child("question").unwrap().child_count(), 1);

        let doc = parse_str(xml, "<memory>", ParseConfig::MIXED).unwrap();
        assert_eq!(doc.root.child_count(), 3);
    }

    #[test]
    fn test_malformed() {
        let err = parse_str("<a><b></a>", "broken.xml", ParseConfig::MIXED).unwrap_err();
        assert!(err.to_string().starts_with("malformed XML in broken.xml"));

        assert!(parse_str("<a>", "x", ParseConfig::MIXED).is_err());
        assert!(parse_str("", "x", ParseConfig::MIXED).is_err());
    }
}
