//! Quiz → Moodle XML.
//!
//! Builds the `<quiz>` tree Moodle's "Moodle XML format" importer reads:
//! one category marker followed by its `multichoice` questions, for every
//! category in order.

use std::path::Path;

use crate::error::{ConvertError, ConvertResult};
use crate::node::{Document, Element};
use crate::quiz::scoring::format_fraction;
use crate::quiz::{Answer, Category, Question, Quiz, RichText};
use crate::render::{self, RenderConfig};

/// Build the Moodle XML tree for a quiz.
pub fn to_document(quiz: &Quiz) -> Document {
    let mut root = Element::new("quiz");
    for category in &quiz.categories {
        root.push(category_marker(category));
        for question in &category.questions {
            root.push(multichoice(question));
        }
    }
    Document::new(root)
}

/// Render a quiz as a Moodle XML string.
pub fn to_string(quiz: &Quiz, pretty: bool) -> String {
    render::render_document(&to_document(quiz), &RenderConfig::XML.pretty(pretty))
}

/// Write a quiz to `path`.
pub fn write(quiz: &Quiz, path: &Path) -> ConvertResult<()> {
    std::fs::write(path, to_string(quiz, false)).map_err(|e| ConvertError::io(path, e))
}

// =============================================================================
// Elements
// =============================================================================

fn category_marker(category: &Category) -> Element {
    Element::new("question")
        .attr("type", "category")
        .child(Element::new("category").child(text(&category.path)))
}

fn multichoice(question: &Question) -> Element {
    let mut elem = Element::new("question")
        .attr("type", "multichoice")
        .child(Element::new("name").child(text(&question.name)))
        .child(rich("questiontext", &question.text));

    if let Some(feedback) = &question.feedback {
        elem = elem.child(rich("generalfeedback", feedback));
    }

    elem = elem
        .child(Element::new("defaultgrade").text(format_fraction(question.default_grade)))
        .child(Element::new("penalty").text("0"))
        .child(Element::new("hidden").text("0"))
        .child(Element::new("single").text(question.kind.is_single().to_string()))
        .child(Element::new("shuffleanswers").text(if question.shuffle { "1" } else { "0" }))
        .child(Element::new("answernumbering").text("abc"));

    elem.children(question.answers.iter().map(answer))
}

fn answer(answer: &Answer) -> Element {
    let mut elem = rich("answer", &answer.text).attr("fraction", format_fraction(answer.fraction));
    elem.push(Element::new("feedback").attr("format", "html").child(Element::new("text")));
    elem
}

/// `<text>` element with plain content.
fn text(content: &str) -> Element {
    Element::new("text").text(content)
}

/// HTML field: `<tag format="html"><text><![CDATA[..]]></text><file/>..</tag>`.
fn rich(tag: &str, content: &RichText) -> Element {
    let mut elem = Element::new(tag)
        .attr("format", "html")
        .child(Element::new("text").cdata(content.html.as_str()));
    for file in &content.files {
        elem.push(
            Element::new("file")
                .attr("name", file.name.as_str())
                .attr("path", "/")
                .attr("encoding", "base64")
                .text(file.base64.as_str()),
        );
    }
    elem
}
