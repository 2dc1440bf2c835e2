//! Quiz model and the LaTeXML → quiz conversion.
//!
//! # Module Structure
//!
//! - `scoring` - AMC `\scoring` directives and Moodle fractions
//! - `html` - LaTeXML content → HTML question bodies
//! - `media` - picture lookup, conversion and embedding
//! - `extract` - tree walk building the [`Quiz`]

pub mod extract;
pub mod html;
pub mod media;
pub mod scoring;

pub use extract::{Extraction, extract};
pub use media::MediaStore;
pub use scoring::Scoring;

/// Root of every category path in a Moodle question bank.
pub const COURSE_ROOT: &str = "$course$";

// =============================================================================
// Model
// =============================================================================

/// Questions grouped by category, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quiz {
    pub categories: Vec<Category>,
}

impl Quiz {
    /// Total number of questions over all categories.
    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    /// Iterate over every question.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.categories.iter().flat_map(|c| c.questions.iter())
    }
}

/// A question bank category.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Full path, e.g. `$course$/quiz.tex/geometry`
    pub path: String,
    pub questions: Vec<Question>,
}

/// Single or multiple answer question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionKind {
    /// AMC `question`: exactly one correct choice
    #[default]
    Single,
    /// AMC `questionmult`: any number of correct choices
    Multiple,
}

impl QuestionKind {
    /// Read the `type` attribute written by the binding.
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("multiple") => QuestionKind::Multiple,
            _ => QuestionKind::Single,
        }
    }

    pub fn is_single(self) -> bool {
        self == QuestionKind::Single
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub name: String,
    pub kind: QuestionKind,
    pub text: RichText,
    pub answers: Vec<Answer>,
    /// From AMC `\explain`
    pub feedback: Option<RichText>,
    /// False when the choices were declared ordered (`[o]`)
    pub shuffle: bool,
    pub default_grade: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: RichText,
    pub correct: bool,
    /// Moodle grade in percent, already snapped to an accepted value
    pub fraction: f64,
}

/// HTML body plus the files it references through `@@PLUGINFILE@@`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichText {
    pub html: String,
    pub files: Vec<EmbeddedFile>,
}

impl RichText {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty() && self.files.is_empty()
    }
}

/// A file embedded in the Moodle XML as base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub name: String,
    pub base64: String,
}
