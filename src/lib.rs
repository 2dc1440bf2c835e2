//! amc2moodle - Convert AMC LaTeX quizzes to Moodle XML
//!
//! ## Pipeline
//!
//! ```text
//! quiz.tex ─latexml─▶ tex2xml.xml ─parse─▶ Document ─extract─▶ Quiz ─moodle─▶ quiz.xml
//! ```
//!
//! LaTeXML is run with a bundled binding for the `automultiplechoice`
//! package, so questions come out as plain elements. The rest of the work
//! happens in process: the XML is parsed into a small tree, questions and
//! their scoring are read from it, and Moodle's import format is written.
//!
//! ## Modules
//! - `node`, `attr`: XML tree
//! - `parse`, `render`: XML text ↔ tree
//! - `quiz`: question model, extraction, scoring, HTML and images
//! - `moodle`: Moodle XML writer
//! - `convert`: conversion stage behind [`QuizConverter`]
//! - `pipeline`: end-to-end run, see [`Amc2Moodle`]
//!
//! ## Usage
//!
//! ```ignore
//! use amc2moodle::{Amc2Moodle, Options, SystemRunner};
//!
//! let outcome = Amc2Moodle::new(Options::new("exam.tex").category("Week 1"), &SystemRunner)?.run()?;
//! println!("{} questions", outcome.report.questions);
//! ```

// =============================================================================
// Tree
// =============================================================================

/// Attribute list helpers
pub mod attr;

/// Node types: Document, Element, Node, Text
pub mod node;

/// XML parsing
pub mod parse;

/// XML rendering
pub mod render;

/// Content hashing
pub mod hash;

// =============================================================================
// Conversion
// =============================================================================

/// Error types
pub mod error;

/// Options and resolved paths
pub mod config;

/// External tool discovery
pub mod tools;

/// External command execution
pub mod runner;

/// LaTeXML binding and invocation
pub mod latexml;

/// Quiz model and extraction
pub mod quiz;

/// Moodle XML writer
pub mod moodle;

/// Conversion stage
pub mod convert;

/// Output indentation
pub mod indent;

/// End-to-end pipeline
pub mod pipeline;

// =============================================================================
// Re-exports
// =============================================================================

pub use node::{Children, Document, Element, Node, Text, TextKind};

pub use attr::{Attrs, AttrsExt};

pub use hash::StableHasher;

pub use error::{ConvertError, ConvertResult};

pub use config::{Job, Options};

pub use tools::{Tool, Toolchain};

pub use runner::{CommandRunner, Exit, Invocation, SystemRunner};

pub use quiz::{Answer, Category, Question, QuestionKind, Quiz, Scoring};

pub use convert::{ConvertReport, ConvertRequest, MoodleConverter, QuizConverter};

pub use indent::Indenter;

pub use pipeline::{Amc2Moodle, IMPORT_INSTRUCTIONS, Outcome, run_batch};
