//! Error types for amc2moodle.
//!
//! Every failure ends the current conversion; there is no partial output
//! recovery. The binary turns these into a log line and a non-zero exit.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while converting a quiz.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A required external program is not installed
    #[error("required tool `{tool}` not found, please install it ({hint})")]
    MissingTool {
        /// Program name looked up in `PATH`
        tool: &'static str,
        /// Where to get it
        hint: &'static str,
    },

    /// No input file was given
    #[error("input TeX file is missing")]
    NoInput,

    /// The input file does not exist
    #[error("input TeX file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// LaTeXML returned a failure status
    #[error("error during LaTeXML processing of {} (exit status: {})", .input.display(), format_code(.code))]
    Latexml {
        /// The TeX file being converted
        input: PathBuf,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
    },

    /// An external program could not be started
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        /// Program path or name
        program: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Filesystem operation failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// XML input is not well formed
    #[error("malformed XML in {origin}: {message}")]
    Xml {
        /// File name or `<memory>`
        origin: String,
        /// Parser message, with position
        message: String,
    },

    /// An AMC `\scoring` directive could not be read
    #[error("invalid scoring `{directive}`: {reason}")]
    Scoring {
        /// The raw directive text
        directive: String,
        /// What is wrong with it
        reason: String,
    },

    /// LaTeXML output did not contain a single usable question
    #[error("no question found in {}", .0.display())]
    EmptyQuiz(PathBuf),
}

fn format_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Result type alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

impl ConvertError {
    /// Create an I/O error bound to a path.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an XML error from any parser error.
    pub fn xml(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Xml {
            origin: origin.into(),
            message: err.to_string(),
        }
    }

    /// Create a scoring error.
    pub fn scoring(directive: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Scoring {
            directive: directive.into(),
            reason: reason.into(),
        }
    }
}
