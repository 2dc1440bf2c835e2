//! Semantic conversion: LaTeXML XML → Moodle XML.
//!
//! The pipeline only knows the [`QuizConverter`] trait. [`MoodleConverter`]
//! is the native implementation: parse, extract the quiz, write it out.
//!
//! # Flow
//!
//! ```text
//! working_dir/tex2xml.xml
//!         │
//!         ▼ parse::parse_file()
//! Document
//!         │
//!         ▼ quiz::extract()   (pictures resolved from input_dir)
//! Quiz
//!         │
//!         ▼ moodle::write()
//! output_dir/output_file
//! ```

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ConvertResult;
use crate::moodle;
use crate::parse::{self, ParseConfig};
use crate::quiz::{self, MediaStore};
use crate::runner::CommandRunner;

/// Name of the Moodle XML copy left in the working directory.
pub const WORKING_COPY_NAME: &str = "moodle.xml";

/// Everything a converter needs to know about one run.
#[derive(Debug, Clone, Copy)]
pub struct ConvertRequest<'a> {
    /// LaTeXML output, relative to `working_dir`
    pub input_file: &'a str,
    /// Directory of the TeX file, base for pictures
    pub input_dir: &'a Path,
    /// Temporary directory of the run
    pub working_dir: &'a Path,
    pub output_file: &'a str,
    pub output_dir: &'a Path,
    /// Temporary files will be kept, leave intermediate results behind
    pub keep_temp: bool,
    /// Base category name
    pub category: &'a str,
}

impl ConvertRequest<'_> {
    pub fn input_path(&self) -> PathBuf {
        self.working_dir.join(self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(self.output_file)
    }
}

/// What a conversion produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub output: PathBuf,
    pub categories: usize,
    pub questions: usize,
    /// Questions left out, `name: reason`
    pub skipped: Vec<String>,
    pub media: usize,
}

/// Turns LaTeXML output into a quiz file.
pub trait QuizConverter: Sync {
    fn convert(&self, request: &ConvertRequest<'_>) -> ConvertResult<ConvertReport>;
}

// =============================================================================
// MoodleConverter
// =============================================================================

/// Native LaTeXML → Moodle XML converter.
pub struct MoodleConverter<'r> {
    runner: &'r dyn CommandRunner,
    /// ImageMagick, for pictures browsers cannot show
    magick: Option<PathBuf>,
}

impl<'r> MoodleConverter<'r> {
    pub fn new(runner: &'r dyn CommandRunner, magick: Option<PathBuf>) -> Self {
        Self { runner, magick }
    }
}

impl QuizConverter for MoodleConverter<'_> {
    fn convert(&self, request: &ConvertRequest<'_>) -> ConvertResult<ConvertReport> {
        info!("running quiz conversion");
        let input = request.input_path();
        let doc = parse::parse_file(&input, ParseConfig::MIXED)?;

        let mut media = MediaStore::new(
            request.input_dir,
            request.working_dir,
            self.magick.clone(),
            self.runner,
        );
        let extraction = quiz::extract(&doc, request.category, &input, &mut media)?;

        let output = request.output_path();
        moodle::write(&extraction.quiz, &output)?;
        if request.keep_temp {
            moodle::write(&extraction.quiz, &request.working_dir.join(WORKING_COPY_NAME))?;
        }

        let report = ConvertReport {
            output,
            categories: extraction.quiz.categories.len(),
            questions: extraction.quiz.question_count(),
            skipped: extraction.skipped,
            media: media.len(),
        };
        info!(
            categories = report.categories,
            questions = report.questions,
            skipped = report.skipped.len(),
            media = report.media,
            output = %report.output.display(),
            "quiz written"
        );
        Ok(report)
    }
}
