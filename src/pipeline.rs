//! Conversion pipeline.
//!
//! [`Amc2Moodle`] drives one conversion from a TeX file to a Moodle XML
//! file. The stages run strictly in order and the first failure stops the
//! run:
//!
//! ```text
//! check tools ─▶ resolve job ─▶ stage binding ─▶ latexml ─▶ convert
//!             ─▶ keep temp files (optional) ─▶ indent (optional)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use amc2moodle::{Amc2Moodle, Options, SystemRunner};
//!
//! let outcome = Amc2Moodle::new(Options::new("quiz.tex").indent(true), &SystemRunner)?
//!     .run()?;
//! println!("written {}", outcome.output.display());
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Job, KEEP_DIR_PREFIX, Options, TEMP_XML_NAME};
use crate::convert::{ConvertReport, ConvertRequest, MoodleConverter, QuizConverter};
use crate::error::{ConvertError, ConvertResult};
use crate::indent::Indenter;
use crate::latexml;
use crate::runner::CommandRunner;
use crate::tools::Toolchain;

/// Printed after a successful conversion.
pub const IMPORT_INSTRUCTIONS: &str = "\
File converted. Check above for errors...

For import into Moodle:
--------------------------------
- Go to the course administration > Question bank > Import
- Choose 'Moodle XML format'
- In the 'General' options choose 'Nearest grade if not listed',
  since Moodle uses tabulated grades like 1/2, 1/3 etc...";

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: PathBuf,
    /// Copy of the temporary files, when asked for
    pub kept: Option<PathBuf>,
    pub report: ConvertReport,
}

// =============================================================================
// Amc2Moodle
// =============================================================================

/// One TeX file to convert, with everything needed to do it.
pub struct Amc2Moodle<'a> {
    job: Job,
    tools: Toolchain,
    runner: &'a dyn CommandRunner,
    converter: Option<&'a dyn QuizConverter>,
}

impl<'a> Amc2Moodle<'a> {
    /// Check the tools in `PATH`, then the options.
    pub fn new(options: Options, runner: &'a dyn CommandRunner) -> ConvertResult<Self> {
        let tools = Toolchain::detect(options.latexml.as_deref())?;
        Self::with_toolchain(options, tools, runner)
    }

    /// Use already detected tools.
    pub fn with_toolchain(
        options: Options,
        tools: Toolchain,
        runner: &'a dyn CommandRunner,
    ) -> ConvertResult<Self> {
        let job = options.resolve()?;
        Ok(Self {
            job,
            tools,
            runner,
            converter: None,
        })
    }

    /// Replace the native Moodle converter.
    pub fn with_converter(mut self, converter: &'a dyn QuizConverter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Run every stage.
    pub fn run(&self) -> ConvertResult<Outcome> {
        info!(input = %self.job.input.display(), "start amc2moodle");
        let temp = tempfile::Builder::new()
            .prefix("amc2moodle")
            .tempdir()
            .map_err(|e| ConvertError::io(std::env::temp_dir(), e))?;
        self.show_parameters(temp.path());

        let result = self.run_in(temp.path());
        cleanup(temp);
        result
    }

    fn run_in(&self, work: &Path) -> ConvertResult<Outcome> {
        let job = &self.job;
        let temp_xml = work.join(TEMP_XML_NAME);

        latexml::stage_binding(work)?;
        latexml::run(self.runner, &self.tools.latexml, work, &temp_xml, &job.input)?;

        let input_dir = job.input_dir();
        let output_dir = job.output_dir();
        let output_file = job.output_name();
        let request = ConvertRequest {
            input_file: TEMP_XML_NAME,
            input_dir: &input_dir,
            working_dir: work,
            output_file: &output_file,
            output_dir: &output_dir,
            keep_temp: job.keep_temp,
            category: &job.category,
        };
        let native = MoodleConverter::new(self.runner, self.tools.magick.clone());
        let converter: &dyn QuizConverter = match self.converter {
            Some(converter) => converter,
            None => &native,
        };
        let report = converter.convert(&request)?;

        let kept = if job.keep_temp {
            let kept = keep_files(work, &output_dir)?;
            info!(dir = %kept.display(), "save all temp files");
            Some(kept)
        } else {
            None
        };

        if job.indent {
            Indenter::select(&self.tools).apply(self.runner, &report.output)?;
        }

        Ok(Outcome {
            output: report.output.clone(),
            kept,
            report,
        })
    }

    fn show_parameters(&self, temp: &Path) {
        let job = &self.job;
        info!(
            input_dir = %job.input_dir().display(),
            input_file = %job.input_name(),
            temp_dir = %temp.display(),
            output_dir = %job.output_dir().display(),
            output_file = %job.output_name(),
            temp_xml = %temp.join(TEMP_XML_NAME).display(),
            keep_temp = job.keep_temp,
            category = %job.category,
            indent = job.indent,
            "parameters"
        );
    }
}

fn cleanup(temp: TempDir) {
    let path = temp.path().to_path_buf();
    if let Err(err) = temp.close() {
        warn!(dir = %path.display(), error = %err, "temporary directory not removed");
    }
}

/// Copy the working directory to `<output_dir>/tmp_amc2moodle_XXXX/files`.
pub fn keep_files(work: &Path, output_dir: &Path) -> ConvertResult<PathBuf> {
    let holder = tempfile::Builder::new()
        .prefix(KEEP_DIR_PREFIX)
        .keep(true)
        .tempdir_in(output_dir)
        .map_err(|e| ConvertError::io(output_dir, e))?;
    let dest = holder.path().join("files");

    for entry in WalkDir::new(work) {
        let entry = entry.map_err(|e| ConvertError::io(work, e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(work) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| ConvertError::io(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| ConvertError::io(&target, e))?;
        }
    }
    Ok(holder.path().to_path_buf())
}

// =============================================================================
// Batch
// =============================================================================

/// Convert several files with the same tools, one result per file.
///
/// With the `parallel` feature the files are converted concurrently.
pub fn run_batch(
    options: Vec<Options>,
    tools: &Toolchain,
    runner: &dyn CommandRunner,
) -> Vec<ConvertResult<Outcome>> {
    let convert = |options: Options| {
        Amc2Moodle::with_toolchain(options, tools.clone(), runner).and_then(|p| p.run())
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        options.into_par_iter().map(convert).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        options.into_iter().map(convert).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config;
    use crate::convert::WORKING_COPY_NAME;
    use crate::latexml::BINDING_NAME;
    use crate::runner::{Exit, Invocation};

    const SAMPLE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/quiz.latexml.xml"));

    /// Plays LaTeXML: writes the fixture to `--dest`.
    #[derive(Default)]
    struct FakeLatexml {
        fail: bool,
        calls: Mutex<Vec<Invocation>>,
    }

    impl CommandRunner for FakeLatexml {
        fn run(&self, invocation: &Invocation) -> ConvertResult<Exit> {
            self.calls.lock().unwrap().push(invocation.clone());
            if self.fail {
                return Ok(Exit::failed(1));
            }
            let binding = invocation.option("path").unwrap().join(BINDING_NAME);
            assert!(binding.is_file(), "binding staged before latexml runs");
            std::fs::write(invocation.option("dest").unwrap(), SAMPLE).unwrap();
            Ok(Exit::OK)
        }
    }

    fn tools() -> Toolchain {
        Toolchain {
            latexml: PathBuf::from("latexml"),
            ..Toolchain::default()
        }
    }

    fn input_in(dir: &Path) -> PathBuf {
        let input = dir.join("quiz.tex");
        std::fs::write(&input, "\\documentclass{article}\\usepackage{automultiplechoice}").unwrap();
        input
    }

    fn work_dir_of(runner: &FakeLatexml) -> PathBuf {
        runner.calls.lock().unwrap()[0].option("path").unwrap()
    }

    #[test]
    fn test_run_default_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path());
        let runner = FakeLatexml::default();

        let outcome = Amc2Moodle::with_toolchain(Options::new(&input), tools(), &runner)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(outcome.output, dir.path().join("quiz.xml"));
        assert_eq!(outcome.kept, None);
        assert_eq!(outcome.report.questions, 3);
        let xml = std::fs::read_to_string(&outcome.output).unwrap();
        assert!(xml.contains(&format!("$course$/{}", input.display())));

        // The temporary directory is gone after the run
        assert!(!work_dir_of(&runner).exists());
    }

    #[test]
    fn test_keep_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let input = input_in(dir.path());
        let runner = FakeLatexml::default();

        let options = Options::new(&input)
            .output(out.path().join("moodle.xml"))
            .keep_temp(true)
            .category("Chapter 1");
        let outcome = Amc2Moodle::with_toolchain(options, tools(), &runner)
            .unwrap()
            .run()
            .unwrap();

        let kept = outcome.kept.unwrap();
        assert!(kept.starts_with(out.path()));
        assert!(config::file_name(&kept).starts_with(KEEP_DIR_PREFIX));
        let files = kept.join("files");
        assert!(files.join(TEMP_XML_NAME).is_file());
        assert!(files.join(BINDING_NAME).is_file());
        assert!(files.join(WORKING_COPY_NAME).is_file());

        let xml = std::fs::read_to_string(out.path().join("moodle.xml")).unwrap();
        assert!(xml.contains("$course$/Chapter 1/geometry"));
    }

    #[test]
    fn test_latexml_failure_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path());
        let runner = FakeLatexml {
            fail: true,
            ..FakeLatexml::default()
        };

        let err = Amc2Moodle::with_toolchain(Options::new(&input), tools(), &runner)
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, ConvertError::Latexml { .. }));
        assert!(!dir.path().join("quiz.xml").exists());
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_native_indent_when_no_indenter() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path());
        let runner = FakeLatexml::default();

        let outcome = Amc2Moodle::with_toolchain(Options::new(&input).indent(true), tools(), &runner)
            .unwrap()
            .run()
            .unwrap();
        let xml = std::fs::read_to_string(outcome.output).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<quiz>\n  <question type=\"category\">\n"));
        // Only latexml was called
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_custom_converter() {
        struct Counting(Mutex<usize>);

        impl QuizConverter for Counting {
            fn convert(&self, request: &ConvertRequest<'_>) -> ConvertResult<ConvertReport> {
                *self.0.lock().unwrap() += 1;
                assert_eq!(request.input_file, TEMP_XML_NAME);
                assert!(request.input_path().is_file());
                Ok(ConvertReport {
                    output: request.output_path(),
                    ..ConvertReport::default()
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let input = input_in(dir.path());
        let runner = FakeLatexml::default();
        let converter = Counting(Mutex::new(0));

        let outcome = Amc2Moodle::with_toolchain(Options::new(&input), tools(), &runner)
            .unwrap()
            .with_converter(&converter)
            .run()
            .unwrap();
        assert_eq!(*converter.0.lock().unwrap(), 1);
        assert_eq!(outcome.output, dir.path().join("quiz.xml"));
    }

    #[test]
    fn test_missing_input() {
        let runner = FakeLatexml::default();
        let result = Amc2Moodle::with_toolchain(Options::new("/nonexistent/quiz.tex"), tools(), &runner);
        assert!(matches!(result, Err(ConvertError::InputNotFound(_))));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_batch() {
        let dir = tempfile::tempdir().unwrap();
        let first = input_in(dir.path());
        let second = dir.path().join("second.tex");
        std::fs::copy(&first, &second).unwrap();
        let runner = FakeLatexml::default();

        let results = run_batch(
            vec![Options::new(&first), Options::new(&second), Options::new(dir.path().join("none.tex"))],
            &tools(),
            &runner,
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap().output, dir.path().join("second.xml"));
        assert!(matches!(results[2], Err(ConvertError::InputNotFound(_))));
    }
}
