//! Run options and the paths derived from them.

use std::path::{Path, PathBuf};

use crate::error::{ConvertError, ConvertResult};

/// Name of the LaTeXML output inside the temporary directory.
pub const TEMP_XML_NAME: &str = "tex2xml.xml";

/// Prefix of the directory holding kept temporary files.
pub const KEEP_DIR_PREFIX: &str = "tmp_amc2moodle_";

// =============================================================================
// Options
// =============================================================================

/// User-facing options for one conversion.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// AMC TeX file.
    pub input: Option<PathBuf>,
    /// Moodle XML file; defaults to the input with an `.xml` extension.
    pub output: Option<PathBuf>,
    /// Copy temporary files next to the output.
    pub keep_temp: bool,
    /// Question bank category; defaults to the input path.
    pub category: Option<String>,
    /// Pretty-print the output.
    pub indent: bool,
    /// Explicit `latexml` binary instead of a `PATH` lookup.
    pub latexml: Option<PathBuf>,
}

impl Options {
    /// Options for the given input file.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: Some(input.into()),
            ..Self::default()
        }
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    pub fn category(mut self, name: impl Into<String>) -> Self {
        self.category = Some(name.into());
        self
    }

    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    pub fn latexml(mut self, path: impl Into<PathBuf>) -> Self {
        self.latexml = Some(path.into());
        self
    }

    /// Fill in defaults and check that the input exists.
    pub fn resolve(self) -> ConvertResult<Job> {
        let input = self.input.ok_or(ConvertError::NoInput)?;
        if !input.is_file() {
            return Err(ConvertError::InputNotFound(input));
        }
        let output = self.output.unwrap_or_else(|| default_output(&input));
        let category = self
            .category
            .unwrap_or_else(|| input.to_string_lossy().into_owned());

        Ok(Job {
            input,
            output,
            keep_temp: self.keep_temp,
            category,
            indent: self.indent,
        })
    }
}

// =============================================================================
// Job
// =============================================================================

/// Resolved options, every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub keep_temp: bool,
    pub category: String,
    pub indent: bool,
}

impl Job {
    /// Directory holding the TeX file, also the base for image lookups.
    pub fn input_dir(&self) -> PathBuf {
        parent_dir(&self.input)
    }

    pub fn input_name(&self) -> String {
        file_name(&self.input)
    }

    pub fn output_dir(&self) -> PathBuf {
        parent_dir(&self.output)
    }

    pub fn output_name(&self) -> String {
        file_name(&self.output)
    }
}

/// `quiz.tex` → `quiz.xml`, keeping the directory.
pub fn default_output(input: &Path) -> PathBuf {
    input.with_extension("xml")
}

/// File name without its directory.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory part of a path; `.` when there is none.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
