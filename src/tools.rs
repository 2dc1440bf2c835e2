//! External tool discovery.
//!
//! `latexml` is the only hard requirement. The indenters and ImageMagick
//! are picked up when present and skipped otherwise.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConvertError, ConvertResult};
use crate::runner::program_exists;

// =============================================================================
// Tool
// =============================================================================

/// External programs the pipeline may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Latexml,
    XmlIndent,
    XmlLint,
    Magick,
    /// ImageMagick 6 entry point, used when `magick` is absent
    Convert,
}

impl Tool {
    /// Binary name looked up in `PATH`.
    pub const fn binary(self) -> &'static str {
        match self {
            Tool::Latexml => "latexml",
            Tool::XmlIndent => "xmlindent",
            Tool::XmlLint => "xmllint",
            Tool::Magick => "magick",
            Tool::Convert => "convert",
        }
    }

    /// Where to get it.
    pub const fn install_hint(self) -> &'static str {
        match self {
            Tool::Latexml => "see https://dlmf.nist.gov/LaTeXML/",
            Tool::XmlIndent => "optional, see http://xmlindent.sourceforge.net/",
            Tool::XmlLint => "optional, part of libxml2",
            Tool::Magick | Tool::Convert => "optional, see https://imagemagick.org/",
        }
    }
}

// =============================================================================
// Toolchain
// =============================================================================

/// Resolved paths of the external programs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolchain {
    pub latexml: PathBuf,
    pub xmlindent: Option<PathBuf>,
    pub xmllint: Option<PathBuf>,
    /// ImageMagick, for PDF/EPS pictures
    pub magick: Option<PathBuf>,
}

impl Toolchain {
    /// Look every tool up in `PATH`.
    pub fn detect(latexml_override: Option<&Path>) -> ConvertResult<Self> {
        Self::detect_with(latexml_override, |name| which::which(name).ok())
    }

    /// Detect with a custom lookup.
    pub fn detect_with<F>(latexml_override: Option<&Path>, lookup: F) -> ConvertResult<Self>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let latexml = match latexml_override {
            Some(path) if program_exists(path) => path.to_path_buf(),
            Some(_) => return Err(missing(Tool::Latexml)),
            None => lookup(Tool::Latexml.binary()).ok_or_else(|| missing(Tool::Latexml))?,
        };

        let optional = |tool: Tool| {
            let found = lookup(tool.binary());
            if found.is_none() {
                debug!(tool = tool.binary(), hint = tool.install_hint(), "optional tool not found");
            }
            found
        };

        let toolchain = Self {
            latexml,
            xmlindent: optional(Tool::XmlIndent),
            xmllint: optional(Tool::XmlLint),
            magick: optional(Tool::Magick).or_else(|| optional(Tool::Convert)),
        };
        info!(latexml = %toolchain.latexml.display(), "tools ready");
        Ok(toolchain)
    }
}

fn missing(tool: Tool) -> ConvertError {
    ConvertError::MissingTool {
        tool: tool.binary(),
        hint: tool.install_hint(),
    }
}
