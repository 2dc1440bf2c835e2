//! LaTeXML stage: TeX → XML.
//!
//! The AMC binding is compiled into the binary and written next to the
//! intermediate file, then handed to `latexml` through `--path`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ConvertError, ConvertResult};
use crate::runner::{CommandRunner, Invocation};

/// File name LaTeXML looks for when the document loads `automultiplechoice`.
pub const BINDING_NAME: &str = "automultiplechoice.sty.ltxml";

/// Binding source.
pub const BINDING_SOURCE: &str = include_str!("../bindings/automultiplechoice.sty.ltxml");

/// Namespace of the elements emitted by the binding.
pub const AMC_NAMESPACE: &str = "urn:amc2moodle:quiz";

/// Write the binding into `dir` and return its path.
pub fn stage_binding(dir: &Path) -> ConvertResult<PathBuf> {
    let path = dir.join(BINDING_NAME);
    std::fs::write(&path, BINDING_SOURCE).map_err(|e| ConvertError::io(&path, e))?;
    Ok(path)
}

/// Command line for one conversion.
pub fn invocation(latexml: &Path, binding_dir: &Path, dest: &Path, input: &Path) -> Invocation {
    Invocation::new(latexml)
        .arg("--noparse")
        .arg("--nocomments")
        .arg(format!("--path={}", binding_dir.display()))
        .arg(format!("--dest={}", dest.display()))
        .arg(input)
}

/// Run LaTeXML on `input`, writing `dest`.
///
/// A non-zero exit, or a zero exit that left no output, is an error.
pub fn run(
    runner: &dyn CommandRunner,
    latexml: &Path,
    binding_dir: &Path,
    dest: &Path,
    input: &Path,
) -> ConvertResult<()> {
    info!("running LaTeXML conversion");
    let exit = runner.run(&invocation(latexml, binding_dir, dest, input))?;
    if !exit.success || !dest.is_file() {
        return Err(ConvertError::Latexml {
            input: input.to_path_buf(),
            code: exit.code,
        });
    }
    Ok(())
}
