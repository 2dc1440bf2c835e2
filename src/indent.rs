//! Pretty-printing of the finished Moodle XML.
//!
//! `xmlindent` is preferred, then `xmllint` (the usual choice on macOS).
//! Without either, the file is re-parsed and rendered with indentation.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{ConvertError, ConvertResult};
use crate::parse::{self, ParseConfig};
use crate::render::{self, RenderConfig};
use crate::runner::{CommandRunner, Invocation, run_lenient};
use crate::tools::Toolchain;

/// How the output gets indented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indenter {
    XmlIndent(PathBuf),
    XmlLint(PathBuf),
    Native,
}

impl Indenter {
    /// Best indenter available.
    pub fn select(tools: &Toolchain) -> Self {
        match (&tools.xmlindent, &tools.xmllint) {
            (Some(path), _) => Indenter::XmlIndent(path.clone()),
            (None, Some(path)) => Indenter::XmlLint(path.clone()),
            (None, None) => Indenter::Native,
        }
    }

    /// Command line for the external indenters.
    pub fn invocation(&self, file: &Path) -> Option<Invocation> {
        match self {
            Indenter::XmlIndent(bin) => Some(Invocation::new(bin).arg(file).arg("-o").arg(file).quiet()),
            Indenter::XmlLint(bin) => Some(
                Invocation::new(bin)
                    .arg(file)
                    .arg("--format")
                    .arg("--output")
                    .arg(file)
                    .quiet(),
            ),
            Indenter::Native => None,
        }
    }

    /// Indent `file` in place.
    ///
    /// A failing external indenter leaves the file untouched and only warns.
    pub fn apply(&self, runner: &dyn CommandRunner, file: &Path) -> ConvertResult<()> {
        info!(file = %file.display(), "indenting");
        match self.invocation(file) {
            Some(invocation) => {
                let exit = run_lenient(runner, &invocation);
                if !exit.success {
                    warn!(command = %invocation.display(), code = ?exit.code, "indenter failed, output left as is");
                }
                Ok(())
            }
            None => indent_native(file),
        }
    }
}

/// Re-render `file` with two-space indentation.
pub fn indent_native(file: &Path) -> ConvertResult<()> {
    let doc = parse::parse_file(file, ParseConfig::DATA)?;
    let xml = render::render_document(&doc, &RenderConfig::XML.pretty(true));
    std::fs::write(file, xml).map_err(|e| ConvertError::io(file, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Exit;

    struct Failing;

    impl CommandRunner for Failing {
        fn run(&self, _: &Invocation) -> ConvertResult<Exit> {
            Ok(Exit::failed(3))
        }
    }

    #[test]
    fn test_select_preference() {
        let mut tools = Toolchain {
            latexml: PathBuf::from("latexml"),
            xmlindent: Some(PathBuf::from("/bin/xmlindent")),
            xmllint: Some(PathBuf::from("/bin/xmllint")),
            magick: None,
        };
        assert_eq!(Indenter::select(&tools), Indenter::XmlIndent(PathBuf::from("/bin/xmlindent")));
        tools.xmlindent = None;
        assert_eq!(Indenter::select(&tools), Indenter::XmlLint(PathBuf::from("/bin/xmllint")));
        tools.xmllint = None;
        assert_eq!(Indenter::select(&tools), Indenter::Native);
    }

    #[test]
    fn test_invocations() {
        let file = Path::new("out.xml");
        let inv = Indenter::XmlLint(PathBuf::from("xmllint")).invocation(file).unwrap();
        assert_eq!(inv.display(), "xmllint out.xml --format --output out.xml");
        assert!(inv.quiet);
        let inv = Indenter::XmlIndent(PathBuf::from("xmlindent")).invocation(file).unwrap();
        assert_eq!(inv.display(), "xmlindent out.xml -o out.xml");
        assert!(Indenter::Native.invocation(file).is_none());
    }

    #[test]
    fn test_native_indent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.xml");
        std::fs::write(
            &file,
            "<?xml version=\"1.0\"?><quiz><question type=\"x\"><text><![CDATA[<p>a</p>]]></text></question></quiz>",
        )
        .unwrap();

        Indenter::Native.apply(&Failing, &file).unwrap();
        let xml = std::fs::read_to_string(&file).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<quiz>\n  <question type=\"x\">\n    <text><![CDATA[<p>a</p>]]></text>\n  </question>\n</quiz>\n"
        );
    }

    #[test]
    fn test_failing_indenter_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.xml");
        std::fs::write(&file, "<quiz/>").unwrap();

        Indenter::XmlLint(PathBuf::from("xmllint")).apply(&Failing, &file).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "<quiz/>");
    }
}
