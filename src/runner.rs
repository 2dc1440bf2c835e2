//! Subprocess invocation.
//!
//! External programs are described as an [`Invocation`] and executed by a
//! [`CommandRunner`]. Tests substitute a runner that fakes LaTeXML.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{ConvertError, ConvertResult};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Discard the program's standard output.
    pub quiet: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Value of a `--name=value` argument, if present.
    pub fn option(&self, name: &str) -> Option<PathBuf> {
        let prefix = format!("--{name}=");
        self.args.iter().find_map(|arg| {
            arg.to_str()
                .and_then(|s| s.strip_prefix(&prefix))
                .map(PathBuf::from)
        })
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Exit status of a finished program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub success: bool,
    /// `None` when terminated by a signal
    pub code: Option<i32>,
}

impl Exit {
    pub const OK: Self = Self {
        success: true,
        code: Some(0),
    };

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

/// Runs external programs to completion.
pub trait CommandRunner: Sync {
    fn run(&self, invocation: &Invocation) -> ConvertResult<Exit>;
}

/// Runs programs with `std::process`, inheriting stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> ConvertResult<Exit> {
        debug!(command = %invocation.display(), "running");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if invocation.quiet {
            command.stdout(Stdio::null());
        }
        let status = command.status().map_err(|source| ConvertError::Spawn {
            program: invocation.program.display().to_string(),
            source,
        })?;
        Ok(Exit {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// Run and turn a spawn failure into a failed exit.
///
/// Used for optional steps whose failure only warrants a warning.
pub fn run_lenient(runner: &dyn CommandRunner, invocation: &Invocation) -> Exit {
    match runner.run(invocation) {
        Ok(exit) => exit,
        Err(err) => {
            debug!(error = %err, "command could not be started");
            Exit {
                success: false,
                code: None,
            }
        }
    }
}

/// True when `path` names an existing file.
pub fn program_exists(path: &Path) -> bool {
    path.is_file()
}
