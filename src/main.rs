use std::path::PathBuf;
use std::process::ExitCode;

use amc2moodle::{IMPORT_INSTRUCTIONS, Options, SystemRunner, Toolchain, run_batch};
use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Convert AMC (auto-multiple-choice) LaTeX quizzes to Moodle XML.
#[derive(Debug, Parser)]
#[command(name = "amc2moodle", version, about)]
struct Cli {
    /// AMC TeX files to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (default: input with a .xml extension); single input only
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep the temporary files next to the output
    #[arg(short = 'k', long = "keep-tmp-files")]
    keep: bool,

    /// Question bank category (default: the input path)
    #[arg(short = 'c', long = "catname")]
    catname: Option<String>,

    /// Indent the output XML
    #[arg(short = 'x', long = "indent-xml")]
    indent: bool,

    /// latexml binary to use instead of the one in PATH
    #[arg(long, env = "AMC2MOODLE_LATEXML")]
    latexml: Option<PathBuf>,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> Result<Vec<Options>> {
        if self.output.is_some() && self.inputs.len() > 1 {
            bail!("--output needs a single input file, got {}", self.inputs.len());
        }
        Ok(self
            .inputs
            .iter()
            .map(|input| {
                let mut options = Options::new(input).keep_temp(self.keep).indent(self.indent);
                if let Some(output) = &self.output {
                    options = options.output(output);
                }
                if let Some(category) = &self.catname {
                    options = options.category(category);
                }
                options
            })
            .collect())
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "amc2moodle=debug" } else { "amc2moodle=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.options()?;
    let tools = Toolchain::detect(cli.latexml.as_deref()).context("checking external tools")?;

    let mut failed = 0;
    for (input, result) in cli.inputs.iter().zip(run_batch(options, &tools, &SystemRunner)) {
        match result {
            Ok(outcome) => {
                info!(
                    input = %input.display(),
                    output = %outcome.output.display(),
                    questions = outcome.report.questions,
                    skipped = outcome.report.skipped.len(),
                    "converted"
                );
                if let Some(kept) = outcome.kept {
                    info!(dir = %kept.display(), "temporary files kept");
                }
            }
            Err(err) => {
                error!(input = %input.display(), error = %err, "conversion failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} file(s) failed", cli.inputs.len());
    }
    println!("{IMPORT_INSTRUCTIONS}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
