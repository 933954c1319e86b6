use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckweave::ooxml::pptx::verify_file;
use deckweave::{ApplyOptions, OperationPlan, OrphanPolicy, apply_ops};
use tracing_subscriber::EnvFilter;

/// Structural editing and verification of .pptx packages.
#[derive(Debug, Parser)]
#[command(name = "deckweave", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply an operation plan to a template and write the result.
    Apply {
        /// Template package; overrides the plan's `template_pptx`.
        #[arg(long, alias = "input")]
        template: Option<PathBuf>,
        /// Plan file (JSON, or YAML for .yaml/.yml).
        #[arg(long)]
        ops_file: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Validate the result before writing it.
        #[arg(long)]
        verify: bool,
        /// Report validation issues as warnings instead of failing.
        #[arg(long)]
        no_strict_verify: bool,
        /// Drop parts nothing references any more.
        #[arg(long)]
        compact: bool,
    },
    /// Check the relationship graph of a package and print any issues.
    Verify { file: PathBuf },
}

fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Apply {
            template,
            ops_file,
            output,
            verify,
            no_strict_verify,
            compact,
        } => {
            let plan = OperationPlan::from_file(&ops_file)
                .with_context(|| format!("failed to load plan {}", ops_file.display()))?;
            let options = ApplyOptions {
                verify,
                strict_verify: !no_strict_verify,
                orphans: if compact {
                    OrphanPolicy::Compact
                } else {
                    OrphanPolicy::Preserve
                },
            };
            let result = apply_ops(template.as_deref(), &plan, &output, &options, None)
                .context("failed to apply operations")?;

            println!(
                "{}: {} operations applied",
                result.output_path.display(),
                result.operations_applied
            );
            for issue in &result.verify_issues {
                println!("warning: {}", issue);
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Verify { file } => {
            let report = verify_file(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            if report.is_ok() {
                println!("{}: OK", file.display());
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &report.issues {
                println!("{}", issue);
            }
            Ok(ExitCode::FAILURE)
        },
    }
}

fn init_logging() {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
