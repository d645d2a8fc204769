//! CLI command definitions and handlers

mod diagnose;
mod fix;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// codediag - code-health diagnosis
///
/// Turns parser metrics into prioritized, deduplicated findings and a
/// health score.
#[derive(Parser, Debug)]
#[command(name = "codediag")]
#[command(
    version,
    about = "Code-health diagnosis: complexity, coupling, dead code, test gaps, secrets and AI review",
    after_help = "\
Examples:
  codediag diagnose . --metrics metrics.json               Diagnose the current directory
  codediag diagnose . --metrics m.json --no-ai             Static analysis and secret scan only
  codediag diagnose . --metrics m.json -o report.json      Write the report, print a summary
  codediag fix . --report report.json --dry-run            Preview suggested fixes"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diagnose a project and print the report as JSON (exit code 1 on critical findings)
    Diagnose {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Parser output: JSON document with `files` and `test_files`
        #[arg(long, short = 'm')]
        metrics: PathBuf,

        /// Skip the AI review stage
        #[arg(long)]
        no_ai: bool,

        /// Recorded reviewer replies (JSON keyed by qualified function name)
        #[arg(long, env = "CODEDIAG_AI_REPLIES")]
        ai_replies: Option<PathBuf>,

        /// Write the report here instead of stdout, and print a summary
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Apply suggested fixes from a saved report
    Fix {
        /// Project root the report's paths are relative to
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Report JSON produced by `codediag diagnose`
        #[arg(long, short = 'r')]
        report: PathBuf,

        /// Show what would change without writing files
        #[arg(long)]
        dry_run: bool,
    },
}

/// Run the selected command and return the process exit code
pub fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Diagnose {
            path,
            metrics,
            no_ai,
            ai_replies,
            output,
        } => diagnose::run(&path, &metrics, no_ai, ai_replies.as_deref(), output.as_deref()),

        Commands::Fix {
            path,
            report,
            dry_run,
        } => fix::run(&path, &report, dry_run).map(|_| 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnose_args() {
        let cli = Cli::try_parse_from([
            "codediag",
            "diagnose",
            "proj",
            "--metrics",
            "m.json",
            "--no-ai",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Diagnose {
                path,
                metrics,
                no_ai,
                output,
                ..
            } => {
                assert_eq!(path, PathBuf::from("proj"));
                assert_eq!(metrics, PathBuf::from("m.json"));
                assert!(no_ai);
                assert!(output.is_none());
            }
            _ => panic!("expected diagnose"),
        }
    }

    #[test]
    fn test_metrics_is_required() {
        assert!(Cli::try_parse_from(["codediag", "diagnose", "."]).is_err());
    }

    #[test]
    fn test_fix_args() {
        let cli =
            Cli::try_parse_from(["codediag", "fix", "--report", "r.json", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Fix {
                path,
                report,
                dry_run,
            } => {
                assert_eq!(path, PathBuf::from("."));
                assert_eq!(report, PathBuf::from("r.json"));
                assert!(dry_run);
            }
            _ => panic!("expected fix"),
        }
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Cli::try_parse_from(["codediag", "--log-level", "loud", "fix", "-r", "x"]).is_err());
    }
}
