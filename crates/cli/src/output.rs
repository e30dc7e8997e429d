//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use dryrun::BuildOutcome;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Serializable view of a [`BuildOutcome`].
#[derive(Debug, Serialize)]
pub struct BuildReport<'a> {
    pub successful: bool,
    pub configuration: &'a str,
    pub deploy_directory: String,
    pub output: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_output: Option<&'a str>,
}

impl<'a> BuildReport<'a> {
    pub fn new(outcome: &'a BuildOutcome, configuration: &'a str, deploy_directory: String) -> Self {
        Self {
            successful: outcome.was_successful(),
            configuration,
            deploy_directory,
            output: outcome.output(),
            error_output: outcome.error_output(),
        }
    }
}

/// Print a build report
pub fn print_build(report: &BuildReport<'_>, format: OutputFormat, show_log: bool) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        }
        OutputFormat::Text => {
            if report.successful {
                println!(
                    "{} Build succeeded ({})",
                    "✓".green(),
                    report.configuration.bold()
                );
                println!("  Package: {}", report.deploy_directory);
            } else {
                println!(
                    "{} Build failed ({})",
                    "✗".red(),
                    report.configuration.bold()
                );
                if let Some(errors) = report.error_output {
                    println!("{}", errors.trim_end().red());
                }
            }
            if show_log {
                println!();
                println!("{}", report.output.trim_end().dimmed());
            }
        }
    }
}
