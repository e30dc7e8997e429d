//! DryRun CLI - Main Entry Point

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dryrun::options::site::DEFAULT_OPTIONS_FILE;
use dryrun_cli::commands::{build, init, render, up};
use dryrun_cli::output::OutputFormat;

/// DryRun - build, host and tear down web application test sites
#[derive(Parser)]
#[command(name = "dryrun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Options file
    #[arg(long, default_value = DEFAULT_OPTIONS_FILE, env = "DRYRUN_OPTIONS", global = true)]
    options: PathBuf,

    /// Output format
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the project, host it and stop on Ctrl-C
    Up(up::UpArgs),

    /// Build the project without hosting it
    Build(build::BuildArgs),

    /// Print the rendered host configuration
    Render(render::RenderArgs),

    /// Write a starter options file
    Init(init::InitArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Up(args) => up::execute(args, &cli.options).await?,
        Commands::Build(args) => {
            if !build::execute(args, &cli.options, cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::Render(args) => render::execute(args, &cli.options)?,
        Commands::Init(args) => init::execute(args, &cli.options)?,
        Commands::Version => {
            println!("DryRun CLI v{}", dryrun::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_up_with_overrides() {
        let cli = Cli::try_parse_from([
            "dryrun", "up", "--project", "Sample", "--port", "9000", "--path", "/blub",
        ])
        .unwrap();
        match cli.command {
            Commands::Up(args) => {
                assert_eq!(args.site.project.as_deref(), Some("Sample"));
                assert_eq!(args.site.port, Some(9000));
                assert_eq!(args.site.path.as_deref(), Some("/blub"));
            }
            _ => panic!("expected up"),
        }
        assert_eq!(cli.options, PathBuf::from(DEFAULT_OPTIONS_FILE));
    }

    #[test]
    fn test_parse_build_json() {
        let cli = Cli::try_parse_from(["dryrun", "--format", "json", "build", "--log"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Build(ref args) if args.log));
    }
}
