//! `dryrun up`: deploy, host until interrupted, tear down.

use clap::Args;
use colored::Colorize;
use dryrun::DeploymentCoordinator;
use std::path::Path;
use tracing::{info, warn};

use super::SiteArgs;

#[derive(Debug, Args)]
pub struct UpArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Wait until the host accepts connections before reporting it as up
    #[arg(long)]
    pub wait_for_listener: bool,
}

pub async fn execute(args: UpArgs, options_file: &Path) -> anyhow::Result<()> {
    let mut options = args.site.load(options_file)?;
    options.server.wait_for_listener |= args.wait_for_listener;

    let mut site = DeploymentCoordinator::new(options)?;
    if let Err(e) = site.start().await {
        if let Some(log) = e.build_output() {
            eprintln!("{}", log.trim_end().dimmed());
        }
        return Err(e.into());
    }

    println!("{} Serving {}", "✓".green(), site.base_url().bold());
    println!("  Package: {}", site.deploy_directory().display());
    println!("  Press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable: {}", e);
    }

    info!("Shutting down");
    site.stop().await?;
    println!("{} Stopped", "✓".green());
    Ok(())
}
