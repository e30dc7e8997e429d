//! `dryrun build`: run the build only and report the outcome.

use clap::Args;
use dryrun::DeploymentCoordinator;
use std::path::Path;

use super::SiteArgs;
use crate::output::{print_build, BuildReport, OutputFormat};

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Print the full build log
    #[arg(long)]
    pub log: bool,
}

/// Returns whether the build succeeded.
pub async fn execute(args: BuildArgs, options_file: &Path, format: OutputFormat) -> anyhow::Result<bool> {
    let options = args.site.load(options_file)?;
    let site = DeploymentCoordinator::new(options)?;
    let deployer = &site.options().deployer;

    let outcome = site.build().await?;
    let report = BuildReport::new(
        &outcome,
        deployer.build_configuration(),
        deployer.deploy_directory().display().to_string(),
    );
    print_build(&report, format, args.log);

    Ok(outcome.was_successful())
}
