//! `dryrun render`: print the host configuration `up` would write.

use anyhow::Context;
use clap::Args;
use dryrun::{render, RenderParams, TemplateSource};
use std::path::{Path, PathBuf};

use super::SiteArgs;

#[derive(Debug, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Directory to serve; defaults to the deployer's deploy directory
    #[arg(long)]
    pub physical_path: Option<PathBuf>,

    /// Template file to render instead of the configured one
    #[arg(long)]
    pub template: Option<PathBuf>,
}

pub fn execute(args: RenderArgs, options_file: &Path) -> anyhow::Result<()> {
    let mut options = args.site.load(options_file)?;
    if let Some(template) = args.template {
        options.server.template = TemplateSource::File(template);
    }

    let server = options.server.finalize()?;
    let physical_path = match args.physical_path {
        Some(path) => path,
        None => options
            .deployer
            .finalize()
            .context("no --physical-path given and the deployer options are incomplete")?
            .deploy_directory()
            .to_path_buf(),
    };

    let template = server.template().load()?;
    let rendered = render(
        &template,
        &RenderParams {
            port: server.port(),
            physical_path: &physical_path,
            application_path: server.application_path(),
            windows_authentication: server.windows_authentication(),
            use_https: server.use_https(),
            format: server.template().format(),
        },
    )?;
    print!("{}", rendered);
    Ok(())
}
