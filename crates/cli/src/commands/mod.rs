//! CLI Commands

pub mod build;
pub mod init;
pub mod render;
pub mod up;

use clap::Args;
use dryrun::SiteOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides applied on top of the options file.
#[derive(Debug, Default, Args)]
pub struct SiteArgs {
    /// Project name (`<name>/<name>.csproj`)
    #[arg(long)]
    pub project: Option<String>,

    /// Solution directory
    #[arg(long)]
    pub solution_dir: Option<PathBuf>,

    /// Build configuration
    #[arg(long)]
    pub configuration: Option<String>,

    /// Port to host on
    #[arg(long)]
    pub port: Option<u16>,

    /// URL path to mount the site under
    #[arg(long)]
    pub path: Option<String>,
}

impl SiteArgs {
    /// Load `options_file` (defaults when missing) and apply the overrides.
    pub fn load(&self, options_file: &Path) -> anyhow::Result<SiteOptions> {
        let options = SiteOptions::load(options_file)?;
        debug!("Loaded options from {}", options_file.display());
        self.apply(options)
    }

    pub fn apply(&self, mut options: SiteOptions) -> anyhow::Result<SiteOptions> {
        if let Some(project) = &self.project {
            options.deployer.project_folder_name = project.clone();
            options.deployer.project_file_name = format!("{}.csproj", project);
        }
        if let Some(dir) = &self.solution_dir {
            options.deployer.solution_dir = Some(dir.clone());
        }
        if let Some(configuration) = &self.configuration {
            options.deployer.build_configuration = configuration.clone();
        }
        if let Some(port) = self.port {
            options.server = options.server.with_port(port);
        }
        if let Some(path) = &self.path {
            options.server = options.server.with_application_path(path.clone())?;
        }
        Ok(options)
    }
}
