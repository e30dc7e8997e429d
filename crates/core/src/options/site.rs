//! Combined deployer + server options and the `dryrun.toml` file layer.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::deployer::{DeployerOptions, ResolvedDeployerOptions};
use super::server::{ResolvedServerOptions, ServerOptions};
use crate::error::Result;

/// Default name of the options file.
pub const DEFAULT_OPTIONS_FILE: &str = "dryrun.toml";

/// Options for deploying and hosting one test site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteOptions {
    pub deployer: DeployerOptions,
    pub server: ServerOptions,
}

impl SiteOptions {
    /// Defaults for a project whose folder and file share `project_name`.
    pub fn for_project(project_name: impl Into<String>) -> Self {
        Self {
            deployer: DeployerOptions::new(project_name),
            server: ServerOptions::default(),
        }
    }

    /// Apply defaults and validate both halves.
    pub fn finalize(self) -> Result<ResolvedSiteOptions> {
        Ok(ResolvedSiteOptions {
            deployer: self.deployer.finalize_as("deployer")?,
            server: self.server.finalize_as("server")?,
        })
    }

    /// Load options from a TOML file, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let options: Self = toml::from_str(&content)?;
            Ok(options)
        } else {
            Ok(Self::default())
        }
    }

    /// Save options to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Site options after defaulting and validation.
#[derive(Debug, Clone)]
pub struct ResolvedSiteOptions {
    pub deployer: ResolvedDeployerOptions,
    pub server: ResolvedServerOptions,
}
