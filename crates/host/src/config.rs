//! Host configuration file, as rendered from the dryrun template.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    pub port: u16,

    /// Challenge unauthenticated requests with `WWW-Authenticate: Negotiate`
    #[serde(default)]
    pub windows_authentication: bool,

    #[serde(default)]
    pub application: Vec<ApplicationConfig>,
}

/// A directory served under a URL path.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    pub path: String,
    pub physical_path: PathBuf,
}

fn default_site_name() -> String {
    "TestSite".to_string()
}

fn default_protocol() -> String {
    "http".to_string()
}

impl HostConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading host configuration {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing host configuration {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let site = &self.site;

        if site.protocol != "http" {
            bail!(
                "protocol '{}' is not supported, only plain http can be served",
                site.protocol
            );
        }
        if site.port == 0 {
            bail!("port must not be 0");
        }
        if site.application.is_empty() {
            bail!("site '{}' has no applications", site.name);
        }

        let mut seen = HashSet::new();
        for app in &site.application {
            if !app.path.starts_with('/') {
                bail!("application path '{}' must start with '/'", app.path);
            }
            if !seen.insert(app.mount_path()) {
                bail!("application path '{}' is configured twice", app.path);
            }
            if !app.physical_path.is_dir() {
                warn!(
                    path = %app.path,
                    "Physical path {} does not exist, requests will fail",
                    app.physical_path.display()
                );
            }
        }

        Ok(())
    }
}

impl ApplicationConfig {
    /// `path` without a trailing slash; `/` stays `/`.
    pub fn mount_path(&self) -> &str {
        match self.path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        }
    }

    pub fn is_root(&self) -> bool {
        self.mount_path() == "/"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn parse(text: &str) -> anyhow::Result<HostConfig> {
        let config: HostConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_parses_rendered_config() {
        let config = parse(
            r#"
[site]
name = "TestSite"
protocol = "http"
port = 9000
windows_authentication = false

[[site.application]]
path = "/blub"
physical_path = '/tmp'

[[site.application]]
path = "/"
physical_path = '/tmp'
"#,
        )
        .unwrap();
        assert_eq!(config.site.port, 9000);
        assert_eq!(config.site.application.len(), 2);
        assert!(!config.site.application[0].is_root());
        assert!(config.site.application[1].is_root());
    }

    #[test]
    fn test_https_is_rejected() {
        let err = parse(
            "[site]\nprotocol = \"https\"\nport = 44333\n[[site.application]]\npath = \"/\"\nphysical_path = '/tmp'\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("https"), "{}", err);
    }

    #[test]
    fn test_duplicate_mount_is_rejected() {
        let err = parse(
            "[site]\nport = 9000\n\
             [[site.application]]\npath = \"/a\"\nphysical_path = '/tmp'\n\
             [[site.application]]\npath = \"/a/\"\nphysical_path = '/tmp'\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("twice"), "{}", err);
    }

    #[test_case("/", "/" ; "root")]
    #[test_case("/blub/", "/blub" ; "trailing slash")]
    #[test_case("/a/b", "/a/b" ; "nested")]
    fn test_mount_path(path: &str, expected: &str) {
        let app = ApplicationConfig {
            path: path.to_string(),
            physical_path: PathBuf::from("/tmp"),
        };
        assert_eq!(app.mount_path(), expected);
    }
}
