//! Options for hosting the deployed site.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::resolver::HostPathResolver;
use crate::error::{Error, Result};
use crate::template::TemplateSource;

pub const DEFAULT_HTTP_PORT: u16 = 8888;
pub const DEFAULT_HTTPS_PORT: u16 = 44333;

/// Rendered host configuration, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dryrun.host.toml";

/// How the deployed site is hosted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    /// Defaults to 8888 for HTTP and 44333 for HTTPS
    pub port: Option<u16>,

    /// URL path the application is mounted under. Must start with `/`.
    pub application_path: String,

    /// Let the host write to the console instead of the log
    pub show_window: bool,

    /// Require integrated Windows authentication
    pub windows_authentication: bool,

    pub use_https: bool,

    /// Pass `/systray:true` to the host
    pub systray: bool,

    /// Explicit host executable; the resolver is consulted when unset
    pub host_executable: Option<PathBuf>,

    pub template: TemplateSource,

    /// Where the rendered configuration is written
    pub config_file: Option<PathBuf>,

    /// How long `start` waits for the host process to launch
    pub startup_timeout_ms: u64,

    /// Grace period between the polite shutdown request and the kill
    pub shutdown_timeout_ms: u64,

    /// Also wait until the port accepts TCP connections before `start`
    /// returns. Off by default: readiness means "process spawned".
    pub wait_for_listener: bool,

    #[serde(skip)]
    pub host_path_resolver: HostPathResolver,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: None,
            application_path: "/".to_string(),
            show_window: false,
            windows_authentication: false,
            use_https: false,
            systray: false,
            host_executable: None,
            template: TemplateSource::default(),
            config_file: None,
            startup_timeout_ms: 10_000,
            shutdown_timeout_ms: 5_000,
            wait_for_listener: false,
            host_path_resolver: HostPathResolver::default(),
        }
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application path, rejecting paths that do not start with `/`.
    pub fn with_application_path(mut self, application_path: impl Into<String>) -> Result<Self> {
        let application_path = application_path.into();
        validate_application_path("server", &application_path)?;
        self.application_path = application_path;
        Ok(self)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Apply defaults and validate, tagging errors with `server`.
    pub fn finalize(self) -> Result<ResolvedServerOptions> {
        self.finalize_as("server")
    }

    /// Apply defaults and validate, tagging errors with `options_name`.
    pub fn finalize_as(self, options_name: &str) -> Result<ResolvedServerOptions> {
        self.apply_defaults()?.validate(options_name)
    }

    fn apply_defaults(self) -> Result<ResolvedServerOptions> {
        let port = self.port.unwrap_or(if self.use_https {
            DEFAULT_HTTPS_PORT
        } else {
            DEFAULT_HTTP_PORT
        });

        let cwd = std::env::current_dir()?;
        let config_file = match self.config_file {
            Some(path) => cwd.join(path),
            None => cwd.join(DEFAULT_CONFIG_FILE),
        };

        let host_path_resolver = match self.host_executable {
            Some(path) => HostPathResolver::fixed(path),
            None => self.host_path_resolver,
        };

        Ok(ResolvedServerOptions {
            port,
            application_path: self.application_path,
            show_window: self.show_window,
            windows_authentication: self.windows_authentication,
            use_https: self.use_https,
            systray: self.systray,
            host_path_resolver,
            template: self.template,
            config_file,
            startup_timeout: Duration::from_millis(self.startup_timeout_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            wait_for_listener: self.wait_for_listener,
        })
    }
}

fn validate_application_path(name: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::option(
            name,
            "application_path",
            "Application path must start with '/'.",
        ));
    }
    Ok(())
}

/// Server options after defaulting and validation.
#[derive(Debug, Clone)]
pub struct ResolvedServerOptions {
    port: u16,
    application_path: String,
    show_window: bool,
    windows_authentication: bool,
    use_https: bool,
    systray: bool,
    host_path_resolver: HostPathResolver,
    template: TemplateSource,
    config_file: PathBuf,
    startup_timeout: Duration,
    shutdown_timeout: Duration,
    wait_for_listener: bool,
}

impl ResolvedServerOptions {
    fn validate(self, name: &str) -> Result<Self> {
        validate_application_path(name, &self.application_path)?;

        if self.port == 0 {
            return Err(Error::option(name, "port", "Port must not be 0."));
        }

        if self.startup_timeout.is_zero() {
            return Err(Error::option(
                name,
                "startup_timeout_ms",
                "Startup timeout must be positive.",
            ));
        }

        Ok(self)
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn application_path(&self) -> &str {
        &self.application_path
    }

    pub fn show_window(&self) -> bool {
        self.show_window
    }

    pub fn windows_authentication(&self) -> bool {
        self.windows_authentication
    }

    pub fn use_https(&self) -> bool {
        self.use_https
    }

    pub fn systray(&self) -> bool {
        self.systray
    }

    pub fn host_path_resolver(&self) -> &HostPathResolver {
        &self.host_path_resolver
    }

    pub fn template(&self) -> &TemplateSource {
        &self.template
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn wait_for_listener(&self) -> bool {
        self.wait_for_listener
    }

    /// `http` or `https`
    pub fn scheme(&self) -> &'static str {
        if self.use_https {
            "https"
        } else {
            "http"
        }
    }

    /// URL of the hosted application, e.g. `http://localhost:8888/`.
    pub fn base_url(&self) -> String {
        format!(
            "{}://localhost:{}{}",
            self.scheme(),
            self.port,
            self.application_path
        )
    }
}
