//! Error types for DryRun

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using DryRun Error
pub type Result<T> = std::result::Result<T, Error>;

/// DryRun error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Option error in '{options}.{property}': {message}")]
    OptionValidation {
        options: String,
        property: String,
        message: String,
    },

    #[error("{message}")]
    BuildFailed {
        message: String,
        /// Complete build log.
        output: String,
        /// Errors-only excerpt, present when the build tool itself failed.
        error_output: Option<String>,
    },

    #[error("Build tool could not be started at {}: {source}", path.display())]
    BuildToolLaunch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve the build tool for tools version '{version}': {reason}")]
    ToolResolution { version: String, reason: String },

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Timeout after {after:?} waiting for: {what}")]
    Timeout { what: String, after: Duration },

    #[error("Configuration file not found: {}", .0.display())]
    ConfigurationFileNotFound(PathBuf),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Validation failure for `<options>.<property>`.
    pub fn option(
        options: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::OptionValidation {
            options: options.into(),
            property: property.into(),
            message: message.into(),
        }
    }

    pub(crate) fn option_cannot_be_empty(options: &str, property: &str) -> Self {
        Self::option(options, property, "Cannot be empty.")
    }

    /// Captured build log, if this is a build failure.
    pub fn build_output(&self) -> Option<&str> {
        match self {
            Error::BuildFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Internal(format!("supervisor task failed: {}", e))
    }
}
