//! DryRun
//!
//! Builds a web project with MSBuild, hosts the packaged output with
//! `dryrun-host` on a local port for the duration of a test run, and shuts
//! the host down again afterwards.

pub mod build;
pub mod coordinator;
pub mod error;
pub mod options;
pub mod process;
pub mod readiness;
pub mod supervisor;
pub mod template;

// Re-export commonly used types
pub use build::{BuildInvoker, BuildOutcome};
pub use coordinator::DeploymentCoordinator;
pub use error::{Error, Result};
pub use options::{
    DeployerOptions, FileLogger, MessageFilter, ServerOptions, SiteOptions, ToolsVersion,
    Verbosity,
};
pub use supervisor::{ServerState, ServerSupervisor};
pub use template::{render, RenderParams, TemplateFormat, TemplateSource};

/// DryRun version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
