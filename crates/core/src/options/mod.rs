//! Option types with a two-phase finalize (defaults, then validation).

pub mod deployer;
pub mod file_logger;
pub mod resolver;
pub mod server;
pub mod site;
pub mod tools_version;

pub use deployer::{DeployerOptions, ResolvedDeployerOptions, MAX_ADDITIONAL_FILE_LOGGERS};
pub use file_logger::{FileLogger, MessageFilter, Verbosity};
pub use resolver::{HostPathResolver, ToolPathResolver};
pub use server::{ResolvedServerOptions, ServerOptions};
pub use site::{ResolvedSiteOptions, SiteOptions};
pub use tools_version::{
    default_tools_version, reset_default_tools_version, set_default_tools_version, ToolsVersion,
};
