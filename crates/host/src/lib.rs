//! dryrun-host
//!
//! Serves the directories of a rendered DryRun host configuration over
//! plain HTTP until it is asked to shut down.

pub mod args;
pub mod config;
pub mod server;

pub use args::HostArgs;
pub use config::HostConfig;
