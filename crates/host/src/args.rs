//! Command line of `dryrun-host`.
//!
//! The launcher passes Windows-style switches (`/config:<path>`,
//! `/systray:<bool>`); they are rewritten to long options before clap sees
//! them, so `--config <path>` works too.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

const SLASH_SWITCHES: &[&str] = &["config", "systray"];

#[derive(Debug, Parser)]
#[command(name = "dryrun-host", version, about = "Serve a deployed DryRun test site")]
pub struct HostArgs {
    /// Rendered host configuration file
    #[arg(long, env = "DRYRUN_HOST_CONFIG")]
    pub config: PathBuf,

    /// Accepted for launcher compatibility; there is no tray icon
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    pub systray: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl HostArgs {
    /// Parse from `args` (including the program name).
    pub fn parse_normalized<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::parse_from(normalize(args))
    }
}

/// Rewrite `/name:value` switches to `--name=value`. Other arguments,
/// including absolute paths, pass through unchanged.
pub fn normalize<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .enumerate()
        .map(|(idx, arg)| {
            if idx == 0 {
                return arg;
            }
            match arg.strip_prefix('/').and_then(|rest| rest.split_once(':')) {
                Some((name, value)) if SLASH_SWITCHES.contains(&name) => {
                    format!("--{}={}", name, value)
                }
                _ => arg,
            }
        })
        .collect()
}
