//! DryRun CLI
//!
//! Command-line interface for building, rendering and hosting DryRun test
//! sites.

pub mod commands;
pub mod output;
