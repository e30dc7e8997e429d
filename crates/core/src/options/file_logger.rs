//! Build log verbosity and extra MSBuild file loggers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Verbosity used for MSBuild log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Build summary only
    Quiet,
    /// Errors, warnings, high-importance messages and a summary
    Minimal,
    /// Adds some status events
    #[default]
    Normal,
    /// Adds normal-importance messages and all status events
    Detailed,
    /// Everything
    Diagnostic,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verbosity::Quiet => "Quiet",
            Verbosity::Minimal => "Minimal",
            Verbosity::Normal => "Normal",
            Verbosity::Detailed => "Detailed",
            Verbosity::Diagnostic => "Diagnostic",
        };
        f.write_str(name)
    }
}

/// Which messages a file logger records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageFilter {
    #[default]
    Everything,
    ErrorsOnly,
    WarningsOnly,
}

/// An additional MSBuild file logger (`/flN /flpN:...`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLogger {
    /// Path of the log file to write
    pub path: PathBuf,

    pub verbosity: Verbosity,

    /// `Some(true)` emits `Summary`, `Some(false)` emits `NoSummary`
    #[serde(default)]
    pub show_summary: Option<bool>,

    /// Time spent in tasks, targets and projects
    #[serde(default)]
    pub show_performance_summary: bool,

    #[serde(default)]
    pub message_filter: MessageFilter,

    /// Suppress the item/property dump of diagnostic verbosity
    #[serde(default)]
    pub no_item_and_property_list: bool,

    #[serde(default)]
    pub show_timestamp: bool,

    #[serde(default)]
    pub show_command_line: bool,

    #[serde(default)]
    pub show_event_id: bool,

    #[serde(default)]
    pub force_no_align: bool,

    #[serde(default)]
    pub disable_console_color: bool,

    /// `Some(true)` emits `EnableMPLogging`, `Some(false)` emits `DisableMPLogging`
    #[serde(default = "default_multiprocessor_logging")]
    pub enable_multiprocessor_logging: Option<bool>,

    /// Raw parameters not covered by the fields above
    #[serde(default)]
    pub additional_flags: Vec<String>,
}

fn default_multiprocessor_logging() -> Option<bool> {
    Some(true)
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>, verbosity: Verbosity) -> Self {
        Self {
            path: path.into(),
            verbosity,
            show_summary: None,
            show_performance_summary: false,
            message_filter: MessageFilter::Everything,
            no_item_and_property_list: false,
            show_timestamp: false,
            show_command_line: false,
            show_event_id: false,
            force_no_align: false,
            disable_console_color: false,
            enable_multiprocessor_logging: default_multiprocessor_logging(),
            additional_flags: Vec::new(),
        }
    }

    /// Command line arguments registering this logger in `slot` (1..=9).
    pub fn arguments(&self, slot: usize) -> [String; 2] {
        [
            format!("/fl{}", slot),
            format!("/flp{}:{}", slot, self.parameters().join(";")),
        ]
    }

    fn parameters(&self) -> Vec<String> {
        let mut params = vec![
            format!("LogFile={}", self.path.display()),
            format!("Verbosity={}", self.verbosity),
        ];

        match self.show_summary {
            Some(true) => params.push("Summary".to_string()),
            Some(false) => params.push("NoSummary".to_string()),
            None => {}
        }

        if self.show_performance_summary {
            params.push("PerformanceSummary".to_string());
        }

        match self.message_filter {
            MessageFilter::Everything => {}
            MessageFilter::ErrorsOnly => params.push("ErrorsOnly".to_string()),
            MessageFilter::WarningsOnly => params.push("WarningsOnly".to_string()),
        }

        let switches = [
            (self.no_item_and_property_list, "NoItemAndPropertyList"),
            (self.show_command_line, "ShowCommandLine"),
            (self.show_timestamp, "ShowTimestamp"),
            (self.show_event_id, "ShowEventId"),
            (self.force_no_align, "ForceNoAlign"),
            (self.disable_console_color, "DisableConsoleColor"),
        ];
        params.extend(
            switches
                .iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, name)| name.to_string()),
        );

        match self.enable_multiprocessor_logging {
            Some(true) => params.push("EnableMPLogging".to_string()),
            Some(false) => params.push("DisableMPLogging".to_string()),
            None => {}
        }

        params.extend(self.additional_flags.iter().cloned());
        params
    }
}
