//! MSBuild tools versions and the process-wide default.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

/// An MSBuild tools version selector such as `4.0` or `14.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolsVersion(Cow<'static, str>);

impl ToolsVersion {
    /// Shipped with .NET Framework 2.0
    pub const V2_0: ToolsVersion = ToolsVersion(Cow::Borrowed("2.0"));
    /// Shipped with .NET Framework 3.5
    pub const V3_5: ToolsVersion = ToolsVersion(Cow::Borrowed("3.5"));
    /// Shipped with .NET Framework 4.0
    pub const V4_0: ToolsVersion = ToolsVersion(Cow::Borrowed("4.0"));
    /// Visual Studio 2013
    pub const V12_0: ToolsVersion = ToolsVersion(Cow::Borrowed("12.0"));
    /// Visual Studio 2015
    pub const V14_0: ToolsVersion = ToolsVersion(Cow::Borrowed("14.0"));
    /// Visual Studio 2017
    pub const V15_0: ToolsVersion = ToolsVersion(Cow::Borrowed("15.0"));

    /// A version not covered by the named constants, e.g. `"16.0"`.
    pub fn custom(version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::option_cannot_be_empty("deployer", "tools_version"));
        }
        Ok(Self(Cow::Owned(version)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ToolsVersion {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::custom(value)
    }
}

impl From<ToolsVersion> for String {
    fn from(value: ToolsVersion) -> Self {
        value.0.into_owned()
    }
}

/// Process-wide default applied to options that leave `tools_version` unset.
///
/// This is global mutable state shared by every test in the process. Tests
/// that change it must call [`reset_default_tools_version`] when done and
/// must not run in parallel with tests that rely on the built-in default.
static DEFAULT_TOOLS_VERSION: RwLock<Option<ToolsVersion>> = RwLock::new(None);

/// The current process-wide default, `4.0` unless overridden.
pub fn default_tools_version() -> ToolsVersion {
    DEFAULT_TOOLS_VERSION
        .read()
        .clone()
        .unwrap_or(ToolsVersion::V4_0)
}

/// Override the process-wide default tools version.
pub fn set_default_tools_version(version: ToolsVersion) {
    *DEFAULT_TOOLS_VERSION.write() = Some(version);
}

/// Restore the built-in default (`4.0`).
pub fn reset_default_tools_version() {
    *DEFAULT_TOOLS_VERSION.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_rejects_blank() {
        assert!(ToolsVersion::custom("  ").is_err());
        assert_eq!(ToolsVersion::custom("16.0").unwrap().as_str(), "16.0");
    }

    #[test]
    fn test_default_can_be_set_and_reset() {
        set_default_tools_version(ToolsVersion::V14_0);
        assert_eq!(default_tools_version(), ToolsVersion::V14_0);
        reset_default_tools_version();
        assert_eq!(default_tools_version(), ToolsVersion::V4_0);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ToolsVersion = serde_json::from_str("\"12.0\"").unwrap();
        assert_eq!(ok, ToolsVersion::V12_0);
        assert!(serde_json::from_str::<ToolsVersion>("\"\"").is_err());
    }
}
