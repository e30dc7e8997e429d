//! Pluggable executable lookup for the build tool and the hosting process.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::tools_version::ToolsVersion;
use crate::error::{Error, Result};

type ToolPathFn = dyn Fn(&ToolsVersion, bool) -> Result<PathBuf> + Send + Sync;
type HostPathFn = dyn Fn() -> Result<PathBuf> + Send + Sync;

/// Resolves the MSBuild executable for a tools version and bitness.
#[derive(Clone)]
pub struct ToolPathResolver(Arc<ToolPathFn>);

impl ToolPathResolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn(&ToolsVersion, bool) -> Result<PathBuf> + Send + Sync + 'static,
    {
        Self(Arc::new(resolve))
    }

    /// Always answer with `path`.
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move |_, _| Ok(path.clone()))
    }

    pub fn resolve(&self, version: &ToolsVersion, use_64bit: bool) -> Result<PathBuf> {
        (self.0)(version, use_64bit)
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new(locate_msbuild)
    }
}

impl fmt::Debug for ToolPathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ToolPathResolver(..)")
    }
}

/// Resolves the hosting process executable.
#[derive(Clone)]
pub struct HostPathResolver(Arc<HostPathFn>);

impl HostPathResolver {
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn() -> Result<PathBuf> + Send + Sync + 'static,
    {
        Self(Arc::new(resolve))
    }

    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move || Ok(path.clone()))
    }

    pub fn resolve(&self) -> Result<PathBuf> {
        (self.0)()
    }
}

impl Default for HostPathResolver {
    fn default() -> Self {
        Self::new(locate_host)
    }
}

impl fmt::Debug for HostPathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostPathResolver(..)")
    }
}

/// Environment variable naming an MSBuild executable explicitly.
pub const MSBUILD_EXE_PATH_ENV: &str = "MSBUILD_EXE_PATH";

/// Environment variable naming the DryRun installation directory.
pub const DRYRUN_HOME_ENV: &str = "DRYRUN_HOME";

/// File name of the bundled hosting process.
pub const HOST_EXECUTABLE: &str = if cfg!(windows) {
    "dryrun-host.exe"
} else {
    "dryrun-host"
};

/// Default MSBuild lookup.
///
/// Order: `MSBUILD_EXE_PATH`, the per-version install layout under
/// `ProgramFiles(x86)` / `ProgramFiles`, then `msbuild` on `PATH`.
pub fn locate_msbuild(version: &ToolsVersion, use_64bit: bool) -> Result<PathBuf> {
    if let Some(path) = non_empty_env(MSBUILD_EXE_PATH_ENV) {
        debug!("Using MSBuild from {}", MSBUILD_EXE_PATH_ENV);
        return Ok(PathBuf::from(path));
    }

    for root in program_files_dirs() {
        let candidate = msbuild_install_path(Path::new(&root), version, use_64bit);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let names: &[&str] = if cfg!(windows) {
        &["MSBuild.exe", "msbuild.exe"]
    } else {
        &["msbuild"]
    };
    for name in names {
        if let Some(found) = search_path(name) {
            return Ok(found);
        }
    }

    Err(Error::ToolResolution {
        version: version.to_string(),
        reason: format!(
            "no MSBuild installation found; set {} or supply a resolver",
            MSBUILD_EXE_PATH_ENV
        ),
    })
}

/// `<root>/MSBuild/<version>/Bin[/amd64]/MSBuild.exe`
pub fn msbuild_install_path(root: &Path, version: &ToolsVersion, use_64bit: bool) -> PathBuf {
    let mut path = root.join("MSBuild").join(version.as_str()).join("Bin");
    if use_64bit {
        path.push("amd64");
    }
    path.join("MSBuild.exe")
}

/// Default host lookup: `$DRYRUN_HOME/bin/dryrun-host`, else next to the
/// running executable.
pub fn locate_host() -> Result<PathBuf> {
    if let Some(home) = non_empty_env(DRYRUN_HOME_ENV) {
        return Ok(PathBuf::from(home).join("bin").join(HOST_EXECUTABLE));
    }

    let exe = env::current_exe()?;
    // Test binaries live one level below the target profile directory (`deps/`).
    for dir in exe.ancestors().skip(1).take(2) {
        let candidate = dir.join(HOST_EXECUTABLE);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(Error::ServerStartup(format!(
        "could not locate {}; set {} or configure the host executable",
        HOST_EXECUTABLE, DRYRUN_HOME_ENV
    )))
}

fn program_files_dirs() -> Vec<OsString> {
    ["ProgramFiles(x86)", "ProgramFiles"]
        .iter()
        .filter_map(|name| non_empty_env(name))
        .collect()
}

fn non_empty_env(name: &str) -> Option<OsString> {
    env::var_os(name).filter(|v| !v.is_empty())
}

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(false, "MSBuild/14.0/Bin/MSBuild.exe" ; "32 bit")]
    #[test_case(true, "MSBuild/14.0/Bin/amd64/MSBuild.exe" ; "64 bit")]
    fn test_msbuild_install_path(use_64bit: bool, expected: &str) {
        let path = msbuild_install_path(Path::new("root"), &ToolsVersion::V14_0, use_64bit);
        assert_eq!(path, Path::new("root").join(expected));
    }

    #[test]
    fn test_fixed_resolvers() {
        let tool = ToolPathResolver::fixed("/opt/msbuild");
        assert_eq!(
            tool.resolve(&ToolsVersion::V4_0, true).unwrap(),
            PathBuf::from("/opt/msbuild")
        );

        let host = HostPathResolver::fixed("/opt/host");
        assert_eq!(host.resolve().unwrap(), PathBuf::from("/opt/host"));
    }
}
