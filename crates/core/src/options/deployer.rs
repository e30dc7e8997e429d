//! Options for building and packaging the site under test.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::file_logger::{FileLogger, Verbosity};
use super::resolver::ToolPathResolver;
use super::tools_version::{default_tools_version, ToolsVersion};
use crate::error::{Error, Result};

/// MSBuild accepts nine file loggers; two are reserved for the captured logs.
pub const MAX_ADDITIONAL_FILE_LOGGERS: usize = 7;

/// Settings file edited by `change_configuration_and_restart`.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// How the site is deployed (built and packaged with MSBuild).
///
/// Every field is optional in the sense that [`DeployerOptions::finalize`]
/// fills in defaults before validating; only the project names are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerOptions {
    /// Directory containing the project file, relative to the solution
    /// directory (`Project` for `C:\Solution\Project\Project.csproj`)
    pub project_folder_name: String,

    /// Project file name including the extension
    pub project_file_name: String,

    /// Solution directory, passed as `SolutionDir`. Defaults to the current
    /// working directory.
    pub solution_dir: Option<PathBuf>,

    /// Explicit project directory. Passed as `ProjectDir` only when set;
    /// otherwise `<solution_dir>/<project_folder_name>` is used.
    pub project_dir: Option<PathBuf>,

    /// Where the package lands. Defaults to
    /// `<project dir>/obj/<configuration>/Package/PackageTmp`. Not cleaned up.
    pub deploy_directory: Option<PathBuf>,

    pub build_targets: Vec<String>,

    pub build_configuration: String,

    /// Selects `Web.<name>.config` for the config transformation
    pub transformation_configuration: Option<String>,

    pub additional_build_properties: BTreeMap<String, String>,

    /// Falls back to the process-wide default when unset
    pub tools_version: Option<ToolsVersion>,

    pub verbosity: Verbosity,

    pub additional_file_loggers: Vec<FileLogger>,

    pub use_64bit: bool,

    /// Let the build tool write to the console instead of the log
    pub show_build_window: bool,

    /// File inside the deploy directory holding application settings
    pub settings_file_name: String,

    #[serde(skip)]
    pub tool_path_resolver: ToolPathResolver,
}

impl Default for DeployerOptions {
    fn default() -> Self {
        Self {
            project_folder_name: String::new(),
            project_file_name: String::new(),
            solution_dir: None,
            project_dir: None,
            deploy_directory: None,
            build_targets: vec!["Clean".to_string(), "Package".to_string()],
            build_configuration: "Test".to_string(),
            transformation_configuration: None,
            additional_build_properties: BTreeMap::new(),
            tools_version: None,
            verbosity: Verbosity::Normal,
            additional_file_loggers: Vec::new(),
            use_64bit: false,
            show_build_window: false,
            settings_file_name: DEFAULT_SETTINGS_FILE.to_string(),
            tool_path_resolver: ToolPathResolver::default(),
        }
    }
}

impl DeployerOptions {
    /// Project whose folder and file share a name: `<name>/<name>.csproj`.
    pub fn new(project_name: impl Into<String>) -> Self {
        let name = project_name.into();
        let file = format!("{}.csproj", name);
        Self::with_project_file(name, file)
    }

    /// Project whose folder and file names differ.
    pub fn with_project_file(
        project_folder_name: impl Into<String>,
        project_file_name: impl Into<String>,
    ) -> Self {
        Self {
            project_folder_name: project_folder_name.into(),
            project_file_name: project_file_name.into(),
            ..Default::default()
        }
    }

    /// Apply defaults and validate, tagging errors with `deployer`.
    pub fn finalize(self) -> Result<ResolvedDeployerOptions> {
        self.finalize_as("deployer")
    }

    /// Apply defaults and validate, tagging errors with `options_name`.
    pub fn finalize_as(self, options_name: &str) -> Result<ResolvedDeployerOptions> {
        self.apply_defaults()?.validate(options_name)
    }

    fn apply_defaults(self) -> Result<ResolvedDeployerOptions> {
        let solution_dir = match self.solution_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => std::env::current_dir()?,
        };

        let project_dir_explicit = self.project_dir.is_some();
        let project_dir = self
            .project_dir
            .unwrap_or_else(|| solution_dir.join(&self.project_folder_name));
        let project_file_path = project_dir.join(&self.project_file_name);

        let deploy_directory = self.deploy_directory.unwrap_or_else(|| {
            project_dir
                .join("obj")
                .join(&self.build_configuration)
                .join("Package")
                .join("PackageTmp")
        });

        Ok(ResolvedDeployerOptions {
            project_folder_name: self.project_folder_name,
            project_file_name: self.project_file_name,
            project_file_path,
            solution_dir,
            project_dir,
            project_dir_explicit,
            deploy_directory,
            build_targets: self.build_targets,
            build_configuration: self.build_configuration,
            transformation_configuration: self
                .transformation_configuration
                .filter(|name| !name.trim().is_empty()),
            additional_build_properties: self.additional_build_properties,
            tools_version: self.tools_version.unwrap_or_else(default_tools_version),
            verbosity: self.verbosity,
            additional_file_loggers: self.additional_file_loggers,
            use_64bit: self.use_64bit,
            show_build_window: self.show_build_window,
            settings_file_name: self.settings_file_name,
            tool_path_resolver: self.tool_path_resolver,
        })
    }
}

/// Deployer options after defaulting and validation.
#[derive(Debug, Clone)]
pub struct ResolvedDeployerOptions {
    project_folder_name: String,
    project_file_name: String,
    project_file_path: PathBuf,
    solution_dir: PathBuf,
    project_dir: PathBuf,
    project_dir_explicit: bool,
    deploy_directory: PathBuf,
    build_targets: Vec<String>,
    build_configuration: String,
    transformation_configuration: Option<String>,
    additional_build_properties: BTreeMap<String, String>,
    tools_version: ToolsVersion,
    verbosity: Verbosity,
    additional_file_loggers: Vec<FileLogger>,
    use_64bit: bool,
    show_build_window: bool,
    settings_file_name: String,
    tool_path_resolver: ToolPathResolver,
}

impl ResolvedDeployerOptions {
    fn validate(self, name: &str) -> Result<Self> {
        if self.build_configuration.trim().is_empty() {
            return Err(Error::option_cannot_be_empty(name, "build_configuration"));
        }

        if self.project_folder_name.trim().is_empty() && !self.project_dir_explicit {
            return Err(Error::option_cannot_be_empty(name, "project_folder_name"));
        }

        if self.project_file_name.trim().is_empty() {
            return Err(Error::option_cannot_be_empty(name, "project_file_name"));
        }

        if !self.solution_dir.is_dir() {
            return Err(Error::option(
                name,
                "solution_dir",
                format!(
                    "The solution directory '{}' could not be found.",
                    self.solution_dir.display()
                ),
            ));
        }

        if !self.project_dir.is_dir() {
            return Err(Error::option(
                name,
                "project_dir",
                format!(
                    "The project directory '{}' could not be found.",
                    self.project_dir.display()
                ),
            ));
        }

        if !self.project_file_path.is_file() {
            return Err(Error::option(
                name,
                "project_file_name",
                format!(
                    "The project file '{}' could not be found.",
                    self.project_file_path.display()
                ),
            ));
        }

        if self.build_targets.is_empty() {
            return Err(Error::option(
                name,
                "build_targets",
                "At least one build target is required.",
            ));
        }

        if self.build_targets.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::option(
                name,
                "build_targets",
                "Cannot contain build targets that are empty.",
            ));
        }

        if self.tools_version.as_str().trim().is_empty() {
            return Err(Error::option_cannot_be_empty(name, "tools_version"));
        }

        if self.additional_file_loggers.len() > MAX_ADDITIONAL_FILE_LOGGERS {
            return Err(Error::option(
                name,
                "additional_file_loggers",
                format!(
                    "It is not possible to supply more than {} additional file loggers \
                     (MSBuild supports 9 in total and 2 are used internally).",
                    MAX_ADDITIONAL_FILE_LOGGERS
                ),
            ));
        }

        Ok(self)
    }

    pub fn project_name(&self) -> &str {
        &self.project_folder_name
    }

    pub fn project_file_path(&self) -> &Path {
        &self.project_file_path
    }

    pub fn solution_dir(&self) -> &Path {
        &self.solution_dir
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// True when the caller set the project directory explicitly.
    pub fn project_dir_explicit(&self) -> bool {
        self.project_dir_explicit
    }

    pub fn deploy_directory(&self) -> &Path {
        &self.deploy_directory
    }

    pub fn build_targets(&self) -> &[String] {
        &self.build_targets
    }

    pub fn build_configuration(&self) -> &str {
        &self.build_configuration
    }

    pub fn transformation_configuration(&self) -> Option<&str> {
        self.transformation_configuration.as_deref()
    }

    pub fn additional_build_properties(&self) -> &BTreeMap<String, String> {
        &self.additional_build_properties
    }

    pub fn tools_version(&self) -> &ToolsVersion {
        &self.tools_version
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn additional_file_loggers(&self) -> &[FileLogger] {
        &self.additional_file_loggers
    }

    pub fn use_64bit(&self) -> bool {
        self.use_64bit
    }

    pub fn show_build_window(&self) -> bool {
        self.show_build_window
    }

    pub fn settings_file_path(&self) -> PathBuf {
        self.deploy_directory.join(&self.settings_file_name)
    }

    pub fn tool_path_resolver(&self) -> &ToolPathResolver {
        &self.tool_path_resolver
    }
}
