//! Build, deploy and host a site for the duration of a test run.

use serde_json::Value;
use std::path::Path;
use tracing::{error, info};
use walkdir::WalkDir;

use crate::build::{BuildInvoker, BuildOutcome};
use crate::error::{Error, Result};
use crate::options::{ResolvedSiteOptions, SiteOptions};
use crate::supervisor::{ServerState, ServerSupervisor};

/// Entry point for tests: `start` builds the project and hosts the package,
/// `stop` shuts the host down again.
///
/// ```no_run
/// # async fn run() -> dryrun::Result<()> {
/// let mut site = dryrun::DeploymentCoordinator::for_project("Sample")?;
/// site.start().await?;
/// // exercise site.base_url()
/// site.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeploymentCoordinator {
    options: ResolvedSiteOptions,
    supervisor: Option<ServerSupervisor>,
}

impl DeploymentCoordinator {
    /// Validate `options`. Nothing is built or launched yet.
    pub fn new(options: SiteOptions) -> Result<Self> {
        Ok(Self {
            options: options.finalize()?,
            supervisor: None,
        })
    }

    /// Project `<name>/<name>.csproj` below the working directory, hosted with
    /// default server options.
    pub fn for_project(project_name: impl Into<String>) -> Result<Self> {
        Self::new(SiteOptions::for_project(project_name))
    }

    pub fn options(&self) -> &ResolvedSiteOptions {
        &self.options
    }

    /// Where the build places the package that gets hosted.
    pub fn deploy_directory(&self) -> &Path {
        self.options.deployer.deploy_directory()
    }

    /// URL the site answers on once started.
    pub fn base_url(&self) -> String {
        self.options.server.base_url()
    }

    pub fn host_pid(&self) -> Option<u32> {
        self.supervisor.as_ref().and_then(ServerSupervisor::pid)
    }

    pub fn is_running(&self) -> bool {
        self.supervisor
            .as_ref()
            .is_some_and(|s| s.state() == ServerState::Running)
    }

    /// Run the build without hosting anything.
    pub async fn build(&self) -> Result<BuildOutcome> {
        BuildInvoker::new(&self.options.deployer).build().await
    }

    /// Build the project and start hosting the deploy directory.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(Error::InvalidStateTransition {
                from: ServerState::Running.to_string(),
                to: ServerState::Starting.to_string(),
            });
        }

        let outcome = self.build().await?;
        let deployer = &self.options.deployer;
        let deploy_directory = deployer.deploy_directory();

        if !outcome.was_successful() || !deploy_directory.is_dir() {
            let configuration = deployer.build_configuration();
            error!(
                configuration,
                deploy_directory = %deploy_directory.display(),
                "Build produced no deployable package"
            );
            let (output, error_output) = outcome.into_parts();
            return Err(Error::BuildFailed {
                message: format!(
                    "Build failed. Make sure the build configuration '{}' exists and packages \
                     the site into '{}'.",
                    configuration,
                    deploy_directory.display()
                ),
                output,
                error_output,
            });
        }

        let files = WalkDir::new(deploy_directory)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .count();
        info!(files, path = %deploy_directory.display(), "Package deployed");

        let mut supervisor =
            ServerSupervisor::new(self.options.server.clone(), deploy_directory);
        let started = supervisor.start().await;
        self.supervisor = Some(supervisor);
        started.map(|_| ())
    }

    /// Stop hosting. Never rebuilds; safe to call repeatedly.
    pub async fn stop(&mut self) -> Result<()> {
        match self.supervisor.as_mut() {
            Some(supervisor) => supervisor.stop().await,
            None => Ok(()),
        }
    }

    /// Edit the deployed settings file in place.
    ///
    /// The host is not restarted: call [`stop`](Self::stop) and
    /// [`start`](Self::start) around this when the site must pick the change up.
    pub async fn change_configuration_and_restart<F>(&self, transform: F) -> Result<()>
    where
        F: FnOnce(&mut Value),
    {
        let path = self.options.deployer.settings_file_path();
        if !tokio::fs::try_exists(&path).await? {
            return Err(Error::ConfigurationFileNotFound(path));
        }

        let text = tokio::fs::read_to_string(&path).await?;
        let mut settings: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))?;
        transform(&mut settings);
        tokio::fs::write(&path, serde_json::to_string_pretty(&settings)?).await?;

        info!(path = %path.display(), "Settings updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{DeployerOptions, ServerOptions, ToolPathResolver};
    use serde_json::json;
    use tempfile::TempDir;

    fn solution() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Sample")).unwrap();
        std::fs::write(dir.path().join("Sample/Sample.csproj"), "<Project />").unwrap();
        dir
    }

    fn site_options(dir: &TempDir) -> SiteOptions {
        SiteOptions {
            deployer: DeployerOptions {
                solution_dir: Some(dir.path().to_path_buf()),
                deploy_directory: Some(dir.path().join("package")),
                ..DeployerOptions::new("Sample")
            },
            server: ServerOptions::new(),
        }
    }

    #[test]
    fn test_invalid_application_path_fails_construction() {
        let dir = solution();
        let mut options = site_options(&dir);
        options.server.application_path = "blub".to_string();

        let err = DeploymentCoordinator::new(options).unwrap_err();
        assert!(err.to_string().contains("server.application_path"), "{}", err);
    }

    #[test]
    fn test_accessors() {
        let dir = solution();
        let coordinator = DeploymentCoordinator::new(site_options(&dir)).unwrap();
        assert_eq!(coordinator.deploy_directory(), dir.path().join("package"));
        assert_eq!(coordinator.base_url(), "http://localhost:8888/");
        assert!(coordinator.host_pid().is_none());
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let dir = solution();
        let mut coordinator = DeploymentCoordinator::new(site_options(&dir)).unwrap();
        coordinator.stop().await.unwrap();
        coordinator.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_change_configuration_edits_settings() {
        let dir = solution();
        let package = dir.path().join("package");
        std::fs::create_dir(&package).unwrap();
        std::fs::write(
            package.join("appsettings.json"),
            r#"{ "Logging": { "Level": "Warning" } }"#,
        )
        .unwrap();

        let coordinator = DeploymentCoordinator::new(site_options(&dir)).unwrap();
        coordinator
            .change_configuration_and_restart(|settings| {
                settings["Logging"]["Level"] = json!("Debug");
                settings["FeatureFlag"] = json!(true);
            })
            .await
            .unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(package.join("appsettings.json")).unwrap())
                .unwrap();
        assert_eq!(written, json!({ "Logging": { "Level": "Debug" }, "FeatureFlag": true }));
    }

    #[tokio::test]
    async fn test_change_configuration_without_settings_file() {
        let dir = solution();
        let coordinator = DeploymentCoordinator::new(site_options(&dir)).unwrap();

        let err = coordinator
            .change_configuration_and_restart(|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationFileNotFound(ref p) if p.ends_with("appsettings.json")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_without_package_is_a_build_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = solution();
        let tool = dir.path().join("fake-msbuild.sh");
        std::fs::write(&tool, "#!/bin/sh\necho building\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut options = site_options(&dir);
        options.deployer.build_configuration = "Missing".to_string();
        options.deployer.tool_path_resolver = ToolPathResolver::fixed(tool);
        let mut coordinator = DeploymentCoordinator::new(options).unwrap();

        let err = coordinator.start().await.unwrap_err();
        match err {
            Error::BuildFailed { ref message, .. } => assert!(message.contains("'Missing'"), "{}", message),
            other => panic!("expected a build failure, got {}", other),
        }
        assert!(err.build_output().is_some());
        assert!(!coordinator.is_running());
    }
}
