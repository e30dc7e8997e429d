//! MSBuild invocation.

use std::path::Path;
use tempfile::{NamedTempFile, TempPath};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::outcome::BuildOutcome;
use crate::error::{Error, Result};
use crate::options::ResolvedDeployerOptions;
use crate::process::{configure_stdio, forward_output};

/// Logger slots 1 and 2 capture the full and the errors-only log.
const FIRST_ADDITIONAL_LOGGER_SLOT: usize = 3;

/// Runs the build tool for one set of deployer options.
pub struct BuildInvoker<'a> {
    options: &'a ResolvedDeployerOptions,
}

impl<'a> BuildInvoker<'a> {
    pub fn new(options: &'a ResolvedDeployerOptions) -> Self {
        Self { options }
    }

    /// `/p:` properties in insertion order. A later key overwrites the value
    /// of an earlier one in place.
    pub fn properties(&self) -> Vec<(String, String)> {
        let options = self.options;
        let mut properties = Vec::new();

        set_property(
            &mut properties,
            "Configuration",
            options.build_configuration(),
        );

        let solution_dir = options.solution_dir().display().to_string();
        if !solution_dir.trim().is_empty() {
            set_property(&mut properties, "SolutionDir", &solution_dir);
        }

        if options.project_dir_explicit() {
            set_property(
                &mut properties,
                "ProjectDir",
                &options.project_dir().display().to_string(),
            );
        }

        if let Some(transformation) = options.transformation_configuration() {
            set_property(
                &mut properties,
                "ProjectConfigTransformFileName",
                &format!("Web.{}.config", transformation),
            );
        }

        for (key, value) in options.additional_build_properties() {
            set_property(&mut properties, key, value);
        }

        properties
    }

    /// Full argument list handed to the build tool.
    pub fn arguments(&self, normal_log: &Path, error_log: &Path) -> Vec<String> {
        let options = self.options;
        let properties = self
            .properties()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(";");

        let mut args = vec![
            options.project_file_path().display().to_string(),
            format!("/p:{}", properties),
            format!("/t:{}", options.build_targets().join(";")),
            format!("/v:{}", options.verbosity()),
            "/fl1".to_string(),
            format!(
                "/flp1:LogFile={};Verbosity={}",
                normal_log.display(),
                options.verbosity()
            ),
            "/fl2".to_string(),
            format!("/flp2:LogFile={};ErrorsOnly", error_log.display()),
        ];

        for (idx, logger) in options.additional_file_loggers().iter().enumerate() {
            args.extend(logger.arguments(FIRST_ADDITIONAL_LOGGER_SLOT + idx));
        }

        args
    }

    /// Run the build to completion.
    ///
    /// Failing to start the tool is an error; a tool that runs and exits
    /// non-zero yields a failed [`BuildOutcome`].
    pub async fn build(&self) -> Result<BuildOutcome> {
        let options = self.options;
        let tool = options
            .tool_path_resolver()
            .resolve(options.tools_version(), options.use_64bit())?;

        let normal_log = temp_log()?;
        let error_log = temp_log()?;
        let args = self.arguments(&normal_log, &error_log);

        info!(
            project = %options.project_file_path().display(),
            configuration = options.build_configuration(),
            "Building with {}",
            tool.display()
        );
        debug!("Build command: {} {}", tool.display(), args.join(" "));

        let mut cmd = Command::new(&tool);
        cmd.args(&args).kill_on_drop(true);
        configure_stdio(&mut cmd, options.show_build_window());

        let mut child = cmd.spawn().map_err(|source| Error::BuildToolLaunch {
            path: tool.clone(),
            source,
        })?;
        // Not joined: build nodes left running may keep the pipes open.
        forward_output(&mut child, "build");

        let status = child.wait().await?;

        let output = read_log(&normal_log).await?;
        if status.success() {
            info!("Build succeeded");
            Ok(BuildOutcome::success(output))
        } else {
            let errors = read_log(&error_log).await?;
            warn!(code = ?status.code(), "Build failed");
            Ok(BuildOutcome::failure(output, errors))
        }
        // normal_log and error_log are deleted here, and on every early return above.
    }
}

fn set_property(properties: &mut Vec<(String, String)>, key: &str, value: &str) {
    match properties.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) => *existing = value.to_string(),
        None => properties.push((key.to_string(), value.to_string())),
    }
}

fn temp_log() -> Result<TempPath> {
    Ok(NamedTempFile::new()?.into_temp_path())
}

async fn read_log(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{
        DeployerOptions, FileLogger, MessageFilter, ToolPathResolver, Verbosity,
    };
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn solution() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Sample")).unwrap();
        std::fs::write(dir.path().join("Sample/Sample.csproj"), "<Project />").unwrap();
        dir
    }

    fn options(solution: &TempDir) -> DeployerOptions {
        DeployerOptions {
            solution_dir: Some(solution.path().to_path_buf()),
            ..DeployerOptions::new("Sample")
        }
    }

    #[test]
    fn test_properties_order_and_overwrite() {
        let dir = solution();
        let mut opts = options(&dir);
        opts.transformation_configuration = Some("Staging".to_string());
        opts.additional_build_properties
            .insert("Configuration".to_string(), "Release".to_string());
        opts.additional_build_properties
            .insert("DeployOnBuild".to_string(), "true".to_string());
        let resolved = opts.finalize().unwrap();

        let props = BuildInvoker::new(&resolved).properties();
        let keys: Vec<&str> = props.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            ["Configuration", "SolutionDir", "ProjectConfigTransformFileName", "DeployOnBuild"]
        );
        assert_eq!(props[0].1, "Release");
        assert_eq!(props[2].1, "Web.Staging.config");
    }

    #[test]
    fn test_project_dir_only_when_explicit() {
        let dir = solution();
        let implicit = options(&dir).finalize().unwrap();
        assert!(!BuildInvoker::new(&implicit)
            .properties()
            .iter()
            .any(|(k, _)| k == "ProjectDir"));

        let mut opts = options(&dir);
        opts.project_dir = Some(dir.path().join("Sample"));
        let explicit = opts.finalize().unwrap();
        assert!(BuildInvoker::new(&explicit)
            .properties()
            .iter()
            .any(|(k, _)| k == "ProjectDir"));
    }

    #[test]
    fn test_command_line_shape() {
        let dir = solution();
        let mut opts = options(&dir);
        opts.verbosity = Verbosity::Minimal;
        let resolved = opts.finalize().unwrap();

        let args = BuildInvoker::new(&resolved)
            .arguments(Path::new("/tmp/normal.log"), Path::new("/tmp/errors.log"));
        assert_eq!(
            args[0],
            dir.path().join("Sample/Sample.csproj").display().to_string()
        );
        assert_eq!(
            args[1],
            format!("/p:Configuration=Test;SolutionDir={}", dir.path().display())
        );
        assert_eq!(
            &args[2..],
            [
                "/t:Clean;Package",
                "/v:Minimal",
                "/fl1",
                "/flp1:LogFile=/tmp/normal.log;Verbosity=Minimal",
                "/fl2",
                "/flp2:LogFile=/tmp/errors.log;ErrorsOnly",
            ]
        );
    }

    #[test]
    fn test_additional_loggers_get_distinct_slots() {
        let dir = solution();
        let mut opts = options(&dir);
        opts.additional_file_loggers = (0..7)
            .map(|i| {
                let mut logger = FileLogger::new(format!("extra{}.log", i), Verbosity::Quiet);
                logger.message_filter = MessageFilter::ErrorsOnly;
                logger
            })
            .collect();
        let resolved = opts.finalize().unwrap();

        let args = BuildInvoker::new(&resolved)
            .arguments(Path::new("n.log"), Path::new("e.log"));
        let slots: Vec<&str> = args
            .iter()
            .filter(|a| a.starts_with("/fl") && !a.starts_with("/flp"))
            .map(|a| a.as_str())
            .collect();
        assert_eq!(
            slots,
            ["/fl1", "/fl2", "/fl3", "/fl4", "/fl5", "/fl6", "/fl7", "/fl8", "/fl9"]
        );
        assert!(args.contains(&"/flp9:LogFile=extra6.log;Verbosity=Quiet;ErrorsOnly;EnableMPLogging".to_string()));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-msbuild.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Shell snippet extracting the two captured log paths from `$@`.
    #[cfg(unix)]
    const PARSE_LOGS: &str = r#"for arg in "$@"; do
  case "$arg" in
    /flp1:LogFile=*) normal="${arg#/flp1:LogFile=}"; normal="${normal%%;*}" ;;
    /flp2:LogFile=*) errors="${arg#/flp2:LogFile=}"; errors="${errors%%;*}" ;;
  esac
done"#;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_build_returns_full_log() {
        let dir = solution();
        let tool = fake_tool(
            dir.path(),
            &format!("{}\necho \"Build succeeded.\" > \"$normal\"\nexit 0", PARSE_LOGS),
        );
        let mut opts = options(&dir);
        opts.tool_path_resolver = ToolPathResolver::fixed(tool);
        let resolved = opts.finalize().unwrap();

        let outcome = BuildInvoker::new(&resolved).build().await.unwrap();
        assert!(outcome.was_successful());
        assert_eq!(outcome.output().trim(), "Build succeeded.");
        assert!(outcome.error_output().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_build_returns_both_logs_and_removes_them() {
        let dir = solution();
        let tool = fake_tool(
            dir.path(),
            &format!(
                "{}\necho \"full\" > \"$normal\"\necho \"error MSB1009\" > \"$errors\"\n\
                 echo \"$normal\" > \"$(dirname \"$0\")/logs.txt\"\necho \"$errors\" >> \"$(dirname \"$0\")/logs.txt\"\nexit 1",
                PARSE_LOGS
            ),
        );
        let mut opts = options(&dir);
        opts.tool_path_resolver = ToolPathResolver::fixed(tool);
        let resolved = opts.finalize().unwrap();

        let outcome = BuildInvoker::new(&resolved).build().await.unwrap();
        assert!(!outcome.was_successful());
        assert_eq!(outcome.output().trim(), "full");
        assert_eq!(outcome.error_output().map(str::trim), Some("error MSB1009"));

        let logs = std::fs::read_to_string(dir.path().join("logs.txt")).unwrap();
        for log in logs.lines() {
            assert!(!Path::new(log).exists(), "temporary log {} was not removed", log);
        }
    }

    #[tokio::test]
    async fn test_unstartable_tool_is_an_error() {
        let dir = solution();
        let mut opts = options(&dir);
        opts.tool_path_resolver = ToolPathResolver::fixed(dir.path().join("no-such-msbuild"));
        let resolved = opts.finalize().unwrap();

        let err = BuildInvoker::new(&resolved).build().await.unwrap_err();
        assert!(matches!(err, Error::BuildToolLaunch { .. }), "{}", err);
    }

    #[tokio::test]
    async fn test_resolver_error_is_propagated() {
        let dir = solution();
        let mut opts = options(&dir);
        opts.tool_path_resolver = ToolPathResolver::new(|version, _| {
            Err(Error::ToolResolution {
                version: version.to_string(),
                reason: "not installed".to_string(),
            })
        });
        let resolved = opts.finalize().unwrap();

        let err = BuildInvoker::new(&resolved).build().await.unwrap_err();
        assert!(matches!(err, Error::ToolResolution { .. }));
    }
}
