//! Deploy a sample project with a scripted build tool and host it with the
//! real `dryrun-host` binary.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use dryrun::options::ToolPathResolver;
use dryrun::process::is_process_running;
use dryrun::{DeployerOptions, DeploymentCoordinator, Error, ServerOptions, SiteOptions};
use tempfile::TempDir;

/// Packages `Sample` into `obj/Test/Package/PackageTmp` for the `Test`
/// configuration and fails for every other one.
const FAKE_MSBUILD: &str = r##"#!/bin/sh
project_dir=$(dirname "$1")
for arg in "$@"; do
  case "$arg" in
    /p:*) props="${arg#/p:}" ;;
    /flp1:LogFile=*) normal="${arg#/flp1:LogFile=}"; normal="${normal%%;*}" ;;
    /flp2:LogFile=*) errors="${arg#/flp2:LogFile=}"; errors="${errors%%;*}" ;;
  esac
done
config=$(echo "$props" | tr ';' '\n' | sed -n 's/^Configuration=//p')
echo "Building $1 ($config)" > "$normal"
if [ "$config" != "Test" ]; then
  echo "error: configuration $config does not package the site" | tee -a "$normal" > "$errors"
  exit 1
fi
out="$project_dir/obj/Test/Package/PackageTmp"
mkdir -p "$out"
echo '<html><body><h1>Hello World</h1></body></html>' > "$out/index.html"
echo '{ "Greeting": "Hello" }' > "$out/appsettings.json"
echo "Package written to $out" >> "$normal"
"##;

struct Solution {
    dir: TempDir,
    msbuild: PathBuf,
}

impl Solution {
    fn new() -> Self {
        Self::in_dir(TempDir::new().unwrap())
    }

    fn in_dir(dir: TempDir) -> Self {
        std::fs::create_dir(dir.path().join("Sample")).unwrap();
        std::fs::write(dir.path().join("Sample/Sample.csproj"), "<Project />").unwrap();

        let msbuild = dir.path().join("msbuild.sh");
        std::fs::write(&msbuild, FAKE_MSBUILD).unwrap();
        std::fs::set_permissions(&msbuild, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir, msbuild }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn options(&self, server: ServerOptions) -> SiteOptions {
        SiteOptions {
            deployer: DeployerOptions {
                solution_dir: Some(self.path().to_path_buf()),
                tool_path_resolver: ToolPathResolver::fixed(&self.msbuild),
                ..DeployerOptions::new("Sample")
            },
            server: ServerOptions {
                host_executable: Some(PathBuf::from(env!("CARGO_BIN_EXE_dryrun-host"))),
                config_file: Some(self.path().join("dryrun.host.toml")),
                ..server
            },
        }
    }
}

#[tokio::test]
async fn test_sample_site_is_served_until_stopped() {
    let solution = Solution::new();
    let server = ServerOptions {
        wait_for_listener: true,
        ..ServerOptions::new()
            .with_port(9000)
            .with_application_path("/blub")
            .unwrap()
    };
    let mut site = DeploymentCoordinator::new(solution.options(server)).unwrap();

    site.start().await.unwrap();
    assert!(site.is_running());
    assert_eq!(site.base_url(), "http://localhost:9000/blub");
    assert!(site
        .deploy_directory()
        .join("dummy-default-application")
        .is_dir());

    let body = reqwest::get(site.base_url())
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("<h1>Hello World</h1>"), "{}", body);

    let pid = site.host_pid().unwrap();
    site.stop().await.unwrap();
    assert!(!is_process_running(pid));
    assert!(!solution.path().join("dryrun.host.toml").exists());

    let err = reqwest::get(site.base_url()).await.unwrap_err();
    assert!(err.is_connect(), "{}", err);

    site.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_configuration_fails_with_build_log() {
    let solution = Solution::new();
    let mut options = solution.options(ServerOptions::new().with_port(9001));
    options.deployer.build_configuration = "Release".to_string();
    let mut site = DeploymentCoordinator::new(options).unwrap();

    let err = site.start().await.unwrap_err();
    match &err {
        Error::BuildFailed {
            message,
            output,
            error_output,
        } => {
            assert!(message.contains("'Release'"), "{}", message);
            assert!(output.contains("Building"), "{}", output);
            assert!(error_output
                .as_deref()
                .is_some_and(|e| e.contains("does not package")));
        }
        other => panic!("expected a build failure, got {}", other),
    }
    assert!(!site.is_running());
    assert!(site.host_pid().is_none());
}

#[tokio::test]
async fn test_settings_change_is_served_from_the_package() {
    let solution = Solution::new();
    let server = ServerOptions {
        wait_for_listener: true,
        ..ServerOptions::new().with_port(9002)
    };
    let mut site = DeploymentCoordinator::new(solution.options(server)).unwrap();

    site.start().await.unwrap();
    let settings_url = format!("{}appsettings.json", site.base_url());
    let before = reqwest::get(&settings_url).await.unwrap().text().await.unwrap();
    assert!(before.contains("Hello"), "{}", before);

    site.change_configuration_and_restart(|settings| {
        settings["Greeting"] = serde_json::json!("Goodbye");
    })
    .await
    .unwrap();
    assert!(site.is_running());

    let after = reqwest::get(&settings_url).await.unwrap().text().await.unwrap();
    assert!(after.contains("Goodbye"), "{}", after);
    site.stop().await.unwrap();
}

#[tokio::test]
async fn test_apostrophe_in_solution_path_is_served() {
    let dir = tempfile::Builder::new()
        .prefix("o'brien-")
        .tempdir()
        .unwrap();
    let solution = Solution::in_dir(dir);
    let server = ServerOptions {
        wait_for_listener: true,
        ..ServerOptions::new().with_port(9003)
    };
    let mut site = DeploymentCoordinator::new(solution.options(server)).unwrap();

    site.start().await.unwrap();
    assert!(site.is_running());

    let body = reqwest::get(site.base_url())
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("<h1>Hello World</h1>"), "{}", body);
    site.stop().await.unwrap();
}
