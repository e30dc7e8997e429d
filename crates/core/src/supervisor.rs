//! Hosting process lifecycle.
//!
//! The host runs on a dedicated task that owns the [`Child`]. `start` waits
//! for that task to report a successful spawn; `stop` cancels it, which asks
//! the host to exit politely and kills it after the shutdown timeout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempPath;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::options::ResolvedServerOptions;
use crate::process::{configure_stdio, forward_output, terminate};
use crate::readiness::{readiness, Readiness, ReadinessNotifier};
use crate::template::{render, RenderParams};

const LISTENER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle of a [`ServerSupervisor`]. Instances are one-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    NotStarted,
    Starting,
    Running,
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::NotStarted => "not_started",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Launches `dryrun-host` for one deployed site and tears it down again.
pub struct ServerSupervisor {
    options: ResolvedServerOptions,
    physical_path: PathBuf,
    state: ServerState,
    pid: Option<u32>,
    shutdown: CancellationToken,
    worker: Option<JoinHandle<Result<()>>>,
    // Cancels the worker when the supervisor is dropped without `stop`.
    _shutdown_guard: DropGuard,
}

impl ServerSupervisor {
    /// Supervisor serving `physical_path` with `options`.
    pub fn new(options: ResolvedServerOptions, physical_path: impl Into<PathBuf>) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            options,
            physical_path: physical_path.into(),
            state: ServerState::NotStarted,
            pid: None,
            _shutdown_guard: shutdown.clone().drop_guard(),
            shutdown,
            worker: None,
        }
    }

    /// Current state. A host that exited on its own counts as stopped.
    pub fn state(&self) -> ServerState {
        if self.state == ServerState::Running && self.host_exited() {
            ServerState::Stopped
        } else {
            self.state
        }
    }

    /// Pid of the host while it is running.
    pub fn pid(&self) -> Option<u32> {
        if self.host_exited() {
            None
        } else {
            self.pid
        }
    }

    fn host_exited(&self) -> bool {
        self.worker.as_ref().is_some_and(JoinHandle::is_finished)
    }

    pub fn options(&self) -> &ResolvedServerOptions {
        &self.options
    }

    /// Launch the host and wait until it has been spawned.
    ///
    /// With `wait_for_listener` also waits, within the same startup timeout,
    /// until the port accepts TCP connections.
    pub async fn start(&mut self) -> Result<u32> {
        if self.state != ServerState::NotStarted {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: ServerState::Starting.to_string(),
            });
        }
        self.state = ServerState::Starting;

        let limit = self.options.startup_timeout();
        let started_at = Instant::now();
        let (notifier, signal) = readiness();
        let worker = tokio::spawn(run_host(
            self.options.clone(),
            self.physical_path.clone(),
            self.shutdown.clone(),
            notifier,
        ));

        let pid = match signal.wait(limit).await {
            Readiness::Ready(pid) => pid,
            Readiness::Abandoned => {
                self.state = ServerState::Stopped;
                return Err(match worker.await {
                    Ok(Err(e)) => e,
                    Ok(Ok(())) => {
                        Error::ServerStartup("host task ended before launching the host".into())
                    }
                    Err(e) => e.into(),
                });
            }
            Readiness::TimedOut => {
                // Aborting drops the child, which kills it.
                worker.abort();
                self.state = ServerState::Stopped;
                return Err(Error::Timeout {
                    what: "host process launch".to_string(),
                    after: limit,
                });
            }
        };

        self.worker = Some(worker);
        self.pid = Some(pid);

        if self.options.wait_for_listener() {
            let remaining = limit.saturating_sub(started_at.elapsed());
            let listening = match &self.worker {
                Some(worker) => wait_for_listener(self.options.port(), remaining, worker).await,
                None => Ok(()),
            };
            if let Err(e) = listening {
                warn!(pid, "Host did not come up: {}", e);
                if let Err(stop_err) = self.stop().await {
                    debug!(pid, "Stopping the host after a failed start: {}", stop_err);
                }
                return Err(e);
            }
        }

        self.state = ServerState::Running;
        info!(pid, url = %self.options.base_url(), "Host running");
        Ok(pid)
    }

    /// Stop the host. Does nothing when it was never started or is already
    /// stopped.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        info!(pid = ?self.pid, "Stopping host");
        self.shutdown.cancel();
        let result = worker.await;

        self.state = ServerState::Stopped;
        self.pid = None;
        result?
    }
}

impl fmt::Debug for ServerSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerSupervisor")
            .field("physical_path", &self.physical_path)
            .field("state", &self.state)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Body of the host task: render and write the config, spawn the host,
/// report readiness, then wait for exit or a stop request.
async fn run_host(
    options: ResolvedServerOptions,
    physical_path: PathBuf,
    shutdown: CancellationToken,
    notifier: ReadinessNotifier,
) -> Result<()> {
    let template = options.template().load()?;
    let rendered = render(
        &template,
        &RenderParams {
            port: options.port(),
            physical_path: &physical_path,
            application_path: options.application_path(),
            windows_authentication: options.windows_authentication(),
            use_https: options.use_https(),
            format: options.template().format(),
        },
    )?;
    let config = write_config(options.config_file(), &rendered).await?;

    let host = options.host_path_resolver().resolve()?;
    let mut child = spawn_host(&host, &config, &options)?;
    let pid = child
        .id()
        .ok_or_else(|| Error::ServerStartup("host exited during launch".to_string()))?;
    info!(pid, port = options.port(), "Host process started: {}", host.display());

    if !notifier.notify(pid) {
        debug!(pid, "Start was abandoned, shutting the host down");
        shutdown.cancel();
    }

    let exited = tokio::select! {
        status = child.wait() => Some(status?),
        _ = shutdown.cancelled() => None,
    };
    let status = match exited {
        Some(status) => {
            warn!(pid, %status, "Host process exited on its own");
            status
        }
        None => terminate(&mut child, options.shutdown_timeout()).await?,
    };
    debug!(pid, %status, "Host process reaped");

    // Dropping `config` removes the rendered file.
    drop(config);
    Ok(())
}

async fn write_config(path: &Path, contents: &str) -> Result<TempPath> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    debug!("Host configuration written to {}", path.display());
    Ok(TempPath::from_path(path))
}

fn spawn_host(host: &Path, config: &Path, options: &ResolvedServerOptions) -> Result<Child> {
    let mut cmd = Command::new(host);
    cmd.arg(format!("/config:{}", config.display()));
    if options.systray() {
        cmd.arg("/systray:true");
    }
    cmd.kill_on_drop(true);
    configure_stdio(&mut cmd, options.show_window());

    let mut child = cmd.spawn().map_err(|e| {
        Error::ServerStartup(format!("Failed to spawn {}: {}", host.display(), e))
    })?;
    forward_output(&mut child, "host");
    Ok(child)
}

/// Poll until `port` accepts connections, the host task ends, or `limit`
/// elapses.
async fn wait_for_listener(
    port: u16,
    limit: Duration,
    worker: &JoinHandle<Result<()>>,
) -> Result<()> {
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(_) => {
                debug!(port, attempts, "Host is accepting connections");
                return Ok(());
            }
            Err(e) => {
                if attempts == 1 {
                    info!(port, "Waiting for host to accept connections...");
                }
                debug!(port, "Connect failed: {}", e);
            }
        }

        if worker.is_finished() {
            return Err(Error::ServerStartup(
                "host exited before accepting connections".to_string(),
            ));
        }
        if start.elapsed() >= limit {
            return Err(Error::Timeout {
                what: format!("host to listen on port {}", port),
                after: limit,
            });
        }

        tokio::time::sleep(LISTENER_POLL_INTERVAL).await;
    }
}
