//! Child process plumbing shared by the build invoker and the supervisor.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;

/// Visible processes share our console; hidden ones are piped into the log.
pub(crate) fn configure_stdio(cmd: &mut Command, visible: bool) {
    cmd.stdin(Stdio::null());
    if visible {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    }
}

/// Forward piped stdout/stderr lines to `tracing` at debug level.
pub(crate) fn forward_output(child: &mut Child, source: &'static str) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        tasks.push(tokio::spawn(forward_lines(stdout, source, "stdout")));
    }
    if let Some(stderr) = child.stderr.take() {
        tasks.push(tokio::spawn(forward_lines(stderr, source, "stderr")));
    }
    tasks
}

async fn forward_lines<R>(reader: R, source: &'static str, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!(source, stream, "{}", line),
            Ok(None) => break,
            Err(e) => {
                debug!(source, stream, "output stream closed: {}", e);
                break;
            }
        }
    }
}

/// Ask `child` to exit, force-kill it after `grace`, and reap it.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) -> Result<ExitStatus> {
    let Some(pid) = child.id() else {
        // Already reaped; wait returns the cached status.
        return Ok(child.wait().await?);
    };

    request_exit(child, pid)?;

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => Ok(status?),
        Err(_) => {
            warn!(pid, "Process did not exit within {:?}, killing", grace);
            child.kill().await?;
            Ok(child.wait().await?)
        }
    }
}

#[cfg(unix)]
fn request_exit(_child: &mut Child, pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    debug!(pid, "Sending SIGTERM");
    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        // ESRCH: exited between the id() check and now.
        debug!(pid, "SIGTERM failed: {}", e);
    }
    Ok(())
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child, pid: u32) -> Result<()> {
    debug!(pid, "No polite shutdown available, killing");
    child.start_kill()?;
    Ok(())
}

/// True while `pid` names a live (or unreaped) process.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), None).is_ok()
}
