//! One-shot readiness gate between the launching task and the caller.

use std::time::Duration;
use tokio::sync::oneshot;

/// Outcome of waiting on a [`ReadinessSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The process was spawned with this pid.
    Ready(u32),
    /// The notifier was dropped without signalling (launch failed).
    Abandoned,
    TimedOut,
}

/// Sending half, owned by the task that spawns the process.
#[derive(Debug)]
pub struct ReadinessNotifier {
    tx: oneshot::Sender<u32>,
}

/// Receiving half, consumed by a single bounded wait.
#[derive(Debug)]
pub struct ReadinessSignal {
    rx: oneshot::Receiver<u32>,
}

/// Create a fresh gate for one start cycle.
pub fn readiness() -> (ReadinessNotifier, ReadinessSignal) {
    let (tx, rx) = oneshot::channel();
    (ReadinessNotifier { tx }, ReadinessSignal { rx })
}

impl ReadinessNotifier {
    /// Returns false when nobody is waiting any more.
    pub fn notify(self, pid: u32) -> bool {
        self.tx.send(pid).is_ok()
    }
}

impl ReadinessSignal {
    pub async fn wait(self, limit: Duration) -> Readiness {
        match tokio::time::timeout(limit, self.rx).await {
            Ok(Ok(pid)) => Readiness::Ready(pid),
            Ok(Err(_)) => Readiness::Abandoned,
            Err(_) => Readiness::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_before_wait() {
        let (notifier, signal) = readiness();
        assert!(notifier.notify(42));
        assert_eq!(signal.wait(Duration::from_secs(1)).await, Readiness::Ready(42));
    }

    #[tokio::test]
    async fn test_dropped_notifier_is_abandoned() {
        let (notifier, signal) = readiness();
        drop(notifier);
        assert_eq!(signal.wait(Duration::from_secs(1)).await, Readiness::Abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let (_notifier, signal) = readiness();
        assert_eq!(signal.wait(Duration::from_secs(10)).await, Readiness::TimedOut);
    }

    #[tokio::test]
    async fn test_notify_after_wait_gave_up() {
        let (notifier, signal) = readiness();
        drop(signal);
        assert!(!notifier.notify(1));
    }
}
