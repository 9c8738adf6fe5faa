use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Restartable one-shot silence timer.
///
/// At most one fire is pending at a time; arming while armed cancels the
/// previous schedule first. Cancellation is cooperative: a callback that has
/// already passed its sleep when `cancel` runs may still be delivered, so
/// consumers must guard the callback with a state or generation check. The
/// watchdog only signals; it never tears anything down itself.
///
/// Must be used from within a tokio runtime (`arm` spawns the timer task).
#[derive(Default)]
pub struct SilenceWatchdog {
    pending: Option<JoinHandle<()>>,
}

impl SilenceWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `on_silence` to run once after `timeout_secs` seconds.
    ///
    /// A non-positive timeout, or one that does not fit in a `Duration`
    /// (NaN, infinite, or beyond `Duration::MAX`), arms nothing: silence
    /// auto-stop is disabled.
    pub fn arm<F>(&mut self, timeout_secs: f64, on_silence: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        if timeout_secs <= 0.0 {
            debug!(timeout_secs, "silence auto-stop disabled");
            return;
        }

        let timeout = match Duration::try_from_secs_f64(timeout_secs) {
            Ok(timeout) => timeout,
            Err(_) => {
                debug!(timeout_secs, "silence auto-stop disabled");
                return;
            }
        };
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            on_silence();
        }));
    }

    /// Cancel any pending fire and re-arm for the full timeout.
    ///
    /// This is a restart, not a decrement: activity at any point pushes the
    /// deadline out by the whole configured duration.
    pub fn reset<F>(&mut self, timeout_secs: f64, on_silence: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.arm(timeout_secs, on_silence);
    }

    /// Cancel any pending fire. Safe to call when nothing is armed.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Whether a fire is currently pending.
    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SilenceWatchdog {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn probe() -> (
        impl FnOnce() + Send + 'static,
        mpsc::UnboundedReceiver<&'static str>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move || {
                let _ = tx.send("fired");
            },
            rx,
        )
    }

    #[tokio::test]
    async fn fires_once_after_timeout() {
        let mut watchdog = SilenceWatchdog::new();
        let (on_silence, mut rx) = probe();

        watchdog.arm(0.05, on_silence);
        assert!(watchdog.is_armed());

        let fired = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert_eq!(fired.expect("watchdog never fired"), Some("fired"));

        // One-shot: nothing further arrives.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        assert!(!watchdog.is_armed());
    }

    #[tokio::test]
    async fn non_positive_timeout_never_fires() {
        let mut watchdog = SilenceWatchdog::new();

        let (on_silence, mut rx) = probe();
        watchdog.arm(0.0, on_silence);
        assert!(!watchdog.is_armed());

        let (on_silence, _rx2) = probe();
        watchdog.arm(-3.0, on_silence);
        assert!(!watchdog.is_armed());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn oversized_timeout_never_fires() {
        let mut watchdog = SilenceWatchdog::new();

        // Larger than any Duration can represent; arming must not panic.
        let (on_silence, mut rx) = probe();
        watchdog.arm(1e20, on_silence);
        assert!(!watchdog.is_armed());

        let (on_silence, _rx2) = probe();
        watchdog.arm(f64::INFINITY, on_silence);
        assert!(!watchdog.is_armed());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancel_prevents_fire() {
        let mut watchdog = SilenceWatchdog::new();
        let (on_silence, mut rx) = probe();

        watchdog.arm(0.05, on_silence);
        watchdog.cancel();
        assert!(!watchdog.is_armed());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());

        // Cancelling with nothing armed is fine.
        watchdog.cancel();
    }

    #[tokio::test]
    async fn rearming_replaces_pending_schedule() {
        let mut watchdog = SilenceWatchdog::new();

        let (first_tx, first_rx) = mpsc::unbounded_channel();
        watchdog.arm(0.05, move || {
            let _ = first_tx.send("first");
        });

        let (second_tx, mut second_rx) = mpsc::unbounded_channel::<&str>();
        watchdog.reset(0.2, move || {
            let _ = second_tx.send("second");
        });

        let fired = tokio::time::timeout(Duration::from_secs(1), second_rx.recv()).await;
        assert_eq!(fired.expect("replacement never fired"), Some("second"));

        // The original schedule was cancelled, not merely delayed.
        let mut first_rx = first_rx;
        assert!(first_rx.try_recv().is_err());
    }
}
