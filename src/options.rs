use crate::error::Result;
use crate::hooks::HookFuture;
use crate::logger::{Logger, TracingLogger};
use crate::signal::{Signal, SignalAction};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Shutdown timeout applied when none (or zero) is configured
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

/// Asynchronous check deciding when a starting service is ready.
/// Resolving to `Ok` moves the worker to `Started`.
#[derive(Clone)]
pub struct ReadinessProbe(Arc<dyn Fn() -> HookFuture + Send + Sync>);

impl ReadinessProbe {
    pub fn new<F, Fut>(probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self(Arc::new(move || Box::pin(probe()) as HookFuture))
    }

    pub(crate) fn check(&self) -> HookFuture {
        (self.0)()
    }
}

impl fmt::Debug for ReadinessProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReadinessProbe")
    }
}

/// Probe that reports ready once `duration` has elapsed
pub fn readiness_after(duration: Duration) -> ReadinessProbe {
    ReadinessProbe::new(move || async move {
        tokio::time::sleep(duration).await;
        Ok(())
    })
}

/// Worker options
#[derive(Clone)]
pub struct Options {
    pub readiness_probe: Option<ReadinessProbe>,
    /// Maximum time spent in `ShuttingDown` before the worker is terminated
    pub shutdown_timeout: Duration,
    /// Signals to watch; empty disables the signal watcher. A watched signal
    /// keeps being caught after the worker is done, so it no longer
    /// terminates the process through its default disposition.
    pub signals: Vec<Signal>,
    pub signal_action: SignalAction,
    pub logger: Arc<dyn Logger>,
}

impl Options {
    pub fn with_readiness_probe(mut self, probe: ReadinessProbe) -> Self {
        self.readiness_probe = Some(probe);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_signals(mut self, signals: Vec<Signal>) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_signal_action(mut self, action: SignalAction) -> Self {
        self.signal_action = action;
        self
    }

    pub fn with_logger<L: Logger + 'static>(mut self, logger: L) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Replace unset values with their defaults
    pub(crate) fn normalized(mut self) -> Self {
        if self.shutdown_timeout.is_zero() {
            self.shutdown_timeout = DEFAULT_SHUTDOWN_TIMEOUT;
        }
        let mut seen = Vec::with_capacity(self.signals.len());
        self.signals.retain(|sig| {
            if seen.contains(sig) {
                false
            } else {
                seen.push(*sig);
                true
            }
        });
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            readiness_probe: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            signals: Signal::defaults(),
            signal_action: SignalAction::default(),
            logger: Arc::new(TracingLogger),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("readiness_probe", &self.readiness_probe)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("signals", &self.signals)
            .field("signal_action", &self.signal_action)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let options = Options::default()
            .with_shutdown_timeout(Duration::ZERO)
            .normalized();
        assert_eq!(options.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
    }

    #[test]
    fn test_empty_signals_are_kept() {
        let options = Options::default().with_signals(Vec::new()).normalized();
        assert!(options.signals.is_empty());
    }

    #[tokio::test]
    async fn test_readiness_after() {
        let probe = readiness_after(Duration::from_millis(5));
        let started = tokio::time::Instant::now();
        assert!(probe.check().await.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(5));
    }
}
