//! OS signals a worker can react to.

use crate::error::{LifecycleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Watched OS signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "SIGINT", alias = "interrupt")]
    Interrupt,
    #[serde(rename = "SIGTERM", alias = "terminate")]
    Terminate,
    #[serde(rename = "SIGHUP", alias = "hangup")]
    Hangup,
    #[serde(rename = "SIGQUIT", alias = "quit")]
    Quit,
    #[serde(rename = "SIGUSR1", alias = "user1")]
    User1,
    #[serde(rename = "SIGUSR2", alias = "user2")]
    User2,
}

impl Signal {
    /// Signals watched when none are configured
    pub fn defaults() -> Vec<Signal> {
        vec![Signal::Interrupt, Signal::Terminate]
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    /// Raw platform signal number
    pub fn as_raw(self) -> libc::c_int {
        match self {
            Signal::Interrupt => libc::SIGINT,
            Signal::Terminate => libc::SIGTERM,
            #[cfg(unix)]
            Signal::Hangup => libc::SIGHUP,
            #[cfg(unix)]
            Signal::Quit => libc::SIGQUIT,
            #[cfg(unix)]
            Signal::User1 => libc::SIGUSR1,
            #[cfg(unix)]
            Signal::User2 => libc::SIGUSR2,
            #[cfg(not(unix))]
            _ => -1,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Action taken when a watched signal is received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalAction {
    #[default]
    Shutdown,
    Terminate,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Shutdown => f.write_str("shutdown"),
            SignalAction::Terminate => f.write_str("terminate"),
        }
    }
}

/// Registered interest in a set of signals. Dropping it stops delivery to
/// this listener, but the process-wide handler installed by tokio stays in
/// place: once registered, a signal is never handled by its default
/// disposition again for the life of the process.
pub(crate) struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    interrupt: bool,
}

impl SignalListener {
    /// Register handlers for every signal in `signals`. Must run inside a
    /// tokio runtime.
    #[cfg(unix)]
    pub(crate) fn register(signals: &[Signal]) -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut streams = Vec::with_capacity(signals.len());
        for &sig in signals {
            let stream = signal(SignalKind::from_raw(sig.as_raw())).map_err(|e| {
                LifecycleError::signal(format!("failed to register {} handler: {}", sig, e))
            })?;
            streams.push((sig, stream));
        }
        Ok(Self { streams })
    }

    #[cfg(not(unix))]
    pub(crate) fn register(signals: &[Signal]) -> Result<Self> {
        if let Some(sig) = signals.iter().find(|s| **s != Signal::Interrupt && **s != Signal::Terminate) {
            return Err(LifecycleError::signal(format!("{} is not supported on this platform", sig)));
        }
        Ok(Self {
            interrupt: signals.contains(&Signal::Interrupt),
        })
    }

    /// Wait for the first of the registered signals
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) -> Signal {
        use std::task::Poll;

        std::future::poll_fn(|cx| {
            for (sig, stream) in self.streams.iter_mut() {
                if let Poll::Ready(Some(())) = stream.poll_recv(cx) {
                    return Poll::Ready(*sig);
                }
            }
            Poll::Pending
        })
        .await
    }

    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) -> Signal {
        if self.interrupt && tokio::signal::ctrl_c().await.is_ok() {
            return Signal::Interrupt;
        }
        std::future::pending().await
    }
}
