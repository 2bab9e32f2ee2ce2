use crate::worker::State;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LifecycleError {
    #[error("cannot transition from {from} to {to}: invalid state")]
    InvalidState { from: State, to: State },

    #[error("interrupted: {reason}")]
    Interrupted { reason: String },

    #[error("service is not ready (state: {state})")]
    NotReady { state: State },

    #[error("missing required {hook} hook")]
    MissingHook { hook: &'static str },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Signal error: {message}")]
    Signal { message: String },

    #[error("{message}")]
    Hook { message: String },

    #[error(transparent)]
    Source(Arc<dyn std::error::Error + Send + Sync>),
}

impl LifecycleError {
    /// Plain error raised from a hook or readiness probe
    pub fn hook<S: Into<String>>(message: S) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    /// Error expected as a side effect of an in-flight shutdown or terminate.
    /// It never drives the worker into the Error state by itself.
    pub fn interrupted<S: Into<String>>(reason: S) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn signal<S: Into<String>>(message: S) -> Self {
        Self::Signal {
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error so it can travel inside cloned events
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Arc::new(err))
    }

    /// True when a requested transition was refused, for example stopping
    /// an already stopped service.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

impl From<std::io::Error> for LifecycleError {
    fn from(err: std::io::Error) -> Self {
        Self::from_source(err)
    }
}

impl From<config::ConfigError> for LifecycleError {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<toml::ser::Error> for LifecycleError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = LifecycleError::InvalidState {
            from: State::Stopped,
            to: State::ShuttingDown,
        };
        assert!(err.is_invalid_state());
        assert!(!err.is_interrupted());
        assert_eq!(
            err.to_string(),
            "cannot transition from Stopped to ShuttingDown: invalid state"
        );
    }

    #[test]
    fn test_hook_error_displays_message_only() {
        assert_eq!(LifecycleError::hook("oops").to_string(), "oops");
    }

    #[test]
    fn test_source_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: LifecycleError = io.into();
        assert_eq!(err.to_string(), "pipe closed");
        // Cloning shares the wrapped error
        assert_eq!(err.clone().to_string(), "pipe closed");
    }
}
