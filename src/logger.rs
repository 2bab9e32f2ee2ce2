use crate::error::LifecycleError;
use std::fmt::{Display, Write};
use tracing::{error, info};

/// Key/value pairs attached to a log line
pub type Fields<'a> = &'a [(&'a str, &'a dyn Display)];

/// Sink for worker log lines
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str, fields: Fields<'_>);

    fn error(&self, err: &LifecycleError, msg: &str, fields: Fields<'_>);
}

/// Default logger forwarding to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str, fields: Fields<'_>) {
        info!(fields = %render(fields), "{}", msg);
    }

    fn error(&self, err: &LifecycleError, msg: &str, fields: Fields<'_>) {
        error!(error = %err, fields = %render(fields), "{}", msg);
    }
}

/// Logger discarding every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _msg: &str, _fields: Fields<'_>) {}

    fn error(&self, _err: &LifecycleError, _msg: &str, _fields: Fields<'_>) {}
}

/// Render fields as `key=value` pairs separated by spaces
pub(crate) fn render(fields: Fields<'_>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}={}", key, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fields() {
        let timeout = "15s";
        let name = "api";
        assert_eq!(
            render(&[("timeout", &timeout), ("name", &name)]),
            "timeout=15s name=api"
        );
        assert_eq!(render(&[]), "");
    }
}
