//! Callbacks through which a worker drives the service it wraps.

use crate::error::{LifecycleError, Result};
use crate::worker::Event;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Boxed future returned by closure hooks and readiness probes
pub type HookFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

type ContextHook = Arc<dyn Fn(CancellationToken) -> HookFuture + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&Event) -> Option<LifecycleError> + Send + Sync>;

/// Service control hooks
///
/// `start` is expected to block for as long as the service runs. Returning
/// from it moves the worker to `Stopped`, or to `Error` when it returns an
/// error that `filter_error` does not suppress.
///
/// A `shutdown` error suppressed by `filter_error` leaves the worker in
/// `ShuttingDown` until it is terminated or `start` returns. The same holds
/// for `terminate` and `Terminating`.
#[async_trait]
pub trait Hooks: Send + Sync + 'static {
    /// Friendly name used in log lines
    fn name(&self) -> &str {
        ""
    }

    async fn start(&self, ctx: CancellationToken) -> Result<()>;

    /// Gracefully shut the service down. `ctx` is cancelled once the
    /// shutdown timeout elapses.
    async fn shutdown(&self, ctx: CancellationToken) -> Result<()>;

    /// Forcefully stop the service. No deadline is applied.
    async fn terminate(&self, _ctx: CancellationToken) -> Result<()> {
        Ok(())
    }

    /// Receives error events and returns the error to propagate. `None`
    /// suppresses the error entirely.
    fn filter_error(&self, event: &Event) -> Option<LifecycleError> {
        event.error.clone()
    }
}

/// Closure-backed [`Hooks`] implementation
#[derive(Clone)]
pub struct HookSet {
    name: String,
    start: ContextHook,
    shutdown: ContextHook,
    terminate: Option<ContextHook>,
    error: Option<ErrorHook>,
}

impl HookSet {
    pub fn builder() -> HookSetBuilder {
        HookSetBuilder::default()
    }
}

#[async_trait]
impl Hooks for HookSet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: CancellationToken) -> Result<()> {
        (self.start)(ctx).await
    }

    async fn shutdown(&self, ctx: CancellationToken) -> Result<()> {
        (self.shutdown)(ctx).await
    }

    async fn terminate(&self, ctx: CancellationToken) -> Result<()> {
        match &self.terminate {
            Some(terminate) => terminate(ctx).await,
            None => Ok(()),
        }
    }

    fn filter_error(&self, event: &Event) -> Option<LifecycleError> {
        match &self.error {
            Some(filter) => filter(event),
            None => event.error.clone(),
        }
    }
}

/// Builder for [`HookSet`]
#[derive(Default)]
pub struct HookSetBuilder {
    name: String,
    start: Option<ContextHook>,
    shutdown: Option<ContextHook>,
    terminate: Option<ContextHook>,
    error: Option<ErrorHook>,
}

impl HookSetBuilder {
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn start<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.start = Some(boxed(hook));
        self
    }

    pub fn shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.shutdown = Some(boxed(hook));
        self
    }

    pub fn terminate<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.terminate = Some(boxed(hook));
        self
    }

    pub fn on_error<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Event) -> Option<LifecycleError> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(filter));
        self
    }

    /// Fails when either the start or the shutdown hook is missing
    pub fn build(self) -> Result<HookSet> {
        let start = self
            .start
            .ok_or(LifecycleError::MissingHook { hook: "start" })?;
        let shutdown = self
            .shutdown
            .ok_or(LifecycleError::MissingHook { hook: "shutdown" })?;

        Ok(HookSet {
            name: self.name,
            start,
            shutdown,
            terminate: self.terminate,
            error: self.error,
        })
    }
}

fn boxed<F, Fut>(hook: F) -> ContextHook
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |ctx: CancellationToken| Box::pin(hook(ctx)) as HookFuture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::State;

    #[test]
    fn test_builder_requires_start_and_shutdown() {
        let missing_start = HookSet::builder()
            .shutdown(|_| async { Ok(()) })
            .build();
        assert!(matches!(
            missing_start,
            Err(LifecycleError::MissingHook { hook: "start" })
        ));

        let missing_shutdown = HookSet::builder().start(|_| async { Ok(()) }).build();
        assert!(matches!(
            missing_shutdown,
            Err(LifecycleError::MissingHook { hook: "shutdown" })
        ));
    }

    #[tokio::test]
    async fn test_default_terminate_and_filter() {
        let hooks = HookSet::builder()
            .name("svc")
            .start(|_| async { Ok(()) })
            .shutdown(|_| async { Ok(()) })
            .build()
            .unwrap();

        assert_eq!(hooks.name(), "svc");
        assert!(hooks.terminate(CancellationToken::new()).await.is_ok());

        let event = Event {
            context: CancellationToken::new(),
            error: Some(LifecycleError::hook("boom")),
            from: State::Started,
            to: State::Started,
        };
        let filtered = hooks.filter_error(&event);
        assert_eq!(filtered.map(|e| e.to_string()), Some("boom".to_string()));
    }

    #[test]
    fn test_custom_filter_suppresses() {
        let hooks = HookSet::builder()
            .start(|_| async { Ok(()) })
            .shutdown(|_| async { Ok(()) })
            .on_error(|event| match &event.error {
                Some(err) if err.to_string() == "closed" => None,
                other => other.clone(),
            })
            .build()
            .unwrap();

        let event = Event {
            context: CancellationToken::new(),
            error: Some(LifecycleError::hook("closed")),
            from: State::ShuttingDown,
            to: State::ShuttingDown,
        };
        assert!(hooks.filter_error(&event).is_none());
    }
}
