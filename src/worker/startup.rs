use super::state::ACTIVE;
use super::types::State;
use super::Worker;
use crate::error::{LifecycleError, Result};
use crate::signal::SignalListener;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl Worker {
    /// Start the service and block until it is stopped. Returns the error
    /// that retired the worker, if any.
    pub async fn start(&self) -> Result<()> {
        self.start_with(CancellationToken::new()).await
    }

    /// [`start`](Self::start) with the given context
    pub async fn start_with(&self, ctx: CancellationToken) -> Result<()> {
        self.start_background_with(ctx).await?;
        self.done().await;
        self.retained_error()
    }

    /// Start the service and return once it is ready or has failed
    pub async fn start_background(&self) -> Result<()> {
        self.start_background_with(CancellationToken::new()).await
    }

    /// [`start_background`](Self::start_background) with the given context
    pub async fn start_background_with(&self, ctx: CancellationToken) -> Result<()> {
        self.transition(&ctx, State::Starting, &[State::Initial], None)
            .await?;

        // Handlers go in before anything runs so a signal never meets the
        // default disposition
        let listener = if self.inner.options.signals.is_empty() {
            None
        } else {
            match SignalListener::register(&self.inner.options.signals) {
                Ok(listener) => Some(listener),
                Err(err) => {
                    self.handle_error(&ctx, err).await?;
                    None
                }
            }
        };

        self.spawn_work_runner(ctx.clone());
        if let Some(listener) = listener {
            self.spawn_signal_watcher(ctx.clone(), listener);
        }

        match self.wait_for_readiness().await {
            // Service exited before becoming ready
            None => return self.retained_error(),
            Some(Err(err)) => self.handle_error(&ctx, err).await?,
            Some(Ok(())) => {}
        }

        if self
            .transition(&ctx, State::Started, &[State::Starting], None)
            .await
            .is_ok()
        {
            self.inner.ready.cancel();
            Ok(())
        } else {
            self.retained_error()
        }
    }

    /// Wait until the service is started. Fails with `NotReady` if the
    /// worker stops or errors without ever becoming ready.
    pub async fn ready(&self) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.inner.ready.cancelled() => Ok(()),
            _ = self.inner.done.cancelled() => {
                if self.inner.ready.is_cancelled() {
                    Ok(())
                } else {
                    Err(LifecycleError::NotReady { state: self.state() })
                }
            }
        }
    }

    /// Wait until the worker is stopped or has reached `Error`
    pub async fn done(&self) {
        self.inner.done.cancelled().await
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.is_cancelled()
    }

    pub fn is_done(&self) -> bool {
        self.inner.done.is_cancelled()
    }

    fn retained_error(&self) -> Result<()> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run the start hook in the background, then settle on `Stopped` (unless
    /// an error got there first) and release the done waiters.
    fn spawn_work_runner(&self, ctx: CancellationToken) {
        let worker = self.clone();
        tokio::spawn(async move {
            worker.info("starting service", &[]);

            let hooks = Arc::clone(&worker.inner.hooks);
            let hook_ctx = ctx.clone();
            let result = match tokio::spawn(async move { hooks.start(hook_ctx).await }).await {
                Ok(result) => result,
                Err(join_err) => Err(LifecycleError::hook(format!(
                    "start hook aborted: {}",
                    join_err
                ))),
            };

            if let Err(err) = result {
                let _ = worker.handle_error(&ctx, err).await;
            }

            let _ = worker.transition(&ctx, State::Stopped, &ACTIVE, None).await;
            worker.inner.done.cancel();
        });
    }

    /// Race the readiness probe against done. `None` means the wait was
    /// abandoned because the service finished first.
    async fn wait_for_readiness(&self) -> Option<Result<()>> {
        let Some(probe) = self.inner.options.readiness_probe.clone() else {
            return Some(Ok(()));
        };

        self.info("waiting for readiness", &[]);
        tokio::select! {
            result = probe.check() => Some(result),
            _ = self.inner.done.cancelled() => {
                self.info("interrupting readiness probe", &[]);
                None
            }
        }
    }
}
