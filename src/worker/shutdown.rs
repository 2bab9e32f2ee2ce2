use super::types::State;
use super::Worker;
use crate::error::Result;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

impl Worker {
    /// Shut the service down gracefully, terminating it if the shutdown
    /// hook does not finish within the shutdown timeout
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_with(CancellationToken::new()).await
    }

    /// [`shutdown`](Self::shutdown) with the given context. Cancelling `ctx`
    /// escalates to termination as well.
    pub async fn shutdown_with(&self, ctx: CancellationToken) -> Result<()> {
        self.transition(
            &ctx,
            State::ShuttingDown,
            &[State::Starting, State::Started],
            None,
        )
        .await?;

        let timeout = self.inner.options.shutdown_timeout;
        let bounded = ctx.child_token();
        let _cancel_on_exit = bounded.clone().drop_guard();

        let timeout_str = format!("{:?}", timeout);
        self.info("starting graceful shutdown", &[("timeout", &timeout_str)]);

        let hooks = Arc::clone(&self.inner.hooks);
        let outcome = tokio::select! {
            result = hooks.shutdown(bounded.clone()) => Some(result),
            _ = sleep(timeout) => None,
            _ = bounded.cancelled() => None,
        };

        match outcome {
            None => {
                bounded.cancel();
                self.info("service did not shut down in time, terminating", &[]);
                self.terminate_with(bounded.clone()).await
            }
            Some(Err(err)) => self.handle_error(&bounded, err).await,
            Some(Ok(())) => {
                let _ = self
                    .transition(&bounded, State::Stopped, &[State::ShuttingDown], None)
                    .await;
                Ok(())
            }
        }
    }

    /// Forcefully terminate the service
    pub async fn terminate(&self) -> Result<()> {
        self.terminate_with(CancellationToken::new()).await
    }

    /// [`terminate`](Self::terminate) with the given context. No deadline
    /// is applied to the terminate hook.
    pub async fn terminate_with(&self, ctx: CancellationToken) -> Result<()> {
        self.transition(
            &ctx,
            State::Terminating,
            &[State::Starting, State::Started, State::ShuttingDown],
            None,
        )
        .await?;

        self.info("terminating service", &[]);
        if let Err(err) = self.inner.hooks.terminate(ctx.clone()).await {
            return self.handle_error(&ctx, err).await;
        }

        let _ = self
            .transition(&ctx, State::Stopped, &[State::Terminating], None)
            .await;

        // The work runner may have fired this already
        self.inner.done.cancel();

        Ok(())
    }
}
