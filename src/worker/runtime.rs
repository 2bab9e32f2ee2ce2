use super::Worker;
use crate::signal::{SignalAction, SignalListener};
use tokio_util::sync::CancellationToken;

impl Worker {
    /// Wait for one of the configured signals, or for the worker to be done.
    /// A received signal triggers shutdown or terminate in the background;
    /// interest in the signals is dropped either way.
    pub(super) fn spawn_signal_watcher(&self, ctx: CancellationToken, mut listener: SignalListener) {
        let worker = self.clone();
        tokio::spawn(async move {
            let received = tokio::select! {
                sig = listener.recv() => Some(sig),
                _ = worker.inner.done.cancelled() => None,
            };
            drop(listener);

            let Some(sig) = received else {
                return;
            };
            worker.info("received signal", &[("signal", &sig)]);

            let action = worker.inner.options.signal_action;
            tokio::spawn(async move {
                let result = match action {
                    SignalAction::Shutdown => worker.shutdown_with(ctx.clone()).await,
                    SignalAction::Terminate => worker.terminate_with(ctx.clone()).await,
                };
                match result {
                    // Already stopping or stopped; nothing to report
                    Err(err) if err.is_invalid_state() => {
                        worker.info("ignoring signal", &[("reason", &err)]);
                    }
                    Err(err) => {
                        let _ = worker.handle_error(&ctx, err).await;
                    }
                    Ok(()) => {}
                }
            });
        });
    }
}
