use super::types::{Event, ObserverId, State};
use super::Worker;
use crate::error::{LifecycleError, Result};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Non-terminal states an error can retire the worker from
pub(super) const ACTIVE: [State; 4] = [
    State::Starting,
    State::Started,
    State::ShuttingDown,
    State::Terminating,
];

impl Worker {
    /// Current state snapshot
    pub fn state(&self) -> State {
        *self.inner.state_tx.borrow()
    }

    /// Receiver following state changes
    pub fn subscribe_state(&self) -> watch::Receiver<State> {
        self.inner.state_tx.subscribe()
    }

    /// Error that moved the worker to `Error`, if any
    pub fn error(&self) -> Option<LifecycleError> {
        self.inner.cause.get().cloned()
    }

    /// Register a sink receiving every lifecycle event. The worker drops its
    /// sender once a terminal state is reached, ending the stream. A sink
    /// registered after that point is dropped straight away.
    pub async fn observe(&self, sink: mpsc::Sender<Event>) -> ObserverId {
        let mut machine = self.inner.machine.lock().await;
        let id = ObserverId(machine.next_observer_id);
        machine.next_observer_id += 1;

        if machine.state.is_terminal() {
            debug!("Observer {:?} registered after worker finalized", id);
        } else {
            machine.observers.push((id, sink));
        }
        id
    }

    /// Remove a sink. Returns false if it was not registered.
    pub async fn unobserve(&self, id: ObserverId) -> bool {
        let mut machine = self.inner.machine.lock().await;
        let before = machine.observers.len();
        machine.observers.retain(|(observer, _)| *observer != id);
        machine.observers.len() != before
    }

    /// Move to `to` if the current state is one of `allowed`. An empty
    /// `allowed` does not lift the gate: the move must still be a legal
    /// edge of the state diagram. Observers are notified
    /// under the same lock; a final event closes every observer stream.
    /// Returns the previous state.
    pub(super) async fn transition(
        &self,
        ctx: &CancellationToken,
        to: State,
        allowed: &[State],
        cause: Option<LifecycleError>,
    ) -> Result<State> {
        let mut machine = self.inner.machine.lock().await;

        let current = machine.state;
        let permitted = if allowed.is_empty() {
            current.can_transition_to(to)
        } else {
            allowed.contains(&current)
        };
        if !permitted {
            return Err(LifecycleError::InvalidState { from: current, to });
        }

        machine.state = to;
        self.inner.state_tx.send_replace(to);
        if to != current {
            self.info("transitioned to state", &[("to", &to), ("from", &current)]);
        }
        if to == State::Error {
            if let Some(err) = &cause {
                let _ = self.inner.cause.set(err.clone());
            }
        }

        let event = Event {
            context: ctx.clone(),
            error: cause,
            from: current,
            to,
        };
        let is_final = event.is_final();

        let observers = std::mem::take(&mut machine.observers);
        for (id, observer) in observers {
            if observer.send(event.clone()).await.is_err() {
                debug!("Observer {:?} went away, dropping it", id);
                continue;
            }
            if !is_final {
                machine.observers.push((id, observer));
            }
        }

        Ok(current)
    }

    /// Pass `err` through the error hook. A suppressed error yields `Ok`.
    /// Anything else is logged and, unless it is an interruption, retires
    /// the worker into `Error` and releases the done waiters.
    pub(super) async fn handle_error(
        &self,
        ctx: &CancellationToken,
        err: LifecycleError,
    ) -> Result<()> {
        let current = self.state();
        let event = Event {
            context: ctx.clone(),
            error: Some(err),
            from: current,
            to: current,
        };
        let Some(err) = self.inner.hooks.filter_error(&event) else {
            return Ok(());
        };

        self.log_error(&err, "received error", &[]);
        if !err.is_interrupted() {
            let _ = self
                .transition(ctx, State::Error, &ACTIVE, Some(err.clone()))
                .await;
            self.inner.done.cancel();
        }

        Err(err)
    }
}
