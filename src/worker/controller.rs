use super::types::{Event, ObserverId, State};
use crate::error::LifecycleError;
use crate::hooks::Hooks;
use crate::logger::Fields;
use crate::options::Options;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;

/// Service handle driving hooks through the lifecycle state machine.
/// Clones share the same underlying machine.
#[derive(Clone)]
pub struct Worker {
    pub(super) inner: Arc<WorkerInner>,
}

pub(super) struct WorkerInner {
    pub(super) hooks: Arc<dyn Hooks>,
    pub(super) options: Options,

    // State and observers share one lock so fan-out stays ordered
    pub(super) machine: Mutex<Machine>,
    pub(super) state_tx: watch::Sender<State>,
    pub(super) cause: OnceLock<LifecycleError>,

    // Fire-once latches
    pub(super) ready: CancellationToken,
    pub(super) done: CancellationToken,
}

pub(super) struct Machine {
    pub(super) state: State,
    pub(super) observers: Vec<(ObserverId, mpsc::Sender<Event>)>,
    pub(super) next_observer_id: u64,
}

impl Worker {
    /// Create a worker with default options
    pub fn new<H: Hooks>(hooks: H) -> Self {
        Self::with_options(hooks, Options::default())
    }

    /// Create a worker with the given options. A zero shutdown timeout is
    /// replaced by the default.
    pub fn with_options<H: Hooks>(hooks: H, options: Options) -> Self {
        Self::from_shared(Arc::new(hooks), options)
    }

    /// Create a worker from hooks already shared elsewhere
    pub fn from_shared(hooks: Arc<dyn Hooks>, options: Options) -> Self {
        let (state_tx, _) = watch::channel(State::Initial);

        Self {
            inner: Arc::new(WorkerInner {
                hooks,
                options: options.normalized(),
                machine: Mutex::new(Machine {
                    state: State::Initial,
                    observers: Vec::new(),
                    next_observer_id: 0,
                }),
                state_tx,
                cause: OnceLock::new(),
                ready: CancellationToken::new(),
                done: CancellationToken::new(),
            }),
        }
    }

    /// Friendly name of the wrapped service
    pub fn name(&self) -> &str {
        self.inner.hooks.name()
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub(super) fn info(&self, msg: &str, fields: Fields<'_>) {
        let name = self.name();
        let mut all: Vec<(&str, &dyn fmt::Display)> = fields.to_vec();
        all.push(("name", &name));
        self.inner.options.logger.info(msg, &all);
    }

    pub(super) fn log_error(&self, err: &LifecycleError, msg: &str, fields: Fields<'_>) {
        let name = self.name();
        let mut all: Vec<(&str, &dyn fmt::Display)> = fields.to_vec();
        all.push(("name", &name));
        self.inner.options.logger.error(err, msg, &all);
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("options", &self.inner.options)
            .finish()
    }
}
