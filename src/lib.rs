//! Service lifecycle management.
//!
//! A [`Worker`] wraps a long-running service described by a set of
//! [`Hooks`] and gives it start, graceful shutdown and forced termination
//! with a guarded state machine:
//!
//! - state only moves along legal edges, serialized by a single lock
//! - every transition is broadcast to observers in order; the stream ends
//!   on `Stopped` or `Error`
//! - a shutdown that outlives its timeout is escalated to termination
//! - configured OS signals trigger shutdown or termination
//! - an optional readiness probe decides when `Starting` becomes `Started`
//!
//! ```ignore
//! let hooks = HookSet::builder()
//!     .name("http")
//!     .start(move |_| { let server = server.clone(); async move { server.serve().await } })
//!     .shutdown(move |ctx| { let server = server2.clone(); async move { server.drain(ctx).await } })
//!     .build()?;
//!
//! let worker = Worker::with_options(hooks, Options::default());
//! worker.start().await?;
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod logger;
pub mod options;
pub mod signal;
pub mod worker;

pub use self::config::WorkerConfig;
pub use error::{LifecycleError, Result};
pub use hooks::{HookFuture, HookSet, HookSetBuilder, Hooks};
pub use logger::{Logger, NullLogger, TracingLogger};
pub use options::{readiness_after, Options, ReadinessProbe, DEFAULT_SHUTDOWN_TIMEOUT};
pub use signal::{Signal, SignalAction};
pub use worker::{Event, ObserverId, State, Worker};
