//! Worker lifecycle state machine
//!
//! A [`Worker`] drives a service through its [`Hooks`](crate::hooks::Hooks)
//! and keeps it on the legal edges of the [`State`] machine no matter how
//! start, shutdown, terminate, OS signals and the shutdown timeout race.

mod controller;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use controller::Worker;
pub use types::{Event, ObserverId, State};
