use crate::error::LifecycleError;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Worker lifecycle states
///
/// ```text
///          Initial
///             |
///          Starting ---------+
///             |              |
///          Started ----------+
///             |              |
///        ShuttingDown -------+
///             |              |
///             +--> Stopped <-+- Terminating
///             |              |
///             +--> Error <---+
/// ```
///
/// `Stopped` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Initial,
    Starting,
    Started,
    ShuttingDown,
    Terminating,
    Stopped,
    Error,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Stopped | State::Error)
    }

    /// Whether `self -> to` is an edge of the state machine
    pub fn can_transition_to(self, to: State) -> bool {
        use State::*;
        matches!(
            (self, to),
            (Initial, Starting)
                | (Starting, Started | ShuttingDown | Terminating | Stopped | Error)
                | (Started, ShuttingDown | Terminating | Stopped | Error)
                | (ShuttingDown, Stopped | Terminating | Error)
                | (Terminating, Stopped | Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            State::Initial => "Initial",
            State::Starting => "Starting",
            State::Started => "Started",
            State::ShuttingDown => "ShuttingDown",
            State::Terminating => "Terminating",
            State::Stopped => "Stopped",
            State::Error => "Error",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle event posted to observers on every transition
#[derive(Debug, Clone)]
pub struct Event {
    /// Token of the call the transition originated from
    pub context: CancellationToken,
    /// Error that caused the transition, if any
    pub error: Option<LifecycleError>,
    pub from: State,
    pub to: State,
}

impl Event {
    pub fn is_final(&self) -> bool {
        self.error.is_some() || self.to.is_terminal()
    }
}

/// Handle returned by `Worker::observe`, used to unregister the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(super) u64);

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [State; 7] = [
        State::Initial,
        State::Starting,
        State::Started,
        State::ShuttingDown,
        State::Terminating,
        State::Stopped,
        State::Error,
    ];

    #[test]
    fn test_terminal_states_have_no_edges() {
        for to in ALL {
            assert!(!State::Stopped.can_transition_to(to));
            assert!(!State::Error.can_transition_to(to));
        }
    }

    #[test]
    fn test_edge_set() {
        assert!(State::Initial.can_transition_to(State::Starting));
        assert!(!State::Initial.can_transition_to(State::Started));
        assert!(State::Starting.can_transition_to(State::Error));
        assert!(!State::Started.can_transition_to(State::Starting));
        assert!(State::ShuttingDown.can_transition_to(State::Terminating));
        assert!(!State::Terminating.can_transition_to(State::ShuttingDown));

        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(edges, 15);
    }

    #[test]
    fn test_display() {
        assert_eq!(State::ShuttingDown.to_string(), "ShuttingDown");
    }
}
