//! Finite-state machine registry
//!
//! States are opaque names; the state set is implicit in the transitions.
//! A transition carries the ordered list of operations legal along its
//! edge. The registry is read-only once the engine starts and may be
//! shared across runs.
//!
//! Operation names are not validated here against any model; the
//! dispatcher resolves them lazily and reports a fatal error on first
//! miss.

use rustc_hash::FxHashMap;

/// Conventional initial state when none is configured
pub const DEFAULT_INITIAL_STATE: &str = "state0";

/// One outgoing edge: destination state plus the operations legal on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Destination state
    pub to: String,
    /// Operations that may drive this edge, in registration order
    pub ops: Vec<String>,
}

/// Transition registry keyed by source state
#[derive(Debug, Clone, Default)]
pub struct Fsm {
    transitions: FxHashMap<String, Vec<Transition>>,
    initial_state: Option<String>,
}

impl Fsm {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transition; duplicates are permitted but redundant
    pub fn add_transition(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        ops: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.transitions
            .entry(from.into())
            .or_default()
            .push(Transition {
                to: to.into(),
                ops: ops.into_iter().map(Into::into).collect(),
            });
    }

    /// Builder form of [`Fsm::add_transition`]
    #[must_use]
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        ops: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.add_transition(from, to, ops);
        self
    }

    /// Override the initial state (defaults to [`DEFAULT_INITIAL_STATE`])
    pub fn set_initial_state(&mut self, name: impl Into<String>) {
        self.initial_state = Some(name.into());
    }

    /// Builder form of [`Fsm::set_initial_state`]
    #[must_use]
    pub fn with_initial_state(mut self, name: impl Into<String>) -> Self {
        self.set_initial_state(name);
        self
    }

    /// The state every walk and replay starts from
    #[must_use]
    pub fn initial_state(&self) -> &str {
        self.initial_state.as_deref().unwrap_or(DEFAULT_INITIAL_STATE)
    }

    /// Outgoing transitions from `state`, in registration order
    #[must_use]
    pub fn transitions_from(&self, state: &str) -> &[Transition] {
        self.transitions.get(state).map_or(&[], Vec::as_slice)
    }

    /// Whether `op` is registered on some `(from -> to)` edge
    #[must_use]
    pub fn allows(&self, from: &str, to: &str, op: &str) -> bool {
        self.transitions_from(from)
            .iter()
            .any(|t| t.to == to && t.ops.iter().any(|m| m == op))
    }
}
