//! statecheck - Stateful property-based testing
//!
//! This crate provides:
//! - **FSM-guided generation**: random walks over a finite-state machine
//!   describing the legal orderings of operations on a unit under test
//! - **Model dispatch**: per-operation pre/call/post/next hooks comparing
//!   observed UUT output against a shadow model, with panic capture at
//!   the call site
//! - **Deterministic replay**: re-execute a recorded step sequence
//!   against a fresh model
//! - **Trace minimization**: shrink a failing sequence to a 1-minimal
//!   failing subsequence with delta debugging (ddmin, Zeller 2002)
//!
//! # Quick Start
//!
//! ```rust
//! use statecheck::{Engine, EngineConfig, Fsm, Model, Operation, Value};
//!
//! // A counter whose UUT always reports zero
//! #[derive(Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! fn bump_call(_m: &mut Counter, _args: &[Value]) -> Vec<Value> {
//!     vec![Value::Int(0)] // buggy UUT: never counts
//! }
//!
//! fn bump_post(m: &Counter, _f: &str, _t: &str, _a: &[Value], rets: &[Value]) -> bool {
//!     rets[0].as_int() == Some(m.count + 1)
//! }
//!
//! fn bump_next(m: &mut Counter, _f: &str, _t: &str, _a: &[Value], _r: &[Value]) {
//!     m.count += 1;
//! }
//!
//! impl Model for Counter {
//!     fn operations() -> Vec<Operation<Self>> {
//!         vec![Operation::new("Bump", [], bump_call)
//!             .with_post(bump_post)
//!             .with_next(bump_next)]
//!     }
//! }
//!
//! let fsm = Fsm::new().with_transition("state0", "state0", ["Bump"]);
//! let engine = Engine::<Counter>::new(fsm, EngineConfig::new().with_seed(42)).unwrap();
//!
//! let outcome = engine.run().unwrap();
//! assert!(outcome.failed());
//!
//! let minimized = engine.minimize(outcome.trace()).unwrap();
//! assert_eq!(minimized.trace.len(), 1);
//! ```

pub mod dispatch;
pub mod error;
pub mod fsm;
pub mod minimize;
pub mod model;
pub mod oracle;
pub mod replay;
pub mod runner;
pub mod trace;
pub mod value;

// Re-exports
pub use dispatch::Dispatcher;
pub use error::{EngineError, EngineResult};
pub use fsm::{Fsm, Transition, DEFAULT_INITIAL_STATE};
pub use minimize::{ddmin, MinimizeConfig, MinimizeStats, Verdict};
pub use model::{CallHook, Model, NextHook, Operation, PostHook, PreHook};
pub use oracle::{DefaultOracle, ValueOracle};
pub use replay::{replay_steps, Replay};
pub use runner::{Engine, EngineConfig, Minimized, RunOutcome, RunStats};
pub use trace::{Step, StepResult, StepStatus, Trace};
pub use value::{Value, ValueKind};
