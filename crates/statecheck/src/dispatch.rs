//! Model dispatcher
//!
//! Executes one step at a time against a model instance, maintaining the
//! current FSM state. The dispatcher is the only place the engine touches
//! model hooks, and the call hook is the only place abrupt UUT failures
//! are captured: a panic inside `call` becomes a failing result instead
//! of unwinding through the engine. Panics raised by `pre`, `post`, or
//! `next` are configuration bugs and propagate.

use crate::error::{EngineError, EngineResult};
use crate::fsm::Fsm;
use crate::model::{Model, OpTable, Operation};
use crate::trace::{Step, StepResult, StepStatus};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Executes steps against a model, tracking the current state
pub struct Dispatcher<'a, M: Model> {
    fsm: &'a Fsm,
    ops: OpTable<M>,
    current_state: String,
}

impl<'a, M: Model> Dispatcher<'a, M> {
    /// Build a dispatcher for `fsm`, validating the model's operation table
    pub fn new(fsm: &'a Fsm) -> EngineResult<Self> {
        Ok(Self {
            fsm,
            ops: OpTable::new()?,
            current_state: fsm.initial_state().to_string(),
        })
    }

    /// Reset to the FSM's initial state
    pub fn reset(&mut self) {
        self.current_state = self.fsm.initial_state().to_string();
    }

    /// The state the next step must start from
    #[must_use]
    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    /// Resolve an operation in the model's capability table
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Operation<M>> {
        self.ops.get(name)
    }

    /// Dispatch one step against `model`
    ///
    /// Returns the step's outcome as a value; the error branch is
    /// reserved for fatal configuration problems (unknown operation,
    /// schema mismatch). On a passing step the current state advances to
    /// `s.new_state`; on any other outcome it is unchanged.
    pub fn step(&mut self, s: &Step, model: &mut M) -> EngineResult<StepResult> {
        if s.state != self.current_state || !self.fsm.allows(&s.state, &s.new_state, &s.op) {
            return Ok(StepResult {
                step: s.clone(),
                status: StepStatus::Invalid,
                rets: Vec::new(),
            });
        }

        let op = self
            .ops
            .get(&s.op)
            .ok_or_else(|| EngineError::UnknownOperation { op: s.op.clone() })?;

        if s.args.len() != op.params.len() {
            return Err(EngineError::ArityMismatch {
                op: s.op.clone(),
                expected: op.params.len(),
                got: s.args.len(),
            });
        }
        for (index, (arg, &expected)) in s.args.iter().zip(op.params.iter()).enumerate() {
            if arg.kind() != expected {
                return Err(EngineError::ArgumentType {
                    op: s.op.clone(),
                    index,
                    expected,
                    got: arg.type_name(),
                });
            }
        }

        if let Some(pre) = op.pre {
            if !pre(model, &s.state, &s.new_state, &s.args) {
                return Ok(StepResult {
                    step: s.clone(),
                    status: StepStatus::PreFail,
                    rets: Vec::new(),
                });
            }
        }

        let call = op.call;
        let rets = match panic::catch_unwind(AssertUnwindSafe(|| call(model, &s.args))) {
            Ok(rets) => rets,
            Err(payload) => {
                debug!(op = %s.op, "call panicked: {}", panic_message(payload.as_ref()));
                return Ok(StepResult {
                    step: s.clone(),
                    status: StepStatus::PostFail,
                    rets: Vec::new(),
                });
            }
        };

        if let Some(post) = op.post {
            if !post(model, &s.state, &s.new_state, &s.args, &rets) {
                return Ok(StepResult {
                    step: s.clone(),
                    status: StepStatus::PostFail,
                    rets,
                });
            }
        }

        if let Some(next) = op.next {
            next(model, &s.state, &s.new_state, &s.args, &rets);
        }

        self.current_state = s.new_state.clone();
        Ok(StepResult {
            step: s.clone(),
            status: StepStatus::Passed,
            rets,
        })
    }
}

/// Best-effort extraction of a panic payload's message
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}
