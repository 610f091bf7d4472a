//! Steps, results, and traces
//!
//! A [`Step`] is one intended operation: the edge it drives and the
//! arguments it carries. Dispatching a step yields a [`StepResult`]; a
//! [`Trace`] is the ordered sequence of results a run produced, up to and
//! including the first failure. Steps are serializable by value and never
//! mutated after emission.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One intended operation on the unit under test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// Source state the step was generated in
    pub state: String,
    /// Destination state on success
    pub new_state: String,
    /// Operation name
    pub op: String,
    /// Generated arguments, one per declared parameter
    pub args: Vec<Value>,
}

impl Step {
    /// Create a step
    #[must_use]
    pub fn new(
        state: impl Into<String>,
        new_state: impl Into<String>,
        op: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            state: state.into(),
            new_state: new_state.into(),
            op: op.into(),
            args,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Outcome classification of a dispatched step
///
/// At most one failure applies to a step, so the classification is an
/// enum rather than independent flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    /// Call completed and the postcondition held
    Passed,
    /// The step contradicts the FSM (wrong source state or unregistered edge)
    Invalid,
    /// The precondition rejected the step; nothing was invoked
    PreFail,
    /// The call panicked or the postcondition rejected its output
    PostFail,
}

impl StepStatus {
    /// Whether this status is the failure signal a run stops on
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, StepStatus::PostFail)
    }
}

/// Result of dispatching one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// The dispatched step
    pub step: Step,
    /// Outcome classification
    pub status: StepStatus,
    /// Values the call returned; empty when the call panicked or never ran
    pub rets: Vec<Value>,
}

impl StepResult {
    /// Whether this result is the failure signal a run stops on
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.step)?;
        if !self.rets.is_empty() {
            write!(f, " = (")?;
            for (i, ret) in self.rets.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", ret)?;
            }
            write!(f, ")")?;
        }
        match self.status {
            StepStatus::Passed => Ok(()),
            StepStatus::Invalid => write!(f, "  [invalid]"),
            StepStatus::PreFail => write!(f, "  [precondition failed]"),
            StepStatus::PostFail => write!(f, "  [postcondition failed]"),
        }
    }
}

/// Ordered sequence of step results, the output of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Results in emission order
    pub results: Vec<StepResult>,
}

impl Trace {
    /// Create an empty trace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trace from results
    #[must_use]
    pub fn from_results(results: Vec<StepResult>) -> Self {
        Self { results }
    }

    /// Number of results
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the trace holds no results
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Last result, if any
    #[must_use]
    pub fn last(&self) -> Option<&StepResult> {
        self.results.last()
    }

    /// Whether the trace ends in a failure
    #[must_use]
    pub fn failed(&self) -> bool {
        self.last().is_some_and(StepResult::is_failure)
    }

    /// The steps, cloned out for replay or minimization
    #[must_use]
    pub fn steps(&self) -> Vec<Step> {
        self.results.iter().map(|r| r.step.clone()).collect()
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, result) in self.results.iter().enumerate() {
            writeln!(f, "{:4}: {}", i + 1, result)?;
        }
        Ok(())
    }
}
