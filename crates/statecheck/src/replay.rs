//! Deterministic trace replay
//!
//! Re-executes a given step sequence against a fresh model instance.
//! Replay never consults the RNG: the steps already carry their
//! arguments, so two replays of the same steps against the same model
//! type produce identical results (UUT nondeterminism is a test-author
//! bug, not an engine concern).

use crate::dispatch::Dispatcher;
use crate::error::EngineResult;
use crate::fsm::Fsm;
use crate::minimize::Verdict;
use crate::model::Model;
use crate::trace::{Step, StepResult, StepStatus, Trace};

/// Outcome of replaying a step sequence
#[derive(Debug, Clone)]
pub struct Replay {
    /// Results accumulated up to and including the stopping step
    pub results: Vec<StepResult>,
    /// False when a step was invalid or unexpectedly rejected by a
    /// precondition; such a sequence's outcome is meaningless
    pub valid: bool,
    /// True when the sequence reproduced a failure
    pub failed: bool,
}

impl Replay {
    /// Map this replay onto the minimizer's three-valued verdict
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        match (self.valid, self.failed) {
            (true, true) => Verdict::Fail,
            (true, false) => Verdict::Pass,
            (false, _) => Verdict::Unresolved,
        }
    }

    /// The accumulated results as a trace
    #[must_use]
    pub fn into_trace(self) -> Trace {
        Trace::from_results(self.results)
    }
}

/// Replay `steps` against a fresh instance of `M`
pub fn replay_steps<M: Model>(fsm: &Fsm, steps: &[Step]) -> EngineResult<Replay> {
    let mut dispatcher = Dispatcher::<M>::new(fsm)?;
    let mut model = M::default();
    let mut results = Vec::with_capacity(steps.len());

    for step in steps {
        let result = dispatcher.step(step, &mut model)?;
        let status = result.status;
        results.push(result);
        match status {
            StepStatus::Invalid | StepStatus::PreFail => {
                return Ok(Replay {
                    results,
                    valid: false,
                    failed: false,
                });
            }
            StepStatus::PostFail => {
                return Ok(Replay {
                    results,
                    valid: true,
                    failed: true,
                });
            }
            StepStatus::Passed => {}
        }
    }

    Ok(Replay {
        results,
        valid: true,
        failed: false,
    })
}
