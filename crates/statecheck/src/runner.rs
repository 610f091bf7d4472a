//! FSM-guided generation and the engine facade
//!
//! The runner drives a random walk over the FSM: pick a transition
//! uniformly, pick one of its operations uniformly, draw arguments from
//! the oracle, dispatch. Precondition-rejected candidates are discarded
//! and re-drawn without consuming an output slot; the walk ends at the
//! first failure, at a dead end, or at the per-attempt step cap.
//!
//! Uniformity is over transitions first and then over ops within the
//! chosen transition, so each transition carries equal weight no matter
//! how many ops it bundles.

use crate::dispatch::Dispatcher;
use crate::error::{EngineError, EngineResult};
use crate::fsm::Fsm;
use crate::minimize::{ddmin, MinimizeConfig, MinimizeStats};
use crate::model::{Model, OpTable};
use crate::oracle::{DefaultOracle, ValueOracle};
use crate::replay::{replay_steps, Replay};
use crate::trace::{Step, StepResult, StepStatus, Trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Configuration for generation runs
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seed for reproducibility (`None` = entropy). A single seed fully
    /// determines the generated trace.
    pub seed: Option<u64>,
    /// Cap on emitted steps per attempt
    pub max_steps: usize,
    /// Number of walks per `run()`; the RNG stream is shared across
    /// attempts so the seed still determines the whole run
    pub attempts: usize,
    /// Consecutive precondition rejections before a walk is abandoned
    /// as stalled
    pub max_discards: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps: 256,
            attempts: 64,
            max_discards: 4096,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the per-attempt step cap
    #[must_use]
    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    /// Set the number of attempts per run
    #[must_use]
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the stall guard
    #[must_use]
    pub fn with_max_discards(mut self, max: usize) -> Self {
        self.max_discards = max;
        self
    }
}

/// Counters from a generation run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    /// Walks started
    pub attempts: usize,
    /// Results appended across all attempts
    pub steps_emitted: usize,
    /// Precondition-rejected candidates that were re-drawn
    pub pre_discards: usize,
    /// Walks that ran out of transitions or stalled on preconditions
    pub dead_ends: usize,
    /// Walks that hit the step cap
    pub truncated: usize,
}

/// Result of a generation run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// A walk emitted a failing step; the trace ends with it
    Failed { trace: Trace, stats: RunStats },
    /// Every attempt completed without a failure; the trace is the last
    /// attempt's
    Completed { trace: Trace, stats: RunStats },
}

impl RunOutcome {
    /// Whether the run found a failure
    #[must_use]
    pub fn failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }

    /// The run's trace
    #[must_use]
    pub fn trace(&self) -> &Trace {
        match self {
            RunOutcome::Failed { trace, .. } | RunOutcome::Completed { trace, .. } => trace,
        }
    }

    /// The run's counters
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        match self {
            RunOutcome::Failed { stats, .. } | RunOutcome::Completed { stats, .. } => stats,
        }
    }

    /// Consume the outcome, keeping the trace
    #[must_use]
    pub fn into_trace(self) -> Trace {
        match self {
            RunOutcome::Failed { trace, .. } | RunOutcome::Completed { trace, .. } => trace,
        }
    }
}

/// A minimized failing trace plus reduction counters
#[derive(Debug, Clone)]
pub struct Minimized {
    /// Final failing replay of the minimized steps
    pub trace: Trace,
    /// Reduction counters
    pub stats: MinimizeStats,
}

/// The engine: FSM plus model type plus run policy
///
/// The FSM is read-only once the engine is built; each `run` and each
/// `replay` works on a fresh model instance.
pub struct Engine<M: Model> {
    fsm: Fsm,
    config: EngineConfig,
    minimize_config: MinimizeConfig,
    _model: PhantomData<M>,
}

impl<M: Model> Engine<M> {
    /// Build an engine, validating the model's capability table
    pub fn new(fsm: Fsm, config: EngineConfig) -> EngineResult<Self> {
        // surfaces duplicate operation names before any walk starts
        let _ = OpTable::<M>::new()?;
        Ok(Self {
            fsm,
            config,
            minimize_config: MinimizeConfig::default(),
            _model: PhantomData,
        })
    }

    /// Override the minimization policy
    #[must_use]
    pub fn with_minimize_config(mut self, config: MinimizeConfig) -> Self {
        self.minimize_config = config;
        self
    }

    /// The engine's FSM
    #[must_use]
    pub fn fsm(&self) -> &Fsm {
        &self.fsm
    }

    /// Run with the default argument oracle
    pub fn run(&self) -> EngineResult<RunOutcome> {
        self.run_with_oracle(&mut DefaultOracle)
    }

    /// Run with a caller-supplied argument oracle
    pub fn run_with_oracle<O: ValueOracle>(&self, oracle: &mut O) -> EngineResult<RunOutcome> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut stats = RunStats::default();
        let mut last_trace = Trace::new();

        for attempt in 0..self.config.attempts.max(1) {
            stats.attempts += 1;
            match self.walk(oracle, &mut rng, &mut stats)? {
                Walk::Failed(results) => {
                    debug!(attempt, len = results.len(), "failure found");
                    return Ok(RunOutcome::Failed {
                        trace: Trace::from_results(results),
                        stats,
                    });
                }
                Walk::Clean(results) => {
                    last_trace = Trace::from_results(results);
                }
            }
        }

        Ok(RunOutcome::Completed {
            trace: last_trace,
            stats,
        })
    }

    /// One walk from the initial state
    fn walk<O: ValueOracle>(
        &self,
        oracle: &mut O,
        rng: &mut StdRng,
        stats: &mut RunStats,
    ) -> EngineResult<Walk> {
        let mut dispatcher = Dispatcher::<M>::new(&self.fsm)?;
        let mut model = M::default();
        let mut results = Vec::new();
        let mut discards = 0usize;

        loop {
            if results.len() >= self.config.max_steps {
                stats.truncated += 1;
                return Ok(Walk::Clean(results));
            }

            let state = dispatcher.current_state().to_string();
            let outgoing: Vec<_> = self
                .fsm
                .transitions_from(&state)
                .iter()
                .filter(|t| !t.ops.is_empty())
                .collect();
            if outgoing.is_empty() {
                warn!(state = %state, "dead end");
                stats.dead_ends += 1;
                return Ok(Walk::Clean(results));
            }

            let transition = outgoing[rng.gen_range(0..outgoing.len())];
            let op_name = &transition.ops[rng.gen_range(0..transition.ops.len())];
            let params = dispatcher
                .operation(op_name)
                .ok_or_else(|| EngineError::UnknownOperation {
                    op: op_name.clone(),
                })?
                .params
                .clone();

            let mut args = Vec::with_capacity(params.len());
            for kind in params {
                args.push(oracle.generate(kind, rng)?);
            }

            let step = Step::new(state, transition.to.clone(), op_name.clone(), args);
            let result = dispatcher.step(&step, &mut model)?;
            match result.status {
                StepStatus::PreFail => {
                    stats.pre_discards += 1;
                    discards += 1;
                    if discards >= self.config.max_discards {
                        warn!(op = %step.op, "walk stalled on preconditions");
                        stats.dead_ends += 1;
                        return Ok(Walk::Clean(results));
                    }
                }
                StepStatus::PostFail => {
                    stats.steps_emitted += 1;
                    results.push(result);
                    return Ok(Walk::Failed(results));
                }
                StepStatus::Passed => {
                    discards = 0;
                    stats.steps_emitted += 1;
                    results.push(result);
                }
                StepStatus::Invalid => {
                    // generated steps are legal by construction
                    warn!(op = %step.op, "generated step rejected as invalid");
                    stats.dead_ends += 1;
                    return Ok(Walk::Clean(results));
                }
            }
        }
    }

    /// Replay steps against a fresh model instance
    pub fn replay(&self, steps: &[Step]) -> EngineResult<Replay> {
        replay_steps::<M>(&self.fsm, steps)
    }

    /// Reduce a failing trace to a 1-minimal failing trace
    pub fn minimize(&self, trace: &Trace) -> EngineResult<Minimized> {
        let steps = trace.steps();
        let (minimized, stats) = ddmin(
            &steps,
            |candidate| Ok(self.replay(candidate)?.verdict()),
            &self.minimize_config,
        )?;
        let replayed = self.replay(&minimized)?;
        Ok(Minimized {
            trace: replayed.into_trace(),
            stats,
        })
    }
}

/// Outcome of a single walk
enum Walk {
    Failed(Vec<StepResult>),
    Clean(Vec<StepResult>),
}
