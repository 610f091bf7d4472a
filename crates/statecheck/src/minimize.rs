//! Delta-debugging trace minimization
//!
//! Implements the ddmin algorithm (Simplifying and Isolating
//! Failure-Inducing Input, Andreas Zeller, 2002): repeatedly partition
//! the failing sequence into contiguous chunks and try each chunk and
//! each chunk's complement, keeping the first candidate that still
//! fails. The result is 1-minimal: at the final granularity no single
//! chunk can be removed without losing the failure.
//!
//! Candidate evaluation is delegated to a replay function so the
//! algorithm never touches the model directly.

use crate::error::{EngineError, EngineResult};
use crate::trace::Step;
use std::fmt;
use tracing::{debug, warn};

/// Three-valued outcome of replaying a candidate subsequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate replayed cleanly
    Pass,
    /// The candidate reproduced the expected failure
    Fail,
    /// The candidate violated FSM or precondition structure; its outcome
    /// is meaningless
    Unresolved,
}

impl Verdict {
    /// Lowercase name, for diagnostics
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for minimization
#[derive(Debug, Clone)]
pub struct MinimizeConfig {
    /// Replay budget; when exhausted the best reduction so far is
    /// returned
    pub max_replays: usize,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self { max_replays: 10_000 }
    }
}

impl MinimizeConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replay budget
    #[must_use]
    pub fn with_max_replays(mut self, max: usize) -> Self {
        self.max_replays = max;
        self
    }
}

/// Counters from a minimization
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizeStats {
    /// Replay function invocations, preflight checks included
    pub replays: usize,
    /// Input length
    pub original_len: usize,
    /// Output length
    pub minimized_len: usize,
}

impl MinimizeStats {
    /// One-line summary of the reduction
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "minimized {} -> {} steps in {} replays",
            self.original_len, self.minimized_len, self.replays
        )
    }
}

/// Reduce `steps` to a 1-minimal failing subsequence
///
/// `f` replays a candidate and reports its verdict. The empty sequence
/// is probed first: if it already fails it is trivially minimal and `f`
/// is not consulted again. The full input must fail; anything else is
/// caller misuse and reported as a fatal error. `Pass` and `Unresolved`
/// are equally non-advancing.
pub fn ddmin<F>(
    steps: &[Step],
    mut f: F,
    config: &MinimizeConfig,
) -> EngineResult<(Vec<Step>, MinimizeStats)>
where
    F: FnMut(&[Step]) -> EngineResult<Verdict>,
{
    let mut stats = MinimizeStats {
        original_len: steps.len(),
        ..MinimizeStats::default()
    };

    stats.replays += 1;
    if f(&[])? == Verdict::Fail {
        return Ok((Vec::new(), stats));
    }

    stats.replays += 1;
    let full = f(steps)?;
    if full != Verdict::Fail {
        return Err(EngineError::MinimizeOnPassing {
            verdict: full.name(),
        });
    }

    let mut data = steps.to_vec();
    let mut granularity = 2;

    'outer: while data.len() >= 2 {
        granularity = granularity.min(data.len());
        let chunks = make_chunks(&data, granularity);

        // Reduce to a subset
        for chunk in &chunks {
            if stats.replays >= config.max_replays {
                warn!(replays = stats.replays, "replay budget exhausted");
                break 'outer;
            }
            stats.replays += 1;
            if f(chunk)? == Verdict::Fail {
                debug!(len = chunk.len(), "reduced to subset");
                data = chunk.clone();
                granularity = 2;
                continue 'outer;
            }
        }

        // Reduce to a complement
        for i in 0..chunks.len() {
            if stats.replays >= config.max_replays {
                warn!(replays = stats.replays, "replay budget exhausted");
                break 'outer;
            }
            let complement = make_complement(&chunks, i);
            stats.replays += 1;
            if f(&complement)? == Verdict::Fail {
                debug!(len = complement.len(), "reduced to complement");
                data = complement;
                granularity = (granularity - 1).max(2);
                continue 'outer;
            }
        }

        if granularity == data.len() {
            // 1-minimal
            break;
        }
        granularity = (granularity * 2).min(data.len());
    }

    stats.minimized_len = data.len();
    Ok((data, stats))
}

/// Partition `data` into `granularity` contiguous chunks; the division
/// remainder goes to the last chunk
fn make_chunks(data: &[Step], granularity: usize) -> Vec<Vec<Step>> {
    let size = data.len() / granularity;
    let mut chunks = Vec::with_capacity(granularity);
    let mut rest = data;
    for _ in 0..granularity - 1 {
        let (head, tail) = rest.split_at(size);
        chunks.push(head.to_vec());
        rest = tail;
    }
    chunks.push(rest.to_vec());
    chunks
}

/// Concatenate every chunk except the `n`-th
fn make_complement(chunks: &[Vec<Step>], n: usize) -> Vec<Step> {
    chunks
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != n)
        .flat_map(|(_, c)| c.iter().cloned())
        .collect()
}
