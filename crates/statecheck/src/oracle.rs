//! Argument oracle
//!
//! The runner does not know how to produce values itself; it asks an
//! oracle for one value per parameter an operation declares. Oracles must
//! draw exclusively from the engine-supplied RNG so that a single 64-bit
//! seed fully determines a generated trace.

use crate::error::{EngineError, EngineResult};
use crate::value::{Value, ValueKind};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::Rng;

/// Source of randomly generated operation arguments
///
/// Implementations must be total over every kind the model's operations
/// declare; returning an error is fatal to the run.
pub trait ValueOracle {
    /// Produce one value of the requested kind from `rng`
    fn generate(&mut self, kind: ValueKind, rng: &mut StdRng) -> EngineResult<Value>;
}

/// Default oracle covering all built-in value kinds
///
/// Strings are short alphanumeric tokens and byte arrays are short
/// buffers; arguments are meant to exercise the model, not to be
/// adversarial inputs in their own right.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOracle;

/// Longest string the default oracle generates
const MAX_STR_LEN: usize = 8;
/// Longest byte buffer the default oracle generates
const MAX_BYTES_LEN: usize = 16;

impl ValueOracle for DefaultOracle {
    fn generate(&mut self, kind: ValueKind, rng: &mut StdRng) -> EngineResult<Value> {
        let value = match kind {
            ValueKind::Int => Value::Int(rng.gen()),
            ValueKind::U8 => Value::U8(rng.gen()),
            ValueKind::Bool => Value::Bool(rng.gen()),
            ValueKind::Str => {
                let len = rng.gen_range(0..=MAX_STR_LEN);
                let mut s = String::with_capacity(len);
                for _ in 0..len {
                    s.push(char::from(rng.sample(Alphanumeric)));
                }
                Value::Str(s)
            }
            ValueKind::Bytes => {
                let len = rng.gen_range(0..=MAX_BYTES_LEN);
                let mut buf = vec![0u8; len];
                rng.fill(&mut buf[..]);
                Value::Bytes(buf)
            }
        };
        Ok(value)
    }
}

/// Oracle that refuses every request
///
/// Useful for exercising the fatal-error path when a model declares a
/// kind the test author has not wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefusingOracle;

impl ValueOracle for RefusingOracle {
    fn generate(&mut self, kind: ValueKind, _rng: &mut StdRng) -> EngineResult<Value> {
        Err(EngineError::CannotGenerate { kind })
    }
}
