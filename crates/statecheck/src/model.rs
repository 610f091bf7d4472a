//! Model capability interface
//!
//! A model describes how the unit under test ought to behave. Instead of
//! discovering hooks reflectively by name, a model advertises an explicit
//! table of operations, each a record of up to four hooks:
//!
//! - `call` (mandatory) invokes the UUT and is the only hook whose
//!   panics the engine captures
//! - `pre` guards whether the operation is legal in the current model
//!   state; defaults to always-true
//! - `post` compares UUT output against the model's expectation; defaults
//!   to always-true
//! - `next` advances the model's shadow state; defaults to a no-op
//!
//! The `params` list declares the Call argument schema and drives
//! argument generation. A fresh model instance is created per run and per
//! replay; all state carried across steps lives inside it.

use crate::error::{EngineError, EngineResult};
use crate::value::{Value, ValueKind};
use rustc_hash::FxHashMap;

/// Precondition hook: may `op` run on this edge with these arguments?
pub type PreHook<M> = fn(&M, from: &str, to: &str, args: &[Value]) -> bool;

/// Call hook: invoke the UUT and return its results
pub type CallHook<M> = fn(&mut M, args: &[Value]) -> Vec<Value>;

/// Postcondition hook: does the UUT output match the model?
pub type PostHook<M> = fn(&M, from: &str, to: &str, args: &[Value], rets: &[Value]) -> bool;

/// Next hook: advance the model's shadow state
pub type NextHook<M> = fn(&mut M, from: &str, to: &str, args: &[Value], rets: &[Value]);

/// One named operation and its hooks
pub struct Operation<M> {
    /// Operation name as referenced by FSM transitions
    pub name: String,
    /// Declared Call parameter kinds; drives argument generation
    pub params: Vec<ValueKind>,
    /// Optional guard evaluated before `call`
    pub pre: Option<PreHook<M>>,
    /// The bridge to the UUT
    pub call: CallHook<M>,
    /// Optional check evaluated after a non-panicking `call`
    pub post: Option<PostHook<M>>,
    /// Optional model-state update after a passing `post`
    pub next: Option<NextHook<M>>,
}

impl<M> Operation<M> {
    /// Create an operation from its mandatory parts
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ValueKind>,
        call: CallHook<M>,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            pre: None,
            call,
            post: None,
            next: None,
        }
    }

    /// Attach a precondition
    #[must_use]
    pub fn with_pre(mut self, pre: PreHook<M>) -> Self {
        self.pre = Some(pre);
        self
    }

    /// Attach a postcondition
    #[must_use]
    pub fn with_post(mut self, post: PostHook<M>) -> Self {
        self.post = Some(post);
        self
    }

    /// Attach a model-state update
    #[must_use]
    pub fn with_next(mut self, next: NextHook<M>) -> Self {
        self.next = Some(next);
        self
    }
}

impl<M> Clone for Operation<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            params: self.params.clone(),
            pre: self.pre,
            call: self.call,
            post: self.post,
            next: self.next,
        }
    }
}

impl<M> std::fmt::Debug for Operation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .field("next", &self.next.is_some())
            .finish()
    }
}

/// A user model: fresh state per run plus an operation table
pub trait Model: Default {
    /// The model's capability table
    fn operations() -> Vec<Operation<Self>>
    where
        Self: Sized;
}

/// Operation table with by-name lookup
pub(crate) struct OpTable<M> {
    ops: Vec<Operation<M>>,
    index: FxHashMap<String, usize>,
}

impl<M> std::fmt::Debug for OpTable<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpTable")
            .field("ops", &self.ops.iter().map(|op| &op.name).collect::<Vec<_>>())
            .field("index", &self.index)
            .finish()
    }
}

impl<M: Model> OpTable<M> {
    /// Build the table from the model's capability list
    pub(crate) fn new() -> EngineResult<Self> {
        let ops = M::operations();
        let mut index = FxHashMap::default();
        for (i, op) in ops.iter().enumerate() {
            if index.insert(op.name.clone(), i).is_some() {
                return Err(EngineError::DuplicateOperation {
                    op: op.name.clone(),
                });
            }
        }
        Ok(Self { ops, index })
    }

    /// Resolve an operation by name
    pub(crate) fn get(&self, name: &str) -> Option<&Operation<M>> {
        self.index.get(name).map(|&i| &self.ops[i])
    }
}
