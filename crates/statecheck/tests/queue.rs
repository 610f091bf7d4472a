//! End-to-end tests against a buggy bounded queue
//!
//! The unit under test is a ring buffer whose `size` is computed as
//! `|w - r| % capacity`, which reports the wrong count once the write
//! cursor wraps. The model tracks a shadow FIFO and compares.

use statecheck::{
    ddmin, Engine, EngineConfig, Fsm, MinimizeConfig, Model, Operation, Step, StepStatus, Value,
    Verdict,
};

// ---------------------------------------------------------------------------
// Unit under test
// ---------------------------------------------------------------------------

/// Bounded FIFO ring buffer with a deliberately broken size computation
struct RingQueue {
    r: usize,
    w: usize,
    capacity: usize,
    elements: Vec<i64>,
}

impl RingQueue {
    fn new(capacity: usize) -> Self {
        Self {
            r: 0,
            w: 0,
            capacity,
            elements: vec![0; capacity],
        }
    }

    fn add(&mut self, v: i64) {
        self.elements[self.w] = v;
        self.w = (self.w + 1) % self.capacity;
    }

    fn get(&mut self) -> i64 {
        let v = self.elements[self.r];
        self.r = (self.r + 1) % self.capacity;
        v
    }

    fn size(&self) -> usize {
        // broken: forgets how often the cursors wrapped
        (self.w as i64 - self.r as i64).unsigned_abs() as usize % self.capacity
    }
}

/// Ring buffer with a correct element count
struct CountingQueue {
    inner: RingQueue,
    count: usize,
}

impl CountingQueue {
    fn new(capacity: usize) -> Self {
        Self {
            inner: RingQueue::new(capacity),
            count: 0,
        }
    }

    fn add(&mut self, v: i64) {
        self.inner.add(v);
        self.count += 1;
    }

    fn get(&mut self) -> i64 {
        self.count -= 1;
        self.inner.get()
    }

    fn size(&self) -> usize {
        self.count
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Model of the buggy queue: a shadow FIFO plus the UUT
#[derive(Default)]
struct QueueModel {
    capacity: usize,
    elements: Vec<i64>,
    queue: Option<RingQueue>,
}

fn q_init_call(m: &mut QueueModel, args: &[Value]) -> Vec<Value> {
    // keep capacities small so random walks wrap quickly
    m.capacity = (args[0].as_u8().unwrap() as usize % 4).max(1);
    m.elements.clear();
    m.queue = Some(RingQueue::new(m.capacity));
    Vec::new()
}

fn q_add_pre(m: &QueueModel, _f: &str, _t: &str, _a: &[Value]) -> bool {
    // room for one more
    m.elements.len() < m.capacity
}

fn q_add_call(m: &mut QueueModel, args: &[Value]) -> Vec<Value> {
    m.queue.as_mut().unwrap().add(args[0].as_int().unwrap());
    Vec::new()
}

fn q_add_next(m: &mut QueueModel, _f: &str, _t: &str, args: &[Value], _r: &[Value]) {
    m.elements.push(args[0].as_int().unwrap());
}

fn q_get_pre(m: &QueueModel, _f: &str, _t: &str, _a: &[Value]) -> bool {
    !m.elements.is_empty()
}

fn q_get_call(m: &mut QueueModel, _args: &[Value]) -> Vec<Value> {
    vec![Value::Int(m.queue.as_mut().unwrap().get())]
}

fn q_get_post(m: &QueueModel, _f: &str, _t: &str, _a: &[Value], rets: &[Value]) -> bool {
    // FIFO head
    rets[0].as_int() == Some(m.elements[0])
}

fn q_get_next(m: &mut QueueModel, _f: &str, _t: &str, _a: &[Value], _r: &[Value]) {
    m.elements.remove(0);
}

fn q_size_call(m: &mut QueueModel, _args: &[Value]) -> Vec<Value> {
    vec![Value::Int(m.queue.as_ref().unwrap().size() as i64)]
}

fn q_size_post(m: &QueueModel, _f: &str, _t: &str, _a: &[Value], rets: &[Value]) -> bool {
    rets[0].as_int() == Some(m.elements.len() as i64)
}

impl Model for QueueModel {
    fn operations() -> Vec<Operation<Self>> {
        vec![
            Operation::new("Init", [statecheck::ValueKind::U8], q_init_call),
            Operation::new("Add", [statecheck::ValueKind::Int], q_add_call)
                .with_pre(q_add_pre)
                .with_next(q_add_next),
            Operation::new("Get", [], q_get_call)
                .with_pre(q_get_pre)
                .with_post(q_get_post)
                .with_next(q_get_next),
            Operation::new("Size", [], q_size_call).with_post(q_size_post),
        ]
    }
}

/// Same shape over the corrected queue
#[derive(Default)]
struct FixedQueueModel {
    capacity: usize,
    elements: Vec<i64>,
    queue: Option<CountingQueue>,
}

fn f_init_call(m: &mut FixedQueueModel, args: &[Value]) -> Vec<Value> {
    m.capacity = (args[0].as_u8().unwrap() as usize % 4).max(1);
    m.elements.clear();
    m.queue = Some(CountingQueue::new(m.capacity));
    Vec::new()
}

fn f_add_pre(m: &FixedQueueModel, _f: &str, _t: &str, _a: &[Value]) -> bool {
    m.elements.len() < m.capacity
}

fn f_add_call(m: &mut FixedQueueModel, args: &[Value]) -> Vec<Value> {
    m.queue.as_mut().unwrap().add(args[0].as_int().unwrap());
    Vec::new()
}

fn f_add_next(m: &mut FixedQueueModel, _f: &str, _t: &str, args: &[Value], _r: &[Value]) {
    m.elements.push(args[0].as_int().unwrap());
}

fn f_get_pre(m: &FixedQueueModel, _f: &str, _t: &str, _a: &[Value]) -> bool {
    !m.elements.is_empty()
}

fn f_get_call(m: &mut FixedQueueModel, _args: &[Value]) -> Vec<Value> {
    vec![Value::Int(m.queue.as_mut().unwrap().get())]
}

fn f_get_post(m: &FixedQueueModel, _f: &str, _t: &str, _a: &[Value], rets: &[Value]) -> bool {
    rets[0].as_int() == Some(m.elements[0])
}

fn f_get_next(m: &mut FixedQueueModel, _f: &str, _t: &str, _a: &[Value], _r: &[Value]) {
    m.elements.remove(0);
}

fn f_size_call(m: &mut FixedQueueModel, _args: &[Value]) -> Vec<Value> {
    vec![Value::Int(m.queue.as_ref().unwrap().size() as i64)]
}

fn f_size_post(m: &FixedQueueModel, _f: &str, _t: &str, _a: &[Value], rets: &[Value]) -> bool {
    rets[0].as_int() == Some(m.elements.len() as i64)
}

impl Model for FixedQueueModel {
    fn operations() -> Vec<Operation<Self>> {
        vec![
            Operation::new("Init", [statecheck::ValueKind::U8], f_init_call),
            Operation::new("Add", [statecheck::ValueKind::Int], f_add_call)
                .with_pre(f_add_pre)
                .with_next(f_add_next),
            Operation::new("Get", [], f_get_call)
                .with_pre(f_get_pre)
                .with_post(f_get_post)
                .with_next(f_get_next),
            Operation::new("Size", [], f_size_call).with_post(f_size_post),
        ]
    }
}

/// Minimal model over a zero-capacity queue whose calls panic; exercises
/// panic containment end to end
#[derive(Default)]
struct ZeroCapModel {
    queue: Option<RingQueue>,
}

fn z_init_call(m: &mut ZeroCapModel, args: &[Value]) -> Vec<Value> {
    // capacity used verbatim, zero included
    m.queue = Some(RingQueue::new(args[0].as_u8().unwrap() as usize));
    Vec::new()
}

fn z_add_call(m: &mut ZeroCapModel, args: &[Value]) -> Vec<Value> {
    m.queue.as_mut().unwrap().add(args[0].as_int().unwrap());
    Vec::new()
}

impl Model for ZeroCapModel {
    fn operations() -> Vec<Operation<Self>> {
        vec![
            Operation::new("Init", [statecheck::ValueKind::U8], z_init_call),
            Operation::new("Add", [statecheck::ValueKind::Int], z_add_call),
        ]
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// The queue FSM: Init once, then Add/Get/Size in any order
fn queue_fsm() -> Fsm {
    Fsm::new()
        .with_transition("state0", "state1", ["Init"])
        .with_transition("state1", "state1", ["Add", "Get", "Size"])
}

fn init(capacity: u8) -> Step {
    Step::new("state0", "state1", "Init", vec![Value::U8(capacity)])
}

fn add(v: i64) -> Step {
    Step::new("state1", "state1", "Add", vec![Value::Int(v)])
}

fn get() -> Step {
    Step::new("state1", "state1", "Get", vec![])
}

fn size() -> Step {
    Step::new("state1", "state1", "Size", vec![])
}

fn ops(steps: &[Step]) -> Vec<&str> {
    steps.iter().map(|s| s.op.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn capacity_one_trace_minimizes_to_init_add_size() {
    let engine = Engine::<QueueModel>::new(queue_fsm(), EngineConfig::new().with_seed(0)).unwrap();

    // Size passes while the queue is empty and fails after the first Add:
    // the buggy size counts |w - r| % 1 = 0 against a shadow of one.
    let steps = vec![init(1), size(), add(5), size()];
    let replay = engine.replay(&steps).unwrap();
    assert!(replay.valid);
    assert!(replay.failed);
    assert_eq!(replay.results.last().unwrap().step.op, "Size");

    let minimized = engine.minimize(&replay.into_trace()).unwrap();
    assert!(minimized.trace.failed());
    assert_eq!(ops(&minimized.trace.steps()), vec!["Init", "Add", "Size"]);
    assert_eq!(minimized.stats.minimized_len, 3);
}

#[test]
fn capacity_two_wrap_sequence_is_already_one_minimal() {
    let engine = Engine::<QueueModel>::new(queue_fsm(), EngineConfig::new().with_seed(0)).unwrap();

    // After Add, Add, Get the write cursor has wrapped (w = 1 = r), so
    // the buggy size reports 0 while two elements are queued.
    let steps = vec![init(2), add(7), add(8), get(), add(9), size()];
    let replay = engine.replay(&steps).unwrap();
    assert!(replay.valid);
    assert!(replay.failed);
    let trace = replay.into_trace();

    let minimized = engine.minimize(&trace).unwrap();
    assert!(minimized.trace.failed());
    let min_ops = minimized.trace.steps();

    // every single-step removal either passes or breaks the FSM/preconditions,
    // so ddmin keeps the whole wrap sequence
    assert_eq!(min_ops, steps);

    // the failure needs an Add after the wrap-inducing Get, plus the
    // trailing Size
    assert_eq!(min_ops.last().unwrap().op, "Size");
    let first_get = min_ops.iter().position(|s| s.op == "Get").unwrap();
    assert!(min_ops[first_get..].iter().any(|s| s.op == "Add"));
}

#[test]
fn empty_failing_candidate_short_circuits() {
    // a replay function that already fails on the empty sequence
    let f = |d: &[Step]| {
        Ok(if d.is_empty() {
            Verdict::Fail
        } else {
            Verdict::Pass
        })
    };
    let (minimized, stats) =
        ddmin(&[init(1), add(1), size()], f, &MinimizeConfig::default()).unwrap();
    assert!(minimized.is_empty());
    assert_eq!(stats.replays, 1);
}

#[test]
fn correct_queue_does_not_fail() {
    let engine = Engine::<FixedQueueModel>::new(
        queue_fsm(),
        EngineConfig::new()
            .with_seed(1453987917)
            .with_max_steps(128)
            .with_attempts(8),
    )
    .unwrap();
    let outcome = engine.run().unwrap();
    assert!(!outcome.failed());

    // the literal wrap sequence that breaks the buggy queue passes here
    let steps = vec![init(2), add(7), add(8), get(), add(9), size()];
    let replay = engine.replay(&steps).unwrap();
    assert!(replay.valid);
    assert!(!replay.failed);
}

#[test]
fn dropping_init_makes_a_subsequence_unresolved() {
    let engine = Engine::<QueueModel>::new(queue_fsm(), EngineConfig::new().with_seed(0)).unwrap();

    let steps = vec![init(2), add(1), get(), add(2)];
    let full = engine.replay(&steps).unwrap();
    assert!(full.valid);
    assert!(!full.failed);
    assert_eq!(full.verdict(), Verdict::Pass);

    // without Init the first step starts from the wrong state
    let tail = engine.replay(&steps[1..]).unwrap();
    assert!(!tail.valid);
    assert_eq!(tail.verdict(), Verdict::Unresolved);
    assert_eq!(tail.results.last().unwrap().status, StepStatus::Invalid);

    // asking to minimize the passing sequence is misuse
    let err = engine.minimize(&full.into_trace()).unwrap_err();
    assert_eq!(
        err,
        statecheck::EngineError::MinimizeOnPassing { verdict: "pass" }
    );
}

#[test]
fn random_walks_find_the_size_bug() {
    let engine = Engine::<QueueModel>::new(
        queue_fsm(),
        EngineConfig::new()
            .with_seed(1453987917457171993)
            .with_max_steps(256)
            .with_attempts(16),
    )
    .unwrap();

    let outcome = engine.run().unwrap();
    assert!(outcome.failed());

    let trace = outcome.trace();
    assert!(trace.failed());
    // generation never records precondition failures
    for result in &trace.results {
        assert_ne!(result.status, StepStatus::PreFail);
    }
    assert_eq!(trace.results.last().unwrap().status, StepStatus::PostFail);

    // the failing trace replays to the same failure
    let replay = engine.replay(&trace.steps()).unwrap();
    assert!(replay.valid);
    assert!(replay.failed);
    assert_eq!(replay.results, trace.results);

    // and shrinks to a failing trace that still ends with the bad op
    let minimized = engine.minimize(trace).unwrap();
    assert!(minimized.trace.failed());
    assert!(minimized.trace.len() <= trace.len());
    assert_eq!(minimized.trace.steps().first().unwrap().op, "Init");
}

#[test]
fn panicking_call_is_contained_and_fails_the_step() {
    let fsm = Fsm::new()
        .with_transition("state0", "state1", ["Init"])
        .with_transition("state1", "state1", ["Add"]);
    let engine = Engine::<ZeroCapModel>::new(fsm, EngineConfig::new().with_seed(0)).unwrap();

    // capacity 0 makes the ring's modulo arithmetic panic inside Add
    let steps = vec![init(0), add(1)];
    let replay = engine.replay(&steps).unwrap();
    assert!(replay.valid);
    assert!(replay.failed);
    let last = replay.results.last().unwrap();
    assert_eq!(last.status, StepStatus::PostFail);
    assert!(last.rets.is_empty());
}

#[test]
fn traces_serialize_by_value() {
    let engine = Engine::<QueueModel>::new(queue_fsm(), EngineConfig::new().with_seed(0)).unwrap();
    let steps = vec![init(1), add(5), size()];
    let trace = engine.replay(&steps).unwrap().into_trace();
    assert!(trace.failed());

    let json = serde_json::to_string(&trace).unwrap();
    let back: statecheck::Trace = serde_json::from_str(&json).unwrap();
    assert_eq!(back, trace);
}

#[test]
fn trace_rendering_shows_calls_and_returns() {
    let engine = Engine::<QueueModel>::new(queue_fsm(), EngineConfig::new().with_seed(0)).unwrap();
    let trace = engine
        .replay(&[init(1), add(5), size()])
        .unwrap()
        .into_trace();

    let rendered = trace.to_string();
    assert!(rendered.contains("Init(1)"));
    assert!(rendered.contains("Add(5)"));
    assert!(rendered.contains("Size() = (0)  [postcondition failed]"));
}
