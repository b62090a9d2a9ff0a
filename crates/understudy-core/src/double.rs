//! The test double: a configurable dispatcher with a call log.
//!
//! A [`Double`] is cheap to clone; clones share configuration and history.
//! Configuration methods take `&self` and return `&Self` so they chain:
//!
//! ```
//! use understudy_core::{Behavior, Double, Fault};
//!
//! let stub: Double<i32, i32> = Double::new("lookup");
//! stub.with_args(42, Behavior::returns(1))
//!     .with_args(1, Behavior::throws(Fault::new("name")));
//!
//! assert!(stub.call(7).unwrap().is_no_value());
//! assert_eq!(stub.call(42).unwrap().into_value(), Some(1));
//! assert!(stub.call(1).is_err());
//! assert_eq!(stub.call_count_with(&42), 1);
//! ```

use crate::behavior::{Behavior, Deferred, Original, Reply, YieldMode};
use crate::call_log::{CallLog, CallRecord, DispatchPath, Outcome, Settlement};
use crate::dispatch::DispatchTable;
use crate::errors::{DoubleError, Fault};
use crate::types::Callback;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

struct DoubleState<A, R> {
    table: DispatchTable<A, R>,
    log: CallLog<A, R>,
    original: Option<Original<A, R>>,
    yield_before_settle: bool,
}

/// A spy, stub or fake.
pub struct Double<A, R> {
    name: Arc<str>,
    state: Arc<Mutex<DoubleState<A, R>>>,
}

impl<A, R> Clone for Double<A, R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A, R> std::fmt::Debug for Double<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Double").field("name", &self.name).finish_non_exhaustive()
    }
}

impl<A, R> Double<A, R>
where
    A: Clone + PartialEq + Send + 'static,
    R: Clone + Send + 'static,
{
    /// Creates an unconfigured double. Calls produce no value until a
    /// behavior is configured.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(DoubleState {
                table: DispatchTable::default(),
                log: CallLog::new(),
                original: None,
                yield_before_settle: true,
            })),
        }
    }

    /// Creates a spy around `original`: calls run it and are recorded.
    pub fn spy_on<F>(name: impl Into<String>, original: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let double = Self::new(name);
        {
            let mut state = double.lock();
            state.original = Some(Arc::new(original));
            state.table.default = Some(Behavior::CallsThrough);
        }
        double
    }

    /// Creates a double with a fixed default behavior.
    pub fn with_behavior(name: impl Into<String>, behavior: Behavior<A, R>) -> Self {
        let double = Self::new(name);
        double.behaves(behavior);
        double
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, DoubleState<A, R>> {
        // Recorded history stays usable after a panicking fake.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Configuration ---

    /// Sets the default behavior.
    pub fn behaves(&self, behavior: Behavior<A, R>) -> &Self {
        self.lock().table.default = Some(behavior);
        self
    }

    pub fn returns(&self, value: R) -> &Self {
        self.behaves(Behavior::returns(value))
    }

    pub fn throws(&self, fault: Fault) -> &Self {
        self.behaves(Behavior::throws(fault))
    }

    pub fn throws_default(&self) -> &Self {
        self.behaves(Behavior::throws_default())
    }

    pub fn resolves(&self, value: R) -> &Self {
        self.behaves(Behavior::resolves(value))
    }

    pub fn rejects(&self, fault: Fault) -> &Self {
        self.behaves(Behavior::rejects(fault))
    }

    pub fn rejects_default(&self) -> &Self {
        self.behaves(Behavior::rejects_default())
    }

    pub fn calls_fake<F>(&self, fake: F) -> &Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.behaves(Behavior::calls_fake(fake))
    }

    pub fn calls_fake_fallible<F>(&self, fake: F) -> &Self
    where
        F: Fn(A) -> Result<R, Fault> + Send + Sync + 'static,
    {
        self.behaves(Behavior::calls_fake_fallible(fake))
    }

    pub fn returns_this(&self) -> &Self {
        self.behaves(Behavior::returns_this())
    }

    pub fn yields<Y, F>(&self, callback_at: F, values: Y) -> &Self
    where
        F: Fn(&A) -> Option<Callback<Y>> + Send + Sync + 'static,
        Y: Clone + Send + Sync + 'static,
    {
        self.behaves(Behavior::yields(callback_at, values))
    }

    pub fn yields_async<Y, F>(&self, callback_at: F, values: Y) -> &Self
    where
        F: Fn(&A) -> Option<Callback<Y>> + Send + Sync + 'static,
        Y: Clone + Send + Sync + 'static,
    {
        self.behaves(Behavior::yields_async(callback_at, values))
    }

    pub fn calls_through(&self) -> &Self {
        self.behaves(Behavior::calls_through())
    }

    /// Answers calls whose arguments equal `args` with `behavior`.
    pub fn with_args(&self, args: A, behavior: Behavior<A, R>) -> &Self {
        self.lock().table.conditions.insert_exact(args, behavior);
        self
    }

    /// Answers calls accepted by `test` with `behavior`. Exact entries
    /// registered with [`with_args`](Self::with_args) are consulted first.
    pub fn with_matcher<F>(
        &self,
        label: impl Into<String>,
        test: F,
        behavior: Behavior<A, R>,
    ) -> &Self
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.lock().table.conditions.insert_predicate(label, test, behavior);
        self
    }

    /// Answers the `index`-th call (0-based) with `behavior`.
    pub fn on_call(&self, index: usize, behavior: Behavior<A, R>) -> &Self {
        self.lock().table.on_call.insert(index, behavior);
        self
    }

    pub fn on_first_call(&self, behavior: Behavior<A, R>) -> &Self {
        self.on_call(0, behavior)
    }

    /// Forgets recorded calls; configuration is kept.
    pub fn reset_history(&self) {
        self.lock().log.clear();
    }

    /// Forgets configuration; recorded calls are kept.
    pub fn reset_behavior(&self) {
        self.lock().table.clear();
    }

    /// Forgets both configuration and history.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.table.clear();
        state.log.clear();
    }

    /// Gives a double installed on a seam access to the seam's implementation.
    pub(crate) fn attach(&self, original: Original<A, R>, yield_before_settle: bool) {
        let mut state = self.lock();
        if state.original.is_none() {
            state.original = Some(original);
        }
        state.yield_before_settle = yield_before_settle;
    }

    // --- Invocation ---

    /// Invokes the double.
    ///
    /// Every call is recorded, whichever path answers it. Configured throws
    /// come back as `Err`; configured rejections come back as a
    /// [`Reply::Deferred`] that fails when awaited.
    pub fn call(&self, args: A) -> Result<Reply<R>, DoubleError> {
        let (slot, path, behavior, original, yield_first) = {
            let mut state = self.lock();
            let call_index = state.log.call_count();
            let (path, behavior) = state.table.select(&args, call_index);
            let slot = state.log.begin(args.clone(), path);
            (slot, path, behavior, state.original.clone(), state.yield_before_settle)
        };

        trace!(
            double = %self.name,
            path = ?path,
            behavior = behavior.as_ref().map(|b| b.kind()).unwrap_or("none"),
            "Dispatching call"
        );

        let (outcome, result) = self.execute(behavior, args, original, yield_first);
        self.lock().log.finish(slot, outcome);
        result
    }

    fn execute(
        &self,
        behavior: Option<Behavior<A, R>>,
        args: A,
        original: Option<Original<A, R>>,
        yield_first: bool,
    ) -> (Outcome<R>, Result<Reply<R>, DoubleError>) {
        let behavior = match behavior {
            Some(behavior) => behavior,
            None => return (Outcome::NoValue, Ok(Reply::NoValue)),
        };

        match behavior {
            Behavior::Returns(value) => (Outcome::Returned(value.clone()), Ok(Reply::Value(value))),
            Behavior::Throws(fault) => {
                (Outcome::Threw(fault.clone()), Err(DoubleError::Thrown(fault)))
            }
            Behavior::Resolves(value) => (
                Outcome::Deferred(Settlement::Resolves(value.clone())),
                Ok(Reply::Deferred(Deferred::resolved(value, yield_first))),
            ),
            Behavior::Rejects(fault) => (
                Outcome::Deferred(Settlement::Rejects(fault.clone())),
                Ok(Reply::Deferred(Deferred::rejected(fault, yield_first))),
            ),
            Behavior::CallsFake(fake) => match fake(args) {
                Ok(value) => (Outcome::Returned(value.clone()), Ok(Reply::Value(value))),
                Err(fault) => (Outcome::Threw(fault.clone()), Err(DoubleError::Thrown(fault))),
            },
            Behavior::ReturnsThis => (Outcome::ReturnedReceiver, Ok(Reply::Receiver)),
            Behavior::Yields(spec) => {
                let Some(invoke) = spec.prepare(&args) else {
                    let fault = Fault::named(
                        "TypeError",
                        format!("{} expected to yield, but no callback was passed", self.name),
                    );
                    return (
                        Outcome::Threw(fault),
                        Err(DoubleError::CallbackMissing {
                            operation: self.name.to_string(),
                        }),
                    );
                };
                match spec.mode() {
                    YieldMode::Immediate => {
                        invoke();
                        (Outcome::NoValue, Ok(Reply::NoValue))
                    }
                    YieldMode::Spawned => match tokio::runtime::Handle::try_current() {
                        Ok(handle) => {
                            handle.spawn(async move { invoke() });
                            (Outcome::NoValue, Ok(Reply::NoValue))
                        }
                        Err(_) => {
                            let fault = Fault::named(
                                "Error",
                                format!("{} cannot yield without a runtime", self.name),
                            );
                            (
                                Outcome::Threw(fault),
                                Err(DoubleError::NoRuntime {
                                    operation: self.name.to_string(),
                                }),
                            )
                        }
                    },
                }
            }
            Behavior::CallsThrough => match original {
                Some(original) => {
                    let value = original(args);
                    (Outcome::Returned(value.clone()), Ok(Reply::Value(value)))
                }
                None => (Outcome::NoValue, Ok(Reply::NoValue)),
            },
        }
    }

    /// A callback that forwards to this double, for passing where a
    /// callback argument is expected.
    pub fn as_callback(&self) -> Callback<A> {
        let double = self.clone();
        Callback::new(move |args| {
            // The callback's caller has no way to observe the reply.
            let _ = double.call(args);
        })
    }

    // --- Call log queries ---

    /// A snapshot of the call log.
    pub fn log(&self) -> CallLog<A, R> {
        self.lock().log.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().log.call_count()
    }

    pub fn was_called(&self) -> bool {
        self.lock().log.was_called()
    }

    /// True if the double was called exactly once.
    pub fn was_called_once(&self) -> bool {
        self.lock().log.was_called_once()
    }

    pub fn call_at(&self, index: usize) -> Option<CallRecord<A, R>> {
        self.lock().log.call_at(index).cloned()
    }

    pub fn first_call(&self) -> Option<CallRecord<A, R>> {
        self.lock().log.first_call().cloned()
    }

    pub fn last_call(&self) -> Option<CallRecord<A, R>> {
        self.lock().log.last_call().cloned()
    }

    pub fn all_calls(&self) -> Vec<CallRecord<A, R>> {
        self.lock().log.all_calls().to_vec()
    }

    pub fn was_called_with(&self, args: &A) -> bool {
        self.lock().log.was_called_with(args)
    }

    pub fn call_count_with(&self, args: &A) -> usize {
        self.lock().log.call_count_with(args)
    }

    /// True iff the double was called exactly once, with exactly `args`.
    pub fn was_called_once_with_exactly(&self, args: &A) -> bool {
        self.lock().log.was_called_once_with_exactly(args)
    }

    /// True if this double's first call happened before `other`'s last call.
    /// A called double counts as earlier than one that was never called.
    pub fn was_called_before<B, S>(&self, other: &Double<B, S>) -> bool
    where
        B: Clone + PartialEq + Send + 'static,
        S: Clone + Send + 'static,
    {
        let Some(mine) = self.lock().log.first_sequence() else {
            return false;
        };
        match other.lock().log.last_sequence() {
            Some(theirs) => mine < theirs,
            None => true,
        }
    }

    /// True if this double's last call happened after `other`'s first call.
    pub fn was_called_after<B, S>(&self, other: &Double<B, S>) -> bool
    where
        B: Clone + PartialEq + Send + 'static,
        S: Clone + Send + 'static,
    {
        let Some(mine) = self.lock().log.last_sequence() else {
            return false;
        };
        match other.lock().log.first_sequence() {
            Some(theirs) => mine > theirs,
            None => true,
        }
    }

    /// Paths taken by each recorded call, in order.
    pub fn dispatch_paths(&self) -> Vec<DispatchPath> {
        self.lock().log.all_calls().iter().map(|r| r.path).collect()
    }
}
