//! What a doubled operation does when it is invoked.
//!
//! A [`Behavior`] is declarative: it is stored in a double's dispatch table and
//! interpreted by the double on every call. The result of a call is a
//! [`Reply`], which the conforming implementation turns into whatever its
//! trait method returns.

use crate::errors::{DoubleError, Fault};
use crate::types::Callback;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A real implementation of an operation.
pub type Original<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

/// A delegate installed with `calls_fake`.
pub type FakeFn<A, R> = Arc<dyn Fn(A) -> Result<R, Fault> + Send + Sync>;

type PrepareYield<A> = Arc<dyn Fn(&A) -> Option<Box<dyn FnOnce() + Send>> + Send + Sync>;

/// When a yielding double invokes its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldMode {
    /// Before the double returns.
    Immediate,
    /// On a task spawned onto the current tokio runtime.
    Spawned,
}

/// Invokes the designated callback argument with fixed values.
pub struct YieldSpec<A> {
    prepare: PrepareYield<A>,
    mode: YieldMode,
}

impl<A: 'static> YieldSpec<A> {
    /// Builds a yield from a callback accessor and the values to pass it.
    ///
    /// `callback_at` names the parameter that carries the callback; returning
    /// `None` means the call did not supply one.
    pub fn new<Y, F>(callback_at: F, values: Y, mode: YieldMode) -> Self
    where
        F: Fn(&A) -> Option<Callback<Y>> + Send + Sync + 'static,
        Y: Clone + Send + Sync + 'static,
    {
        let prepare: PrepareYield<A> = Arc::new(move |args: &A| {
            callback_at(args).map(|callback| {
                let values = values.clone();
                Box::new(move || callback.invoke(values)) as Box<dyn FnOnce() + Send>
            })
        });
        Self { prepare, mode }
    }
}

impl<A> YieldSpec<A> {
    pub fn mode(&self) -> YieldMode {
        self.mode
    }

    /// Locates the callback in `args` and binds it to the configured values.
    pub(crate) fn prepare(&self, args: &A) -> Option<Box<dyn FnOnce() + Send>> {
        (self.prepare)(args)
    }
}

impl<A> Clone for YieldSpec<A> {
    fn clone(&self) -> Self {
        Self {
            prepare: Arc::clone(&self.prepare),
            mode: self.mode,
        }
    }
}

/// Declarative description of a doubled operation's behavior.
pub enum Behavior<A, R> {
    /// Return a fixed value.
    Returns(R),
    /// Fail synchronously with the fault.
    Throws(Fault),
    /// Return a deferred result that settles to the value.
    Resolves(R),
    /// Return a deferred result that settles to the fault.
    Rejects(Fault),
    /// Delegate to a function.
    CallsFake(FakeFn<A, R>),
    /// Return the receiver so calls can be chained.
    ReturnsThis,
    /// Invoke a callback argument.
    Yields(YieldSpec<A>),
    /// Run the original implementation. Without one, the call produces no value.
    CallsThrough,
}

impl<A, R> Behavior<A, R> {
    pub fn returns(value: R) -> Self {
        Behavior::Returns(value)
    }

    pub fn throws(fault: Fault) -> Self {
        Behavior::Throws(fault)
    }

    /// Throws a plain `Error` with no message.
    pub fn throws_default() -> Self {
        Behavior::Throws(Fault::default())
    }

    pub fn resolves(value: R) -> Self {
        Behavior::Resolves(value)
    }

    pub fn rejects(fault: Fault) -> Self {
        Behavior::Rejects(fault)
    }

    /// Rejects with a plain `Error` with no message.
    pub fn rejects_default() -> Self {
        Behavior::Rejects(Fault::default())
    }

    /// Delegates to an infallible function.
    pub fn calls_fake<F>(fake: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        A: 'static,
        R: 'static,
    {
        Behavior::CallsFake(Arc::new(move |args| Ok(fake(args))))
    }

    /// Delegates to a function that may fail.
    pub fn calls_fake_fallible<F>(fake: F) -> Self
    where
        F: Fn(A) -> Result<R, Fault> + Send + Sync + 'static,
    {
        Behavior::CallsFake(Arc::new(fake))
    }

    pub fn returns_this() -> Self {
        Behavior::ReturnsThis
    }

    /// Invokes the callback found by `callback_at` with `values` before returning.
    pub fn yields<Y, F>(callback_at: F, values: Y) -> Self
    where
        F: Fn(&A) -> Option<Callback<Y>> + Send + Sync + 'static,
        Y: Clone + Send + Sync + 'static,
        A: 'static,
    {
        Behavior::Yields(YieldSpec::new(callback_at, values, YieldMode::Immediate))
    }

    /// Invokes the callback found by `callback_at` on a spawned task.
    pub fn yields_async<Y, F>(callback_at: F, values: Y) -> Self
    where
        F: Fn(&A) -> Option<Callback<Y>> + Send + Sync + 'static,
        Y: Clone + Send + Sync + 'static,
        A: 'static,
    {
        Behavior::Yields(YieldSpec::new(callback_at, values, YieldMode::Spawned))
    }

    pub fn calls_through() -> Self {
        Behavior::CallsThrough
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Behavior::Returns(_) => "returns",
            Behavior::Throws(_) => "throws",
            Behavior::Resolves(_) => "resolves",
            Behavior::Rejects(_) => "rejects",
            Behavior::CallsFake(_) => "calls_fake",
            Behavior::ReturnsThis => "returns_this",
            Behavior::Yields(_) => "yields",
            Behavior::CallsThrough => "calls_through",
        }
    }
}

impl<A, R: Clone> Clone for Behavior<A, R> {
    fn clone(&self) -> Self {
        match self {
            Behavior::Returns(value) => Behavior::Returns(value.clone()),
            Behavior::Throws(fault) => Behavior::Throws(fault.clone()),
            Behavior::Resolves(value) => Behavior::Resolves(value.clone()),
            Behavior::Rejects(fault) => Behavior::Rejects(fault.clone()),
            Behavior::CallsFake(fake) => Behavior::CallsFake(Arc::clone(fake)),
            Behavior::ReturnsThis => Behavior::ReturnsThis,
            Behavior::Yields(spec) => Behavior::Yields(spec.clone()),
            Behavior::CallsThrough => Behavior::CallsThrough,
        }
    }
}

impl<A, R: fmt::Debug> fmt::Debug for Behavior<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Returns(value) => f.debug_tuple("Returns").field(value).finish(),
            Behavior::Throws(fault) => f.debug_tuple("Throws").field(fault).finish(),
            Behavior::Resolves(value) => f.debug_tuple("Resolves").field(value).finish(),
            Behavior::Rejects(fault) => f.debug_tuple("Rejects").field(fault).finish(),
            Behavior::Yields(spec) => f.debug_tuple("Yields").field(&spec.mode).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// A result that settles asynchronously.
///
/// Returned immediately by `resolves`/`rejects` doubles; the outcome is only
/// observable once the caller awaits it.
pub struct Deferred<R> {
    inner: BoxFuture<'static, Result<R, DoubleError>>,
}

impl<R: Send + 'static> Deferred<R> {
    /// A deferred that settles to `value`.
    pub fn resolved(value: R, yield_first: bool) -> Self {
        Self::settling(Ok(value), yield_first)
    }

    /// A deferred that settles to a rejection carrying `fault`.
    pub fn rejected(fault: Fault, yield_first: bool) -> Self {
        Self::settling(Err(DoubleError::Rejected(fault)), yield_first)
    }

    fn settling(result: Result<R, DoubleError>, yield_first: bool) -> Self {
        let inner = Box::pin(async move {
            if yield_first {
                tokio::task::yield_now().await;
            }
            result
        });
        Self { inner }
    }
}

impl<R> Future for Deferred<R> {
    type Output = Result<R, DoubleError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

impl<R> fmt::Debug for Deferred<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// What a double hands back to its caller.
#[derive(Debug)]
pub enum Reply<R> {
    /// A value, returned synchronously.
    Value(R),
    /// The caller should return its own receiver.
    Receiver,
    /// Nothing was configured for this call.
    NoValue,
    /// A result that settles once awaited.
    Deferred(Deferred<R>),
}

impl<R> Reply<R> {
    /// The synchronous value, if any.
    pub fn into_value(self) -> Option<R> {
        match self {
            Reply::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The synchronous value, or `fallback` for every other reply.
    pub fn value_or(self, fallback: R) -> R {
        self.into_value().unwrap_or(fallback)
    }

    pub fn is_receiver(&self) -> bool {
        matches!(self, Reply::Receiver)
    }

    pub fn is_no_value(&self) -> bool {
        matches!(self, Reply::NoValue)
    }

    /// Awaits a deferred reply. Synchronous values settle immediately;
    /// receivers and missing values settle to `None`.
    pub async fn settle(self) -> Result<Option<R>, DoubleError> {
        match self {
            Reply::Value(value) => Ok(Some(value)),
            Reply::Receiver | Reply::NoValue => Ok(None),
            Reply::Deferred(deferred) => deferred.await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn resolved_deferred_settles_to_value() {
        let deferred = Deferred::resolved(true, true);
        assert!(deferred.await.unwrap());
    }

    #[tokio::test]
    async fn rejected_deferred_settles_to_fault() {
        let deferred: Deferred<bool> = Deferred::rejected(Fault::default(), true);
        match deferred.await {
            Err(DoubleError::Rejected(fault)) => assert_eq!(fault.name, "Error"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn settle_handles_every_reply() {
        assert_eq!(Reply::Value(3).settle().await.unwrap(), Some(3));
        assert_eq!(Reply::<u8>::NoValue.settle().await.unwrap(), None);
        assert_eq!(Reply::<u8>::Receiver.settle().await.unwrap(), None);
        let deferred = Reply::Deferred(Deferred::resolved(7u8, false));
        assert_eq!(deferred.settle().await.unwrap(), Some(7));
    }

    #[test]
    fn yield_spec_binds_callback_to_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback = Callback::new(move |v: (&'static str, u8)| sink.lock().unwrap().push(v));

        type Args = (String, Option<Callback<(&'static str, u8)>>);
        let spec: YieldSpec<Args> =
            YieldSpec::new(|args: &Args| args.1.clone(), ("a", 1), YieldMode::Immediate);

        assert!(spec.prepare(&("url".to_string(), None)).is_none());
        let thunk = spec.prepare(&("url".to_string(), Some(callback))).unwrap();
        assert!(seen.lock().unwrap().is_empty());
        thunk();
        assert_eq!(*seen.lock().unwrap(), vec![("a", 1)]);
    }

    #[test]
    fn behaviors_report_their_kind() {
        let behavior: Behavior<(), u8> = Behavior::calls_fake(|_| 1);
        assert_eq!(behavior.kind(), "calls_fake");
        assert_eq!(format!("{:?}", Behavior::<(), u8>::returns(2)), "Returns(2)");
        assert_eq!(format!("{:?}", Behavior::<(), u8>::returns_this()), "returns_this");
    }
}
