//! Invocation history of a test double.
//!
//! The dispatcher is the only writer. A record's slot is reserved when a call
//! begins and its outcome is filled in when the call ends, so records stay in
//! invocation order even when a fake re-enters the same double.

use crate::errors::Fault;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Draws the next process-wide call sequence number.
pub(crate) fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::SeqCst)
}

/// Which part of the dispatch table answered a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPath {
    /// An argument-conditioned entry, by position in the condition table.
    Conditioned(usize),
    /// A per-call override for the given call index.
    OnCall(usize),
    /// The double's default behavior.
    Default,
    /// Nothing was configured; the call produced no value.
    Unconfigured,
}

/// How a deferred result was configured to settle.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<R> {
    /// Settles successfully with the value.
    Resolves(R),
    /// Settles with the fault.
    Rejects(Fault),
}

/// What a recorded call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    /// The call is still running.
    Pending,
    /// Returned a value synchronously.
    Returned(R),
    /// Returned the receiver for chaining.
    ReturnedReceiver,
    /// Returned nothing.
    NoValue,
    /// Raised synchronously.
    Threw(Fault),
    /// Returned a deferred result.
    Deferred(Settlement<R>),
}

impl<R> Outcome<R> {
    /// True when the call raised synchronously.
    pub fn threw(&self) -> bool {
        matches!(self, Outcome::Threw(_))
    }

    /// The returned value, if the call returned one synchronously.
    pub fn returned(&self) -> Option<&R> {
        match self {
            Outcome::Returned(value) => Some(value),
            _ => None,
        }
    }
}

/// A reserved position in a [`CallLog`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    index: usize,
    sequence: u64,
}

/// One invocation of a double.
#[derive(Debug, Clone)]
pub struct CallRecord<A, R> {
    /// Arguments the double received.
    pub args: A,
    /// Process-wide sequence number; orders calls across doubles.
    pub sequence: u64,
    /// Wall-clock time the call began.
    pub at: DateTime<Utc>,
    /// Which dispatch path answered.
    pub path: DispatchPath,
    /// What the call produced.
    pub outcome: Outcome<R>,
}

/// Append-only ledger of calls.
#[derive(Debug, Clone)]
pub struct CallLog<A, R> {
    records: Vec<CallRecord<A, R>>,
}

impl<A, R> Default for CallLog<A, R> {
    fn default() -> Self {
        Self { records: Vec::new() }
    }
}

impl<A, R> CallLog<A, R> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a record for a call that is starting.
    pub(crate) fn begin(&mut self, args: A, path: DispatchPath) -> Slot {
        let sequence = next_sequence();
        self.records.push(CallRecord {
            args,
            sequence,
            at: Utc::now(),
            path,
            outcome: Outcome::Pending,
        });
        Slot {
            index: self.records.len() - 1,
            sequence,
        }
    }

    /// Fills in the outcome of a reserved record.
    ///
    /// If the log was cleared while the call was running the slot no longer
    /// exists and the outcome is dropped along with the rest of the history.
    pub(crate) fn finish(&mut self, slot: Slot, outcome: Outcome<R>) {
        if let Some(record) = self.records.get_mut(slot.index) {
            if record.sequence == slot.sequence {
                record.outcome = outcome;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.records.len()
    }

    /// True if at least one call was recorded.
    pub fn was_called(&self) -> bool {
        !self.records.is_empty()
    }

    /// True if exactly one call was recorded.
    pub fn was_called_once(&self) -> bool {
        self.records.len() == 1
    }

    /// The `index`-th call, in invocation order.
    pub fn call_at(&self, index: usize) -> Option<&CallRecord<A, R>> {
        self.records.get(index)
    }

    pub fn first_call(&self) -> Option<&CallRecord<A, R>> {
        self.records.first()
    }

    pub fn last_call(&self) -> Option<&CallRecord<A, R>> {
        self.records.last()
    }

    /// All calls, in invocation order.
    pub fn all_calls(&self) -> &[CallRecord<A, R>] {
        &self.records
    }

    /// Sequence number of the first call, used for cross-double ordering.
    pub fn first_sequence(&self) -> Option<u64> {
        self.records.first().map(|r| r.sequence)
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.records.last().map(|r| r.sequence)
    }
}

impl<A: PartialEq, R> CallLog<A, R> {
    /// True if any call received exactly `args`.
    pub fn was_called_with(&self, args: &A) -> bool {
        self.records.iter().any(|r| &r.args == args)
    }

    /// Number of calls that received exactly `args`.
    pub fn call_count_with(&self, args: &A) -> usize {
        self.records.iter().filter(|r| &r.args == args).count()
    }

    /// True iff the log holds exactly one call and it received exactly `args`.
    pub fn was_called_once_with_exactly(&self, args: &A) -> bool {
        match self.records.as_slice() {
            [only] => &only.args == args,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(args: &[i32]) -> CallLog<i32, ()> {
        let mut log = CallLog::new();
        for arg in args {
            let slot = log.begin(*arg, DispatchPath::Default);
            log.finish(slot, Outcome::NoValue);
        }
        log
    }

    #[test]
    fn empty_log_reports_nothing() {
        let log: CallLog<i32, ()> = CallLog::new();
        assert_eq!(log.call_count(), 0);
        assert!(!log.was_called());
        assert!(!log.was_called_once());
        assert!(log.call_at(0).is_none());
        assert!(!log.was_called_once_with_exactly(&1));
    }

    #[test]
    fn records_keep_invocation_order() {
        let log = log_with(&[6, 8, 10]);
        let args: Vec<i32> = log.all_calls().iter().map(|r| r.args).collect();
        assert_eq!(args, vec![6, 8, 10]);
        assert_eq!(log.call_at(1).map(|r| r.args), Some(8));
        assert_eq!(log.first_call().map(|r| r.args), Some(6));
        assert_eq!(log.last_call().map(|r| r.args), Some(10));

        let sequences: Vec<u64> = log.all_calls().iter().map(|r| r.sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn once_with_exactly_requires_a_single_matching_call() {
        assert!(log_with(&[1]).was_called_once_with_exactly(&1));
        assert!(!log_with(&[2]).was_called_once_with_exactly(&1));
        assert!(!log_with(&[1, 1]).was_called_once_with_exactly(&1));
        assert!(!log_with(&[1, 2]).was_called_once_with_exactly(&1));
    }

    #[test]
    fn counts_calls_per_argument() {
        let log = log_with(&[42, 1, 42]);
        assert_eq!(log.call_count_with(&42), 2);
        assert_eq!(log.call_count_with(&7), 0);
        assert!(log.was_called_with(&1));
    }

    #[test]
    fn outcome_can_be_filled_after_nested_calls() {
        let mut log: CallLog<&str, u8> = CallLog::new();
        let outer = log.begin("outer", DispatchPath::Default);
        let inner = log.begin("inner", DispatchPath::Default);
        log.finish(inner, Outcome::Returned(2));
        log.finish(outer, Outcome::Returned(1));

        assert_eq!(log.call_at(0).map(|r| r.args), Some("outer"));
        assert_eq!(log.call_at(0).and_then(|r| r.outcome.returned().copied()), Some(1));
        assert_eq!(log.call_at(1).and_then(|r| r.outcome.returned().copied()), Some(2));
    }

    #[test]
    fn finishing_after_clear_is_ignored() {
        let mut log: CallLog<i32, ()> = CallLog::new();
        let stale = log.begin(1, DispatchPath::Default);
        log.clear();
        let fresh = log.begin(2, DispatchPath::Default);
        log.finish(stale, Outcome::NoValue);
        assert_eq!(log.call_count(), 1);
        assert_eq!(log.call_at(0).map(|r| r.outcome.clone()), Some(Outcome::Pending));
        log.finish(fresh, Outcome::NoValue);
        assert_eq!(log.call_at(0).map(|r| r.outcome.clone()), Some(Outcome::NoValue));
    }
}
