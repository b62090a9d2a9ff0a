//! Chooses which behavior answers a call.
//!
//! Lookup order: argument-conditioned entries (exact matches first, in
//! registration order, then predicate matchers), per-call overrides, the
//! default behavior. If none applies the call is unconfigured.

use crate::behavior::Behavior;
use crate::call_log::DispatchPath;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Decides whether a call's arguments select a conditioned behavior.
pub enum ArgMatcher<A> {
    /// Arguments equal to this tuple.
    Exact(A),
    /// Arguments accepted by a predicate.
    Predicate {
        /// Shown in logs and debug output.
        label: String,
        test: Arc<dyn Fn(&A) -> bool + Send + Sync>,
    },
}

impl<A: PartialEq> ArgMatcher<A> {
    pub fn matches(&self, args: &A) -> bool {
        match self {
            ArgMatcher::Exact(expected) => expected == args,
            ArgMatcher::Predicate { test, .. } => test(args),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for ArgMatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgMatcher::Exact(args) => f.debug_tuple("Exact").field(args).finish(),
            ArgMatcher::Predicate { label, .. } => f.debug_tuple("Predicate").field(label).finish(),
        }
    }
}

/// Argument-conditioned behaviors, in registration order.
pub struct ConditionTable<A, R> {
    entries: Vec<(ArgMatcher<A>, Behavior<A, R>)>,
}

impl<A, R> Default for ConditionTable<A, R> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<A: PartialEq, R: Clone> ConditionTable<A, R> {
    /// Registers `behavior` for calls whose arguments equal `args`.
    ///
    /// Registering the same arguments again replaces the earlier behavior.
    pub fn insert_exact(&mut self, args: A, behavior: Behavior<A, R>) -> usize {
        let existing = self
            .entries
            .iter()
            .position(|(matcher, _)| matches!(matcher, ArgMatcher::Exact(known) if *known == args));
        match existing {
            Some(position) => {
                self.entries[position].1 = behavior;
                position
            }
            None => {
                self.entries.push((ArgMatcher::Exact(args), behavior));
                self.entries.len() - 1
            }
        }
    }

    pub fn insert_predicate<F>(
        &mut self,
        label: impl Into<String>,
        test: F,
        behavior: Behavior<A, R>,
    ) -> usize
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.entries.push((
            ArgMatcher::Predicate {
                label: label.into(),
                test: Arc::new(test),
            },
            behavior,
        ));
        self.entries.len() - 1
    }

    /// Finds the behavior conditioned on `args`, with its table position.
    pub fn lookup(&self, args: &A) -> Option<(usize, Behavior<A, R>)> {
        let exact = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, (matcher, _))| {
                matches!(matcher, ArgMatcher::Exact(_)) && matcher.matches(args)
            });
        let hit = exact.or_else(|| {
            self.entries
                .iter()
                .enumerate()
                .find(|(_, (matcher, _))| {
                    matches!(matcher, ArgMatcher::Predicate { .. }) && matcher.matches(args)
                })
        });
        hit.map(|(position, (_, behavior))| (position, behavior.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The full set of behaviors configured on one double.
pub struct DispatchTable<A, R> {
    pub(crate) conditions: ConditionTable<A, R>,
    pub(crate) on_call: BTreeMap<usize, Behavior<A, R>>,
    pub(crate) default: Option<Behavior<A, R>>,
}

impl<A, R> Default for DispatchTable<A, R> {
    fn default() -> Self {
        Self {
            conditions: ConditionTable::default(),
            on_call: BTreeMap::new(),
            default: None,
        }
    }
}

impl<A: PartialEq, R: Clone> DispatchTable<A, R> {
    /// Picks the behavior for the `call_index`-th call receiving `args`.
    pub fn select(&self, args: &A, call_index: usize) -> (DispatchPath, Option<Behavior<A, R>>) {
        if let Some((position, behavior)) = self.conditions.lookup(args) {
            return (DispatchPath::Conditioned(position), Some(behavior));
        }
        if let Some(behavior) = self.on_call.get(&call_index) {
            return (DispatchPath::OnCall(call_index), Some(behavior.clone()));
        }
        match &self.default {
            Some(behavior) => (DispatchPath::Default, Some(behavior.clone())),
            None => (DispatchPath::Unconfigured, None),
        }
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
        self.on_call.clear();
        self.default = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(selected: &(DispatchPath, Option<Behavior<i32, i32>>)) -> Option<&'static str> {
        selected.1.as_ref().map(|b| b.kind())
    }

    #[test]
    fn exact_entries_win_over_predicates() {
        let mut table: ConditionTable<i32, i32> = ConditionTable::default();
        table.insert_predicate("positive", |n| *n > 0, Behavior::returns(100));
        table.insert_exact(42, Behavior::returns(1));

        assert_eq!(table.lookup(&42).map(|(pos, _)| pos), Some(1));
        assert_eq!(table.lookup(&7).map(|(pos, _)| pos), Some(0));
        assert!(table.lookup(&-1).is_none());
    }

    #[test]
    fn re_registering_exact_args_replaces_behavior() {
        let mut table: ConditionTable<i32, i32> = ConditionTable::default();
        assert_eq!(table.insert_exact(42, Behavior::returns(1)), 0);
        assert_eq!(table.insert_exact(42, Behavior::throws_default()), 0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(&42).map(|(_, b)| b.kind()), Some("throws"));
    }

    #[test]
    fn select_walks_conditions_then_on_call_then_default() {
        let mut table: DispatchTable<i32, i32> = DispatchTable::default();
        assert_eq!(table.select(&5, 0).0, DispatchPath::Unconfigured);

        table.default = Some(Behavior::returns(0));
        table.on_call.insert(1, Behavior::throws_default());
        table.conditions.insert_exact(42, Behavior::returns(1));

        let first = table.select(&5, 0);
        assert_eq!(first.0, DispatchPath::Default);
        assert_eq!(kind_of(&first), Some("returns"));

        let second = table.select(&5, 1);
        assert_eq!(second.0, DispatchPath::OnCall(1));
        assert_eq!(kind_of(&second), Some("throws"));

        let conditioned = table.select(&42, 1);
        assert_eq!(conditioned.0, DispatchPath::Conditioned(0));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut table: DispatchTable<i32, i32> = DispatchTable::default();
        table.default = Some(Behavior::returns(0));
        table.conditions.insert_exact(1, Behavior::returns(1));
        table.clear();
        assert_eq!(table.select(&1, 0).0, DispatchPath::Unconfigured);
    }
}
