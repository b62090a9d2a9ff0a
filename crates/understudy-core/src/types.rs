//! Common type definitions used throughout Understudy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of an object whose operations can be doubled.
///
/// Minted once per object. Two seams share a `TargetId` exactly when they
/// belong to the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(Uuid);

impl TargetId {
    /// Mints a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an installed double.
pub type HandleId = Uuid;

/// Addresses one operation on one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey {
    /// Owning object.
    pub target: TargetId,
    /// Operation name, unique within the target.
    pub operation: String,
}

impl OperationKey {
    /// Creates a new key from a target and an operation name.
    pub fn new(target: TargetId, operation: impl Into<String>) -> Self {
        Self {
            target,
            operation: operation.into(),
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.target, self.operation)
    }
}

/// A callback argument that doubles can invoke.
///
/// Equality is by reference: two callbacks are equal only if they are clones
/// of the same function.
pub struct Callback<Y> {
    func: Arc<dyn Fn(Y) + Send + Sync>,
}

impl<Y> Callback<Y> {
    /// Wraps a function as a callback.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Y) + Send + Sync + 'static,
    {
        Self { func: Arc::new(func) }
    }

    /// Invokes the callback.
    pub fn invoke(&self, values: Y) {
        (self.func)(values)
    }
}

impl<Y> Clone for Callback<Y> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
        }
    }
}

impl<Y> PartialEq for Callback<Y> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl<Y> fmt::Debug for Callback<Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.func) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn target_ids_are_distinct() {
        assert_ne!(TargetId::new(), TargetId::new());
    }

    #[test]
    fn operation_keys_compare_by_target_and_name() {
        let target = TargetId::new();
        assert_eq!(OperationKey::new(target, "save"), OperationKey::new(target, "save"));
        assert_ne!(OperationKey::new(target, "save"), OperationKey::new(target, "load"));
        assert_ne!(
            OperationKey::new(target, "save"),
            OperationKey::new(TargetId::new(), "save")
        );
    }

    #[test]
    fn callbacks_compare_by_reference() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let callback = Callback::new(move |n: usize| {
            counter.fetch_add(n, Ordering::SeqCst);
        });
        let same = callback.clone();
        let other = Callback::new(|_: usize| {});

        assert_eq!(callback, same);
        assert_ne!(callback, other);

        same.invoke(3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
