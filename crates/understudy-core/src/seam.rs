//! Replaceable operation slots.
//!
//! Code that cannot take its collaborators by injection exposes each
//! replaceable operation as a [`Seam`]. A seam owns the operation's key, its
//! real implementation and a stack of installed doubles. Every call goes to
//! the double on top of the stack, or to the implementation when the stack is
//! empty.

use crate::behavior::{Original, Reply};
use crate::double::Double;
use crate::errors::DoubleError;
use crate::types::{HandleId, OperationKey, TargetId};
use std::sync::{Arc, PoisonError, RwLock};

/// Doubles installed on one seam, oldest first.
pub(crate) struct LayerStack<A, R> {
    layers: Vec<(HandleId, Double<A, R>)>,
}

impl<A, R> LayerStack<A, R> {
    fn top(&self) -> Option<&Double<A, R>> {
        self.layers.last().map(|(_, double)| double)
    }
}

/// Shared layer stack of a seam.
pub(crate) type Layers<A, R> = Arc<RwLock<LayerStack<A, R>>>;

/// Removes the layer installed under `handle`, wherever it sits in the stack.
///
/// Calls then reach whatever is left on top, or the implementation.
pub(crate) fn remove_layer<A, R>(layers: &Layers<A, R>, handle: HandleId) -> Option<Double<A, R>> {
    let mut stack = layers.write().unwrap_or_else(PoisonError::into_inner);
    let position = stack.layers.iter().position(|(id, _)| *id == handle)?;
    Some(stack.layers.remove(position).1)
}

/// A named operation on a target whose implementation can be swapped.
pub struct Seam<A, R> {
    key: OperationKey,
    declared: Original<A, R>,
    layers: Layers<A, R>,
}

impl<A, R> Clone for Seam<A, R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            declared: Arc::clone(&self.declared),
            layers: Arc::clone(&self.layers),
        }
    }
}

impl<A, R> std::fmt::Debug for Seam<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seam").field("key", &self.key).finish_non_exhaustive()
    }
}

impl<A, R> Seam<A, R>
where
    A: Clone + PartialEq + Send + 'static,
    R: Clone + Send + 'static,
{
    /// Declares operation `name` on `target`, implemented by `implementation`.
    pub fn new<F>(target: TargetId, name: impl Into<String>, implementation: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self {
            key: OperationKey::new(target, name),
            declared: Arc::new(implementation),
            layers: Arc::new(RwLock::new(LayerStack { layers: Vec::new() })),
        }
    }

    /// Declares a standalone function. It gets an identity of its own.
    pub fn function<F>(name: impl Into<String>, implementation: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        Self::new(TargetId::new(), name, implementation)
    }

    pub fn key(&self) -> &OperationKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.operation
    }

    /// True while a double is bound.
    pub fn is_doubled(&self) -> bool {
        self.active_double().is_some()
    }

    /// Number of doubles installed, counting the ones covered by an override.
    pub fn depth(&self) -> usize {
        self.layers.read().unwrap_or_else(PoisonError::into_inner).layers.len()
    }

    /// The double currently bound, if any.
    pub fn active_double(&self) -> Option<Double<A, R>> {
        self.layers.read().unwrap_or_else(PoisonError::into_inner).top().cloned()
    }

    /// Invokes whatever is bound.
    ///
    /// The real implementation always replies with a value; doubles reply
    /// according to their configuration.
    pub fn call(&self, args: A) -> Result<Reply<R>, DoubleError> {
        // The lock is released before dispatch so doubles may re-enter the seam.
        match self.active_double() {
            Some(double) => double.call(args),
            None => Ok(Reply::Value((self.declared)(args))),
        }
    }

    /// Pushes `double` on top of the stack under `handle`.
    ///
    /// Unless `allow_override` is set, a seam that already has a double is
    /// refused. On success returns the name of the double now covered, if any.
    pub(crate) fn push_layer(
        &self,
        handle: HandleId,
        double: Double<A, R>,
        allow_override: bool,
    ) -> Result<Option<String>, DoubleError> {
        let mut stack = self.layers.write().unwrap_or_else(PoisonError::into_inner);
        let covered = stack.top().map(|existing| existing.name().to_string());
        if covered.is_some() && !allow_override {
            return Err(DoubleError::AlreadyDoubled {
                target: self.key.target,
                operation: self.key.operation.clone(),
            });
        }
        stack.layers.push((handle, double));
        Ok(covered)
    }

    pub(crate) fn layers(&self) -> &Layers<A, R> {
        &self.layers
    }

    pub(crate) fn declared(&self) -> &Original<A, R> {
        &self.declared
    }
}
