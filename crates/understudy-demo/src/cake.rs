//! Ben and the cake manager he depends on.

use tracing::warn;
use understudy_core::{Double, Seam, TargetId};

/// Knows whether any cake is left.
pub trait CakeManager: Send + Sync {
    fn is_there_cake(&self) -> bool;
}

/// Someone who wants cake.
pub struct Ben<M> {
    cake_manager: M,
}

impl<M: CakeManager> Ben<M> {
    pub fn new(cake_manager: M) -> Self {
        Self { cake_manager }
    }

    pub fn can_eat_cake(&self) -> bool {
        self.cake_manager.is_there_cake()
    }
}

/// The real cake manager. Its `is_there_cake` check is a seam so tests can
/// double it on a shared instance.
#[derive(Debug, Clone)]
pub struct Kitchen {
    is_there_cake: Seam<(), bool>,
}

impl Kitchen {
    pub fn new(cakes: usize) -> Self {
        Self {
            is_there_cake: Seam::new(TargetId::new(), "is_there_cake", move |_| cakes > 0),
        }
    }

    pub fn is_there_cake_seam(&self) -> &Seam<(), bool> {
        &self.is_there_cake
    }
}

impl CakeManager for Kitchen {
    fn is_there_cake(&self) -> bool {
        match self.is_there_cake.call(()) {
            Ok(reply) => reply.value_or(false),
            Err(err) => {
                warn!(error = %err, "Cake check failed");
                false
            }
        }
    }
}

impl<M: CakeManager> CakeManager for &M {
    fn is_there_cake(&self) -> bool {
        (**self).is_there_cake()
    }
}

impl CakeManager for Double<(), bool> {
    fn is_there_cake(&self) -> bool {
        self.call(()).map(|reply| reply.value_or(false)).unwrap_or(false)
    }
}
