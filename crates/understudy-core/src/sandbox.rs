//! Scoped registries that restore themselves.

use crate::config::RegistryConfig;
use crate::registry::Registry;
use std::ops::Deref;
use tracing::debug;

/// An isolated [`Registry`] that restores every double it installed when
/// dropped, including during unwinding after a failed assertion.
///
/// ```
/// use understudy_core::{Sandbox, Seam};
///
/// let is_there_cake = Seam::function("is_there_cake", |_: ()| true);
/// {
///     let sandbox = Sandbox::new();
///     sandbox.stub(&is_there_cake).unwrap().returns(false);
///     assert_eq!(is_there_cake.call(()).unwrap().into_value(), Some(false));
/// }
/// assert_eq!(is_there_cake.call(()).unwrap().into_value(), Some(true));
/// ```
#[derive(Debug, Default)]
pub struct Sandbox {
    registry: Registry,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: Registry::with_config(config),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Restores everything now. Dropping the sandbox afterwards is a no-op.
    pub fn restore(&self) -> usize {
        self.registry.restore_all()
    }
}

impl Deref for Sandbox {
    type Target = Registry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let restored = self.registry.restore_all();
        if restored > 0 {
            debug!(registry = %self.registry.config().label, restored, "Sandbox restored doubles");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seam::Seam;

    #[test]
    fn drop_restores_even_after_panic() {
        let seam = Seam::function("connect", |_: ()| "real");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let sandbox = Sandbox::new();
            sandbox.stub(&seam).unwrap().returns("fake");
            panic!("assertion failed inside test");
        }));
        assert!(outcome.is_err());
        assert!(!seam.is_doubled());
        assert_eq!(seam.call(()).unwrap().into_value(), Some("real"));
    }

    #[test]
    fn early_restore_leaves_nothing_for_drop() {
        let seam = Seam::function("connect", |_: ()| 1);
        let sandbox = Sandbox::with_config(RegistryConfig::labelled("early"));
        sandbox.stub(&seam).unwrap();
        assert_eq!(sandbox.restore(), 1);
        assert_eq!(sandbox.active_count(), 0);
        assert_eq!(sandbox.registry().config().label, "early");
    }

    #[test]
    fn sandboxes_do_not_see_each_other() {
        let first = Seam::function("first", |_: ()| 1);
        let second = Seam::function("second", |_: ()| 2);
        let a = Sandbox::new();
        let b = Sandbox::new();
        a.stub(&first).unwrap().returns(10);
        b.stub(&second).unwrap().returns(20);

        drop(a);
        assert!(!first.is_doubled());
        assert_eq!(second.call(()).unwrap().into_value(), Some(20));
    }
}
