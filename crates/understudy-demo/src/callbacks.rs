//! Functions that take callbacks.

use once_cell::sync::OnceCell;
use understudy_core::Callback;

/// Invokes `callback` only when `condition` holds.
pub fn run_if(condition: bool, callback: &Callback<()>) {
    if condition {
        callback.invoke(());
    }
}

/// Wraps a function so it runs at most once; later calls return the first result.
pub struct Once<R> {
    func: Box<dyn Fn() -> R + Send + Sync>,
    result: OnceCell<R>,
}

impl<R> Once<R> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            result: OnceCell::new(),
        }
    }

    pub fn call(&self) -> &R {
        self.result.get_or_init(|| (self.func)())
    }

    pub fn has_run(&self) -> bool {
        self.result.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn once_caches_the_first_result() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let once = Once::new(move || counter.fetch_add(1, Ordering::SeqCst));
        assert!(!once.has_run());
        assert_eq!(*once.call(), 0);
        assert_eq!(*once.call(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_if_respects_condition() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let callback = Callback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        run_if(false, &callback);
        run_if(true, &callback);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
