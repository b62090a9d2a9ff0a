//! Assertion helpers for tests that use doubles.
//!
//! Each macro panics with the double's rendered call log, so a failing
//! assertion shows what actually happened.

use crate::double::Double;
use std::fmt::Debug;
use std::fmt::Write as _;

/// Renders a double's call log, one line per call.
pub fn describe_calls<A, R>(double: &Double<A, R>) -> String
where
    A: Clone + PartialEq + Debug + Send + 'static,
    R: Clone + Debug + Send + 'static,
{
    let calls = double.all_calls();
    if calls.is_empty() {
        return format!("{} was never called", double.name());
    }
    let mut rendered = format!("{} was called {} time(s):", double.name(), calls.len());
    for (index, record) in calls.iter().enumerate() {
        let _ = write!(
            rendered,
            "\n  #{} {:?} -> {:?} (via {:?})",
            index, record.args, record.outcome, record.path
        );
    }
    rendered
}

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; defaults to `understudy_core=debug`. Safe to call from
/// every test.
#[cfg(any(test, feature = "test-tracing"))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("understudy_core=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

#[macro_export]
macro_rules! assert_called {
    ($double:expr) => {
        assert!(
            $double.was_called(),
            "expected a call: {}",
            $crate::test_utils::describe_calls(&$double)
        );
    };
}

#[macro_export]
macro_rules! assert_not_called {
    ($double:expr) => {
        assert!(
            !$double.was_called(),
            "expected no calls: {}",
            $crate::test_utils::describe_calls(&$double)
        );
    };
}

#[macro_export]
macro_rules! assert_called_once {
    ($double:expr) => {
        assert!(
            $double.was_called_once(),
            "expected exactly one call: {}",
            $crate::test_utils::describe_calls(&$double)
        );
    };
}

#[macro_export]
macro_rules! assert_call_count {
    ($double:expr, $count:expr) => {
        assert_eq!(
            $double.call_count(),
            $count,
            "unexpected call count: {}",
            $crate::test_utils::describe_calls(&$double)
        );
    };
}

#[macro_export]
macro_rules! assert_called_with {
    ($double:expr, $args:expr) => {
        assert!(
            $double.was_called_with(&$args),
            "expected a call with {:?}: {}",
            $args,
            $crate::test_utils::describe_calls(&$double)
        );
    };
}

#[macro_export]
macro_rules! assert_called_once_with {
    ($double:expr, $args:expr) => {
        assert!(
            $double.was_called_once_with_exactly(&$args),
            "expected exactly one call with {:?}: {}",
            $args,
            $crate::test_utils::describe_calls(&$double)
        );
    };
}
