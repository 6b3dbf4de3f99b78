//! Error types and logging helpers.
//!
//! Nothing in this crate is fatal: every failure degrades to "the
//! shortcut does nothing" plus a `tracing` diagnostic, so a bad keymap
//! entry can never take the host application down.

use thiserror::Error;
use tracing::{error, warn};

use crate::registry::ActionId;

/// Why a handler registration was skipped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError<A: ActionId> {
    /// The action has no default or override binding.
    #[error("unknown action {0:?}: no default or override binding")]
    UnknownAction(A),
    /// The engine was already destroyed.
    #[error("dispatch engine has been destroyed")]
    Destroyed,
}

/// Extension trait for logging recoverable errors at the call site.
///
/// Uses `#[track_caller]` so the log line points at the caller, not at
/// this module.
pub trait ResultExt<T> {
    /// Log the error and return `None`. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as a warning and return `None`. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "operation had warning"
                );
                None
            }
        }
    }
}

/// Panic in debug builds, log an error in release builds.
///
/// For states that should be impossible: crash loudly during development,
/// degrade gracefully in production.
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("impossible state: {}", format_args!($($fmt_arg)*));
        }
    };
}
