//! Error types for the sign registry.
//!
//! This module declares the error surface of the process-wide sign
//! registry. The registry itself has no recoverable runtime errors:
//! precondition violations (null entities, foreign handles, missing
//! components passed to `get`) are programmer errors and abort, while
//! "absent but valid" lookups are reflected in `Option`/`bool` return
//! values. What remains fallible is the global sign registry, whose lock
//! can be poisoned by a panicking thread and whose column factories can be
//! queried with a sign that was never registered.
//!
//! Each error carries enough context to make the failure actionable and
//! implements [`std::error::Error`] and [`fmt::Display`], with `Display`
//! kept to short, single-line messages suitable for logs.

use std::fmt;

use crate::engine::types::Sign;

/// Result alias for sign registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by the process-wide sign registry.
///
/// ## Context
/// These indicate either a poisoned global lock (a thread panicked while
/// registering) or a request for storage machinery of a sign that was
/// never assigned. Both are non-recoverable in practice; call sites that
/// cannot surface a `Result` treat them as fatal.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The global registry lock was poisoned by a panicking thread.
    PoisonedLock,

    /// No column factory is installed for the given sign.
    ///
    /// This means the sign was never produced by the registry, or storage
    /// installation was skipped; either way it is a logic error.
    MissingFactory {
        /// The sign whose factory lookup failed.
        sign: Sign,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::PoisonedLock => f.write_str("sign registry lock poisoned"),
            RegistryError::MissingFactory { sign } => {
                write!(f, "no column factory registered for sign {sign}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}
