//! Defines common error types for the Understudy core library.

use crate::types::TargetId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A value standing in for a thrown error.
///
/// Stubs configured to throw or reject hand one of these back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Error class name, `"Error"` unless configured otherwise.
    pub name: String,
    /// Human readable message. May be empty.
    pub message: String,
}

impl Fault {
    /// Creates a fault with the default name and the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
        }
    }

    /// Creates a fault with an explicit name.
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl Default for Fault {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

/// The primary error type for Understudy operations.
#[derive(Error, Debug)]
pub enum DoubleError {
    /// The operation already has an active double and no override was requested.
    #[error(
        "Already Doubled: '{operation}' on target {target} is already wrapped; restore it first"
    )]
    AlreadyDoubled {
        /// Identity of the object owning the operation.
        target: TargetId,
        /// Name of the operation.
        operation: String,
    },

    /// A stub configured to throw was invoked.
    #[error("Thrown: {0}")]
    Thrown(Fault),

    /// A deferred result configured to reject was awaited.
    #[error("Rejected: {0}")]
    Rejected(Fault),

    /// A yielding stub was called without a callback in the designated position.
    #[error("Callback Missing: '{operation}' expected a callback argument to yield to")]
    CallbackMissing {
        /// Name of the operation that tried to yield.
        operation: String,
    },

    /// An async yield was requested outside a tokio runtime.
    #[error("No Runtime: '{operation}' cannot yield asynchronously outside a tokio runtime")]
    NoRuntime {
        /// Name of the operation that tried to yield.
        operation: String,
    },

    /// Error related to registry configuration loading or validation.
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    /// Error during deserialization of a configuration document.
    #[error("Serialization/Deserialization Error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl DoubleError {
    /// Returns the fault carried by a thrown or rejected error.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            DoubleError::Thrown(fault) | DoubleError::Rejected(fault) => Some(fault),
            _ => None,
        }
    }
}
