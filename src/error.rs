// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error type for the fallible parts of scopedlog.
//!
//! Logging calls themselves never return errors. The variants here surface from constructors,
//! [`add_tag`](crate::MethodScopedLogger::add_tag), and the internal plumbing that the logging
//! boundary handles on the caller's behalf.

use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller broke an argument contract (empty tag value, empty method name, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A feature was used before the library was initialized for it.
    #[error("{0} was used before being initialized")]
    NotInitialized(&'static str),

    /// The call stack could not be captured or resolved.
    #[error("call stack unavailable: {0}")]
    StackUnavailable(String),

    /// An unexpected failure inside the library.
    #[error("internal fault: {0}")]
    Internal(String),

    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}
