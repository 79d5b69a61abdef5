//! # Error Types
//!
//! Typed failures for the store contract and the resolve operation.

use crate::model::ContactId;
use thiserror::Error;

/// Failures surfaced by a contact store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("contact {0} not found")]
    MissingContact(ContactId),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Failures surfaced by a resolve call.
///
/// Every variant aborts the call wholesale; no partial consolidated view is
/// ever returned.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither email nor phone number supplied. Reported before any store
    /// access is attempted.
    #[error("either email or phoneNumber is required")]
    InvalidInput,

    /// A store read or write failed. Propagated opaquely; retry policy
    /// belongs to the store adapter or the caller.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// More than one primary remained reachable in a cluster after a merge.
    /// Indicates a programming error, never expected in correct operation.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
