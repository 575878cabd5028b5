// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lock acquisition

use thiserror::Error;
use treelock_adapters::CoordinationError;
use treelock_core::InvalidResource;

/// Errors that end an acquisition attempt.
///
/// A timed-out bounded wait is not an error; it is reported as "not acquired".
#[derive(Debug, Error)]
pub enum LockError {
    #[error("invalid resource: {0}")]
    InvalidResource(#[from] InvalidResource),
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordinationError),
    #[error("gave up registering under {prefix} after {attempts} attempts: {last}")]
    RetriesExhausted {
        prefix: String,
        attempts: u32,
        last: CoordinationError,
    },
    #[error("contention node {0} is missing from its sibling set (session lost?)")]
    NodeVanished(String),
    #[error("lock policy named nothing to wait on for ineligible node {0}")]
    NothingToWatch(String),
    #[error("wait on {0} was interrupted")]
    Interrupted(String),
    #[error("failed to lock resource {0}")]
    NotAcquired(String),
}
