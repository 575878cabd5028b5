// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination service client contract
//!
//! The lock protocol only needs five operations from a hierarchical,
//! strongly-consistent store: persistent and ephemeral-sequential node
//! creation, deletion, child listing, and a one-shot deletion watch.

mod memory;

pub use memory::{MemoryCoordinationTree, MemorySession, SessionId};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CoordinationCall, FakeCoordinationAdapter, Operation};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors from coordination service operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinationError {
    #[error("node does not exist: {0}")]
    NoNode(String),
    #[error("node already exists: {0}")]
    NodeExists(String),
    #[error("node has children: {0}")]
    NotEmpty(String),
    #[error("ephemeral node cannot have children: {0}")]
    NoChildrenForEphemerals(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("connection lost: {0}")]
    ConnectionLoss(String),
    #[error("session expired")]
    SessionExpired,
    #[error("watch on {0} was cancelled before the node was deleted")]
    WatchCancelled(String),
}

impl CoordinationError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoordinationError::NoNode(_) | CoordinationError::ConnectionLoss(_)
        )
    }
}

/// One-shot notification that a watched node was deleted
#[derive(Debug)]
pub struct DeletionWatch {
    path: String,
    fired: oneshot::Receiver<()>,
}

impl DeletionWatch {
    pub fn new(path: impl Into<String>, fired: oneshot::Receiver<()>) -> Self {
        Self {
            path: path.into(),
            fired,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve once the node is deleted.
    ///
    /// Fails with [`CoordinationError::WatchCancelled`] if the client dropped
    /// the watch without firing it (session closed, client shut down).
    pub async fn deleted(self) -> Result<(), CoordinationError> {
        self.fired
            .await
            .map_err(|_| CoordinationError::WatchCancelled(self.path))
    }
}

/// Adapter for a hierarchical coordination service session
#[async_trait]
pub trait CoordinationAdapter: Clone + Send + Sync + 'static {
    /// Create a persistent node. Fails with `NodeExists` if present and
    /// `NoNode` if the parent is missing.
    async fn create_persistent(&self, path: &str) -> Result<(), CoordinationError>;

    /// Create a session-bound node named `prefix` plus a unique, monotonically
    /// increasing, zero-padded suffix. Returns the assigned path.
    async fn create_ephemeral_sequential(&self, prefix: &str) -> Result<String, CoordinationError>;

    /// Delete a node. Fails with `NoNode` if absent.
    async fn delete(&self, path: &str) -> Result<(), CoordinationError>;

    /// Names (not paths) of the children of `path`
    async fn list_children(&self, path: &str) -> Result<Vec<String>, CoordinationError>;

    /// Register a one-shot deletion watch, or `None` if the node is already gone
    async fn watch_deletion(&self, path: &str) -> Result<Option<DeletionWatch>, CoordinationError>;
}
