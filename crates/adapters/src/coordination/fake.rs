// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake coordination adapter for testing
//!
//! Delegates to a real [`MemorySession`] so tree semantics stay honest, records
//! every call, and lets tests script failures per operation.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    CoordinationAdapter, CoordinationError, DeletionWatch, MemoryCoordinationTree, MemorySession,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Coordination operation, for scripting failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePersistent,
    CreateEphemeralSequential,
    Delete,
    ListChildren,
    WatchDeletion,
}

/// Recorded coordination call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinationCall {
    CreatePersistent { path: String },
    CreateEphemeralSequential { prefix: String },
    Delete { path: String },
    ListChildren { path: String },
    WatchDeletion { path: String },
}

impl CoordinationCall {
    pub fn operation(&self) -> Operation {
        match self {
            CoordinationCall::CreatePersistent { .. } => Operation::CreatePersistent,
            CoordinationCall::CreateEphemeralSequential { .. } => {
                Operation::CreateEphemeralSequential
            }
            CoordinationCall::Delete { .. } => Operation::Delete,
            CoordinationCall::ListChildren { .. } => Operation::ListChildren,
            CoordinationCall::WatchDeletion { .. } => Operation::WatchDeletion,
        }
    }
}

/// Fake coordination adapter for testing
#[derive(Clone, Debug)]
pub struct FakeCoordinationAdapter {
    session: MemorySession,
    calls: Arc<Mutex<Vec<CoordinationCall>>>,
    failures: Arc<Mutex<HashMap<Operation, VecDeque<CoordinationError>>>>,
}

impl Default for FakeCoordinationAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCoordinationAdapter {
    /// Fake with its own private tree
    pub fn new() -> Self {
        Self::on(&MemoryCoordinationTree::new())
    }

    /// Fake backed by a fresh session on a shared tree
    pub fn on(tree: &MemoryCoordinationTree) -> Self {
        Self {
            session: tree.connect(),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn session(&self) -> &MemorySession {
        &self.session
    }

    pub fn tree(&self) -> &MemoryCoordinationTree {
        self.session.tree()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CoordinationCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of recorded calls of one operation
    pub fn count(&self, operation: Operation) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Fail the next call of `operation` with `error`; queued failures are
    /// consumed in order
    pub fn fail_next(&self, operation: Operation, error: CoordinationError) {
        self.fail_times(operation, error, 1);
    }

    /// Fail the next `times` calls of `operation` with `error`
    pub fn fail_times(&self, operation: Operation, error: CoordinationError, times: usize) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let queue = failures.entry(operation).or_default();
        queue.extend(std::iter::repeat(error).take(times));
    }

    fn record(&self, call: CoordinationCall) -> Result<(), CoordinationError> {
        let operation = call.operation();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        let scripted = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CoordinationAdapter for FakeCoordinationAdapter {
    async fn create_persistent(&self, path: &str) -> Result<(), CoordinationError> {
        self.record(CoordinationCall::CreatePersistent {
            path: path.to_string(),
        })?;
        self.session.create_persistent(path).await
    }

    async fn create_ephemeral_sequential(&self, prefix: &str) -> Result<String, CoordinationError> {
        self.record(CoordinationCall::CreateEphemeralSequential {
            prefix: prefix.to_string(),
        })?;
        self.session.create_ephemeral_sequential(prefix).await
    }

    async fn delete(&self, path: &str) -> Result<(), CoordinationError> {
        self.record(CoordinationCall::Delete {
            path: path.to_string(),
        })?;
        self.session.delete(path).await
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, CoordinationError> {
        self.record(CoordinationCall::ListChildren {
            path: path.to_string(),
        })?;
        self.session.list_children(path).await
    }

    async fn watch_deletion(&self, path: &str) -> Result<Option<DeletionWatch>, CoordinationError> {
        self.record(CoordinationCall::WatchDeletion {
            path: path.to_string(),
        })?;
        self.session.watch_deletion(path).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
