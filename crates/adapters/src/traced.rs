// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::coordination::{CoordinationAdapter, CoordinationError, DeletionWatch};
use async_trait::async_trait;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any CoordinationAdapter
#[derive(Clone, Debug)]
pub struct TracedCoordinationAdapter<C> {
    inner: C,
}

impl<C> TracedCoordinationAdapter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CoordinationAdapter> CoordinationAdapter for TracedCoordinationAdapter<C> {
    async fn create_persistent(&self, path: &str) -> Result<(), CoordinationError> {
        let span = tracing::debug_span!("coordination.create_persistent", path);
        let result = self.inner.create_persistent(path).instrument(span.clone()).await;

        let _guard = span.enter();
        match &result {
            Ok(()) => tracing::debug!("created"),
            // Directory bootstrap races are expected
            Err(CoordinationError::NodeExists(_)) => tracing::trace!("already exists"),
            Err(e) => tracing::warn!(error = %e, "create failed"),
        }
        result
    }

    async fn create_ephemeral_sequential(&self, prefix: &str) -> Result<String, CoordinationError> {
        let span = tracing::info_span!("coordination.create_ephemeral_sequential", prefix);
        let start = Instant::now();
        let result = self
            .inner
            .create_ephemeral_sequential(prefix)
            .instrument(span.clone())
            .await;
        let elapsed = start.elapsed();

        let _guard = span.enter();
        match &result {
            Ok(node) => tracing::info!(
                node = %node,
                elapsed_ms = elapsed.as_millis() as u64,
                "node registered"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "registration failed"
            ),
        }
        result
    }

    async fn delete(&self, path: &str) -> Result<(), CoordinationError> {
        let span = tracing::info_span!("coordination.delete", path);
        let result = self.inner.delete(path).instrument(span.clone()).await;

        let _guard = span.enter();
        match &result {
            Ok(()) => tracing::info!("deleted"),
            // Deleting an absent node is often acceptable (session already gone)
            Err(e) => tracing::warn!(error = %e, "delete failed (may be expected)"),
        }
        result
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, CoordinationError> {
        let result = self.inner.list_children(path).await;
        tracing::trace!(
            path,
            count = result.as_ref().map(|v| v.len()).ok(),
            "listed children"
        );
        result
    }

    async fn watch_deletion(&self, path: &str) -> Result<Option<DeletionWatch>, CoordinationError> {
        let result = self.inner.watch_deletion(path).await;
        match &result {
            Ok(Some(_)) => tracing::debug!(path, "watch registered"),
            Ok(None) => tracing::debug!(path, "watched node already gone"),
            Err(e) => tracing::warn!(path, error = %e, "watch failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
