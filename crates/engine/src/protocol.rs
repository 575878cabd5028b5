// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquisition protocol shared by every lock kind
//!
//! 1. Register an ephemeral sequential node under the resource directory,
//!    bootstrapping missing directories.
//! 2. List and sort the siblings; if the policy says the node is eligible,
//!    the lock is held.
//! 3. Otherwise watch the sibling the policy names and sleep until it is
//!    deleted or the wait budget runs out, then go back to 2.
//!
//! Every exit other than success deletes the node it registered, including a
//! caller dropping the acquisition future part way through.

use crate::error::LockError;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use treelock_adapters::{CoordinationAdapter, CoordinationError};
use treelock_core::{
    Clock, LockPolicy, ResourcePath, SiblingSet, SystemClock, MAX_RETRY_COUNT,
};

enum WaitOutcome {
    Acquired,
    TimedOut,
}

/// One contender's view of the lock protocol for a resource
#[derive(Clone, Debug)]
pub struct LockProtocol<C, P, K = SystemClock> {
    client: C,
    policy: P,
    clock: K,
    resource: ResourcePath,
    retry_limit: u32,
}

impl<C, P, K> LockProtocol<C, P, K>
where
    C: CoordinationAdapter,
    P: LockPolicy,
    K: Clock,
{
    pub fn new(client: C, resource: ResourcePath, policy: P, clock: K) -> Self {
        Self {
            client,
            policy,
            clock,
            resource,
            retry_limit: MAX_RETRY_COUNT,
        }
    }

    /// Bound on node registration attempts (at least one)
    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit.max(1);
        self
    }

    pub fn resource(&self) -> &ResourcePath {
        &self.resource
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Path prefix under which this contender registers its nodes
    pub fn node_prefix(&self) -> String {
        self.resource.node_prefix(self.policy.kind())
    }

    /// Register a node and wait until it holds the lock.
    ///
    /// `None` waits forever. Returns the held node's path, or `None` when the
    /// wait budget ran out (the node has then already been deleted).
    pub async fn try_acquire(&self, timeout: Option<Duration>) -> Result<Option<String>, LockError> {
        let start = self.clock.now();
        let pending = PendingNode::new(self.client.clone(), self.create_lock_node().await?);

        match self.wait_for_lock(start, timeout, pending.path()).await {
            Ok(WaitOutcome::Acquired) => {
                let node = pending.keep();
                info!(
                    resource = %self.resource,
                    kind = %self.policy.kind(),
                    node = %node,
                    "lock acquired"
                );
                Ok(Some(node))
            }
            Ok(WaitOutcome::TimedOut) => {
                info!(
                    resource = %self.resource,
                    kind = %self.policy.kind(),
                    node = %pending.path(),
                    "wait budget exhausted, abandoning"
                );
                pending.abandon().await;
                Ok(None)
            }
            Err(e) => {
                warn!(resource = %self.resource, node = %pending.path(), error = %e, "acquisition failed");
                pending.abandon().await;
                Err(e)
            }
        }
    }

    /// Delete a held node. Never fails; problems are logged.
    pub async fn release(&self, node: &str) {
        info!(resource = %self.resource, node, "releasing lock");
        delete_node(&self.client, node).await;
    }

    /// Current contention queue of the resource
    pub async fn siblings(&self) -> Result<SiblingSet, LockError> {
        let children = self.client.list_children(self.resource.as_str()).await?;
        Ok(SiblingSet::from_children(children))
    }

    async fn create_lock_node(&self) -> Result<String, LockError> {
        let prefix = self.node_prefix();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let err = match self.client.create_ephemeral_sequential(&prefix).await {
                Ok(node) => return Ok(node),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e.into()),
            };

            if attempts >= self.retry_limit {
                return Err(LockError::RetriesExhausted {
                    prefix,
                    attempts,
                    last: err,
                });
            }
            debug!(prefix = %prefix, attempts, error = %err, "registration failed, retrying");

            if let CoordinationError::NoNode(_) = err {
                if let Err(e) = self.ensure_directory().await {
                    if !e.is_transient() {
                        return Err(e.into());
                    }
                    debug!(resource = %self.resource, error = %e, "directory bootstrap interrupted");
                }
            }
        }
    }

    /// Create the resource directory and its ancestors as persistent nodes
    async fn ensure_directory(&self) -> Result<(), CoordinationError> {
        for path in self.resource.ancestors() {
            match self.client.create_persistent(&path).await {
                Ok(()) => debug!(path = %path, "created lock directory"),
                // Another contender got there first
                Err(CoordinationError::NodeExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn wait_for_lock(
        &self,
        start: Instant,
        timeout: Option<Duration>,
        node: &str,
    ) -> Result<WaitOutcome, LockError> {
        let name = self
            .resource
            .child_name(node)
            .ok_or_else(|| LockError::NodeVanished(node.to_string()))?;

        loop {
            let siblings = self.siblings().await?;
            let index = siblings
                .position(name)
                .ok_or_else(|| LockError::NodeVanished(node.to_string()))?;

            if self.policy.is_eligible(&siblings, index) {
                return Ok(WaitOutcome::Acquired);
            }

            let Some(target) = self.policy.node_to_watch(&siblings, index) else {
                return Err(LockError::NothingToWatch(node.to_string()));
            };
            let watch_path = self.resource.child(target);

            let Some(watch) = self.client.watch_deletion(&watch_path).await? else {
                debug!(node, watching = %watch_path, "predecessor already gone, re-checking");
                continue;
            };
            debug!(node, index, watching = %watch_path, "waiting for predecessor");

            match timeout {
                Some(budget) => {
                    let remaining = budget.saturating_sub(self.clock.elapsed_since(start));
                    if remaining.is_zero() {
                        return Ok(WaitOutcome::TimedOut);
                    }
                    match tokio::time::timeout(remaining, watch.deleted()).await {
                        Ok(fired) => {
                            fired.map_err(|_| LockError::Interrupted(watch_path.clone()))?
                        }
                        Err(_) => debug!(node, "wait budget elapsed"),
                    }
                }
                None => watch
                    .deleted()
                    .await
                    .map_err(|_| LockError::Interrupted(watch_path.clone()))?,
            }
        }
    }
}

async fn delete_node<C: CoordinationAdapter>(client: &C, node: &str) {
    match client.delete(node).await {
        Ok(()) => debug!(node, "contention node deleted"),
        Err(CoordinationError::NoNode(_)) => debug!(node, "contention node already gone"),
        Err(e) => warn!(node, error = %e, "failed to delete contention node"),
    }
}

/// Contention node registered by an attempt that has not yet succeeded.
///
/// Dropping it while armed (the acquisition future was cancelled) schedules
/// the delete on the current runtime.
struct PendingNode<C: CoordinationAdapter> {
    client: C,
    path: Option<String>,
}

impl<C: CoordinationAdapter> PendingNode<C> {
    fn new(client: C, path: String) -> Self {
        Self {
            client,
            path: Some(path),
        }
    }

    fn path(&self) -> &str {
        self.path.as_deref().unwrap_or_default()
    }

    /// Hand the node over to the caller as held
    fn keep(mut self) -> String {
        self.path.take().unwrap_or_default()
    }

    /// Delete the node now; a cancelled delete still falls back to `Drop`
    async fn abandon(mut self) {
        if let Some(path) = self.path.as_deref() {
            delete_node(&self.client, path).await;
        }
        self.path = None;
    }
}

impl<C: CoordinationAdapter> Drop for PendingNode<C> {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(node = %path, "acquisition cancelled, deleting contention node");
                let client = self.client.clone();
                runtime.spawn(async move { delete_node(&client, &path).await });
            }
            Err(_) => warn!(
                node = %path,
                "acquisition cancelled outside a runtime; node remains until its session ends"
            ),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
