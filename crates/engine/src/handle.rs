// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock handles held by application code

use crate::error::LockError;
use crate::protocol::LockProtocol;
use async_trait::async_trait;
use std::time::Duration;
use treelock_adapters::CoordinationAdapter;
use treelock_core::{Clock, LockKind, LockPolicy, ReadPolicy, ResourcePath, SystemClock, WritePolicy};

/// A cluster-wide lock on one resource
#[async_trait]
pub trait ClusterLock: Send {
    /// Wait as long as it takes to acquire the lock
    async fn lock(&mut self) -> Result<(), LockError>;

    /// Wait at most `timeout`; `Ok(false)` means the wait ran out
    async fn try_lock(&mut self, timeout: Duration) -> Result<bool, LockError>;

    /// Give the lock back. Safe to call when nothing is held.
    async fn release(&mut self);

    fn is_held(&self) -> bool;

    /// Path of the held contention node
    fn node(&self) -> Option<&str>;
}

/// Handle over one contender's acquisitions of a resource.
///
/// Holds nothing durable except the path of the node it currently owns.
#[derive(Debug)]
pub struct LockHandle<C, P, K = SystemClock> {
    protocol: LockProtocol<C, P, K>,
    node: Option<String>,
    default_timeout: Option<Duration>,
}

/// Shared (or, when so configured, exclusive) read access
pub type ReadLock<C, K = SystemClock> = LockHandle<C, ReadPolicy, K>;

/// Exclusive write access
pub type WriteLock<C, K = SystemClock> = LockHandle<C, WritePolicy, K>;

impl<C, P, K> LockHandle<C, P, K>
where
    C: CoordinationAdapter,
    P: LockPolicy,
    K: Clock,
{
    pub fn new(protocol: LockProtocol<C, P, K>) -> Self {
        Self {
            protocol,
            node: None,
            default_timeout: None,
        }
    }

    /// Wait bound used by [`LockHandle::lock_default`]; `None` waits forever
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    pub fn resource(&self) -> &ResourcePath {
        self.protocol.resource()
    }

    pub fn kind(&self) -> LockKind {
        self.protocol.policy().kind()
    }

    /// Path of the held contention node
    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn is_held(&self) -> bool {
        self.node.is_some()
    }

    pub async fn lock(&mut self) -> Result<(), LockError> {
        if self.acquire(None).await? {
            Ok(())
        } else {
            Err(LockError::NotAcquired(self.resource().to_string()))
        }
    }

    pub async fn try_lock(&mut self, timeout: Duration) -> Result<bool, LockError> {
        self.acquire(Some(timeout)).await
    }

    /// Acquire within the configured default timeout, or without bound when
    /// none is configured
    pub async fn lock_default(&mut self) -> Result<bool, LockError> {
        self.acquire(self.default_timeout).await
    }

    pub async fn release(&mut self) {
        if let Some(node) = self.node.take() {
            self.protocol.release(&node).await;
        }
    }

    async fn acquire(&mut self, timeout: Option<Duration>) -> Result<bool, LockError> {
        if let Some(node) = &self.node {
            tracing::debug!(node = %node, "lock already held by this handle");
            return Ok(true);
        }
        self.node = self.protocol.try_acquire(timeout).await?;
        Ok(self.node.is_some())
    }
}

#[async_trait]
impl<C, P, K> ClusterLock for LockHandle<C, P, K>
where
    C: CoordinationAdapter,
    P: LockPolicy,
    K: Clock,
{
    async fn lock(&mut self) -> Result<(), LockError> {
        LockHandle::lock(self).await
    }

    async fn try_lock(&mut self, timeout: Duration) -> Result<bool, LockError> {
        LockHandle::try_lock(self, timeout).await
    }

    async fn release(&mut self) {
        LockHandle::release(self).await
    }

    fn is_held(&self) -> bool {
        LockHandle::is_held(self)
    }

    fn node(&self) -> Option<&str> {
        LockHandle::node(self)
    }
}

impl<C, P, K> Drop for LockHandle<C, P, K> {
    fn drop(&mut self) {
        if let Some(node) = &self.node {
            tracing::warn!(
                node = %node,
                "lock handle dropped while held; node remains until its session ends"
            );
        }
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
