// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for building locks over one coordination session

use crate::error::LockError;
use crate::handle::{LockHandle, ReadLock, WriteLock};
use crate::protocol::LockProtocol;
use treelock_adapters::CoordinationAdapter;
use treelock_core::{Clock, LockConfig, LockPolicy, ReadPolicy, ResourcePath, SystemClock, WritePolicy};

/// Coordination session plus the settings every lock built from it shares.
///
/// The caller owns the session's lifecycle; closing it releases every node
/// registered through it.
#[derive(Clone, Debug)]
pub struct LockClient<C, K = SystemClock> {
    adapter: C,
    config: LockConfig,
    clock: K,
}

impl<C: CoordinationAdapter> LockClient<C, SystemClock> {
    pub fn new(adapter: C, config: LockConfig) -> Self {
        Self {
            adapter,
            config,
            clock: SystemClock,
        }
    }
}

impl<C, K> LockClient<C, K>
where
    C: CoordinationAdapter,
    K: Clock,
{
    pub fn with_clock<K2: Clock>(self, clock: K2) -> LockClient<C, K2> {
        LockClient {
            adapter: self.adapter,
            config: self.config,
            clock,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn adapter(&self) -> &C {
        &self.adapter
    }

    /// Read lock; shared unless the config turns shared reads off
    pub fn read_lock(&self, resource: &str) -> Result<ReadLock<C, K>, LockError> {
        let policy = if self.config.shared_reads {
            ReadPolicy::shared()
        } else {
            ReadPolicy::exclusive()
        };
        self.handle(resource, policy)
    }

    /// Read lock that also waits for every earlier reader
    pub fn exclusive_read_lock(&self, resource: &str) -> Result<ReadLock<C, K>, LockError> {
        self.handle(resource, ReadPolicy::exclusive())
    }

    pub fn write_lock(&self, resource: &str) -> Result<WriteLock<C, K>, LockError> {
        self.handle(resource, WritePolicy)
    }

    /// Protocol for a resource under an arbitrary policy
    pub fn protocol<P: LockPolicy>(
        &self,
        resource: &str,
        policy: P,
    ) -> Result<LockProtocol<C, P, K>, LockError> {
        let resource = ResourcePath::parse(resource)?;
        Ok(
            LockProtocol::new(self.adapter.clone(), resource, policy, self.clock.clone())
                .with_retry_limit(self.config.retry_limit),
        )
    }

    fn handle<P: LockPolicy>(
        &self,
        resource: &str,
        policy: P,
    ) -> Result<LockHandle<C, P, K>, LockError> {
        Ok(LockHandle::new(self.protocol(resource, policy)?)
            .with_default_timeout(self.config.default_timeout))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
