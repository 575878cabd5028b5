//! Shared helpers for the behavioral specs

#![allow(dead_code)]

pub use std::time::Duration;
pub use treelock_adapters::{MemoryCoordinationTree, MemorySession};
pub use treelock_core::{LockConfig, SiblingSet};
pub use treelock_engine::{ClusterLock, LockClient, LockError, ReadLock, WriteLock};

use tokio::task::JoinHandle;

/// Generous bound on anything that should happen promptly
pub const PROMPT: Duration = Duration::from_secs(5);

/// Client on a fresh session of `tree`
pub fn client(tree: &MemoryCoordinationTree) -> LockClient<MemorySession> {
    LockClient::new(tree.connect(), LockConfig::default())
}

pub fn write_lock(tree: &MemoryCoordinationTree, resource: &str) -> WriteLock<MemorySession> {
    client(tree).write_lock(resource).unwrap()
}

pub fn read_lock(tree: &MemoryCoordinationTree, resource: &str) -> ReadLock<MemorySession> {
    client(tree).read_lock(resource).unwrap()
}

/// Acquire in the background, handing the held lock back
pub fn spawn_lock<L>(mut lock: L) -> JoinHandle<L>
where
    L: ClusterLock + 'static,
{
    tokio::spawn(async move {
        lock.lock().await.unwrap();
        lock
    })
}

/// Wait until the background acquisition completes
pub async fn acquired<L>(task: JoinHandle<L>) -> L {
    tokio::time::timeout(PROMPT, task)
        .await
        .expect("lock was not granted in time")
        .unwrap()
}

/// Poll until `path` has exactly `count` children
pub async fn wait_for_children(tree: &MemoryCoordinationTree, path: &str, count: usize) {
    tokio::time::timeout(PROMPT, async {
        while tree.children(path).len() != count {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{path} never reached {count} children"));
}

/// Give a waiter a chance to (wrongly) proceed
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
