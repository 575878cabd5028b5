// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handle tests

use super::*;
use crate::LockClient;
use treelock_adapters::{FakeCoordinationAdapter, MemoryCoordinationTree, Operation};
use treelock_core::LockConfig;

fn client(tree: &MemoryCoordinationTree) -> LockClient<FakeCoordinationAdapter> {
    LockClient::new(FakeCoordinationAdapter::on(tree), LockConfig::default())
}

#[tokio::test]
async fn lock_then_release_round_trip() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = client(&tree).write_lock("/res").unwrap();

    lock.lock().await.unwrap();
    assert!(lock.is_held());
    assert_eq!(lock.node(), Some("/res/write-lock-0000000000"));
    assert_eq!(lock.kind(), LockKind::Write);

    lock.release().await;
    assert!(!lock.is_held());
    assert!(tree.children("/res").is_empty());
}

#[tokio::test]
async fn try_lock_timeout_is_false_not_error() {
    let tree = MemoryCoordinationTree::new();
    let mut holder = client(&tree).write_lock("/res").unwrap();
    let mut contender = client(&tree).write_lock("/res").unwrap();
    holder.lock().await.unwrap();

    let acquired = contender.try_lock(Duration::from_millis(10)).await.unwrap();

    assert!(!acquired);
    assert!(!contender.is_held());
    assert_eq!(tree.children("/res").len(), 1);
}

#[tokio::test]
async fn release_without_acquisition_is_a_noop() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = client(&tree).read_lock("/res").unwrap();

    lock.release().await;

    assert!(lock.protocol.siblings().await.is_err(), "nothing was created");
}

#[tokio::test]
async fn second_release_does_not_touch_the_tree() {
    let tree = MemoryCoordinationTree::new();
    let client = client(&tree);
    let mut lock = client.write_lock("/res").unwrap();
    lock.lock().await.unwrap();

    lock.release().await;
    lock.release().await;

    assert_eq!(client.adapter().count(Operation::Delete), 1);
}

#[tokio::test]
async fn relocking_a_held_handle_does_not_register_again() {
    let tree = MemoryCoordinationTree::new();
    let client = client(&tree);
    let mut lock = client.write_lock("/res").unwrap();

    lock.lock().await.unwrap();
    assert!(lock.try_lock(Duration::ZERO).await.unwrap());

    assert_eq!(client.adapter().count(Operation::CreateEphemeralSequential), 2);
    assert_eq!(tree.children("/res").len(), 1);
}

#[tokio::test]
async fn handle_can_be_reused_after_release() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = client(&tree).write_lock("/res").unwrap();

    lock.lock().await.unwrap();
    lock.release().await;
    lock.lock().await.unwrap();

    assert_eq!(lock.node(), Some("/res/write-lock-0000000001"));
}

#[tokio::test]
async fn lock_surfaces_registration_failure() {
    let tree = MemoryCoordinationTree::new();
    let client = LockClient::new(
        FakeCoordinationAdapter::on(&tree),
        LockConfig::default().with_retry_limit(2),
    );
    client.adapter().fail_times(
        Operation::CreateEphemeralSequential,
        treelock_adapters::CoordinationError::ConnectionLoss("down".into()),
        5,
    );
    let mut lock = client.write_lock("/res").unwrap();

    let err = lock.lock().await.unwrap_err();

    assert!(matches!(err, LockError::RetriesExhausted { attempts: 2, .. }));
    assert!(!lock.is_held());
}

#[tokio::test]
async fn handles_work_behind_the_cluster_lock_trait() {
    let tree = MemoryCoordinationTree::new();
    let client = client(&tree);
    let mut locks: Vec<Box<dyn ClusterLock>> = vec![
        Box::new(client.read_lock("/res").unwrap()),
        Box::new(client.read_lock("/res").unwrap()),
        Box::new(client.write_lock("/res").unwrap()),
    ];

    assert!(locks[0].try_lock(Duration::ZERO).await.unwrap());
    assert!(locks[1].try_lock(Duration::ZERO).await.unwrap());
    assert!(!locks[2].try_lock(Duration::ZERO).await.unwrap());

    for lock in &mut locks {
        lock.release().await;
    }
    assert!(locks[2].try_lock(Duration::ZERO).await.unwrap());
    assert!(locks[2].is_held());
    locks[2].release().await;
}

#[tokio::test]
async fn cancelled_lock_does_not_block_later_writers() {
    let tree = MemoryCoordinationTree::new();
    let mut w1 = client(&tree).write_lock("/res").unwrap();
    let mut w2 = client(&tree).write_lock("/res").unwrap();
    let mut w3 = client(&tree).write_lock("/res").unwrap();
    w1.lock().await.unwrap();

    let cancelled = tokio::time::timeout(Duration::from_millis(50), w2.lock()).await;
    assert!(cancelled.is_err());
    assert!(!w2.is_held());

    w1.release().await;

    assert!(w3.try_lock(Duration::from_secs(2)).await.unwrap());
    assert_eq!(w3.node(), Some("/res/write-lock-0000000002"));
    assert_eq!(tree.children("/res"), vec!["write-lock-0000000002"]);
}
