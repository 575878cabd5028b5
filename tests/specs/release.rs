//! Release and session loss

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn release_removes_only_the_callers_node() {
    let tree = MemoryCoordinationTree::new();
    let mut mine = read_lock(&tree, "/res");
    let mut theirs = read_lock(&tree, "/res");
    mine.lock().await.unwrap();
    theirs.lock().await.unwrap();

    mine.release().await;

    assert!(!mine.is_held());
    assert!(theirs.is_held());
    assert_eq!(tree.children("/res"), vec!["read-lock-0000000001".to_string()]);
}

#[tokio::test]
async fn release_twice_is_harmless() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = write_lock(&tree, "/res");
    lock.lock().await.unwrap();

    lock.release().await;
    lock.release().await;

    assert!(tree.children("/res").is_empty());
}

#[tokio::test]
async fn locking_a_held_handle_keeps_its_node() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = write_lock(&tree, "/res");
    lock.lock().await.unwrap();
    let node = lock.node().map(str::to_string);

    assert!(lock.try_lock(Duration::ZERO).await.unwrap());
    assert_eq!(lock.node().map(str::to_string), node);
    assert_eq!(tree.children("/res").len(), 1);
}

#[tokio::test]
async fn closing_the_holders_session_releases_the_lock() {
    let tree = MemoryCoordinationTree::new();
    let session = tree.connect();
    let mut holder = LockClient::new(session.clone(), LockConfig::default())
        .write_lock("/res")
        .unwrap();
    holder.lock().await.unwrap();

    let waiter = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;

    session.close();
    let waiter = acquired(waiter).await;
    assert_eq!(waiter.node(), Some("/res/write-lock-0000000001"));
}

#[tokio::test]
async fn boxed_locks_share_one_interface() {
    let tree = MemoryCoordinationTree::new();
    let mut locks: Vec<Box<dyn ClusterLock>> = vec![
        Box::new(read_lock(&tree, "/res")),
        Box::new(read_lock(&tree, "/res")),
    ];

    for lock in &mut locks {
        assert!(lock.try_lock(Duration::ZERO).await.unwrap());
    }
    for lock in &mut locks {
        lock.release().await;
        assert!(!lock.is_held());
    }
    assert!(tree.children("/res").is_empty());
}
