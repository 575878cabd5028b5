//! Missing lock directories are created on first use

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn first_lock_creates_the_whole_path() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = write_lock(&tree, "files/reports/q3.csv");

    lock.lock().await.unwrap();

    assert!(tree.exists("/files"));
    assert!(tree.exists("/files/reports"));
    assert_eq!(
        lock.node(),
        Some("/files/reports/q3.csv/write-lock-0000000000")
    );
}

#[tokio::test]
async fn directories_outlive_their_locks() {
    let tree = MemoryCoordinationTree::new();
    let mut lock = read_lock(&tree, "/res");
    lock.lock().await.unwrap();
    lock.release().await;

    assert!(tree.exists("/res"));
    assert!(tree.children("/res").is_empty());
}

#[tokio::test]
async fn concurrent_first_users_both_succeed() {
    let tree = MemoryCoordinationTree::new();
    let a = spawn_lock(read_lock(&tree, "/fresh/dir"));
    let b = spawn_lock(read_lock(&tree, "/fresh/dir"));

    acquired(a).await;
    acquired(b).await;
    assert_eq!(tree.children("/fresh/dir").len(), 2);
}

#[tokio::test]
async fn invalid_resource_is_rejected_up_front() {
    let tree = MemoryCoordinationTree::new();
    let err = client(&tree).write_lock("/").unwrap_err();
    assert!(matches!(err, LockError::InvalidResource(_)));
}
