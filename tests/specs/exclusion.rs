//! Writers exclude everyone; readers exclude only writers

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn second_writer_waits_for_the_first() {
    let tree = MemoryCoordinationTree::new();
    let mut first = write_lock(&tree, "/res");
    first.lock().await.unwrap();

    let second = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;
    settle().await;
    assert!(!second.is_finished());

    first.release().await;
    let mut second = acquired(second).await;
    assert!(second.is_held());
    second.release().await;
}

#[tokio::test]
async fn readers_hold_together() {
    let tree = MemoryCoordinationTree::new();
    let mut a = read_lock(&tree, "/res");
    let mut b = read_lock(&tree, "/res");
    let mut c = read_lock(&tree, "/res");

    assert!(a.try_lock(Duration::ZERO).await.unwrap());
    assert!(b.try_lock(Duration::ZERO).await.unwrap());
    assert!(c.try_lock(Duration::ZERO).await.unwrap());
    assert_eq!(tree.children("/res").len(), 3);
}

#[tokio::test]
async fn reader_waits_while_a_writer_holds() {
    let tree = MemoryCoordinationTree::new();
    let mut writer = write_lock(&tree, "/res");
    writer.lock().await.unwrap();

    let reader = spawn_lock(read_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;
    settle().await;
    assert!(!reader.is_finished());

    writer.release().await;
    assert!(acquired(reader).await.is_held());
}

#[tokio::test]
async fn writer_waits_while_readers_hold() {
    let tree = MemoryCoordinationTree::new();
    let mut r1 = read_lock(&tree, "/res");
    let mut r2 = read_lock(&tree, "/res");
    r1.lock().await.unwrap();
    r2.lock().await.unwrap();

    let writer = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 3).await;

    r1.release().await;
    settle().await;
    assert!(!writer.is_finished());

    r2.release().await;
    assert!(acquired(writer).await.is_held());
}

#[tokio::test]
async fn exclusive_readers_wait_for_each_other() {
    let tree = MemoryCoordinationTree::new();
    let config = LockConfig::default().with_shared_reads(false);
    let mut first = LockClient::new(tree.connect(), config.clone())
        .read_lock("/res")
        .unwrap();
    first.lock().await.unwrap();

    let mut second = LockClient::new(tree.connect(), config)
        .read_lock("/res")
        .unwrap();
    assert!(!second.try_lock(Duration::from_millis(20)).await.unwrap());

    first.release().await;
    assert!(second.try_lock(PROMPT).await.unwrap());
}

#[tokio::test]
async fn different_resources_do_not_contend() {
    let tree = MemoryCoordinationTree::new();
    let mut a = write_lock(&tree, "/files/a");
    let mut b = write_lock(&tree, "/files/b");

    assert!(a.try_lock(Duration::ZERO).await.unwrap());
    assert!(b.try_lock(Duration::ZERO).await.unwrap());
}
