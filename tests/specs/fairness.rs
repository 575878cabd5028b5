//! Grants follow arrival order

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn writer_reader_writer_hand_off() {
    let tree = MemoryCoordinationTree::new();
    let mut w1 = write_lock(&tree, "/res");
    w1.lock().await.unwrap();

    let r1 = spawn_lock(read_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;
    let w2 = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 3).await;

    let queue = SiblingSet::from_children(tree.children("/res"));
    assert_eq!(
        queue.iter().collect::<Vec<_>>(),
        vec![
            "write-lock-0000000000",
            "read-lock-0000000001",
            "write-lock-0000000002",
        ]
    );

    w1.release().await;
    let mut r1 = acquired(r1).await;
    assert_eq!(r1.node(), Some("/res/read-lock-0000000001"));
    settle().await;
    assert!(!w2.is_finished());

    r1.release().await;
    let w2 = acquired(w2).await;
    assert_eq!(w2.node(), Some("/res/write-lock-0000000002"));
}

#[tokio::test]
async fn writers_are_granted_in_arrival_order() {
    let tree = MemoryCoordinationTree::new();
    let mut w1 = write_lock(&tree, "/res");
    w1.lock().await.unwrap();

    let w2 = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;
    let w3 = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 3).await;

    w1.release().await;
    let mut w2 = acquired(w2).await;
    settle().await;
    assert!(!w3.is_finished());

    w2.release().await;
    acquired(w3).await;
}

#[tokio::test]
async fn later_reader_does_not_overtake_a_waiting_writer() {
    let tree = MemoryCoordinationTree::new();
    let mut r1 = read_lock(&tree, "/res");
    r1.lock().await.unwrap();

    let w1 = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;

    let mut r2 = read_lock(&tree, "/res");
    assert!(!r2.try_lock(Duration::from_millis(20)).await.unwrap());
    assert!(!w1.is_finished());

    r1.release().await;
    acquired(w1).await;
}

#[tokio::test]
async fn reader_is_not_held_up_by_later_writers() {
    let tree = MemoryCoordinationTree::new();
    let mut w1 = write_lock(&tree, "/res");
    w1.lock().await.unwrap();

    let r1 = spawn_lock(read_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;
    let w2 = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 3).await;
    let r2 = spawn_lock(read_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 4).await;

    w1.release().await;
    acquired(r1).await;
    settle().await;
    assert!(!r2.is_finished());
    assert!(!w2.is_finished());
}
