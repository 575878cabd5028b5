//! try_lock gives up within its budget and leaves nothing behind

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::time::Instant;

#[tokio::test]
async fn timed_out_attempt_returns_false_and_removes_its_node() {
    let tree = MemoryCoordinationTree::new();
    let mut holder = write_lock(&tree, "/res");
    holder.lock().await.unwrap();

    let mut contender = write_lock(&tree, "/res");
    let budget = Duration::from_millis(100);
    let start = Instant::now();
    let acquired = contender.try_lock(budget).await.unwrap();
    let elapsed = start.elapsed();

    assert!(!acquired);
    assert!(!contender.is_held());
    assert!(elapsed >= budget, "gave up early: {elapsed:?}");
    assert!(elapsed < budget + Duration::from_secs(2), "overslept: {elapsed:?}");
    assert_eq!(tree.children("/res"), vec!["write-lock-0000000000".to_string()]);
}

#[tokio::test]
async fn zero_budget_does_not_block() {
    let tree = MemoryCoordinationTree::new();
    let mut holder = write_lock(&tree, "/res");
    holder.lock().await.unwrap();

    let mut reader = read_lock(&tree, "/res");
    let outcome = tokio::time::timeout(Duration::from_secs(1), reader.try_lock(Duration::ZERO))
        .await
        .expect("zero budget blocked");

    assert!(!outcome.unwrap());
    assert_eq!(tree.children("/res").len(), 1);
}

#[tokio::test]
async fn abandoned_attempt_does_not_disturb_the_queue() {
    let tree = MemoryCoordinationTree::new();
    let mut holder = write_lock(&tree, "/res");
    holder.lock().await.unwrap();

    let patient = spawn_lock(write_lock(&tree, "/res"));
    wait_for_children(&tree, "/res", 2).await;

    let mut impatient = write_lock(&tree, "/res");
    assert!(!impatient.try_lock(Duration::from_millis(20)).await.unwrap());

    holder.release().await;
    let patient = acquired(patient).await;
    assert_eq!(patient.node(), Some("/res/write-lock-0000000001"));
}

#[tokio::test]
async fn handle_can_retry_after_timing_out() {
    let tree = MemoryCoordinationTree::new();
    let mut holder = write_lock(&tree, "/res");
    holder.lock().await.unwrap();

    let mut contender = write_lock(&tree, "/res");
    assert!(!contender.try_lock(Duration::from_millis(10)).await.unwrap());

    holder.release().await;
    assert!(contender.try_lock(PROMPT).await.unwrap());
}
