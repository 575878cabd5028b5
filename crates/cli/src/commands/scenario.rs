// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario command: W1, R1, W2 hand-off
//!
//! A writer holds the lock while a reader and then a second writer queue up
//! behind it. The queue is printed after each registration and release.

use crate::output::{self, OutputFormat};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use treelock_adapters::{MemoryCoordinationTree, MemorySession};
use treelock_core::{
    standing, LockConfig, LockKind, ReadPolicy, ResourcePath, SiblingSet, Standing, WritePolicy,
};
use treelock_engine::{LockClient, LockError, LockHandle};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(clap::Args)]
pub struct ScenarioArgs {
    /// Resource the contenders lock
    #[arg(long, default_value = "/res")]
    resource: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct QueueEntry {
    contender: String,
    node: String,
    eligible: bool,
    watching: Option<String>,
}

#[derive(Debug, Serialize)]
struct Step {
    event: String,
    queue: Vec<QueueEntry>,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    resource: String,
    steps: Vec<Step>,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}:", step.event)?;
            for entry in &step.queue {
                let state = match (&entry.eligible, &entry.watching) {
                    (true, _) => "holds the lock".to_string(),
                    (false, Some(target)) => format!("waits on {}", target),
                    (false, None) => "waits".to_string(),
                };
                writeln!(f, "  {:<3} {:<22} {}", entry.contender, entry.node, state)?;
            }
        }
        Ok(())
    }
}

/// Names of the contenders registered so far, by node name
struct Labels {
    resource: ResourcePath,
    shared_reads: bool,
    by_node: HashMap<String, String>,
}

impl Labels {
    /// Label the one node in the tree that has no label yet
    fn assign(&mut self, tree: &MemoryCoordinationTree, label: &str) -> Result<()> {
        let node = tree
            .children(self.resource.as_str())
            .into_iter()
            .find(|name| !self.by_node.contains_key(name))
            .ok_or_else(|| anyhow!("no unlabelled node for {}", label))?;
        self.by_node.insert(node, label.to_string());
        Ok(())
    }

    fn label(&self, node: &str) -> String {
        self.by_node
            .get(node)
            .cloned()
            .unwrap_or_else(|| node.to_string())
    }

    fn standing_of(&self, siblings: &SiblingSet, index: usize) -> Option<Standing> {
        match siblings.kind_at(index) {
            Some(LockKind::Write) => standing(&WritePolicy, siblings, index),
            Some(LockKind::Read) if self.shared_reads => {
                standing(&ReadPolicy::shared(), siblings, index)
            }
            Some(LockKind::Read) => standing(&ReadPolicy::exclusive(), siblings, index),
            None => None,
        }
    }

    fn snapshot(&self, tree: &MemoryCoordinationTree, event: &str) -> Step {
        let siblings = SiblingSet::from_children(tree.children(self.resource.as_str()));
        let queue = (0..siblings.len())
            .filter_map(|index| self.standing_of(&siblings, index))
            .map(|standing| QueueEntry {
                contender: self.label(&standing.node),
                watching: standing.watching.as_deref().map(|node| self.label(node)),
                eligible: standing.eligible,
                node: standing.node,
            })
            .collect();
        Step {
            event: event.to_string(),
            queue,
        }
    }
}

async fn wait_for_children(tree: &MemoryCoordinationTree, path: &str, count: usize) -> Result<()> {
    tokio::time::timeout(STEP_TIMEOUT, async {
        while tree.children(path).len() != count {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .with_context(|| format!("timed out waiting for {} contenders on {}", count, path))
}

/// Acquire in the background; the handle comes back once it holds the lock
fn spawn_lock<P>(
    mut lock: LockHandle<MemorySession, P>,
) -> tokio::task::JoinHandle<Result<LockHandle<MemorySession, P>, LockError>>
where
    P: treelock_core::LockPolicy,
{
    tokio::spawn(async move {
        lock.lock().await?;
        Ok(lock)
    })
}

async fn joined<T>(
    task: impl Future<Output = Result<Result<T, LockError>, tokio::task::JoinError>>,
    label: &str,
) -> Result<T> {
    let outcome = tokio::time::timeout(STEP_TIMEOUT, task)
        .await
        .with_context(|| format!("{} never acquired the lock", label))?;
    Ok(outcome.with_context(|| format!("{} task panicked", label))??)
}

pub async fn handle(args: ScenarioArgs, config: LockConfig) -> Result<()> {
    let resource = ResourcePath::parse(&args.resource)
        .with_context(|| format!("invalid resource {:?}", args.resource))?;
    let tree = MemoryCoordinationTree::new();
    let client = |tree: &MemoryCoordinationTree| LockClient::new(tree.connect(), config.clone());
    let mut labels = Labels {
        resource: resource.clone(),
        shared_reads: config.shared_reads,
        by_node: HashMap::new(),
    };
    let mut steps = Vec::new();

    let mut w1 = client(&tree).write_lock(resource.as_str())?;
    w1.lock().await?;
    labels.assign(&tree, "W1")?;

    let r1 = spawn_lock(client(&tree).read_lock(resource.as_str())?);
    wait_for_children(&tree, resource.as_str(), 2).await?;
    labels.assign(&tree, "R1")?;

    let w2 = spawn_lock(client(&tree).write_lock(resource.as_str())?);
    wait_for_children(&tree, resource.as_str(), 3).await?;
    labels.assign(&tree, "W2")?;
    steps.push(labels.snapshot(&tree, "W1, R1 and W2 registered"));

    w1.release().await;
    let mut r1 = joined(r1, "R1").await?;
    steps.push(labels.snapshot(&tree, "W1 released"));

    r1.release().await;
    let mut w2 = joined(w2, "W2").await?;
    steps.push(labels.snapshot(&tree, "R1 released"));

    w2.release().await;
    steps.push(labels.snapshot(&tree, "W2 released"));

    output::print(
        &ScenarioReport {
            resource: resource.to_string(),
            steps,
        },
        args.format,
    );
    Ok(())
}
