// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulate command: many contenders, one in-memory tree
//!
//! Every contender gets its own session and task, acquires its lock, holds it
//! for a while and releases it. A shared monitor counts concurrent holders so
//! any breach of reader/writer exclusion is reported.

use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use treelock_adapters::{MemoryCoordinationTree, TracedCoordinationAdapter};
use treelock_core::{LockConfig, LockKind, ResourcePath};
use treelock_engine::{ClusterLock, LockClient, LockError};

#[derive(clap::Args)]
pub struct SimulateArgs {
    /// Number of read contenders
    #[arg(long, default_value_t = 3)]
    readers: usize,

    /// Number of write contenders
    #[arg(long, default_value_t = 2)]
    writers: usize,

    /// Resource the contenders lock
    #[arg(long, default_value = "/simulation")]
    resource: String,

    /// How long each holder keeps the lock
    #[arg(long, default_value = "20ms", value_parser = humantime::parse_duration)]
    hold: Duration,

    /// Bounded wait per contender (defaults to the config's default_timeout)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Serialize)]
struct Acquisition {
    contender: String,
    kind: LockKind,
    node: String,
}

#[derive(Debug, Default)]
struct MonitorState {
    readers: usize,
    writers: usize,
    max_readers: usize,
    max_writers: usize,
    violations: usize,
    acquisitions: Vec<Acquisition>,
}

/// Observes holders entering and leaving the critical section
#[derive(Debug, Default)]
struct Monitor {
    state: Mutex<MonitorState>,
}

impl Monitor {
    fn enter(&self, acquisition: Acquisition) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match acquisition.kind {
            LockKind::Read => {
                if state.writers > 0 {
                    state.violations += 1;
                }
                state.readers += 1;
                state.max_readers = state.max_readers.max(state.readers);
            }
            LockKind::Write => {
                if state.writers > 0 || state.readers > 0 {
                    state.violations += 1;
                }
                state.writers += 1;
                state.max_writers = state.max_writers.max(state.writers);
            }
        }
        state.acquisitions.push(acquisition);
    }

    fn exit(&self, kind: LockKind) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match kind {
            LockKind::Read => state.readers = state.readers.saturating_sub(1),
            LockKind::Write => state.writers = state.writers.saturating_sub(1),
        }
    }
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    run_id: String,
    resource: String,
    acquisitions: Vec<Acquisition>,
    timed_out: Vec<String>,
    max_concurrent_readers: usize,
    max_concurrent_writers: usize,
    violations: usize,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulation {} on {}", self.run_id, self.resource)?;
        for acquisition in &self.acquisitions {
            writeln!(
                f,
                "  {:<4} {:<5} {}",
                acquisition.contender, acquisition.kind, acquisition.node
            )?;
        }
        if !self.timed_out.is_empty() {
            writeln!(f, "timed out: {}", self.timed_out.join(", "))?;
        }
        writeln!(f, "max concurrent readers: {}", self.max_concurrent_readers)?;
        writeln!(f, "max concurrent writers: {}", self.max_concurrent_writers)?;
        writeln!(f, "exclusion violations: {}", self.violations)
    }
}

/// Spawn order: alternate writers and readers, starting with a writer.
///
/// Tasks register concurrently, so the queue order on the tree may differ.
fn contenders(readers: usize, writers: usize) -> Vec<(String, LockKind)> {
    let mut order = Vec::with_capacity(readers + writers);
    let (mut r, mut w) = (0, 0);
    while r < readers || w < writers {
        if w < writers {
            w += 1;
            order.push((format!("W{}", w), LockKind::Write));
        }
        if r < readers {
            r += 1;
            order.push((format!("R{}", r), LockKind::Read));
        }
    }
    order
}

async fn run_contender(
    client: LockClient<TracedCoordinationAdapter<treelock_adapters::MemorySession>>,
    resource: String,
    label: String,
    kind: LockKind,
    hold: Duration,
    timeout: Option<Duration>,
    monitor: Arc<Monitor>,
) -> Result<Option<String>, LockError> {
    let mut lock: Box<dyn ClusterLock> = match kind {
        LockKind::Read => Box::new(client.read_lock(&resource)?),
        LockKind::Write => Box::new(client.write_lock(&resource)?),
    };

    let acquired = match timeout {
        Some(timeout) => lock.try_lock(timeout).await?,
        None => {
            lock.lock().await?;
            true
        }
    };
    if !acquired {
        tracing::info!(contender = %label, "gave up waiting");
        return Ok(Some(label));
    }

    monitor.enter(Acquisition {
        contender: label,
        kind,
        node: lock.node().unwrap_or_default().to_string(),
    });
    tokio::time::sleep(hold).await;
    monitor.exit(kind);
    lock.release().await;
    Ok(None)
}

pub async fn handle(args: SimulateArgs, config: LockConfig) -> Result<()> {
    let resource = ResourcePath::parse(&args.resource)
        .with_context(|| format!("invalid resource {:?}", args.resource))?;
    let timeout = args.timeout.or(config.default_timeout);
    let run_id = uuid::Uuid::new_v4().to_string();
    let tree = MemoryCoordinationTree::new();
    let monitor = Arc::new(Monitor::default());

    tracing::info!(run_id = %run_id, resource = %resource, readers = args.readers, writers = args.writers, "starting simulation");

    let mut tasks = Vec::new();
    for (label, kind) in contenders(args.readers, args.writers) {
        let session = tree.connect();
        let client = LockClient::new(TracedCoordinationAdapter::new(session.clone()), config.clone());
        let task = tokio::spawn(run_contender(
            client,
            resource.to_string(),
            label,
            kind,
            args.hold,
            timeout,
            Arc::clone(&monitor),
        ));
        tasks.push((session, task));
    }

    let mut timed_out = Vec::new();
    for (session, task) in tasks {
        let outcome = task.await.context("contender task panicked")?;
        session.close();
        if let Some(label) = outcome.context("contender failed")? {
            timed_out.push(label);
        }
    }

    let state = monitor.state.lock().unwrap_or_else(|e| e.into_inner());
    let report = SimulationReport {
        run_id,
        resource: resource.to_string(),
        acquisitions: state.acquisitions.clone(),
        timed_out,
        max_concurrent_readers: state.max_readers,
        max_concurrent_writers: state.max_writers,
        violations: state.violations,
    };
    drop(state);

    output::print(&report, args.format);
    if report.violations > 0 {
        bail!("{} exclusion violations observed", report.violations);
    }
    Ok(())
}

#[cfg(test)]
#[path = "simulate_tests.rs"]
mod tests;
