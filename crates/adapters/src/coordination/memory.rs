// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process coordination tree
//!
//! A single, strongly-consistent tree shared by any number of sessions. Each
//! operation runs under one mutex, so every listing is a consistent snapshot.
//! Ephemeral nodes belong to the session that created them and disappear,
//! firing their deletion watches, when that session is closed or expired.

use super::{CoordinationAdapter, CoordinationError, DeletionWatch};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

const ROOT: &str = "/";

/// Identifier of a session connected to a [`MemoryCoordinationTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Node {
    /// Owning session for ephemeral nodes
    owner: Option<SessionId>,
    children: BTreeSet<String>,
    /// Next suffix handed to a sequential child
    next_sequence: u64,
}

#[derive(Debug)]
struct Watcher {
    session: SessionId,
    fire: oneshot::Sender<()>,
}

#[derive(Debug)]
struct TreeState {
    nodes: HashMap<String, Node>,
    watches: HashMap<String, Vec<Watcher>>,
    live: HashSet<SessionId>,
    next_session: u64,
}

impl TreeState {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT.to_string(), Node::default());
        Self {
            nodes,
            watches: HashMap::new(),
            live: HashSet::new(),
            next_session: 1,
        }
    }

    fn ensure_live(&self, session: SessionId) -> Result<(), CoordinationError> {
        if self.live.contains(&session) {
            Ok(())
        } else {
            Err(CoordinationError::SessionExpired)
        }
    }

    fn create(&mut self, path: &str, owner: Option<SessionId>) -> Result<(), CoordinationError> {
        validate_path(path)?;
        let (parent, name) = split_parent(path)?;

        if self.nodes.contains_key(path) {
            return Err(CoordinationError::NodeExists(path.to_string()));
        }
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| CoordinationError::NoNode(path.to_string()))?;
        if parent_node.owner.is_some() {
            return Err(CoordinationError::NoChildrenForEphemerals(parent.to_string()));
        }

        parent_node.children.insert(name.to_string());
        self.nodes.insert(
            path.to_string(),
            Node {
                owner,
                ..Node::default()
            },
        );
        Ok(())
    }

    fn create_sequential(
        &mut self,
        prefix: &str,
        owner: Option<SessionId>,
    ) -> Result<String, CoordinationError> {
        if !prefix.starts_with('/') || prefix.contains("//") {
            return Err(CoordinationError::InvalidPath(prefix.to_string()));
        }
        let (parent, _) = split_parent(prefix)?;
        let sequence = match self.nodes.get_mut(parent) {
            Some(node) => {
                let sequence = node.next_sequence;
                node.next_sequence += 1;
                sequence
            }
            None => return Err(CoordinationError::NoNode(prefix.to_string())),
        };

        let path = format!("{}{:010}", prefix, sequence);
        self.create(&path, owner)?;
        Ok(path)
    }

    fn remove(&mut self, path: &str) -> Result<(), CoordinationError> {
        validate_path(path)?;
        let (parent, name) = split_parent(path)?;

        match self.nodes.get(path) {
            None => return Err(CoordinationError::NoNode(path.to_string())),
            Some(node) if !node.children.is_empty() => {
                return Err(CoordinationError::NotEmpty(path.to_string()))
            }
            Some(_) => {}
        }

        self.nodes.remove(path);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.remove(name);
        }
        self.fire_watches(path);
        Ok(())
    }

    fn fire_watches(&mut self, path: &str) {
        for watcher in self.watches.remove(path).unwrap_or_default() {
            // Receiver may have given up waiting; that is not an error here.
            let _ = watcher.fire.send(());
        }
    }

    fn add_watch(&mut self, path: &str, session: SessionId) -> Option<DeletionWatch> {
        if !self.nodes.contains_key(path) {
            return None;
        }
        let (fire, fired) = oneshot::channel();
        let watchers = self.watches.entry(path.to_string()).or_default();
        watchers.retain(|w| !w.fire.is_closed());
        watchers.push(Watcher { session, fire });
        Some(DeletionWatch::new(path, fired))
    }
}

fn validate_path(path: &str) -> Result<(), CoordinationError> {
    let valid = path.starts_with('/')
        && (path == ROOT || !path.ends_with('/'))
        && !path.contains("//");
    if valid {
        Ok(())
    } else {
        Err(CoordinationError::InvalidPath(path.to_string()))
    }
}

/// Split a path (or sequential prefix) into parent directory and leaf name
fn split_parent(path: &str) -> Result<(&str, &str), CoordinationError> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Ok((ROOT, &path[1..])),
        Some(index) if index > 0 => Ok((&path[..index], &path[index + 1..])),
        _ => Err(CoordinationError::InvalidPath(path.to_string())),
    }
}

/// Shared in-memory coordination tree
#[derive(Clone, Debug)]
pub struct MemoryCoordinationTree {
    state: Arc<Mutex<TreeState>>,
}

impl Default for MemoryCoordinationTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCoordinationTree {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TreeState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, TreeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a new session on this tree
    pub fn connect(&self) -> MemorySession {
        let id = {
            let mut state = self.state();
            let id = SessionId(state.next_session);
            state.next_session += 1;
            state.live.insert(id);
            id
        };
        tracing::debug!(session = %id, "session opened");
        MemorySession {
            tree: self.clone(),
            id,
        }
    }

    /// End a session: its ephemeral nodes are deleted and its watches dropped
    pub fn expire(&self, session: SessionId) {
        let mut state = self.state();
        if !state.live.remove(&session) {
            return;
        }

        // Watches registered by the session die with it, unfired.
        for watchers in state.watches.values_mut() {
            watchers.retain(|w| w.session != session);
        }
        state.watches.retain(|_, watchers| !watchers.is_empty());

        let owned: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, node)| node.owner == Some(session))
            .map(|(path, _)| path.clone())
            .collect();
        for path in &owned {
            if let Err(e) = state.remove(path) {
                tracing::warn!(session = %session, path = %path, error = %e, "failed to drop ephemeral node");
            }
        }

        tracing::debug!(session = %session, ephemeral_nodes = owned.len(), "session expired");
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state().nodes.contains_key(path)
    }

    /// Child names of `path` in name order, empty when the node is absent
    pub fn children(&self, path: &str) -> Vec<String> {
        self.state()
            .nodes
            .get(path)
            .map(|node| node.children.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Delete a node outside of any session, as an operator or another
    /// application would
    pub fn remove(&self, path: &str) -> Result<(), CoordinationError> {
        self.state().remove(path)
    }

    /// Owning session of an ephemeral node
    pub fn owner(&self, path: &str) -> Option<SessionId> {
        self.state().nodes.get(path).and_then(|node| node.owner)
    }
}

/// A session on a [`MemoryCoordinationTree`]
#[derive(Clone, Debug)]
pub struct MemorySession {
    tree: MemoryCoordinationTree,
    id: SessionId,
}

impl MemorySession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tree(&self) -> &MemoryCoordinationTree {
        &self.tree
    }

    /// Close the session, releasing everything it holds
    pub fn close(&self) {
        self.tree.expire(self.id);
    }
}

#[async_trait]
impl CoordinationAdapter for MemorySession {
    async fn create_persistent(&self, path: &str) -> Result<(), CoordinationError> {
        let mut state = self.tree.state();
        state.ensure_live(self.id)?;
        state.create(path, None)
    }

    async fn create_ephemeral_sequential(&self, prefix: &str) -> Result<String, CoordinationError> {
        let mut state = self.tree.state();
        state.ensure_live(self.id)?;
        state.create_sequential(prefix, Some(self.id))
    }

    async fn delete(&self, path: &str) -> Result<(), CoordinationError> {
        let mut state = self.tree.state();
        state.ensure_live(self.id)?;
        state.remove(path)
    }

    async fn list_children(&self, path: &str) -> Result<Vec<String>, CoordinationError> {
        let state = self.tree.state();
        state.ensure_live(self.id)?;
        state
            .nodes
            .get(path)
            .map(|node| node.children.iter().cloned().collect())
            .ok_or_else(|| CoordinationError::NoNode(path.to_string()))
    }

    async fn watch_deletion(&self, path: &str) -> Result<Option<DeletionWatch>, CoordinationError> {
        let mut state = self.tree.state();
        state.ensure_live(self.id)?;
        Ok(state.add_watch(path, self.id))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
