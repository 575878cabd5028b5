// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eligibility policies for read and write contenders
//!
//! The acquisition loop is the same for every lock kind. A policy only answers
//! two questions about a contender at a given queue position:
//! - is it currently a holder?
//! - if not, whose deletion could change that?

use crate::naming::LockKind;
use crate::siblings::SiblingSet;
use serde::Serialize;

/// Decision point of the acquisition loop, selected per lock kind
pub trait LockPolicy: Clone + Send + Sync + 'static {
    /// Kind of node this policy registers
    fn kind(&self) -> LockKind;

    /// Whether the contender at `index` holds the lock
    fn is_eligible(&self, siblings: &SiblingSet, index: usize) -> bool;

    /// Sibling whose deletion may make the contender at `index` eligible.
    ///
    /// Returns `None` only when nothing precedes the contender.
    fn node_to_watch<'a>(&self, siblings: &'a SiblingSet, index: usize) -> Option<&'a str>;
}

/// Shared read access: blocked only by earlier writers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadPolicy {
    shared: bool,
}

impl ReadPolicy {
    pub fn shared() -> Self {
        Self { shared: true }
    }

    /// Readers that also wait for every earlier reader
    pub fn exclusive() -> Self {
        Self { shared: false }
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self::shared()
    }
}

impl LockPolicy for ReadPolicy {
    fn kind(&self) -> LockKind {
        LockKind::Read
    }

    fn is_eligible(&self, siblings: &SiblingSet, index: usize) -> bool {
        let writer_ahead = (0..index).any(|i| siblings.kind_at(i) == Some(LockKind::Write));
        !writer_ahead && (self.shared || index == 0)
    }

    fn node_to_watch<'a>(&self, siblings: &'a SiblingSet, index: usize) -> Option<&'a str> {
        if index == 0 {
            return None;
        }
        // Every reader behind the same writer watches that writer.
        let closest_writer = (0..index)
            .rev()
            .find(|&i| siblings.kind_at(i) == Some(LockKind::Write));
        siblings.get(closest_writer.unwrap_or(0))
    }
}

/// Exclusive access in strict arrival order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WritePolicy;

impl LockPolicy for WritePolicy {
    fn kind(&self) -> LockKind {
        LockKind::Write
    }

    fn is_eligible(&self, _siblings: &SiblingSet, index: usize) -> bool {
        index == 0
    }

    fn node_to_watch<'a>(&self, siblings: &'a SiblingSet, index: usize) -> Option<&'a str> {
        index.checked_sub(1).and_then(|previous| siblings.get(previous))
    }
}

/// Where a contender stands in its resource's queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub node: String,
    pub index: usize,
    pub eligible: bool,
    pub watching: Option<String>,
}

/// Evaluate `policy` for the contender at `index`
pub fn standing<P: LockPolicy>(policy: &P, siblings: &SiblingSet, index: usize) -> Option<Standing> {
    let node = siblings.get(index)?.to_string();
    let eligible = policy.is_eligible(siblings, index);
    let watching = if eligible {
        None
    } else {
        policy.node_to_watch(siblings, index).map(str::to_string)
    };
    Some(Standing {
        node,
        index,
        eligible,
        watching,
    })
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
