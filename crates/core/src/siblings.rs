// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sibling set: the ordered contention queue of one resource

use crate::naming::{sequence_of, LockKind};

/// Contention node names under one resource, sorted by sequence suffix.
///
/// This listing is the only record of who holds the lock. It is a snapshot:
/// callers rebuild it after every suspension.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiblingSet {
    names: Vec<String>,
}

impl SiblingSet {
    /// Sort raw child names ascending by sequence suffix.
    ///
    /// Suffixes are compared as strings; the service pads them to a fixed
    /// width so lexical and numeric order agree.
    pub fn from_children(mut children: Vec<String>) -> Self {
        children.sort_by(|lhs, rhs| sequence_of(lhs).cmp(sequence_of(rhs)));
        Self { names: children }
    }

    /// Queue position of a node name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Kind tag of the node at `index`
    pub fn kind_at(&self, index: usize) -> Option<LockKind> {
        self.get(index).and_then(LockKind::of_node)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "siblings_tests.rs"]
mod tests;
