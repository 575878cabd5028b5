// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contention node naming
//!
//! A contention node is named `<kind-prefix><sequence>`, where the prefix ends in
//! [`NODE_SEPARATOR`] and the sequence is appended by the coordination service.
//! Nodes live directly under the resource directory:
//! `/files/report.csv/write-lock-0000000003`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Separator between the kind prefix and the service-assigned sequence
pub const NODE_SEPARATOR: &str = "-";

/// Prefix of nodes registered by readers
pub const READ_LOCK_PREFIX: &str = "read-lock-";

/// Prefix of nodes registered by writers
pub const WRITE_LOCK_PREFIX: &str = "write-lock-";

/// Token after which a node name carries its sequence suffix
pub const LOCK_ID_SPLIT: &str = "-lock-";

/// Default bound on contention node creation attempts
pub const MAX_RETRY_COUNT: u32 = 10;

/// Separator between coordination tree path segments
pub const PATH_SEPARATOR: char = '/';

/// Kind of contender, recovered from a node name without extra metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    Read,
    Write,
}

impl LockKind {
    /// Node name prefix registered by this kind
    pub fn prefix(self) -> &'static str {
        match self {
            LockKind::Read => READ_LOCK_PREFIX,
            LockKind::Write => WRITE_LOCK_PREFIX,
        }
    }

    /// Kind tag of a node name, or `None` for names this protocol did not create
    pub fn of_node(name: &str) -> Option<Self> {
        if name.starts_with(WRITE_LOCK_PREFIX) {
            Some(LockKind::Write)
        } else if name.starts_with(READ_LOCK_PREFIX) {
            Some(LockKind::Read)
        } else {
            None
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LockKind::Read => "read",
            LockKind::Write => "write",
        })
    }
}

/// Sequence suffix of a node name: everything after the last [`LOCK_ID_SPLIT`].
///
/// Names without the split token are their own sequence.
pub fn sequence_of(name: &str) -> &str {
    match name.rfind(LOCK_ID_SPLIT) {
        Some(index) => &name[index + LOCK_ID_SPLIT.len()..],
        None => name,
    }
}

/// Rejected resource names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidResource {
    #[error("resource name is empty")]
    Empty,
    #[error("resource path {0:?} contains a relative segment")]
    RelativeSegment(String),
}

/// Normalized absolute path of a protected resource's lock directory
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Normalize a resource name into an absolute directory path.
    ///
    /// A leading separator is added when missing, and empty segments
    /// (doubled or trailing separators) are dropped. The tree root is not a
    /// valid resource.
    pub fn parse(raw: &str) -> Result<Self, InvalidResource> {
        let segments: Vec<&str> = raw
            .split(PATH_SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.is_empty() {
            return Err(InvalidResource::Empty);
        }
        if segments.iter().any(|s| *s == "." || *s == "..") {
            return Err(InvalidResource::RelativeSegment(raw.to_string()));
        }

        Ok(Self(format!("/{}", segments.join("/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix handed to the service when registering a node of `kind`
    pub fn node_prefix(&self, kind: LockKind) -> String {
        self.child(kind.prefix())
    }

    /// Full path of a child of this directory
    pub fn child(&self, name: &str) -> String {
        format!("{}{}{}", self.0, PATH_SEPARATOR, name)
    }

    /// Name of `node_path` relative to this directory, if it is a direct child
    pub fn child_name<'a>(&self, node_path: &'a str) -> Option<&'a str> {
        node_path
            .strip_prefix(self.0.as_str())?
            .strip_prefix(PATH_SEPARATOR)
            .filter(|name| !name.is_empty() && !name.contains(PATH_SEPARATOR))
    }

    /// Every directory from the top of the tree down to this one, in creation order
    pub fn ancestors(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut current = String::new();
        for segment in self.0.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
            current.push(PATH_SEPARATOR);
            current.push_str(segment);
            paths.push(current.clone());
        }
        paths
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
