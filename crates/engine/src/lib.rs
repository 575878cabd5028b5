// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! treelock acquisition engine
//!
//! Runs the fair read/write lock protocol against any coordination adapter:
//! register a sequential ephemeral node, wait on a predecessor until the kind
//! policy says the node holds the lock, and delete the node on release.

mod client;
mod error;
mod handle;
mod protocol;

pub use client::LockClient;
pub use error::LockError;
pub use handle::{ClusterLock, LockHandle, ReadLock, WriteLock};
pub use protocol::LockProtocol;
