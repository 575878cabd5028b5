// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! treelock-core: pure building blocks of the tree lock protocol
//!
//! This crate provides:
//! - Contention node naming and resource path normalization
//! - Sibling set ordering by sequence suffix
//! - Read and write eligibility policies
//! - Lock configuration and a testable clock

pub mod clock;
pub mod config;
pub mod naming;
pub mod policy;
pub mod siblings;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, LockConfig};
pub use naming::{
    sequence_of, InvalidResource, LockKind, ResourcePath, LOCK_ID_SPLIT, MAX_RETRY_COUNT,
    NODE_SEPARATOR, PATH_SEPARATOR, READ_LOCK_PREFIX, WRITE_LOCK_PREFIX,
};
pub use policy::{standing, LockPolicy, ReadPolicy, Standing, WritePolicy};
pub use siblings::SiblingSet;
