// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]
#![allow(deprecated)]

use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

/// Command for the treelock binary with logging silenced
pub fn treelock() -> Command {
    let mut cmd = Command::cargo_bin("treelock").expect("treelock binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Write a TOML lock config to a temp file that lives as long as the handle
pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp config");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp config");
    file
}

/// Run a command and parse its stdout as JSON
pub fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("Failed to run treelock");
    assert!(
        output.status.success(),
        "treelock failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}
