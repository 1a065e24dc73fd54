// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Reading and writing the deployment config document.
//!
//! Two load paths with different failure philosophies:
//!
//! - [`load`] is strict: a missing file or unparseable document is an error
//!   the caller must face. Operational tooling wants this — a nightly tuner
//!   should not quietly run against defaults because someone fat-fingered
//!   a path.
//! - [`load_or_default`] is forgiving: anything short of a well-formed file
//!   yields the default configuration, sanitized. The query path wants this
//!   — search must keep working with whatever weights it can get.
//!
//! The wire format is pretty-printed JSON with lexicographically sorted
//! object keys and ISO-8601 UTC timestamps. Sorting comes from serializing
//! through `serde_json::Value`, whose object map keeps keys in order — the
//! same document always produces the same bytes, which keeps configs
//! diffable in review.

use super::{DeployError, DeploymentConfig};
use std::fs;
use std::io;
use std::path::Path;

/// Strict load: missing file and parse failures are surfaced.
///
/// The parsed document is sanitized before it is returned.
pub fn load(path: &Path) -> Result<DeploymentConfig, DeployError> {
    if !path.exists() {
        return Err(DeployError::MissingFile(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)
        .map_err(|e| DeployError::Parse(format!("read {}: {e}", path.display())))?;
    let config: DeploymentConfig =
        serde_json::from_str(&content).map_err(|e| DeployError::Parse(e.to_string()))?;
    Ok(config.sanitize())
}

/// Forgiving load: any failure yields the sanitized default config.
pub fn load_or_default(path: &Path) -> DeploymentConfig {
    load(path).unwrap_or_else(|_| DeploymentConfig::default().sanitize())
}

/// Serialize a config to the canonical wire form.
///
/// Round-trips through `serde_json::Value` so object keys come out sorted.
pub fn to_canonical_json(config: &DeploymentConfig) -> String {
    let value = serde_json::to_value(config)
        .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

/// Write a config in canonical form, creating parent directories as needed.
pub fn save(path: &Path, config: &DeploymentConfig) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_canonical_json(config))
}
