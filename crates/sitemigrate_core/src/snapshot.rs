use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::content::Site;

pub const SNAPSHOT_FILENAME: &str = "site-snapshot.json";

/// Persist the whole site aggregate as pretty-printed JSON. Written twice
/// per run: once before the slow network phase as a checkpoint, once at
/// the end with the diagnostic lists filled in.
pub fn write_snapshot(site: &Site, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(site).context("failed to serialize site snapshot")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

pub fn read_snapshot(path: &Path) -> Result<Site> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
