//! Persisted activation set: `{"active_apps": [...]}`.
//!
//! Writes are whole-file rewrites through a temp file in the same directory,
//! so a crash mid-write leaves the previous config in place. There is no
//! locking and no fsync.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// File name of the activation config inside the descriptor directory.
pub const CONFIG_FILE_NAME: &str = "tool_config.json";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationConfig {
    #[serde(default)]
    pub active_apps: BTreeSet<String>,
}

/// Read the activation set. A missing file is an empty set.
pub fn load_active_apps(path: &Path) -> Result<BTreeSet<String>> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("reading {}", path.display()));
        }
    };
    let config: ActivationConfig =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(config.active_apps)
}

/// Replace the config file with `active`, sorted.
pub fn save_active_apps(path: &Path, active: &BTreeSet<String>) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("creating config directory {}", parent.display()))?;

    let config = ActivationConfig {
        active_apps: active.clone(),
    };
    let mut file = NamedTempFile::new_in(parent).context("create config temp file")?;
    serde_json::to_writer_pretty(&mut file, &config)?;
    file.write_all(b"\n")?;
    file.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
