//! Loads descriptor files from a directory.
//!
//! Loading never aborts on a single bad file: each failure is logged, recorded
//! in the batch with its path, and the remaining files are still read.

use crate::descriptor::model::Descriptor;
use crate::descriptor::schema::validate_descriptor_value;
use crate::error::BridgeError;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A descriptor file that contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorError {
    pub path: PathBuf,
    pub message: String,
}

impl From<DescriptorError> for BridgeError {
    fn from(err: DescriptorError) -> Self {
        BridgeError::DescriptorParse {
            path: err.path,
            message: err.message,
        }
    }
}

/// Every descriptor that parsed, keyed by application name, plus the files
/// that did not.
#[derive(Debug, Default)]
pub struct DescriptorBatch {
    pub descriptors: BTreeMap<String, Descriptor>,
    pub errors: Vec<DescriptorError>,
}

impl DescriptorBatch {
    fn skip(&mut self, error: DescriptorError) {
        warn!(error = %BridgeError::from(error.clone()), "skipping descriptor");
        self.errors.push(error);
    }
}

/// Directory of `*.json` descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    dir: PathBuf,
    ignored: Vec<PathBuf>,
}

impl DescriptorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ignored: Vec::new(),
        }
    }

    /// Skip a file that shares the directory but is not a descriptor (the
    /// activation config usually lives next to the descriptors).
    pub fn ignoring(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignored.push(path.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Parse every descriptor in the directory.
    ///
    /// Files are visited in sorted order, so when two files claim the same
    /// application the first one wins deterministically.
    pub fn load_all(&self) -> DescriptorBatch {
        let mut batch = DescriptorBatch::default();
        let files = match self.descriptor_files() {
            Ok(files) => files,
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %format!("{err:#}"), "descriptor directory unavailable");
                return batch;
            }
        };

        for path in files {
            match load_descriptor(&path) {
                Ok(descriptor) => {
                    let app = descriptor.application_name.clone();
                    if batch.descriptors.contains_key(&app) {
                        let message = format!("duplicate descriptor for application '{app}'");
                        batch.skip(DescriptorError { path, message });
                        continue;
                    }
                    debug!(app = %app, path = %path.display(), commands = descriptor.command_count(), "loaded descriptor");
                    batch.descriptors.insert(app, descriptor);
                }
                Err(err) => batch.skip(DescriptorError {
                    path,
                    message: format!("{err:#}"),
                }),
            }
        }
        batch
    }

    /// Locate the descriptor for one application without keeping the rest.
    pub fn find_by_app_name(&self, app: &str) -> Option<Descriptor> {
        let files = self.descriptor_files().ok()?;
        for path in files {
            match load_descriptor(&path) {
                Ok(descriptor) if descriptor.application_name == app => return Some(descriptor),
                Ok(_) => {}
                Err(err) => {
                    debug!(path = %path.display(), error = %format!("{err:#}"), "ignoring unreadable descriptor during lookup");
                }
            }
        }
        None
    }

    fn descriptor_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("reading descriptor directory {}", self.dir.display()))?;
        let ignored: Vec<PathBuf> = self.ignored.iter().map(|p| canonical_or_self(p)).collect();
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if ignored.contains(&canonical_or_self(&path)) {
                continue;
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }
}

/// Read, schema-check and deserialize one descriptor file.
pub fn load_descriptor(path: &Path) -> Result<Descriptor> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    validate_descriptor_value(&value).with_context(|| format!("validating {}", path.display()))?;
    let descriptor: Descriptor = serde_json::from_value(value)
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(descriptor)
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
