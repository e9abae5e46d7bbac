//! Host lookups shared by the executor and the CLI.
//!
//! Centralizes executable detection and PATH resolution so the script
//! executor and the admin binary agree on which `osascript` they run.

use std::env;
use std::path::{Path, PathBuf};

/// Default executor program on macOS.
pub const OSASCRIPT: &str = "osascript";

/// Returns true when a file exists and has any execute bit set.
pub fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(path) {
            return meta.permissions().mode() & 0o111 != 0;
        }
        false
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Find an executable by name somewhere on PATH.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    for dir in env::split_paths(&paths) {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Resolve the script executor program.
///
/// An explicit path wins untouched; otherwise `osascript` is looked up on
/// PATH, falling back to the bare name so the spawn error names the program.
pub fn resolve_executor_program(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    find_on_path(OSASCRIPT).unwrap_or_else(|| PathBuf::from(OSASCRIPT))
}
