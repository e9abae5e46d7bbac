//! Registry and activation engine for scriptable macOS applications.
//!
//! Each application is described by a JSON descriptor (its scripting
//! dictionary). The crate compiles descriptors into a command registry,
//! exposes the commands of *active* applications as tools, and turns tool
//! calls into AppleScript run through `osascript`. The [`Bridge`] type is the
//! entry point; the admin binary in `src/bin/osabridge.rs` is a thin shell
//! over it.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod activation;
pub mod bridge;
pub mod descriptor;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod naming;
pub mod registry;
pub mod resources;
pub mod runtime;
pub mod script;
pub mod tools;

pub use activation::{ActivationConfig, CONFIG_FILE_NAME, load_active_apps, save_active_apps};
pub use bridge::{Bridge, BridgeConfig, BridgeState, SharedBridge, render_outcome};
pub use descriptor::{Descriptor, DescriptorBatch, DescriptorError, DescriptorStore};
pub use error::{BridgeError, NotFound};
pub use lifecycle::Confirmation;
pub use naming::{FunctionId, ParamNameMap, build_function_id, sanitize, sanitize_param};
pub use registry::{CommandEntry, CommandInfo, CommandRegistry};
pub use resources::{ResourceDescriptor, pluralize};
pub use script::{OsascriptExecutor, Parameters, ScriptExecutor, ScriptOutput, synthesize};
pub use tools::{Tool, ToolSet, ToolTarget};

/// Conventional name of the descriptor directory.
pub const APIS_DIR_NAME: &str = "applescript_apis";

const APIS_DIR_ENV: &str = "OSABRIDGE_APIS_DIR";

fn apis_dir_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.trim().is_empty() {
        return None;
    }
    let path = PathBuf::from(hint);
    path.is_dir().then_some(path)
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        let candidate = dir.join(APIS_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the descriptor directory.
///
/// An explicit path wins. Otherwise `OSABRIDGE_APIS_DIR` is honored when it
/// names a directory, then `applescript_apis/` is searched for from the
/// working directory upwards and from the executable upwards. When nothing
/// is found the relative default is returned; a missing directory simply
/// means no descriptors.
pub fn find_apis_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(hint) = env::var(APIS_DIR_ENV) {
        if let Some(dir) = apis_dir_from_hint(&hint) {
            return dir;
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(dir) = search_upwards(&cwd) {
            return dir;
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if let Some(dir) = search_upwards(exe_dir) {
                return dir;
            }
        }
    }

    PathBuf::from(APIS_DIR_NAME)
}

/// The activation config that lives beside the descriptors.
pub fn default_config_path(apis_dir: &Path) -> PathBuf {
    apis_dir.join(CONFIG_FILE_NAME)
}

/// Parse a JSON object of call parameters.
///
/// Empty input is an empty map. Anything other than an object is rejected
/// so a stray array or scalar never reaches the synthesizer.
pub fn parse_parameters(input: &str) -> Result<Parameters> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Parameters::new());
    }
    let value: Value = serde_json::from_str(trimmed).context("Unable to parse parameters as JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("Unsupported parameters; expected a JSON object"),
    }
}
