//! The bridge facade: one owned state plus the executor.
//!
//! Discovery and invocation borrow the state; activation transitions (see
//! `lifecycle.rs`) mutate it. Hosts that need to share a bridge across
//! threads wrap it in [`SharedBridge`].

use crate::activation::{CONFIG_FILE_NAME, load_active_apps};
use crate::descriptor::{Descriptor, DescriptorStore};
use crate::error::{BridgeError, NotFound};
use crate::naming::ParamNameMap;
use crate::registry::{CommandEntry, CommandInfo, CommandRegistry, DIRECT_PARAMETER};
use crate::resources::{ResourceDescriptor, describe_resources};
use crate::script::{
    Invocation, OsascriptExecutor, Parameters, ScriptExecutor, execute, synthesize,
};
use crate::tools::{Tool, ToolSet, ToolTarget};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

/// Where descriptors and the activation config live, and which program runs
/// scripts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    pub apis_dir: PathBuf,
    pub config_path: PathBuf,
    /// `None` looks `osascript` up on PATH.
    pub osascript: Option<PathBuf>,
}

impl BridgeConfig {
    /// Config with the activation file inside `apis_dir`.
    pub fn new(apis_dir: impl Into<PathBuf>) -> Self {
        let apis_dir = apis_dir.into();
        let config_path = apis_dir.join(CONFIG_FILE_NAME);
        Self {
            apis_dir,
            config_path,
            osascript: None,
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    pub fn with_osascript(mut self, program: impl Into<PathBuf>) -> Self {
        self.osascript = Some(program.into());
        self
    }
}

/// Everything the bridge knows, in one place.
#[derive(Debug, Default)]
pub struct BridgeState {
    pub descriptors: BTreeMap<String, Descriptor>,
    pub registry: CommandRegistry,
    pub active: BTreeSet<String>,
    pub tools: ToolSet,
}

pub struct Bridge<E = OsascriptExecutor> {
    pub(crate) config: BridgeConfig,
    pub(crate) store: DescriptorStore,
    pub(crate) state: BridgeState,
    pub(crate) executor: E,
}

impl Bridge<OsascriptExecutor> {
    /// Load config and descriptors and run scripts through `osascript`.
    pub fn initialize(config: BridgeConfig) -> Self {
        let executor = OsascriptExecutor::new(config.osascript.as_deref());
        Self::with_executor(config, executor)
    }
}

impl<E: ScriptExecutor> Bridge<E> {
    /// Start-up sequence: activation set, descriptors, then registration and
    /// exposure of every active application.
    ///
    /// Nothing here is fatal. An unreadable activation config is logged and
    /// treated as empty; bad descriptors are logged and skipped.
    pub fn with_executor(config: BridgeConfig, executor: E) -> Self {
        let active = match load_active_apps(&config.config_path) {
            Ok(active) => active,
            Err(err) => {
                let err = BridgeError::Persistence {
                    path: config.config_path.clone(),
                    message: format!("{err:#}"),
                };
                error!(error = %err, "ignoring activation config");
                BTreeSet::new()
            }
        };

        let store = DescriptorStore::new(&config.apis_dir).ignoring(&config.config_path);
        let batch = store.load_all();
        if !batch.errors.is_empty() {
            warn!(
                skipped = batch.errors.len(),
                dir = %config.apis_dir.display(),
                "some descriptors could not be loaded"
            );
        }

        let state = BridgeState {
            descriptors: batch.descriptors,
            active,
            ..Default::default()
        };
        let mut bridge = Self::from_state(config, state, executor);

        let active: Vec<String> = bridge.state.active.iter().cloned().collect();
        for app in &active {
            if bridge.state.descriptors.contains_key(app) {
                bridge.enable(app, None);
            } else {
                warn!(app = %app, "active application has no descriptor; keeping it in the activation set");
            }
        }

        info!(
            apps = bridge.state.descriptors.len(),
            commands = bridge.state.registry.command_count(),
            active = bridge.state.active.len(),
            tools = bridge.state.tools.len(),
            "bridge initialized"
        );
        bridge.verify("initialize");
        bridge
    }

    /// Wrap an already-built state. Nothing is loaded or registered.
    pub fn from_state(config: BridgeConfig, state: BridgeState, executor: E) -> Self {
        let store = DescriptorStore::new(&config.apis_dir).ignoring(&config.config_path);
        Self {
            config,
            store,
            state,
            executor,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Every known application: descriptors on file plus anything registered.
    pub fn list_apps(&self) -> Vec<String> {
        self.known_apps().into_iter().collect()
    }

    pub fn list_commands(&self, app: &str) -> Result<Vec<String>, BridgeError> {
        self.state.registry.list_commands(app)
    }

    pub fn describe_command(&self, app: &str, command: &str) -> Result<CommandInfo, BridgeError> {
        self.state.registry.describe_command(app, command)
    }

    /// Run `command` on `app` with `params` in the order given.
    ///
    /// This is the raw primitive: it is not gated on activation. When the
    /// command is registered its parameter map recovers the wire names and
    /// a `direct_parameter` key becomes the unlabeled direct parameter.
    pub fn invoke(
        &self,
        app: &str,
        command: &str,
        params: &Parameters,
    ) -> Result<String, BridgeError> {
        let script = match self.state.registry.entry(app, command) {
            Ok(entry) => {
                let mut direct = None;
                let mut clauses = Vec::with_capacity(params.len());
                for (key, value) in params {
                    if key == DIRECT_PARAMETER && entry.direct_parameter.is_some() {
                        direct = Some(value);
                    } else {
                        clauses.push((key.as_str(), value));
                    }
                }
                Invocation {
                    app,
                    target: command,
                    direct,
                    params: clauses,
                    param_map: Some(&entry.param_map),
                }
                .render()
            }
            Err(_) => synthesize(app, command, params, &ParamNameMap::new()),
        };
        execute(&self.executor, &script)
    }

    /// Call an exposed tool by identifier.
    pub fn call_tool(&self, id: &str, args: &Parameters) -> Result<String, BridgeError> {
        let tool = self
            .state
            .tools
            .get(id)
            .ok_or_else(|| BridgeError::NotFound(NotFound::Tool(id.to_string())))?;
        debug!(tool = id, app = %tool.app, "calling tool");
        match &tool.target {
            ToolTarget::Accessor { query } => {
                if !args.is_empty() {
                    return Err(BridgeError::InvalidArguments(format!(
                        "{id} takes no arguments"
                    )));
                }
                self.query(&tool.app, query)
            }
            ToolTarget::Command { command } => {
                let entry = self.state.registry.entry(&tool.app, command)?;
                let script = bind_arguments(entry, args)?.render();
                execute(&self.executor, &script)
            }
        }
    }

    /// Exposed tools, sorted by identifier.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.state.tools.iter().cloned().collect()
    }

    /// Collections, properties and example queries for `app`. Never fails.
    pub fn describe_resources(&self, app: &str) -> ResourceDescriptor {
        match self.state.descriptors.get(app) {
            Some(descriptor) => describe_resources(app, Some(descriptor)),
            None => describe_resources(app, self.store.find_by_app_name(app).as_ref()),
        }
    }

    /// Evaluate a raw resource path such as `name of calendars`.
    pub fn query(&self, app: &str, path: &str) -> Result<String, BridgeError> {
        let script = Invocation {
            app,
            target: path,
            ..Default::default()
        }
        .render();
        execute(&self.executor, &script)
    }

    pub(crate) fn known_apps(&self) -> BTreeSet<String> {
        self.state
            .descriptors
            .keys()
            .cloned()
            .chain(self.state.registry.list_apps())
            .collect()
    }
}

/// Order tool arguments by declaration and fill in defaults.
///
/// Missing required arguments are reported together. An explicit `null` for
/// an optional parameter counts as absent. Arguments the command does not
/// declare follow the declared ones untouched.
fn bind_arguments<'a>(
    entry: &'a CommandEntry,
    args: &'a Parameters,
) -> Result<Invocation<'a>, BridgeError> {
    let mut missing = Vec::new();
    let mut params: Vec<(&str, &Value)> = Vec::new();

    let direct = match entry.direct_parameter {
        Some(optional) => {
            let value = args.get(DIRECT_PARAMETER).filter(|value| !value.is_null());
            if value.is_none() && !optional {
                missing.push(DIRECT_PARAMETER);
            }
            value
        }
        None => None,
    };

    for spec in &entry.params {
        match args.get(&spec.name) {
            Some(value) if spec.required || !value.is_null() => {
                params.push((spec.name.as_str(), value));
            }
            _ if spec.required => missing.push(spec.name.as_str()),
            _ => {
                if let Some(default) = &spec.default {
                    params.push((spec.name.as_str(), default));
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(BridgeError::InvalidArguments(format!(
            "{} is missing required argument(s): {}",
            entry.function_id,
            missing.join(", ")
        )));
    }

    for (key, value) in args {
        let declared = entry.params.iter().any(|spec| &spec.name == key);
        let is_direct = key == DIRECT_PARAMETER && entry.direct_parameter.is_some();
        if !declared && !is_direct {
            params.push((key.as_str(), value));
        }
    }

    Ok(Invocation {
        app: &entry.app,
        target: &entry.command,
        direct,
        params,
        param_map: Some(&entry.param_map),
    })
}

/// Text a front end shows for any outcome.
pub fn render_outcome(outcome: Result<String, BridgeError>) -> String {
    match outcome {
        Ok(text) => text,
        Err(err) => err.to_string(),
    }
}

/// A bridge shared between threads.
///
/// Discovery and invocation take the read lock; activation transitions take
/// the write lock, so a transition never interleaves with another.
pub struct SharedBridge<E = OsascriptExecutor> {
    inner: Arc<RwLock<Bridge<E>>>,
}

impl<E> Clone for SharedBridge<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: ScriptExecutor> SharedBridge<E> {
    pub fn new(bridge: Bridge<E>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(bridge)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Bridge<E>> {
        self.inner.read().unwrap_or_else(|err| err.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Bridge<E>> {
        self.inner.write().unwrap_or_else(|err| err.into_inner())
    }
}
