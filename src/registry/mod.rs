//! Catalog of applications and the commands compiled from their descriptors.
//!
//! The registry is independent of exposure: entries stay put when an
//! application is deactivated, and re-registering the same descriptor
//! overwrites entries in place instead of duplicating them. Population is
//! gated on the activation set passed in by the caller.

pub mod entry;

pub use entry::{AccessorEntry, CommandEntry, CommandInfo, DIRECT_PARAMETER, ParamSpec};

use crate::descriptor::Descriptor;
use crate::error::BridgeError;
use crate::naming::FunctionId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone)]
/// Everything the registry knows about one application.
pub struct AppEntry {
    /// Original command names in first-registration order.
    pub commands: Vec<String>,
    pub entries: BTreeMap<String, CommandEntry>,
    pub accessors: BTreeMap<FunctionId, AccessorEntry>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Outcome of one `register_commands` pass.
pub struct RegistrationReport {
    pub registered: usize,
    pub skipped_inactive: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    apps: BTreeMap<String, AppEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and record every command of `descriptor` for `app`.
    ///
    /// Does nothing unless `app` is in `active`. A command that fails to
    /// compile is logged and reported without stopping its siblings.
    pub fn register_commands(
        &mut self,
        app: &str,
        descriptor: &Descriptor,
        active: &BTreeSet<String>,
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        if !active.contains(app) {
            info!(app, "skipping registration for inactive application");
            report.skipped_inactive = true;
            return report;
        }

        for command in descriptor.all_commands() {
            match CommandEntry::compile(app, command) {
                Ok(mut entry) => {
                    let id = self.free_function_id(&entry);
                    if id != entry.function_id {
                        warn!(app, command = %entry.command, taken = %entry.function_id, function = %id, "function identifier already in use");
                        entry.function_id = id;
                    }
                    let app_entry = self.apps.entry(app.to_string()).or_default();
                    if !app_entry.commands.contains(&entry.command) {
                        app_entry.commands.push(entry.command.clone());
                    }
                    debug!(app, command = %entry.command, function = %entry.function_id, "registered command");
                    app_entry.entries.insert(entry.command.clone(), entry);
                    report.registered += 1;
                }
                Err(err) => {
                    let name = command.name.as_deref().unwrap_or("<unnamed>");
                    let message = format!("Error registering command {name}: {err:#}");
                    warn!(app, %message, "skipping command");
                    report.errors.push(message);
                }
            }
        }

        info!(
            app,
            registered = report.registered,
            errors = report.errors.len(),
            "registered commands"
        );
        report
    }

    /// The identifier `entry` should register under: its own, with `_`
    /// markers appended while another command or an accessor holds it.
    /// Re-registering a command keeps the identifier it got the first time.
    fn free_function_id(&self, entry: &CommandEntry) -> FunctionId {
        if let Ok(existing) = self.entry(&entry.app, &entry.command) {
            if !self.held_elsewhere(&existing.function_id, &entry.app, &entry.command) {
                return existing.function_id.clone();
            }
        }
        let mut id = entry.function_id.clone();
        while self.held_elsewhere(&id, &entry.app, &entry.command) {
            id.0.push('_');
        }
        id
    }

    fn held_elsewhere(&self, id: &FunctionId, app: &str, command: &str) -> bool {
        let by_command = self.apps.iter().any(|(owner, app_entry)| {
            app_entry
                .entries
                .values()
                .any(|other| &other.function_id == id && (owner != app || other.command != command))
        });
        by_command || self.accessor(id).is_some()
    }

    /// Record a derived accessor unless its identifier is already taken.
    /// Returns whether the accessor was added.
    pub fn register_accessor(&mut self, accessor: AccessorEntry) -> bool {
        if self.contains_function(&accessor.function_id) {
            debug!(function = %accessor.function_id, "accessor already registered");
            return false;
        }
        let app_entry = self.apps.entry(accessor.app.clone()).or_default();
        app_entry
            .accessors
            .insert(accessor.function_id.clone(), accessor);
        true
    }

    /// Sorted names of every application with registry entries.
    pub fn list_apps(&self) -> Vec<String> {
        self.apps.keys().cloned().collect()
    }

    pub fn list_commands(&self, app: &str) -> Result<Vec<String>, BridgeError> {
        let app_entry = self
            .apps
            .get(app)
            .ok_or_else(|| BridgeError::app_not_found(app))?;
        let mut commands = app_entry.commands.clone();
        commands.sort();
        Ok(commands)
    }

    pub fn describe_command(&self, app: &str, command: &str) -> Result<CommandInfo, BridgeError> {
        let entry = self.entry(app, command)?;
        Ok(CommandInfo {
            app_name: entry.app.clone(),
            command_name: entry.command.clone(),
            description: entry.description.clone(),
            function_name: entry.function_id.0.clone(),
        })
    }

    pub fn entry(&self, app: &str, command: &str) -> Result<&CommandEntry, BridgeError> {
        let app_entry = self
            .apps
            .get(app)
            .ok_or_else(|| BridgeError::app_not_found(app))?;
        app_entry
            .entries
            .get(command)
            .ok_or_else(|| BridgeError::command_not_found(app, command))
    }

    pub fn app_entry(&self, app: &str) -> Option<&AppEntry> {
        self.apps.get(app)
    }

    /// Look a command entry up by its function identifier.
    pub fn command_by_function(&self, id: &FunctionId) -> Option<&CommandEntry> {
        self.apps
            .values()
            .flat_map(|app| app.entries.values())
            .find(|entry| &entry.function_id == id)
    }

    pub fn accessor(&self, id: &FunctionId) -> Option<&AccessorEntry> {
        self.apps.values().find_map(|app| app.accessors.get(id))
    }

    pub fn contains_function(&self, id: &FunctionId) -> bool {
        self.command_by_function(id).is_some() || self.accessor(id).is_some()
    }

    /// Every function identifier owned by `app`, commands and accessors.
    pub fn function_ids(&self, app: &str) -> BTreeSet<FunctionId> {
        let Some(app_entry) = self.apps.get(app) else {
            return BTreeSet::new();
        };
        app_entry
            .entries
            .values()
            .map(|entry| entry.function_id.clone())
            .chain(app_entry.accessors.keys().cloned())
            .collect()
    }

    pub fn command_count(&self) -> usize {
        self.apps.values().map(|app| app.entries.len()).sum()
    }
}
