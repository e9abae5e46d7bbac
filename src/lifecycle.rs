//! Activation lifecycle: Unknown → Known-Inactive → Active.
//!
//! Every transition updates the activation set, persists it right away, and
//! then brings the exposed tool set in line with it. Registry entries are
//! created on first activation and survive deactivation.

use crate::activation::save_active_apps;
use crate::bridge::Bridge;
use crate::descriptor::Descriptor;
use crate::error::BridgeError;
use crate::resources::{derived_accessors, describe_resources};
use crate::script::ScriptExecutor;
use crate::tools::Tool;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Human-readable acknowledgement of a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Confirmation(pub String);

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<E: ScriptExecutor> Bridge<E> {
    pub fn activate(&mut self, app: &str) -> Result<Confirmation, BridgeError> {
        let fresh = self.store.find_by_app_name(app);
        if fresh.is_none() && !self.known_apps().contains(app) {
            return Err(BridgeError::app_not_found(app));
        }

        self.state.active.insert(app.to_string());
        self.persist();
        self.enable(app, fresh);
        info!(app, tools = self.state.tools.len(), "activated application");
        self.verify("activate");
        Ok(Confirmation(format!("Activated {app}")))
    }

    pub fn deactivate(&mut self, app: &str) -> Result<Confirmation, BridgeError> {
        if !self.known_apps().contains(app) && !self.state.active.contains(app) {
            return Err(BridgeError::app_not_found(app));
        }

        self.state.active.remove(app);
        self.persist();
        let withdrawn = self.state.tools.withdraw_app(app);
        info!(app, withdrawn, "deactivated application");
        self.verify("deactivate");
        Ok(Confirmation(format!("Deactivated {app}")))
    }

    /// Activate every known application with a single config write.
    pub fn activate_all(&mut self) -> Confirmation {
        let batch = self.store.load_all();
        for (app, descriptor) in batch.descriptors {
            self.state.descriptors.insert(app, descriptor);
        }

        let known = self.known_apps();
        self.state.active.extend(known.iter().cloned());
        self.persist();
        for app in &known {
            self.enable(app, None);
        }
        info!(
            active = self.state.active.len(),
            tools = self.state.tools.len(),
            "activated all applications"
        );
        self.verify("activate_all");
        Confirmation("Activated all applications".to_string())
    }

    /// Deactivate everything with a single config write.
    pub fn deactivate_all(&mut self) -> Confirmation {
        self.state.active.clear();
        self.persist();
        self.state.tools.clear();
        info!("deactivated all applications");
        self.verify("deactivate_all");
        Confirmation("Deactivated all applications".to_string())
    }

    pub fn list_active_apps(&self) -> Vec<String> {
        self.state.active.iter().cloned().collect()
    }

    /// Known applications that are not active.
    pub fn list_inactive_apps(&self) -> Vec<String> {
        self.known_apps()
            .into_iter()
            .filter(|app| !self.state.active.contains(app))
            .collect()
    }

    /// Compare the exposed tools with the registry entries of active
    /// applications. Returns one line per discrepancy.
    pub fn check_invariants(&self) -> Vec<String> {
        let registry = &self.state.registry;
        let expected: BTreeSet<_> = self
            .state
            .active
            .iter()
            .flat_map(|app| registry.function_ids(app))
            .collect();
        let exposed = self.state.tools.ids();

        let mut violations = Vec::new();
        for id in expected.difference(&exposed) {
            violations.push(format!("{id} belongs to an active application but is not exposed"));
        }
        for id in exposed.difference(&expected) {
            if registry.contains_function(id) {
                violations.push(format!("{id} is exposed but its application is inactive"));
            } else {
                violations.push(format!("{id} is exposed but has no registry entry"));
            }
        }
        violations
    }

    /// Register `app` from `fresh` (or the descriptor loaded earlier) and
    /// expose everything the registry holds for it.
    pub(crate) fn enable(&mut self, app: &str, fresh: Option<Descriptor>) {
        if let Some(descriptor) = fresh {
            self.state.descriptors.insert(app.to_string(), descriptor);
        }
        if let Some(descriptor) = self.state.descriptors.get(app) {
            let report = self
                .state
                .registry
                .register_commands(app, descriptor, &self.state.active);
            for message in &report.errors {
                debug!(app, %message, "registration error");
            }
            let resources = describe_resources(app, Some(descriptor));
            for accessor in derived_accessors(&resources) {
                self.state.registry.register_accessor(accessor);
            }
        } else {
            warn!(app, "no descriptor on file; exposing existing registry entries only");
        }
        self.expose(app);
    }

    fn expose(&mut self, app: &str) {
        let Some(app_entry) = self.state.registry.app_entry(app) else {
            return;
        };
        let tools: Vec<Tool> = app_entry
            .entries
            .values()
            .map(Tool::for_command)
            .chain(app_entry.accessors.values().map(Tool::for_accessor))
            .collect();
        for tool in tools {
            self.state.tools.expose(tool);
        }
    }

    /// Write the activation set. Failure is logged; in-memory state stands.
    fn persist(&self) {
        let path = &self.config.config_path;
        if let Err(err) = save_active_apps(path, &self.state.active) {
            let err = BridgeError::Persistence {
                path: path.clone(),
                message: format!("{err:#}"),
            };
            error!(error = %err, "activation set not saved");
        }
    }

    pub(crate) fn verify(&self, transition: &str) {
        for violation in self.check_invariants() {
            error!(transition, %violation, "exposed tools out of sync with activation set");
        }
    }
}
