//! The exposed tool set: a dispatch table from tool identifier to target.
//!
//! A tool never carries behavior of its own. Calling one looks the target up
//! here and hands it to the bridge, which synthesizes and runs the script.

use crate::naming::FunctionId;
use crate::registry::{AccessorEntry, CommandEntry};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolTarget {
    /// A descriptor command, by its original name.
    Command { command: String },
    /// A derived zero-argument resource query.
    Accessor { query: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub id: FunctionId,
    pub app: String,
    pub target: ToolTarget,
    pub description: String,
}

impl Tool {
    pub fn for_command(entry: &CommandEntry) -> Self {
        Self {
            id: entry.function_id.clone(),
            app: entry.app.clone(),
            target: ToolTarget::Command {
                command: entry.command.clone(),
            },
            description: entry.tool_description(),
        }
    }

    pub fn for_accessor(accessor: &AccessorEntry) -> Self {
        Self {
            id: accessor.function_id.clone(),
            app: accessor.app.clone(),
            target: ToolTarget::Accessor {
                query: accessor.query.clone(),
            },
            description: accessor.description.clone(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ToolSet {
    tools: BTreeMap<FunctionId, Tool>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `tool`, replacing a previous tool of the same application.
    /// A tool owned by another application is left in place. Returns true
    /// when the identifier was not exposed before.
    pub fn expose(&mut self, tool: Tool) -> bool {
        match self.tools.get(&tool.id) {
            Some(current) if current.app != tool.app => false,
            Some(_) => {
                self.tools.insert(tool.id.clone(), tool);
                false
            }
            None => {
                self.tools.insert(tool.id.clone(), tool);
                true
            }
        }
    }

    /// Withdraw every tool owned by `app`; returns how many were removed.
    ///
    /// Ownership is the recorded application, not an identifier prefix, so
    /// `Mail` and `Mail Pro` never interfere.
    pub fn withdraw_app(&mut self, app: &str) -> usize {
        let before = self.tools.len();
        self.tools.retain(|_, tool| tool.app != app);
        before - self.tools.len()
    }

    pub fn clear(&mut self) {
        self.tools.clear();
    }

    pub fn get(&self, id: &str) -> Option<&Tool> {
        self.tools.get(&FunctionId(id.to_string()))
    }

    pub fn contains(&self, id: &FunctionId) -> bool {
        self.tools.contains_key(id)
    }

    pub fn ids(&self) -> BTreeSet<FunctionId> {
        self.tools.keys().cloned().collect()
    }

    /// Applications owning at least one exposed tool.
    pub fn owners(&self) -> BTreeSet<String> {
        self.tools.values().map(|tool| tool.app.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
