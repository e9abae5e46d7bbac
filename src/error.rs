//! Typed outcomes returned across the public bridge surface.
//!
//! Internal plumbing (file IO, config parsing) works with `anyhow::Result`;
//! anything a caller of [`crate::Bridge`] can observe is one of the variants
//! below. Nothing here panics and nothing is retried automatically.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// What a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    App(String),
    Command { app: String, command: String },
    Tool(String),
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFound::App(app) => write!(
                f,
                "Application '{app}' not found. Use list_apps to see available apps."
            ),
            NotFound::Command { app, command } => {
                write!(f, "Command '{command}' not found for application '{app}'.")
            }
            NotFound::Tool(id) => write!(f, "Tool '{id}' is not exposed."),
        }
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Error: {0}")]
    NotFound(NotFound),
    #[error("Error: unable to load descriptor {}: {message}", .path.display())]
    DescriptorParse { path: PathBuf, message: String },
    #[error("Error: {message}{}", suggestion_suffix(.suggestion))]
    ExecutionFailed {
        message: String,
        suggestion: Option<&'static str>,
    },
    #[error("Error: unable to persist {}: {message}", .path.display())]
    Persistence { path: PathBuf, message: String },
    #[error("Error: {0}")]
    InvalidArguments(String),
}

impl BridgeError {
    /// Wrap executor stderr, attaching a hint when the text looks familiar.
    pub fn execution_failed(stderr: &str) -> Self {
        let message = stderr.trim().to_string();
        let suggestion = suggestion_for(&message);
        BridgeError::ExecutionFailed {
            message,
            suggestion,
        }
    }

    pub fn app_not_found(app: &str) -> Self {
        BridgeError::NotFound(NotFound::App(app.to_string()))
    }

    pub fn command_not_found(app: &str, command: &str) -> Self {
        BridgeError::NotFound(NotFound::Command {
            app: app.to_string(),
            command: command.to_string(),
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::NotFound(_))
    }
}

fn suggestion_suffix(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(hint) => format!("\nSuggestion: {hint}"),
        None => String::new(),
    }
}

// Substring table checked in order; the first match wins.
const SUGGESTIONS: &[(&[&str], &str)] = &[
    (
        &["syntax error"],
        "Check the command and parameter names against the application's scripting dictionary.",
    ),
    (
        &["invalid date"],
        "Pass dates as AppleScript date strings, e.g. \"Monday, January 1, 2024 at 9:00:00 AM\".",
    ),
    (
        &["not authorized", "not allowed to send"],
        "Grant automation permission for this application in System Settings > Privacy & Security.",
    ),
    (
        &["not found", "can't get"],
        "Verify the application is installed and the referenced object exists.",
    ),
];

/// Best-effort hint keyed on case-insensitive substrings of executor stderr.
pub fn suggestion_for(stderr: &str) -> Option<&'static str> {
    let lowered = stderr.to_lowercase();
    SUGGESTIONS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lowered.contains(needle)))
        .map(|(_, hint)| *hint)
}
