use anyhow::{Context, Result};
use osabridge::{Bridge, BridgeConfig, ScriptExecutor, ScriptOutput, load_active_apps};
use serde_json::{Value, json};
use std::collections::{BTreeSet, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

/// Temporary descriptor directory with its activation config.
pub struct Workspace {
    temp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(temp.path().join("apis")).expect("failed to create apis dir");
        Self { temp }
    }

    pub fn apis_dir(&self) -> PathBuf {
        self.temp.path().join("apis")
    }

    pub fn config_path(&self) -> PathBuf {
        self.apis_dir().join("tool_config.json")
    }

    pub fn config(&self) -> BridgeConfig {
        BridgeConfig::new(self.apis_dir())
    }

    pub fn write_descriptor(&self, file_name: &str, descriptor: &Value) -> PathBuf {
        let path = self.apis_dir().join(file_name);
        fs::write(&path, serde_json::to_vec_pretty(descriptor).unwrap())
            .expect("failed to write descriptor");
        path
    }

    pub fn write_raw(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.apis_dir().join(file_name);
        fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn write_config(&self, apps: &[&str]) {
        let config = json!({ "active_apps": apps });
        fs::write(self.config_path(), serde_json::to_vec(&config).unwrap())
            .expect("failed to write config");
    }

    pub fn persisted(&self) -> Result<BTreeSet<String>> {
        load_active_apps(&self.config_path()).context("reading persisted activation set")
    }

    pub fn bridge(&self) -> (Bridge<FakeExecutor>, FakeExecutor) {
        let executor = FakeExecutor::default();
        let bridge = Bridge::with_executor(self.config(), executor.clone());
        (bridge, executor)
    }
}

#[derive(Default)]
struct Recorded {
    scripts: Vec<String>,
    responses: VecDeque<ScriptOutput>,
}

/// Records every script and replays queued responses. With nothing queued
/// each run succeeds with empty output.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    inner: Arc<Mutex<Recorded>>,
}

impl FakeExecutor {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn respond(&self, exit_code: i32, stdout: &str, stderr: &str) {
        self.lock().responses.push_back(ScriptOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        });
    }

    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    pub fn last_script(&self) -> String {
        self.lock()
            .scripts
            .last()
            .cloned()
            .expect("no script was executed")
    }
}

impl ScriptExecutor for FakeExecutor {
    fn run(&self, script: &str) -> Result<ScriptOutput> {
        let mut recorded = self.lock();
        recorded.scripts.push(script.to_string());
        Ok(recorded.responses.pop_front().unwrap_or(ScriptOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}

pub fn test_app_descriptor() -> Value {
    json!({
        "applicationName": "TestApp",
        "suites": [{
            "name": "Standard Suite",
            "commands": [
                {
                    "name": "test-command",
                    "description": "Test command description",
                    "parameters": [
                        {"name": "param1", "required": true},
                        {"name": "param2", "required": false, "default": "default_value"}
                    ]
                },
                {"name": "quit", "description": "Quit the application", "result": {}}
            ],
            "classes": [
                {"name": "window", "properties": [{"name": "name"}, {"name": "bounds"}]}
            ]
        }]
    })
}

pub fn calendar_descriptor() -> Value {
    json!({
        "applicationName": "Calendar",
        "version": "14.0",
        "suites": [
            {
                "name": "Standard Suite",
                "commands": [
                    {"name": "close", "parameters": [{"name": "saving", "type": "save options", "optional": true}],
                     "direct_parameter": {"type": "specifier", "optional": false}},
                    {"name": "quit"}
                ],
                "classes": [
                    {"name": "application", "properties": [
                        {"name": "name", "type": "text", "access": "r"},
                        {"name": "frontmost", "type": "boolean", "access": "r"},
                        {"name": "version", "type": "text", "access": "r"}
                    ]},
                    {"name": "window", "plural": "", "properties": [{"name": "name"}]}
                ]
            },
            {
                "name": "iCal",
                "commands": [
                    {"name": "make new event", "description": "Create a calendar event",
                     "parameters": [
                        {"name": "at", "required": true},
                        {"name": "with properties", "required": false},
                        {"name": "in", "required": false, "default": "Home"}
                     ],
                     "result": {"type": "event"}},
                    {"name": "switch view", "parameters": [{"name": "to", "required": true}]}
                ],
                "classes": [
                    {"name": "calendar", "properties": [{"name": "name"}, {"name": "color"}]},
                    {"name": "event", "plural": "events", "properties": [{"name": "summary"}, {"name": "start date"}]},
                    {"name": "category"}
                ]
            }
        ]
    })
}

pub fn mail_descriptor(app: &str) -> Value {
    json!({
        "applicationName": app,
        "suites": [{
            "name": "Mail",
            "commands": [
                {"name": "check for new mail", "parameters": [{"name": "for", "required": false}]},
                {"name": "send"}
            ],
            "classes": [{"name": "mailbox", "plural": "mailboxes"}]
        }]
    })
}
