// Integration suite for the bridge: descriptor loading, registration,
// activation lifecycle, tool dispatch and the admin CLI, all against a temp
// descriptor directory and a recording executor.
mod support;

use anyhow::{Result, bail};
use osabridge::{
    Bridge, BridgeError, CommandEntry, Descriptor, DescriptorStore, NotFound, ParamNameMap,
    Parameters, SharedBridge, ToolTarget, render_outcome, synthesize,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::thread;
use support::{
    FakeExecutor, Workspace, calendar_descriptor, mail_descriptor, test_app_descriptor,
};

fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

fn set(apps: &[&str]) -> BTreeSet<String> {
    apps.iter().map(|app| app.to_string()).collect()
}

fn statement(script: &str) -> &str {
    script.lines().nth(1).unwrap_or_default()
}

// One malformed, nameless or mistyped descriptor must not block the others.
#[test]
fn bad_descriptors_do_not_block_good_ones() -> Result<()> {
    let ws = Workspace::new();
    ws.write_raw("a_broken.json", "{\"applicationName\": ");
    ws.write_descriptor("b_nameless.json", &json!({"suites": []}));
    ws.write_descriptor("c_mistyped.json", &json!({"applicationName": 7}));
    ws.write_raw("notes.txt", "not a descriptor");
    ws.write_descriptor("d_test.json", &test_app_descriptor());

    let batch = DescriptorStore::new(ws.apis_dir()).load_all();
    assert_eq!(batch.descriptors.len(), 1);
    assert_eq!(batch.errors.len(), 3);
    assert!(batch.errors.iter().all(|err| !err.message.is_empty()));

    let (bridge, _) = ws.bridge();
    assert_eq!(bridge.list_apps(), vec!["TestApp"]);
    Ok(())
}

// Activating twice registers every command exactly once.
#[test]
fn activation_registers_each_command_once() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("test.json", &test_app_descriptor());
    let (mut bridge, _) = ws.bridge();

    bridge.activate("TestApp")?;
    bridge.activate("TestApp")?;
    bridge.deactivate("TestApp")?;
    bridge.activate("TestApp")?;

    assert_eq!(bridge.list_commands("TestApp")?, vec!["quit", "test-command"]);
    assert_eq!(bridge.state().registry.command_count(), 2);
    Ok(())
}

// Lookups for applications never seen are typed NotFound results.
#[test]
fn unknown_applications_are_not_found() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("test.json", &test_app_descriptor());
    let (mut bridge, _) = ws.bridge();

    let err = bridge.list_commands("Nope").unwrap_err();
    assert!(matches!(err, BridgeError::NotFound(NotFound::App(_))));
    assert_eq!(
        err.to_string(),
        "Error: Application 'Nope' not found. Use list_apps to see available apps."
    );
    assert!(bridge.describe_command("Nope", "quit").unwrap_err().is_not_found());
    assert!(bridge.activate("Nope").unwrap_err().is_not_found());
    assert!(bridge.deactivate("Nope").unwrap_err().is_not_found());

    bridge.activate("TestApp")?;
    let err = bridge.describe_command("TestApp", "nope").unwrap_err();
    assert!(matches!(err, BridgeError::NotFound(NotFound::Command { .. })));
    Ok(())
}

// Every parameter of every descriptor maps back to its original name.
#[test]
fn parameter_names_round_trip_through_the_map() -> Result<()> {
    for value in [test_app_descriptor(), calendar_descriptor(), mail_descriptor("Mail")] {
        let descriptor: Descriptor = serde_json::from_value(value)?;
        let app = descriptor.application_name.clone();
        for command in descriptor.all_commands() {
            let entry = CommandEntry::compile(&app, command)?;
            let raw: BTreeSet<String> = command
                .parameters
                .iter()
                .filter_map(|param| param.name.clone())
                .collect();
            let recovered: BTreeSet<String> = entry
                .params
                .iter()
                .map(|spec| entry.param_map.resolve(&spec.name).to_string())
                .collect();
            assert_eq!(recovered, raw, "{app}: {:?}", command.name);
            for spec in &entry.params {
                assert!(entry.param_map.original(&spec.name).is_some());
            }
        }
    }
    Ok(())
}

// The canonical synthesis example renders the expected fragments.
#[test]
fn synthesis_is_deterministic() {
    let script = synthesize(
        "TestApp",
        "test-command",
        &params(json!({"param1": "value1"})),
        &ParamNameMap::new(),
    );
    assert!(script.contains("tell application \"TestApp\""));
    assert!(script.contains("test-command"));
    assert!(script.contains("with param1 \"value1\""));
    assert_eq!(
        script,
        synthesize(
            "TestApp",
            "test-command",
            &params(json!({"param1": "value1"})),
            &ParamNameMap::new(),
        )
    );
}

// Executor failures come back as `Error: <stderr>`.
#[test]
fn invoke_formats_executor_errors() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("test.json", &test_app_descriptor());
    let (bridge, executor) = ws.bridge();

    executor.respond(1, "", "Error message");
    let outcome = bridge.invoke("TestApp", "test-command", &params(json!({"param1": "v"})));
    assert_eq!(render_outcome(outcome), "Error: Error message");

    executor.respond(1, "", "execution error: Can't get calendar \"Nope\". (-1728)\n");
    let outcome = render_outcome(bridge.invoke("TestApp", "quit", &Parameters::new()));
    assert!(outcome.starts_with("Error: execution error: Can't get calendar"));
    assert!(outcome.contains("\nSuggestion: "));

    executor.respond(0, "  done \n", "");
    assert_eq!(bridge.invoke("TestApp", "quit", &Parameters::new())?, "done");
    Ok(())
}

// Activate then deactivate restores the active set, on disk too.
#[test]
fn activation_round_trip_is_persisted() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    ws.write_descriptor("test.json", &test_app_descriptor());
    ws.write_config(&["TestApp"]);
    let (mut bridge, _) = ws.bridge();

    let before = bridge.list_active_apps();
    assert_eq!(before, vec!["TestApp"]);

    let confirmation = bridge.activate("Calendar")?;
    assert_eq!(confirmation.to_string(), "Activated Calendar");
    assert_eq!(ws.persisted()?, set(&["Calendar", "TestApp"]));

    let confirmation = bridge.deactivate("Calendar")?;
    assert_eq!(confirmation.to_string(), "Deactivated Calendar");
    assert_eq!(bridge.list_active_apps(), before);
    assert_eq!(ws.persisted()?, set(&["TestApp"]));
    assert_eq!(bridge.list_inactive_apps(), vec!["Calendar"]);
    Ok(())
}

// Exposed tools track the active set through any sequence of transitions.
#[test]
fn exposure_follows_activation() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    ws.write_descriptor("mail.json", &mail_descriptor("Mail"));
    ws.write_descriptor("test.json", &test_app_descriptor());
    let (mut bridge, _) = ws.bridge();

    let check = |bridge: &osabridge::Bridge<support::FakeExecutor>| -> Result<()> {
        let violations = bridge.check_invariants();
        if !violations.is_empty() {
            bail!("invariant violations: {violations:?}");
        }
        let active: BTreeSet<String> = bridge.list_active_apps().into_iter().collect();
        let owners = bridge.state().tools.owners();
        assert!(owners.is_subset(&active));
        for app in &active {
            let declared = bridge.state().descriptors[app].command_count();
            if declared > 0 {
                assert!(owners.contains(app), "{app} has no exposed tools");
            }
        }
        assert_eq!(ws.persisted()?, active);
        Ok(())
    };

    check(&bridge)?;
    bridge.activate("Calendar")?;
    check(&bridge)?;
    bridge.activate("Mail")?;
    check(&bridge)?;
    bridge.deactivate("Calendar")?;
    check(&bridge)?;
    bridge.activate_all();
    check(&bridge)?;
    bridge.deactivate("TestApp")?;
    check(&bridge)?;
    bridge.deactivate_all();
    check(&bridge)?;
    assert!(bridge.list_tools().is_empty());
    Ok(())
}

// Deactivating Mail leaves the tools of Mail Pro alone.
#[test]
fn deactivation_removes_only_the_owners_tools() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("mail.json", &mail_descriptor("Mail"));
    ws.write_descriptor("mail_pro.json", &mail_descriptor("Mail Pro"));
    let (mut bridge, _) = ws.bridge();

    bridge.activate("Mail")?;
    bridge.activate("Mail Pro")?;
    bridge.deactivate("Mail")?;

    let ids: Vec<String> = bridge
        .list_tools()
        .into_iter()
        .map(|tool| tool.id.to_string())
        .collect();
    assert!(ids.contains(&"mail_pro_send".to_string()));
    assert!(ids.contains(&"mail_pro_get_mailboxes".to_string()));
    assert!(!ids.contains(&"mail_send".to_string()));
    assert!(bridge.list_tools().iter().all(|tool| tool.app == "Mail Pro"));
    Ok(())
}

// Colliding identifiers from different apps stay apart across transitions.
#[test]
fn function_ids_never_collide_across_apps() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor(
        "foo.json",
        &json!({"applicationName": "Foo", "commands": [{"name": "bar x"}]}),
    );
    ws.write_descriptor(
        "foo_bar.json",
        &json!({"applicationName": "Foo Bar", "commands": [{"name": "x"}]}),
    );
    let (mut bridge, executor) = ws.bridge();

    bridge.activate("Foo")?;
    bridge.activate("Foo Bar")?;
    assert!(bridge.check_invariants().is_empty());
    assert_eq!(bridge.describe_command("Foo Bar", "x")?.function_name, "foo_bar_x_");

    bridge.deactivate("Foo Bar")?;
    assert_eq!(bridge.list_active_apps(), vec!["Foo"]);
    assert!(bridge.check_invariants().is_empty());
    bridge.call_tool("foo_bar_x", &Parameters::new())?;
    assert_eq!(statement(&executor.last_script()), "bar x");
    assert!(matches!(
        bridge.call_tool("foo_bar_x_", &Parameters::new()),
        Err(BridgeError::NotFound(NotFound::Tool(_)))
    ));
    Ok(())
}

// A null command name or plural costs only that entry, not the file.
#[test]
fn null_fields_skip_only_their_entry() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor(
        "notes.json",
        &json!({
            "applicationName": "Notes",
            "suites": [{
                "name": "Notes Suite",
                "commands": [{"name": null}, {"name": "show", "description": null}],
                "classes": [{"name": "note", "plural": null}]
            }]
        }),
    );
    let (mut bridge, _) = ws.bridge();
    assert_eq!(bridge.list_apps(), vec!["Notes"]);

    bridge.activate("Notes")?;
    assert_eq!(bridge.list_commands("Notes")?, vec!["show"]);
    let ids: Vec<String> = bridge
        .list_tools()
        .into_iter()
        .map(|tool| tool.id.to_string())
        .collect();
    assert!(ids.contains(&"notes_show".to_string()));
    assert!(ids.contains(&"notes_get_notes".to_string()));
    Ok(())
}

// A failed config write is logged; the activation still takes effect.
#[test]
fn activation_survives_an_unwritable_config() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("test.json", &test_app_descriptor());
    let blocker = ws.write_raw("blocker", "a file, not a directory");
    let config = ws.config().with_config_path(blocker.join("tool_config.json"));
    let mut bridge = Bridge::with_executor(config, FakeExecutor::default());

    assert_eq!(bridge.activate("TestApp")?.to_string(), "Activated TestApp");
    assert_eq!(bridge.list_active_apps(), vec!["TestApp"]);
    assert!(
        bridge
            .list_tools()
            .iter()
            .any(|tool| tool.id.as_str() == "testapp_test_command")
    );
    assert!(bridge.check_invariants().is_empty());

    assert_eq!(bridge.deactivate("TestApp")?.to_string(), "Deactivated TestApp");
    assert!(bridge.list_tools().is_empty());
    assert!(bridge.check_invariants().is_empty());
    Ok(())
}

// Class plurals follow the explicit plural or the suffix rules.
#[test]
fn collections_are_pluralized() {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    let (bridge, _) = ws.bridge();

    let resources = bridge.describe_resources("Calendar");
    assert_eq!(
        resources.collections,
        vec!["windows", "calendars", "events", "categories"]
    );
    assert_eq!(resources.basic_properties, vec!["name", "frontmost", "version"]);
    assert!(
        resources
            .example_queries
            .contains(&"categories whose name contains \"text\"".to_string())
    );

    let fallback = bridge.describe_resources("Mystery");
    assert_eq!(fallback.basic_properties, vec!["name", "version", "frontmost"]);
    assert!(fallback.collections.is_empty());
}

// Tools are callable only while exposed; arguments bind in declared order.
#[test]
fn call_tool_binds_arguments() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    let (mut bridge, executor) = ws.bridge();

    let err = bridge
        .call_tool("calendar_make_new_event", &params(json!({"at": "x"})))
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotFound(NotFound::Tool(_))));

    bridge.activate("Calendar")?;
    bridge.call_tool(
        "calendar_make_new_event",
        &params(json!({"in_": "Work", "at": "end of events", "with_properties": {"summary": "Standup"}})),
    )?;
    assert_eq!(
        statement(&executor.last_script()),
        "make new event with at \"end of events\" with properties {summary:\"Standup\"} with in \"Work\""
    );

    bridge.call_tool("calendar_make_new_event", &params(json!({"at": "x"})))?;
    assert_eq!(
        statement(&executor.last_script()),
        "make new event with at \"x\" with in \"Home\""
    );

    let err = bridge
        .call_tool("calendar_make_new_event", &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidArguments(_)));
    assert!(err.to_string().contains("at"));

    let err = bridge.call_tool("calendar_close", &Parameters::new()).unwrap_err();
    assert!(err.to_string().contains("direct_parameter"));
    bridge.call_tool("calendar_close", &params(json!({"direct_parameter": "window 1"})))?;
    assert_eq!(statement(&executor.last_script()), "close \"window 1\"");
    Ok(())
}

// Derived accessors run their resource query.
#[test]
fn accessors_run_resource_queries() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    let (mut bridge, executor) = ws.bridge();
    bridge.activate("Calendar")?;

    let tools = bridge.list_tools();
    let accessor = tools
        .iter()
        .find(|tool| tool.id.as_str() == "calendar_get_calendars_names")
        .expect("accessor exposed");
    assert_eq!(
        accessor.target,
        ToolTarget::Accessor {
            query: "name of calendars".into()
        }
    );
    assert!(tools.iter().any(|tool| tool.id.as_str() == "calendar_get_frontmost"));

    executor.respond(0, "Home, Work\n", "");
    let names = bridge.call_tool("calendar_get_calendars_names", &Parameters::new())?;
    assert_eq!(names, "Home, Work");
    assert_eq!(
        executor.last_script(),
        "tell application \"Calendar\"\nname of calendars\nend tell"
    );

    let err = bridge
        .call_tool("calendar_get_events", &params(json!({"limit": 1})))
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidArguments(_)));
    Ok(())
}

// Raw invoke recovers wire names once a command is registered.
#[test]
fn invoke_uses_registered_parameter_names() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    let (mut bridge, executor) = ws.bridge();

    bridge.invoke("Finder", "open", &params(json!({"target": "x"})))?;
    assert_eq!(statement(&executor.last_script()), "open with target \"x\"");

    bridge.activate("Calendar")?;
    bridge.invoke(
        "Calendar",
        "switch view",
        &params(json!({"to": "day view", "self": "ignored"})),
    )?;
    assert_eq!(statement(&executor.last_script()), "switch view with to \"day view\"");

    bridge.invoke("Calendar", "make new event", &params(json!({"in_": "Work"})))?;
    assert_eq!(statement(&executor.last_script()), "make new event with in \"Work\"");
    Ok(())
}

// Start-up restores the persisted set, keeping apps that lost their descriptor.
#[test]
fn initialize_restores_active_apps() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    ws.write_descriptor("test.json", &test_app_descriptor());
    ws.write_config(&["Calendar", "Ghost"]);
    let (mut bridge, _) = ws.bridge();

    assert_eq!(bridge.list_active_apps(), vec!["Calendar", "Ghost"]);
    assert_eq!(bridge.list_inactive_apps(), vec!["TestApp"]);
    assert!(bridge.check_invariants().is_empty());
    assert!(bridge.list_tools().iter().any(|tool| tool.app == "Calendar"));
    assert!(bridge.list_commands("TestApp").unwrap_err().is_not_found());

    bridge.deactivate("Ghost")?;
    assert_eq!(ws.persisted()?, set(&["Calendar"]));
    Ok(())
}

// A corrupt activation config is logged and treated as empty.
#[test]
fn corrupt_config_starts_empty() {
    let ws = Workspace::new();
    ws.write_descriptor("test.json", &test_app_descriptor());
    ws.write_raw("tool_config.json", "{\"active_apps\": \"TestApp\"");
    let (bridge, _) = ws.bridge();

    assert!(bridge.list_active_apps().is_empty());
    assert_eq!(bridge.list_apps(), vec!["TestApp"]);
    assert!(bridge.list_tools().is_empty());
}

// Bulk transitions cover every known app; registry entries survive.
#[test]
fn bulk_transitions() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("calendar.json", &calendar_descriptor());
    ws.write_descriptor("test.json", &test_app_descriptor());
    let (mut bridge, _) = ws.bridge();

    assert_eq!(bridge.activate_all().to_string(), "Activated all applications");
    assert_eq!(bridge.list_active_apps(), vec!["Calendar", "TestApp"]);
    assert!(bridge.list_inactive_apps().is_empty());
    assert_eq!(ws.persisted()?, set(&["Calendar", "TestApp"]));

    assert_eq!(bridge.deactivate_all().to_string(), "Deactivated all applications");
    assert!(bridge.list_active_apps().is_empty());
    assert!(ws.persisted()?.is_empty());
    assert!(bridge.list_tools().is_empty());
    assert_eq!(
        bridge.list_commands("Calendar")?,
        vec!["close", "make new event", "quit", "switch view"]
    );
    let info = bridge.describe_command("Calendar", "make new event")?;
    assert_eq!(info.function_name, "calendar_make_new_event");
    assert_eq!(info.description, "Create a calendar event");
    Ok(())
}

// Descriptors added after start-up are found when activated.
#[test]
fn activation_rereads_the_descriptor_directory() -> Result<()> {
    let ws = Workspace::new();
    let (mut bridge, _) = ws.bridge();
    assert!(bridge.list_apps().is_empty());

    ws.write_descriptor("test.json", &test_app_descriptor());
    ws.write_descriptor(
        "legacy.json",
        &json!({"applicationName": "Legacy", "commands": [{"name": "ping"}]}),
    );
    bridge.activate("TestApp")?;
    bridge.activate("Legacy")?;
    assert_eq!(bridge.list_apps(), vec!["Legacy", "TestApp"]);
    assert_eq!(bridge.list_commands("Legacy")?, vec!["ping"]);
    Ok(())
}

// A shared bridge serves readers on other threads after a transition.
#[test]
fn shared_bridge_across_threads() -> Result<()> {
    let ws = Workspace::new();
    ws.write_descriptor("test.json", &test_app_descriptor());
    let (bridge, executor) = ws.bridge();
    let shared = SharedBridge::new(bridge);

    shared.write().activate("TestApp")?;
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let shared = shared.clone();
            thread::spawn(move || {
                let args = params(json!({"param1": format!("v{n}")}));
                shared.read().call_tool("testapp_test_command", &args)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().expect("thread panicked").is_ok());
    }
    assert_eq!(executor.scripts().len(), 4);
    assert!(
        executor
            .scripts()
            .iter()
            .all(|script| script.contains("with param2 \"default_value\""))
    );
    Ok(())
}

#[cfg(unix)]
mod cli {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use std::process::{Command, Output, Stdio};

    // Stand-in for osascript that prints the script it was given.
    fn echo_executor(dir: &Path) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("echo-osascript");
        std::fs::write(&path, "#!/bin/sh\nshift\nprintf '%s\\n' \"$1\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn osabridge(ws: &Workspace) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_osabridge"));
        cmd.arg("--apis-dir")
            .arg(ws.apis_dir())
            .env("OSABRIDGE_LOG", "off")
            .env_remove("OSABRIDGE_CONFIG")
            .env_remove("OSABRIDGE_OSASCRIPT");
        cmd
    }

    fn stdout(output: &Output) -> String {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    // Subcommands share state through the persisted config.
    #[test]
    fn subcommands_drive_the_bridge() -> Result<()> {
        let ws = Workspace::new();
        ws.write_descriptor("test.json", &test_app_descriptor());

        let output = osabridge(&ws).arg("activate").arg("TestApp").output()?;
        assert!(output.status.success());
        assert_eq!(stdout(&output), "Activated TestApp");

        let output = osabridge(&ws).arg("active").output()?;
        let active: Vec<String> = serde_json::from_str(&stdout(&output))?;
        assert_eq!(active, vec!["TestApp"]);

        let output = osabridge(&ws).args(["commands", "Nope"]).output()?;
        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).starts_with("Error: Application 'Nope' not found"));
        Ok(())
    }

    // `invoke` hands the synthesized script to the configured executor.
    #[test]
    fn invoke_runs_the_configured_executor() -> Result<()> {
        let ws = Workspace::new();
        ws.write_descriptor("test.json", &test_app_descriptor());
        let fake = echo_executor(&ws.apis_dir().join(".."));

        let output = osabridge(&ws)
            .arg("--osascript")
            .arg(&fake)
            .args(["invoke", "TestApp", "test-command", "--params", r#"{"param1": "value1"}"#])
            .output()?;
        assert!(output.status.success(), "{output:?}");
        assert_eq!(
            stdout(&output),
            "tell application \"TestApp\"\ntest-command with param1 \"value1\"\nend tell"
        );
        Ok(())
    }

    // The shell keeps one bridge across lines and survives bad input.
    #[test]
    fn shell_reads_commands_line_by_line() -> Result<()> {
        let ws = Workspace::new();
        ws.write_descriptor("test.json", &test_app_descriptor());

        let mut child = osabridge(&ws)
            .arg("shell")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        {
            let mut stdin = child.stdin.take().expect("stdin");
            writeln!(stdin, "activate TestApp")?;
            writeln!(stdin, "frobnicate")?;
            writeln!(stdin, "describe TestApp 'test-command'")?;
            writeln!(stdin, "shell")?;
            writeln!(stdin, "exit")?;
            writeln!(stdin, "deactivate TestApp")?;
        }
        let output = child.wait_with_output()?;
        assert!(output.status.success());
        let text = stdout(&output);
        assert!(text.starts_with("Activated TestApp"));
        assert!(text.contains("\"function_name\": \"testapp_test_command\""));
        assert!(!text.contains("Deactivated"));
        assert_eq!(ws.persisted()?, set(&["TestApp"]));
        Ok(())
    }
}
