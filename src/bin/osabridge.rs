//! Administrative CLI over the bridge.
//!
//! Every subcommand maps to one bridge operation. Structured answers print as
//! JSON on stdout; script output and confirmations print as plain text.
//! Logs go to stderr. `shell` reads further subcommands line by line and runs
//! them against the same bridge, so activation changes carry across lines.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use osabridge::logging::{self, LogConfig, LogFormat};
use osabridge::{
    Bridge, BridgeConfig, BridgeError, default_config_path, find_apis_dir, parse_parameters,
};
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

fn main() {
    if let Err(err) = run() {
        eprintln!("osabridge: {err:#}");
        std::process::exit(1);
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "osabridge",
    version,
    about = "Expose scriptable macOS applications as callable commands"
)]
struct Cli {
    /// Directory holding application descriptors
    #[arg(long, env = "OSABRIDGE_APIS_DIR", value_name = "DIR")]
    apis_dir: Option<PathBuf>,
    /// Activation config (default: <DIR>/tool_config.json)
    #[arg(long, env = "OSABRIDGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
    /// Script executor program
    #[arg(long, env = "OSABRIDGE_OSASCRIPT", value_name = "PATH")]
    osascript: Option<PathBuf>,
    /// Log output format
    #[arg(long, env = "OSABRIDGE_LOG_FORMAT", value_enum)]
    log_format: Option<FormatArg>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pretty,
    Compact,
    Full,
}

impl From<FormatArg> for LogFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pretty => LogFormat::Pretty,
            FormatArg::Compact => LogFormat::Compact,
            FormatArg::Full => LogFormat::Full,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// List known applications
    Apps,
    /// List the registered commands of an application
    Commands { app: String },
    /// Show one command's description and tool identifier
    Describe { app: String, command: String },
    /// Run a command directly, active or not
    Invoke {
        app: String,
        command: String,
        /// Parameters as a JSON object
        #[arg(long, value_name = "JSON")]
        params: Option<String>,
    },
    /// Call an exposed tool
    Call {
        tool: String,
        /// Arguments as a JSON object
        #[arg(long, value_name = "JSON")]
        args: Option<String>,
    },
    /// List exposed tools
    Tools,
    /// Activate an application
    Activate { app: String },
    /// Deactivate an application
    Deactivate { app: String },
    /// Activate every known application
    ActivateAll,
    /// Deactivate every application
    DeactivateAll,
    /// List active applications
    Active,
    /// List known applications that are not active
    Inactive,
    /// Describe the collections and properties of an application
    Resources { app: String },
    /// Evaluate a resource path such as "name of calendars"
    Query { app: String, path: String },
    /// Read subcommands from stdin, one per line
    Shell,
}

/// One line of `shell` input, parsed with the same subcommands.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Cmd,
}

enum Outcome {
    Done(String),
    Failed(String),
}

impl From<Result<String, BridgeError>> for Outcome {
    fn from(result: Result<String, BridgeError>) -> Self {
        match result {
            Ok(text) => Outcome::Done(text),
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut log_config = LogConfig::from_env();
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format.into());
    }
    logging::init(log_config);

    let apis_dir = find_apis_dir(cli.apis_dir.as_deref());
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&apis_dir));
    let mut config = BridgeConfig::new(apis_dir).with_config_path(config_path);
    if let Some(program) = cli.osascript.clone() {
        config = config.with_osascript(program);
    }
    let mut bridge = Bridge::initialize(config);

    if let Cmd::Shell = cli.command {
        return shell(&mut bridge);
    }
    match dispatch(&mut bridge, cli.command)? {
        Outcome::Done(text) => {
            println!("{text}");
            Ok(())
        }
        Outcome::Failed(text) => {
            println!("{text}");
            std::process::exit(1);
        }
    }
}

fn dispatch(bridge: &mut Bridge, command: Cmd) -> Result<Outcome> {
    let outcome: Outcome = match command {
        Cmd::Apps => Outcome::Done(to_json(&bridge.list_apps())?),
        Cmd::Commands { app } => match bridge.list_commands(&app) {
            Ok(commands) => Outcome::Done(to_json(&commands)?),
            Err(err) => Outcome::Failed(err.to_string()),
        },
        Cmd::Describe { app, command } => match bridge.describe_command(&app, &command) {
            Ok(info) => Outcome::Done(to_json(&info)?),
            Err(err) => Outcome::Failed(err.to_string()),
        },
        Cmd::Invoke {
            app,
            command,
            params,
        } => {
            let params = parse_parameters(params.as_deref().unwrap_or_default())?;
            bridge.invoke(&app, &command, &params).into()
        }
        Cmd::Call { tool, args } => {
            let args = parse_parameters(args.as_deref().unwrap_or_default())?;
            bridge.call_tool(&tool, &args).into()
        }
        Cmd::Tools => Outcome::Done(to_json(&bridge.list_tools())?),
        Cmd::Activate { app } => bridge
            .activate(&app)
            .map(|confirmation| confirmation.to_string())
            .into(),
        Cmd::Deactivate { app } => bridge
            .deactivate(&app)
            .map(|confirmation| confirmation.to_string())
            .into(),
        Cmd::ActivateAll => Outcome::Done(bridge.activate_all().to_string()),
        Cmd::DeactivateAll => Outcome::Done(bridge.deactivate_all().to_string()),
        Cmd::Active => Outcome::Done(to_json(&bridge.list_active_apps())?),
        Cmd::Inactive => Outcome::Done(to_json(&bridge.list_inactive_apps())?),
        Cmd::Resources { app } => Outcome::Done(to_json(&bridge.describe_resources(&app))?),
        Cmd::Query { app, path } => bridge.query(&app, &path).into(),
        Cmd::Shell => bail!("already in the shell"),
    };
    Ok(outcome)
}

fn shell(bridge: &mut Bridge) -> Result<()> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = io::stdout();
    loop {
        if interactive {
            write!(stdout, "osabridge> ")?;
            stdout.flush()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(err) => {
                eprintln!("{err:#}");
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(err) => {
                // Help and usage errors render themselves.
                let _ = err.print();
                continue;
            }
        };
        match dispatch(bridge, parsed.command) {
            Ok(Outcome::Done(text)) | Ok(Outcome::Failed(text)) => writeln!(stdout, "{text}")?,
            Err(err) => eprintln!("{err:#}"),
        }
    }
    Ok(())
}

/// Split a shell line into words, honoring single and double quotes and
/// backslash escapes outside single quotes.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some('"'), '\\') | (None, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => bail!("trailing backslash"),
            },
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if let Some(open) = quote {
        bail!("unterminated {open} quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
