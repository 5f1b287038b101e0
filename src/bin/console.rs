// CLI binary: panicking on unrecoverable errors is fine here.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use command_console::demo::DemoHost;
use command_console::dsl::{lexer, postfix, token};
use command_console::loader::spawn_discovery;
use command_console::registry::catalog;
use command_console::settings::{self, ConsoleSettings};
use command_console::sink::{LogEntry, LogLevel, SharedLog};
use command_console::Engine;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "console-cli", about = "Command console over a demo scene", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Settings file (JSON). Defaults are used if missing or invalid.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline internals at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive prompt (default). Prefix a line with `?` for a syntax hint.
    Repl,
    /// Run each argument as one console line
    Run {
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Show the lexemes, tokens and postfix form of a line
    Tokens { line: String },
    /// Syntax hint for the command under the cursor
    Hint {
        line: String,
        /// Byte offset of the cursor (default: end of line)
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// Dump the command catalog as JSON
    Catalog,
    /// Print the settings JSON schema
    Schema,
}

// ── Output formatting ────────────────────────────────────────────

fn print_entries(entries: &[LogEntry]) {
    for entry in entries {
        match entry.level {
            LogLevel::Log => println!("{}", entry.text),
            LogLevel::Warning => eprintln!("warning: {}", entry.text),
            LogLevel::Error | LogLevel::Exception => eprintln!("! {}", entry.text),
        }
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Submit one line and print what the console emitted.
fn submit(engine: &mut Engine, log: &SharedLog, line: &str, raw_json: bool) -> bool {
    let outcome = engine.submit(line);
    let entries = log.drain();
    if raw_json {
        let json = match &outcome {
            Ok(result) => serde_json::json!({ "input": line, "result": result, "output": entries }),
            Err(e) => serde_json::json!({ "input": line, "error": e, "message": e.to_string(), "output": entries }),
        };
        print_json(&json);
    } else {
        print_entries(&entries);
    }
    outcome.is_ok()
}

fn print_hint(engine: &Engine, line: &str, cursor: usize, raw_json: bool) {
    let sim = engine.simulate(line, cursor);
    if raw_json {
        let json = match &sim {
            Some(s) => serde_json::json!({
                "command": s.command.name,
                "slot": s.slot,
                "token": s.token,
                "hint": s.command.syntax_hint(s.slot, engine.registry().types()),
            }),
            None => serde_json::Value::Null,
        };
        print_json(&json);
    } else {
        match sim {
            Some(s) => println!("{}", s.command.syntax_hint(s.slot, engine.registry().types())),
            None => println!("(no hint)"),
        }
    }
}

// ── REPL ─────────────────────────────────────────────────────────

async fn repl(engine: &mut Engine, log: &SharedLog, raw_json: bool) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let Ok(Some(line)) = lines.next_line().await else {
            break;
        };
        let line = line.trim_end();
        match line.trim() {
            "exit" | "quit" => break,
            _ => {}
        }
        if let Some(partial) = line.strip_prefix('?') {
            print_hint(engine, partial, partial.len(), raw_json);
            continue;
        }
        submit(engine, log, line, raw_json);
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let console_settings = cli
        .config
        .as_deref()
        .and_then(settings::load_settings)
        .unwrap_or_default();

    let command = cli.command.unwrap_or(Commands::Repl);

    // Commands that don't need a registry
    match &command {
        Commands::Schema => {
            print_json(&ConsoleSettings::json_schema());
            return;
        }
        Commands::Tokens { line } => {
            let lexemes = lexer::lex_with(line, &console_settings.symbols);
            let tokens = token::tokenize(lexemes.clone());
            let postfix = postfix::to_postfix(&tokens);
            if cli.json {
                print_json(&serde_json::json!({
                    "lexemes": lexemes,
                    "tokens": tokens,
                    "postfix": postfix,
                }));
            } else {
                for t in &tokens {
                    println!("{t}");
                }
                match postfix {
                    Some(p) => println!(
                        "postfix: {}",
                        p.iter().map(token::Token::value).collect::<Vec<_>>().join(" ")
                    ),
                    None => println!("postfix: (invalid)"),
                }
            }
            return;
        }
        _ => {}
    }

    let discovery = spawn_discovery(DemoHost::default());
    if !discovery.is_finished() {
        tracing::debug!("waiting for command discovery");
    }
    let registry = match discovery.ready().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let log = SharedLog::new(console_settings.scrollback);
    let mut engine = Engine::new(registry, console_settings, log.clone());

    match command {
        Commands::Repl => repl(&mut engine, &log, cli.json).await,
        Commands::Run { lines } => {
            let mut ok = true;
            for line in &lines {
                ok &= submit(&mut engine, &log, line, cli.json);
            }
            if !ok {
                process::exit(1);
            }
        }
        Commands::Hint { line, cursor } => {
            let cursor = cursor.unwrap_or(line.len());
            print_hint(&engine, &line, cursor, cli.json);
        }
        Commands::Catalog => print_json(&catalog::to_json(engine.registry())),
        Commands::Schema | Commands::Tokens { .. } => {}
    }
}
