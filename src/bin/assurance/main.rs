//! assurance CLI tool
//!
//! Runs the editor operations against a model directory from the command line and prints the
//! result string the editor would receive.
//!
//! ## Commands
//!
//! - `get-json <dir>`: print the projected JSON
//! - `generate-json <dir>`: write the projected JSON to the model file
//! - `assign-uuids <dir>`: persist a uuid on every node lacking one
//! - `update <dir> <commands.json>`: apply a command list (a JSON array) and save
//! - `reveal <dir> <node-id>`: print the source file and line of a node
//! - `exec <COMMAND> <payload>`: pass a raw editor command and JSON payload through
//!
//! Logging goes to stderr; set `RUST_LOG=debug` for per-stage detail.

use assurance_core::service::Engine;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::{fs::read_to_string, path::PathBuf};

#[derive(Parser)]
#[command(name = "assurance")]
#[command(author, version, about = "Command engine for assurance case documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the projected JSON of a model directory
    GetJson {
        /// Model directory
        dir: PathBuf,
    },

    /// Write the projected JSON to the configured model file
    GenerateJson { dir: PathBuf },

    /// Give every node without a uuid a persisted one
    AssignUuids { dir: PathBuf },

    /// Apply a command list and save the model
    Update {
        dir: PathBuf,

        /// File holding a JSON array of editor commands
        commands: PathBuf,
    },

    /// Print the source file and line of a node
    Reveal {
        dir: PathBuf,

        /// Node path (`ns/G1/S1`) or uuid
        node_id: String,
    },

    /// Run a raw editor command, e.g. `gsn.MODEL_UPDATE '{"modelDir": "...", ...}'`
    Exec { command: String, payload: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = Engine::new();

    let (command, payload) = match cli.command {
        Commands::GetJson { dir } => ("gsn.GET_MODEL_JSON".to_string(), json!({ "modelDir": dir })),
        Commands::GenerateJson { dir } => (
            "gsn.GENERATE_MODEL_JSON".to_string(),
            json!({ "modelDir": dir }),
        ),
        Commands::AssignUuids { dir } => {
            ("gsn.ASSIGN_UUIDS".to_string(), json!({ "modelDir": dir }))
        }
        Commands::Update { dir, commands } => {
            let list: Value = serde_json::from_str(&read_to_string(&commands)?)?;
            (
                "gsn.MODEL_UPDATE".to_string(),
                json!({ "modelDir": dir, "commandList": list }),
            )
        }
        Commands::Reveal { dir, node_id } => (
            "gsn.REVEAL_ORIGIN".to_string(),
            json!({ "modelDir": dir, "nodeId": node_id }),
        ),
        Commands::Exec { command, payload } => {
            println!("{}", engine.execute(&command, Some(&payload)));
            return Ok(());
        }
    };

    println!("{}", engine.execute(&command, Some(&payload.to_string())));
    Ok(())
}
