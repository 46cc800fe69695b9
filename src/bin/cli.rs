//! codable-store CLI
//!
//! Command-line interface for reading and writing JSON values in a store.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use codable_store::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// codable-store CLI
#[derive(Parser, Debug)]
#[command(name = "codable-store")]
#[command(about = "Durable key-value store for JSON values")]
#[command(version)]
struct Args {
    /// Table file (defaults to <documents>/CodableStorage/storage.db)
    #[arg(short, long)]
    location: Option<PathBuf>,

    /// Log engine activity to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value stored under a key
    Get {
        /// The key to read
        key: String,
    },

    /// Store a JSON value under a key, replacing any previous value
    Put {
        /// The key to write
        key: String,

        /// The value, as JSON (e.g. '{"a":1}')
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Remove every key
    Clear,

    /// Show where the store lives
    Info,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "info,codable_store=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let mut builder = Config::builder();
    if let Some(location) = &args.location {
        builder = builder.location(location);
    }
    let engine = Engine::with_config(builder.build());

    if let Err(message) = run(&engine, args.command) {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn run(engine: &Engine, command: Commands) -> Result<(), String> {
    match command {
        Commands::Get { key } => {
            let value: Option<serde_json::Value> =
                engine.get_blocking(key.as_str()).map_err(|e| e.to_string())?;
            match value {
                Some(value) => println!("{}", value),
                None => println!("(nil)"),
            }
        }
        Commands::Put { key, value } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).map_err(|e| format!("invalid JSON value: {}", e))?;
            engine
                .put_blocking(Some(&value), key)
                .map_err(|e| e.to_string())?;
            println!("OK");
        }
        Commands::Delete { key } => {
            engine.delete_blocking(key).map_err(|e| e.to_string())?;
            println!("OK");
        }
        Commands::Clear => {
            engine.clear_blocking().map_err(|e| e.to_string())?;
            println!("OK");
        }
        Commands::Info => {
            println!("codable-store v{}", codable_store::VERSION);
            match engine.location() {
                Some(path) => println!("location: {}", path.display()),
                None => println!("location: (unavailable, engine is degraded)"),
            }
            println!("codec: {}", engine.codec().name());
        }
    }
    Ok(())
}
