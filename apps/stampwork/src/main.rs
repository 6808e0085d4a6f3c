//! stampwork - compose capabilities into blueprints and instances.
//!
//! Logs go to stderr; stdout carries command output.

use clap::{Parser, Subcommand};
use stampwork::cli::{CliError, cmd_compose, cmd_create, cmd_demo, cmd_list, log_directive};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stampwork")]
#[command(about = "Compose reusable capabilities into objects", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG, when set, takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in capabilities and handler tags
    List {
        #[arg(long)]
        json: bool,
    },

    /// Compose capabilities and print the blueprint
    Compose {
        /// JSON capability definition file
        #[arg(long, env = "STAMPWORK_DEFS")]
        defs: Option<PathBuf>,

        /// Capability names, composed left to right
        #[arg(required = true)]
        names: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Create an instance and call methods on it
    Create {
        /// JSON capability definition file
        #[arg(long, env = "STAMPWORK_DEFS")]
        defs: Option<PathBuf>,

        /// Capability names, composed left to right
        #[arg(required = true)]
        names: Vec<String>,

        /// Instance configuration as a JSON object
        #[arg(long)]
        config: Option<String>,

        /// Method call, `method` or `method:arg,arg` (repeatable)
        #[arg(long = "call")]
        calls: Vec<String>,

        /// JSON file backing the persistable capability
        #[arg(long, env = "STAMPWORK_STORE")]
        store: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Run a built-in scenario (ball, car, flyweight, cart, post, greet)
    Demo {
        name: String,

        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::new(log_directive(verbose, rust_log.as_deref()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List { json } => cmd_list(json),
        Commands::Compose { defs, names, json } => cmd_compose(defs.as_deref(), &names, json),
        Commands::Create {
            defs,
            names,
            config,
            calls,
            store,
            json,
        } => cmd_create(
            defs.as_deref(),
            &names,
            config.as_deref(),
            &calls,
            store.as_deref(),
            json,
        ),
        Commands::Demo { name, json } => cmd_demo(&name, json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
