//! # trellis-cli
//!
//! Command line front end for the trellis dependency resolver.
//!
//! This is the main entry point for the `trellis` tool. It handles command
//! parsing, sets up logging and panic reporting, and dispatches to the
//! command handlers.

use std::collections::HashMap;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Resolve transitive dependencies from recipes
#[derive(Parser, Debug)]
#[command(name = "trellis", version, about = "Transitive dependency resolver")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Resolution strategy: newest, oldest or locked
    #[arg(long, global = true)]
    pub strategy: Option<String>,

    /// Directory holding recipe JSON files
    #[arg(long, global = true, value_name = "DIR")]
    pub recipes: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Resolve dependencies and print the chosen versions
    Resolve {
        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve dependencies and write trellis.lock.json
    Lock,
    /// Verify that the lock file still satisfies trellis.toml
    Check,
}

impl Cli {
    /// Flags that override configuration, keyed like trellis.toml
    pub fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(strategy) = &self.strategy {
            overrides.insert("strategy".to_string(), strategy.clone());
        }
        if let Some(recipes) = &self.recipes {
            overrides.insert("recipes".to_string(), recipes.clone());
        }
        overrides
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting trellis v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = build_runtime()?;

    // Commands run on a worker thread so deep graphs get the larger stack
    let task = rt.spawn(async move {
        let ctx = CommandContext::new(cli.overrides()).await?;
        commands::dispatch_command(cli.command, &ctx).await
    });
    rt.block_on(task)?
}

fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(trellis_resolver::RESOLUTION_STACK_SIZE)
        .build()
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "trellis={level},trellis_core={level},trellis_config={level},trellis_registry={level},trellis_resolver={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("trellis encountered an unexpected error: {}", panic_info);
        eprintln!("trellis crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
