//! # c2ots CLI entry point
//!
//! Parses command-line arguments, initialises logging, and dispatches to
//! subcommand handlers. Results go to stdout, logs to stderr.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use c2ots_cli::migrate::{run_migrate, MigrateArgs};
use c2ots_cli::root::{run_root, RootArgs};

/// Convert Chainpoint proofs into OpenTimestamps-style timestamp graphs.
#[derive(Parser, Debug)]
#[command(name = "c2ots", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Migrate a proof and resolve its Bitcoin placeholders.
    Migrate(MigrateArgs),

    /// Recompute a proof's Merkle root(s) without building a graph.
    Root(RootArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Migrate(args) => run_migrate(&args, &mut stdout).await,
        Commands::Root(args) => run_root(&args, &mut stdout),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
