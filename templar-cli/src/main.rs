//! Templar — element template reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! templar apply --document <doc.json> --templates <catalog> --element <id> --template <id[@version]>
//! templar apply --document <doc.json> --templates <catalog> --element <id> --remove
//!               [--config <file>] [--dry-run] [--json]
//! ```
//!
//! Logging goes to stderr and is controlled by `TEMPLAR_LOG` (default `warn`).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::apply::ApplyArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "templar",
    version,
    about = "Apply, swap and remove element templates on process documents",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a template to an element, replacing the one it carries.
    Apply(ApplyArgs),
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("TEMPLAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Apply(args) => args.run(),
    }
}
