//! GeoSync CLI
//!
//! Command-line tools for inspecting and exercising GeoSync replicas.
//!
//! # Commands
//!
//! - `inspect` - Display replica metadata and per-layer statistics
//! - `edits` - List features with pending local edits
//! - `demo` - Run a generate, edit, sync cycle against an in-memory service

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GeoSync command-line replica tools.
#[derive(Parser)]
#[command(name = "geosync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the replica directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display replica metadata and per-layer statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List features with pending local edits
    Edits {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run a generate, edit, sync cycle against an in-memory service
    Demo {
        /// Number of features to seed the service with
        #[arg(long, default_value = "6")]
        features: u64,

        /// Transfer page size
        #[arg(long, default_value = "2")]
        page_size: u32,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Replica path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Edits { format } => {
            let path = cli.path.ok_or("Replica path required for edits")?;
            commands::edits::run(&path, &format)?;
        }
        Commands::Demo {
            features,
            page_size,
        } => {
            commands::demo::run(features, page_size)?;
        }
        Commands::Version => {
            println!("GeoSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
