//! Storedesk CLI - visitor statistics and PIN checks.
//!
//! # Usage
//!
//! ```bash
//! # Show visitor statistics from the admin data directory
//! sd-cli visitors stats --data-dir data
//!
//! # Record a visit (uses the stored visitor id unless one is given)
//! sd-cli visitors record --visitor-id visitor_1718452800000_abc123xyz
//!
//! # Per-day counts for the last 14 days
//! sd-cli visitors daily --days 14
//!
//! # Check a PIN against the dashboard API
//! sd-cli pin verify --pin 1234
//! ```
//!
//! # Commands
//!
//! - `visitors` - Inspect and record visitor tracking data
//! - `pin verify` - Verify a PIN with the dashboard API

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Storedesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and record visitor tracking data
    Visitors {
        #[command(subcommand)]
        action: VisitorsAction,
    },
    /// Dashboard PIN operations
    Pin {
        #[command(subcommand)]
        action: PinAction,
    },
}

#[derive(Subcommand)]
enum VisitorsAction {
    /// Print aggregate visitor statistics
    Stats {
        /// Admin data directory (default: `ADMIN_DATA_DIR` or "data")
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
    /// Record one visit
    Record {
        /// Admin data directory (default: `ADMIN_DATA_DIR` or "data")
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Visitor to record instead of the stored one
        #[arg(short, long)]
        visitor_id: Option<String>,
    },
    /// Print distinct visitors per day, oldest first
    Daily {
        /// Admin data directory (default: `ADMIN_DATA_DIR` or "data")
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Number of days to include (1-365)
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Subcommand)]
enum PinAction {
    /// Verify a PIN with the dashboard API
    Verify {
        /// 4-digit PIN
        #[arg(short, long)]
        pin: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Visitors { action } => match action {
            VisitorsAction::Stats { data_dir } => commands::visitors::stats(data_dir)?,
            VisitorsAction::Record {
                data_dir,
                visitor_id,
            } => commands::visitors::record(data_dir, visitor_id.as_deref())?,
            VisitorsAction::Daily { data_dir, days } => {
                commands::visitors::daily(data_dir, days)?;
            }
        },
        Commands::Pin { action } => match action {
            PinAction::Verify { pin } => commands::pin::verify(&pin).await?,
        },
    }
    Ok(())
}
