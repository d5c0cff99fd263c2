//! Harvest Hub CLI - Database migrations and marketplace management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run snapshot store migrations
//! hh-cli migrate
//!
//! # Write the demo dataset (refuses to overwrite without --force)
//! hh-cli seed
//! hh-cli seed --force
//!
//! # Block or unblock an account
//! hh-cli account deactivate -e buyer@example.com
//! hh-cli account activate -e buyer@example.com
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run `PostgreSQL` migrations
//! - `seed` - Write the demo catalog, accounts and orders
//! - `account` - Activate or deactivate accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hh-cli")]
#[command(author, version, about = "Harvest Hub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the snapshot store with demo data
    Seed {
        /// Overwrite existing snapshots
        #[arg(long)]
        force: bool,
    },
    /// Manage marketplace accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Re-enable a deactivated account
    Activate {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Block an account from logging in and placing orders
    Deactivate {
        /// Account email address
        #[arg(short, long)]
        email: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { force } => commands::seed::run(force).await?,
        Commands::Account { action } => match action {
            AccountAction::Activate { email } => {
                commands::account::set_active(&email, true).await?;
            }
            AccountAction::Deactivate { email } => {
                commands::account::set_active(&email, false).await?;
            }
        },
    }
    Ok(())
}
