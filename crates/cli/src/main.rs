//! Forno CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! forno-cli migrate
//!
//! # Grant the admin flag to a user's profile
//! forno-cli admin grant -u some_username
//!
//! # Revoke it again
//! forno-cli admin revoke -u some_username
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin grant/revoke` - Flip the profile admin flag for a username

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "forno-cli")]
#[command(author, version, about = "Forno CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant the admin flag to a user's profile
    Grant {
        /// Username of the account
        #[arg(short, long)]
        username: String,
    },
    /// Revoke the admin flag from a user's profile
    Revoke {
        /// Username of the account
        #[arg(short, long)]
        username: String,
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
        Commands::Admin { action } => match action {
            AdminAction::Grant { username } => {
                commands::admin::set_admin(&username, true).await?;
            }
            AdminAction::Revoke { username } => {
                commands::admin::set_admin(&username, false).await?;
            }
        },
    }
    Ok(())
}
