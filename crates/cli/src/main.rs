//! Vegi Shop CLI - database migrations, catalog seeding and admin users.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! vegi-cli migrate
//!
//! # Load categories and products from YAML
//! vegi-cli seed data/seed.yaml
//!
//! # Wipe the catalog first, then load
//! vegi-cli seed data/seed.yaml --clear
//!
//! # Create an admin user
//! vegi-cli admin create -e admin@example.com -p 'correct horse' -n "Admin Name"
//!
//! # Grant or revoke admin access for an existing account
//! vegi-cli admin promote -e grocer@example.com
//! vegi-cli admin demote -e grocer@example.com
//! ```
//!
//! # Environment Variables
//!
//! The database URL is resolved like the admin server's: `ADMIN_DATABASE_URL`,
//! then `DATABASE_URL`, then the `POSTGRES_*` set.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vegi-cli")]
#[command(author, version, about = "Vegi Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load categories and products from a YAML file
    Seed {
        /// Path to the seed file
        file: PathBuf,

        /// Delete every product and category before loading
        #[arg(long)]
        clear: bool,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Admin display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Give an existing account the admin role
    Promote {
        #[arg(short, long)]
        email: String,
    },
    /// Return an admin account to the customer role
    Demote {
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vegi_cli=info,vegi_shop_db=info".into()),
        )
        .init();

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
        Commands::Seed { file, clear } => {
            commands::seed::catalog(&file, clear).await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                name,
            } => {
                commands::admin::create_user(&email, &password, name.as_deref()).await?;
            }
            AdminAction::Promote { email } => commands::admin::promote(&email).await?,
            AdminAction::Demote { email } => commands::admin::demote(&email).await?,
        },
    }
    Ok(())
}
