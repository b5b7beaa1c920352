//! Marketplace CLI - Admin tools for the catalog database.
//!
//! # Usage
//!
//! ```bash
//! # Seed categories
//! mp-cli seed-categories --file categories.json
//!
//! # Add an app
//! mp-cli add --file notepad.json
//!
//! # Update an existing app (by slug, or by id to change the slug)
//! mp-cli add --file notepad.json --update
//! mp-cli add --file notepad.json --update --id 65a1b2c3d4e5f60718293a4b
//!
//! # List apps
//! mp-cli list --category productivity
//! ```
//!
//! The database is taken from `MONGODB_URI` and `MONGODB_DATABASE`, or the
//! matching flags.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use marketplace_core::Slug;
use secrecy::SecretString;
use tracing::info;

mod commands;
mod db;
mod error;
mod models;

use commands::add::{WriteMode, Written};
use db::MarketDb;
use error::CliError;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Marketplace catalog admin tools")]
struct Cli {
    /// MongoDB connection string
    #[arg(
        long,
        global = true,
        env = "MONGODB_URI",
        default_value = "mongodb://localhost:27017",
        hide_env_values = true,
        value_parser = parse_secret
    )]
    mongodb_uri: SecretString,

    /// Database name
    #[arg(long, global = true, env = "MONGODB_DATABASE", default_value = "marketplace")]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

/// Connection strings may carry credentials.
fn parse_secret(raw: &str) -> Result<SecretString, std::convert::Infallible> {
    Ok(SecretString::from(raw))
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an application document and add it to the catalog
    Add {
        /// Path to the JSON document
        #[arg(short, long)]
        file: PathBuf,

        /// Update an existing app instead of inserting
        #[arg(long)]
        update: bool,

        /// Id of the app to update (defaults to matching by slug)
        #[arg(long, requires = "update")]
        id: Option<String>,
    },
    /// Insert or update categories from a JSON array
    SeedCategories {
        /// Path to the JSON file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List apps in the catalog
    List {
        /// Only apps in this category slug
        #[arg(short, long)]
        category: Option<Slug>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mp_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Input validated before any database connection is made.
enum Prepared {
    Add {
        draft: marketplace_core::AppDraft,
        mode: WriteMode,
    },
    SeedCategories(Vec<marketplace_core::Category>),
    List(Option<Slug>),
}

async fn prepare(command: Commands) -> Result<Prepared, CliError> {
    Ok(match command {
        Commands::Add { file, update, id } => {
            let mode = WriteMode::from_flags(update, id.as_deref())?;
            let draft = commands::add::load(&file).await?;
            Prepared::Add { draft, mode }
        }
        Commands::SeedCategories { file } => {
            let entries = commands::seed::load(&file).await?;
            info!(path = %file.display(), count = entries.len(), "Parsed categories");
            Prepared::SeedCategories(entries)
        }
        Commands::List { category } => Prepared::List(category),
    })
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let prepared = prepare(cli.command).await?;

    let db = MarketDb::connect(&cli.mongodb_uri, &cli.database).await?;
    info!(database = %cli.database, "Connected to MongoDB");

    let result = execute(&db, prepared).await;
    db.shutdown().await;
    result
}

async fn execute(db: &MarketDb, prepared: Prepared) -> Result<(), CliError> {
    db.init_indexes().await?;
    let apps = db.apps();
    let categories = db.categories();

    match prepared {
        Prepared::Add { draft, mode } => {
            match commands::add::write(&apps, &categories, draft, mode).await? {
                Written::Inserted(id) => info!(%id, "App added"),
                Written::Updated(id) => info!(%id, "App updated"),
            }
        }
        Prepared::SeedCategories(entries) => {
            let summary = commands::seed::seed(&categories, entries).await?;
            info!(
                inserted = summary.inserted,
                updated = summary.updated,
                "Categories seeded"
            );
        }
        Prepared::List(category) => {
            commands::list::list(&apps, &categories, category).await?;
        }
    }
    Ok(())
}
