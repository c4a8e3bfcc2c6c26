//! Command-line front end for the cat registry.
//!
//! Runs one core operation per invocation and prints its wire form as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kittygram_core::db::open_db;
use kittygram_core::{
    init_logging, parse_payload, CatPayload, CatSummaryPayload, CoreConfig, KittygramService,
    OwnerPayload, ServiceError,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "kittygram", version, about = "Manage owners, cats and achievements")]
struct Cli {
    /// JSON config file; environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Cat {
        #[command(subcommand)]
        action: CatAction,
    },
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
    /// List every known achievement.
    Achievements,
}

#[derive(Debug, Subcommand)]
enum CatAction {
    #[command(flatten)]
    Record(RecordAction),
    /// Optional `{"color": ...}` filter.
    List {
        #[arg(long)]
        json: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum OwnerAction {
    #[command(flatten)]
    Record(RecordAction),
    List,
}

/// Actions shared by cats and owners.
#[derive(Debug, Subcommand)]
enum RecordAction {
    Create {
        #[arg(long)]
        json: String,
    },
    /// Partial update: absent fields keep their stored values.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        json: String,
    },
    Get {
        #[arg(long)]
        id: i64,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = CoreConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if let Some(mut settings) = config.log_settings() {
        if settings.log_dir.is_relative() {
            settings.log_dir = std::env::current_dir()?.join(&settings.log_dir);
        }
        init_logging(&settings).context("initializing logging")?;
    }

    let mut conn = open_db(&config.db_path)
        .with_context(|| format!("opening database `{}`", config.db_path.display()))?;
    let mut service = KittygramService::new(&mut conn);

    match run(&mut service, cli.command) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(ServiceError::Validation(errors)) => {
            eprintln!("{}", serde_json::to_string_pretty(&errors)?);
            Ok(ExitCode::from(2))
        }
        Err(err) => Err(err.into()),
    }
}

fn run(service: &mut KittygramService<'_>, command: Command) -> Result<(), ServiceError> {
    match command {
        Command::Cat { action } => run_cat(service, action),
        Command::Owner { action } => run_owner(service, action),
        Command::Achievements => print_json(&service.list_achievements()?),
    }
}

fn run_cat(service: &mut KittygramService<'_>, action: CatAction) -> Result<(), ServiceError> {
    match action {
        CatAction::Record(RecordAction::Create { json }) => {
            print_json(&service.create_cat(parse_payload(&json)?)?)
        }
        CatAction::Record(RecordAction::Update { id, json }) => {
            let payload: CatPayload = parse_payload(&json)?;
            print_json(&service.update_cat(id, payload)?)
        }
        CatAction::Record(RecordAction::Get { id }) => print_json(&service.get_cat(id)?),
        CatAction::Record(RecordAction::Delete { id }) => service.delete_cat(id),
        CatAction::List { json } => {
            let payload: CatSummaryPayload = match json {
                Some(json) => parse_payload(&json)?,
                None => CatSummaryPayload::default(),
            };
            print_json(&service.list_cats(&payload.validate()?)?)
        }
    }
}

fn run_owner(
    service: &mut KittygramService<'_>,
    action: OwnerAction,
) -> Result<(), ServiceError> {
    match action {
        OwnerAction::Record(RecordAction::Create { json }) => {
            print_json(&service.create_owner(parse_payload(&json)?)?)
        }
        OwnerAction::Record(RecordAction::Update { id, json }) => {
            let payload: OwnerPayload = parse_payload(&json)?;
            print_json(&service.update_owner(id, payload)?)
        }
        OwnerAction::Record(RecordAction::Get { id }) => print_json(&service.get_owner(id)?),
        OwnerAction::Record(RecordAction::Delete { id }) => service.delete_owner(id),
        OwnerAction::List => print_json(&service.list_owners()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServiceError> {
    let rendered = serde_json::to_string_pretty(value).map_err(ServiceError::Malformed)?;
    println!("{rendered}");
    Ok(())
}
