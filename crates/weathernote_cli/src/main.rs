//! Operator CLI for the weather notification collection.
//!
//! # Responsibility
//! - Drive the same sync controller the admin screen uses.
//! - Print one status line per action, matching the screen's notices.

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use weathernote_core::{
    default_log_level, init_logging, open_collection, Notification, NotificationForm,
    NotificationId, NotificationKind, SqliteCollection, StoreConfig, SyncController,
};

/// Command-line options for the notification admin CLI.
#[derive(Parser)]
#[command(name = "weathernote", version)]
struct Cli {
    /// Database file; overrides WEATHERNOTE_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Collection name; overrides WEATHERNOTE_COLLECTION
    #[arg(long, global = true)]
    collection: Option<String>,
    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,
    /// Log level used with --log-dir
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core linkage info
    Ping,
    /// List notifications, newest first
    List,
    /// Create a notification and print the refreshed list
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]
        #[arg(long, value_parser = parse_operator_date)]
        date: NaiveDateTime,
        #[arg(long = "type", value_enum, default_value_t = KindArg::Info)]
        kind: KindArg,
    },
    /// Delete a notification by id
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Warning,
    Info,
}

impl From<KindArg> for NotificationKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Warning => NotificationKind::Warning,
            KindArg::Info => NotificationKind::Info,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    if let Command::Ping = cli.command {
        println!("weathernote_core ping={}", weathernote_core::ping());
        println!(
            "weathernote_core version={}",
            weathernote_core::core_version()
        );
        return ExitCode::SUCCESS;
    }

    let mut config = StoreConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(collection) = cli.collection {
        config.collection = collection;
    }

    let collection = match open_collection(&config) {
        Ok(collection) => collection,
        Err(err) => {
            eprintln!("Failed to open notification store: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut controller = SyncController::new(collection);

    match run(&mut controller, cli.command) {
        Ok(message) => {
            println!("{message}");
            print_list(controller.notifications());
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(controller: &mut SyncController<SqliteCollection>, command: Command) -> Result<String, String> {
    match command {
        Command::Ping => Ok(String::new()),
        Command::List => controller
            .refresh()
            .map(|count| format!("Loaded {count} notification(s)."))
            .map_err(|err| err.to_string()),
        Command::Create {
            title,
            description,
            date,
            kind,
        } => {
            let form = NotificationForm {
                title,
                description,
                date,
                kind: kind.into(),
            };
            controller
                .submit(form)
                .map(|outcome| match outcome.reload {
                    None => format!("Notification created. id={}", outcome.id),
                    Some(err) => format!("Notification created. id={} {err}", outcome.id),
                })
                .map_err(|err| err.to_string())
        }
        Command::Delete { id } => {
            // Load first so the printed list reflects the store after deletion.
            controller.refresh().map_err(|err| err.to_string())?;
            controller
                .delete(&NotificationId::new(id))
                .map(|()| "Notification deleted.".to_string())
                .map_err(|err| err.to_string())
        }
    }
}

fn print_list(notifications: &[Notification]) {
    for notification in notifications {
        println!(
            "{}\t{}\t{}\t{}",
            notification
                .id
                .as_ref()
                .map(NotificationId::as_str)
                .unwrap_or("-"),
            notification.kind.as_str(),
            notification.date.format("%Y-%m-%d %H:%M"),
            notification.title
        );
    }
}

fn parse_operator_date(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("invalid date `{value}`"));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS], got `{value}`"))
}
