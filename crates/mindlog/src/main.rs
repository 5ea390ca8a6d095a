// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mindlog - background journal analysis and quota-gated growth reports.
//!
//! This is the binary entry point: `serve` runs the analysis worker pool,
//! the other subcommands are one-shot operations against the same database.

mod app;
mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use miette::IntoDiagnostic;
use mindlog_config::{ConfigError, MindlogConfig};
use mindlog_core::{EntryId, MindlogError, Tier, Timeframe, UserId};

use crate::app::App;
use crate::commands::print_json;

/// Mindlog - background journal analysis and growth reports.
#[derive(Parser, Debug)]
#[command(name = "mindlog", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Without it the XDG hierarchy and ./mindlog.toml are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the analysis worker pool until SIGINT or SIGTERM.
    Serve,
    /// Manage users and their plans.
    #[command(subcommand)]
    User(UserCommand),
    /// Write and inspect journal entries.
    #[command(subcommand)]
    Entry(EntryCommand),
    /// Queue (re-)analysis of an existing entry.
    Enqueue { entry_id: String },
    /// Generate a growth report, served from cache while fresh.
    Report {
        user: String,
        #[arg(long, default_value = "week", value_parser = parse_timeframe)]
        timeframe: Timeframe,
        /// Regenerate even if a fresh cached report exists.
        #[arg(long)]
        force: bool,
    },
    /// Generate three personal challenges.
    Challenges { user: String },
    /// Generate the monthly deep report.
    Monthly { user: String },
    /// Name what most often lowers and lifts a user's mood.
    Patterns { user: String },
    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Inspect and run background jobs.
    #[command(subcommand)]
    Jobs(JobsCommand),
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create a user or change their plan.
    Set {
        user: String,
        #[arg(value_parser = parse_tier)]
        tier: Tier,
        /// Days until a paid plan expires (default 30).
        #[arg(long)]
        expires_in_days: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum EntryCommand {
    /// Store an entry dated now and queue its analysis.
    Add {
        user: String,
        content: String,
        /// Mood score from 1 to 10.
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        mood: Option<u8>,
        /// Store the entry without queueing analysis.
        #[arg(long)]
        no_analysis: bool,
    },
    /// Show an entry's job and analysis result.
    Show { entry_id: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration and print a summary.
    Check,
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    /// Job counts by status.
    Status,
    /// Run every due job inline, then exit.
    Drain,
}

fn parse_tier(s: &str) -> Result<Tier, String> {
    Tier::from_str(s).map_err(|_| format!("unknown tier '{s}' (basic, standard, premium)"))
}

fn parse_timeframe(s: &str) -> Result<Timeframe, String> {
    Timeframe::from_str(s).map_err(|_| format!("unknown timeframe '{s}' (week, month, year, all)"))
}

fn load_config(path: Option<&PathBuf>) -> Result<MindlogConfig, Vec<ConfigError>> {
    match path {
        Some(path) => mindlog_config::load_and_validate_path(path),
        None => mindlog_config::load_and_validate(),
    }
}

/// Crates whose logs follow `logging.level`; everything else stays at warn.
const LOG_TARGETS: &[&str] = &[
    "mindlog",
    "mindlog_analysis",
    "mindlog_inference",
    "mindlog_jobs",
    "mindlog_quota",
    "mindlog_storage",
];

fn default_filter(log_level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            mindlog_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Commands::Config(ConfigCommand::Check) = cli.command {
        println!("{}", commands::describe_config(&config));
        return Ok(());
    }

    init_tracing(&config.logging.level);
    run(cli.command, config).await.into_diagnostic()
}

async fn run(command: Commands, config: MindlogConfig) -> Result<(), MindlogError> {
    let app = App::open(config).await?;

    match command {
        Commands::Serve => {
            let inference = app.connect_inference()?;
            let shutdown = shutdown::install_signal_handler();
            serve::run_serve(&app, inference, shutdown).await
        }
        Commands::User(UserCommand::Set {
            user,
            tier,
            expires_in_days,
        }) => commands::set_user(&app, &UserId(user), tier, expires_in_days).await,
        Commands::Entry(EntryCommand::Add {
            user,
            content,
            mood,
            no_analysis,
        }) => {
            let added =
                commands::add_entry(&app, &UserId(user), &content, mood, !no_analysis).await?;
            print_json(&added)
        }
        Commands::Entry(EntryCommand::Show { entry_id }) => {
            print_json(&commands::entry_status(&app, &EntryId(entry_id)).await?)
        }
        Commands::Enqueue { entry_id } => {
            let job_id = commands::enqueue(&app, &EntryId(entry_id)).await?;
            print_json(&serde_json::json!({ "jobId": job_id }))
        }
        Commands::Report {
            user,
            timeframe,
            force,
        } => {
            let inference = app.connect_inference()?;
            let reports = app.reports(inference.provider);
            print_json(&reports.generate_report(&UserId(user), timeframe, force).await?)
        }
        Commands::Challenges { user } => {
            let inference = app.connect_inference()?;
            let reports = app.reports(inference.provider);
            print_json(&reports.generate_challenges(&UserId(user)).await?)
        }
        Commands::Monthly { user } => {
            let inference = app.connect_inference()?;
            let reports = app.reports(inference.provider);
            print_json(&reports.generate_monthly_report(&UserId(user)).await?)
        }
        Commands::Patterns { user } => {
            let inference = app.connect_inference()?;
            let reports = app.reports(inference.provider);
            print_json(&reports.generate_emotional_patterns(&UserId(user)).await?)
        }
        Commands::Config(ConfigCommand::Check) => Ok(()),
        Commands::Jobs(JobsCommand::Status) => print_json(&app.storage.job_counts().await?),
        Commands::Jobs(JobsCommand::Drain) => {
            let inference = app.connect_inference()?;
            print_json(&commands::drain_jobs(&app, inference.provider).await?)
        }
    }
}
