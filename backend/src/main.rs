//! Talentfunnel CLI - serve the dashboard API or run extractions offline
//!
//! # Main Commands
//!
//! ```bash
//! talentfunnel serve                              # Start HTTP server (PORT or 3001)
//! talentfunnel dashboard --snapshot ./snap        # Roles from a local snapshot
//! talentfunnel key-wins --snapshot ./snap --start 2024-08-01 --end 2024-08-07
//! talentfunnel daily-updates --snapshot ./snap --dept Engineering
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! talentfunnel columns --snapshot ./snap --tab Engineering   # Stage columns + column map
//! ```
//!
//! A snapshot is a directory of CSV exports (one per tab) or a `workbook.json`.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use talentfunnel::transform::dashboard::role_tab_layout;
use talentfunnel::{
    serve_from_env, AppConfig, DailyUpdatesQuery, DashboardQuery, DashboardService, KeyWinsQuery,
    SnapshotSource, TabularSource, DEFAULT_SNAPSHOT_ID,
};

#[derive(Parser)]
#[command(name = "talentfunnel")]
#[command(about = "Reshape recruiting spreadsheets into funnel dashboard records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Snapshot directory (CSV files or workbook.json)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Sub-directory of the snapshot to use, if present
    #[arg(long, default_value = DEFAULT_SNAPSHOT_ID)]
    source_id: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct WindowArgs {
    /// Window start (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    start: Option<String>,

    /// Window end, inclusive
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PORT or 3001)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Build dashboard roles from a snapshot
    Dashboard {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Prefer the form-responses tab over department tabs
        #[arg(long)]
        force_form: bool,
    },

    /// Extract key wins from a snapshot
    KeyWins {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Extract daily TA updates from a snapshot
    DailyUpdates {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Department filter
        #[arg(long)]
        dept: Option<String>,

        /// TA name filter
        #[arg(long)]
        ta: Option<String>,

        /// Country filter
        #[arg(long)]
        country: Option<String>,
    },

    /// Show how a department tab's columns are read
    Columns {
        #[command(flatten)]
        snapshot: SnapshotArgs,

        /// Tab title (case-insensitive)
        #[arg(short, long)]
        tab: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { port } => cmd_serve(port).await,

        Commands::Dashboard {
            snapshot,
            window,
            force_form,
        } => {
            let query = DashboardQuery {
                start: window.start,
                end: window.end,
                force_form: force_form.then(|| "true".to_string()),
            };
            cmd_dashboard(&snapshot, &query).await
        }

        Commands::KeyWins { snapshot, window } => {
            let query = KeyWinsQuery {
                start: window.start,
                end: window.end,
            };
            cmd_key_wins(&snapshot, &query).await
        }

        Commands::DailyUpdates {
            snapshot,
            window,
            dept,
            ta,
            country,
        } => {
            let query = DailyUpdatesQuery {
                start: window.start,
                end: window.end,
                dept,
                ta,
                country,
            };
            cmd_daily_updates(&snapshot, &query).await
        }

        Commands::Columns { snapshot, tab } => cmd_columns(&snapshot, &tab).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    serve_from_env(port).await?;
    Ok(())
}

fn offline_service(args: &SnapshotArgs) -> Result<DashboardService, Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let source: Arc<dyn TabularSource> = Arc::new(SnapshotSource::new(args.snapshot.clone()));
    Ok(DashboardService::new(
        Some(source),
        Some(args.source_id.clone()),
        config.settings(),
    ))
}

async fn cmd_dashboard(args: &SnapshotArgs, query: &DashboardQuery) -> Result<(), Box<dyn std::error::Error>> {
    let roles = offline_service(args)?.dashboard(query).await;
    write_json(&roles, args.output.as_deref())
}

async fn cmd_key_wins(args: &SnapshotArgs, query: &KeyWinsQuery) -> Result<(), Box<dyn std::error::Error>> {
    let wins = offline_service(args)?.key_wins(query).await;
    write_json(&wins, args.output.as_deref())
}

async fn cmd_daily_updates(
    args: &SnapshotArgs,
    query: &DailyUpdatesQuery,
) -> Result<(), Box<dyn std::error::Error>> {
    let updates = offline_service(args)?.daily_updates(query).await;
    write_json(&updates, args.output.as_deref())
}

async fn cmd_columns(args: &SnapshotArgs, title: &str) -> Result<(), Box<dyn std::error::Error>> {
    let source = SnapshotSource::new(args.snapshot.clone());
    let workbook = source.fetch_workbook(&args.source_id).await?;

    let tab = workbook
        .tabs
        .iter()
        .find(|t| t.title.trim().eq_ignore_ascii_case(title.trim()))
        .ok_or_else(|| {
            format!(
                "Tab not found: {} (available: {})",
                title,
                workbook.titles().join(", ")
            )
        })?;

    let layout = role_tab_layout(tab);
    eprintln!("Tab: {}", layout.title);
    eprintln!("   Stages: {}", layout.stages.join(", "));
    let missing = layout.columns.missing();
    if !missing.is_empty() {
        eprintln!("   Missing columns: {}", missing.join(", "));
    }

    write_json(&layout, args.output.as_deref())
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
