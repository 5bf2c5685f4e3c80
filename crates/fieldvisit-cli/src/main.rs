//! Fieldvisit CLI: record field visits from the command line.
//!
//! Settings come from the environment or a `.env` file (FIELDVISIT_BASE_DIR,
//! FIELDVISIT_LEDGER_PATH, FIELDVISIT_ROSTER, UPLOAD_ENABLED, S3_BUCKET, ...).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use fieldvisit_cli::{
    init_tracing, load_attachments, report_error, required_uploader, truncate_string,
};
use fieldvisit_core::{AppError, AttachmentSet, Category, Config, VisitDraft};
use fieldvisit_recorder::{Ledger, LedgerRow, SubmissionRecorder};
use fieldvisit_storage::{upload_submission, RemoteUploader};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "fieldvisit", about = "Field visit recorder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a visit: store its photos and add a row to the ledger
    Record(RecordArgs),
    /// Upload the ledger and one visit directory to remote storage
    Upload {
        /// Visit directory, as printed by `record` (storage_path)
        #[arg(long)]
        dir: PathBuf,
    },
    /// Print the ledger
    Ledger {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List the photographers that can sign a visit
    Roster,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(clap::Args)]
struct RecordArgs {
    /// Visit date (YYYY-MM-DD). Defaults to today in FIELDVISIT_TIMEZONE
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Visit time (HH:MM). Defaults to now in FIELDVISIT_TIMEZONE
    #[arg(long, value_parser = parse_time)]
    time: Option<NaiveTime>,
    #[arg(long, default_value = "")]
    latitude: String,
    #[arg(long, default_value = "")]
    longitude: String,
    /// State of the scene on arrival
    #[arg(long, default_value = "")]
    preservation: String,
    /// Vehicle used
    #[arg(long, default_value = "")]
    vehicle: String,
    #[arg(long, default_value = "")]
    companion: String,
    /// Photographer in charge. Defaults to the first roster entry
    #[arg(long)]
    photographer: Option<String>,
    /// Collected materials
    #[arg(long, default_value = "")]
    materials: String,
    #[arg(long, default_value = "")]
    notes: String,
    /// Facade photo (1 kept)
    #[arg(long, num_args = 1..)]
    facade: Vec<PathBuf>,
    /// Access photos (3 kept)
    #[arg(long, num_args = 1..)]
    access: Vec<PathBuf>,
    /// Trace photos (10 kept)
    #[arg(long, num_args = 1..)]
    traces: Vec<PathBuf>,
    /// Fingerprint and DNA photos (5 kept)
    #[arg(long = "prints-dna", num_args = 1..)]
    prints_dna: Vec<PathBuf>,
    /// Upload the ledger and the visit photos once recorded
    #[arg(long)]
    upload: bool,
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM: {}", e))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid fieldvisit configuration")?;

    if let Err(err) = run(cli.command, &config).await {
        report_error(&err);
        return Err(err.into());
    }

    Ok(())
}

async fn run(command: Commands, config: &Config) -> Result<(), AppError> {
    match command {
        Commands::Record(args) => record(args, config).await,
        Commands::Upload { dir } => upload(config, &required_uploader(config)?, &dir).await,
        Commands::Ledger { format } => {
            let rows = Ledger::new(config.ledger_path()).load().await?;
            match format {
                OutputFormat::Json => print_json(&rows).map_err(AppError::from),
                OutputFormat::Table => {
                    print_ledger_table(&rows);
                    Ok(())
                }
            }
        }
        Commands::Roster => {
            for (i, name) in config.roster().names().iter().enumerate() {
                let marker = if i == 0 { " (default)" } else { "" };
                println!("{}{}", name, marker);
            }
            Ok(())
        }
    }
}

async fn record(args: RecordArgs, config: &Config) -> Result<(), AppError> {
    // Resolve the uploader first so a disabled upload fails before anything is written.
    let uploader = if args.upload {
        Some(required_uploader(config)?)
    } else {
        None
    };

    let mut draft = VisitDraft::prefilled(config.timezone());
    if args.date.is_some() {
        draft.visit_date = args.date;
    }
    if args.time.is_some() {
        draft.visit_time = args.time;
    }
    draft.latitude = args.latitude;
    draft.longitude = args.longitude;
    draft.preservation = args.preservation;
    draft.vehicle = args.vehicle;
    draft.companion = args.companion;
    draft.photographer = args.photographer;
    draft.materials = args.materials;
    draft.notes = args.notes;

    let visit = draft.finalize(config.roster())?;

    let attachments = AttachmentSet::new()
        .with(Category::Facade, load_attachments(&args.facade).await?)
        .with(Category::Access, load_attachments(&args.access).await?)
        .with(Category::Traces, load_attachments(&args.traces).await?)
        .with(Category::PrintsDna, load_attachments(&args.prints_dna).await?);

    let recorder = SubmissionRecorder::from_config(config).await?;
    let receipt = recorder.record(visit, attachments).await?;

    for (category, dropped) in &receipt.dropped {
        eprintln!(
            "Note: {} extra {} photo(s) ignored (limit {})",
            dropped,
            category.label(),
            category.max_count()
        );
    }
    print_json(&receipt)?;

    if let Some(uploader) = uploader {
        upload(config, &uploader, Path::new(&receipt.storage_path)).await?;
    }

    Ok(())
}

async fn upload(
    config: &Config,
    uploader: &Arc<dyn RemoteUploader>,
    visit_dir: &Path,
) -> Result<(), AppError> {
    if !visit_dir.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "Visit directory not found: {}",
            visit_dir.display()
        )));
    }

    let report = upload_submission(
        uploader.as_ref(),
        config.remote_folder(),
        config.ledger_path(),
        visit_dir,
    )
    .await?;

    print_json(&serde_json::json!({
        "remote_folder": config.remote_folder(),
        "uploaded": report.uploaded,
    }))?;
    Ok(())
}

fn print_ledger_table(rows: &[LedgerRow]) {
    println!(
        "{:<10}  {:<5}  {:<24}  {:<20}  {}",
        "Date", "Time", "Photographer", "Location", "Photos"
    );
    for row in rows {
        let location = if row.latitude.is_empty() && row.longitude.is_empty() {
            "-".to_string()
        } else {
            format!("{}, {}", row.latitude, row.longitude)
        };
        println!(
            "{:<10}  {:<5}  {:<24}  {:<20}  {}",
            row.visit_date.format("%d/%m/%Y"),
            row.visit_time.format("%H:%M"),
            truncate_string(&row.photographer, 24),
            truncate_string(&location, 20),
            row.storage_path
        );
    }
    println!("\n{} visit(s)", rows.len());
}
