use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use price_sync::archive::ArchiveKind;
use price_sync::config::{Config, load_config_path};
use price_sync::db::{connection, migrate};
use price_sync::export::{ExportFilter, export_archive};
use price_sync::ingest::ingest;

#[derive(Parser)]
#[command(version, about = "Price ingestion and export CLI")]
struct Cli {
    /// Optional TOML config file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending schema migrations.
    Migrate,
    /// Ingest a CSV (raw or archived) and print the resulting stats as JSON.
    Ingest(IngestCmd),
    /// Export matching prices as a zip archive holding data.csv.
    Export(ExportCmd),
}

#[derive(Args)]
struct IngestCmd {
    /// Payload file; `-` reads stdin.
    #[arg(long, value_name = "FILE")]
    file: String,
    /// Archive type: zip or tar (defaults to the config's ingest.default_archive).
    #[arg(long = "type", value_name = "TYPE")]
    archive_type: Option<String>,
}

#[derive(Args)]
struct ExportCmd {
    /// Inclusive start date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,
    /// Inclusive end date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,
    /// Minimum price.
    #[arg(long)]
    min: Option<String>,
    /// Maximum price.
    #[arg(long)]
    max: Option<String>,
    /// Where to write the zip archive.
    #[arg(long, value_name = "FILE", default_value = "prices.zip")]
    out: PathBuf,
}

fn read_payload(file: &str) -> Result<Vec<u8>> {
    if file == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(file).with_context(|| format!("failed to read {file}"))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1) Config (file is optional, env overrides it)
    let cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => Config::default(),
    };

    // Validate the archive tag before touching the store.
    let hint = match &cli.cmd {
        Cmd::Ingest(IngestCmd {
            archive_type: Some(tag),
            ..
        }) => tag.parse::<ArchiveKind>()?,
        _ => cfg.ingest.default_archive,
    };

    // 2) Open DB, making sure the table exists
    let db_url = cfg.database_url()?;
    migrate::run_all(&db_url)?;
    let mut conn = connection::connect_sqlite(&db_url)?;

    // 3) Dispatch
    match cli.cmd {
        Cmd::Migrate => {
            tracing::info!(database = %db_url, "migrations applied");
        }
        Cmd::Ingest(IngestCmd { file, .. }) => {
            let payload = read_payload(&file)?;
            let stats = ingest(&mut conn, &payload, hint)?;
            println!("{}", serde_json::to_string(&stats)?);
        }
        Cmd::Export(ExportCmd {
            start,
            end,
            min,
            max,
            out,
        }) => {
            let filter = ExportFilter::from_params(
                start.as_deref(),
                end.as_deref(),
                min.as_deref(),
                max.as_deref(),
            )?;
            let archive = export_archive(&mut conn, &filter)?;
            std::fs::write(&out, archive)
                .with_context(|| format!("failed to write {}", out.display()))?;
        }
    }

    Ok(())
}
