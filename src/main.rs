use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use reqwest::blocking::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roster_sync::{pipeline, NotionSource, PipelineConfig, RosterSource, SheetSource};

#[derive(Parser, Debug)]
#[command(
    name = "roster-sync",
    about = "Sync the officer roster from a spreadsheet or Notion into static JSON + images"
)]
struct Cli {
    /// Upstream to pull the roster from
    #[arg(long, value_enum, default_value_t = SourceKind::Sheet)]
    source: SourceKind,

    /// Rebuild even when the upstream content digest is unchanged
    #[arg(long, short = 'f', default_value_t = false)]
    force: bool,

    /// Output root; semester partitions are created underneath
    #[arg(long, env = "ROSTER_OUT_DIR", default_value = "public/fetched/officers")]
    out: PathBuf,

    /// Web path prefix written into image fields
    #[arg(long, env = "ROSTER_PUBLIC_PREFIX", default_value = "/fetched/officers")]
    public_prefix: String,

    /// Spreadsheet id for the sheet source
    #[arg(
        long,
        env = "ROSTER_SHEET_ID",
        default_value = "14UbNA9sB8NsfEnz-2FIDWwfZiG6E3yNHHsF6gQtaa4Y"
    )]
    sheet_id: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SourceKind {
    /// Spreadsheet CSV export (unauthenticated)
    Sheet,
    /// Notion database query (NOTION_API_KEY + NOTION_OFFICERS_DB_ID)
    Notion,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let client = Client::builder()
        .user_agent(concat!("roster-sync/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let source: Box<dyn RosterSource> = match cli.source {
        SourceKind::Sheet => Box::new(SheetSource::new(cli.sheet_id)),
        SourceKind::Notion => Box::new(NotionSource::from_env()?),
    };
    let config = PipelineConfig {
        out_root: cli.out,
        public_prefix: cli.public_prefix,
        force: cli.force,
    };

    let summary = pipeline::run(
        source.as_ref(),
        &client,
        &config,
        Local::now().date_naive(),
    )?;

    if summary.skipped {
        info!(semester = %summary.semester, "nothing to do");
    } else {
        info!(
            semester = %summary.semester,
            officers = summary.officers,
            images_succeeded = summary.images_succeeded,
            images_failed = summary.images_failed,
            "sync finished"
        );
    }
    Ok(())
}
