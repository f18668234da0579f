//! The pipeline driver: fetch, gate, materialize, persist.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::assets;
use crate::digest;
use crate::error::PipelineError;
use crate::semester;
use crate::source::RosterSource;

/// Name of the plaintext sidecar file holding the last content digest.
pub const SIDECAR_FILE: &str = ".source-hash";

/// Where and how a run writes its output.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which semester partitions are created, e.g.
    /// `public/fetched/officers`.
    pub out_root: PathBuf,
    /// Web path corresponding to `out_root`, e.g. `/fetched/officers`.
    pub public_prefix: String,
    /// Bypass the change detector and rebuild unconditionally.
    pub force: bool,
}

/// What one run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Semester partition the run resolved to.
    pub semester: String,
    /// Number of normalized officer records.
    pub officers: usize,
    /// Images now served from local files.
    pub images_succeeded: usize,
    /// Images left pointing at their remote URL after a failure.
    pub images_failed: usize,
    /// True when the change detector short-circuited the rebuild.
    pub skipped: bool,
}

/// Runs the pipeline end to end against one source.
///
/// Control flow: fetch raw + normalize, derive the semester partition, gate
/// on the content digest, then delete-and-recreate the partition directory,
/// materialize images, write the roster JSON, and persist the new digest.
/// `today` feeds the date-based semester fallback; callers pass the current
/// date.
pub fn run(
    source: &dyn RosterSource,
    client: &Client,
    config: &PipelineConfig,
    today: NaiveDate,
) -> Result<RunSummary, PipelineError> {
    let started = Instant::now();
    info!(source = source.name(), force = config.force, "starting roster sync");

    let raw = source.fetch(client)?;
    let semester = semester::derive(raw.semester_hint.as_deref(), today);
    let out_dir = config.out_root.join(&semester);
    let json_path = out_dir.join(format!("officers-{semester}.json"));
    let sidecar_path = out_dir.join(SIDECAR_FILE);
    info!(semester = %semester, out_dir = %out_dir.display(), "output paths configured");

    let current = digest::content_digest(&raw.digest_input);
    info!(digest = digest::short(&current), "content digest calculated");

    let previous = digest::read_previous(&sidecar_path);
    if previous.as_deref() == Some(current.as_str()) && !config.force {
        info!("source data unchanged, skipping rebuild (use --force to override)");
        return Ok(RunSummary {
            semester,
            officers: raw.officers.len(),
            images_succeeded: 0,
            images_failed: 0,
            skipped: true,
        });
    }
    if config.force {
        info!("force rebuild requested, proceeding regardless of digest");
    }

    // Clean rebuild: clear the whole partition so no stale image from a
    // previous roster lingers.
    recreate_dir(&out_dir)?;

    let mut officers = raw.officers;
    let public_prefix = format!(
        "{}/{semester}",
        config.public_prefix.trim_end_matches('/')
    );
    let outcome = assets::materialize(client, &mut officers, &out_dir, &public_prefix);

    let json = serde_json::to_string_pretty(&officers)?;
    fs::write(&json_path, json)?;
    info!(file = %json_path.display(), count = officers.len(), "roster JSON saved");

    // A lost sidecar only costs one extra rebuild, so this is non-fatal.
    if let Err(err) = digest::write_current(&sidecar_path, &current) {
        warn!(error = %err, "could not persist digest sidecar");
    }

    info!(
        duration_ms = started.elapsed().as_millis() as u64,
        officers = officers.len(),
        "roster sync completed"
    );
    Ok(RunSummary {
        semester,
        officers: officers.len(),
        images_succeeded: outcome.succeeded,
        images_failed: outcome.failed,
        skipped: false,
    })
}

fn recreate_dir(dir: &Path) -> Result<(), PipelineError> {
    if dir.exists() {
        info!(dir = %dir.display(), "deleting existing partition directory for clean rebuild");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}
