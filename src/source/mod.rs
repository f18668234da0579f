//! Roster sources: where officer data comes from.
//!
//! Each upstream implements one contract — fetch the raw payload and parse
//! it into normalized records — so the pipeline driver never branches on the
//! source kind. Normalization is per-row/page fault tolerant: a record that
//! fails to parse is logged and skipped, never aborting the run.

use reqwest::blocking::Client;

use crate::error::PipelineError;
use crate::record::OfficerRecord;

pub mod notion;
pub mod sheet;

pub use notion::NotionSource;
pub use sheet::SheetSource;

/// Everything one fetch produced, before the change gate and materializer.
#[derive(Debug, Clone)]
pub struct RawRoster {
    /// The raw upstream payload exactly as hashed by the change detector:
    /// the CSV text, or the JSON serialization of all fetched pages.
    pub digest_input: String,
    /// Normalized records in source order.
    pub officers: Vec<OfficerRecord>,
    /// Semester tag claimed by the source, when it carries one.
    pub semester_hint: Option<String>,
}

/// A pluggable roster upstream.
pub trait RosterSource {
    /// Short name used in logs, e.g. `"sheet"` or `"notion"`.
    fn name(&self) -> &'static str;

    /// Fetches the raw payload and parses it into normalized records.
    ///
    /// Transport failures and non-success statuses are fatal; rows or pages
    /// that fail to normalize are skipped with a warning.
    fn fetch(&self, client: &Client) -> Result<RawRoster, PipelineError>;
}
