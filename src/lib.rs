#![warn(missing_docs)]
//! Officer roster sync pipeline.
//!
//! Fetches the roster from a spreadsheet CSV export or a Notion database,
//! normalizes it into a fixed record shape, downloads and recompresses
//! headshots, and persists a JSON roster plus images under a
//! semester-partitioned output directory. A SHA-256 digest of the raw
//! payload gates rebuilds so unchanged upstream data is a no-op.

pub mod assets;
pub mod csv;
pub mod digest;
mod error;
pub mod pipeline;
pub mod record;
pub mod semester;
pub mod source;

pub use error::PipelineError;
pub use pipeline::{run, PipelineConfig, RunSummary};
pub use record::OfficerRecord;
pub use source::{NotionSource, RawRoster, RosterSource, SheetSource};
