use std::io;

use thiserror::Error;

/// Fatal pipeline failures that abort a run.
///
/// Per-record trouble (one unparseable row, one failed image download) is
/// deliberately not represented here; those are logged and substituted with
/// fallbacks so partial results still land.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required environment variable or setting is absent.
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),
    /// Transport failure or non-success status talking to an upstream.
    #[error("{context}: {source}")]
    Http {
        /// What the request was for, e.g. "roster CSV export".
        context: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// An upstream response parsed but did not have the expected shape.
    #[error("unexpected {context} response: {detail}")]
    Upstream {
        /// Which upstream produced the response.
        context: &'static str,
        /// What was wrong with it.
        detail: String,
    },
    /// Filesystem failure on the output directory or roster JSON.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Roster JSON (de)serialization failure.
    #[error("roster serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wraps a transport error with a description of the request.
    pub fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            context: context.into(),
            source,
        }
    }
}
