//! Content digests gating redundant rebuilds.
//!
//! The pipeline hashes the raw upstream payload and keeps the previous
//! digest in a plaintext sidecar file next to the roster JSON. A matching
//! digest means the upstream data has not changed and the rebuild can be
//! skipped. This is an at-most-once-per-change optimization, not a
//! correctness gate: a lost sidecar merely forces a wasteful rebuild.

use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

/// SHA-256 of the raw payload as 64 lowercase hex characters.
pub fn content_digest(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Short prefix of a digest used in log fields.
pub fn short(digest: &str) -> &str {
    &digest[..digest.len().min(8)]
}

/// Reads the previously persisted digest, if any.
///
/// A missing sidecar reads as "no previous value" and forces a rebuild;
/// other read errors are treated the same way since a spurious rebuild is
/// always safe.
pub fn read_previous(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let digest = contents.trim().to_string();
            debug!(digest = short(&digest), "previous digest loaded");
            Some(digest)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read digest sidecar");
            None
        }
    }
}

/// Overwrites the sidecar with the digest of the payload just processed.
pub fn write_current(path: &Path, digest: &str) -> io::Result<()> {
    fs::write(path, digest)?;
    debug!(digest = short(digest), "digest sidecar updated");
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
