//! Spreadsheet CSV export source.
//!
//! Pulls the roster sheet through its unauthenticated CSV export endpoint
//! and maps header names directly onto [`OfficerRecord`] fields. Image cells
//! holding a Google Drive share link are rewritten to the direct-download
//! form so the asset materializer can fetch the binary.

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::csv;
use crate::error::PipelineError;
use crate::record::OfficerRecord;
use crate::source::{RawRoster, RosterSource};

/// Roster source backed by a published spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetSource {
    sheet_id: String,
}

impl SheetSource {
    /// Creates a source for the given spreadsheet id.
    pub fn new(sheet_id: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
        }
    }

    fn export_url(&self) -> String {
        format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
            self.sheet_id
        )
    }
}

impl RosterSource for SheetSource {
    fn name(&self) -> &'static str {
        "sheet"
    }

    fn fetch(&self, client: &Client) -> Result<RawRoster, PipelineError> {
        let url = self.export_url();
        info!(sheet_id = %self.sheet_id, "fetching roster CSV export");
        let csv_text = client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| PipelineError::http("roster CSV export", err))?
            .text()
            .map_err(|err| PipelineError::http("roster CSV export body", err))?;

        let officers = officers_from_csv(&csv_text);
        info!(count = officers.len(), "CSV rows normalized");

        Ok(RawRoster {
            digest_input: csv_text,
            officers,
            semester_hint: None,
        })
    }
}

/// Normalizes CSV text into officer records.
///
/// The first row is the header; header names match record fields
/// case-sensitively after trimming. Rows whose fields are all blank are
/// dropped. Shorter rows leave the remaining fields empty.
pub fn officers_from_csv(csv_text: &str) -> Vec<OfficerRecord> {
    let mut rows = csv::parse_rows(csv_text).into_iter();
    let Some(headers) = rows.next() else {
        debug!("CSV export was empty");
        return Vec::new();
    };

    let mut officers = Vec::new();
    for row in rows {
        let mut record = OfficerRecord::default();
        for (header, value) in headers.iter().zip(row) {
            let value = value.trim().to_string();
            if header.trim() == "image" {
                record.set_field(header, rewrite_drive_url(&value));
            } else {
                record.set_field(header, value);
            }
        }
        if record.is_blank() {
            continue;
        }
        debug!(name = %record.name, "normalized CSV row");
        officers.push(record);
    }
    officers
}

/// Rewrites a Google Drive share URL to its direct-download form.
///
/// A URL containing `/d/<ID>/` becomes
/// `https://drive.google.com/uc?export=download&id=<ID>`. Anything that is
/// not a Drive share link passes through unchanged.
pub fn rewrite_drive_url(url: &str) -> String {
    if !url.contains("drive.google.com") {
        return url.to_string();
    }
    let Some(start) = url.find("/d/") else {
        return url.to_string();
    };
    let rest = &url[start + 3..];
    let Some(end) = rest.find('/') else {
        return url.to_string();
    };
    let id = &rest[..end];
    if id.is_empty() {
        return url.to_string();
    }
    format!("https://drive.google.com/uc?export=download&id={id}")
}

#[cfg(test)]
mod tests {
    use super::{officers_from_csv, rewrite_drive_url};
    use pretty_assertions::assert_eq;

    #[test]
    fn drive_share_links_rewrite_to_download_form() {
        let shared = "https://drive.google.com/file/d/1AbC-xyz/view?usp=sharing";
        assert_eq!(
            rewrite_drive_url(shared),
            "https://drive.google.com/uc?export=download&id=1AbC-xyz"
        );
    }

    #[test]
    fn non_drive_urls_pass_through() {
        let direct = "https://example.org/photos/ada.jpg";
        assert_eq!(rewrite_drive_url(direct), direct);

        let drive_without_pattern = "https://drive.google.com/open?id=1AbC";
        assert_eq!(rewrite_drive_url(drive_without_pattern), drive_without_pattern);
    }

    #[test]
    fn header_lookup_maps_fields_and_skips_blank_rows() {
        let csv_text = "\
name,role,image,bio,personal website,linkedin,github,orcid
Ada Lovelace,President,https://example.org/ada.png,First programmer,https://ada.dev,,,
,,,,,,,
Grace Hopper,Advisor,,,,https://linkedin.com/in/grace,,
";
        let officers = officers_from_csv(csv_text);
        assert_eq!(officers.len(), 2);
        assert_eq!(officers[0].name, "Ada Lovelace");
        assert_eq!(officers[0].role, "President");
        assert_eq!(officers[0].personal_website, "https://ada.dev");
        assert_eq!(officers[1].name, "Grace Hopper");
        assert_eq!(officers[1].linkedin, "https://linkedin.com/in/grace");
        assert_eq!(officers[1].image, "");
    }

    #[test]
    fn image_column_gets_drive_rewrite() {
        let csv_text = "\
name,image
Ada,https://drive.google.com/file/d/42abc/view
";
        let officers = officers_from_csv(csv_text);
        assert_eq!(
            officers[0].image,
            "https://drive.google.com/uc?export=download&id=42abc"
        );
    }

    #[test]
    fn short_rows_leave_remaining_fields_empty() {
        let csv_text = "name,role,bio\nAda,President\n";
        let officers = officers_from_csv(csv_text);
        assert_eq!(officers[0].bio, "");
        assert_eq!(officers[0].role, "President");
    }

    #[test]
    fn empty_export_yields_no_officers() {
        assert!(officers_from_csv("").is_empty());
        assert!(officers_from_csv("name,role\n").is_empty());
    }
}
