//! Notion database source.
//!
//! Queries the officers database through the Notion API, following cursor
//! pagination until exhausted, and extracts typed properties (title,
//! rich_text, url, files) into [`OfficerRecord`]s. The raw pages are kept
//! around in fetch order because their JSON serialization is what the change
//! detector hashes.

use std::env;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::record::OfficerRecord;
use crate::source::{RawRoster, RosterSource};

const NOTION_VERSION: &str = "2022-06-28";

/// Roster source backed by a Notion database.
#[derive(Debug, Clone)]
pub struct NotionSource {
    api_key: String,
    database_id: String,
}

impl NotionSource {
    /// Creates a source from explicit credentials.
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_id: database_id.into(),
        }
    }

    /// Reads `NOTION_API_KEY` and `NOTION_OFFICERS_DB_ID` from the
    /// environment, failing fast when either is absent.
    pub fn from_env() -> Result<Self, PipelineError> {
        let api_key = env::var("NOTION_API_KEY")
            .map_err(|_| PipelineError::MissingConfig("NOTION_API_KEY"))?;
        let database_id = env::var("NOTION_OFFICERS_DB_ID")
            .map_err(|_| PipelineError::MissingConfig("NOTION_OFFICERS_DB_ID"))?;
        Ok(Self::new(api_key, database_id))
    }

    fn query_pages(&self, client: &Client) -> Result<Vec<Value>, PipelineError> {
        let url = format!(
            "https://api.notion.com/v1/databases/{}/query",
            self.database_id
        );
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = match &cursor {
                Some(cur) => json!({ "start_cursor": cur }),
                None => json!({}),
            };
            let response: Value = client
                .post(&url)
                .bearer_auth(&self.api_key)
                .header("Notion-Version", NOTION_VERSION)
                .json(&body)
                .send()
                .and_then(|resp| resp.error_for_status())
                .map_err(|err| PipelineError::http("Notion database query", err))?
                .json()
                .map_err(|err| PipelineError::http("Notion database query body", err))?;

            let results = response
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| PipelineError::Upstream {
                    context: "Notion",
                    detail: "query response missing results array".to_string(),
                })?;
            pages.extend(results.iter().cloned());

            let has_more = response
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !has_more {
                break;
            }
            cursor = response
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        Ok(pages)
    }
}

impl RosterSource for NotionSource {
    fn name(&self) -> &'static str {
        "notion"
    }

    fn fetch(&self, client: &Client) -> Result<RawRoster, PipelineError> {
        info!(database_id = %self.database_id, "querying Notion officers database");
        let pages = self.query_pages(client)?;
        info!(count = pages.len(), "Notion pages fetched");

        let digest_input = serde_json::to_string(&pages)?;
        let semester_hint = semester_hint(&pages);
        let officers = normalize_pages(&pages);
        info!(count = officers.len(), "Notion pages normalized");

        Ok(RawRoster {
            digest_input,
            officers,
            semester_hint,
        })
    }
}

/// Extracts officer records from raw Notion pages, skipping pages that do
/// not have the expected property shape.
pub fn normalize_pages(pages: &[Value]) -> Vec<OfficerRecord> {
    let mut officers = Vec::new();
    for page in pages {
        match normalize_page(page) {
            Some(record) => {
                debug!(name = %record.name, "normalized Notion page");
                officers.push(record);
            }
            None => {
                let page_id = page.get("id").and_then(Value::as_str).unwrap_or("<unknown>");
                warn!(page_id, "failed to parse Notion page, skipping");
            }
        }
    }
    officers
}

/// Reads the semester tag from the first page's `Semester` rich-text field.
pub fn semester_hint(pages: &[Value]) -> Option<String> {
    let first = pages.first()?;
    let props = first.get("properties")?;
    let text = rich_text(props.get("Semester")?);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn normalize_page(page: &Value) -> Option<OfficerRecord> {
    let props = page.get("properties")?.as_object()?;

    let full_name = props
        .get("Name")
        .map(|p| plain_text(p.get("title")))
        .unwrap_or_default();
    let preferred = props.get("Preferred Name").map(rich_text).unwrap_or_default();
    let name = if preferred.is_empty() { full_name } else { preferred };

    Some(OfficerRecord {
        name,
        role: props.get("Role").map(rich_text).unwrap_or_default(),
        image: props
            .get("headshot")
            .map(first_file_url)
            .unwrap_or_default(),
        bio: props.get("Bio").map(rich_text).unwrap_or_default(),
        personal_website: props
            .get("Personal Website")
            .map(url_field)
            .unwrap_or_default(),
        linkedin: props.get("Linkedin").map(url_field).unwrap_or_default(),
        github: props.get("GitHub").map(url_field).unwrap_or_default(),
        orcid: props.get("ORCID").map(url_field).unwrap_or_default(),
    })
}

/// Joins the plain-text segments of a rich-text property.
fn rich_text(property: &Value) -> String {
    plain_text(property.get("rich_text"))
}

fn plain_text(segments: Option<&Value>) -> String {
    let Some(segments) = segments.and_then(Value::as_array) else {
        return String::new();
    };
    segments
        .iter()
        .filter_map(|segment| segment.get("plain_text").and_then(Value::as_str))
        .collect()
}

fn url_field(property: &Value) -> String {
    property
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First attached file's URL: hosted files carry `file.url`, links carry
/// `external.url`.
fn first_file_url(property: &Value) -> String {
    let Some(file) = property
        .get("files")
        .and_then(Value::as_array)
        .and_then(|files| files.first())
    else {
        return String::new();
    };
    let url = match file.get("type").and_then(Value::as_str) {
        Some("file") => file.pointer("/file/url"),
        _ => file.pointer("/external/url"),
    };
    url.and_then(Value::as_str).unwrap_or_default().to_string()
}
