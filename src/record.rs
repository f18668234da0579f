//! The normalized officer record shared by every roster source.

use serde::{Deserialize, Serialize};

/// One officer as persisted in the roster JSON consumed by the site.
///
/// Every field is a plain string defaulting to empty; upstream sources are
/// spreadsheets edited by humans, so absence and blankness are equivalent.
/// Duplicate names are allowed and simply produce two records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficerRecord {
    /// Display name (preferred name when the source distinguishes one).
    #[serde(default)]
    pub name: String,
    /// Officer role or title.
    #[serde(default)]
    pub role: String,
    /// Headshot reference. A remote URL coming out of the normalizer; the
    /// asset materializer rewrites it to a local web path on success.
    #[serde(default)]
    pub image: String,
    /// Short biography.
    #[serde(default)]
    pub bio: String,
    /// Personal website URL. The JSON key keeps the embedded space because
    /// the consuming page indexes the field by that exact name.
    #[serde(rename = "personal website", default)]
    pub personal_website: String,
    /// LinkedIn profile URL.
    #[serde(default)]
    pub linkedin: String,
    /// GitHub profile URL.
    #[serde(default)]
    pub github: String,
    /// ORCID profile URL.
    #[serde(default)]
    pub orcid: String,
}

impl OfficerRecord {
    /// Assigns a value to the field matching a spreadsheet header.
    ///
    /// Header names are matched case-sensitively after trimming. Unknown
    /// headers are ignored so extra spreadsheet columns never break a run.
    pub fn set_field(&mut self, header: &str, value: String) {
        match header.trim() {
            "name" => self.name = value,
            "role" => self.role = value,
            "image" => self.image = value,
            "bio" => self.bio = value,
            "personal website" => self.personal_website = value,
            "linkedin" => self.linkedin = value,
            "github" => self.github = value,
            "orcid" => self.orcid = value,
            _ => {}
        }
    }

    /// True when every field is blank after trimming.
    pub fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.role,
            &self.image,
            &self.bio,
            &self.personal_website,
            &self.linkedin,
            &self.github,
            &self.orcid,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::OfficerRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_personal_website_with_embedded_space() {
        let record = OfficerRecord {
            name: "Ada".to_string(),
            personal_website: "https://example.org".to_string(),
            ..OfficerRecord::default()
        };
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["personal website"], "https://example.org");
        assert_eq!(json["name"], "Ada");
    }

    #[test]
    fn deserializes_with_missing_fields_defaulted() {
        let record: OfficerRecord =
            serde_json::from_str(r#"{"name":"Ada"}"#).expect("deserialize record");
        assert_eq!(record.name, "Ada");
        assert_eq!(record.role, "");
        assert_eq!(record.orcid, "");
    }

    #[test]
    fn unknown_headers_are_ignored() {
        let mut record = OfficerRecord::default();
        record.set_field("favorite color", "teal".to_string());
        assert_eq!(record, OfficerRecord::default());
    }

    #[test]
    fn blank_detection_ignores_whitespace() {
        let mut record = OfficerRecord::default();
        record.bio = "   ".to_string();
        assert!(record.is_blank());
        record.name = "Ada".to_string();
        assert!(!record.is_blank());
    }
}
