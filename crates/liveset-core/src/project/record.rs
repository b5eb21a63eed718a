//! The catalog's persisted summary of one project folder.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// One entry per discovered project folder.
///
/// `project_folder` is the identity key; compare folders with
/// [`normalize_path_key`], never with `==` on the raw path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub title: String,
    /// Tempo in beats per minute, 0 when unknown.
    #[serde(default)]
    pub bpm: f64,
    /// `"<Root> <Scale>"` or empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub scale: String,
    pub project_folder: PathBuf,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub last_modified: DateTime<Utc>,
}

impl ProjectRecord {
    /// Normalized identity key of this record.
    pub fn path_key(&self) -> String {
        normalize_path_key(&self.project_folder)
    }

    /// Whether this record describes `folder` (case-insensitive).
    pub fn is_folder(&self, folder: &Path) -> bool {
        self.path_key() == normalize_path_key(folder)
    }

    pub fn has_tempo(&self) -> bool {
        self.bpm > 0.0
    }

    pub fn has_scale(&self) -> bool {
        !self.scale.is_empty()
    }
}

/// Case-insensitive comparison key for a project folder.
///
/// Trailing separators are ignored, so `/a/b/` and `/A/B` share a key.
pub fn normalize_path_key(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(std::path::is_separator);
    let key = if trimmed.is_empty() { raw.as_ref() } else { trimmed };
    key.to_lowercase()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept RFC 3339 timestamps, and offset-less ones as UTC.
///
/// Catalogs written by earlier releases stored local times without an offset.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(folder: &str) -> ProjectRecord {
        ProjectRecord {
            title: "Night Drive".to_string(),
            bpm: 122.5,
            scale: "A Minor".to_string(),
            project_folder: PathBuf::from(folder),
            last_modified: Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 5).unwrap(),
        }
    }

    #[test]
    fn test_path_key_is_case_and_separator_insensitive() {
        let r = record("/Music/Night Drive Project/");
        assert!(r.is_folder(Path::new("/music/night drive project")));
        assert!(!r.is_folder(Path::new("/music/night drive")));
        assert_eq!(normalize_path_key(Path::new("/")), "/");
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(record("/m/a")).unwrap();
        assert_eq!(value["projectFolder"], "/m/a");
        assert_eq!(value["bpm"], 122.5);
        assert!(value["lastModified"].as_str().unwrap().starts_with("2024-03-09T18:30:05"));
    }

    #[test]
    fn test_deserializes_legacy_entries() {
        let json = r#"{
            "title": "Old Set",
            "bpm": 0,
            "scale": null,
            "projectFolder": "C:\\Music\\Old Set Project",
            "lastModified": "2023-11-02T08:15:00.1234567"
        }"#;
        let r: ProjectRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.scale, "");
        assert!(!r.has_tempo());
        assert_eq!(r.last_modified.timestamp(), 1_698_912_900);
    }
}
