//! Content-type registry and version identifiers.

use crate::error::{FolioError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The static content-type table shipped with Folio.
const DEFAULT_CONTENT_TYPES: &[(&str, &str)] = &[
    ("homepage-carousel", "homepage-carousel.json"),
    ("homepage-hero", "homepage-hero.json"),
    ("about", "about.json"),
    ("services", "services.json"),
    ("team", "team.json"),
    ("testimonials", "testimonials.json"),
    ("gallery", "gallery.json"),
    ("news", "news.json"),
    ("faq", "faq.json"),
    ("contact", "contact.json"),
    ("navigation", "navigation.json"),
    ("footer", "footer.json"),
    ("site-settings", "site-settings.json"),
];

/// Maps content-type keys to their canonical on-disk file names.
///
/// Every key maps to exactly one file and no two keys share a file, so a
/// version file name always identifies its content type unambiguously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeRegistry {
    entries: BTreeMap<String, String>,
}

impl Default for ContentTypeRegistry {
    fn default() -> Self {
        Self {
            entries: DEFAULT_CONTENT_TYPES
                .iter()
                .map(|(key, file)| (key.to_string(), file.to_string()))
                .collect(),
        }
    }
}

impl ContentTypeRegistry {
    /// Builds a registry from a custom table, rejecting malformed entries.
    pub fn from_entries(entries: BTreeMap<String, String>) -> Result<Self> {
        if entries.is_empty() {
            return Err(FolioError::config("content type table is empty"));
        }

        let mut seen_files = std::collections::HashSet::new();
        for (key, file) in &entries {
            if key.is_empty()
                || !key
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(FolioError::config(format!(
                    "content type key '{}' must be lowercase letters, digits or '-'",
                    key
                )));
            }
            if !is_plain_json_file_name(file) {
                return Err(FolioError::config(format!(
                    "file name '{}' for '{}' must be a plain *.json name without '_'",
                    file, key
                )));
            }
            if !seen_files.insert(file.as_str()) {
                return Err(FolioError::config(format!(
                    "file name '{}' is mapped more than once",
                    file
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Resolves a content-type key to its canonical file name.
    pub fn resolve(&self, content_type: &str) -> Result<&str> {
        self.entries
            .get(content_type)
            .map(String::as_str)
            .ok_or_else(|| FolioError::unknown_content_type(content_type))
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.entries.contains_key(content_type)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn is_plain_json_file_name(name: &str) -> bool {
    name.len() > ".json".len()
        && name.ends_with(".json")
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '_'])
        && !name.contains("..")
}

/// Result of a successful write or restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub content_type: String,
    /// Canonical file name the content now lives in
    pub file_name: String,
    pub written_at: DateTime<Utc>,
}

/// An archived snapshot of a content record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub content_type: String,
    pub id: VersionId,
    pub path: PathBuf,
}

impl Version {
    /// The version file name, which doubles as its public identifier.
    pub fn file_name(&self) -> String {
        self.id.to_file_name()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.id.timestamp
    }
}

/// Parsed form of a version file name.
///
/// Layout: `YYYY-MM-DDTHH-MM-SS-mmmZ[-NNN]_<file name>`. The optional
/// `-NNN` sequence keeps creation order among versions stamped in the same
/// millisecond. Ordering is by `(timestamp, sequence)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionId {
    pub timestamp: DateTime<Utc>,
    pub sequence: u32,
    pub file_name: String,
}

const STAMP_DATETIME_LEN: usize = "YYYY-MM-DDTHH-MM-SS".len();
const STAMP_DATETIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

impl VersionId {
    pub fn new(timestamp: DateTime<Utc>, sequence: u32, file_name: impl Into<String>) -> Self {
        Self {
            timestamp: truncate_to_millis(timestamp),
            sequence,
            file_name: file_name.into(),
        }
    }

    /// Renders the sortable stamp prefix (without the file name).
    pub fn stamp(&self) -> String {
        let base = format!(
            "{}-{:03}Z",
            self.timestamp.format(STAMP_DATETIME_FORMAT),
            self.timestamp.timestamp_subsec_millis()
        );
        if self.sequence == 0 {
            base
        } else {
            format!("{}-{:03}", base, self.sequence)
        }
    }

    pub fn to_file_name(&self) -> String {
        format!("{}_{}", self.stamp(), self.file_name)
    }

    /// Parses a version file name. Returns `None` for anything that is not
    /// exactly a version name (temp files, stray files, path fragments).
    pub fn parse(name: &str) -> Option<Self> {
        let (stamp, file_name) = name.split_once('_')?;
        if !is_plain_json_file_name(file_name) {
            return None;
        }

        let datetime = stamp.get(..STAMP_DATETIME_LEN)?;
        let naive = NaiveDateTime::parse_from_str(datetime, STAMP_DATETIME_FORMAT).ok()?;

        // "-mmmZ" then optionally "-NNN"
        let rest = stamp.get(STAMP_DATETIME_LEN..)?;
        let rest = rest.strip_prefix('-')?;
        let (millis, rest) = rest.split_once('Z')?;
        if millis.len() != 3 || !millis.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let millis: i64 = millis.parse().ok()?;

        let sequence = if rest.is_empty() {
            0
        } else {
            let digits = rest.strip_prefix('-')?;
            if digits.len() < 3 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()?
        };

        let timestamp =
            Utc.from_utc_datetime(&naive) + chrono::Duration::milliseconds(millis);

        let id = Self {
            timestamp,
            sequence,
            file_name: file_name.to_string(),
        };

        // Only the canonical rendering names a version; "-000" or extra
        // leading zeros would list under a name that is not on disk.
        (id.to_file_name() == name).then_some(id)
    }

    /// Picks the identifier for a version created at `now`, given the
    /// newest existing version of the same file.
    ///
    /// Never yields an identifier that sorts before `newest`, even when the
    /// clock reads earlier than the last stamp.
    pub fn next_after(newest: Option<&VersionId>, now: DateTime<Utc>, file_name: &str) -> Self {
        let now = truncate_to_millis(now);
        match newest {
            Some(last) if last.timestamp >= now => {
                Self::new(last.timestamp, last.sequence + 1, file_name)
            }
            _ => Self::new(now, 0, file_name),
        }
    }
}

impl Ord for VersionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.sequence.cmp(&other.sequence))
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

impl PartialOrd for VersionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn truncate_to_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(time.timestamp_millis())
        .single()
        .unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_default_registry_resolves_known_types() {
        let registry = ContentTypeRegistry::default();
        assert_eq!(registry.resolve("homepage-carousel").unwrap(), "homepage-carousel.json");
        assert_eq!(registry.resolve("footer").unwrap(), "footer.json");
        assert!(matches!(
            registry.resolve("nope"),
            Err(FolioError::UnknownContentType(t)) if t == "nope"
        ));
    }

    #[test]
    fn test_registry_rejects_bad_entries() {
        let mut entries = BTreeMap::new();
        entries.insert("Footer".to_string(), "footer.json".to_string());
        assert!(ContentTypeRegistry::from_entries(entries).is_err());

        let mut entries = BTreeMap::new();
        entries.insert("footer".to_string(), "../footer.json".to_string());
        assert!(ContentTypeRegistry::from_entries(entries).is_err());

        let mut entries = BTreeMap::new();
        entries.insert("footer".to_string(), "site_footer.json".to_string());
        assert!(ContentTypeRegistry::from_entries(entries).is_err());

        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), "same.json".to_string());
        entries.insert("b".to_string(), "same.json".to_string());
        assert!(ContentTypeRegistry::from_entries(entries).is_err());
    }

    #[test]
    fn test_version_id_file_name_layout() {
        let id = VersionId::new(at("2024-03-05T07:08:09.123Z"), 0, "footer.json");
        assert_eq!(id.to_file_name(), "2024-03-05T07-08-09-123Z_footer.json");

        let id = VersionId::new(at("2024-03-05T07:08:09.123Z"), 4, "footer.json");
        assert_eq!(id.to_file_name(), "2024-03-05T07-08-09-123Z-004_footer.json");
    }

    #[test]
    fn test_version_id_parse() {
        let id = VersionId::parse("2024-03-05T07-08-09-123Z-012_homepage-carousel.json").unwrap();
        assert_eq!(id.timestamp, at("2024-03-05T07:08:09.123Z"));
        assert_eq!(id.sequence, 12);
        assert_eq!(id.file_name, "homepage-carousel.json");

        let id = VersionId::parse("2024-03-05T07-08-09-000Z_footer.json").unwrap();
        assert_eq!(id.sequence, 0);
    }

    #[test]
    fn test_version_id_parse_rejects_junk() {
        for name in [
            "footer.json",
            ".2024-03-05T07-08-09-123Z_footer.json.tmp",
            "2024-03-05T07-08-09-123Z_../footer.json",
            "2024-03-05T07-08-09Z_footer.json",
            "2024-13-05T07-08-09-123Z_footer.json",
            "2024-03-05T07-08-09-123Z-1_footer.json",
            "2024-03-05T07-08-09-123Z_footer.txt",
        ] {
            assert!(VersionId::parse(name).is_none(), "accepted {name}");
        }
    }

    #[test]
    fn test_version_id_parse_requires_canonical_name() {
        for name in [
            "2024-03-05T07-08-09-123Z-000_footer.json",
            "2024-03-05T07-08-09-123Z-0012_footer.json",
        ] {
            assert!(VersionId::parse(name).is_none(), "accepted {name}");
        }

        let id = VersionId::parse("2024-03-05T07-08-09-123Z-1000_footer.json").unwrap();
        assert_eq!(id.sequence, 1000);
        assert_eq!(id.to_file_name(), "2024-03-05T07-08-09-123Z-1000_footer.json");
    }

    #[test]
    fn test_ordering_breaks_ties_by_sequence() {
        let t = at("2024-03-05T07:08:09.123Z");
        let first = VersionId::new(t, 0, "footer.json");
        let second = VersionId::new(t, 1, "footer.json");
        let later = VersionId::new(t + chrono::Duration::milliseconds(1), 0, "footer.json");
        assert!(first < second);
        assert!(second < later);
    }

    #[test]
    fn test_next_after_keeps_creation_order() {
        let t = at("2024-03-05T07:08:09.123Z");
        let last = VersionId::new(t, 3, "footer.json");

        // Same millisecond: bump the sequence
        let next = VersionId::next_after(Some(&last), t, "footer.json");
        assert_eq!(next.sequence, 4);
        assert!(next > last);

        // Clock went backwards: still after the newest
        let earlier = t - chrono::Duration::seconds(5);
        let next = VersionId::next_after(Some(&last), earlier, "footer.json");
        assert!(next > last);

        // Clock moved forward: fresh stamp
        let later = t + chrono::Duration::seconds(1);
        let next = VersionId::next_after(Some(&last), later, "footer.json");
        assert_eq!(next.sequence, 0);
        assert_eq!(next.timestamp, later);
    }
}
