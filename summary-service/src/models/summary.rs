use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RawNotesType {
    Text,
    Pdf,
    None,
}

impl RawNotesType {
    /// An uploaded file wins over text; empty text counts as no notes.
    pub fn derive(raw_notes_text: Option<&str>, has_file: bool) -> Self {
        if has_file {
            RawNotesType::Pdf
        } else if raw_notes_text.is_some_and(|t| !t.is_empty()) {
            RawNotesType::Text
        } else {
            RawNotesType::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RawNotesType::Text => "text",
            RawNotesType::Pdf => "pdf",
            RawNotesType::None => "none",
        }
    }
}

/// A stored clinical summary, as returned by the datastore.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClinicalSummary {
    #[serde(deserialize_with = "id_as_string")]
    pub summary_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub summary_text: String,
    #[serde(default, deserialize_with = "diagnoses_or_empty")]
    pub diagnoses: Vec<String>,
    #[serde(default)]
    pub affected_system: Option<String>,
    #[serde(default)]
    pub affected_organ: Option<String>,
    #[serde(default)]
    pub animation_asset: Option<String>,
    pub raw_notes_type: RawNotesType,
    #[serde(default)]
    pub raw_notes_text: Option<String>,
    #[serde(default)]
    pub raw_notes_file_url: Option<String>,
    #[serde(deserialize_with = "datastore_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Compact projection used by the list endpoints.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SummaryListItem {
    #[serde(deserialize_with = "id_as_string")]
    pub summary_id: String,
    pub patient_name: String,
    pub summary_text: String,
    #[serde(default)]
    pub affected_organ: Option<String>,
    #[serde(default)]
    pub animation_asset: Option<String>,
    #[serde(deserialize_with = "datastore_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl SummaryListItem {
    /// Column list matching this projection, in datastore `select=` syntax.
    pub const COLUMNS: &'static str =
        "summary_id,patient_name,summary_text,affected_organ,animation_asset,created_at";
}

impl From<&ClinicalSummary> for SummaryListItem {
    fn from(summary: &ClinicalSummary) -> Self {
        Self {
            summary_id: summary.summary_id.clone(),
            patient_name: summary.patient_name.clone(),
            summary_text: summary.summary_text.clone(),
            affected_organ: summary.affected_organ.clone(),
            animation_asset: summary.animation_asset.clone(),
            created_at: summary.created_at,
        }
    }
}

/// Row payload for an insert. `summary_id` and `created_at` are assigned by
/// the datastore.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewSummary {
    pub patient_id: String,
    pub patient_name: String,
    pub summary_text: String,
    pub diagnoses: Vec<String>,
    pub affected_system: Option<String>,
    pub affected_organ: Option<String>,
    pub animation_asset: Option<String>,
    pub raw_notes_type: RawNotesType,
    pub raw_notes_text: Option<String>,
    pub raw_notes_file_url: Option<String>,
}

impl NewSummary {
    pub fn into_summary(self, summary_id: String, created_at: DateTime<Utc>) -> ClinicalSummary {
        ClinicalSummary {
            summary_id,
            patient_id: self.patient_id,
            patient_name: self.patient_name,
            summary_text: self.summary_text,
            diagnoses: self.diagnoses,
            affected_system: self.affected_system,
            affected_organ: self.affected_organ,
            animation_asset: self.animation_asset,
            raw_notes_type: self.raw_notes_type,
            raw_notes_text: self.raw_notes_text,
            raw_notes_file_url: self.raw_notes_file_url,
            created_at,
        }
    }
}

/// Parses a datastore timestamp. Accepts RFC 3339 (`Z` or an explicit
/// offset) and offset-less ISO 8601, which is taken as UTC.
pub fn parse_datastore_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Postgres text output uses "+00" rather than "+00:00".
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp: {}", value))
}

fn datastore_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datastore_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected summary_id: {}",
            other
        ))),
    }
}

fn diagnoses_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn notes_type_prefers_file_then_text() {
        assert_eq!(RawNotesType::derive(None, true), RawNotesType::Pdf);
        assert_eq!(RawNotesType::derive(Some(""), true), RawNotesType::Pdf);
        assert_eq!(RawNotesType::derive(Some("notes"), false), RawNotesType::Text);
        assert_eq!(RawNotesType::derive(Some(""), false), RawNotesType::None);
        assert_eq!(RawNotesType::derive(None, false), RawNotesType::None);
    }

    #[test]
    fn timestamps_without_offset_are_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(
            parse_datastore_timestamp("2024-03-01T10:30:00Z").unwrap(),
            expected
        );
        assert_eq!(
            parse_datastore_timestamp("2024-03-01T12:30:00+02:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_datastore_timestamp("2024-03-01T10:30:00").unwrap(),
            expected
        );
        assert_eq!(
            parse_datastore_timestamp("2024-03-01 10:30:00+00").unwrap(),
            expected
        );
        assert!(parse_datastore_timestamp("yesterday").is_err());
    }

    #[test]
    fn row_with_non_array_diagnoses_reads_as_empty() {
        let row = json!({
            "summary_id": 42,
            "patient_id": "p-1",
            "patient_name": "Ada",
            "summary_text": "Stable",
            "diagnoses": "Hypertension",
            "raw_notes_type": "none",
            "created_at": "2024-03-01T10:30:00.123456+00:00"
        });

        let summary: ClinicalSummary = serde_json::from_value(row).unwrap();
        assert_eq!(summary.summary_id, "42");
        assert!(summary.diagnoses.is_empty());
        assert_eq!(summary.affected_organ, None);
        assert_eq!(summary.raw_notes_type, RawNotesType::None);
    }

    #[test]
    fn list_item_projection_drops_patient_fields() {
        let summary = NewSummary {
            patient_id: "p-1".into(),
            patient_name: "Ada".into(),
            summary_text: "Stable".into(),
            diagnoses: vec!["A".into()],
            affected_system: Some("Cardiovascular".into()),
            affected_organ: Some("Heart".into()),
            animation_asset: None,
            raw_notes_type: RawNotesType::Text,
            raw_notes_text: Some("bp 120/80".into()),
            raw_notes_file_url: None,
        }
        .into_summary("s-1".into(), Utc::now());

        let item = SummaryListItem::from(&summary);
        assert_eq!(item.summary_id, "s-1");
        assert_eq!(item.affected_organ.as_deref(), Some("Heart"));
        assert_eq!(item.created_at, summary.created_at);
    }
}
