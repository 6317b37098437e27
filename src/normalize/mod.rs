use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::types::{Platform, RawTemplate, UnifiedRecord};

pub mod make;
pub mod n8n;
pub mod zapier;

pub use make::MakeNormalizer;
pub use n8n::N8nNormalizer;
pub use zapier::ZapierNormalizer;

/// Trait for normalizing one platform's raw records into the unified shape.
///
/// Implementations are total: any missing or malformed field yields a
/// null/default value in the output, never an error. Raw records are
/// deserialized into explicit per-platform structs here; untyped maps do
/// not propagate past this boundary.
pub trait Normalizer: Send + Sync {
    fn platform(&self) -> Platform;

    fn normalize(&self, raw: &RawTemplate) -> UnifiedRecord;
}

/// Look up the normalizer for a platform
pub fn normalizer_for(platform: Platform) -> Box<dyn Normalizer> {
    match platform {
        Platform::Make => Box::new(MakeNormalizer::new()),
        Platform::N8n => Box::new(N8nNormalizer::new()),
        Platform::Zapier => Box::new(ZapierNormalizer::new()),
    }
}

/// Field-level leniency: a value of the wrong shape degrades to the field's
/// default instead of failing the whole record. This is what makes the raw
/// structs total over arbitrary JSON.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(T::deserialize(deserializer).unwrap_or_default())
}

/// Identifiers arrive as JSON numbers or strings depending on the platform
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Num(i64),
    Text(String),
}

impl RawId {
    pub(crate) fn into_string(self) -> Option<String> {
        match self {
            RawId::Num(n) => Some(n.to_string()),
            RawId::Text(s) => {
                let s = s.trim().to_string();
                (!s.is_empty()).then_some(s)
            }
        }
    }
}

/// Timestamps arrive as epoch numbers or date strings depending on the platform
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

impl RawTimestamp {
    pub(crate) fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            // Heuristic: values past ~2001-09 in milliseconds are epoch-millis
            RawTimestamp::Epoch(n) if *n > 1_000_000_000_000 => {
                DateTime::<Utc>::from_timestamp_millis(*n)
            }
            RawTimestamp::Epoch(n) => DateTime::<Utc>::from_timestamp(*n, 0),
            RawTimestamp::Text(s) => parse_datetime_str(s),
        }
    }
}

/// Parse the date formats the platforms have been observed to emit
pub(crate) fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

/// Trimmed, non-empty string or nothing
pub(crate) fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Ordered set semantics for app/tag lists: insertion order preserved,
/// blanks and duplicates dropped.
pub(crate) fn ordered_dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_timestamp_handles_epoch_and_text() {
        let epoch = RawTimestamp::Epoch(1_700_000_000);
        assert_eq!(epoch.to_datetime().unwrap().timestamp(), 1_700_000_000);

        let millis = RawTimestamp::Epoch(1_700_000_000_000);
        assert_eq!(millis.to_datetime().unwrap().timestamp(), 1_700_000_000);

        let text = RawTimestamp::Text("2025-10-28T10:06:30Z".to_string());
        assert_eq!(
            text.to_datetime().unwrap().to_rfc3339(),
            "2025-10-28T10:06:30+00:00"
        );

        assert!(RawTimestamp::Text("not a date".to_string())
            .to_datetime()
            .is_none());
    }

    #[test]
    fn ordered_dedup_preserves_insertion_order() {
        let apps = ordered_dedup(vec![
            "Slack".to_string(),
            " Gmail ".to_string(),
            "slack".to_string(),
            "".to_string(),
            "Sheets".to_string(),
        ]);
        assert_eq!(apps, vec!["Slack", "Gmail", "Sheets"]);
    }
}
