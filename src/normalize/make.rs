use serde::Deserialize;

use super::{lenient, non_empty, ordered_dedup, Normalizer, RawId, RawTimestamp};
use crate::constants::MAKE_TEMPLATE_URL_PREFIX;
use crate::types::{Platform, RawTemplate, TemplateStatus, UnifiedRecord};

/// Raw template shape returned by the Make.com `/api/v2/templates/public` API
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MakeRawTemplate {
    #[serde(deserialize_with = "lenient")]
    id: Option<RawId>,
    #[serde(deserialize_with = "lenient")]
    name: String,
    #[serde(deserialize_with = "lenient")]
    description: String,
    #[serde(deserialize_with = "lenient")]
    usage: Option<u64>,
    #[serde(rename = "usedApps", deserialize_with = "lenient")]
    used_apps: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    url: String,
    #[serde(deserialize_with = "lenient")]
    slug: String,
    #[serde(deserialize_with = "lenient")]
    public: Option<bool>,
    #[serde(rename = "teamId", deserialize_with = "lenient")]
    team_id: Option<RawId>,
    #[serde(rename = "createdAt", deserialize_with = "lenient")]
    created_at: Option<RawTimestamp>,
    #[serde(rename = "updatedAt", deserialize_with = "lenient")]
    updated_at: Option<RawTimestamp>,
}

/// Normalizer for Make.com scenario templates
pub struct MakeNormalizer;

impl MakeNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MakeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for MakeNormalizer {
    fn platform(&self) -> Platform {
        Platform::Make
    }

    fn normalize(&self, raw: &RawTemplate) -> UnifiedRecord {
        let template: MakeRawTemplate =
            serde_json::from_value(raw.clone()).unwrap_or_default();

        let mut record = UnifiedRecord::empty(Platform::Make);

        if let Some(native_id) = template.id.and_then(RawId::into_string) {
            record.platform_id = Platform::Make.platform_id(&native_id);
            record.url = non_empty(&template.url)
                .unwrap_or_else(|| format!("{}{}", MAKE_TEMPLATE_URL_PREFIX, native_id));
            record.native_id = native_id;
        } else if let Some(url) = non_empty(&template.url) {
            record.url = url;
        }

        record.name = template.name.trim().to_string();
        record.title = record.name.clone();
        record.description = non_empty(&template.description);
        record.slug = non_empty(&template.slug);

        // The public listing defaults to published; an explicit flag wins
        record.is_public = template.public.unwrap_or(true);
        record.status = if record.is_public {
            TemplateStatus::Published
        } else {
            TemplateStatus::Private
        };
        record.kind = "template".to_string();

        record.apps_used = ordered_dedup(template.used_apps);
        record.usage_count = template.usage;
        record.team_id = template.team_id.and_then(RawId::into_string);
        record.created_at = template.created_at.and_then(|ts| ts.to_datetime());
        record.updated_at = template.updated_at.and_then(|ts| ts.to_datetime());

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_complete_template() {
        let raw = json!({
            "id": 5,
            "name": "Sync Leads",
            "description": "Keep two CRMs aligned",
            "usage": 50,
            "usedApps": ["HubSpot", "Salesforce", "HubSpot"],
            "slug": "sync-leads",
            "teamId": 99
        });

        let record = MakeNormalizer::new().normalize(&raw);
        assert_eq!(record.platform_id, "make_5");
        assert_eq!(record.native_id, "5");
        assert_eq!(record.url, "https://www.make.com/en/templates/5");
        assert_eq!(record.usage_count, Some(50));
        assert_eq!(record.apps_used, vec!["HubSpot", "Salesforce"]);
        assert_eq!(record.team_id.as_deref(), Some("99"));
        assert_eq!(record.status, TemplateStatus::Published);
        assert!(record.is_public);
    }

    #[test]
    fn explicit_private_flag_wins() {
        let raw = json!({"id": 3, "name": "Internal", "public": false});
        let record = MakeNormalizer::new().normalize(&raw);
        assert_eq!(record.status, TemplateStatus::Private);
        assert!(!record.is_public);
    }

    #[test]
    fn malformed_apps_list_degrades_to_empty() {
        let raw = json!({"id": 3, "name": "Odd", "usedApps": {"a": 1}, "usage": "lots"});
        let record = MakeNormalizer::new().normalize(&raw);
        assert!(record.apps_used.is_empty());
        assert!(record.usage_count.is_none());
        assert_eq!(record.platform_id, "make_3");
    }
}
