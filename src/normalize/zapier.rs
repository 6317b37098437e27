use serde::Deserialize;

use super::{lenient, non_empty, ordered_dedup, Normalizer, RawId};
use crate::types::{Platform, RawTemplate, TemplateStatus, UnifiedRecord};

/// Raw template shape assembled by the Zapier page crawler. Unlike the two
/// JSON APIs this is our own extraction, but the same leniency rules apply:
/// a page that yielded partial data still normalizes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ZapierRawTemplate {
    #[serde(deserialize_with = "lenient")]
    url: String,
    #[serde(deserialize_with = "lenient")]
    slug: String,
    #[serde(rename = "template_id", deserialize_with = "lenient")]
    template_id: Option<RawId>,
    #[serde(rename = "h1_title", deserialize_with = "lenient")]
    h1_title: String,
    #[serde(rename = "meta_title", deserialize_with = "lenient")]
    meta_title: String,
    #[serde(rename = "meta_description", deserialize_with = "lenient")]
    meta_description: String,
    #[serde(deserialize_with = "lenient")]
    description: String,
    #[serde(rename = "page_apps", deserialize_with = "lenient")]
    page_apps: Vec<String>,
    #[serde(rename = "create_url", deserialize_with = "lenient")]
    create_url: String,
}

/// Normalizer for Zapier Zap templates
pub struct ZapierNormalizer;

impl ZapierNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ZapierNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for ZapierNormalizer {
    fn platform(&self) -> Platform {
        Platform::Zapier
    }

    fn normalize(&self, raw: &RawTemplate) -> UnifiedRecord {
        let template: ZapierRawTemplate =
            serde_json::from_value(raw.clone()).unwrap_or_default();

        let mut record = UnifiedRecord::empty(Platform::Zapier);

        // Zapier does not expose a numeric id on every page; the slug is a
        // stable fallback identity.
        let native_id = template
            .template_id
            .and_then(RawId::into_string)
            .or_else(|| non_empty(&template.slug));
        if let Some(native_id) = native_id {
            record.platform_id = Platform::Zapier.platform_id(&native_id);
            record.native_id = native_id;
        }

        record.url = template.url.trim().to_string();
        record.slug = non_empty(&template.slug);
        record.create_url = non_empty(&template.create_url);

        record.name = non_empty(&template.h1_title)
            .or_else(|| non_empty(&template.meta_title))
            .unwrap_or_default();
        record.title = non_empty(&template.meta_title)
            .or_else(|| non_empty(&template.h1_title))
            .unwrap_or_default();
        record.description = non_empty(&template.description)
            .or_else(|| non_empty(&template.meta_description));
        record.description_plain = non_empty(&template.meta_description);

        // Everything reachable from the public template gallery is published
        record.status = TemplateStatus::Published;
        record.is_public = true;
        record.kind = "template".to_string();

        record.apps_used = ordered_dedup(template.page_apps);

        record
    }
}
