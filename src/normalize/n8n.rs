use serde::Deserialize;

use super::{lenient, non_empty, ordered_dedup, Normalizer, RawId, RawTimestamp};
use crate::constants::N8N_WORKFLOW_URL_PREFIX;
use crate::types::{Platform, RawTemplate, TemplateStatus, UnifiedRecord};

/// Raw workflow shape returned by the n8n `/templates/search` API
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct N8nRawWorkflow {
    #[serde(deserialize_with = "lenient")]
    id: Option<RawId>,
    #[serde(deserialize_with = "lenient")]
    name: String,
    #[serde(deserialize_with = "lenient")]
    description: String,
    #[serde(rename = "totalViews", deserialize_with = "lenient")]
    total_views: Option<u64>,
    #[serde(rename = "createdAt", deserialize_with = "lenient")]
    created_at: Option<RawTimestamp>,
    #[serde(deserialize_with = "lenient")]
    user: N8nRawUser,
    #[serde(deserialize_with = "lenient")]
    nodes: Vec<N8nRawNode>,
    #[serde(deserialize_with = "lenient")]
    categories: Vec<N8nRawCategory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct N8nRawUser {
    #[serde(deserialize_with = "lenient")]
    name: String,
    #[serde(deserialize_with = "lenient")]
    username: String,
    #[serde(deserialize_with = "lenient")]
    verified: bool,
    #[serde(deserialize_with = "lenient")]
    avatar: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct N8nRawNode {
    #[serde(rename = "displayName", deserialize_with = "lenient")]
    display_name: String,
    #[serde(deserialize_with = "lenient")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct N8nRawCategory {
    #[serde(deserialize_with = "lenient")]
    name: String,
}

/// Normalizer for n8n workflow templates
pub struct N8nNormalizer;

impl N8nNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for N8nNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for N8nNormalizer {
    fn platform(&self) -> Platform {
        Platform::N8n
    }

    fn normalize(&self, raw: &RawTemplate) -> UnifiedRecord {
        let workflow: N8nRawWorkflow =
            serde_json::from_value(raw.clone()).unwrap_or_default();

        let mut record = UnifiedRecord::empty(Platform::N8n);

        if let Some(native_id) = workflow.id.and_then(RawId::into_string) {
            record.url = format!("{}{}/", N8N_WORKFLOW_URL_PREFIX, native_id);
            record.platform_id = Platform::N8n.platform_id(&native_id);
            record.native_id = native_id;
        }

        record.name = workflow.name.trim().to_string();
        record.title = record.name.clone();
        record.description = non_empty(&workflow.description);

        // The search API only surfaces published workflows
        record.status = TemplateStatus::Published;
        record.is_public = true;
        record.kind = "workflow".to_string();

        record.nodes_used = Some(workflow.nodes.len() as u32);
        record.apps_used = ordered_dedup(workflow.nodes.into_iter().map(|node| {
            if node.display_name.is_empty() {
                node.name
            } else {
                node.display_name
            }
        }));

        record.tags = ordered_dedup(workflow.categories.into_iter().map(|c| c.name));
        record.category = record.tags.first().cloned();

        record.total_views = workflow.total_views;
        record.created_at = workflow.created_at.and_then(|ts| ts.to_datetime());

        record.creator_name =
            non_empty(&workflow.user.name).or_else(|| non_empty(&workflow.user.username));
        record.creator_verified = workflow.user.verified;
        record.creator_avatar_url = non_empty(&workflow.user.avatar);

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_complete_workflow() {
        let raw = json!({
            "id": 5,
            "name": "Sync Leads",
            "description": "Push new leads to a CRM",
            "totalViews": 100,
            "createdAt": "2025-06-01T12:00:00Z",
            "user": {"name": "Ada", "verified": true, "avatar": "https://n8n.io/a.png"},
            "nodes": [
                {"displayName": "Webhook", "name": "n8n-nodes-base.webhook"},
                {"displayName": "Slack", "name": "n8n-nodes-base.slack"},
                {"displayName": "Slack", "name": "n8n-nodes-base.slack"}
            ],
            "categories": [{"name": "Sales"}]
        });

        let record = N8nNormalizer::new().normalize(&raw);
        assert_eq!(record.platform_id, "n8n_5");
        assert_eq!(record.native_id, "5");
        assert_eq!(record.name, "Sync Leads");
        assert_eq!(record.url, "https://n8n.io/workflows/5/");
        assert_eq!(record.nodes_used, Some(3));
        assert_eq!(record.apps_used, vec!["Webhook", "Slack"]);
        assert_eq!(record.category.as_deref(), Some("Sales"));
        assert_eq!(record.total_views, Some(100));
        assert_eq!(record.creator_name.as_deref(), Some("Ada"));
        assert!(record.creator_verified);
        assert_eq!(record.status, TemplateStatus::Published);
    }

    #[test]
    fn missing_fields_become_defaults_not_errors() {
        let record = N8nNormalizer::new().normalize(&json!({"id": "19"}));
        assert_eq!(record.platform_id, "n8n_19");
        assert!(record.name.is_empty());
        assert!(record.description.is_none());
        assert_eq!(record.nodes_used, Some(0));
        assert!(record.apps_used.is_empty());
        assert!(record.total_views.is_none());
    }

    #[test]
    fn malformed_containers_degrade_to_empty() {
        let raw = json!({
            "id": 7,
            "name": "Broken",
            "nodes": "not-a-list",
            "user": 42,
            "categories": {"name": "oops"}
        });
        let record = N8nNormalizer::new().normalize(&raw);
        assert_eq!(record.platform_id, "n8n_7");
        assert!(record.apps_used.is_empty());
        assert_eq!(record.nodes_used, Some(0));
        assert!(record.creator_name.is_none());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn record_without_id_fails_validation_later_not_here() {
        let record = N8nNormalizer::new().normalize(&json!({"name": "No id"}));
        assert!(record.platform_id.is_empty());
        assert!(record.url.is_empty());
    }
}
