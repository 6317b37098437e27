use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw template data as returned from platform APIs/crawlers
pub type RawTemplate = serde_json::Value;

/// The three source platforms. Variant order matches the lexicographic
/// order of the serialized names, so `Ord` on the enum is the platform
/// component of the final sort.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Make,
    N8n,
    Zapier,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Make => crate::constants::MAKE_PLATFORM,
            Platform::N8n => crate::constants::N8N_PLATFORM,
            Platform::Zapier => crate::constants::ZAPIER_PLATFORM,
        }
    }

    pub fn from_name(name: &str) -> Option<Platform> {
        match name.trim().to_lowercase().as_str() {
            crate::constants::MAKE_PLATFORM => Some(Platform::Make),
            crate::constants::N8N_PLATFORM => Some(Platform::N8n),
            crate::constants::ZAPIER_PLATFORM => Some(Platform::Zapier),
            _ => None,
        }
    }

    /// All platforms in processing order. The merge step's first-seen-wins
    /// dedup depends on this order being fixed.
    pub fn all() -> [Platform; 3] {
        [Platform::Make, Platform::N8n, Platform::Zapier]
    }

    /// Globally unique identity key for a record of this platform
    pub fn platform_id(&self, native_id: &str) -> String {
        format!("{}_{}", self.as_str(), native_id)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of a template on its source platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    Published,
    Private,
    #[default]
    Unknown,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Published => "published",
            TemplateStatus::Private => "private",
            TemplateStatus::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> TemplateStatus {
        match name.trim().to_lowercase().as_str() {
            "published" => TemplateStatus::Published,
            "private" => TemplateStatus::Private,
            _ => TemplateStatus::Unknown,
        }
    }
}

/// The canonical template entity every platform normalizes into.
/// Created once by a normalizer, read-only afterwards; enrichment derives
/// from it but never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub platform: Platform,
    /// `{platform}_{native_id}`, unique across the merged collection
    pub platform_id: String,
    pub native_id: String,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub description_html: Option<String>,
    pub description_plain: Option<String>,
    pub url: String,
    pub create_url: Option<String>,
    pub slug: Option<String>,
    pub status: TemplateStatus,
    pub is_public: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Ordered set: insertion order preserved, duplicates removed
    pub apps_used: Vec<String>,
    pub nodes_used: Option<u32>,
    pub total_views: Option<u64>,
    pub total_downloads: Option<u64>,
    pub usage_count: Option<u64>,
    pub creator_name: Option<String>,
    pub creator_verified: bool,
    pub creator_avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_requested: bool,
    pub team_id: Option<String>,
    /// Entity kind on the source platform, e.g. "template" or "workflow"
    #[serde(rename = "type")]
    pub kind: String,
}

impl UnifiedRecord {
    /// Empty shell for a platform; normalizers fill in whatever the raw
    /// record provides and leave the rest defaulted.
    pub fn empty(platform: Platform) -> Self {
        Self {
            platform,
            platform_id: String::new(),
            native_id: String::new(),
            name: String::new(),
            title: String::new(),
            description: None,
            description_html: None,
            description_plain: None,
            url: String::new(),
            create_url: None,
            slug: None,
            status: TemplateStatus::Unknown,
            is_public: false,
            category: None,
            tags: Vec::new(),
            apps_used: Vec::new(),
            nodes_used: None,
            total_views: None,
            total_downloads: None,
            usage_count: None,
            creator_name: None,
            creator_verified: false,
            creator_avatar_url: None,
            created_at: None,
            updated_at: None,
            published_at: None,
            approved_at: None,
            approval_requested: false,
            team_id: None,
            kind: String::new(),
        }
    }

    /// Ranking metric: the larger of view count and usage count.
    pub fn popularity(&self) -> u64 {
        self.total_views
            .unwrap_or(0)
            .max(self.usage_count.unwrap_or(0))
    }
}

/// Core trait all platform sources implement
#[async_trait::async_trait]
pub trait TemplateSource: Send + Sync {
    /// The platform this source harvests
    fn platform(&self) -> Platform;

    /// Fetch all raw templates from this platform, page by page. A page
    /// that exhausts its retries is skipped and logged, never fatal.
    async fn fetch_templates(&self) -> Result<Vec<RawTemplate>>;
}
