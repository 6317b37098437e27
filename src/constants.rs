/// Platform name constants to ensure consistency across the codebase.
/// These are the serialized platform names used in `platform_id` keys,
/// CSV columns and the CLI `--platforms` filter.
pub const MAKE_PLATFORM: &str = "make";
pub const N8N_PLATFORM: &str = "n8n";
pub const ZAPIER_PLATFORM: &str = "zapier";

// Default API/site endpoints, overridable via config.toml
pub const N8N_DEFAULT_BASE_URL: &str = "https://api.n8n.io";
pub const MAKE_DEFAULT_BASE_URL: &str = "https://www.make.com";
pub const ZAPIER_DEFAULT_BASE_URL: &str = "https://zapier.com";

/// Public template URL prefix for n8n workflows (the API returns bare ids)
pub const N8N_WORKFLOW_URL_PREFIX: &str = "https://n8n.io/workflows/";
/// Public template URL prefix for Make.com templates
pub const MAKE_TEMPLATE_URL_PREFIX: &str = "https://www.make.com/en/templates/";
