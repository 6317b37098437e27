use crate::constants::{MAKE_DEFAULT_BASE_URL, N8N_DEFAULT_BASE_URL, ZAPIER_DEFAULT_BASE_URL};
use crate::error::{Result, HarvestError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub platforms: Platforms,
    pub scrape: ScrapeConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Platforms {
    pub n8n: PlatformConfig,
    pub make: PlatformConfig,
    pub zapier: PlatformConfig,
}

impl Default for Platforms {
    fn default() -> Self {
        Self {
            n8n: PlatformConfig {
                base_url: N8N_DEFAULT_BASE_URL.to_string(),
                page_size: 100,
                max_pages: 100,
                ..PlatformConfig::default()
            },
            make: PlatformConfig {
                base_url: MAKE_DEFAULT_BASE_URL.to_string(),
                page_size: 100,
                max_pages: 10,
                ..PlatformConfig::default()
            },
            zapier: PlatformConfig {
                base_url: ZAPIER_DEFAULT_BASE_URL.to_string(),
                // Zapier is crawled page-by-page, not paged by API
                page_size: 0,
                max_pages: 0,
                ..PlatformConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Templates requested per page (`rows` for n8n, `limit` for Make)
    pub page_size: u32,
    pub max_pages: u32,
    /// Hard cap on templates processed, for test runs
    pub max_templates: Option<usize>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::new(),
            page_size: 100,
            max_pages: 10,
            max_templates: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Delay between consecutive requests to the same platform
    pub rate_limit_delay_ms: u64,
    /// Every `batch_size` requests, pause for `batch_delay_ms` instead
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    /// Fixed pause between platforms in a full run
    pub platform_delay_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 5_000,
            rate_limit_delay_ms: 3_000,
            batch_size: 50,
            batch_delay_ms: 10_000,
            platform_delay_ms: 10_000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "exports".to_string(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory. A missing file is not an
    /// error; the built-in defaults describe a full production run.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_platforms() {
        let config = Config::default();
        assert!(config.platforms.n8n.enabled);
        assert!(config.platforms.make.enabled);
        assert!(config.platforms.zapier.enabled);
        assert_eq!(config.platforms.n8n.page_size, 100);
        assert_eq!(config.scrape.max_retries, 3);
        assert_eq!(config.export.output_dir, "exports");
    }

    #[test]
    fn partial_toml_overrides_keep_defaults() {
        let config: Config = toml::from_str(
            r#"
            [platforms.zapier]
            enabled = false

            [scrape]
            max_retries = 5
            "#,
        )
        .unwrap();
        assert!(!config.platforms.zapier.enabled);
        assert!(config.platforms.n8n.enabled);
        assert_eq!(config.scrape.max_retries, 5);
        assert_eq!(config.scrape.retry_delay_ms, 5_000);
    }
}
