use tracing::{debug, info, instrument, warn};

use super::{build_client, get_json_with_retry};
use crate::config::{PlatformConfig, ScrapeConfig};
use crate::error::Result;
use crate::pipeline::ShutdownFlag;
use crate::types::{Platform, RawTemplate, TemplateSource};

/// Source iterator for the Make.com public templates API
pub struct MakeSource {
    client: reqwest::Client,
    config: PlatformConfig,
    scrape: ScrapeConfig,
    shutdown: ShutdownFlag,
}

impl MakeSource {
    pub fn new(
        config: PlatformConfig,
        scrape: ScrapeConfig,
        shutdown: ShutdownFlag,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(scrape.timeout_seconds)?,
            config,
            scrape,
            shutdown,
        })
    }

    fn page_url(&self, offset: u32) -> String {
        format!(
            "{}/api/v2/templates/public?limit={}&offset={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.page_size,
            offset
        )
    }
}

#[async_trait::async_trait]
impl TemplateSource for MakeSource {
    fn platform(&self) -> Platform {
        Platform::Make
    }

    #[instrument(skip(self))]
    async fn fetch_templates(&self) -> Result<Vec<RawTemplate>> {
        let mut all_templates = Vec::new();

        for page in 0..self.config.max_pages {
            if self.shutdown.is_set() {
                warn!("Shutdown requested, stopping Make fetch at page {}", page);
                break;
            }

            let offset = page * self.config.page_size;
            let url = self.page_url(offset);
            let payload = match get_json_with_retry(&self.client, &url, &self.scrape).await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Make page at offset {} skipped after retries: {}", offset, e);
                    continue;
                }
            };

            // The endpoint wraps the page in "templates"; tolerate a bare array
            let templates = payload
                .get("templates")
                .and_then(|v| v.as_array())
                .or_else(|| payload.as_array())
                .cloned()
                .unwrap_or_default();
            let page_count = templates.len();
            debug!("Make offset {} returned {} templates", offset, page_count);
            all_templates.extend(templates);

            if let Some(cap) = self.config.max_templates {
                if all_templates.len() >= cap {
                    all_templates.truncate(cap);
                    break;
                }
            }
            if page_count < self.config.page_size as usize {
                break;
            }

            tokio::time::sleep(std::time::Duration::from_millis(
                self.scrape.rate_limit_delay_ms,
            ))
            .await;
        }

        info!(
            "Successfully fetched {} templates from Make.com",
            all_templates.len()
        );
        Ok(all_templates)
    }
}
