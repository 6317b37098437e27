use scraper::{Html, Selector};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::{build_client, get_text_with_retry};
use crate::config::{PlatformConfig, ScrapeConfig};
use crate::error::Result;
use crate::pipeline::ShutdownFlag;
use crate::types::{Platform, RawTemplate, TemplateSource};

/// Source iterator for Zapier's template gallery. Zapier exposes no public
/// JSON API, so templates are discovered from the listing page and each
/// template page is crawled and scraped individually.
pub struct ZapierSource {
    client: reqwest::Client,
    config: PlatformConfig,
    scrape: ScrapeConfig,
    shutdown: ShutdownFlag,
}

impl ZapierSource {
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

    fn listing_url(&self) -> String {
        format!("{}/templates", self.config.base_url.trim_end_matches('/'))
    }

    /// Discover template page URLs on the listing page.
    /// Parsing stays in a sync helper so the parsed document never crosses
    /// an await point.
    fn extract_template_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let link_selector = Selector::parse("a[href]").unwrap();
        let base = self.config.base_url.trim_end_matches('/');
        let listing = self.listing_url();

        let mut seen = std::collections::HashSet::new();
        let mut urls = Vec::new();
        for link in document.select(&link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if !href.contains("/templates/") {
                continue;
            }
            let absolute = if href.starts_with("http") {
                href.to_string()
            } else {
                format!("{}{}", base, href)
            };
            // Drop query/fragment noise and the listing page itself
            let clean = absolute
                .split(['?', '#'])
                .next()
                .unwrap_or(&absolute)
                .trim_end_matches('/')
                .to_string();
            if clean == listing || !clean.starts_with(base) {
                continue;
            }
            if seen.insert(clean.clone()) {
                urls.push(clean);
            }
        }
        urls
    }

    /// Scrape one template page into a raw record
    fn extract_template_data(&self, html: &str, url: &str) -> RawTemplate {
        let document = Html::parse_document(html);

        let text_of = |selector: &str| -> Option<String> {
            let selector = Selector::parse(selector).ok()?;
            document.select(&selector).next().map(|el| {
                el.text().collect::<String>().trim().to_string()
            })
        };
        let attr_of = |selector: &str, attr: &str| -> Option<String> {
            let selector = Selector::parse(selector).ok()?;
            document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string())
        };

        let h1_title = text_of("h1").unwrap_or_default();
        let meta_title = attr_of("meta[property='og:title']", "content")
            .or_else(|| text_of("title"))
            .unwrap_or_default();
        let meta_description = attr_of("meta[name='description']", "content")
            .or_else(|| attr_of("meta[property='og:description']", "content"))
            .unwrap_or_default();

        // App names are linked from the template page's integration list
        let mut page_apps = Vec::new();
        if let Ok(app_selector) = Selector::parse("a[href*='/apps/']") {
            for link in document.select(&app_selector) {
                let name = link.text().collect::<String>().trim().to_string();
                if !name.is_empty() && !page_apps.contains(&name) {
                    page_apps.push(name);
                }
            }
        }

        let template_id = attr_of("[data-template-id]", "data-template-id");
        let create_url = attr_of("a[href*='/app/editor']", "href").map(|href| {
            if href.starts_with("http") {
                href
            } else {
                format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
            }
        });

        let slug = url.rsplit('/').next().unwrap_or_default();

        json!({
            "url": url,
            "slug": slug,
            "template_id": template_id,
            "h1_title": h1_title,
            "meta_title": meta_title,
            "meta_description": meta_description,
            "page_apps": page_apps,
            "create_url": create_url,
        })
    }
}

#[async_trait::async_trait]
impl TemplateSource for ZapierSource {
    fn platform(&self) -> Platform {
        Platform::Zapier
    }

    #[instrument(skip(self))]
    async fn fetch_templates(&self) -> Result<Vec<RawTemplate>> {
        let listing_url = self.listing_url();
        info!("Loading Zapier template listing from {}", listing_url);
        let listing_html = get_text_with_retry(&self.client, &listing_url, &self.scrape).await?;

        let mut template_urls = self.extract_template_urls(&listing_html);
        if let Some(cap) = self.config.max_templates {
            template_urls.truncate(cap);
        }
        info!("Found {} Zapier templates to crawl", template_urls.len());

        let mut all_templates = Vec::new();
        let total = template_urls.len();
        for (i, url) in template_urls.iter().enumerate() {
            if self.shutdown.is_set() {
                warn!(
                    "Shutdown requested, stopping Zapier crawl at {}/{}",
                    i, total
                );
                break;
            }

            match get_text_with_retry(&self.client, url, &self.scrape).await {
                Ok(html) => {
                    let raw = self.extract_template_data(&html, url);
                    debug!("Crawled template {}/{}: {}", i + 1, total, url);
                    all_templates.push(raw);
                }
                Err(e) => {
                    warn!("Zapier template {} skipped after retries: {}", url, e);
                }
            }

            // Longer pause every batch to stay polite, short delay otherwise
            let delay = if (i + 1) % self.scrape.batch_size == 0 && i + 1 < total {
                debug!("Batch pause after {} templates", i + 1);
                self.scrape.batch_delay_ms
            } else {
                self.scrape.rate_limit_delay_ms
            };
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        info!(
            "Successfully crawled {} templates from Zapier",
            all_templates.len()
        );
        Ok(all_templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlatformConfig, ScrapeConfig};

    fn source() -> ZapierSource {
        let config = PlatformConfig {
            base_url: "https://zapier.com".to_string(),
            ..PlatformConfig::default()
        };
        ZapierSource::new(config, ScrapeConfig::default(), ShutdownFlag::new()).unwrap()
    }

    #[test]
    fn listing_extraction_dedupes_and_absolutizes() {
        let html = r#"
            <html><body>
              <a href="/templates/save-gmail-attachments">Save attachments</a>
              <a href="/templates/save-gmail-attachments?utm=x">Save attachments again</a>
              <a href="https://zapier.com/templates/post-to-slack/">Post to Slack</a>
              <a href="/templates">All templates</a>
              <a href="/apps/gmail">Gmail</a>
              <a href="https://elsewhere.example/templates/not-ours">Other site</a>
            </body></html>
        "#;
        let urls = source().extract_template_urls(html);
        assert_eq!(
            urls,
            vec![
                "https://zapier.com/templates/save-gmail-attachments",
                "https://zapier.com/templates/post-to-slack",
            ]
        );
    }

    #[test]
    fn template_page_extraction_builds_raw_record() {
        let html = r#"
            <html>
              <head>
                <title>Save Gmail attachments | Zapier</title>
                <meta property="og:title" content="Save new Gmail attachments to Google Drive">
                <meta name="description" content="Automatically archive attachments.">
              </head>
              <body data-template-id="1203">
                <h1>Save Gmail attachments to Drive</h1>
                <a href="/apps/gmail">Gmail</a>
                <a href="/apps/google-drive">Google Drive</a>
                <a href="/apps/gmail">Gmail</a>
                <a href="/app/editor/template/1203">Use this Zap</a>
              </body>
            </html>
        "#;
        let raw = source().extract_template_data(
            html,
            "https://zapier.com/templates/save-gmail-attachments",
        );
        assert_eq!(raw["slug"], "save-gmail-attachments");
        assert_eq!(raw["template_id"], "1203");
        assert_eq!(raw["h1_title"], "Save Gmail attachments to Drive");
        assert_eq!(
            raw["meta_title"],
            "Save new Gmail attachments to Google Drive"
        );
        assert_eq!(raw["page_apps"][0], "Gmail");
        assert_eq!(raw["page_apps"][1], "Google Drive");
        assert!(raw["page_apps"].as_array().unwrap().len() == 2);
        assert_eq!(
            raw["create_url"],
            "https://zapier.com/app/editor/template/1203"
        );
    }
}
