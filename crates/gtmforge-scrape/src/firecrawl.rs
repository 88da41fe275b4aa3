//! Firecrawl-style HTTP extractor with an in-process cache.
//!
//! Single-page scrape by default; `crawl = true` fetches up to `crawl_limit`
//! pages and concatenates their content. Cache hits are reported explicitly
//! through `from_cache` so callers never have to infer caching from timing.

use crate::validate::validate_url;
use crate::{ExtractedContent, WebsiteExtractor};
use async_trait::async_trait;
use gtmforge_config::GtmConfig;
use gtmforge_utils::error::{ConfigError, ScrapeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev/v1";
const DEFAULT_API_KEY_ENV: &str = "FIRECRAWL_API_KEY";
const DEFAULT_CRAWL_LIMIT: u32 = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Clone)]
struct CachedPage {
    content: String,
    html: Option<String>,
}

pub struct FirecrawlExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    crawl_limit: u32,
    cache: Mutex<HashMap<String, CachedPage>>,
}

impl FirecrawlExtractor {
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` if the API key variable is unset.
    pub fn new_from_config(config: &GtmConfig) -> Result<Self, ConfigError> {
        let api_key_env = config
            .scrape
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| ConfigError::MissingEnv {
            var: api_key_env.to_string(),
            purpose: "Firecrawl API key".to_string(),
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http_client".to_string(),
                value: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config
                .scrape
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            crawl_limit: config.scrape.crawl_limit.unwrap_or(DEFAULT_CRAWL_LIMIT),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cache_lookup(&self, url: &str) -> Option<CachedPage> {
        self.cache
            .lock()
            .expect("scrape cache poisoned")
            .get(url)
            .cloned()
    }

    fn cache_store(&self, url: &str, content: &str, html: Option<&str>) {
        // Empty results are never cached, so a later retry can succeed.
        if content.is_empty() && html.is_none_or(str::is_empty) {
            return;
        }
        self.cache.lock().expect("scrape cache poisoned").insert(
            url.to_string(),
            CachedPage {
                content: content.to_string(),
                html: html.map(str::to_string),
            },
        );
    }

    async fn scrape_once(&self, url: &str) -> Result<(String, Option<String>), ScrapeError> {
        let body = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string(), "html".to_string()],
        };

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScrapeError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScrapeError::Http(format!(
                "scrape returned HTTP {}",
                response.status()
            )));
        }

        let parsed: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| ScrapeError::Http(format!("invalid scrape response: {e}")))?;

        let page = parsed.data.unwrap_or_default();
        Ok((page.markdown.unwrap_or_default(), page.html))
    }

    async fn crawl_site(&self, url: &str) -> Result<(String, Option<String>), ScrapeError> {
        let body = CrawlRequest {
            url: url.to_string(),
            limit: self.crawl_limit,
            formats: vec!["markdown".to_string(), "html".to_string()],
            only_main_content: true,
        };

        let response = self
            .client
            .post(format!("{}/crawl", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScrapeError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScrapeError::Http(format!(
                "crawl returned HTTP {}",
                response.status()
            )));
        }

        let parsed: CrawlResponse = response
            .json()
            .await
            .map_err(|e| ScrapeError::Http(format!("invalid crawl response: {e}")))?;

        let pages = parsed.data.unwrap_or_default();
        let content = pages
            .iter()
            .filter_map(|p| p.markdown.as_deref())
            .collect::<Vec<_>>()
            .join("\n\n");
        let html = pages
            .iter()
            .filter_map(|p| p.html.as_deref())
            .collect::<Vec<_>>()
            .join("\n\n");

        let html = if html.is_empty() { None } else { Some(html) };
        Ok((content, html))
    }
}

#[async_trait]
impl WebsiteExtractor for FirecrawlExtractor {
    async fn extract(&self, url: &str, crawl: bool) -> Result<ExtractedContent, ScrapeError> {
        let normalized = validate_url(url)?;

        if let Some(hit) = self.cache_lookup(&normalized) {
            debug!(url = %normalized, "Scrape cache hit");
            return Ok(ExtractedContent {
                url: normalized,
                content: hit.content,
                html: hit.html,
                from_cache: true,
            });
        }

        debug!(url = %normalized, crawl, "Fetching website content");
        let (content, html) = if crawl {
            self.crawl_site(&normalized).await?
        } else {
            self.scrape_once(&normalized).await?
        };

        if content.is_empty() && html.is_none() {
            warn!(url = %normalized, crawl, "Extractor returned no content");
        }
        self.cache_store(&normalized, &content, html.as_deref());

        Ok(ExtractedContent {
            url: normalized,
            content,
            html,
            from_cache: false,
        })
    }
}

#[derive(Debug, Serialize)]
struct ScrapeRequest {
    url: String,
    formats: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CrawlRequest {
    url: String,
    limit: u32,
    formats: Vec<String>,
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    markdown: Option<String>,
    html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    data: Option<Page>,
}

#[derive(Debug, Deserialize)]
struct CrawlResponse {
    data: Option<Vec<Page>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_extractor(base_url: String) -> FirecrawlExtractor {
        FirecrawlExtractor {
            client: reqwest::Client::new(),
            base_url,
            api_key: "test-key".to_string(),
            crawl_limit: 2,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[tokio::test]
    async fn scrape_returns_fresh_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"markdown": "# Acme\nWe make anvils.", "html": "<h1>Acme</h1>"}
            })))
            .mount(&server)
            .await;

        let extractor = test_extractor(server.uri());
        let result = extractor.extract("https://acme.example", false).await.unwrap();
        assert!(result.content.contains("anvils"));
        assert!(result.html.is_some());
        assert!(!result.from_cache);
    }

    #[tokio::test]
    async fn second_extract_is_served_from_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"markdown": "content", "html": "<p>content</p>"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let extractor = test_extractor(server.uri());
        let first = extractor.extract("https://acme.example", false).await.unwrap();
        assert!(!first.from_cache);

        let second = extractor.extract("https://acme.example", false).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.content, "content");
    }

    #[tokio::test]
    async fn empty_results_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"markdown": "", "html": null}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let extractor = test_extractor(server.uri());
        let first = extractor.extract("https://acme.example", false).await.unwrap();
        assert!(first.content.is_empty());

        let second = extractor.extract("https://acme.example", false).await.unwrap();
        assert!(!second.from_cache);
    }

    #[tokio::test]
    async fn crawl_concatenates_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/crawl"))
            .and(body_partial_json(serde_json::json!({"limit": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"markdown": "page one", "html": "<p>1</p>"},
                    {"markdown": "page two", "html": "<p>2</p>"}
                ]
            })))
            .mount(&server)
            .await;

        let extractor = test_extractor(server.uri());
        let result = extractor.extract("https://acme.example", true).await.unwrap();
        assert_eq!(result.content, "page one\n\npage two");
        assert_eq!(result.html.as_deref(), Some("<p>1</p>\n\n<p>2</p>"));
    }

    #[tokio::test]
    async fn http_error_surfaces_as_scrape_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let extractor = test_extractor(server.uri());
        let result = extractor.extract("https://acme.example", false).await;
        assert!(matches!(result, Err(ScrapeError::Http(_))));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_any_request() {
        let extractor = test_extractor("http://unused.example".to_string());
        let result = extractor.extract("not a url at all", false).await;
        assert!(matches!(result, Err(ScrapeError::InvalidUrl { .. })));
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let test_env_var = "FIRECRAWL_API_KEY_TEST_MISSING";
        unsafe {
            std::env::remove_var(test_env_var);
        }

        let mut config = GtmConfig::minimal_for_testing();
        config.scrape.api_key_env = Some(test_env_var.to_string());

        match FirecrawlExtractor::new_from_config(&config) {
            Err(ConfigError::MissingEnv { var, .. }) => assert_eq!(var, test_env_var),
            other => panic!("expected MissingEnv, got {:?}", other.map(|_| ())),
        }
    }
}
