//! Website content extraction for gtmforge.
//!
//! The context resolver consumes extraction through the [`WebsiteExtractor`]
//! trait; [`FirecrawlExtractor`] is the provided HTTP implementation.

mod firecrawl;
mod validate;

pub use firecrawl::FirecrawlExtractor;
pub use gtmforge_utils::error::ScrapeError;
pub use validate::validate_url;

use async_trait::async_trait;

/// Content extracted from a website.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Normalized URL the content was fetched for.
    pub url: String,
    /// Markdown-ish text content. May be empty when the site yielded nothing.
    pub content: String,
    /// Raw HTML, when the extractor produced it.
    pub html: Option<String>,
    /// Whether this result came from the extractor's cache. Explicit so
    /// callers never infer caching from response timing.
    pub from_cache: bool,
}

/// Extraction seam consumed by the context resolver.
#[async_trait]
pub trait WebsiteExtractor: Send + Sync {
    /// Fetch content for `url`. `crawl = true` follows subpages; `false`
    /// fetches the single page.
    ///
    /// # Errors
    ///
    /// Returns `ScrapeError` for invalid URLs and transport failures. An
    /// empty result is not an error; callers decide whether to retry with a
    /// crawl.
    async fn extract(&self, url: &str, crawl: bool) -> Result<ExtractedContent, ScrapeError>;
}
