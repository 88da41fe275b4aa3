//! Content preprocessing ahead of prompt rendering.
//!
//! Scraped pages arrive as markdown plus optional raw HTML. The pipeline
//! prefers the HTML (stripped down to readable text) when present, splits it
//! into sections, drops boilerplate, and summarizes each surviving chunk.
//! Every stage is a trait so strategies can be swapped per artifact type.

use once_cell::sync::Lazy;
use regex::Regex;

/// Splits raw content into chunks.
pub trait Chunker: Send + Sync {
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Condenses a single chunk.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, chunk: &str) -> String;
}

/// Drops chunks that carry no signal.
pub trait ChunkFilter: Send + Sync {
    fn filter(&self, chunks: Vec<String>) -> Vec<String>;
}

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^##+ ").expect("valid heading regex"));

/// Splits markdown on `##`-level headings, keeping each heading with the
/// content that follows it.
#[derive(Debug, Default)]
pub struct SectionChunker;

impl Chunker for SectionChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut last = 0;
        for m in HEADING.find_iter(text) {
            if m.start() > last {
                chunks.push(text[last..m.start()].trim().to_string());
            }
            last = m.start();
        }
        chunks.push(text[last..].trim().to_string());
        chunks.retain(|c| !c.is_empty());
        chunks
    }
}

/// Returns chunks unchanged. Stands in until model-backed summarization is
/// worth the extra calls.
#[derive(Debug, Default)]
pub struct PassthroughSummarizer;

impl Summarizer for PassthroughSummarizer {
    fn summarize(&self, chunk: &str) -> String {
        chunk.to_string()
    }
}

/// Drops empty chunks and exact duplicates (repeated nav/footer sections).
#[derive(Debug, Default)]
pub struct BoilerplateFilter;

impl ChunkFilter for BoilerplateFilter {
    fn filter(&self, chunks: Vec<String>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        chunks
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .filter(|c| seen.insert(c.trim().to_string()))
            .collect()
    }
}

static NOISE_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script>|<style\b.*?</style>|<nav\b.*?</nav>|<footer\b.*?</footer>|<aside\b.*?</aside>",
    )
    .expect("valid noise-block regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-run regex"));

/// Reduce raw HTML to readable text: drop script/style/nav/footer/aside
/// blocks, strip remaining tags, collapse blank runs.
#[must_use]
pub fn extract_main_text(html: &str) -> String {
    let without_noise = NOISE_BLOCKS.replace_all(html, "");
    let without_tags = TAG.replace_all(&without_noise, "\n");
    BLANK_RUNS.replace_all(&without_tags, "\n\n").trim().to_string()
}

/// Chunk, filter, summarize, rejoin.
pub struct PreprocessingPipeline {
    chunker: Box<dyn Chunker>,
    filter: Box<dyn ChunkFilter>,
    summarizer: Box<dyn Summarizer>,
}

impl Default for PreprocessingPipeline {
    fn default() -> Self {
        Self {
            chunker: Box::new(SectionChunker),
            filter: Box::new(BoilerplateFilter),
            summarizer: Box::new(PassthroughSummarizer),
        }
    }
}

impl PreprocessingPipeline {
    #[must_use]
    pub fn new(
        chunker: Box<dyn Chunker>,
        filter: Box<dyn ChunkFilter>,
        summarizer: Box<dyn Summarizer>,
    ) -> Self {
        Self {
            chunker,
            filter,
            summarizer,
        }
    }

    /// Process scraped content, preferring stripped HTML over the markdown
    /// rendition when HTML is available.
    #[must_use]
    pub fn process(&self, text: &str, html: Option<&str>) -> String {
        let source = match html {
            Some(h) if !h.trim().is_empty() => extract_main_text(h),
            _ => text.to_string(),
        };

        let chunks = self.chunker.chunk(&source);
        let kept = self.filter.filter(chunks);
        kept.iter()
            .map(|c| self.summarizer.summarize(c))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
