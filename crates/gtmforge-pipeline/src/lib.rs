//! Artifact generation pipeline.
//!
//! Ties context resolution, optional preprocessing, prompt rendering, and the
//! failover LLM client into one request/response cycle per artifact type.

pub mod artifacts;
pub mod preprocess;
pub mod service;

pub use artifacts::{
    BusinessProfile, BuyingSignal, CompanyOverviewResult, CompanySize, Firmographics,
    IcpHypothesis, Positioning, QualityMetrics, TargetAccountProfile, TargetPersonaProfile,
};
pub use preprocess::{
    BoilerplateFilter, ChunkFilter, Chunker, PassthroughSummarizer, PreprocessingPipeline,
    SectionChunker, Summarizer, extract_main_text,
};
pub use service::{AnalysisRequest, AnalysisService};
