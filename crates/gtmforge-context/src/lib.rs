//! Context sufficiency and resolution.
//!
//! Decides, per artifact kind, whether provided context is already good
//! enough, and falls back to website content (optionally LLM-assessed) when
//! it is not.

pub mod assess;
pub mod resolver;
pub mod sufficiency;

pub use assess::{Assessment, ContextAssessor, LlmContextAssessor};
pub use resolver::{
    ContextEnvelope, ContextRequest, ContextResolver, ContextSource, ResolutionMode,
};
pub use sufficiency::{
    ensure_object, is_company_context_sufficient, is_target_account_context_sufficient,
    is_target_persona_context_sufficient,
};
