//! Language-model narratives: prompt templates, the calls that send them,
//! and verdict extraction from the replies.

pub mod generator;
pub mod prompts;
pub mod verdict;

pub use generator::{collect_headlines, NarrativeGenerator, NEWS_SUMMARY_COUNT};
pub use prompts::ClientProfile;
pub use verdict::{extract_ai_verdict, AiVerdict};
