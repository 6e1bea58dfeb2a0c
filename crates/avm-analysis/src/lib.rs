//! Brand visibility analysis for LLM answers.
//!
//! Turns raw answer text into per-brand mention records ([`analyze_response`],
//! [`build_response_metrics`]) and reduces stored records into ranked,
//! scope-level metrics ([`aggregate_all`]). Nothing here performs I/O apart
//! from loading a custom sentiment lexicon.

pub mod aggregate;
pub mod analyzer;
pub mod citations;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod patterns;
pub mod ranking;
pub mod sentences;
pub mod sentiment;

pub use aggregate::{aggregate, aggregate_all, aggregate_scope, scope_value};
pub use analyzer::{analyze_response, PatternRegistry, ResponseAnalysis, TrackedBrand};
pub use citations::{classify, extract_links, LinkRef};
pub use error::AnalysisError;
pub use matcher::{count_matches, find_matches};
pub use metrics::{build_response_metrics, text_fingerprint, within_response_ranks, ResponseContext};
pub use patterns::{
    generate_patterns, generate_patterns_with_aliases, BrandPattern, BrandPatternSet, PatternKind,
};
pub use ranking::assign_ranks;
pub use sentences::split_sentences;
pub use sentiment::{SentenceSentiment, SentimentLexicon};
