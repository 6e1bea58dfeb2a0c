//! Shared configuration and domain records for AVM.
//!
//! Holds the brand registry, the prompt and platform catalogues, the
//! environment-driven [`AppConfig`], and the per-response and aggregated
//! metric records exchanged between the analysis, source, and db crates.

pub mod app_config;
pub mod brands;
pub mod catalog;
pub mod config;
pub mod metrics;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use brands::{load_brands, BrandConfig, BrandsFile, Relationship};
pub use catalog::{
    load_platforms, load_prompts, PlatformConfig, PlatformsFile, PromptConfig, PromptsFile,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use metrics::{
    AggregatedBrandMetric, BrandMention, Citation, CitationCategory, CitationTotals, MetricRanks,
    PositionDistribution, ResponseMetadata, ResponseMetrics, Scope, ScopeKey, Sentence,
    SentimentBreakdown, SentimentLabel, SentimentSummary,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}
