//! The answer-source seam and its runtime settings.

use std::future::Future;
use std::pin::Pin;

use avm_core::AppConfig;

use crate::error::SourceError;

/// Raw answer text from one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub raw_text: String,
    pub platform_id: String,
}

pub type AnswerFuture<'a> = Pin<Box<dyn Future<Output = Result<Answer, SourceError>> + Send + 'a>>;

/// Anything that can answer a prompt on behalf of one platform.
///
/// A failed call means zero responses from that platform for the prompt; it
/// never aborts a collection run.
pub trait AnswerSource: Send + Sync {
    fn platform_id(&self) -> &str;

    fn answer<'a>(&'a self, prompt: &'a str) -> AnswerFuture<'a>;
}

/// HTTP and concurrency settings shared by every source in a run.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent: usize,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            user_agent: "avm/0.1 (answer-visibility)".to_string(),
            max_concurrent: 4,
            max_retries: 2,
            retry_backoff_base_ms: 1_000,
        }
    }
}

impl SourceSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.source_request_timeout_secs,
            user_agent: config.source_user_agent.clone(),
            max_concurrent: config.source_max_concurrent.max(1),
            max_retries: config.source_max_retries,
            retry_backoff_base_ms: config.source_retry_backoff_base_ms,
        }
    }
}
