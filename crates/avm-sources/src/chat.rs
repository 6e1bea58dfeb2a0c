//! Client for OpenAI-compatible `chat/completions` endpoints.
//!
//! Most answer platforms (OpenAI, Perplexity, OpenRouter, local gateways)
//! accept the same request shape, so one client covers all of them. Use
//! [`ChatCompletionsSource::from_platform`] in production and
//! [`ChatCompletionsSource::with_base_url`] to point at a mock server.

use std::time::Duration;

use avm_core::PlatformConfig;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::retry::retry_with_backoff;
use crate::source::{Answer, AnswerFuture, AnswerSource, SourceSettings};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// One platform reached through `POST {base_url}/chat/completions`.
pub struct ChatCompletionsSource {
    client: Client,
    platform_id: String,
    model: String,
    api_key: Option<String>,
    endpoint: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for ChatCompletionsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsSource")
            .field("platform_id", &self.platform_id)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// Reads the platform's bearer token through `lookup`.
///
/// # Errors
///
/// Returns [`SourceError::MissingApiKey`] when the platform names a variable
/// that is unset or blank.
pub fn resolve_api_key<F>(platform: &PlatformConfig, lookup: F) -> Result<Option<String>, SourceError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(var) = platform.api_key_env.as_deref() else {
        return Ok(None);
    };
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(Some(key)),
        _ => Err(SourceError::MissingApiKey {
            platform: platform.id.clone(),
            var: var.to_owned(),
        }),
    }
}

impl ChatCompletionsSource {
    /// Builds a source for a catalogue entry, reading its API key from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingApiKey`] if the key variable is unset,
    /// [`SourceError::InvalidBaseUrl`] for a bad base URL, or
    /// [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_platform(
        platform: &PlatformConfig,
        settings: &SourceSettings,
    ) -> Result<Self, SourceError> {
        let api_key = resolve_api_key(platform, |var| std::env::var(var).ok())?;
        Self::with_base_url(
            &platform.id,
            &platform.model,
            api_key.as_deref(),
            &platform.base_url,
            settings,
        )
    }

    /// Builds a source against an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        platform_id: &str,
        model: &str,
        api_key: Option<&str>,
        base_url: &str,
        settings: &SourceSettings,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;

        let endpoint = Self::endpoint_url(platform_id, base_url)?;

        Ok(Self {
            client,
            platform_id: platform_id.to_owned(),
            model: model.to_owned(),
            api_key: api_key.map(str::to_owned),
            endpoint,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.retry_backoff_base_ms,
        })
    }

    fn endpoint_url(platform_id: &str, base_url: &str) -> Result<Url, SourceError> {
        let joined = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let url = Url::parse(&joined).map_err(|e| SourceError::InvalidBaseUrl {
            platform: platform_id.to_owned(),
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::InvalidBaseUrl {
                platform: platform_id.to_owned(),
                base_url: base_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Asks the platform one prompt, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`SourceError::RateLimited`] on HTTP 429 after all retries.
    /// - [`SourceError::UnexpectedStatus`] on any other non-2xx status (5xx retried).
    /// - [`SourceError::Http`] on network failure after all retries.
    /// - [`SourceError::Deserialize`] if the body is not a chat completion.
    /// - [`SourceError::EmptyAnswer`] if the completion has no text.
    pub async fn complete(&self, prompt: &str) -> Result<Answer, SourceError> {
        retry_with_backoff(
            &self.platform_id,
            self.max_retries,
            self.backoff_base_ms,
            || self.request_once(prompt),
        )
        .await
    }

    async fn request_once(&self, prompt: &str) -> Result<Answer, SourceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SourceError::RateLimited {
                platform: self.platform_id.clone(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                platform: self.platform_id.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| SourceError::Deserialize {
                context: format!("chat completion from {}", self.platform_id),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SourceError::EmptyAnswer {
                platform: self.platform_id.clone(),
            })?;

        Ok(Answer {
            raw_text: content,
            platform_id: self.platform_id.clone(),
        })
    }
}

impl AnswerSource for ChatCompletionsSource {
    fn platform_id(&self) -> &str {
        &self.platform_id
    }

    fn answer<'a>(&'a self, prompt: &'a str) -> AnswerFuture<'a> {
        Box::pin(self.complete(prompt))
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
