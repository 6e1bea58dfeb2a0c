use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {platform} (retry after {retry_after_secs}s)")]
    RateLimited {
        platform: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {platform}")]
    UnexpectedStatus { platform: String, status: u16 },

    #[error("{platform} returned no answer text")]
    EmptyAnswer { platform: String },

    #[error("{platform} did not answer within {timeout_secs}s")]
    Timeout { platform: String, timeout_secs: u64 },

    #[error("API key variable {var} for platform {platform} is not set")]
    MissingApiKey { platform: String, var: String },

    #[error("invalid base URL \"{base_url}\" for platform {platform}: {reason}")]
    InvalidBaseUrl {
        platform: String,
        base_url: String,
        reason: String,
    },
}
