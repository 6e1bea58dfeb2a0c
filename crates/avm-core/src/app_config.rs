use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// `None` when `DATABASE_URL` is unset; commands that persist fail fast.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub prompts_path: PathBuf,
    pub platforms_path: PathBuf,
    pub lexicon_path: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub source_request_timeout_secs: u64,
    pub source_user_agent: String,
    pub source_max_concurrent: usize,
    pub source_max_retries: u32,
    pub source_retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("prompts_path", &self.prompts_path)
            .field("platforms_path", &self.platforms_path)
            .field("lexicon_path", &self.lexicon_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "source_request_timeout_secs",
                &self.source_request_timeout_secs,
            )
            .field("source_user_agent", &self.source_user_agent)
            .field("source_max_concurrent", &self.source_max_concurrent)
            .field("source_max_retries", &self.source_max_retries)
            .field(
                "source_retry_backoff_base_ms",
                &self.source_retry_backoff_base_ms,
            )
            .finish()
    }
}

impl AppConfig {
    /// Returns the database URL or the configuration error callers surface
    /// when a persistence handle is required.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingEnvVar`] if `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, crate::ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| crate::ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}
