//! Prompt and answer-platform catalogues loaded from YAML.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A prompt sent to every configured answer platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub text: String,
    pub topic: Option<String>,
    pub persona: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptsFile {
    pub prompts: Vec<PromptConfig>,
}

/// An answer platform reachable through an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Stable identifier used as the `platform` scope value, e.g. `"openai"`.
    pub id: String,
    pub base_url: String,
    pub model: String,
    /// Name of the env var holding the bearer token. `None` for open endpoints.
    pub api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlatformsFile {
    pub platforms: Vec<PlatformConfig>,
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the prompt catalogue.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or any prompt is blank.
pub fn load_prompts(path: &Path) -> Result<PromptsFile, ConfigError> {
    let file: PromptsFile = read_yaml(path)?;
    validate_prompts(&file)?;
    Ok(file)
}

/// Load the answer-platform catalogue.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or ids are blank or duplicated.
pub fn load_platforms(path: &Path) -> Result<PlatformsFile, ConfigError> {
    let file: PlatformsFile = read_yaml(path)?;
    validate_platforms(&file)?;
    Ok(file)
}

fn validate_prompts(file: &PromptsFile) -> Result<(), ConfigError> {
    if let Some(idx) = file.prompts.iter().position(|p| p.text.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "prompt #{} has empty text",
            idx + 1
        )));
    }
    Ok(())
}

fn validate_platforms(file: &PlatformsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for platform in &file.platforms {
        if platform.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "platform id must be non-empty".to_string(),
            ));
        }
        if !seen.insert(platform.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate platform id: '{}'",
                platform.id
            )));
        }
        if !platform.base_url.starts_with("http://") && !platform.base_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(format!(
                "platform '{}' base_url must be http(s): {}",
                platform.id, platform.base_url
            )));
        }
    }
    Ok(())
}
