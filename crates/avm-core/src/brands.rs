use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Own,
    #[default]
    Competitor,
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relationship::Own => write!(f, "own"),
            Relationship::Competitor => write!(f, "competitor"),
        }
    }
}

/// One tracked brand from the registry.
///
/// Detection is brand-agnostic; `relationship` only changes reporting emphasis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    #[serde(default)]
    pub relationship: Relationship,
    /// Sites the brand owns, e.g. `"acme.com"`. Used to classify citations.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Extra spellings matched in addition to the generated patterns.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub notes: Option<String>,
}

impl BrandConfig {
    /// Convenience constructor for a competitor with no domains or aliases.
    #[must_use]
    pub fn competitor(name: &str) -> Self {
        Self {
            name: name.to_string(),
            relationship: Relationship::Competitor,
            domains: Vec::new(),
            aliases: Vec::new(),
            notes: None,
        }
    }

    /// Convenience constructor for the monitored brand.
    #[must_use]
    pub fn own(name: &str) -> Self {
        Self {
            relationship: Relationship::Own,
            ..Self::competitor(name)
        }
    }

    #[must_use]
    pub fn is_own_brand(&self) -> bool {
        self.relationship == Relationship::Own
    }
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

impl BrandsFile {
    /// Returns the monitored brand, if the registry names one.
    #[must_use]
    pub fn own_brand(&self) -> Option<&BrandConfig> {
        self.brands.iter().find(|b| b.is_own_brand())
    }
}

/// Load and validate the brand registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    if brands_file.brands.is_empty() {
        return Err(ConfigError::Validation(
            "brand registry must list at least one brand".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut own_count = 0usize;

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        let lower_name = brand.name.trim().to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        if brand.is_own_brand() {
            own_count += 1;
        }

        if let Some(bad) = brand.domains.iter().find(|d| d.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has an empty domain entry ({bad:?})",
                brand.name
            )));
        }
    }

    if own_count > 1 {
        return Err(ConfigError::Validation(format!(
            "at most one brand may be marked own; found {own_count}"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
