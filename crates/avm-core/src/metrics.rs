//! Per-response and aggregated visibility records.
//!
//! [`ResponseMetrics`] is written once per analyzed answer and never updated.
//! [`AggregatedBrandMetric`] rows are recomputed wholesale for a [`ScopeKey`]
//! and replace the previous set for that key.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One sentence of a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    /// 0-based position within the response.
    pub index: usize,
    /// Whitespace-delimited token count.
    pub word_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationCategory {
    /// Links to a site the brand owns.
    Brand,
    /// Third-party, non-social coverage.
    Earned,
    Social,
}

impl CitationCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CitationCategory::Brand => "brand",
            CitationCategory::Earned => "earned",
            CitationCategory::Social => "social",
        }
    }
}

impl std::fmt::Display for CitationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub category: CitationCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
    Mixed,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub label: SentimentLabel,
    /// In `[-1.0, 1.0]`.
    pub score: f64,
}

/// How one brand showed up in one response.
///
/// `first_position` is `None` exactly when `mentioned` is `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandMention {
    pub brand_name: String,
    pub mentioned: bool,
    pub mention_count: u32,
    /// 1-indexed sentence of the first mention.
    pub first_position: Option<u32>,
    pub sentences: Vec<Sentence>,
    pub total_word_count: usize,
    pub citations: Vec<Citation>,
    pub sentiment: SentimentSummary,
}

impl BrandMention {
    /// The record every brand gets when a response never names it.
    #[must_use]
    pub fn unmentioned(brand_name: &str) -> Self {
        Self {
            brand_name: brand_name.to_string(),
            mentioned: false,
            mention_count: 0,
            first_position: None,
            sentences: Vec::new(),
            total_word_count: 0,
            citations: Vec::new(),
            sentiment: SentimentSummary::default(),
        }
    }
}

/// Denominators for depth of mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub total_sentences: usize,
    pub total_words: usize,
}

/// The persisted record for one analyzed answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub response_id: Uuid,
    pub platform: String,
    pub topic: Option<String>,
    pub persona: Option<String>,
    pub prompt_text: String,
    pub captured_at: DateTime<Utc>,
    /// Hex SHA-256 of the raw answer text.
    pub text_sha256: String,
    pub metadata: ResponseMetadata,
    /// One entry per tracked brand, in registry order.
    pub mentions: Vec<BrandMention>,
    /// Within-response rank (1 = mentioned first) for each mentioned brand.
    pub ranks: BTreeMap<String, u32>,
}

impl ResponseMetrics {
    #[must_use]
    pub fn mention_for(&self, brand_name: &str) -> Option<&BrandMention> {
        self.mentions.iter().find(|m| m.brand_name == brand_name)
    }

    #[must_use]
    pub fn rank_for(&self, brand_name: &str) -> Option<u32> {
        self.ranks.get(brand_name).copied()
    }
}

/// Aggregation partition dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Overall,
    Platform,
    Topic,
    Persona,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Overall, Scope::Platform, Scope::Topic, Scope::Persona];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Overall => "overall",
            Scope::Platform => "platform",
            Scope::Topic => "topic",
            Scope::Persona => "persona",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overall" => Ok(Scope::Overall),
            "platform" => Ok(Scope::Platform),
            "topic" => Ok(Scope::Topic),
            "persona" => Ok(Scope::Persona),
            other => Err(format!(
                "unknown scope '{other}'; expected overall, platform, topic, or persona"
            )),
        }
    }
}

/// A scope plus the partition value, e.g. `platform` / `"perplexity"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub scope: Scope,
    pub value: String,
}

impl ScopeKey {
    pub const OVERALL_VALUE: &'static str = "all";

    #[must_use]
    pub fn new(scope: Scope, value: &str) -> Self {
        Self {
            scope,
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn overall() -> Self {
        Self::new(Scope::Overall, Self::OVERALL_VALUE)
    }
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope, self.value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationTotals {
    pub brand: u32,
    pub earned: u32,
    pub social: u32,
}

impl CitationTotals {
    pub fn record(&mut self, category: CitationCategory) {
        match category {
            CitationCategory::Brand => self.brand += 1,
            CitationCategory::Earned => self.earned += 1,
            CitationCategory::Social => self.social += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.brand + self.earned + self.social
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
    pub mixed: u32,
}

impl SentimentBreakdown {
    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Mixed => self.mixed += 1,
        }
    }
}

/// How often a brand was the 1st, 2nd, or 3rd brand named in a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDistribution {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

/// Rank per metric within a scope; 1 is best.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRanks {
    pub mentions: u32,
    pub share_of_voice: u32,
    pub avg_position: u32,
    pub depth_of_mention: u32,
    pub citation_share: u32,
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

/// One brand's metrics for one scope key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBrandMetric {
    pub scope_key: ScopeKey,
    pub brand_name: String,
    pub is_own_brand: bool,
    /// Responses in the scope, mentioning or not.
    pub response_count: u32,
    pub total_mentions: u32,
    pub total_appearances: u32,
    /// Percent of all tracked-brand mentions in the scope.
    pub share_of_voice: f64,
    /// `None` when the brand never appeared.
    pub avg_position: Option<f64>,
    /// In `[0, 100]`.
    pub depth_of_mention: f64,
    pub citation_share: f64,
    pub citation_totals: CitationTotals,
    pub sentiment_score: f64,
    pub sentiment_breakdown: SentimentBreakdown,
    pub position_distribution: PositionDistribution,
    pub ranks: MetricRanks,
}
