//! Keyword lexicon sentiment for brand mentions.
//!
//! Scoring only looks at sentences that mention the brand. The keyword table is
//! data: tune it through a YAML file instead of touching the analyzer.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use avm_core::{SentimentLabel, SentimentSummary};
use serde::Deserialize;

use crate::error::AnalysisError;

/// Built-in word weights for product-recommendation answers.
///
/// Keys are lowercase single words. Positive weights in `(0.0, 1.0]`,
/// negative in `[-1.0, 0.0)`.
pub(crate) const DEFAULT_LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("best", 0.5),
    ("excellent", 0.5),
    ("outstanding", 0.5),
    ("great", 0.4),
    ("top", 0.3),
    ("leading", 0.3),
    ("recommended", 0.4),
    ("recommend", 0.4),
    ("reliable", 0.4),
    ("trusted", 0.4),
    ("popular", 0.3),
    ("strong", 0.3),
    ("generous", 0.4),
    ("valuable", 0.3),
    ("good", 0.3),
    ("favorite", 0.4),
    ("solid", 0.3),
    ("competitive", 0.2),
    ("affordable", 0.3),
    ("convenient", 0.3),
    ("easy", 0.2),
    ("secure", 0.3),
    ("innovative", 0.3),
    ("praised", 0.4),
    ("love", 0.5),
    ("standout", 0.4),
    ("ideal", 0.4),
    ("superior", 0.4),
    // Negative signals
    ("worst", -0.6),
    ("bad", -0.4),
    ("poor", -0.4),
    ("expensive", -0.3),
    ("complaints", -0.4),
    ("complaint", -0.4),
    ("lawsuit", -0.5),
    ("fees", -0.2),
    ("hidden", -0.3),
    ("limited", -0.2),
    ("weak", -0.3),
    ("unreliable", -0.5),
    ("slow", -0.3),
    ("confusing", -0.3),
    ("scam", -0.8),
    ("fraud", -0.8),
    ("breach", -0.6),
    ("risky", -0.4),
    ("avoid", -0.5),
    ("disappointing", -0.5),
    ("lacks", -0.3),
    ("outdated", -0.3),
    ("problems", -0.3),
    ("issues", -0.3),
    ("drawback", -0.2),
    ("drawbacks", -0.2),
    ("downside", -0.2),
    ("criticized", -0.4),
];

/// Keyword hits and score for one sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SentenceSentiment {
    /// Sum of matched weights clamped to `[-1.0, 1.0]`.
    pub score: f64,
    pub positive_hits: u32,
    pub negative_hits: u32,
}

impl SentenceSentiment {
    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        match (self.positive_hits > 0, self.negative_hits > 0) {
            (true, true) => SentimentLabel::Mixed,
            (true, false) => SentimentLabel::Positive,
            (false, true) => SentimentLabel::Negative,
            (false, false) => SentimentLabel::Neutral,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    /// Merge `keywords` over the built-in table instead of replacing it.
    #[serde(default)]
    extend_default: bool,
    keywords: BTreeMap<String, f64>,
}

/// Keyword → polarity weight table.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentLexicon {
    weights: HashMap<String, f64>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            weights: DEFAULT_LEXICON
                .iter()
                .map(|&(word, weight)| (word.to_string(), weight))
                .collect(),
        }
    }
}

impl SentimentLexicon {
    /// Build a lexicon from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidWeight`] for zero or out-of-range weights.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut weights = HashMap::new();
        for (keyword, weight) in entries {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if weight == 0.0 || !(-1.0..=1.0).contains(&weight) || weight.is_nan() {
                return Err(AnalysisError::InvalidWeight { keyword, weight });
            }
            weights.insert(keyword, weight);
        }
        Ok(Self { weights })
    }

    /// Load a lexicon from YAML:
    ///
    /// ```yaml
    /// extend_default: true
    /// keywords:
    ///   seamless: 0.4
    ///   glitchy: -0.4
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the file cannot be read, parsed, or holds invalid weights.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalysisError::LexiconIo {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: LexiconFile =
            serde_yaml::from_str(&content).map_err(|e| AnalysisError::LexiconParse {
                path: path.display().to_string(),
                source: e,
            })?;

        let custom = Self::from_entries(file.keywords)?;
        if !file.extend_default {
            return Ok(custom);
        }
        let mut merged = Self::default();
        merged.weights.extend(custom.weights);
        Ok(merged)
    }

    #[must_use]
    pub fn weight(&self, keyword: &str) -> Option<f64> {
        self.weights.get(keyword).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Score one sentence. Words are lowercased with surrounding punctuation
    /// stripped before lookup.
    #[must_use]
    pub fn score_sentence(&self, text: &str) -> SentenceSentiment {
        let mut result = SentenceSentiment::default();
        let mut sum = 0.0_f64;
        for word in text.split_whitespace() {
            let w = word
                .trim_matches(|c: char| !c.is_alphabetic())
                .to_lowercase();
            if let Some(weight) = self.weights.get(&w) {
                sum += weight;
                if *weight > 0.0 {
                    result.positive_hits += 1;
                } else {
                    result.negative_hits += 1;
                }
            }
        }
        result.score = sum.clamp(-1.0, 1.0);
        result
    }

    /// Summarize the sentences that mention one brand.
    ///
    /// The label is mixed when any sentence is mixed or both positive and
    /// negative sentences occur. The score is the mean sentence score.
    pub fn summarize<'a, I>(&self, sentences: I) -> SentimentSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut count = 0u32;
        let mut total = 0.0_f64;
        let (mut positive, mut negative, mut mixed) = (false, false, false);

        for text in sentences {
            let s = self.score_sentence(text);
            count += 1;
            total += s.score;
            match s.label() {
                SentimentLabel::Positive => positive = true,
                SentimentLabel::Negative => negative = true,
                SentimentLabel::Mixed => mixed = true,
                SentimentLabel::Neutral => {}
            }
        }

        if count == 0 {
            return SentimentSummary::default();
        }

        let label = if mixed || (positive && negative) {
            SentimentLabel::Mixed
        } else if positive {
            SentimentLabel::Positive
        } else if negative {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        SentimentSummary {
            label,
            score: (total / f64::from(count)).clamp(-1.0, 1.0),
        }
    }
}
