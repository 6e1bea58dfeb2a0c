//! Response analysis: sentences → per-brand mentions, citations, sentiment.
//!
//! [`analyze_response`] is a pure function of the response text and the
//! tracked brands, so answers can be analyzed concurrently without shared state.

use std::collections::HashSet;

use avm_core::{BrandConfig, BrandMention, Citation, ResponseMetadata, Sentence};

use crate::citations::{classify, extract_links, strip_urls, LinkRef};
use crate::matcher::count_matches;
use crate::patterns::{generate_patterns_with_aliases, BrandPatternSet};
use crate::sentences::split_sentences;
use crate::sentiment::SentimentLexicon;

/// A brand together with its generated patterns.
#[derive(Debug, Clone)]
pub struct TrackedBrand {
    pub name: String,
    pub is_own_brand: bool,
    pub domains: Vec<String>,
    pub patterns: BrandPatternSet,
}

impl TrackedBrand {
    #[must_use]
    pub fn from_config(config: &BrandConfig) -> Self {
        Self {
            name: config.name.clone(),
            is_own_brand: config.is_own_brand(),
            domains: config.domains.clone(),
            patterns: generate_patterns_with_aliases(&config.name, &config.aliases),
        }
    }
}

/// Pattern sets for every tracked brand, in registry order.
///
/// Rebuild it whenever the brand registry changes.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    brands: Vec<TrackedBrand>,
}

impl PatternRegistry {
    #[must_use]
    pub fn build(configs: &[BrandConfig]) -> Self {
        let brands: Vec<TrackedBrand> = configs.iter().map(TrackedBrand::from_config).collect();
        tracing::debug!(
            brands = brands.len(),
            patterns = brands.iter().map(|b| b.patterns.len()).sum::<usize>(),
            "built brand pattern registry"
        );
        Self { brands }
    }

    #[must_use]
    pub fn brands(&self) -> &[TrackedBrand] {
        &self.brands
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.brands.iter().map(|b| b.name.as_str())
    }
}

/// Analyzer output for one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseAnalysis {
    pub metadata: ResponseMetadata,
    /// One entry per tracked brand, in the order the brands were given.
    pub mentions: Vec<BrandMention>,
}

/// Analyze one response against every tracked brand.
///
/// Empty or unparsable text yields every brand unmentioned and zero metadata.
#[must_use]
pub fn analyze_response(
    text: &str,
    brands: &[TrackedBrand],
    lexicon: &SentimentLexicon,
) -> ResponseAnalysis {
    let sentences = split_sentences(text);

    if sentences.is_empty() {
        tracing::debug!(
            chars = text.len(),
            "response has no sentences; treating every brand as unmentioned"
        );
        return ResponseAnalysis {
            metadata: ResponseMetadata::default(),
            mentions: brands
                .iter()
                .map(|b| BrandMention::unmentioned(&b.name))
                .collect(),
        };
    }

    let metadata = ResponseMetadata {
        total_sentences: sentences.len(),
        total_words: sentences.iter().map(|s| s.word_count).sum(),
    };

    let links: Vec<Vec<LinkRef>> = sentences.iter().map(|s| extract_links(&s.text)).collect();
    let match_texts: Vec<String> = sentences.iter().map(|s| strip_urls(&s.text)).collect();
    let view = SentenceView {
        sentences: &sentences,
        match_texts: &match_texts,
        links: &links,
    };

    let mentions = brands
        .iter()
        .map(|brand| analyze_brand(brand, &view, lexicon))
        .collect();

    ResponseAnalysis { metadata, mentions }
}

/// Per-sentence data shared by every brand of one response.
struct SentenceView<'a> {
    sentences: &'a [Sentence],
    /// Sentence text with URLs blanked out.
    match_texts: &'a [String],
    links: &'a [Vec<LinkRef>],
}

fn analyze_brand(
    brand: &TrackedBrand,
    view: &SentenceView<'_>,
    lexicon: &SentimentLexicon,
) -> BrandMention {
    let mut mention_count = 0usize;
    let mut matched: Vec<&Sentence> = Vec::new();

    for (sentence, match_text) in view.sentences.iter().zip(view.match_texts) {
        let n = count_matches(match_text, &brand.patterns);
        if n > 0 {
            mention_count += n;
            matched.push(sentence);
        }
    }

    let Some(first) = matched.first() else {
        return BrandMention::unmentioned(&brand.name);
    };
    let first_position = u32::try_from(first.index + 1).unwrap_or(u32::MAX);

    let mut seen_urls = HashSet::new();
    let mut citations = Vec::new();
    for (sentence, sentence_links) in view.sentences.iter().zip(view.links) {
        let sentence_mentions = matched.iter().any(|m| m.index == sentence.index);
        for link in sentence_links {
            let anchor_mentions = link
                .anchor
                .as_deref()
                .is_some_and(|a| count_matches(a, &brand.patterns) > 0);
            if !(sentence_mentions || anchor_mentions) {
                continue;
            }
            if seen_urls.insert(link.url.as_str()) {
                citations.push(Citation {
                    url: link.url.clone(),
                    category: classify(&link.host, &brand.name, &brand.domains),
                });
            }
        }
    }

    let sentiment = lexicon.summarize(matched.iter().map(|s| s.text.as_str()));

    BrandMention {
        brand_name: brand.name.clone(),
        mentioned: true,
        mention_count: u32::try_from(mention_count).unwrap_or(u32::MAX),
        first_position: Some(first_position),
        total_word_count: matched.iter().map(|s| s.word_count).sum(),
        sentences: matched.into_iter().cloned().collect(),
        citations,
        sentiment,
    }
}
