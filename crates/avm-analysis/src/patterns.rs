//! Brand pattern generation.
//!
//! Turns a brand display name into an ordered, longest-first list of match
//! strings. Generation is a pure function of the name (plus registry aliases),
//! so the same registry always yields the same pattern sets.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Generic product and corporate terms that never identify a brand on their own.
pub(crate) const GENERIC_TERMS: &[&str] = &[
    "the", "and", "for", "with", "from", "card", "cards", "credit", "debit", "premium", "gold",
    "platinum", "silver", "plus", "rewards", "reward", "cash", "back", "preferred", "reserve",
    "select", "signature", "classic", "standard", "basic", "pro", "max", "ultra", "elite",
    "business", "personal", "travel", "unlimited", "one", "bank", "account", "checking",
    "savings", "loan", "loans", "mortgage", "insurance", "app", "wallet", "inc", "llc", "ltd",
    "corp", "company", "group", "holdings", "official", "online", "store", "shop", "new",
    "cloud", "crm", "erp", "suite", "software", "platform", "tool", "tools", "solution",
    "solutions", "system", "systems", "service", "services", "tech", "technologies", "labs",
    "digital", "data", "analytics", "hub", "desk", "helpdesk", "workspace", "office", "team",
    "teams", "sales", "marketing", "support", "security", "mobile", "web", "apps", "studio",
];

/// Words that mark the rest of a name as a product under a parent brand.
const PRODUCT_INDICATORS: &[&str] = &[
    "card", "credit", "debit", "checking", "savings", "account", "loan", "mortgage",
    "insurance", "app", "wallet", "rewards", "gold", "platinum", "premium", "plus", "preferred",
    "reserve", "cash", "pro",
];

/// Short English words a generated abbreviation must not collide with.
const COMMON_WORDS: &[&str] = &[
    "a", "am", "an", "as", "at", "be", "by", "do", "go", "he", "hi", "if", "in", "is", "it",
    "me", "my", "no", "of", "oh", "ok", "on", "or", "so", "to", "up", "us", "we", "all", "and",
    "any", "are", "ask", "bad", "big", "but", "buy", "can", "car", "day", "did", "for", "get",
    "got", "had", "has", "her", "him", "his", "how", "its", "let", "man", "may", "new", "not",
    "now", "off", "old", "one", "our", "out", "own", "pay", "put", "say", "see", "she", "the",
    "too", "top", "two", "use", "was", "way", "who", "why", "yes", "yet", "you", "also", "back",
    "best", "cash", "card", "each", "even", "from", "good", "have", "here", "into", "just",
    "like", "make", "more", "most", "much", "only", "over", "plus", "same", "some", "such",
    "than", "that", "them", "then", "they", "this", "very", "want", "well", "what", "when",
    "will", "with", "your",
];

const ABBREVIATION_LEN: std::ops::RangeInclusive<usize> = 2..=15;

/// Why a pattern is in the set. Kept alongside the text so matchers can
/// weight kinds differently later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Exact,
    CaseVariant,
    Normalized,
    SignificantWord,
    Prefix,
    Abbreviation,
    ParentBrand,
    ParentCombination,
    Alias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandPattern {
    pub text: String,
    pub kind: PatternKind,
}

/// Immutable longest-first pattern list for one brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandPatternSet {
    brand: String,
    patterns: Vec<BrandPattern>,
}

impl BrandPatternSet {
    #[must_use]
    pub fn brand(&self) -> &str {
        &self.brand
    }

    #[must_use]
    pub fn patterns(&self) -> &[BrandPattern] {
        &self.patterns
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.text.as_str())
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.text == text)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[derive(Default)]
struct PatternBuilder {
    seen: HashSet<String>,
    patterns: Vec<BrandPattern>,
}

impl PatternBuilder {
    fn push(&mut self, text: &str, kind: PatternKind) {
        let text = text.trim();
        if text.is_empty() || !self.seen.insert(text.to_string()) {
            return;
        }
        self.patterns.push(BrandPattern {
            text: text.to_string(),
            kind,
        });
    }

    fn push_cases(&mut self, text: &str, kind: PatternKind) {
        self.push(text, kind);
        self.push(&text.to_lowercase(), kind);
        self.push(&text.to_uppercase(), kind);
        self.push(&title_case(text), kind);
    }

    fn finish(mut self, brand: &str) -> BrandPatternSet {
        self.patterns.sort_by(|a, b| {
            b.text
                .chars()
                .count()
                .cmp(&a.text.chars().count())
                .then_with(|| a.text.cmp(&b.text))
        });
        BrandPatternSet {
            brand: brand.to_string(),
            patterns: self.patterns,
        }
    }
}

/// Generate the match patterns for a brand name.
#[must_use]
pub fn generate_patterns(name: &str) -> BrandPatternSet {
    generate_patterns_with_aliases(name, &[])
}

/// Generate the match patterns for a brand name plus registry aliases.
///
/// An empty or whitespace-only name yields a single pattern holding the raw
/// name, which never matches.
#[must_use]
pub fn generate_patterns_with_aliases(name: &str, aliases: &[String]) -> BrandPatternSet {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        tracing::warn!(brand = name, "empty brand name; using raw name as only pattern");
        return BrandPatternSet {
            brand: name.to_string(),
            patterns: vec![BrandPattern {
                text: name.to_string(),
                kind: PatternKind::Exact,
            }],
        };
    }

    let mut builder = PatternBuilder::default();
    builder.push(trimmed, PatternKind::Exact);
    builder.push(&trimmed.to_uppercase(), PatternKind::CaseVariant);
    builder.push(&trimmed.to_lowercase(), PatternKind::CaseVariant);
    builder.push(&title_case(trimmed), PatternKind::CaseVariant);

    builder.push(&strip_symbols(trimmed), PatternKind::Normalized);
    let normalized = normalize_name(trimmed);
    builder.push(&normalized, PatternKind::Normalized);
    builder.push(&normalized.to_lowercase(), PatternKind::Normalized);

    let words: Vec<&str> = normalized.split_whitespace().collect();

    if words.len() >= 3 {
        builder.push(&words[..2].join(" "), PatternKind::Prefix);
    }

    if let Some((parent, indicators)) = parent_brand(&words) {
        builder.push(&parent, PatternKind::ParentBrand);
        for indicator in indicators {
            builder.push(&format!("{parent} {indicator}"), PatternKind::ParentCombination);
        }
    }

    if words.len() >= 2 {
        for word in words.iter().filter(|w| is_significant(w)) {
            builder.push_cases(word, PatternKind::SignificantWord);
        }
    }

    for abbreviation in abbreviations(&words) {
        builder.push(&abbreviation, PatternKind::Abbreviation);
    }

    for alias in aliases {
        builder.push(alias, PatternKind::Alias);
    }

    builder.finish(name)
}

/// `true` when a single word can identify a brand without its neighbours.
pub(crate) fn is_significant(word: &str) -> bool {
    let lower = word.to_lowercase();
    word.chars().count() >= 3
        && !word.chars().all(|c| c.is_ascii_digit())
        && !GENERIC_TERMS.contains(&lower.as_str())
}

fn is_trademark_symbol(c: char) -> bool {
    matches!(c, '®' | '™' | '©' | '℠')
}

/// Removes trademark symbols only, keeping the rest of the punctuation.
fn strip_symbols(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !is_trademark_symbol(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes trademark symbols and apostrophes, turns word separators into
/// spaces, and collapses whitespace.
pub(crate) fn normalize_name(name: &str) -> String {
    let mapped: String = name
        .chars()
        .filter(|c| !is_trademark_symbol(*c) && !matches!(c, '\'' | '’'))
        .map(|c| {
            if matches!(
                c,
                '-' | '_' | '/' | '.' | ',' | ':' | ';' | '!' | '?' | '(' | ')' | '"'
            ) {
                ' '
            } else {
                c
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits "Parent Product Indicator …" names into the parent prefix and the
/// indicator words that follow it.
fn parent_brand(words: &[&str]) -> Option<(String, Vec<String>)> {
    let first_indicator = words
        .iter()
        .position(|w| PRODUCT_INDICATORS.contains(&w.to_lowercase().as_str()))?;
    if first_indicator == 0 {
        return None;
    }

    let parent_words = &words[..first_indicator];
    if !parent_words.iter().any(|w| is_significant(w)) {
        return None;
    }
    let parent = parent_words.join(" ");

    let mut seen = HashSet::new();
    let indicators = words[first_indicator..]
        .iter()
        .filter(|w| PRODUCT_INDICATORS.contains(&w.to_lowercase().as_str()))
        .filter(|w| seen.insert(w.to_lowercase()))
        .map(|w| (*w).to_string())
        .collect();

    Some((parent, indicators))
}

fn initials<'a>(words: impl Iterator<Item = &'a str>) -> String {
    words
        .filter_map(|w| w.chars().find(|c| c.is_alphanumeric()))
        .flat_map(char::to_uppercase)
        .collect()
}

/// First letter plus the remaining consonants, repeats collapsed.
fn consonant_skeleton(word: &str) -> String {
    let mut letters = word.chars().filter(|c| c.is_alphabetic());
    let Some(first) = letters.next() else {
        return String::new();
    };
    let mut out: Vec<char> = first.to_uppercase().collect();
    for c in letters {
        if matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u') {
            continue;
        }
        let upper = c.to_ascii_uppercase();
        if out.last() != Some(&upper) {
            out.push(upper);
        }
    }
    out.into_iter().collect()
}

fn abbreviations(words: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    if words.len() >= 2 {
        out.push(initials(words.iter().copied()));
        let significant: Vec<&str> = words.iter().copied().filter(|w| is_significant(w)).collect();
        if significant.len() >= 2 {
            out.push(initials(significant.into_iter()));
        }
    } else if let Some(word) = words.first() {
        if word.chars().count() >= 8 {
            out.push(consonant_skeleton(word));
        }
    }

    out.retain(|abbr| {
        ABBREVIATION_LEN.contains(&abbr.chars().count())
            && !COMMON_WORDS.contains(&abbr.to_lowercase().as_str())
    });
    out
}
