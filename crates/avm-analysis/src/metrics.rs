//! Per-response metric assembly.

use std::collections::BTreeMap;

use avm_core::{BrandMention, ResponseMetrics};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::analyzer::{ResponseAnalysis, TrackedBrand};

/// Where a response came from.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub response_id: Uuid,
    pub platform: String,
    pub topic: Option<String>,
    pub persona: Option<String>,
    pub prompt_text: String,
    pub captured_at: DateTime<Utc>,
}

impl ResponseContext {
    /// A context with a fresh id, captured now.
    #[must_use]
    pub fn new(platform: &str, prompt_text: &str) -> Self {
        Self {
            response_id: Uuid::new_v4(),
            platform: platform.to_string(),
            topic: None,
            persona: None,
            prompt_text: prompt_text.to_string(),
            captured_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    #[must_use]
    pub fn with_persona(mut self, persona: Option<String>) -> Self {
        self.persona = persona;
        self
    }
}

/// Hex SHA-256 of the raw answer text.
#[must_use]
pub fn text_fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Assemble the persisted record for one response.
///
/// Emits exactly one mention per tracked brand, in `brands` order; a brand the
/// analysis did not cover, or covered with zero mentions, gets the empty record.
#[must_use]
pub fn build_response_metrics(
    context: ResponseContext,
    raw_text: &str,
    brands: &[TrackedBrand],
    analysis: ResponseAnalysis,
) -> ResponseMetrics {
    let mut by_name: BTreeMap<String, BrandMention> = analysis
        .mentions
        .into_iter()
        .map(|m| (m.brand_name.clone(), m))
        .collect();

    let mentions: Vec<BrandMention> = brands
        .iter()
        .map(|brand| match by_name.remove(&brand.name) {
            Some(m) if m.mentioned && m.mention_count > 0 && m.first_position.is_some() => m,
            _ => BrandMention::unmentioned(&brand.name),
        })
        .collect();

    let ranks = within_response_ranks(&mentions);

    ResponseMetrics {
        response_id: context.response_id,
        platform: context.platform,
        topic: context.topic,
        persona: context.persona,
        prompt_text: context.prompt_text,
        captured_at: context.captured_at,
        text_sha256: text_fingerprint(raw_text),
        metadata: analysis.metadata,
        mentions,
        ranks,
    }
}

/// Order in which brands were named: first position ascending, then more
/// mentions first, then brand name. Unmentioned brands get no rank.
#[must_use]
pub fn within_response_ranks(mentions: &[BrandMention]) -> BTreeMap<String, u32> {
    let mut mentioned: Vec<(&BrandMention, u32)> = mentions
        .iter()
        .filter_map(|m| m.first_position.map(|p| (m, p)))
        .collect();

    mentioned.sort_by(|(a, pa), (b, pb)| {
        pa.cmp(pb)
            .then_with(|| b.mention_count.cmp(&a.mention_count))
            .then_with(|| a.brand_name.cmp(&b.brand_name))
    });

    mentioned
        .into_iter()
        .zip(1u32..)
        .map(|((m, _), rank)| (m.brand_name.clone(), rank))
        .collect()
}
