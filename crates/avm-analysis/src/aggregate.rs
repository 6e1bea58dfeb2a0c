//! Scope-level aggregation of per-response metrics.
//!
//! Every scope runs through the same reducer; only the partition key differs.
//! Records are reduced in response-id order so float sums do not depend on
//! the order they were fetched in.

use std::collections::BTreeMap;

use avm_core::{
    AggregatedBrandMetric, BrandConfig, CitationTotals, MetricRanks, PositionDistribution,
    ResponseMetrics, Scope, ScopeKey, SentimentBreakdown,
};

use crate::ranking::assign_ranks;

/// Partition value of `record` for `scope`.
///
/// Records without a topic or persona fall outside those partitions.
#[must_use]
pub fn scope_value(scope: Scope, record: &ResponseMetrics) -> Option<String> {
    match scope {
        Scope::Overall => Some(ScopeKey::OVERALL_VALUE.to_string()),
        Scope::Platform => Some(record.platform.clone()),
        Scope::Topic => record.topic.clone(),
        Scope::Persona => record.persona.clone(),
    }
}

/// Partition `records` with `key_fn` and reduce every partition.
///
/// Each value in the result holds one metric per brand in `brands` order,
/// with ranks assigned within that partition.
pub fn aggregate<F>(
    records: &[ResponseMetrics],
    brands: &[BrandConfig],
    scope: Scope,
    key_fn: F,
) -> BTreeMap<ScopeKey, Vec<AggregatedBrandMetric>>
where
    F: Fn(&ResponseMetrics) -> Option<String>,
{
    let mut partitions: BTreeMap<String, Vec<&ResponseMetrics>> = BTreeMap::new();
    for record in records {
        if let Some(value) = key_fn(record) {
            partitions.entry(value).or_default().push(record);
        }
    }

    partitions
        .into_iter()
        .map(|(value, members)| {
            let key = ScopeKey::new(scope, &value);
            let metrics = reduce(&key, members, brands);
            (key, metrics)
        })
        .collect()
}

/// Metrics for one explicit scope key.
///
/// A key with no matching records still yields one zero-valued metric per brand.
#[must_use]
pub fn aggregate_scope(
    scope_key: &ScopeKey,
    records: &[ResponseMetrics],
    brands: &[BrandConfig],
) -> Vec<AggregatedBrandMetric> {
    let members: Vec<&ResponseMetrics> = records
        .iter()
        .filter(|r| scope_value(scope_key.scope, r).as_deref() == Some(scope_key.value.as_str()))
        .collect();
    reduce(scope_key, members, brands)
}

/// Overall metrics plus every platform, topic, and persona partition.
///
/// The overall key is always present, even for an empty record set.
#[must_use]
pub fn aggregate_all(
    records: &[ResponseMetrics],
    brands: &[BrandConfig],
) -> BTreeMap<ScopeKey, Vec<AggregatedBrandMetric>> {
    let overall = ScopeKey::overall();
    let mut out = BTreeMap::new();
    out.insert(overall.clone(), aggregate_scope(&overall, records, brands));

    for scope in [Scope::Platform, Scope::Topic, Scope::Persona] {
        out.extend(aggregate(records, brands, scope, |r| scope_value(scope, r)));
    }

    tracing::debug!(
        responses = records.len(),
        brands = brands.len(),
        scope_keys = out.len(),
        "aggregated response metrics"
    );
    out
}

#[derive(Debug, Default)]
struct BrandTotals {
    mentions: u32,
    appearances: u32,
    position_sum: f64,
    depth_weight: f64,
    cited_responses: u32,
    citations: CitationTotals,
    sentiment_sum: f64,
    sentiment: SentimentBreakdown,
    positions: PositionDistribution,
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: usize) -> f64 {
    n as f64
}

/// Position-weighted word count of the sentences naming one brand.
fn depth_weight(mention: &avm_core::BrandMention, total_sentences: usize) -> f64 {
    if total_sentences == 0 {
        return 0.0;
    }
    let total = to_f64(total_sentences);
    mention
        .sentences
        .iter()
        .map(|s| to_f64(s.word_count) * (-to_f64(s.index) / total).exp())
        .sum()
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

fn reduce(
    scope_key: &ScopeKey,
    mut records: Vec<&ResponseMetrics>,
    brands: &[BrandConfig],
) -> Vec<AggregatedBrandMetric> {
    records.sort_by_key(|r| r.response_id);

    let mut totals: Vec<BrandTotals> = brands.iter().map(|_| BrandTotals::default()).collect();
    let mut total_words = 0usize;

    for record in &records {
        total_words += record.metadata.total_words;

        for (brand, t) in brands.iter().zip(totals.iter_mut()) {
            let Some(mention) = record.mention_for(&brand.name) else {
                continue;
            };
            let Some(first) = mention.first_position.filter(|_| mention.mentioned) else {
                continue;
            };

            t.mentions += mention.mention_count;
            t.appearances += 1;
            t.position_sum += f64::from(first);
            t.depth_weight += depth_weight(mention, record.metadata.total_sentences);

            if !mention.citations.is_empty() {
                t.cited_responses += 1;
            }
            for citation in &mention.citations {
                t.citations.record(citation.category);
            }

            t.sentiment_sum += mention.sentiment.score;
            t.sentiment.record(mention.sentiment.label);

            match record.rank_for(&brand.name) {
                Some(1) => t.positions.first += 1,
                Some(2) => t.positions.second += 1,
                Some(3) => t.positions.third += 1,
                _ => {}
            }
        }
    }

    let all_mentions: u32 = totals.iter().map(|t| t.mentions).sum();
    let response_count = u32::try_from(records.len()).unwrap_or(u32::MAX);
    let words = to_f64(total_words);

    let mut metrics: Vec<AggregatedBrandMetric> = brands
        .iter()
        .zip(totals)
        .map(|(brand, t)| {
            let appearances = f64::from(t.appearances);
            AggregatedBrandMetric {
                scope_key: scope_key.clone(),
                brand_name: brand.name.clone(),
                is_own_brand: brand.is_own_brand(),
                response_count,
                total_mentions: t.mentions,
                total_appearances: t.appearances,
                share_of_voice: percent(f64::from(t.mentions), f64::from(all_mentions)),
                avg_position: (t.appearances > 0).then(|| t.position_sum / appearances),
                depth_of_mention: percent(t.depth_weight, words).clamp(0.0, 100.0),
                citation_share: percent(f64::from(t.cited_responses), appearances),
                citation_totals: t.citations,
                sentiment_score: if t.appearances > 0 {
                    t.sentiment_sum / appearances
                } else {
                    0.0
                },
                sentiment_breakdown: t.sentiment,
                position_distribution: t.positions,
                ranks: MetricRanks::default(),
            }
        })
        .collect();

    assign_ranks(&mut metrics);
    metrics
}

#[cfg(test)]
mod tests {
    use avm_core::{
        BrandMention, Citation, CitationCategory, ResponseMetadata, Sentence, SentimentLabel,
        SentimentSummary,
    };
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn brands(names: &[&str]) -> Vec<BrandConfig> {
        names.iter().map(|n| BrandConfig::competitor(n)).collect()
    }

    fn sentence(index: usize, word_count: usize) -> Sentence {
        Sentence {
            text: format!("sentence {index}"),
            index,
            word_count,
        }
    }

    fn mention(name: &str, count: u32, sentences: Vec<Sentence>) -> BrandMention {
        let mut m = BrandMention::unmentioned(name);
        if count > 0 {
            m.mentioned = true;
            m.mention_count = count;
            m.first_position = sentences.first().map(|s| u32::try_from(s.index + 1).unwrap());
            m.total_word_count = sentences.iter().map(|s| s.word_count).sum();
            m.sentences = sentences;
        }
        m
    }

    fn record(platform: &str, mentions: Vec<BrandMention>, total_sentences: usize, total_words: usize) -> ResponseMetrics {
        let ranks = crate::metrics::within_response_ranks(&mentions);
        ResponseMetrics {
            response_id: Uuid::new_v4(),
            platform: platform.to_string(),
            topic: None,
            persona: None,
            prompt_text: "best travel card?".to_string(),
            captured_at: Utc::now(),
            text_sha256: String::new(),
            metadata: ResponseMetadata {
                total_sentences,
                total_words,
            },
            mentions,
            ranks,
        }
    }

    fn find<'a>(metrics: &'a [AggregatedBrandMetric], name: &str) -> &'a AggregatedBrandMetric {
        metrics.iter().find(|m| m.brand_name == name).unwrap()
    }

    #[test]
    fn share_of_voice_splits_seventy_thirty() {
        let reg = brands(&["A", "B"]);
        let records = vec![
            record(
                "openai",
                vec![
                    mention("A", 4, vec![sentence(0, 10)]),
                    mention("B", 3, vec![sentence(1, 10)]),
                ],
                2,
                20,
            ),
            record("openai", vec![mention("A", 2, vec![sentence(0, 8)])], 1, 8),
            record("openai", vec![mention("A", 1, vec![sentence(1, 6)])], 2, 12),
        ];
        let metrics = aggregate_scope(&ScopeKey::overall(), &records, &reg);
        let a = find(&metrics, "A");
        let b = find(&metrics, "B");

        assert_eq!(a.total_mentions, 7);
        assert_eq!(b.total_mentions, 3);
        assert_eq!(a.total_appearances, 3);
        assert_eq!(b.total_appearances, 1);
        assert!((a.share_of_voice - 70.0).abs() < 1e-9);
        assert!((b.share_of_voice - 30.0).abs() < 1e-9);
        assert_eq!(a.ranks.mentions, 1);
        assert_eq!(b.ranks.mentions, 2);
        assert_eq!(a.ranks.share_of_voice, 1);
        assert_eq!(b.ranks.share_of_voice, 2);
    }

    /// `(rank, value)` for one ranked metric; values are oriented so larger is better.
    fn ranked_values(metrics: &[AggregatedBrandMetric]) -> Vec<(&'static str, Vec<(u32, f64)>)> {
        let column = |f: fn(&AggregatedBrandMetric) -> (u32, f64)| -> Vec<(u32, f64)> {
            metrics.iter().map(f).collect()
        };
        vec![
            ("mentions", column(|m| (m.ranks.mentions, f64::from(m.total_mentions)))),
            ("share_of_voice", column(|m| (m.ranks.share_of_voice, m.share_of_voice))),
            (
                "avg_position",
                column(|m| (m.ranks.avg_position, -m.avg_position.unwrap_or(f64::INFINITY))),
            ),
            ("depth_of_mention", column(|m| (m.ranks.depth_of_mention, m.depth_of_mention))),
            ("citation_share", column(|m| (m.ranks.citation_share, m.citation_share))),
            ("first", column(|m| (m.ranks.first, f64::from(m.position_distribution.first)))),
            ("second", column(|m| (m.ranks.second, f64::from(m.position_distribution.second)))),
            ("third", column(|m| (m.ranks.third, f64::from(m.position_distribution.third)))),
        ]
    }

    #[test]
    fn rank_one_holds_best_value_for_every_metric() {
        let reg = brands(&["A", "B", "C", "D"]);
        let mut cited = mention("C", 1, vec![sentence(0, 6)]);
        cited.citations = vec![Citation {
            url: "https://c.example.com".into(),
            category: CitationCategory::Earned,
        }];
        let records = vec![
            record(
                "openai",
                vec![
                    mention("A", 3, vec![sentence(1, 5), sentence(2, 5)]),
                    mention("B", 1, vec![sentence(2, 4)]),
                    cited,
                ],
                3,
                15,
            ),
            record(
                "openai",
                vec![
                    mention("B", 2, vec![sentence(0, 9)]),
                    mention("A", 1, vec![sentence(1, 3)]),
                ],
                2,
                12,
            ),
            record("openai", vec![mention("A", 2, vec![sentence(0, 2)])], 4, 20),
        ];
        let metrics = aggregate_scope(&ScopeKey::overall(), &records, &reg);
        assert_eq!(metrics.len(), 4);

        for (name, column) in ranked_values(&metrics) {
            let mut ranks: Vec<u32> = column.iter().map(|(rank, _)| *rank).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, vec![1, 2, 3, 4], "{name}: ranks must be 1..N");

            let best = column.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
            let (_, top) = column
                .iter()
                .find(|(rank, _)| *rank == 1)
                .expect("one brand holds rank 1");
            assert!((top - best).abs() < 1e-9 || *top == best, "{name}: rank 1 has {top}, best is {best}");

            let mut by_rank = column.clone();
            by_rank.sort_by_key(|(rank, _)| *rank);
            assert!(
                by_rank.windows(2).all(|w| w[0].1 >= w[1].1),
                "{name}: values not ordered by rank: {by_rank:?}"
            );
        }
    }

    #[test]
    fn share_of_voice_sums_to_one_hundred() {
        let reg = brands(&["A", "B", "C"]);
        let records = vec![
            record(
                "openai",
                vec![
                    mention("A", 1, vec![sentence(0, 5)]),
                    mention("B", 1, vec![sentence(1, 5)]),
                    mention("C", 1, vec![sentence(2, 5)]),
                ],
                3,
                15,
            ),
            record("openai", vec![mention("A", 2, vec![sentence(0, 4)])], 1, 4),
        ];
        let metrics = aggregate_scope(&ScopeKey::overall(), &records, &reg);
        let sum: f64 = metrics.iter().map(|m| m.share_of_voice).sum();
        assert!((99.99..=100.01).contains(&sum), "sum was {sum}");
    }

    #[test]
    fn never_mentioned_brand_is_zero_valued() {
        let reg = brands(&["A", "Ghost"]);
        let records = vec![record("openai", vec![mention("A", 1, vec![sentence(0, 5)])], 1, 5)];
        let ghost = find(&aggregate_scope(&ScopeKey::overall(), &records, &reg), "Ghost").clone();
        assert_eq!(ghost.total_mentions, 0);
        assert_eq!(ghost.total_appearances, 0);
        assert_eq!(ghost.share_of_voice, 0.0);
        assert_eq!(ghost.avg_position, None);
        assert_eq!(ghost.depth_of_mention, 0.0);
        assert_eq!(ghost.citation_share, 0.0);
        assert_eq!(ghost.response_count, 1);
        assert_eq!(ghost.ranks.avg_position, 2);
    }

    #[test]
    fn earlier_mentions_are_deeper() {
        let reg = brands(&["A"]);
        let early = vec![record("openai", vec![mention("A", 1, vec![sentence(0, 5)])], 3, 15)];
        let late = vec![record("openai", vec![mention("A", 1, vec![sentence(2, 5)])], 3, 15)];
        let early_depth = aggregate_scope(&ScopeKey::overall(), &early, &reg)[0].depth_of_mention;
        let late_depth = aggregate_scope(&ScopeKey::overall(), &late, &reg)[0].depth_of_mention;
        assert!(early_depth > late_depth);
        assert!((early_depth - 100.0 / 3.0).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&late_depth));
    }

    #[test]
    fn avg_position_and_citation_share() {
        let reg = brands(&["A"]);
        let mut cited = mention("A", 1, vec![sentence(2, 4)]);
        cited.citations = vec![
            Citation {
                url: "https://a.com".into(),
                category: CitationCategory::Brand,
            },
            Citation {
                url: "https://reddit.com/r/a".into(),
                category: CitationCategory::Social,
            },
        ];
        let records = vec![
            record("openai", vec![mention("A", 1, vec![sentence(0, 4)])], 3, 12),
            record("openai", vec![cited], 3, 12),
        ];
        let a = aggregate_scope(&ScopeKey::overall(), &records, &reg).remove(0);
        assert_eq!(a.avg_position, Some(2.0));
        assert!((a.citation_share - 50.0).abs() < 1e-9);
        assert_eq!(a.citation_totals.brand, 1);
        assert_eq!(a.citation_totals.social, 1);
        assert_eq!(a.citation_totals.earned, 0);
    }

    #[test]
    fn sentiment_and_position_distribution() {
        let reg = brands(&["A", "B"]);
        let mut positive = mention("A", 1, vec![sentence(0, 4)]);
        positive.sentiment = SentimentSummary {
            label: SentimentLabel::Positive,
            score: 0.6,
        };
        let mut negative = mention("A", 1, vec![sentence(1, 4)]);
        negative.sentiment = SentimentSummary {
            label: SentimentLabel::Negative,
            score: -0.2,
        };
        let records = vec![
            record("openai", vec![positive, mention("B", 1, vec![sentence(1, 4)])], 2, 8),
            record("openai", vec![negative, mention("B", 1, vec![sentence(0, 4)])], 2, 8),
        ];
        let metrics = aggregate_scope(&ScopeKey::overall(), &records, &reg);
        let a = find(&metrics, "A");
        assert!((a.sentiment_score - 0.2).abs() < 1e-9);
        assert_eq!(a.sentiment_breakdown.positive, 1);
        assert_eq!(a.sentiment_breakdown.negative, 1);
        assert_eq!(a.position_distribution.first, 1);
        assert_eq!(a.position_distribution.second, 1);
        assert_eq!(find(&metrics, "B").position_distribution.first, 1);
    }

    #[test]
    fn input_order_does_not_change_output() {
        let reg = brands(&["A", "B"]);
        let records: Vec<ResponseMetrics> = (0..6)
            .map(|i| {
                record(
                    if i % 2 == 0 { "openai" } else { "perplexity" },
                    vec![
                        mention("A", i + 1, vec![sentence(0, 3 + i as usize)]),
                        mention("B", 2, vec![sentence(1, 7)]),
                    ],
                    3,
                    20 + i as usize,
                )
            })
            .collect();
        let mut reversed = records.clone();
        reversed.reverse();
        assert_eq!(aggregate_all(&records, &reg), aggregate_all(&reversed, &reg));
        assert_eq!(aggregate_all(&records, &reg), aggregate_all(&records, &reg));
    }

    #[test]
    fn empty_input_yields_overall_zero_set() {
        let reg = brands(&["A", "B"]);
        let all = aggregate_all(&[], &reg);
        assert_eq!(all.len(), 1);
        let overall = &all[&ScopeKey::overall()];
        assert_eq!(overall.len(), 2);
        assert!(overall.iter().all(|m| m.total_mentions == 0 && m.response_count == 0));
        let mut ranks: Vec<u32> = overall.iter().map(|m| m.ranks.mentions).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn partitions_by_platform_and_skips_missing_topics() {
        let reg = brands(&["A"]);
        let mut tagged = record("perplexity", vec![mention("A", 2, vec![sentence(0, 5)])], 1, 5);
        tagged.topic = Some("travel".into());
        let records = vec![
            record("openai", vec![mention("A", 1, vec![sentence(0, 5)])], 1, 5),
            tagged,
        ];
        let all = aggregate_all(&records, &reg);
        let keys: Vec<String> = all.keys().map(ToString::to_string).collect();
        assert_eq!(
            keys,
            vec!["overall:all", "platform:openai", "platform:perplexity", "topic:travel"]
        );
        assert_eq!(all[&ScopeKey::new(Scope::Platform, "perplexity")][0].total_mentions, 2);
        assert_eq!(all[&ScopeKey::overall()][0].total_mentions, 3);
    }

    #[test]
    fn unknown_scope_value_is_zero_valued() {
        let reg = brands(&["A"]);
        let records = vec![record("openai", vec![mention("A", 1, vec![sentence(0, 5)])], 1, 5)];
        let metrics = aggregate_scope(&ScopeKey::new(Scope::Platform, "gemini"), &records, &reg);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].response_count, 0);
        assert_eq!(metrics[0].scope_key.value, "gemini");
    }
}
