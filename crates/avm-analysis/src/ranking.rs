//! Per-metric ranking within one scope.
//!
//! Every metric gets ranks 1..N with no shared ranks: ties on the metric fall
//! back to more total mentions, then to brand name.

use std::cmp::Ordering;

use avm_core::{AggregatedBrandMetric, MetricRanks};

type Compare = fn(&AggregatedBrandMetric, &AggregatedBrandMetric) -> Ordering;
type Assign = fn(&mut MetricRanks, u32);

fn desc_f64(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Lower is better; brands that never appeared sort last.
fn avg_position_order(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    match (a.avg_position, b.avg_position) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_mentions(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    b.total_mentions.cmp(&a.total_mentions)
}

fn by_share_of_voice(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    desc_f64(a.share_of_voice, b.share_of_voice)
}

fn by_depth(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    desc_f64(a.depth_of_mention, b.depth_of_mention)
}

fn by_citation_share(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    desc_f64(a.citation_share, b.citation_share)
}

fn by_first(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    b.position_distribution
        .first
        .cmp(&a.position_distribution.first)
}

fn by_second(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    b.position_distribution
        .second
        .cmp(&a.position_distribution.second)
}

fn by_third(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    b.position_distribution
        .third
        .cmp(&a.position_distribution.third)
}

const RANKED_METRICS: [(Compare, Assign); 8] = [
    (by_mentions, |r, v| r.mentions = v),
    (by_share_of_voice, |r, v| r.share_of_voice = v),
    (avg_position_order, |r, v| r.avg_position = v),
    (by_depth, |r, v| r.depth_of_mention = v),
    (by_citation_share, |r, v| r.citation_share = v),
    (by_first, |r, v| r.first = v),
    (by_second, |r, v| r.second = v),
    (by_third, |r, v| r.third = v),
];

fn tie_break(a: &AggregatedBrandMetric, b: &AggregatedBrandMetric) -> Ordering {
    b.total_mentions
        .cmp(&a.total_mentions)
        .then_with(|| a.brand_name.cmp(&b.brand_name))
}

/// Fill in `ranks` for every metric of every brand in one scope.
pub fn assign_ranks(metrics: &mut [AggregatedBrandMetric]) {
    for (compare, assign) in RANKED_METRICS {
        let mut order: Vec<usize> = (0..metrics.len()).collect();
        order.sort_by(|&i, &j| {
            compare(&metrics[i], &metrics[j]).then_with(|| tie_break(&metrics[i], &metrics[j]))
        });
        for (idx, rank) in order.into_iter().zip(1u32..) {
            assign(&mut metrics[idx].ranks, rank);
        }
    }
}
