//! `report`: ranked metrics for one scope key.

use avm_core::{AggregatedBrandMetric, Scope, ScopeKey};
use sqlx::PgPool;

/// Resolve `--scope`/`--value` into a key. Only the overall scope has a
/// default value.
pub(crate) fn resolve_scope_key(scope: Scope, value: Option<&str>) -> anyhow::Result<ScopeKey> {
    match (scope, value) {
        (Scope::Overall, None) => Ok(ScopeKey::overall()),
        (_, Some(v)) => Ok(ScopeKey::new(scope, v)),
        (_, None) => anyhow::bail!("--value is required for the {scope} scope"),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Render metrics as a markdown table, in the given order.
pub(crate) fn format_report(scope_key: &ScopeKey, metrics: &[AggregatedBrandMetric]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let responses = metrics.first().map_or(0, |m| m.response_count);
    let _ = writeln!(out, "# Visibility report: {scope_key}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Responses in scope: {responses}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| Rank | Brand | Mentions | SoV % | Avg pos | Depth | Citation % | Sentiment | 1st/2nd/3rd |"
    );
    let _ = writeln!(
        out,
        "|-----:|-------|---------:|------:|--------:|------:|-----------:|----------:|:-----------:|"
    );
    for m in metrics {
        let brand = if m.is_own_brand {
            format!("**{}**", m.brand_name)
        } else {
            m.brand_name.clone()
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.2} | {} | {:.2} | {:.2} | {:+.2} | {}/{}/{} |",
            m.ranks.share_of_voice,
            brand,
            m.total_mentions,
            m.share_of_voice,
            fmt_opt(m.avg_position),
            m.depth_of_mention,
            m.citation_share,
            m.sentiment_score,
            m.position_distribution.first,
            m.position_distribution.second,
            m.position_distribution.third,
        );
    }
    out
}

pub(crate) async fn run_report(
    pool: &PgPool,
    scope: Scope,
    value: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let scope_key = resolve_scope_key(scope, value)?;
    let metrics = avm_db::list_aggregated_metrics(pool, &scope_key).await?;

    if metrics.is_empty() {
        let keys = avm_db::list_scope_keys(pool).await?;
        if keys.is_empty() {
            println!("No aggregated metrics stored yet. Run `avm aggregate` first.");
        } else {
            println!("No metrics for {scope_key}. Available scope keys:");
            for key in keys {
                println!("  {key}");
            }
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", format_report(&scope_key, &metrics));
    }
    Ok(())
}
