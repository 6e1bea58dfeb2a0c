//! Database operations for the `aggregated_metrics` table.
//!
//! Rows for a scope key are only ever replaced as a complete set, inside one
//! transaction, so readers never see a half-written ranking.

use avm_core::{AggregatedBrandMetric, Scope, ScopeKey};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `aggregated_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AggregatedMetricRow {
    pub id: i64,
    pub run_id: Uuid,
    pub scope: String,
    pub scope_value: String,
    pub brand_name: String,
    pub is_own_brand: bool,
    pub response_count: i32,
    pub total_mentions: i32,
    pub total_appearances: i32,
    pub share_of_voice: Decimal,
    pub avg_position: Option<Decimal>,
    pub depth_of_mention: Decimal,
    pub citation_share: Decimal,
    pub citation_totals: Value,
    pub sentiment_score: Decimal,
    pub sentiment_breakdown: Value,
    pub position_distribution: Value,
    pub ranks: Value,
    pub computed_at: DateTime<Utc>,
}

/// `NUMERIC` columns keep three decimal places.
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(3)
}

fn from_decimal(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn decode<T: serde::de::DeserializeOwned>(
    value: Value,
    context: &str,
    column: &str,
) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::Json {
        context: format!("{context}.{column}"),
        source: e,
    })
}

fn counter(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl AggregatedMetricRow {
    /// Decode the row into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] for an unknown scope or negative
    /// counter, or [`DbError::Json`] if a JSON column does not decode.
    pub fn into_metric(self) -> Result<AggregatedBrandMetric, DbError> {
        let context = format!("aggregated_metrics {}", self.id);
        let scope: Scope = self.scope.parse().map_err(|reason| DbError::InvalidRow {
            context: context.clone(),
            reason,
        })?;
        let uint = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| DbError::InvalidRow {
                context: context.clone(),
                reason: format!("{column} is negative ({value})"),
            })
        };
        Ok(AggregatedBrandMetric {
            scope_key: ScopeKey {
                scope,
                value: self.scope_value,
            },
            brand_name: self.brand_name,
            is_own_brand: self.is_own_brand,
            response_count: uint(self.response_count, "response_count")?,
            total_mentions: uint(self.total_mentions, "total_mentions")?,
            total_appearances: uint(self.total_appearances, "total_appearances")?,
            share_of_voice: from_decimal(self.share_of_voice),
            avg_position: self.avg_position.map(from_decimal),
            depth_of_mention: from_decimal(self.depth_of_mention),
            citation_share: from_decimal(self.citation_share),
            citation_totals: decode(self.citation_totals, &context, "citation_totals")?,
            sentiment_score: from_decimal(self.sentiment_score),
            sentiment_breakdown: decode(self.sentiment_breakdown, &context, "sentiment_breakdown")?,
            position_distribution: decode(
                self.position_distribution,
                &context,
                "position_distribution",
            )?,
            ranks: decode(self.ranks, &context, "ranks")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn to_json<T: serde::Serialize>(value: &T, column: &str) -> Result<Value, DbError> {
    serde_json::to_value(value).map_err(|e| DbError::Json {
        context: format!("aggregated_metrics.{column}"),
        source: e,
    })
}

/// Replace every stored row for `scope_key` with `records`.
///
/// The delete and inserts share one transaction; concurrent writers for the
/// same key serialize on it. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::ScopeMismatch`] if any record belongs to another key
/// (nothing is written), or [`DbError::Sqlx`] if a statement fails and the
/// transaction is rolled back.
pub async fn store_aggregated_metrics(
    pool: &PgPool,
    run_id: Uuid,
    scope_key: &ScopeKey,
    records: &[AggregatedBrandMetric],
) -> Result<usize, DbError> {
    if let Some(stray) = records.iter().find(|r| &r.scope_key != scope_key) {
        return Err(DbError::ScopeMismatch {
            brand: stray.brand_name.clone(),
            expected: scope_key.to_string(),
            found: stray.scope_key.to_string(),
        });
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM aggregated_metrics WHERE scope = $1 AND scope_value = $2")
        .bind(scope_key.scope.as_str())
        .bind(&scope_key.value)
        .execute(&mut *tx)
        .await?;

    for record in records {
        sqlx::query(
            "INSERT INTO aggregated_metrics \
                 (run_id, scope, scope_value, brand_name, is_own_brand, response_count, \
                  total_mentions, total_appearances, share_of_voice, avg_position, \
                  depth_of_mention, citation_share, citation_totals, sentiment_score, \
                  sentiment_breakdown, position_distribution, ranks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(run_id)
        .bind(scope_key.scope.as_str())
        .bind(&scope_key.value)
        .bind(&record.brand_name)
        .bind(record.is_own_brand)
        .bind(counter(record.response_count))
        .bind(counter(record.total_mentions))
        .bind(counter(record.total_appearances))
        .bind(to_decimal(record.share_of_voice))
        .bind(record.avg_position.map(to_decimal))
        .bind(to_decimal(record.depth_of_mention))
        .bind(to_decimal(record.citation_share))
        .bind(to_json(&record.citation_totals, "citation_totals")?)
        .bind(to_decimal(record.sentiment_score))
        .bind(to_json(&record.sentiment_breakdown, "sentiment_breakdown")?)
        .bind(to_json(&record.position_distribution, "position_distribution")?)
        .bind(to_json(&record.ranks, "ranks")?)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        scope_key = %scope_key,
        %run_id,
        rows = records.len(),
        "replaced aggregated metrics"
    );
    Ok(records.len())
}

/// Stored metrics for one scope key, best share of voice first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or a decode error for a
/// corrupt row.
pub async fn list_aggregated_metrics(
    pool: &PgPool,
    scope_key: &ScopeKey,
) -> Result<Vec<AggregatedBrandMetric>, DbError> {
    let rows = sqlx::query_as::<_, AggregatedMetricRow>(
        "SELECT id, run_id, scope, scope_value, brand_name, is_own_brand, response_count, \
                total_mentions, total_appearances, share_of_voice, avg_position, \
                depth_of_mention, citation_share, citation_totals, sentiment_score, \
                sentiment_breakdown, position_distribution, ranks, computed_at \
         FROM aggregated_metrics \
         WHERE scope = $1 AND scope_value = $2 \
         ORDER BY (ranks->>'share_of_voice')::INTEGER ASC, brand_name ASC",
    )
    .bind(scope_key.scope.as_str())
    .bind(&scope_key.value)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AggregatedMetricRow::into_metric).collect()
}

/// Every scope key that currently has stored metrics.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// for an unknown scope name.
pub async fn list_scope_keys(pool: &PgPool) -> Result<Vec<ScopeKey>, DbError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT DISTINCT scope, scope_value FROM aggregated_metrics \
         ORDER BY scope, scope_value",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(scope, value)| {
            let scope: Scope = scope.parse().map_err(|reason| DbError::InvalidRow {
                context: format!("aggregated_metrics scope {value}"),
                reason,
            })?;
            Ok(ScopeKey { scope, value })
        })
        .collect()
}
