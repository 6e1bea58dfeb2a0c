//! Database operations for the append-only `response_metrics` table.

use std::collections::BTreeMap;

use avm_core::{BrandMention, ResponseMetadata, ResponseMetrics};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `response_metrics` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResponseMetricsRow {
    pub id: i64,
    pub response_id: Uuid,
    pub platform: String,
    pub topic: Option<String>,
    pub persona: Option<String>,
    pub prompt_text: String,
    pub captured_at: DateTime<Utc>,
    pub text_sha256: String,
    pub total_sentences: i32,
    pub total_words: i32,
    /// JSON array of [`BrandMention`].
    pub mentions: Value,
    /// JSON object of brand name to within-response rank.
    pub ranks: Value,
    pub created_at: DateTime<Utc>,
}

impl ResponseMetricsRow {
    /// Decode the stored JSON columns back into a [`ResponseMetrics`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] if `mentions` or `ranks` do not decode, or
    /// [`DbError::InvalidRow`] for negative counters.
    pub fn into_metrics(self) -> Result<ResponseMetrics, DbError> {
        let context = format!("response_metrics {}", self.response_id);
        let mentions: Vec<BrandMention> =
            serde_json::from_value(self.mentions).map_err(|e| DbError::Json {
                context: format!("{context}.mentions"),
                source: e,
            })?;
        let ranks: BTreeMap<String, u32> =
            serde_json::from_value(self.ranks).map_err(|e| DbError::Json {
                context: format!("{context}.ranks"),
                source: e,
            })?;
        let counter = |value: i32, column: &str| {
            usize::try_from(value).map_err(|_| DbError::InvalidRow {
                context: context.clone(),
                reason: format!("{column} is negative ({value})"),
            })
        };

        Ok(ResponseMetrics {
            response_id: self.response_id,
            platform: self.platform,
            topic: self.topic,
            persona: self.persona,
            prompt_text: self.prompt_text,
            captured_at: self.captured_at,
            text_sha256: self.text_sha256,
            metadata: ResponseMetadata {
                total_sentences: counter(self.total_sentences, "total_sentences")?,
                total_words: counter(self.total_words, "total_words")?,
            },
            mentions,
            ranks,
        })
    }
}

/// Optional filters for [`fetch_response_metrics`]. `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct ResponseFilter {
    pub platform: Option<String>,
    pub topic: Option<String>,
    pub persona: Option<String>,
    /// Only records captured at or after this instant.
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn to_json<T: serde::Serialize>(value: &T, context: &str) -> Result<Value, DbError> {
    serde_json::to_value(value).map_err(|e| DbError::Json {
        context: context.to_string(),
        source: e,
    })
}

/// Insert one per-response record.
///
/// Records are immutable: storing a `response_id` that already exists is a
/// no-op. Returns `true` when a new row was written.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the mention list cannot be encoded, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn store_response_metrics(
    pool: &PgPool,
    record: &ResponseMetrics,
) -> Result<bool, DbError> {
    let mentions = to_json(&record.mentions, "response_metrics.mentions")?;
    let ranks = to_json(&record.ranks, "response_metrics.ranks")?;

    let result = sqlx::query(
        "INSERT INTO response_metrics \
             (response_id, platform, topic, persona, prompt_text, captured_at, \
              text_sha256, total_sentences, total_words, mentions, ranks) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (response_id) DO NOTHING",
    )
    .bind(record.response_id)
    .bind(&record.platform)
    .bind(&record.topic)
    .bind(&record.persona)
    .bind(&record.prompt_text)
    .bind(record.captured_at)
    .bind(&record.text_sha256)
    .bind(i32::try_from(record.metadata.total_sentences).unwrap_or(i32::MAX))
    .bind(i32::try_from(record.metadata.total_words).unwrap_or(i32::MAX))
    .bind(mentions)
    .bind(ranks)
    .execute(pool)
    .await?;

    let inserted = result.rows_affected() > 0;
    if !inserted {
        tracing::debug!(
            response_id = %record.response_id,
            "response metrics already stored; skipping"
        );
    }
    Ok(inserted)
}

/// Load stored records matching `filter`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or a decode error for a
/// corrupt row.
pub async fn fetch_response_metrics(
    pool: &PgPool,
    filter: &ResponseFilter,
) -> Result<Vec<ResponseMetrics>, DbError> {
    let rows = sqlx::query_as::<_, ResponseMetricsRow>(
        "SELECT id, response_id, platform, topic, persona, prompt_text, captured_at, \
                text_sha256, total_sentences, total_words, mentions, ranks, created_at \
         FROM response_metrics \
         WHERE ($1::TEXT IS NULL OR platform = $1) \
           AND ($2::TEXT IS NULL OR topic = $2) \
           AND ($3::TEXT IS NULL OR persona = $3) \
           AND ($4::TIMESTAMPTZ IS NULL OR captured_at >= $4) \
         ORDER BY captured_at ASC, response_id ASC \
         LIMIT $5",
    )
    .bind(&filter.platform)
    .bind(&filter.topic)
    .bind(&filter.persona)
    .bind(filter.since)
    .bind(filter.limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ResponseMetricsRow::into_metrics).collect()
}
