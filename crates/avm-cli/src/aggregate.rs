//! `aggregate`: recompute every scope from the stored per-response records.

use avm_core::AppConfig;
use avm_db::ResponseFilter;
use sqlx::PgPool;
use uuid::Uuid;

use crate::shared;

pub(crate) async fn run_aggregate(pool: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let (brands, _) = shared::load_registry(config)?;
    let records = avm_db::fetch_response_metrics(pool, &ResponseFilter::default()).await?;

    let run_id = Uuid::new_v4();
    let partitions = avm_analysis::aggregate_all(&records, &brands);

    let mut rows = 0usize;
    for (key, metrics) in &partitions {
        rows += avm_db::store_aggregated_metrics(pool, run_id, key, metrics).await?;
    }

    tracing::info!(
        %run_id,
        responses = records.len(),
        scope_keys = partitions.len(),
        rows,
        "aggregation finished"
    );

    println!("Aggregation complete (run {run_id})");
    println!("{:<25}{}", "Responses read:", records.len());
    println!("{:<25}{}", "Scope keys written:", partitions.len());
    println!("{:<25}{}", "Rows written:", rows);
    Ok(())
}
