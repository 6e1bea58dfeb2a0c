//! Setup shared by the command handlers.

use anyhow::Context;
use avm_analysis::{PatternRegistry, SentimentLexicon};
use avm_core::{AppConfig, BrandConfig};

/// Load and validate the brand registry, then build its pattern sets.
///
/// # Errors
///
/// Returns an error if the registry file is missing or invalid.
pub(crate) fn load_registry(config: &AppConfig) -> anyhow::Result<(Vec<BrandConfig>, PatternRegistry)> {
    let file = avm_core::load_brands(&config.brands_path).with_context(|| {
        format!(
            "loading brand registry from {}",
            config.brands_path.display()
        )
    })?;
    let registry = PatternRegistry::build(&file.brands);
    Ok((file.brands, registry))
}

/// The configured sentiment lexicon, or the built-in table.
///
/// # Errors
///
/// Returns an error if `AVM_LEXICON_PATH` names a file that cannot be loaded.
pub(crate) fn load_lexicon(config: &AppConfig) -> anyhow::Result<SentimentLexicon> {
    match &config.lexicon_path {
        Some(path) => {
            let lexicon = SentimentLexicon::load(path)
                .with_context(|| format!("loading sentiment lexicon from {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                keywords = lexicon.len(),
                "loaded custom sentiment lexicon"
            );
            Ok(lexicon)
        }
        None => Ok(SentimentLexicon::default()),
    }
}

/// Connect to Postgres and apply pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the connection fails, or a
/// migration fails.
pub(crate) async fn connect_database(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config.require_database_url()?;
    let pool_config = avm_db::PoolConfig::from_app_config(config);
    let pool = avm_db::connect_pool(database_url, pool_config)
        .await
        .context("connecting to Postgres")?;
    let applied = avm_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied database migrations");
    }
    Ok(pool)
}
