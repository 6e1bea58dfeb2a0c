//! `collect`: prompt every platform, analyze each answer, store the records.

use std::time::Duration;

use anyhow::Context;
use avm_analysis::ResponseContext;
use avm_core::{AppConfig, PlatformConfig, PromptConfig};
use avm_sources::{collect_answers, AnswerSource, ChatCompletionsSource, SourceSettings};

use crate::analyze::metrics_for_text;
use crate::shared;

/// Platforms to query, optionally narrowed to one id.
pub(crate) fn select_platforms(
    platforms: Vec<PlatformConfig>,
    only: Option<&str>,
) -> anyhow::Result<Vec<PlatformConfig>> {
    let Some(id) = only else {
        return Ok(platforms);
    };
    let known: Vec<String> = platforms.iter().map(|p| p.id.clone()).collect();
    let selected: Vec<PlatformConfig> = platforms.into_iter().filter(|p| p.id == id).collect();
    if selected.is_empty() {
        anyhow::bail!(
            "unknown platform '{id}'; configured platforms: {}",
            known.join(", ")
        );
    }
    Ok(selected)
}

/// Upper bound for one prompt on one platform, retries included.
pub(crate) fn call_timeout(settings: &SourceSettings) -> Duration {
    let attempts = u64::from(settings.max_retries).saturating_add(1);
    let backoff_ms = settings
        .retry_backoff_base_ms
        .saturating_mul(1u64 << settings.max_retries.min(6));
    Duration::from_secs(settings.request_timeout_secs.saturating_mul(attempts))
        .saturating_add(Duration::from_millis(backoff_ms))
}

fn print_plan(prompts: &[PromptConfig], platforms: &[PlatformConfig]) {
    println!(
        "Collection plan: {} prompt(s) x {} platform(s) = {} call(s)",
        prompts.len(),
        platforms.len(),
        prompts.len() * platforms.len()
    );
    println!();
    println!("{:<20} {:<30} BASE URL", "PLATFORM", "MODEL");
    for p in platforms {
        println!("{:<20} {:<30} {}", p.id, p.model, p.base_url);
    }
    println!();
    println!("{:<15} {:<15} PROMPT", "TOPIC", "PERSONA");
    for p in prompts {
        println!(
            "{:<15} {:<15} {}",
            p.topic.as_deref().unwrap_or("-"),
            p.persona.as_deref().unwrap_or("-"),
            p.text
        );
    }
}

pub(crate) async fn run_collect(
    config: &AppConfig,
    platform: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let prompts = avm_core::load_prompts(&config.prompts_path)
        .with_context(|| format!("loading prompts from {}", config.prompts_path.display()))?
        .prompts;
    let platforms = avm_core::load_platforms(&config.platforms_path)
        .with_context(|| format!("loading platforms from {}", config.platforms_path.display()))?
        .platforms;
    let platforms = select_platforms(platforms, platform)?;
    let (_, registry) = shared::load_registry(config)?;
    let lexicon = shared::load_lexicon(config)?;

    if dry_run {
        print_plan(&prompts, &platforms);
        return Ok(());
    }

    let settings = SourceSettings::from_app_config(config);
    let mut sources: Vec<Box<dyn AnswerSource>> = Vec::with_capacity(platforms.len());
    for p in &platforms {
        let source = ChatCompletionsSource::from_platform(p, &settings)
            .with_context(|| format!("configuring platform '{}'", p.id))?;
        sources.push(Box::new(source));
    }

    let pool = shared::connect_database(config).await?;

    let report = collect_answers(
        &sources,
        &prompts,
        settings.max_concurrent,
        call_timeout(&settings),
    )
    .await;

    let mut stored = 0usize;
    let mut duplicates = 0usize;
    for collected in &report.answers {
        let mut context =
            ResponseContext::new(&collected.answer.platform_id, &collected.prompt.text)
                .with_topic(collected.prompt.topic.clone())
                .with_persona(collected.prompt.persona.clone());
        context.captured_at = collected.captured_at;

        let metrics = metrics_for_text(&collected.answer.raw_text, context, &registry, &lexicon);
        if avm_db::store_response_metrics(&pool, &metrics).await? {
            stored += 1;
        } else {
            duplicates += 1;
        }
    }

    tracing::info!(
        attempted = report.attempted,
        failed = report.failed,
        stored,
        "collection finished"
    );

    println!("Collection complete");
    println!("{:<25}{}", "Calls attempted:", report.attempted);
    println!("{:<25}{}", "Calls failed:", report.failed);
    println!("{:<25}{}", "Records stored:", stored);
    if duplicates > 0 {
        println!("{:<25}{}", "Already stored:", duplicates);
    }
    if report.failed > 0 {
        println!();
        println!("Some calls failed; see the log for details. Stored records are unaffected.");
    }
    Ok(())
}
