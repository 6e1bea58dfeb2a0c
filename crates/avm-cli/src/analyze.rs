//! `analyze`: run the analyzer over a saved answer without touching the network
//! or the database.

use std::path::PathBuf;

use anyhow::Context;
use avm_analysis::{
    analyze_response, build_response_metrics, PatternRegistry, ResponseContext, SentimentLexicon,
};
use avm_core::{AppConfig, ResponseMetrics};

use crate::shared;

#[derive(Debug, Clone)]
pub(crate) struct AnalyzeRequest {
    pub file: PathBuf,
    pub platform: String,
    pub topic: Option<String>,
    pub persona: Option<String>,
    pub prompt: String,
}

/// Analyze `text` against every registered brand and build its record.
pub(crate) fn metrics_for_text(
    text: &str,
    context: ResponseContext,
    registry: &PatternRegistry,
    lexicon: &SentimentLexicon,
) -> ResponseMetrics {
    let analysis = analyze_response(text, registry.brands(), lexicon);
    build_response_metrics(context, text, registry.brands(), analysis)
}

pub(crate) fn run_analyze(config: &AppConfig, request: &AnalyzeRequest) -> anyhow::Result<()> {
    let (_, registry) = shared::load_registry(config)?;
    let lexicon = shared::load_lexicon(config)?;

    let text = std::fs::read_to_string(&request.file)
        .with_context(|| format!("reading answer from {}", request.file.display()))?;

    let context = ResponseContext::new(&request.platform, &request.prompt)
        .with_topic(request.topic.clone())
        .with_persona(request.persona.clone());
    let metrics = metrics_for_text(&text, context, &registry, &lexicon);

    let mentioned = metrics.mentions.iter().filter(|m| m.mentioned).count();
    tracing::info!(
        file = %request.file.display(),
        sentences = metrics.metadata.total_sentences,
        mentioned,
        "analyzed answer"
    );

    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
