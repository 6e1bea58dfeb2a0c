//! Bounded fan-out of prompts across answer sources.

use std::time::Duration;

use avm_core::PromptConfig;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::SourceError;
use crate::source::{Answer, AnswerSource};

/// An answer together with the prompt that produced it.
#[derive(Debug, Clone)]
pub struct CollectedAnswer {
    pub prompt: PromptConfig,
    pub answer: Answer,
    pub captured_at: DateTime<Utc>,
}

/// Result of one collection pass.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// Successful answers, ordered by prompt then source.
    pub answers: Vec<CollectedAnswer>,
    pub attempted: usize,
    pub failed: usize,
}

/// Sends every prompt to every source with at most `max_concurrent` calls in
/// flight, each bounded by `call_timeout`.
///
/// Failed or timed-out calls are logged and left out of the report.
pub async fn collect_answers(
    sources: &[Box<dyn AnswerSource>],
    prompts: &[PromptConfig],
    max_concurrent: usize,
    call_timeout: Duration,
) -> CollectReport {
    let jobs: Vec<(usize, usize)> = (0..prompts.len())
        .flat_map(|p| (0..sources.len()).map(move |s| (p, s)))
        .collect();
    let attempted = jobs.len();

    let mut results: Vec<((usize, usize), DateTime<Utc>, Result<Answer, SourceError>)> =
        stream::iter(jobs)
            .map(|(p, s)| {
                let source = &sources[s];
                let prompt = &prompts[p];
                async move {
                    let outcome =
                        match tokio::time::timeout(call_timeout, source.answer(&prompt.text)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(SourceError::Timeout {
                                platform: source.platform_id().to_owned(),
                                timeout_secs: call_timeout.as_secs(),
                            }),
                        };
                    ((p, s), Utc::now(), outcome)
                }
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;

    results.sort_by_key(|(job, _, _)| *job);

    let mut report = CollectReport {
        attempted,
        ..CollectReport::default()
    };
    for ((p, s), captured_at, outcome) in results {
        match outcome {
            Ok(answer) => report.answers.push(CollectedAnswer {
                prompt: prompts[p].clone(),
                answer,
                captured_at,
            }),
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    platform = sources[s].platform_id(),
                    prompt = %prompts[p].text,
                    error = %e,
                    "answer source failed; excluding from this run"
                );
            }
        }
    }

    tracing::info!(
        attempted = report.attempted,
        succeeded = report.answers.len(),
        failed = report.failed,
        "answer collection finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::source::AnswerFuture;

    enum Behavior {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct FakeSource {
        id: &'static str,
        behavior: Behavior,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(id: &'static str, behavior: Behavior) -> Self {
            Self {
                id,
                behavior,
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl AnswerSource for FakeSource {
        fn platform_id(&self) -> &str {
            self.id
        }

        fn answer<'a>(&'a self, prompt: &'a str) -> AnswerFuture<'a> {
            Box::pin(async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                let result = match self.behavior {
                    Behavior::Reply(text) => Ok(Answer {
                        raw_text: format!("{text}: {prompt}"),
                        platform_id: self.id.to_owned(),
                    }),
                    Behavior::Fail => Err(SourceError::UnexpectedStatus {
                        platform: self.id.to_owned(),
                        status: 500,
                    }),
                    Behavior::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        Err(SourceError::EmptyAnswer {
                            platform: self.id.to_owned(),
                        })
                    }
                };
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                result
            })
        }
    }

    fn prompts(texts: &[&str]) -> Vec<PromptConfig> {
        texts
            .iter()
            .map(|t| PromptConfig {
                text: (*t).to_owned(),
                topic: None,
                persona: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn collects_every_prompt_from_every_source_in_order() {
        let sources: Vec<Box<dyn AnswerSource>> = vec![
            Box::new(FakeSource::new("openai", Behavior::Reply("a"))),
            Box::new(FakeSource::new("perplexity", Behavior::Reply("b"))),
        ];
        let report =
            collect_answers(&sources, &prompts(&["q1", "q2"]), 4, Duration::from_secs(5)).await;

        assert_eq!(report.attempted, 4);
        assert_eq!(report.failed, 0);
        let got: Vec<(&str, &str)> = report
            .answers
            .iter()
            .map(|a| (a.prompt.text.as_str(), a.answer.platform_id.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("q1", "openai"),
                ("q1", "perplexity"),
                ("q2", "openai"),
                ("q2", "perplexity"),
            ]
        );
        assert_eq!(report.answers[0].answer.raw_text, "a: q1");
    }

    #[tokio::test]
    async fn failing_source_is_excluded_not_fatal() {
        let sources: Vec<Box<dyn AnswerSource>> = vec![
            Box::new(FakeSource::new("broken", Behavior::Fail)),
            Box::new(FakeSource::new("openai", Behavior::Reply("ok"))),
        ];
        let report = collect_answers(&sources, &prompts(&["q"]), 2, Duration::from_secs(5)).await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.answers.len(), 1);
        assert_eq!(report.answers[0].answer.platform_id, "openai");
    }

    #[tokio::test]
    async fn hung_source_times_out() {
        let sources: Vec<Box<dyn AnswerSource>> =
            vec![Box::new(FakeSource::new("slow", Behavior::Hang))];
        let report =
            collect_answers(&sources, &prompts(&["q"]), 1, Duration::from_millis(50)).await;
        assert_eq!(report.failed, 1);
        assert!(report.answers.is_empty());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let source = FakeSource::new("openai", Behavior::Reply("x"));
        let peak = Arc::clone(&source.peak);
        let sources: Vec<Box<dyn AnswerSource>> = vec![Box::new(source)];
        let report = collect_answers(
            &sources,
            &prompts(&["a", "b", "c", "d", "e", "f"]),
            2,
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(report.answers.len(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn no_sources_or_prompts_is_empty() {
        let report = collect_answers(&[], &prompts(&["q"]), 4, Duration::from_secs(1)).await;
        assert_eq!(report.attempted, 0);
        assert!(report.answers.is_empty());
    }
}
