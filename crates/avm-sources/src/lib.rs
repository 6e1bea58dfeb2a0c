//! Answer sources: fetch raw LLM answers for catalogue prompts.
//!
//! [`ChatCompletionsSource`] talks to any OpenAI-compatible endpoint;
//! [`collect_answers`] fans prompts out across sources with bounded
//! concurrency and drops whatever fails.

pub mod chat;
pub mod collect;
pub mod error;
pub mod source;

mod retry;

pub use chat::{resolve_api_key, ChatCompletionsSource};
pub use collect::{collect_answers, CollectReport, CollectedAnswer};
pub use error::SourceError;
pub use source::{Answer, AnswerFuture, AnswerSource, SourceSettings};
