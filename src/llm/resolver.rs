//! The LLM conflict resolver.
//!
//! Fail-safe by construction: whatever happens inside the provider, the
//! resolver returns *something*, and that something is the left content
//! unless the provider produced a non-empty merged file. It never errors
//! out and never silently returns empty content.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::types::{FileTriple, MergeContext};

use super::prompt::build_prompt;
use super::provider::CompletionProvider;

/// Outcome of an LLM resolution attempt.
///
/// Always usable as a decision: on provider failure `content` is the left
/// input and the diagnostics record why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResolution {
    pub content: String,
    pub diagnostics: Vec<String>,
}

/// Resolves conflicts the structural cascade could not.
pub struct ConflictResolver {
    provider: Arc<dyn CompletionProvider>,
}

impl ConflictResolver {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        ConflictResolver { provider }
    }

    /// Attempts LLM resolution of one conflicting triple.
    ///
    /// The prompt is deterministic in the triple and context. On provider
    /// error, empty reply, or cancellation, the left content is returned
    /// verbatim with a diagnostic noting the failure.
    pub async fn resolve(
        &self,
        triple: &FileTriple,
        context: &MergeContext,
        cancel: &CancellationToken,
    ) -> LlmResolution {
        let left = triple.left.clone().unwrap_or_default();
        let prompt = build_prompt(triple, context);

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(path = %triple.path, "llm resolution cancelled");
                return LlmResolution {
                    content: left,
                    diagnostics: vec!["llm-cancelled".to_string()],
                };
            }
            result = self.provider.complete_json(&prompt) => result,
        };

        match result {
            Ok(completion) if !completion.content.is_empty() => {
                let mut diagnostics = vec!["llm-resolved".to_string()];
                diagnostics.extend(completion.diagnostics);
                LlmResolution {
                    content: completion.content,
                    diagnostics,
                }
            }
            Ok(completion) => {
                // Provider declined (e.g. disabled); keep its diagnostics and
                // fall back to left.
                let mut diagnostics = completion.diagnostics;
                diagnostics.push("llm-fallback-left".to_string());
                LlmResolution {
                    content: left,
                    diagnostics,
                }
            }
            Err(error) => {
                tracing::warn!(path = %triple.path, %error, "llm resolution failed");
                LlmResolution {
                    content: left,
                    diagnostics: vec![format!("llm-failed: {error}")],
                }
            }
        }
    }
}
