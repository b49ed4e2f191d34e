//! Merge orchestrator: policy gate, per-file resolution, verification.
//!
//! The engine is a stateless coordinator: collaborators (structural
//! resolver, LLM resolver, verifier, policy gate) arrive via the
//! constructor, never via ambient singletons, so tests can substitute fakes
//! deterministically.
//!
//! Per-file state machine: pending → structural-attempted → (resolved |
//! llm-attempted → (llm-resolved | llm-defaulted)) → decided. Files are
//! processed sequentially in input order; each triple is independent, so the
//! decision list order is deterministic. Each file's resolution runs in its
//! own task: a panicking resolver loses that file's decision (logged and
//! skipped), never the whole attempt.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::llm::ConflictResolver;
use crate::policy::{MergeAttempt, PolicyGate};
use crate::resolve::StructuralResolver;
use crate::types::{
    FileTriple, MergeContext, MergeDecision, MergeResult, PolicyDecision, ResolutionStrategy,
};
use crate::verify::Verifier;

/// Outcome of a gated merge attempt.
#[derive(Debug)]
pub enum MergeOutcome {
    /// The policy gate vetoed the attempt; no resolution work was done.
    Denied(PolicyDecision),

    /// The pipeline ran to completion (which may still mean `success=false`).
    Completed(MergeResult),
}

/// The merge orchestrator.
pub struct MergeEngine {
    gate: PolicyGate,
    resolver: Arc<StructuralResolver>,
    llm: Arc<ConflictResolver>,
    verifier: Verifier,
}

impl MergeEngine {
    pub fn new(
        gate: PolicyGate,
        resolver: Arc<StructuralResolver>,
        llm: Arc<ConflictResolver>,
        verifier: Verifier,
    ) -> Self {
        MergeEngine {
            gate,
            resolver,
            llm,
            verifier,
        }
    }

    /// Runs a gated merge attempt: policy first, then the pipeline.
    ///
    /// A denial short-circuits before any resolver or verifier work; callers
    /// surface the reasons upstream.
    pub async fn run(
        &self,
        attempt: &MergeAttempt,
        context: &MergeContext,
        cancel: &CancellationToken,
    ) -> MergeOutcome {
        let decision = self.gate.evaluate(attempt);
        if !decision.allow {
            tracing::info!(
                pr = %attempt.pr,
                repo = %attempt.repo,
                reasons = ?decision.reasons,
                "merge attempt denied by policy"
            );
            return MergeOutcome::Denied(decision);
        }

        MergeOutcome::Completed(self.merge(context, cancel).await)
    }

    /// Runs the resolution pipeline over every eligible file triple, then
    /// verifies the assembled decision set.
    ///
    /// Invariants:
    /// - decisions preserve the input file order;
    /// - every fully populated triple yields exactly one decision unless its
    ///   resolution panicked (logged, skipped);
    /// - verification runs strictly after all decisions are finalized;
    /// - `success` requires verification to pass *and* a decision for every
    ///   eligible file.
    pub async fn merge(&self, context: &MergeContext, cancel: &CancellationToken) -> MergeResult {
        let mut decisions: Vec<MergeDecision> = Vec::new();

        for triple in &context.files {
            if !triple.is_complete() {
                tracing::debug!(path = %triple.path, "skipping triple with missing side");
                continue;
            }

            match self.resolve_file(triple, context, cancel).await {
                Some(decision) => decisions.push(decision),
                None => {
                    tracing::warn!(path = %triple.path, "file skipped: resolution panicked");
                }
            }
        }

        let verification = self.verifier.verify(context, &decisions, cancel).await;
        let complete = decisions.len() == context.eligible_files();
        if !complete {
            tracing::warn!(
                decided = decisions.len(),
                eligible = context.eligible_files(),
                "decision set incomplete; attempt cannot succeed"
            );
        }

        MergeResult {
            success: verification.passed() && complete,
            decisions,
            verification,
            completed_at: Utc::now(),
        }
    }

    /// Resolves one file: structural first, LLM fallback second.
    ///
    /// Returns `None` only when resolution panicked; an unresolvable file
    /// still yields a decision carrying the left content.
    async fn resolve_file(
        &self,
        triple: &FileTriple,
        context: &MergeContext,
        cancel: &CancellationToken,
    ) -> Option<MergeDecision> {
        let verdict = {
            let resolver = Arc::clone(&self.resolver);
            let triple = triple.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { resolver.try_three_way(&triple, &cancel).await })
                .await
                .ok()?
        };

        if verdict.resolved {
            tracing::debug!(
                path = %triple.path,
                diagnostics = ?verdict.diagnostics,
                "resolved structurally"
            );
            return Some(MergeDecision {
                path: triple.path.clone(),
                content: verdict.content,
                strategy: ResolutionStrategy::Ast,
                diagnostics: verdict.diagnostics,
            });
        }

        let resolution = {
            let llm = Arc::clone(&self.llm);
            let triple_owned = triple.clone();
            let context = context.clone();
            let cancel = cancel.clone();
            tokio::spawn(
                async move { llm.resolve(&triple_owned, &context, &cancel).await },
            )
            .await
            .ok()?
        };

        // A failed LLM attempt still yields a decision (left content), so
        // every eligible file gets exactly one decision on the normal path.
        let mut diagnostics = verdict.diagnostics;
        diagnostics.extend(resolution.diagnostics);

        Some(MergeDecision {
            path: triple.path.clone(),
            content: resolution.content,
            strategy: ResolutionStrategy::Llm,
            diagnostics,
        })
    }
}
