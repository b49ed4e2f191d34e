//! Result reporting.
//!
//! After an attempt completes (or is denied), a reporter surfaces the outcome
//! upstream: a PR check, a comment, a dashboard. Reporting is strictly
//! best-effort and happens after all decisions are final, so a reporter
//! failure can never change a merge result. Implementations log and swallow
//! their own errors.

use async_trait::async_trait;

use crate::policy::MergeAttempt;
use crate::types::{MergeResult, PolicyDecision, ResolutionStrategy};

/// Publishes merge outcomes to an external surface.
///
/// Both methods are infallible by contract: implementations must absorb
/// transport failures internally.
#[async_trait]
pub trait CheckReporter: Send + Sync {
    /// Reports a completed pipeline run.
    async fn report_result(&self, attempt: &MergeAttempt, result: &MergeResult);

    /// Reports a policy denial.
    async fn report_denied(&self, attempt: &MergeAttempt, decision: &PolicyDecision);
}

/// Reporter that emits structured log events instead of calling out.
///
/// Useful as the default wiring and in installations without a checks
/// integration configured.
pub struct TracingReporter;

#[async_trait]
impl CheckReporter for TracingReporter {
    async fn report_result(&self, attempt: &MergeAttempt, result: &MergeResult) {
        let llm_count = result
            .decisions
            .iter()
            .filter(|d| d.strategy == ResolutionStrategy::Llm)
            .count();

        tracing::info!(
            pr = %attempt.pr,
            repo = %attempt.repo,
            success = result.success,
            decisions = result.decisions.len(),
            llm_resolved = llm_count,
            verified = result.verification.passed(),
            warnings = result.verification.warnings.len(),
            completed_at = %result.completed_at,
            "merge attempt completed"
        );
    }

    async fn report_denied(&self, attempt: &MergeAttempt, decision: &PolicyDecision) {
        tracing::info!(
            pr = %attempt.pr,
            repo = %attempt.repo,
            reasons = ?decision.reasons,
            "merge attempt denied"
        );
    }
}
