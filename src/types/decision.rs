//! Outcome types for the resolution pipeline.
//!
//! Expected failure modes (policy denial, provider unavailable, failing
//! verification) are represented as data in these structures, never as
//! errors. Callers branch on explicit fields instead of catching exceptions
//! for control flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of one structural resolver attempt.
///
/// When `resolved` is false, `content` echoes the left side as a safe
/// default; it is never empty and never the right side. Diagnostics record
/// which heuristic fired and exist for audit, not control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverVerdict {
    pub resolved: bool,
    pub content: String,
    pub diagnostics: Vec<String>,
}

impl ResolverVerdict {
    /// A successful resolution with the given content and diagnostic tag.
    pub fn resolved(content: impl Into<String>, tag: impl Into<String>) -> Self {
        ResolverVerdict {
            resolved: true,
            content: content.into(),
            diagnostics: vec![tag.into()],
        }
    }

    /// An unresolved verdict carrying the left content as the safe default.
    pub fn unresolved(left: impl Into<String>, tag: impl Into<String>) -> Self {
        ResolverVerdict {
            resolved: false,
            content: left.into(),
            diagnostics: vec![tag.into()],
        }
    }
}

/// The strategy that produced a decision.
///
/// `Manual` is reserved for cases requiring human intervention and is never
/// auto-selected by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Structural resolution (trivial shortcuts, heuristics, AST delegate).
    Ast,
    /// LLM fallback resolution.
    Llm,
    /// Requires human intervention.
    Manual,
}

/// The finalized outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDecision {
    pub path: String,
    pub content: String,
    pub strategy: ResolutionStrategy,
    pub diagnostics: Vec<String>,
}

/// Aggregate build/test outcome for the merged candidate tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeVerification {
    pub compiled: bool,
    pub tests_passed: bool,
    pub warnings: Vec<String>,
}

impl MergeVerification {
    /// The optimistic verdict used when verification is disabled or no
    /// commands are configured.
    pub fn passing() -> Self {
        MergeVerification {
            compiled: true,
            tests_passed: true,
            warnings: vec![],
        }
    }

    pub fn failing(warning: impl Into<String>) -> Self {
        MergeVerification {
            compiled: false,
            tests_passed: false,
            warnings: vec![warning.into()],
        }
    }

    pub fn passed(&self) -> bool {
        self.compiled && self.tests_passed
    }
}

/// Top-level output of one merge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Per-file decisions, in input file order. May have fewer entries than
    /// eligible triples if per-file resolution hit an unexpected error.
    pub decisions: Vec<MergeDecision>,

    /// True only when verification passed AND every eligible triple produced
    /// a decision. A partially decided tree is never reported as successful,
    /// even if it happens to build.
    pub success: bool,

    /// Verification detail.
    pub verification: MergeVerification,

    /// When the attempt finished.
    pub completed_at: DateTime<Utc>,
}

/// Result of the pre-flight policy gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow: bool,
    /// Human-readable denial reasons; empty when allowed.
    pub reasons: Vec<String>,
}

impl PolicyDecision {
    pub fn allowed() -> Self {
        PolicyDecision {
            allow: true,
            reasons: vec![],
        }
    }

    pub fn denied(reasons: Vec<String>) -> Self {
        PolicyDecision {
            allow: false,
            reasons,
        }
    }
}
