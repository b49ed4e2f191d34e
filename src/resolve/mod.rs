//! Structural (AST-aware) three-way resolution.
//!
//! The resolver applies, in strict cheapest-to-most-expensive order,
//! short-circuiting on the first success:
//!
//! 1. External AST-merge delegate (if configured)
//! 2. Trivial equivalence shortcuts (all languages)
//! 3. Disjoint-addition line merge (default/TS-JS family)
//! 4. Signature-addition heuristics (Python, Go, Java)
//! 5. Top-level shape conservative pick (TS-JS only)
//!
//! A triple that survives every tier is returned unresolved with the left
//! content as a safe default. Delegate failures never escape this module:
//! network or service errors degrade to "no answer" and fall through to the
//! local heuristics.

pub mod delegate;
mod generic;
mod signatures;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::types::{FileTriple, Language, ResolverVerdict};

pub use delegate::{
    DelegateError, DelegateReply, DelegateRequest, HttpAstService, StructuralMergeDelegate,
};

/// The structural resolver.
///
/// Stateless apart from its optional delegate; safe to share across files
/// and attempts. Collaborators arrive via the constructor so tests can
/// substitute fakes.
pub struct StructuralResolver {
    delegate: Option<Arc<dyn StructuralMergeDelegate>>,
}

impl StructuralResolver {
    /// A resolver using only local heuristics.
    pub fn new() -> Self {
        StructuralResolver { delegate: None }
    }

    /// A resolver that consults the external AST-merge service first.
    pub fn with_delegate(delegate: Arc<dyn StructuralMergeDelegate>) -> Self {
        StructuralResolver {
            delegate: Some(delegate),
        }
    }

    /// Attempts structural resolution of one file triple.
    ///
    /// Never fails: the worst case is an unresolved verdict echoing the left
    /// content. Cancellation only affects the delegate call (the local
    /// heuristics are synchronous and cheap).
    pub async fn try_three_way(
        &self,
        triple: &FileTriple,
        cancel: &CancellationToken,
    ) -> ResolverVerdict {
        let (Some(base), Some(left), Some(right)) =
            (triple.base.as_deref(), triple.left.as_deref(), triple.right.as_deref())
        else {
            // Incomplete triples are skipped by the orchestrator; if one
            // arrives anyway, fall back to whatever left content exists.
            return ResolverVerdict::unresolved(
                triple.left.clone().unwrap_or_default(),
                "incomplete-triple",
            );
        };

        let language = triple.language();

        if let Some(verdict) = self.try_delegate(triple, base, left, right, language, cancel).await
        {
            return verdict;
        }

        if let Some(verdict) = try_trivial(base, left, right) {
            return verdict;
        }

        match language {
            Language::Py | Language::Go | Language::Java => {
                if let Some(merged) =
                    signatures::try_append_new_declarations(language, base, left, right)
                {
                    // Tag is always present for these languages.
                    let tag = signatures::append_tag(language).unwrap_or("append-new-decls");
                    return ResolverVerdict::resolved(merged, tag);
                }
            }
            _ => {
                if let Some(merged) = generic::try_append_merge(base, left, right) {
                    return ResolverVerdict::resolved(merged, "append-merge");
                }
                if language.is_ts_js()
                    && let Some((content, tag)) =
                        generic::try_shape_conservative(base, left, right)
                {
                    return ResolverVerdict::resolved(content, tag);
                }
            }
        }

        let tag = match language {
            Language::Other => "unsupported-language".to_string(),
            _ => format!("{}-unresolved", language.tag()),
        };
        ResolverVerdict::unresolved(left, tag)
    }

    /// Consults the external AST-merge service, treating every failure mode
    /// (transport error, cancellation, empty reply) as "no answer".
    async fn try_delegate(
        &self,
        triple: &FileTriple,
        base: &str,
        left: &str,
        right: &str,
        language: Language,
        cancel: &CancellationToken,
    ) -> Option<ResolverVerdict> {
        let delegate = self.delegate.as_ref()?;

        let request = DelegateRequest {
            path: triple.path.clone(),
            base: base.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            language,
        };

        let reply = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(path = %triple.path, "delegate call cancelled");
                return None;
            }
            result = delegate.merge(&request) => match result {
                Ok(reply) => reply,
                Err(error) => {
                    tracing::debug!(path = %triple.path, %error, "delegate unavailable");
                    return None;
                }
            },
        };

        let content = reply.answer()?.to_string();
        let mut verdict =
            ResolverVerdict::resolved(content, format!("{}-ast-service", language.tag()));
        verdict.diagnostics.extend(reply.diagnostics);
        Some(verdict)
    }
}

impl Default for StructuralResolver {
    fn default() -> Self {
        StructuralResolver::new()
    }
}

/// The trivial equivalence shortcuts, applied for every language.
fn try_trivial(base: &str, left: &str, right: &str) -> Option<ResolverVerdict> {
    if left == base && right != base {
        return Some(ResolverVerdict::resolved(right, "right-wins"));
    }
    if right == base && left != base {
        return Some(ResolverVerdict::resolved(left, "left-wins"));
    }
    if left == right {
        return Some(ResolverVerdict::resolved(left, "identical-sides"));
    }
    None
}
