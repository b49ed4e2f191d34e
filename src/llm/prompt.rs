//! Deterministic prompt construction for conflict resolution.
//!
//! The prompt is a pure function of the merge context and file triple; the
//! same inputs always produce byte-identical prompts. This keeps provider
//! behavior reproducible and cacheable.

use crate::types::{FileTriple, MergeContext};

const CONSTRAINTS: &str = "\
You are resolving a three-way merge conflict in a source file.

Rules:
- Preserve unrelated lines and formatting exactly as they appear.
- Keep license headers intact.
- Do not introduce new dependencies or imports that neither side added.
- If both edits are compatible, compose them; otherwise prefer the change \
that keeps the file self-consistent.

Respond with a single JSON object:
{\"content\": \"<the full merged file>\", \"notes\": [\"<short diagnostics>\"]}";

/// Builds the resolution prompt for one conflicting triple.
///
/// The triple is expected to be complete; absent sides are rendered as empty
/// sections so the prompt shape stays fixed.
pub fn build_prompt(triple: &FileTriple, context: &MergeContext) -> String {
    format!(
        "{constraints}\n\n\
         Repository: {repo}\n\
         Primary language: {language}\n\
         File: {path}\n\n\
         --- BASE (common ancestor) ---\n{base}\n\
         --- LEFT (target branch) ---\n{left}\n\
         --- RIGHT (incoming branch) ---\n{right}\n",
        constraints = CONSTRAINTS,
        repo = context.repo,
        language = context.primary_language.tag(),
        path = triple.path,
        base = triple.base.as_deref().unwrap_or(""),
        left = triple.left.as_deref().unwrap_or(""),
        right = triple.right.as_deref().unwrap_or(""),
    )
}
