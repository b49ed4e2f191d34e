//! Diff-context construction.
//!
//! Builds the immutable [`MergeContext`] a merge attempt operates on: for
//! each conflicting path, the file content at the merge-base, target, and
//! incoming revisions, plus the detected primary language and verification
//! settings. Content retrieval goes through the [`RevisionStore`] capability
//! trait so the builder is testable without a live repository backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{FileTriple, Language, MergeContext, RepoId, Revision};

/// Errors from context construction.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not compute a merge-base for the two revisions.
    #[error("no merge base between {left} and {right}")]
    NoMergeBase { left: Revision, right: Revision },

    /// The backend failed to serve content.
    #[error("revision store error: {0}")]
    Backend(String),
}

/// Read-only access to repository content at specific revisions.
///
/// `file_at` returns `Ok(None)` for a path absent at that revision; only
/// backend failures are errors.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    async fn merge_base(
        &self,
        repo: &RepoId,
        left: &Revision,
        right: &Revision,
    ) -> Result<Revision, StoreError>;

    async fn file_at(
        &self,
        repo: &RepoId,
        revision: &Revision,
        path: &str,
    ) -> Result<Option<String>, StoreError>;
}

/// Verification settings carried into the context.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub verify_commands: Vec<String>,
    pub verify_attempts: Option<u32>,
    pub verify_timeout: Option<Duration>,
}

/// Builds the merge context for one attempt.
///
/// Resolves the merge-base, fetches each path's content at all three
/// revisions, and detects the primary language by majority vote over the
/// recognized languages of the given paths.
pub async fn build_merge_context(
    store: &dyn RevisionStore,
    repo: RepoId,
    left: Revision,
    right: Revision,
    paths: &[String],
    options: ContextOptions,
) -> Result<MergeContext, StoreError> {
    let base = store.merge_base(&repo, &left, &right).await?;
    tracing::debug!(%base, %left, %right, files = paths.len(), "building merge context");

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let triple = FileTriple::new(
            path.clone(),
            store.file_at(&repo, &base, path).await?,
            store.file_at(&repo, &left, path).await?,
            store.file_at(&repo, &right, path).await?,
        );
        files.push(triple);
    }

    Ok(MergeContext {
        repo,
        base_revision: base,
        left_revision: left,
        right_revision: right,
        primary_language: detect_primary_language(paths),
        files,
        verify_commands: options.verify_commands,
        verify_attempts: options.verify_attempts,
        verify_timeout: options.verify_timeout,
    })
}

/// Majority vote over recognized file languages; `Other` only when no path
/// maps to a known language. Ties break toward the earliest path.
fn detect_primary_language(paths: &[String]) -> Language {
    let mut counts: HashMap<Language, usize> = HashMap::new();
    let mut first_seen: HashMap<Language, usize> = HashMap::new();

    for (index, path) in paths.iter().enumerate() {
        let language = Language::from_path(path);
        if language == Language::Other {
            continue;
        }
        *counts.entry(language).or_insert(0) += 1;
        first_seen.entry(language).or_insert(index);
    }

    counts
        .into_iter()
        .max_by(|(a, count_a), (b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| first_seen[b].cmp(&first_seen[a]))
        })
        .map(|(language, _)| language)
        .unwrap_or(Language::Other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory store: (revision, path) → content.
    struct MemoryStore {
        base: Revision,
        files: HashMap<(String, String), String>,
    }

    impl MemoryStore {
        fn new(base: &str) -> Self {
            MemoryStore {
                base: base.into(),
                files: HashMap::new(),
            }
        }

        fn with(mut self, revision: &str, path: &str, content: &str) -> Self {
            self.files
                .insert((revision.to_string(), path.to_string()), content.to_string());
            self
        }
    }

    #[async_trait]
    impl RevisionStore for MemoryStore {
        async fn merge_base(
            &self,
            _repo: &RepoId,
            _left: &Revision,
            _right: &Revision,
        ) -> Result<Revision, StoreError> {
            Ok(self.base.clone())
        }

        async fn file_at(
            &self,
            _repo: &RepoId,
            revision: &Revision,
            path: &str,
        ) -> Result<Option<String>, StoreError> {
            Ok(self
                .files
                .get(&(revision.to_string(), path.to_string()))
                .cloned())
        }
    }

    fn repo() -> RepoId {
        RepoId::new("acme", "widgets")
    }

    #[tokio::test]
    async fn builds_triples_for_all_paths() {
        let store = MemoryStore::new("base-sha")
            .with("base-sha", "src/app.ts", "base content")
            .with("left-sha", "src/app.ts", "left content")
            .with("right-sha", "src/app.ts", "right content");

        let ctx = build_merge_context(
            &store,
            repo(),
            "left-sha".into(),
            "right-sha".into(),
            &["src/app.ts".to_string()],
            ContextOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(ctx.base_revision, Revision::from("base-sha"));
        assert_eq!(ctx.files.len(), 1);
        assert_eq!(ctx.files[0].base.as_deref(), Some("base content"));
        assert_eq!(ctx.files[0].left.as_deref(), Some("left content"));
        assert_eq!(ctx.files[0].right.as_deref(), Some("right content"));
        assert!(ctx.files[0].is_complete());
    }

    #[tokio::test]
    async fn absent_sides_become_none() {
        // File added on the right only: no base or left content.
        let store =
            MemoryStore::new("base-sha").with("right-sha", "new.py", "def fresh():\n    pass\n");

        let ctx = build_merge_context(
            &store,
            repo(),
            "left-sha".into(),
            "right-sha".into(),
            &["new.py".to_string()],
            ContextOptions::default(),
        )
        .await
        .unwrap();

        assert!(ctx.files[0].base.is_none());
        assert!(ctx.files[0].left.is_none());
        assert!(ctx.files[0].right.is_some());
        assert!(!ctx.files[0].is_complete());
        assert_eq!(ctx.eligible_files(), 0);
    }

    #[tokio::test]
    async fn options_are_carried_through() {
        let store = MemoryStore::new("b");
        let options = ContextOptions {
            verify_commands: vec!["make test".into()],
            verify_attempts: Some(3),
            verify_timeout: Some(Duration::from_secs(90)),
        };

        let ctx = build_merge_context(&store, repo(), "l".into(), "r".into(), &[], options)
            .await
            .unwrap();

        assert_eq!(ctx.verify_commands, vec!["make test".to_string()]);
        assert_eq!(ctx.verify_attempts, Some(3));
        assert_eq!(ctx.verify_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn primary_language_is_the_majority() {
        let paths = vec![
            "a.ts".to_string(),
            "b.ts".to_string(),
            "c.py".to_string(),
        ];
        assert_eq!(detect_primary_language(&paths), Language::Ts);
    }

    #[test]
    fn unrecognized_paths_do_not_outvote_recognized_ones() {
        let paths = vec![
            "README.md".to_string(),
            "Makefile".to_string(),
            "main.go".to_string(),
        ];
        assert_eq!(detect_primary_language(&paths), Language::Go);
    }

    #[test]
    fn no_recognized_language_is_other() {
        let paths = vec!["README.md".to_string()];
        assert_eq!(detect_primary_language(&paths), Language::Other);
        assert_eq!(detect_primary_language(&[]), Language::Other);
    }

    #[test]
    fn language_tie_breaks_toward_earliest_path() {
        let paths = vec!["first.py".to_string(), "second.go".to_string()];
        assert_eq!(detect_primary_language(&paths), Language::Py);
    }
}
