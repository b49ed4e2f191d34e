//! The merge context: everything one merge attempt operates on.
//!
//! A `MergeContext` is built once per attempt by the diff-context builder
//! (see [`crate::context`]) and is immutable afterwards. It carries the
//! ordered list of file triples plus the verification configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ids::{RepoId, Revision};

/// Language family of a file, used to route structural resolution.
///
/// Routing is purely by file extension. `.ts`/`.tsx`/`.js`/`.jsx` all map to
/// the TS-JS family and share the same conservative resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Ts,
    Js,
    Py,
    Go,
    Java,
    Rb,
    Other,
}

impl Language {
    /// Determines the language from a file path's extension.
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("tsx") => Language::Ts,
            Some("js") | Some("jsx") => Language::Js,
            Some("py") => Language::Py,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("rb") => Language::Rb,
            _ => Language::Other,
        }
    }

    /// Short tag used in diagnostics (e.g. `py-ast-service`).
    pub fn tag(&self) -> &'static str {
        match self {
            Language::Ts => "ts",
            Language::Js => "js",
            Language::Py => "py",
            Language::Go => "go",
            Language::Java => "java",
            Language::Rb => "rb",
            Language::Other => "other",
        }
    }

    /// True for the TS-JS family, which shares the generic structural resolver.
    pub fn is_ts_js(&self) -> bool {
        matches!(self, Language::Ts | Language::Js)
    }
}

/// The three revisions of one file in a three-way merge.
///
/// Any side may be absent (added or deleted files). Only triples where all
/// three sides are present are eligible for automated resolution; the rest
/// are skipped by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTriple {
    /// Repository-relative path.
    pub path: String,

    /// Content at the merge-base (common ancestor).
    pub base: Option<String>,

    /// Content on the target branch.
    pub left: Option<String>,

    /// Content on the incoming branch.
    pub right: Option<String>,
}

impl FileTriple {
    pub fn new(
        path: impl Into<String>,
        base: Option<String>,
        left: Option<String>,
        right: Option<String>,
    ) -> Self {
        FileTriple {
            path: path.into(),
            base,
            left,
            right,
        }
    }

    /// True when all three sides are present and the triple is eligible for
    /// automated resolution.
    pub fn is_complete(&self) -> bool {
        self.base.is_some() && self.left.is_some() && self.right.is_some()
    }

    /// The language family this file routes to.
    pub fn language(&self) -> Language {
        Language::from_path(&self.path)
    }
}

/// Describes one merge attempt: the file triples plus verification settings.
///
/// Immutable once constructed. Built by the diff-context builder from
/// repository file contents at the merge-base, target, and head revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeContext {
    /// The repository the attempt targets.
    pub repo: RepoId,

    /// Merge-base revision (common ancestor of left and right).
    pub base_revision: Revision,

    /// Target-branch revision.
    pub left_revision: Revision,

    /// Incoming-branch revision.
    pub right_revision: Revision,

    /// Detected primary language of the changed files.
    pub primary_language: Language,

    /// Ordered file triples. Decision order follows this order.
    pub files: Vec<FileTriple>,

    /// Shell commands to run during verification (e.g. build, test).
    /// Empty means verification is optimistic (reports success).
    pub verify_commands: Vec<String>,

    /// Number of verification attempts; a floor of 1 is enforced.
    pub verify_attempts: Option<u32>,

    /// Per-command verification timeout; a 30-second floor is enforced.
    pub verify_timeout: Option<Duration>,
}

impl MergeContext {
    /// Returns the number of triples eligible for automated resolution.
    pub fn eligible_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_complete()).count()
    }
}
