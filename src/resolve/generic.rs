//! Line-level and shape-level heuristics for the default/TS-JS resolver.
//!
//! Two tiers live here:
//!
//! 1. **Disjoint-addition merge**: if both sides only *add* lines relative to
//!    base (no deletions on either diff), the additions cannot conflict at
//!    line level and we emit base + unique left additions + unique right
//!    additions.
//! 2. **Top-level shape conservative pick** (TS-JS only): compare the
//!    sequence of top-level construct kinds against base; if one side's
//!    shape is unchanged, prefer the other side's full content.
//!
//! Both are best-effort approximations, not semantic merges. They can
//! produce output that does not compile; the verification stage is the
//! backstop.

use std::borrow::Cow;
use std::collections::HashSet;

use similar::{ChangeTag, TextDiff};

/// Newline-terminates `src` so line tokenization treats a final line without
/// a trailing newline as equal to its terminated form.
fn newline_terminated(src: &str) -> Cow<'_, str> {
    if src.is_empty() || src.ends_with('\n') {
        Cow::Borrowed(src)
    } else {
        Cow::Owned(format!("{src}\n"))
    }
}

/// Lines inserted by `new` relative to `base`, or `None` if `new` also
/// deletes or modifies any base line.
fn additions_only(base: &str, new: &str) -> Option<Vec<String>> {
    let base = newline_terminated(base);
    let new = newline_terminated(new);
    let diff = TextDiff::from_lines(base.as_ref(), new.as_ref());
    let mut added = Vec::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => {}
            ChangeTag::Delete => return None,
            ChangeTag::Insert => {
                added.push(change.value().trim_end_matches(['\n', '\r']).to_string());
            }
        }
    }

    Some(added)
}

/// Attempts the disjoint-addition merge.
///
/// Returns the merged content when both sides are pure additions over base.
/// The result concatenates base, the unique left additions, and the unique
/// right additions (excluding lines the left side already added).
pub fn try_append_merge(base: &str, left: &str, right: &str) -> Option<String> {
    let left_added = additions_only(base, left)?;
    let right_added = additions_only(base, right)?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut additions: Vec<&str> = Vec::new();
    for line in left_added.iter().chain(right_added.iter()) {
        if seen.insert(line.as_str()) {
            additions.push(line.as_str());
        }
    }

    let mut merged = String::from(base);
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    for line in additions {
        merged.push_str(line);
        merged.push('\n');
    }

    Some(merged)
}

/// Kind of a top-level construct in a TS/JS file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopLevelKind {
    Import,
    Export,
    Function,
    Class,
    Interface,
    TypeAlias,
    Enum,
    VarDecl,
    Other,
}

/// Shallow top-level shape of a TS/JS file: the sequence of construct kinds
/// at brace depth zero. Comment lines, blank lines, and closing braces are
/// ignored.
///
/// Returns `None` when the content yields no classifiable constructs, which
/// callers treat as inconclusive.
fn top_level_shape(src: &str) -> Option<Vec<TopLevelKind>> {
    let mut shape = Vec::new();
    let mut depth: i32 = 0;

    for line in src.lines() {
        let trimmed = line.trim_start();
        let at_top = depth == 0;

        // Track depth before classification so the construct's own opening
        // brace doesn't hide it.
        if at_top && !trimmed.is_empty() && !is_comment_or_punct(trimmed) {
            shape.push(classify_line(trimmed));
        }

        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
        // Unbalanced braces make further classification meaningless.
        if depth < 0 {
            return None;
        }
    }

    if shape.is_empty() { None } else { Some(shape) }
}

fn is_comment_or_punct(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.chars().all(|c| "{}();,".contains(c) || c.is_whitespace())
}

fn classify_line(trimmed: &str) -> TopLevelKind {
    let rest = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let rest = rest.strip_prefix("default ").unwrap_or(rest);
    let rest = rest.strip_prefix("declare ").unwrap_or(rest);
    let rest = rest.strip_prefix("async ").unwrap_or(rest);

    let first = rest.split_whitespace().next().unwrap_or("");
    match first {
        "import" => TopLevelKind::Import,
        "function" => TopLevelKind::Function,
        "class" => TopLevelKind::Class,
        "interface" => TopLevelKind::Interface,
        "type" => TopLevelKind::TypeAlias,
        "enum" => TopLevelKind::Enum,
        "const" | "let" | "var" => TopLevelKind::VarDecl,
        _ if rest.len() != trimmed.len() => TopLevelKind::Export,
        _ => TopLevelKind::Other,
    }
}

/// Attempts the conservative shape-based pick for the TS-JS family.
///
/// If exactly one side's top-level shape is unchanged from base, that side
/// made no structural edits and the other side's full content is preferred.
/// Returns the chosen content and its diagnostic tag. When both shapes are
/// unchanged the situation is ambiguous and we return `None` rather than
/// pick a side.
pub fn try_shape_conservative(
    base: &str,
    left: &str,
    right: &str,
) -> Option<(String, &'static str)> {
    let base_shape = top_level_shape(base)?;
    let left_shape = top_level_shape(left)?;
    let right_shape = top_level_shape(right)?;

    let left_unchanged = left_shape == base_shape;
    let right_unchanged = right_shape == base_shape;

    match (left_unchanged, right_unchanged) {
        (true, false) => Some((right.to_string(), "ast-conservative-right")),
        (false, true) => Some((left.to_string(), "ast-conservative-left")),
        _ => None,
    }
}
