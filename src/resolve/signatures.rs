//! Signature-addition heuristics for Python, Go, and Java.
//!
//! Pattern: extract top-level declaration signatures from each side via a
//! language-appropriate regex; if the right side introduces declarations
//! whose names appear in neither base nor left, append those declaration
//! blocks verbatim after the left content.
//!
//! This assumes the new declarations are self-contained and do not reference
//! symbols removed on the left. It is a known limitation, not a correctness
//! guarantee; the verification stage is the backstop.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Language;

static PY_SIG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:def|class)\s+([A-Za-z_]\w*)").unwrap());

static GO_SIG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)").unwrap());

static JAVA_SIG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:public|protected|private|static|final|abstract|synchronized|native)\s+)+[\w<>\[\],\s]+?\s+([A-Za-z_]\w*)\s*\(",
    )
    .unwrap()
});

fn signature_regex(language: Language) -> Option<&'static Regex> {
    match language {
        Language::Py => Some(&PY_SIG),
        Language::Go => Some(&GO_SIG),
        Language::Java => Some(&JAVA_SIG),
        _ => None,
    }
}

/// Diagnostic tag for a successful signature-addition merge.
pub fn append_tag(language: Language) -> Option<&'static str> {
    match language {
        Language::Py => Some("py-append-new-defs"),
        Language::Go => Some("go-append-new-funcs"),
        Language::Java => Some("java-append-new-methods"),
        _ => None,
    }
}

/// Declaration names matched in `content` for the given language.
fn signature_names(content: &str, re: &Regex) -> HashSet<String> {
    re.captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Attempts the signature-addition merge for py/go/java.
///
/// Returns `left` with the right side's new declaration blocks appended, or
/// `None` when the right side introduces no new declarations (or the
/// language has no signature pattern).
pub fn try_append_new_declarations(
    language: Language,
    base: &str,
    left: &str,
    right: &str,
) -> Option<String> {
    let re = signature_regex(language)?;

    let base_names = signature_names(base, re);
    let left_names = signature_names(left, re);

    let mut blocks: Vec<String> = Vec::new();
    for captures in re.captures_iter(right) {
        let name = captures.get(1)?.as_str();
        if base_names.contains(name) || left_names.contains(name) {
            continue;
        }
        let start = captures.get(0)?.start();
        blocks.push(extract_block(language, right, start));
    }

    if blocks.is_empty() {
        return None;
    }

    let mut merged = String::from(left);
    if !merged.is_empty() && !merged.ends_with('\n') {
        merged.push('\n');
    }
    for block in blocks {
        merged.push('\n');
        merged.push_str(block.trim_end_matches('\n'));
        merged.push('\n');
    }

    Some(merged)
}

/// Extracts the declaration block starting at byte offset `start`.
///
/// Python uses indentation (the block ends at the next non-blank column-zero
/// line); Go and Java use brace depth.
fn extract_block(language: Language, content: &str, start: usize) -> String {
    let rest = &content[start..];
    match language {
        Language::Py => extract_indented_block(rest),
        _ => extract_braced_block(rest),
    }
}

fn extract_indented_block(rest: &str) -> String {
    let mut lines = Vec::new();
    for (i, line) in rest.lines().enumerate() {
        if i > 0 && !line.is_empty() && !line.starts_with([' ', '\t']) {
            break;
        }
        lines.push(line);
    }
    // Trailing blank lines belong to whatever follows, not the block.
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn extract_braced_block(rest: &str) -> String {
    let mut lines = Vec::new();
    let mut depth: i32 = 0;
    let mut opened = false;

    for line in rest.lines() {
        lines.push(line);
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        // Declaration without a body (abstract/interface method).
        if !opened && line.trim_end().ends_with(';') {
            break;
        }
        if opened && depth <= 0 {
            break;
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod python {
        use super::*;

        const BASE: &str = "def a():\n    return 1\n";
        const LEFT: &str = "def a():\n    return 2\n";

        #[test]
        fn new_right_def_is_appended_after_left() {
            let right = "def a():\n    return 1\n\ndef b():\n    return 3\n";
            let merged =
                try_append_new_declarations(Language::Py, BASE, LEFT, right).unwrap();
            assert_eq!(merged, "def a():\n    return 2\n\ndef b():\n    return 3\n");
        }

        #[test]
        fn class_block_keeps_its_body() {
            let right = format!("{}\nclass C:\n    x = 1\n\n    def m(self):\n        pass\n", BASE);
            let merged =
                try_append_new_declarations(Language::Py, BASE, LEFT, &right).unwrap();
            assert!(merged.contains("class C:"));
            assert!(merged.contains("def m(self):"));
            assert!(merged.starts_with(LEFT));
        }

        #[test]
        fn no_new_defs_returns_none() {
            let right = "def a():\n    return 9\n";
            assert_eq!(
                try_append_new_declarations(Language::Py, BASE, LEFT, right),
                None
            );
        }

        #[test]
        fn def_known_to_left_is_not_duplicated() {
            let left = "def a():\n    return 2\n\ndef b():\n    return 0\n";
            let right = "def a():\n    return 1\n\ndef b():\n    return 3\n";
            assert_eq!(
                try_append_new_declarations(Language::Py, BASE, left, right),
                None
            );
        }
    }

    mod golang {
        use super::*;

        const BASE: &str = "package m\n\nfunc A() int {\n\treturn 1\n}\n";
        const LEFT: &str = "package m\n\nfunc A() int {\n\treturn 2\n}\n";

        #[test]
        fn new_right_func_is_appended() {
            let right = format!("{}\nfunc B() int {{\n\treturn 3\n}}\n", BASE);
            let merged =
                try_append_new_declarations(Language::Go, BASE, LEFT, &right).unwrap();
            assert!(merged.starts_with(LEFT));
            assert!(merged.ends_with("func B() int {\n\treturn 3\n}\n"));
        }

        #[test]
        fn method_receiver_name_is_used() {
            let right = format!("{}\nfunc (s *Svc) Close() error {{\n\treturn nil\n}}\n", BASE);
            let merged =
                try_append_new_declarations(Language::Go, BASE, LEFT, &right).unwrap();
            assert!(merged.contains("func (s *Svc) Close() error {"));
        }

        #[test]
        fn nested_braces_stay_inside_the_block() {
            let right = format!(
                "{}\nfunc B() int {{\n\tif true {{\n\t\treturn 3\n\t}}\n\treturn 0\n}}\n",
                BASE
            );
            let merged =
                try_append_new_declarations(Language::Go, BASE, LEFT, &right).unwrap();
            assert!(merged.ends_with("}\n"));
            assert!(merged.contains("if true {"));
        }
    }

    mod java {
        use super::*;

        const BASE: &str =
            "public class App {\n    public int a() {\n        return 1;\n    }\n}\n";
        const LEFT: &str =
            "public class App {\n    public int a() {\n        return 2;\n    }\n}\n";

        #[test]
        fn new_right_method_is_appended() {
            let right =
                "public class App {\n    public int a() {\n        return 1;\n    }\n\n    public int b() {\n        return 3;\n    }\n}\n";
            let merged =
                try_append_new_declarations(Language::Java, BASE, LEFT, right).unwrap();
            assert!(merged.starts_with(LEFT));
            assert!(merged.contains("public int b() {"));
        }

        #[test]
        fn unrelated_language_returns_none() {
            assert_eq!(
                try_append_new_declarations(Language::Ts, BASE, LEFT, BASE),
                None
            );
        }
    }
}
