//! PHPDoc tag scraping.
//!
//! Doc comments are never parsed structurally.  The extractor and the
//! resolver only need a handful of facts from them, and each fact is one
//! regex away:
//!
//! | Lookup                   | Pattern                          |
//! |--------------------------|----------------------------------|
//! | [`var_type`]             | `@var <type>`                    |
//! | [`return_type`]          | `@return <type>`                 |
//! | [`param_type`]           | `@param <type> $name`            |
//! | [`variable_annotation`]  | `@var <type> $name` in a buffer  |
//!
//! [`DocSummary`] is the coarser line-based reading used by the IDE helper
//! generator, and [`class_name_of`] turns a scraped type into something
//! the symbol index can look up.

use std::sync::LazyLock;

use regex::Regex;

/// Characters a scraped type may contain: identifiers, namespace
/// separators, unions, nullable marks and array suffixes.
const TYPE: &str = r"[\w\\|?\[\]]+";

static VAR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"@var\s+({TYPE})(?:\s|$)")).expect("valid @var regex"));

static RETURN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"@return\s+({TYPE})(?:\s|$)")).expect("valid @return regex")
});

/// Built-in type names that can never name a class.
const SCALAR_TYPES: &[&str] = &[
    "int", "integer", "float", "double", "string", "bool", "boolean", "void", "never", "null",
    "false", "true", "array", "callable", "iterable", "resource", "mixed", "object",
];

// ─── Tag lookups ────────────────────────────────────────────────────────────

/// Type of the first `@var` tag in `doc`.
pub fn var_type(doc: &str) -> Option<String> {
    first_capture(&VAR_TAG, doc)
}

/// Type of the first `@return` tag in `doc`.
pub fn return_type(doc: &str) -> Option<String> {
    first_capture(&RETURN_TAG, doc)
}

/// Type given to parameter `name` by an `@param <type> $name` tag.
///
/// `name` may be passed with or without its `$`.  By-reference (`&$x`)
/// and variadic (`...$x`) spellings in the tag are accepted.
pub fn param_type(doc: &str, name: &str) -> Option<String> {
    let bare = name.trim_start_matches('$');
    if bare.is_empty() {
        return None;
    }
    let pattern = format!(
        r"@param\s+({TYPE})\s+&?(?:\.\.\.)?\${}\b",
        regex::escape(bare)
    );
    let re = Regex::new(&pattern).ok()?;
    first_capture(&re, doc)
}

/// Search a whole buffer for the type a `@var` annotation gives
/// `variable` (e.g. `"$bar"`).
///
/// Both `@var MyType $bar` and the older `@var $bar MyType` spelling are
/// recognised; the earliest annotation in the buffer wins.
pub fn variable_annotation(source: &str, variable: &str) -> Option<String> {
    let var = regex::escape(variable);
    let type_first = Regex::new(&format!(r"@var\s+({TYPE})\s+{var}\b")).ok()?;
    let var_first = Regex::new(&format!(r"@var\s+{var}\s+({TYPE})")).ok()?;

    let a = type_first.captures(source);
    let b = var_first.captures(source);
    let pick = match (a, b) {
        (Some(a), Some(b)) => {
            if a.get(0)?.start() <= b.get(0)?.start() {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    pick.get(1).map(|m| m.as_str().to_string())
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// ─── Type names ─────────────────────────────────────────────────────────────

/// Reduce a scraped type to the short class name the symbol index uses.
///
///   - `\App\Models\User` → `User`
///   - `?User`, `User|null`, `null|User` → `User`
///   - `User[]`, `int`, `A|B` → `None` (not a single class)
pub fn class_name_of(raw: &str) -> Option<String> {
    let s = raw.trim().trim_start_matches('?');
    let parts: Vec<&str> = s
        .split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("null"))
        .collect();
    let [single] = parts.as_slice() else {
        return None;
    };
    if single.ends_with("[]") || is_scalar(single) {
        return None;
    }
    let short = single.rsplit('\\').next().unwrap_or(single);
    (!short.is_empty()).then(|| short.to_string())
}

pub(crate) fn is_scalar(type_name: &str) -> bool {
    let lower = type_name.to_ascii_lowercase();
    SCALAR_TYPES.contains(&lower.as_str())
}

// ─── Summaries ──────────────────────────────────────────────────────────────

/// A doc comment read line by line, the way the IDE helper needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocSummary {
    /// First non-empty line.
    pub summary: String,
    /// Text after each `@param`, e.g. `"string $key"`.
    pub params: Vec<String>,
    /// Text after the last `@return`, if any.
    pub returns: Option<String>,
}

impl DocSummary {
    pub fn parse(doc: &str) -> Self {
        let mut out = DocSummary::default();
        let is_frame = |c: char| matches!(c, '/' | '*' | '\t' | '\r' | '\n' | ' ');

        for line in doc.split('\n').map(|l| l.trim_matches(is_frame)) {
            if line.is_empty() {
                continue;
            }
            if out.summary.is_empty() {
                out.summary = line.to_string();
            }
            if let Some(rest) = line.strip_prefix("@param") {
                out.params.push(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("@return") {
                out.returns = Some(rest.trim().to_string());
            }
        }
        out
    }

    /// `@param` texts joined the way they appear in a signature.
    pub fn joined_params(&self) -> String {
        self.params.join(", ").trim().to_string()
    }
}
