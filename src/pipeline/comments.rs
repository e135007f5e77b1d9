//! Comment stripping for pipeline files
//!
//! Handles `// to end of line` and `/* ... */` (possibly spanning lines).
//! Line comments keep their trailing newline and block comments are replaced by
//! the newlines they spanned, so line numbers survive stripping.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").expect("comment pattern is valid"));

/// Removes all comments from `text`
///
/// # Example
///
/// ```rust
/// use autobuild::pipeline::strip_comments;
///
/// let text = "stage('build') // compile\n/* gone */sh('make')";
/// assert_eq!(strip_comments(text), "stage('build') \nsh('make')");
/// ```
#[must_use]
pub fn strip_comments(text: &str) -> String {
    COMMENT_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let matched = caps.get(0).map_or("", |m| m.as_str());
            "\n".repeat(matched.matches('\n').count())
        })
        .into_owned()
}
