//! Shell statement grammar
//!
//! Recognises the single-line shell statement forms a pipeline uses:
//!
//! | Form | Command |
//! |------|---------|
//! | `sh('make')` | `make` |
//! | `sh("make")` | `make` |
//! | `sh 'make'` | `make` |
//! | `sh "make"` | `make` |
//!
//! Anything else is rejected instead of being trimmed into a corrupt command.

/// Parses a trimmed line as a shell statement, returning its command
///
/// Returns `None` if the line is not exactly one statement.
///
/// # Example
///
/// ```rust
/// use autobuild::pipeline::parse_shell_statement;
///
/// assert_eq!(parse_shell_statement("sh('make test')"), Some("make test"));
/// assert_eq!(parse_shell_statement("echo 'hi'"), None);
/// ```
#[must_use]
pub fn parse_shell_statement(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("sh")?;

    if let Some(inner) = rest.strip_prefix('(') {
        let inner = inner.strip_suffix(')')?;
        return quoted(inner.trim());
    }

    if rest.starts_with(char::is_whitespace) {
        return quoted(rest.trim_start());
    }

    None
}

/// Returns true if the line looks like it is meant to be a shell statement
#[must_use]
pub fn looks_like_shell_statement(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("sh(") || line.starts_with("sh '") || line.starts_with("sh \"")
}

/// Unwraps a string wrapped in one matching pair of quotes
fn quoted(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.contains(quote) {
        return None;
    }
    Some(inner)
}
