//! Step extraction from Jenkins-style pipeline files
//!
//! This is a line-oriented scan, not a grammar. It recognises a fixed set of
//! markers and ignores everything else:
//!
//! | Marker | Effect |
//! |--------|--------|
//! | `stage('<name>')` | sets the current stage, leaves any script block |
//! | `script {` | enters a script block |
//! | `post {` | ends extraction |
//! | `docker` + `.inside(` | opens a container block (script blocks only) |
//! | `sh('...')` | host step (script blocks only) |
//!
//! Inside a container block every non-blank line up to the closing brace is a
//! shell statement, recorded as `<stage>:<ordinal>`.

use super::comments::strip_comments;
use super::errors::{ExtractError, PipelineError};
use super::statement::{looks_like_shell_statement, parse_shell_statement};
use super::steps::Step;
use std::fs;
use std::path::Path;

/// Scanner state carried from line to line
#[derive(Debug, Default)]
struct ScanState {
    stage: String,
    inside_script: bool,
}

/// Extracts an ordered step list from pipeline text
///
/// # Example
///
/// ```rust
/// use autobuild::pipeline::PipelineExtractor;
///
/// let text = "
/// stage('build') {
///     steps {
///         script {
///             dockerImage.inside() {
///                 sh('make')
///             }
///         }
///     }
/// }";
///
/// let steps = PipelineExtractor::new().extract(text).unwrap();
/// assert_eq!(steps[0].name, "build:0");
/// assert_eq!(steps[0].command, "make");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineExtractor;

impl PipelineExtractor {
    /// Creates a new extractor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Reads and extracts a pipeline file
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if the file cannot be read and
    /// `PipelineError::Extract` if its content is malformed.
    pub fn extract_file(&self, path: &Path) -> Result<Vec<Step>, PipelineError> {
        let text = fs::read_to_string(path)
            .map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))?;
        let steps = self.extract(&text)?;
        tracing::debug!(
            file = %path.display(),
            steps = steps.len(),
            "Extracted pipeline steps"
        );
        Ok(steps)
    }

    /// Extracts steps from pipeline text
    ///
    /// # Errors
    ///
    /// Returns an `ExtractError` for stage declarations without a name,
    /// container block lines that are not shell statements, and container
    /// blocks that are never closed.
    pub fn extract(&self, text: &str) -> Result<Vec<Step>, ExtractError> {
        let stripped = strip_comments(text);
        let lines: Vec<&str> = stripped.lines().collect();

        let mut steps = Vec::new();
        let mut state = ScanState::default();
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index].trim();
            let line_no = index + 1;
            index += 1;

            if line.starts_with("stage(") {
                let name = stage_name(line).ok_or_else(|| ExtractError::MalformedStage {
                    line: line_no,
                    text: line.to_string(),
                })?;
                tracing::trace!(stage = %name, line = line_no, "Stage");
                state.stage = name.to_string();
                state.inside_script = false;
                continue;
            }

            if opens_block(line, "script") {
                state.inside_script = true;
                continue;
            }

            if opens_block(line, "post") {
                tracing::trace!(line = line_no, "Post section reached, stopping");
                break;
            }

            if !state.inside_script {
                continue;
            }

            if line.contains("docker") && line.contains(".inside(") {
                index = scan_container_block(&lines, index, line_no, &state.stage, &mut steps)?;
                continue;
            }

            if looks_like_shell_statement(line) {
                let command =
                    parse_shell_statement(line).ok_or_else(|| ExtractError::MalformedStatement {
                        line: line_no,
                        text: line.to_string(),
                    })?;
                steps.push(Step::host(&state.stage, command));
            }
        }

        Ok(steps)
    }
}

/// Reads container block statements starting at `start`
///
/// Returns the index of the first line after the block.
fn scan_container_block(
    lines: &[&str],
    start: usize,
    opener_line: usize,
    stage: &str,
    steps: &mut Vec<Step>,
) -> Result<usize, ExtractError> {
    let mut ordinal = 0;

    for (index, raw) in lines.iter().enumerate().skip(start) {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // A statement may itself contain braces, e.g. sh('echo ${HOME}')
        if let Some(command) = parse_shell_statement(line) {
            steps.push(Step::container(stage, ordinal, command));
            ordinal += 1;
            continue;
        }

        if line.contains('}') {
            return Ok(index + 1);
        }

        return Err(ExtractError::MalformedStatement {
            line: index + 1,
            text: line.to_string(),
        });
    }

    Err(ExtractError::UnterminatedContainerBlock {
        stage: stage.to_string(),
        line: opener_line,
    })
}

/// Returns the quoted name of a `stage('<name>')` line
fn stage_name(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("stage(")?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &rest[quote.len_utf8()..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

fn opens_block(line: &str, keyword: &str) -> bool {
    line.contains(&format!("{keyword} {{")) || line.contains(&format!("{keyword}{{"))
}
