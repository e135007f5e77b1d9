//! Error types for extraction and execution

use thiserror::Error;

/// Errors that can occur while running extracted steps
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Extraction of the pipeline file failed
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// Command execution failed
    #[error("Command failed with exit code {code}: {command}")]
    CommandFailed {
        /// Exit code returned by the command.
        code: i32,
        /// The command that failed.
        command: String,
        /// Optional human readable context, e.g. `step: build:0 failed`.
        message: Option<String>,
    },

    /// A host value needed to build the container invocation is missing
    #[error("Required environment value '{0}' is not set")]
    MissingEnvironment(String),

    /// Assembling a container invocation failed
    #[error("Failed to assemble container invocation: {0}")]
    Assembly(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl PipelineError {
    /// Process exit code this error maps to.
    ///
    /// Failed commands propagate their own code; everything else exits with 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CommandFailed { code, .. } => u8::try_from(*code)
                .ok()
                .filter(|c| *c != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors raised while scanning a pipeline file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// A stage declaration without a quoted name
    #[error("line {line}: stage declaration has no quoted name: {text}")]
    MalformedStage {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// A line that should be a shell statement but is not `sh('...')`
    #[error("line {line}: expected a shell statement like sh('...'), got: {text}")]
    MalformedStatement {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// A container block that is never closed
    #[error("line {line}: container block in stage '{stage}' is never closed")]
    UnterminatedContainerBlock {
        /// Stage the block belongs to.
        stage: String,
        /// 1-based line number of the block opener.
        line: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_propagates_command_code() {
        let err = PipelineError::CommandFailed {
            code: 2,
            command: "make".to_string(),
            message: None,
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_falls_back_to_one() {
        let zero = PipelineError::CommandFailed {
            code: 0,
            command: "true".to_string(),
            message: None,
        };
        let negative = PipelineError::CommandFailed {
            code: -1,
            command: "killed".to_string(),
            message: None,
        };
        assert_eq!(zero.exit_code(), 1);
        assert_eq!(negative.exit_code(), 1);
        assert_eq!(PipelineError::Io("boom".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_extract_error_display() {
        let err = ExtractError::MalformedStatement {
            line: 7,
            text: "make".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "line 7: expected a shell statement like sh('...'), got: make"
        );
    }
}
