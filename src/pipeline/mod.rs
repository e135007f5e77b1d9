//! Pipeline step extraction
//!
//! Reads a Jenkins-style pipeline file and produces the ordered list of
//! steps to run.

mod comments;
pub mod errors;
mod extractor;
mod statement;
pub mod steps;

pub use comments::strip_comments;
pub use errors::{ExtractError, PipelineError};
pub use extractor::PipelineExtractor;
pub use statement::{looks_like_shell_statement, parse_shell_statement};
pub use steps::{Step, StepKind};
