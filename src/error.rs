//! Error types for the analyzer.
//!
//! Only I/O and setup failures are errors; a name or node that cannot be
//! found is an ordinary `None`.

use std::path::PathBuf;

use derive_more::{Display, Error};
use elm_syntax::FileId;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Display, Error)]
pub enum AnalysisError {
    #[display("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("Not a file URI: {file}")]
    NotAFile { file: FileId },

    #[display("Failed to parse {file}")]
    Parse { file: FileId },

    #[display("Invalid edit range in {file}")]
    InvalidRange { file: FileId },

    #[display("Failed to load the Elm grammar: {source}")]
    Language { source: tree_sitter::LanguageError },

    #[display("Failed to serialize output: {source}")]
    Serialize { source: serde_json::Error },
}

impl AnalysisError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Read {
            path: path.into(),
            source,
        }
    }
}

impl From<tree_sitter::LanguageError> for AnalysisError {
    fn from(source: tree_sitter::LanguageError) -> Self {
        AnalysisError::Language { source }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(source: serde_json::Error) -> Self {
        AnalysisError::Serialize { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_failure_is_an_error() {
        // JSON object keys must be strings
        let bad: std::collections::HashMap<(i32, i32), i32> = [((1, 2), 3)].into_iter().collect();
        let error = AnalysisError::from(serde_json::to_string(&bad).unwrap_err());
        assert!(matches!(error, AnalysisError::Serialize { .. }));
        assert!(error.to_string().starts_with("Failed to serialize output"));
    }
}
