//! Error types for pwpatch-edit.
//!
//! Every variant is detected before anything is written back to disk, so a failed patch never
//! leaves a partially modified file behind.

use pwpatch_types::path::DocPath;
use thiserror::Error;

/// The top-level error type for pwpatch-edit operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// The input is not valid YAML.
    #[error("invalid YAML: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// An expected container or field is missing, or has the wrong shape.
    #[error("{message}")]
    Structure {
        /// The path that was being resolved when the problem was found.
        path: DocPath,
        /// A descriptive message about what was expected.
        message: String,
    },

    /// The document could not be emitted as YAML.
    #[error("serialize YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// Reading or writing the target file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EditError {
    pub fn structure(path: &DocPath, message: impl Into<String>) -> Self {
        EditError::Structure {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Returns true if the document parsed but lacked the expected shape.
    pub fn is_structure(&self) -> bool {
        matches!(self, EditError::Structure { .. })
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
