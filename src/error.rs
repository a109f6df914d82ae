use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("structural mismatch: {what}")]
    StructuralMismatch { what: String },

    #[error("{tool} unavailable: {reason}")]
    ExternalToolUnavailable { tool: String, reason: String },

    #[error("document structure error: {message}")]
    Structural { message: String },

    #[error("i/o failure on {}", path.display())]
    FatalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid docx archive {}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn mismatch(what: impl Into<String>) -> Self {
        Self::StructuralMismatch { what: what.into() }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FatalIo {
            path: path.into(),
            source,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::ExternalToolUnavailable { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
