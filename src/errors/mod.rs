//! Error types for the layer configuration compiler
//!
//! Every failure is fatal to the operation that raised it; callers correct their input and
//! re-run. The transaction wrapping the operation is rolled back before the error surfaces.
//!
//! # Error Categories
//!
//! - **Configuration**: portal or required per-type defaults missing, invalid settings
//! - **Parse**: malformed JSON input or document structure, reported with its source path
//! - **Integrity**: duplicate layer keys, bad switchlayer children, unresolved tree references
//! - **Io**: filesystem and database failures
//!
//! # Examples
//!
//! ```rust
//! use layerconfig::errors::{CompilerError, ErrorCategory};
//!
//! let err = CompilerError::parse("default.json", "'layers' is not an array");
//! assert_eq!(err.category(), ErrorCategory::Parse);
//! assert_eq!(err.error_code(), "PARSE_ERROR");
//! ```

pub mod configuration;
pub mod integrity;

use std::path::PathBuf;

use thiserror::Error;

pub use configuration::ConfigurationError;
pub use integrity::{IntegrityError, UnresolvedReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Parse,
    Integrity,
    Io,
}

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Malformed JSON or document structure, naming the source
    #[error("Failed to parse {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    /// Filesystem failure
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Database open or statement failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl CompilerError {
    pub fn parse(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CompilerError::Parse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompilerError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CompilerError::Configuration(_) => ErrorCategory::Configuration,
            CompilerError::Parse { .. } => ErrorCategory::Parse,
            CompilerError::Integrity(_) => ErrorCategory::Integrity,
            CompilerError::Io { .. } | CompilerError::Database(_) => ErrorCategory::Io,
        }
    }

    /// Get error code for CLI reports
    pub fn error_code(&self) -> &'static str {
        match self {
            CompilerError::Configuration(err) => err.error_code(),
            CompilerError::Parse { .. } => "PARSE_ERROR",
            CompilerError::Integrity(err) => err.error_code(),
            CompilerError::Io { .. } => "IO_ERROR",
            CompilerError::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Result type alias for compiler operations
pub type CompilerResult<T> = Result<T, CompilerError>;
