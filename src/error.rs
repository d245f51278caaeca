//! Error types for the reconstruction pipeline.
//!
//! Every fatal condition carries the page index or path it concerns so the
//! caller can report it without re-deriving context.

use std::path::PathBuf;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconstructing a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source document could not be opened or paginated
    #[error("Cannot read source '{}': {reason}", path.display())]
    SourceUnreadable {
        /// Path of the source document
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// The recognition engine could not be invoked for a page
    #[error("Recognition engine unavailable on page {page}: {reason}")]
    RecognitionUnavailable {
        /// Zero-based page index
        page: usize,
        /// Underlying cause
        reason: String,
    },

    /// Non-positive page or image dimensions
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// No heading matched anywhere in the document.
    ///
    /// Only returned when `require_chapters` is set; otherwise this is a warning.
    #[error("No chapter headings found in '{source_name}'")]
    NoChaptersFound {
        /// Name of the document that was scanned for headings
        source_name: String,
    },

    /// Persisting the output document failed
    #[error("Failed to write '{}': {source}", path.display())]
    WriteFailed {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A configuration value that would silently disable a feature
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The page worker pool could not be started
    #[error("Cannot start page worker pool: {0}")]
    WorkerPool(String),

    /// A custom heading pattern failed to compile
    #[error("Invalid heading pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `SourceUnreadable` error for `path`.
    pub fn source_unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SourceUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error aborts the whole run.
    ///
    /// `NoChaptersFound` is the only condition a caller may downgrade.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NoChaptersFound { .. })
    }
}
