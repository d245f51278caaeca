//! Error type for recognition engines.

/// Errors an engine can report while recognizing a page.
///
/// "No text on this page" is not an error: engines return empty results for it.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// The engine binary or library could not be invoked
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The engine ran but exited unsuccessfully
    #[error("OCR engine failed with status {status}: {stderr}")]
    Failed {
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The engine produced output that could not be parsed
    #[error("Unparseable OCR output: {0}")]
    InvalidOutput(String),

    /// The page image could not be handed to the engine
    #[error("Cannot encode page image: {0}")]
    Image(String),
}
