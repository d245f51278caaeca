//! Optical character recognition interface.
//!
//! The crate does not recognize text itself. It talks to an engine through
//! [`RecognitionEngine`], which answers two independent questions about a page
//! image: the page's full text, and the list of words with their pixel boxes
//! and confidence scores. The two answers may disagree slightly; nothing
//! downstream assumes they tokenize identically.
//!
//! # Architecture
//!
//! ```text
//! PageImage
//!     ├── recognize_text()  → String             (chapter detection)
//!     └── recognize_words() → RecognizedWord[]   (layout)
//!                                 ↓
//!                          [filter_words] (confidence > threshold)
//! ```

mod error;
pub mod filter;
pub mod tesseract;

pub use error::OcrError;
pub use filter::filter_words;
pub use tesseract::TesseractEngine;

use crate::raster::PageImage;
use serde::{Deserialize, Serialize};

/// Result type for engine calls.
pub type OcrResult<T> = std::result::Result<T, OcrError>;

/// One word reported by the recognition engine, in image pixel space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedWord {
    /// Recognized text
    pub text: String,
    /// Left edge in pixels
    pub left: u32,
    /// Top edge in pixels (y grows downward)
    pub top: u32,
    /// Box width in pixels
    pub width: u32,
    /// Box height in pixels
    pub height: u32,
    /// Confidence score, 0-100
    pub confidence: u8,
}

impl RecognizedWord {
    /// Create a word.
    pub fn new(
        text: impl Into<String>,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        confidence: u8,
    ) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
            confidence,
        }
    }
}

/// A recognition engine.
///
/// Implementations must be shareable across the page worker pool.
pub trait RecognitionEngine: Send + Sync {
    /// Full recognized text of the page. Empty when the page has no text.
    fn recognize_text(&self, image: &PageImage) -> OcrResult<String>;

    /// Recognized words with their boxes. Empty when the page has no text.
    fn recognize_words(&self, image: &PageImage) -> OcrResult<Vec<RecognizedWord>>;

    /// Short name used in log messages.
    fn name(&self) -> &str {
        "ocr"
    }
}

impl<E: RecognitionEngine + ?Sized> RecognitionEngine for &E {
    fn recognize_text(&self, image: &PageImage) -> OcrResult<String> {
        (**self).recognize_text(image)
    }

    fn recognize_words(&self, image: &PageImage) -> OcrResult<Vec<RecognizedWord>> {
        (**self).recognize_words(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
