//! Per-page transcription: word boxes in, positioned runs out.
//!
//! Runs keep the order the recognition engine reported them in. For
//! single-column pages that is reading order; for multi-column pages it is
//! row-major, which is a known approximation and left as is.

use crate::config::ReconstructionConfig;
use crate::error::{Error, Result};
use crate::geometry::{CoordinateTransform, PageSize};
use crate::ocr::{filter_words, OcrError, RecognitionEngine, RecognizedWord};
use crate::raster::PageImage;
use serde::{Deserialize, Serialize};

/// A unit of text with an explicit placement on the output page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedRun {
    /// Text to draw
    pub text: String,
    /// Baseline x in page space
    pub x: f32,
    /// Baseline y in page space (origin bottom-left)
    pub y: f32,
    /// Font size in points
    pub font_size: f32,
}

/// Everything one page contributes to the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTranscription {
    /// Zero-based source page index
    pub index: usize,
    /// Full recognized text, used for chapter detection
    pub plain_text: String,
    /// Positioned runs, used for layout
    pub runs: Vec<PositionedRun>,
}

/// Turns one page image into a [`PageTranscription`].
///
/// Holds only configuration, so one transcriber can serve every worker.
#[derive(Debug, Clone)]
pub struct PageTranscriber {
    page_size: PageSize,
    confidence_threshold: u8,
    min_font_size: f32,
}

impl Default for PageTranscriber {
    fn default() -> Self {
        Self::new(&ReconstructionConfig::default())
    }
}

impl PageTranscriber {
    /// Create a transcriber from the reconstruction configuration.
    pub fn new(config: &ReconstructionConfig) -> Self {
        Self {
            page_size: config.page_size,
            confidence_threshold: config.confidence_threshold,
            min_font_size: config.min_font_size,
        }
    }

    /// Recognize and lay out one page.
    ///
    /// Asks the engine for the page text and the word boxes in two separate
    /// calls. An engine failure becomes `RecognitionUnavailable` for this
    /// page. A page without words yields no runs, which is not an error.
    pub fn transcribe<E: RecognitionEngine + ?Sized>(
        &self,
        page: &PageImage,
        engine: &E,
    ) -> Result<PageTranscription> {
        let index = page.index();
        let unavailable = |e: OcrError| Error::RecognitionUnavailable {
            page: index,
            reason: e.to_string(),
        };

        let plain_text = engine.recognize_text(page).map_err(unavailable)?;
        let words = engine.recognize_words(page).map_err(unavailable)?;
        let runs = self.layout_words(page.pixel_width(), page.pixel_height(), words)?;

        log::info!(
            "Page {}: {} runs, {} chars of text ({})",
            index,
            runs.len(),
            plain_text.len(),
            engine.name()
        );

        Ok(PageTranscription {
            index,
            plain_text,
            runs,
        })
    }

    /// Filter words by confidence and place the survivors on the output page.
    pub fn layout_words(
        &self,
        image_width: u32,
        image_height: u32,
        words: Vec<RecognizedWord>,
    ) -> Result<Vec<PositionedRun>> {
        let transform = CoordinateTransform::for_page(self.page_size, image_width, image_height)?
            .with_min_font_size(self.min_font_size);

        Ok(filter_words(words, self.confidence_threshold)
            .into_iter()
            .map(|word| {
                let placement =
                    transform.apply(word.left as f32, word.top as f32, word.height as f32);
                PositionedRun {
                    text: word.text,
                    x: placement.x,
                    y: placement.y,
                    font_size: placement.font_size,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrResult;

    struct FixedEngine {
        text: String,
        words: Vec<RecognizedWord>,
    }

    impl RecognitionEngine for FixedEngine {
        fn recognize_text(&self, _image: &PageImage) -> OcrResult<String> {
            Ok(self.text.clone())
        }

        fn recognize_words(&self, _image: &PageImage) -> OcrResult<Vec<RecognizedWord>> {
            Ok(self.words.clone())
        }
    }

    struct BrokenEngine;

    impl RecognitionEngine for BrokenEngine {
        fn recognize_text(&self, _image: &PageImage) -> OcrResult<String> {
            Err(OcrError::Unavailable("no engine installed".to_string()))
        }

        fn recognize_words(&self, _image: &PageImage) -> OcrResult<Vec<RecognizedWord>> {
            Err(OcrError::Unavailable("no engine installed".to_string()))
        }
    }

    fn letter_transcriber() -> PageTranscriber {
        PageTranscriber::new(&ReconstructionConfig::default())
    }

    #[test]
    fn test_transcribe_places_confident_words() {
        // 1224x1584 is exactly twice Letter, so every coordinate halves
        let page = PageImage::blank(2, 1224, 1584);
        let engine = FixedEngine {
            text: "Chapter 1\n".to_string(),
            words: vec![
                RecognizedWord::new("Chapter", 200, 100, 300, 40, 95),
                RecognizedWord::new("smudge", 10, 10, 20, 20, 60),
                RecognizedWord::new("1", 520, 100, 20, 40, 88),
            ],
        };

        let result = letter_transcriber().transcribe(&page, &engine).unwrap();
        assert_eq!(result.index, 2);
        assert_eq!(result.plain_text, "Chapter 1\n");
        assert_eq!(result.runs.len(), 2);

        let first = &result.runs[0];
        assert_eq!(first.text, "Chapter");
        assert_eq!(first.x, 100.0);
        assert_eq!(first.y, 792.0 - 50.0 - 20.0);
        assert_eq!(first.font_size, 20.0);
        assert_eq!(result.runs[1].text, "1");
    }

    #[test]
    fn test_blank_page_yields_no_runs() {
        let page = PageImage::blank(0, 100, 100);
        let engine = FixedEngine {
            text: String::new(),
            words: Vec::new(),
        };
        let result = letter_transcriber().transcribe(&page, &engine).unwrap();
        assert!(result.runs.is_empty());
        assert!(result.plain_text.is_empty());
    }

    #[test]
    fn test_engine_failure_names_page() {
        let page = PageImage::blank(3, 100, 100);
        let err = letter_transcriber().transcribe(&page, &BrokenEngine).unwrap_err();
        match err {
            Error::RecognitionUnavailable { page, reason } => {
                assert_eq!(page, 3);
                assert!(reason.contains("no engine installed"));
            },
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_zero_sized_image_is_invalid_geometry() {
        let err = letter_transcriber()
            .layout_words(0, 100, vec![RecognizedWord::new("x", 0, 0, 1, 1, 99)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
    }

    #[test]
    fn test_tiny_words_get_font_floor() {
        let config = ReconstructionConfig::default().with_min_font_size(8.0);
        let runs = PageTranscriber::new(&config)
            .layout_words(2550, 3300, vec![RecognizedWord::new("fine", 0, 0, 10, 12, 90)])
            .unwrap();
        assert_eq!(runs[0].font_size, 8.0);
    }
}
