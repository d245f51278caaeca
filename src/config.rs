//! Configuration for document reconstruction.

use crate::error::{Error, Result};
use crate::geometry::PageSize;
use serde::{Deserialize, Serialize};

/// Default exclusive confidence threshold for recognized words.
pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 60;

/// Default floor for rendered font sizes, in output units.
pub const DEFAULT_MIN_FONT_SIZE: f32 = 6.0;

/// Default title for content that precedes the first heading.
pub const DEFAULT_CHAPTER_TITLE: &str = "Introduction";

/// Which line shapes count as chapter headings.
///
/// All variants match whole lines, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeadingPattern {
    /// `Chapter XIV`, `Chapter 14`, or a numbered section such as `3. The Storm`
    #[default]
    Standard,
    /// `Chapter 14` only
    ChapterNumber,
    /// Caller-supplied regular expression
    Custom(String),
}

/// Reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Words must score strictly above this to be kept (0-100)
    pub confidence_threshold: u8,

    /// Smallest font size emitted for a positioned run
    pub min_font_size: f32,

    /// Output page dimensions
    pub page_size: PageSize,

    /// Heading pattern used for chapter detection
    pub heading_pattern: HeadingPattern,

    /// In per-page detection, only the first N non-blank lines may hold a heading.
    /// `None` searches the whole page.
    pub page_heading_lines: Option<usize>,

    /// Title given to content before the first heading
    pub default_title: String,

    /// Size of the page worker pool; `None` uses one thread per core
    pub workers: Option<usize>,

    /// Fail with `NoChaptersFound` instead of warning
    pub require_chapters: bool,

    /// Base-14 font used when writing text
    pub font_name: String,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconstructionConfig {
    /// Create configuration with defaults.
    pub fn new() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            page_size: PageSize::Letter,
            heading_pattern: HeadingPattern::Standard,
            page_heading_lines: Some(1),
            default_title: DEFAULT_CHAPTER_TITLE.to_string(),
            workers: None,
            require_chapters: false,
            font_name: "Helvetica".to_string(),
        }
    }

    /// Set the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the minimum font size.
    pub fn with_min_font_size(mut self, size: f32) -> Self {
        self.min_font_size = size;
        self
    }

    /// Set the output page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the heading pattern.
    pub fn with_heading_pattern(mut self, pattern: HeadingPattern) -> Self {
        self.heading_pattern = pattern;
        self
    }

    /// Limit per-page heading search to the first `lines` non-blank lines.
    pub fn with_page_heading_lines(mut self, lines: Option<usize>) -> Self {
        self.page_heading_lines = lines;
        self
    }

    /// Set the title of the implicit leading chapter.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Set the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Treat a document without headings as an error.
    pub fn with_require_chapters(mut self, require: bool) -> Self {
        self.require_chapters = require;
        self
    }

    /// Set the output font.
    pub fn with_font_name(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Check the configuration before a run starts.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.page_size.dimensions();
        if !(width > 0.0 && height > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "page size must be positive, got {}x{}",
                width, height
            )));
        }
        if !(self.min_font_size > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "minimum font size must be positive, got {}",
                self.min_font_size
            )));
        }
        if self.confidence_threshold > 100 {
            log::warn!(
                "Confidence threshold {} is above 100; every word will be filtered out",
                self.confidence_threshold
            );
        }
        if self.page_heading_lines == Some(0) {
            return Err(Error::InvalidConfig(
                "page_heading_lines must be at least 1 (use None to search the whole page)".to_string(),
            ));
        }
        if let HeadingPattern::Custom(pattern) = &self.heading_pattern {
            regex::Regex::new(pattern)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconstructionConfig::default();
        assert_eq!(config.confidence_threshold, 60);
        assert_eq!(config.min_font_size, 6.0);
        assert_eq!(config.page_size.dimensions(), (612.0, 792.0));
        assert_eq!(config.heading_pattern, HeadingPattern::Standard);
        assert_eq!(config.default_title, "Introduction");
        assert!(!config.require_chapters);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ReconstructionConfig::new()
            .with_confidence_threshold(80)
            .with_min_font_size(4.0)
            .with_page_size(PageSize::A4)
            .with_default_title("Front Matter")
            .with_workers(2);
        assert_eq!(config.confidence_threshold, 80);
        assert_eq!(config.min_font_size, 4.0);
        assert_eq!(config.page_size, PageSize::A4);
        assert_eq!(config.default_title, "Front Matter");
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn test_validate_rejects_zero_page() {
        let config = ReconstructionConfig::new().with_page_size(PageSize::Custom {
            width: 0.0,
            height: 792.0,
        });
        assert!(matches!(config.validate(), Err(Error::InvalidGeometry(_))));
    }

    #[test]
    fn test_validate_rejects_empty_heading_window() {
        let config = ReconstructionConfig::new().with_page_heading_lines(Some(0));
        match config.validate() {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("page_heading_lines")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(ReconstructionConfig::new()
            .with_page_heading_lines(None)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let config = ReconstructionConfig::new()
            .with_heading_pattern(HeadingPattern::Custom("^(Part".to_string()));
        assert!(matches!(config.validate(), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ReconstructionConfig::new().with_heading_pattern(HeadingPattern::ChapterNumber);
        let json = serde_json::to_string(&config).unwrap();
        let back: ReconstructionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
