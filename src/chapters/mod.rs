//! Chapter boundary detection.
//!
//! Splits a noisy text stream into ordered `(title, content)` chapters by
//! matching heading lines. Segmentation is a pure partition: the chapter
//! spans tile the input with no gaps or overlaps, so concatenating them
//! reproduces the stream exactly.

mod detector;

pub use detector::ChapterDetector;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

lazy_static! {
    /// A blank line: two line breaks with only horizontal whitespace between
    static ref RE_PARAGRAPH_BREAK: Regex = Regex::new(r"\r?\n[ \t]*\r?\n").unwrap();
}

/// Start of a chapter within a text stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBoundary {
    /// Heading text, or the default title for the implicit leading chapter
    pub title: String,
    /// Byte offset where the chapter begins in the stream; always 0 for the
    /// first chapter, the heading offset for the others
    pub start_offset: usize,
}

/// One heading line found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Trimmed heading text
    pub title: String,
    /// Byte offset where the match starts
    pub start: usize,
    /// Byte offset just past the match
    pub end: usize,
}

/// A chapter as located in the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSpan {
    /// Chapter title
    pub title: String,
    /// Byte range of the heading line; `None` for the implicit leading chapter
    pub heading: Option<Range<usize>>,
    /// Byte range of the whole chapter, heading included
    pub span: Range<usize>,
    /// Text after the heading, trimmed
    pub content: String,
}

impl ChapterSpan {
    /// Boundary record for this chapter.
    pub fn boundary(&self) -> ChapterBoundary {
        ChapterBoundary {
            title: self.title.clone(),
            start_offset: self.span.start,
        }
    }

    /// Whether a heading line opened this chapter.
    pub fn is_explicit(&self) -> bool {
        self.heading.is_some()
    }

    /// Non-empty paragraphs of the content.
    pub fn paragraphs(&self) -> Vec<String> {
        split_paragraphs(&self.content)
    }
}

/// Ordered chapters covering a whole text stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// Chapters in stream order
    pub chapters: Vec<ChapterSpan>,
}

impl Segmentation {
    /// Boundaries in stream order; offsets are strictly increasing.
    pub fn boundaries(&self) -> Vec<ChapterBoundary> {
        self.chapters.iter().map(ChapterSpan::boundary).collect()
    }

    /// True when no heading matched and everything sits in the implicit chapter.
    ///
    /// Usually a sign that the heading pattern does not fit the document.
    pub fn is_implicit_only(&self) -> bool {
        self.chapters.iter().all(|c| !c.is_explicit())
    }

    /// Concatenate every chapter span of `source` back together.
    pub fn reconstruct(&self, source: &str) -> String {
        self.chapters
            .iter()
            .map(|c| &source[c.span.clone()])
            .collect()
    }
}

/// Split text into paragraphs on blank lines, dropping empty ones.
///
/// Lines inside a paragraph are kept as they are.
///
/// # Examples
///
/// ```
/// use folio_oxide::chapters::split_paragraphs;
///
/// let paragraphs = split_paragraphs("First line\nsame paragraph.\n\n\n  \nSecond.");
/// assert_eq!(paragraphs, vec!["First line\nsame paragraph.", "Second."]);
/// ```
pub fn split_paragraphs(text: &str) -> Vec<String> {
    RE_PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
