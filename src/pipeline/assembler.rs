//! Document assembly: per-page transcriptions plus chapter boundaries in,
//! one ordered output document out.
//!
//! Chapter starts are decided page by page. Each page's own text is run
//! through the detector, so a boundary is tied to a page without any offset
//! arithmetic across page breaks. The offsets reported in
//! [`ChapterBoundary`] still refer to the concatenated stream of page texts.

use crate::chapters::{ChapterBoundary, ChapterDetector};
use crate::config::ReconstructionConfig;
use crate::error::{Error, Result};
use crate::geometry::PageSize;
use crate::layout::{PageTranscription, PositionedRun};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A chapter of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Heading text, or the default title for the leading implicit chapter
    pub title: String,
    /// Output page indices belonging to this chapter, in order
    pub pages: Vec<usize>,
    /// Chapter text without its heading
    pub content: String,
    /// Where the chapter starts in the concatenated text stream
    pub boundary: ChapterBoundary,
    /// A heading opened this chapter
    pub explicit: bool,
}

/// What one output page carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageContent {
    /// Text runs with explicit placement, reconstructed from a scan
    Positioned {
        /// Runs in recognition order
        runs: Vec<PositionedRun>,
    },
    /// Paragraphs laid out by the writer, from plain-text input
    Flowed {
        /// Chapter heading drawn above the paragraphs
        title: Option<String>,
        /// Paragraph texts
        paragraphs: Vec<String>,
    },
}

/// One page of the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPage {
    /// Zero-based page index
    pub index: usize,
    /// Index into [`OutputDocument::chapters`]
    pub chapter: usize,
    /// Page content
    pub content: PageContent,
}

/// One step of the drawing sequence handed to a writer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawInstruction<'a> {
    /// Start a new output page
    BeginPage {
        /// Page index
        index: usize,
        /// The page opens a chapter
        chapter_start: bool,
        /// Title of the chapter the page belongs to
        chapter_title: &'a str,
    },
    /// Place a run at its position
    Text(&'a PositionedRun),
    /// Flowed chapter heading
    Heading(&'a str),
    /// Flowed paragraph
    Paragraph(&'a str),
}

/// The reconstructed document, ready for a writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDocument {
    /// Output page dimensions
    pub page_size: PageSize,
    /// Pages in source order
    pub pages: Vec<OutputPage>,
    /// Page indices at which a chapter begins
    pub chapter_starts: BTreeSet<usize>,
    /// Chapters in order; together they cover every page exactly once
    pub chapters: Vec<Chapter>,
}

impl OutputDocument {
    /// Number of output pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether page `index` opens a chapter.
    pub fn is_chapter_start(&self, index: usize) -> bool {
        self.chapter_starts.contains(&index)
    }

    /// The chapter page `index` belongs to.
    pub fn chapter_of(&self, index: usize) -> Option<&Chapter> {
        self.pages
            .get(index)
            .and_then(|page| self.chapters.get(page.chapter))
    }

    /// Whether any heading matched at all.
    pub fn has_explicit_chapters(&self) -> bool {
        self.chapters.iter().any(|c| c.explicit)
    }

    /// The ordered drawing sequence for this document.
    pub fn instructions(&self) -> Vec<DrawInstruction<'_>> {
        let mut instructions = Vec::new();
        for page in &self.pages {
            let chapter_title = self
                .chapters
                .get(page.chapter)
                .map(|c| c.title.as_str())
                .unwrap_or_default();
            instructions.push(DrawInstruction::BeginPage {
                index: page.index,
                chapter_start: self.is_chapter_start(page.index),
                chapter_title,
            });

            match &page.content {
                PageContent::Positioned { runs } => {
                    instructions.extend(runs.iter().map(DrawInstruction::Text));
                },
                PageContent::Flowed { title, paragraphs } => {
                    if let Some(title) = title {
                        instructions.push(DrawInstruction::Heading(title));
                    }
                    instructions.extend(paragraphs.iter().map(|p| DrawInstruction::Paragraph(p)));
                },
            }
        }
        instructions
    }
}

/// Chapter under construction while walking pages.
struct OpenChapter {
    title: String,
    explicit: bool,
    start_offset: usize,
    pages: Vec<usize>,
    parts: Vec<String>,
}

impl OpenChapter {
    fn close(self) -> Chapter {
        let content = self
            .parts
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Chapter {
            boundary: ChapterBoundary {
                title: self.title.clone(),
                start_offset: self.start_offset,
            },
            title: self.title,
            pages: self.pages,
            content,
            explicit: self.explicit,
        }
    }
}

/// Merges per-page transcriptions and chapter boundaries into an
/// [`OutputDocument`].
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    detector: ChapterDetector,
    page_size: PageSize,
    require_chapters: bool,
    source_name: String,
}

impl DocumentAssembler {
    /// Create an assembler from the reconstruction configuration.
    pub fn new(config: &ReconstructionConfig) -> Result<Self> {
        Ok(Self {
            detector: ChapterDetector::from_config(config)?,
            page_size: config.page_size,
            require_chapters: config.require_chapters,
            source_name: "document".to_string(),
        })
    }

    /// Name used when reporting a document without headings.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Assemble scanned pages.
    ///
    /// Pages are ordered by index first, so completion order of upstream
    /// work does not matter. A page opens a chapter when the detector finds
    /// a heading in that page's own text. Blank pages before the first
    /// chapter are folded into it, the same way [`ChapterDetector::segment`]
    /// folds a blank preamble; the first chapter is titled with the default
    /// title when it has no heading, and always starts at page 0 and offset 0.
    /// Every later page joins the current chapter with its runs untouched.
    pub fn assemble(&self, mut pages: Vec<PageTranscription>) -> Result<OutputDocument> {
        pages.sort_by_key(|page| page.index);

        let mut chapters: Vec<Chapter> = Vec::new();
        let mut chapter_starts = BTreeSet::new();
        let mut open: Option<OpenChapter> = None;
        let mut leading_blank: Vec<usize> = Vec::new();
        let mut output_pages = Vec::with_capacity(pages.len());
        let mut stream_offset = 0;

        for (position, page) in pages.into_iter().enumerate() {
            let heading = self.detector.find_page_heading(&page.plain_text);
            let blank = page.plain_text.trim().is_empty();

            if heading.is_none() && open.is_none() && blank {
                leading_blank.push(position);
            } else if heading.is_some() || open.is_none() {
                let first = open.is_none() && chapters.is_empty();
                if let Some(previous) = open.take() {
                    chapters.push(previous.close());
                }

                let (title, offset, body) = match &heading {
                    Some(h) => (
                        h.title.clone(),
                        stream_offset + h.start,
                        page.plain_text[h.end..].to_string(),
                    ),
                    None => (self.detector.default_title().to_string(), 0, page.plain_text.clone()),
                };
                log::debug!("Page {} opens chapter '{}'", page.index, title);

                let mut chapter_pages = std::mem::take(&mut leading_blank);
                chapter_pages.push(position);
                chapter_starts.insert(chapter_pages[0]);

                open = Some(OpenChapter {
                    title,
                    explicit: heading.is_some(),
                    start_offset: if first { 0 } else { offset },
                    pages: chapter_pages,
                    parts: vec![body],
                });
            } else if let Some(current) = open.as_mut() {
                current.pages.push(position);
                current.parts.push(page.plain_text.clone());
            }

            stream_offset += page.plain_text.len();
            output_pages.push(OutputPage {
                index: position,
                chapter: chapters.len(),
                content: PageContent::Positioned { runs: page.runs },
            });
        }

        if open.is_none() && !leading_blank.is_empty() {
            log::debug!("Every page is blank; one implicit chapter");
            chapter_starts.insert(0);
            open = Some(OpenChapter {
                title: self.detector.default_title().to_string(),
                explicit: false,
                start_offset: 0,
                pages: leading_blank,
                parts: Vec::new(),
            });
        }
        if let Some(last) = open {
            chapters.push(last.close());
        }

        let document = OutputDocument {
            page_size: self.page_size,
            pages: output_pages,
            chapter_starts,
            chapters,
        };
        self.check_chapters(&document)?;

        log::info!(
            "Assembled {} pages into {} chapters",
            document.page_count(),
            document.chapters.len()
        );
        Ok(document)
    }

    /// Assemble a plain-text stream.
    ///
    /// The whole stream is segmented at once and each chapter becomes one
    /// flowed page; the writer continues long chapters onto extra pages.
    pub fn assemble_text(&self, text: &str) -> Result<OutputDocument> {
        let segmentation = self.detector.segment(text);

        let mut pages = Vec::with_capacity(segmentation.chapters.len());
        let mut chapters = Vec::with_capacity(segmentation.chapters.len());

        for (index, span) in segmentation.chapters.iter().enumerate() {
            pages.push(OutputPage {
                index,
                chapter: index,
                content: PageContent::Flowed {
                    title: Some(span.title.clone()),
                    paragraphs: span.paragraphs(),
                },
            });
            chapters.push(Chapter {
                title: span.title.clone(),
                pages: vec![index],
                content: span.content.clone(),
                boundary: span.boundary(),
                explicit: span.is_explicit(),
            });
        }

        let document = OutputDocument {
            page_size: self.page_size,
            chapter_starts: (0..pages.len()).collect(),
            pages,
            chapters,
        };
        self.check_chapters(&document)?;
        Ok(document)
    }

    fn check_chapters(&self, document: &OutputDocument) -> Result<()> {
        if document.has_explicit_chapters() {
            return Ok(());
        }
        let err = Error::NoChaptersFound {
            source_name: self.source_name.clone(),
        };
        if self.require_chapters {
            return Err(err);
        }
        log::warn!("{}; check the heading pattern", err);
        Ok(())
    }
}
