//! Output document writers.
//!
//! ## Architecture
//!
//! ```text
//! OutputDocument
//!     ↓ instructions()
//! [PdfDocumentWriter] (draw instructions → pages, flowed text → FlowLayout)
//!     ↓
//! [PdfWriter] (assembles complete PDF structure, outline included)
//!     ↓
//! [ContentStreamBuilder] / [ObjectSerializer]
//!     ↓
//! PDF bytes
//! ```
//!
//! [`DocumentWriter`] is the seam the pipeline writes through; the PDF and
//! JSON writers both implement it.

mod content_stream;
mod flow;
mod object_serializer;
mod outline_builder;
mod pdf_writer;

pub use content_stream::{encode_win_ansi, ContentStreamBuilder, ContentStreamOp};
pub use flow::{wrap_text, FlowLayout, FlowLine};
pub use object_serializer::ObjectSerializer;
pub use outline_builder::{OutlineBuildResult, OutlineBuilder, OutlineItem};
pub use pdf_writer::{PageBuilder, PdfWriter, PdfWriterConfig};

use crate::config::ReconstructionConfig;
use crate::error::{Error, Result};
use crate::layout::PositionedRun;
use crate::pipeline::{DrawInstruction, OutputDocument};
use std::path::{Path, PathBuf};

/// Persists an [`OutputDocument`].
pub trait DocumentWriter {
    /// Write `document` to `destination` and return the written path.
    ///
    /// Fails with `WriteFailed` on any I/O error.
    fn write_document(&self, document: &OutputDocument, destination: &Path) -> Result<PathBuf>;
}

fn persist(bytes: &[u8], destination: &Path) -> Result<PathBuf> {
    std::fs::write(destination, bytes).map_err(|source| Error::WriteFailed {
        path: destination.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} ({} bytes)", destination.display(), bytes.len());
    Ok(destination.to_path_buf())
}

/// Content of one output page, gathered from the instruction stream.
#[derive(Default)]
struct PendingPage<'a> {
    chapter_start: bool,
    chapter_title: &'a str,
    runs: Vec<&'a PositionedRun>,
    heading: Option<&'a str>,
    paragraphs: Vec<&'a str>,
}

impl PendingPage<'_> {
    fn is_flowed(&self) -> bool {
        self.heading.is_some() || !self.paragraphs.is_empty()
    }
}

/// Renders documents as PDF.
///
/// Positioned pages become one PDF page each, with every run drawn at its
/// own coordinates and size. Flowed pages are wrapped and may continue onto
/// extra PDF pages. Each chapter start gets a bookmark.
#[derive(Debug, Clone, Default)]
pub struct PdfDocumentWriter {
    config: PdfWriterConfig,
}

impl PdfDocumentWriter {
    /// Writer with default PDF settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer with explicit PDF settings.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self { config }
    }

    /// Writer using the font from the reconstruction configuration.
    pub fn from_config(config: &ReconstructionConfig) -> Self {
        Self::with_config(PdfWriterConfig::default().with_font_name(config.font_name.clone()))
    }

    /// Render `document` to PDF bytes.
    pub fn render(&self, document: &OutputDocument) -> Result<Vec<u8>> {
        let (width, height) = document.page_size.dimensions();
        let flow = FlowLayout::new(document.page_size);
        let mut writer = PdfWriter::with_config(self.config.clone());

        let mut pending: Option<PendingPage<'_>> = None;
        for instruction in document.instructions() {
            match instruction {
                DrawInstruction::BeginPage {
                    chapter_start,
                    chapter_title,
                    ..
                } => {
                    if let Some(page) = pending.take() {
                        emit_page(&mut writer, &flow, page, width, height);
                    }
                    pending = Some(PendingPage {
                        chapter_start,
                        chapter_title,
                        ..PendingPage::default()
                    });
                },
                DrawInstruction::Text(run) => {
                    if let Some(page) = pending.as_mut() {
                        page.runs.push(run);
                    }
                },
                DrawInstruction::Heading(title) => {
                    if let Some(page) = pending.as_mut() {
                        page.heading = Some(title);
                    }
                },
                DrawInstruction::Paragraph(text) => {
                    if let Some(page) = pending.as_mut() {
                        page.paragraphs.push(text);
                    }
                },
            }
        }
        if let Some(page) = pending.take() {
            emit_page(&mut writer, &flow, page, width, height);
        }

        log::debug!(
            "Rendered {} output pages as {} PDF pages",
            document.page_count(),
            writer.page_count()
        );
        writer.finish()
    }
}

fn emit_page(writer: &mut PdfWriter, flow: &FlowLayout, page: PendingPage<'_>, width: f32, height: f32) {
    if page.chapter_start {
        let first = writer.page_count();
        writer.add_bookmark(page.chapter_title, first);
    }

    let flowed_pages = if page.is_flowed() {
        flow.layout(page.heading, &page.paragraphs)
    } else {
        vec![Vec::new()]
    };

    for (i, lines) in flowed_pages.into_iter().enumerate() {
        let mut builder = writer.add_page(width, height);
        if i == 0 {
            for run in &page.runs {
                builder.add_text(&run.text, run.x, run.y, run.font_size);
            }
        }
        for line in &lines {
            builder.add_text(&line.text, line.x, line.y, line.font_size);
        }
        builder.finish();
    }
}

impl DocumentWriter for PdfDocumentWriter {
    fn write_document(&self, document: &OutputDocument, destination: &Path) -> Result<PathBuf> {
        let bytes = self.render(document)?;
        persist(&bytes, destination)
    }
}

/// Dumps documents as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentWriter;

impl DocumentWriter for JsonDocumentWriter {
    fn write_document(&self, document: &OutputDocument, destination: &Path) -> Result<PathBuf> {
        let json = serde_json::to_vec_pretty(document).map_err(|e| Error::WriteFailed {
            path: destination.to_path_buf(),
            source: e.into(),
        })?;
        persist(&json, destination)
    }
}
