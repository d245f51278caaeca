// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::manual_range_contains)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Folio Oxide
//!
//! Rebuilds scanned books into navigable, chaptered documents that keep the
//! approximate layout of every page.
//!
//! ## What it does
//!
//! - **Layout reconstruction**: OCR word boxes are filtered by confidence and
//!   mapped from image pixels to page points, y-axis flipped, so each word is
//!   drawn where it sat on the scan.
//! - **Chapter segmentation**: heading lines (`Chapter XIV`, `Chapter 14`,
//!   `3. The Storm`, or a custom pattern) split the text into chapters. Every
//!   page lands in exactly one chapter.
//! - **Parallel transcription**: pages are recognized on a bounded worker pool
//!   and reassembled in source order; one fatal page failure aborts the run.
//! - **PDF output**: positioned text in a Base-14 font, with one bookmark per
//!   chapter. Plain-text sources are flowed into wrapped paragraphs instead.
//!
//! ## Architecture
//!
//! ```text
//! PageRasterizer ─▶ PageImage[] ─▶ PageTranscriber (per page, in parallel)
//!                                      │  RecognitionEngine + filter + transform
//!                                      ▼
//!                              PageTranscription[] ─▶ DocumentAssembler ─▶ OutputDocument
//!                                                        (ChapterDetector)        │
//!                                                                                 ▼
//!                                                                        DocumentWriter
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio_oxide::config::ReconstructionConfig;
//! use folio_oxide::ocr::TesseractEngine;
//! use folio_oxide::pipeline::ReconstructionPipeline;
//! use folio_oxide::raster::PdftoppmRasterizer;
//! use folio_oxide::writer::PdfDocumentWriter;
//! use std::path::Path;
//!
//! # fn main() -> folio_oxide::Result<()> {
//! let config = ReconstructionConfig::default().with_workers(4);
//! let writer = PdfDocumentWriter::from_config(&config);
//! let pipeline = ReconstructionPipeline::new(config, PdftoppmRasterizer::new(), TesseractEngine::new());
//!
//! pipeline.run_and_write(Path::new("scan.pdf"), &writer, Path::new("book.pdf"))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry and coordinate transforms
pub mod geometry;

// Collaborators: recognition and rasterization
pub mod ocr;
pub mod raster;

// Chapter detection
pub mod chapters;

// Per-page layout
pub mod layout;

// Transcription fan-out and document assembly
pub mod pipeline;

// PDF writing
pub mod object;
pub mod writer;

// Re-exports
pub use config::{HeadingPattern, ReconstructionConfig};
pub use error::{Error, Result};
pub use geometry::PageSize;
pub use pipeline::{OutputDocument, ReconstructionPipeline};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
