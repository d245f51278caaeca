//! End-to-end reconstruction pipeline.
//!
//! ```text
//! source ──rasterize──▶ [PageImage] ──(worker pool)──▶ [PageTranscription]
//!                                                          │
//!                             OutputDocument ◀──assemble───┘
//! ```
//!
//! Rasterization is sequential. Transcription fans out over a bounded
//! worker pool, one task per page, and fans back in by page index. Assembly
//! waits for every page because chapter boundaries are a whole-document
//! property.

pub mod assembler;

pub use assembler::{
    Chapter, DocumentAssembler, DrawInstruction, OutputDocument, OutputPage, PageContent,
};

use crate::config::ReconstructionConfig;
use crate::error::{Error, Result};
use crate::layout::{PageTranscriber, PageTranscription};
use crate::ocr::RecognitionEngine;
use crate::raster::{PageImage, PageRasterizer};
use crate::writer::DocumentWriter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Scanned source to output document, with pluggable collaborators.
pub struct ReconstructionPipeline {
    config: ReconstructionConfig,
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn RecognitionEngine>,
}

impl std::fmt::Debug for ReconstructionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconstructionPipeline")
            .field("config", &self.config)
            .field("engine", &self.engine.name())
            .finish_non_exhaustive()
    }
}

impl ReconstructionPipeline {
    /// Create a pipeline.
    pub fn new(
        config: ReconstructionConfig,
        rasterizer: impl PageRasterizer + 'static,
        engine: impl RecognitionEngine + 'static,
    ) -> Self {
        Self {
            config,
            rasterizer: Box::new(rasterizer),
            engine: Box::new(engine),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Rasterize, transcribe and assemble `source`.
    ///
    /// Nothing is returned for a partially processed document: any fatal
    /// page failure aborts the whole run.
    pub fn run(&self, source: &Path) -> Result<OutputDocument> {
        self.config.validate()?;

        let images = self.rasterizer.rasterize(source)?;
        log::info!("{}: {} pages", source.display(), images.len());

        let pages = self.transcribe_pages(images)?;
        DocumentAssembler::new(&self.config)?
            .with_source_name(source_name(source))
            .assemble(pages)
    }

    /// Segment a plain-text file into flowed chapter pages.
    ///
    /// No rasterization or recognition is involved.
    pub fn run_text(&self, source: &Path) -> Result<OutputDocument> {
        self.config.validate()?;

        let bytes = std::fs::read(source).map_err(|e| Error::source_unreadable(source, e))?;
        let text = String::from_utf8_lossy(&bytes);
        log::info!("{}: {} bytes of text", source.display(), text.len());

        DocumentAssembler::new(&self.config)?
            .with_source_name(source_name(source))
            .assemble_text(&text)
    }

    /// Run the pipeline and hand the result to `writer`.
    pub fn run_and_write(
        &self,
        source: &Path,
        writer: &dyn DocumentWriter,
        destination: &Path,
    ) -> Result<PathBuf> {
        let document = self.run(source)?;
        writer.write_document(&document, destination)
    }

    /// Transcribe every page on the worker pool.
    ///
    /// Results come back in page order whatever order the tasks finish in.
    /// After the first failure, pages that have not started are skipped.
    /// If several pages fail, the error of the lowest page index wins.
    pub fn transcribe_pages(&self, images: Vec<PageImage>) -> Result<Vec<PageTranscription>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.unwrap_or(0))
            .thread_name(|i| format!("page-worker-{}", i))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        let transcriber = PageTranscriber::new(&self.config);
        let engine = self.engine.as_ref();
        let cancelled = AtomicBool::new(false);

        log::debug!(
            "Transcribing {} pages on {} workers",
            images.len(),
            pool.current_num_threads()
        );

        let results: Vec<Option<Result<PageTranscription>>> = pool.install(|| {
            images
                .into_par_iter()
                .map(|image| {
                    if cancelled.load(Ordering::Acquire) {
                        return None;
                    }
                    let result = transcriber.transcribe(&image, engine);
                    if let Err(e) = &result {
                        log::warn!("Cancelling remaining pages: {}", e);
                        cancelled.store(true, Ordering::Release);
                    }
                    Some(result)
                })
                .collect()
        });

        let mut pages = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results.into_iter().flatten() {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => {
                    first_error = Some(e);
                    break;
                },
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(pages),
        }
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
