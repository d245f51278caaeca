//! End-to-end pipeline tests with scripted collaborators.
//!
//! No OCR engine or rasterizer binary is needed: pages are blank images and
//! the engine returns canned text and word boxes per page index.

use folio_oxide::config::ReconstructionConfig;
use folio_oxide::geometry::CoordinateTransform;
use folio_oxide::layout::PageTranscription;
use folio_oxide::ocr::{filter_words, OcrError, OcrResult, RecognitionEngine, RecognizedWord};
use folio_oxide::pipeline::{DocumentAssembler, PageContent, ReconstructionPipeline};
use folio_oxide::raster::{PageImage, PageRasterizer};
use folio_oxide::writer::{DocumentWriter, PdfDocumentWriter};
use folio_oxide::{Error, Result};
use proptest::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Blank 1224x1584 pages: exactly twice US Letter in points.
struct BlankScan(usize);

impl PageRasterizer for BlankScan {
    fn rasterize(&self, _source: &Path) -> Result<Vec<PageImage>> {
        Ok((0..self.0).map(|i| PageImage::blank(i, 1224, 1584)).collect())
    }
}

#[derive(Default)]
struct ScriptedEngine {
    pages: HashMap<usize, (String, Vec<RecognizedWord>)>,
    unavailable_on: Vec<usize>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    fn page(mut self, index: usize, text: &str, words: Vec<RecognizedWord>) -> Self {
        self.pages.insert(index, (text.to_string(), words));
        self
    }

    fn unavailable_on(mut self, index: usize) -> Self {
        self.unavailable_on.push(index);
        self
    }

    fn check(&self, image: &PageImage) -> OcrResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable_on.contains(&image.index()) {
            return Err(OcrError::Unavailable("tesseract: command not found".to_string()));
        }
        Ok(())
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn recognize_text(&self, image: &PageImage) -> OcrResult<String> {
        self.check(image)?;
        Ok(self
            .pages
            .get(&image.index())
            .map(|(text, _)| text.clone())
            .unwrap_or_default())
    }

    fn recognize_words(&self, image: &PageImage) -> OcrResult<Vec<RecognizedWord>> {
        self.check(image)?;
        Ok(self
            .pages
            .get(&image.index())
            .map(|(_, words)| words.clone())
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn word(text: &str, left: u32, top: u32, confidence: u8) -> RecognizedWord {
    RecognizedWord::new(text, left, top, 80, 40, confidence)
}

fn four_page_book() -> ScriptedEngine {
    ScriptedEngine::default()
        .page(0, "Chapter 1\nIt was a dark night.\n", vec![word("Chapter", 144, 144, 95), word("1", 300, 144, 92)])
        .page(1, "The wind howled.\n", vec![word("wind", 144, 200, 88)])
        // page 2 is a blank scan
        .page(3, "Chapter 2\nMorning came.\n", vec![word("Chapter", 144, 144, 97)])
}

fn pipeline(pages: usize, engine: ScriptedEngine) -> ReconstructionPipeline {
    ReconstructionPipeline::new(ReconstructionConfig::default().with_workers(3), BlankScan(pages), engine)
}

#[test]
fn test_blank_page_joins_current_chapter() {
    let doc = pipeline(4, four_page_book()).run(Path::new("book.pdf")).unwrap();

    assert_eq!(doc.page_count(), 4);
    assert_eq!(doc.chapters.len(), 2);
    assert_eq!(doc.chapters[0].pages, vec![0, 1, 2]);
    assert_eq!(doc.chapters[1].pages, vec![3]);
    assert!(!doc.is_chapter_start(2));
    assert_eq!(doc.chapter_starts.iter().copied().collect::<Vec<_>>(), vec![0, 3]);

    match &doc.pages[2].content {
        PageContent::Positioned { runs } => assert!(runs.is_empty()),
        other => panic!("expected positioned page, got {:?}", other),
    }
    assert_eq!(doc.chapters[0].content, "It was a dark night.\n\nThe wind howled.");
}

#[test]
fn test_runs_are_scaled_and_flipped() {
    let doc = pipeline(4, four_page_book()).run(Path::new("book.pdf")).unwrap();
    let runs = match &doc.pages[0].content {
        PageContent::Positioned { runs } => runs.clone(),
        other => panic!("expected positioned page, got {:?}", other),
    };

    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].text, "Chapter");
    assert!((runs[0].x - 72.0).abs() < 1e-3);
    // 792 - 144 * 0.5 - 40 * 0.5
    assert!((runs[0].y - 700.0).abs() < 1e-3);
    assert!((runs[0].font_size - 20.0).abs() < 1e-3);
}

#[test]
fn test_confidence_at_threshold_is_dropped() {
    let engine = ScriptedEngine::default().page(
        0,
        "Chapter 1\n",
        vec![word("smudge", 10, 10, 60), word("clear", 10, 100, 61)],
    );
    let doc = pipeline(1, engine).run(Path::new("scan.png")).unwrap();

    match &doc.pages[0].content {
        PageContent::Positioned { runs } => {
            let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
            assert_eq!(texts, vec!["clear"]);
        },
        other => panic!("expected positioned page, got {:?}", other),
    }
}

#[test]
fn test_unavailable_engine_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("book.pdf");

    let engine = four_page_book().unavailable_on(3);
    let err = pipeline(5, engine)
        .run_and_write(Path::new("book.pdf"), &PdfDocumentWriter::new(), &destination)
        .unwrap_err();

    match &err {
        Error::RecognitionUnavailable { page, reason } => {
            assert_eq!(*page, 3);
            assert!(reason.contains("command not found"));
        },
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_fatal());
    assert!(!destination.exists());
}

fn single_worker(pages: usize, engine: ScriptedEngine) -> ReconstructionPipeline {
    ReconstructionPipeline::new(ReconstructionConfig::default().with_workers(1), BlankScan(pages), engine)
}

#[test]
fn test_failure_skips_pages_not_yet_started() {
    let engine = ScriptedEngine::default().unavailable_on(0);
    let calls = Arc::clone(&engine.calls);

    let err = single_worker(50, engine).run(Path::new("book.pdf")).unwrap_err();
    assert!(matches!(err, Error::RecognitionUnavailable { page: 0, .. }));
    // a single worker reaches page 0 first, so nothing after it runs
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_two_failures_report_lower_page() {
    let engine = ScriptedEngine::default().unavailable_on(5).unavailable_on(2);
    let calls = Arc::clone(&engine.calls);

    let err = single_worker(20, engine).run(Path::new("book.pdf")).unwrap_err();
    assert!(matches!(err, Error::RecognitionUnavailable { page: 2, .. }));
    // pages 0 and 1 make two calls each, page 2 fails on its first
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_every_page_is_transcribed_once() {
    let engine = ScriptedEngine::default();
    let calls = Arc::clone(&engine.calls);
    let doc = pipeline(9, engine).run(Path::new("book.pdf")).unwrap();

    assert_eq!(doc.page_count(), 9);
    // one text call and one word call per page
    assert_eq!(calls.load(Ordering::SeqCst), 18);
    assert_eq!(doc.chapters.len(), 1);
    assert_eq!(doc.chapters[0].title, "Introduction");
}

#[test]
fn test_run_and_write_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("out.pdf");

    let written = pipeline(4, four_page_book())
        .run_and_write(Path::new("book.pdf"), &PdfDocumentWriter::new(), &destination)
        .unwrap();
    assert_eq!(written, destination);

    let bytes = std::fs::read(&destination).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Outlines"));
    assert!(text.contains("(Chapter 2)"));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[test]
fn test_run_text_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("book.txt");
    std::fs::write(&source, "Intro text.\n\nChapter 1\nBody one.\n\nChapter 2\nBody two.\n").unwrap();

    let doc = pipeline(0, ScriptedEngine::default()).run_text(&source).unwrap();
    let titles: Vec<&str> = doc.chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Introduction", "Chapter 1", "Chapter 2"]);

    let out = dir.path().join("book.pdf");
    PdfDocumentWriter::new().write_document(&doc, &out).unwrap();
    assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF-"));
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PageKind {
    Heading,
    Body,
    Blank,
}

fn page_kind() -> impl Strategy<Value = PageKind> {
    prop_oneof![Just(PageKind::Heading), Just(PageKind::Body), Just(PageKind::Blank)]
}

fn transcription(index: usize, kind: PageKind) -> PageTranscription {
    let plain_text = match kind {
        PageKind::Heading => format!("Chapter {}\nbody of page {}\n", index + 1, index),
        PageKind::Body => format!("body of page {}\n", index),
        PageKind::Blank => String::new(),
    };
    PageTranscription {
        index,
        plain_text,
        runs: Vec::new(),
    }
}

proptest! {
    #[test]
    fn prop_every_page_in_exactly_one_chapter(kinds in prop::collection::vec(page_kind(), 1..40)) {
        let mut pages: Vec<PageTranscription> = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| transcription(i, kind))
            .collect();
        pages.reverse();

        let doc = DocumentAssembler::new(&ReconstructionConfig::default())
            .unwrap()
            .assemble(pages)
            .unwrap();

        let covered: Vec<usize> = doc.chapters.iter().flat_map(|c| c.pages.iter().copied()).collect();
        prop_assert_eq!(covered, (0..kinds.len()).collect::<Vec<_>>());

        // Leading blank pages belong to whichever chapter opens first
        let first_open = kinds.iter().position(|&k| k != PageKind::Blank);
        let expected_starts: Vec<usize> = kinds
            .iter()
            .enumerate()
            .filter(|&(i, &k)| i == 0 || (k == PageKind::Heading && Some(i) != first_open))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(doc.chapter_starts.iter().copied().collect::<Vec<_>>(), expected_starts);

        let offsets: Vec<usize> = doc.chapters.iter().map(|c| c.boundary.start_offset).collect();
        prop_assert_eq!(offsets.first().copied(), Some(0));
        for pair in offsets.windows(2) {
            prop_assert!(pair[0] < pair[1], "offsets not increasing: {:?}", offsets);
        }

        for page in &doc.pages {
            prop_assert!(doc.chapters[page.chapter].pages.contains(&page.index));
        }
    }

    #[test]
    fn prop_in_bounds_words_land_on_the_page(
        image_w in 100u32..4000,
        image_h in 100u32..4000,
        fx in 0.0f32..1.0,
        fy in 0.0f32..1.0,
        fh in 0.0f32..1.0,
    ) {
        let transform = CoordinateTransform::new(612.0, 792.0, image_w, image_h).unwrap();
        let px = (fx * image_w as f32).floor();
        let py = (fy * image_h as f32).floor();
        let ph = (fh * (image_h as f32 - py)).floor();

        let placement = transform.apply(px, py, ph);
        prop_assert!(placement.x >= 0.0 && placement.x <= 612.0 + 1e-3);
        prop_assert!(placement.y >= -1e-3 && placement.y <= 792.0 + 1e-3);
    }

    #[test]
    fn prop_font_size_floor_is_exact(height in 0u32..2000, min in 1.0f32..24.0) {
        let transform = CoordinateTransform::new(612.0, 792.0, 2550, 3300)
            .unwrap()
            .with_min_font_size(min);
        let (_, scale_y) = transform.scale();
        let natural = height as f32 * scale_y;

        let font_size = transform.apply(0.0, 0.0, height as f32).font_size;
        if natural < min {
            prop_assert_eq!(font_size, min);
        } else {
            prop_assert_eq!(font_size, natural);
        }
    }

    #[test]
    fn prop_filter_is_idempotent(confidences in prop::collection::vec(0u8..=100, 0..50), threshold in 0u8..=100) {
        let words: Vec<RecognizedWord> = confidences
            .iter()
            .enumerate()
            .map(|(i, &c)| RecognizedWord::new(format!("w{}", i), 0, 0, 10, 10, c))
            .collect();

        let once = filter_words(words, threshold);
        prop_assert!(once.iter().all(|w| w.confidence > threshold));
        let twice = filter_words(once.clone(), threshold);
        prop_assert_eq!(once, twice);
    }
}
