//! Rebuild a scanned book as a chaptered PDF.
//!
//! Usage:
//!   scan_to_pdf <source> <output> [options]
//!
//! `<source>` is a PDF (rasterized with pdftoppm), a page image, a directory
//! of page images, or a `.txt` file (flowed, no OCR).
//!
//! Options:
//!   --json                 write the reconstructed document as JSON
//!   --threshold <0-100>    word confidence threshold (default 60)
//!   --min-font <pt>        smallest font size (default 6)
//!   --page-size <letter|a4|WxH>
//!   --pattern <standard|chapter-number>
//!   --custom-pattern <regex>
//!   --heading-lines <n|any>
//!   --workers <n>
//!   --lang <tesseract language>
//!   --dpi <n>              rasterization DPI (default 300)
//!   --title <text>
//!   --require-chapters     fail when no chapter heading is found
//!
//! Logging is controlled with RUST_LOG (default: info).

use folio_oxide::config::{HeadingPattern, ReconstructionConfig};
use folio_oxide::geometry::PageSize;
use folio_oxide::ocr::TesseractEngine;
use folio_oxide::pipeline::ReconstructionPipeline;
use folio_oxide::raster::{ImageSequenceRasterizer, PageRasterizer, PdftoppmRasterizer};
use folio_oxide::writer::{DocumentWriter, JsonDocumentWriter, PdfDocumentWriter, PdfWriterConfig};
use std::path::PathBuf;
use std::process::ExitCode;

struct CliArgs {
    source: PathBuf,
    output: PathBuf,
    json: bool,
    config: ReconstructionConfig,
    language: Option<String>,
    dpi: u32,
    title: Option<String>,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: '{}'", flag, value))
}

fn parse_page_size(value: &str) -> Result<PageSize, String> {
    match value.to_ascii_lowercase().as_str() {
        "letter" => Ok(PageSize::Letter),
        "a4" => Ok(PageSize::A4),
        custom => {
            let (w, h) = custom
                .split_once('x')
                .ok_or_else(|| format!("unknown page size '{}'", value))?;
            let width = w.parse().map_err(|_| format!("bad page width '{}'", w))?;
            let height = h.parse().map_err(|_| format!("bad page height '{}'", h))?;
            Ok(PageSize::Custom { width, height })
        },
    }
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = Vec::new();
        let mut json = false;
        let mut config = ReconstructionConfig::default();
        let mut language = None;
        let mut dpi = 300;
        let mut title = None;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1);
            match flag {
                "--json" => json = true,
                "--require-chapters" => config = config.with_require_chapters(true),
                "--threshold" => {
                    config = config.with_confidence_threshold(parse_value(flag, value)?);
                    i += 1;
                },
                "--min-font" => {
                    config = config.with_min_font_size(parse_value(flag, value)?);
                    i += 1;
                },
                "--page-size" => {
                    let size: String = parse_value(flag, value)?;
                    config = config.with_page_size(parse_page_size(&size)?);
                    i += 1;
                },
                "--pattern" => {
                    let pattern = match parse_value::<String>(flag, value)?.as_str() {
                        "standard" => HeadingPattern::Standard,
                        "chapter-number" => HeadingPattern::ChapterNumber,
                        other => return Err(format!("unknown pattern '{}'", other)),
                    };
                    config = config.with_heading_pattern(pattern);
                    i += 1;
                },
                "--custom-pattern" => {
                    config = config.with_heading_pattern(HeadingPattern::Custom(parse_value(flag, value)?));
                    i += 1;
                },
                "--heading-lines" => {
                    let lines: String = parse_value(flag, value)?;
                    let lines = match lines.as_str() {
                        "any" => None,
                        n => Some(parse_value(flag, Some(&n.to_string()))?),
                    };
                    config = config.with_page_heading_lines(lines);
                    i += 1;
                },
                "--workers" => {
                    config = config.with_workers(parse_value(flag, value)?);
                    i += 1;
                },
                "--lang" => {
                    language = Some(parse_value(flag, value)?);
                    i += 1;
                },
                "--dpi" => {
                    dpi = parse_value(flag, value)?;
                    i += 1;
                },
                "--title" => {
                    title = Some(parse_value(flag, value)?);
                    i += 1;
                },
                other if other.starts_with("--") => return Err(format!("unknown option '{}'", other)),
                other => positional.push(PathBuf::from(other)),
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        let source = positional.next().ok_or("missing <source>")?;
        let output = positional.next().ok_or("missing <output>")?;

        Ok(Self {
            source,
            output,
            json,
            config,
            language,
            dpi,
            title,
        })
    }

    fn is_text_source(&self) -> bool {
        self.source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
    }

    fn rasterizer(&self) -> Box<dyn PageRasterizer> {
        let is_pdf = self
            .source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            Box::new(PdftoppmRasterizer::new().with_dpi(self.dpi))
        } else {
            Box::new(ImageSequenceRasterizer::new())
        }
    }
}

/// Forwards to a boxed rasterizer chosen at runtime.
struct AnyRasterizer(Box<dyn PageRasterizer>);

impl PageRasterizer for AnyRasterizer {
    fn rasterize(&self, source: &std::path::Path) -> folio_oxide::Result<Vec<folio_oxide::raster::PageImage>> {
        self.0.rasterize(source)
    }
}

fn run(args: CliArgs) -> folio_oxide::Result<PathBuf> {
    let mut engine = TesseractEngine::new().with_dpi(args.dpi);
    if let Some(language) = &args.language {
        engine = engine.with_language(language.clone());
    }
    if !args.is_text_source() && !engine.is_available() {
        log::warn!("tesseract was not found on PATH; recognition will fail");
    }

    let mut pdf_config = PdfWriterConfig::default().with_font_name(args.config.font_name.clone());
    if let Some(title) = &args.title {
        pdf_config = pdf_config.with_title(title.clone());
    }
    let writer: Box<dyn DocumentWriter> = if args.json {
        Box::new(JsonDocumentWriter)
    } else {
        Box::new(PdfDocumentWriter::with_config(pdf_config))
    };

    let mut config = args.config.clone();
    if args.is_text_source() {
        if let Some(stem) = args.source.file_stem() {
            config = config.with_default_title(stem.to_string_lossy());
        }
    }
    let pipeline = ReconstructionPipeline::new(config, AnyRasterizer(args.rasterizer()), engine);

    let document = if args.is_text_source() {
        pipeline.run_text(&args.source)?
    } else {
        pipeline.run(&args.source)?
    };

    for chapter in &document.chapters {
        log::info!("  {} ({} pages)", chapter.title, chapter.pages.len());
    }
    writer.write_document(&document, &args.output)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match CliArgs::from_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Usage: scan_to_pdf <source> <output> [--json] [options]");
            return ExitCode::from(2);
        },
    };

    match run(args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
