//! Recognition through the `tesseract` command-line tool.
//!
//! Each call pipes a PNG-encoded page into `tesseract stdin stdout`. Word
//! boxes come from the `tsv` output config, whose word rows (level 5) carry
//! `left top width height conf text`.

use super::{OcrError, OcrResult, RecognitionEngine, RecognizedWord};
use crate::raster::PageImage;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// TSV row level for individual words.
const WORD_LEVEL: &str = "5";

/// Engine backed by a local `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: Option<String>,
    page_segmentation_mode: Option<u8>,
    dpi: Option<u32>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractEngine {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: None,
            page_segmentation_mode: None,
            dpi: None,
        }
    }

    /// Use a specific executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Recognition language(s), e.g. `eng` or `eng+deu`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Page segmentation mode (`--psm`).
    pub fn with_page_segmentation_mode(mut self, psm: u8) -> Self {
        self.page_segmentation_mode = Some(psm);
        self
    }

    /// Resolution hint for images without DPI metadata.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Whether the executable can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn command(&self, output_config: Option<&str>) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stdin").arg("stdout");
        if let Some(language) = &self.language {
            cmd.arg("-l").arg(language);
        }
        if let Some(psm) = self.page_segmentation_mode {
            cmd.arg("--psm").arg(psm.to_string());
        }
        if let Some(dpi) = self.dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        if let Some(config) = output_config {
            cmd.arg(config);
        }
        cmd
    }

    /// Run tesseract on one page and return its standard output.
    fn run(&self, image: &PageImage, output_config: Option<&str>) -> OcrResult<String> {
        let png = encode_png(image)?;

        let mut child = self
            .command(output_config)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                OcrError::Unavailable(format!("cannot start '{}': {}", self.binary.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Unavailable("child stdin was not captured".to_string()))?;

        // Feed stdin from a separate thread so a full stdout pipe cannot stall us.
        let feeder = std::thread::spawn(move || stdin.write_all(&png));

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::Unavailable(format!("tesseract did not finish: {}", e)))?;

        match feeder.join() {
            Ok(Ok(())) => {},
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {},
            Ok(Err(e)) => return Err(OcrError::Image(format!("writing page to tesseract: {}", e))),
            Err(_) => return Err(OcrError::Image("stdin feeder panicked".to_string())),
        }

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RecognitionEngine for TesseractEngine {
    fn recognize_text(&self, image: &PageImage) -> OcrResult<String> {
        self.run(image, None)
    }

    fn recognize_words(&self, image: &PageImage) -> OcrResult<Vec<RecognizedWord>> {
        let tsv = self.run(image, Some("tsv"))?;
        parse_tsv(&tsv)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

fn encode_png(image: &PageImage) -> OcrResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .raster()
        .write_to(&mut buf, image::ImageOutputFormat::Png)
        .map_err(|e| OcrError::Image(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Parse tesseract TSV output into word boxes.
///
/// Columns are located by header name. Non-word rows and rows with empty
/// text are skipped; negative confidences become 0 and fractional ones are
/// truncated.
pub fn parse_tsv(tsv: &str) -> OcrResult<Vec<RecognizedWord>> {
    let mut lines = tsv.lines();
    let header = match lines.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };

    let columns: Vec<&str> = header.split('\t').collect();
    let column = |name: &str| {
        columns
            .iter()
            .position(|c| c.trim() == name)
            .ok_or_else(|| OcrError::InvalidOutput(format!("TSV header lacks '{}' column", name)))
    };
    let level_col = column("level")?;
    let left_col = column("left")?;
    let top_col = column("top")?;
    let width_col = column("width")?;
    let height_col = column("height")?;
    let conf_col = column("conf")?;
    let text_col = column("text")?;

    let mut words = Vec::new();
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.get(level_col).map(|l| l.trim()) != Some(WORD_LEVEL) {
            continue;
        }

        let text = fields.get(text_col).map(|t| t.trim()).unwrap_or("");
        if text.is_empty() {
            continue;
        }

        let int_field = |col: usize, name: &str| -> OcrResult<u32> {
            fields
                .get(col)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(|v| v.max(0) as u32)
                .ok_or_else(|| {
                    OcrError::InvalidOutput(format!("row {}: bad '{}' value", line_no + 2, name))
                })
        };

        let confidence = fields
            .get(conf_col)
            .and_then(|v| v.trim().parse::<f32>().ok())
            .ok_or_else(|| OcrError::InvalidOutput(format!("row {}: bad 'conf' value", line_no + 2)))?
            .clamp(0.0, 100.0) as u8;

        words.push(RecognizedWord {
            text: text.to_string(),
            left: int_field(left_col, "left")?,
            top: int_field(top_col, "top")?,
            width: int_field(width_col, "width")?,
            height: int_field(height_col, "height")?,
            confidence,
        });
    }

    Ok(words)
}
