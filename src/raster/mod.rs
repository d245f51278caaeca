//! Page rasterization.
//!
//! A rasterizer turns a paginated source into an ordered list of page
//! images. Two implementations are provided: one for scans that are already
//! images on disk, and one that shells out to poppler's `pdftoppm`.

use crate::error::{Error, Result};
use image::DynamicImage;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::Chars;

/// File extensions accepted as page images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

/// One rasterized source page.
#[derive(Debug, Clone)]
pub struct PageImage {
    index: usize,
    raster: DynamicImage,
}

impl PageImage {
    /// Wrap a decoded image as page `index`.
    pub fn new(index: usize, raster: DynamicImage) -> Self {
        Self { index, raster }
    }

    /// A white page of the given size.
    pub fn blank(index: usize, pixel_width: u32, pixel_height: u32) -> Self {
        let mut raster = image::GrayImage::new(pixel_width, pixel_height);
        raster.pixels_mut().for_each(|p| p.0 = [255]);
        Self::new(index, DynamicImage::ImageLuma8(raster))
    }

    /// Zero-based position in the source.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Width in pixels.
    pub fn pixel_width(&self) -> u32 {
        self.raster.width()
    }

    /// Height in pixels.
    pub fn pixel_height(&self) -> u32 {
        self.raster.height()
    }

    /// Decoded pixels.
    pub fn raster(&self) -> &DynamicImage {
        &self.raster
    }
}

/// Produces the ordered page images of a source document.
pub trait PageRasterizer: Send + Sync {
    /// Rasterize every page of `source`, in page order.
    ///
    /// Fails with `SourceUnreadable` if the source cannot be opened or paginated.
    fn rasterize(&self, source: &Path) -> Result<Vec<PageImage>>;
}

/// Reads pages that are already images: a single file, or a directory of
/// files ordered by name with numeric runs compared as numbers.
#[derive(Debug, Clone, Default)]
pub struct ImageSequenceRasterizer;

impl ImageSequenceRasterizer {
    /// Create the rasterizer.
    pub fn new() -> Self {
        Self
    }

    fn page_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::source_unreadable(dir, e))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        Ok(files)
    }
}

impl PageRasterizer for ImageSequenceRasterizer {
    fn rasterize(&self, source: &Path) -> Result<Vec<PageImage>> {
        if !source.exists() {
            return Err(Error::source_unreadable(source, "no such file or directory"));
        }

        let files = if source.is_dir() {
            Self::page_files(source)?
        } else {
            vec![source.to_path_buf()]
        };

        if files.is_empty() {
            return Err(Error::source_unreadable(source, "directory holds no page images"));
        }

        files
            .iter()
            .enumerate()
            .map(|(index, path)| {
                log::debug!("Loading page {} from {}", index, path.display());
                image::open(path)
                    .map(|raster| PageImage::new(index, raster))
                    .map_err(|e| Error::source_unreadable(path, e))
            })
            .collect()
    }
}

/// Rasterizes PDFs with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: PathBuf,
    dpi: u32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdftoppmRasterizer {
    /// Use `pdftoppm` from `PATH` at 300 DPI.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: 300,
        }
    }

    /// Use a specific executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, source: &Path) -> Result<Vec<PageImage>> {
        if !source.is_file() {
            return Err(Error::source_unreadable(source, "no such file"));
        }

        let scratch = tempfile::tempdir().map_err(|e| Error::source_unreadable(source, e))?;
        let prefix = scratch.path().join("page");

        log::info!("Rasterizing {} at {} DPI", source.display(), self.dpi);
        let output = Command::new(&self.binary)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(source)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                Error::source_unreadable(
                    source,
                    format!("cannot start '{}': {}", self.binary.display(), e),
                )
            })?;

        if !output.status.success() {
            return Err(Error::source_unreadable(
                source,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        // The scratch directory is removed when `scratch` drops, after decoding.
        ImageSequenceRasterizer::new()
            .rasterize(scratch.path())
            .map_err(|e| match e {
                Error::SourceUnreadable { reason, .. } => Error::source_unreadable(source, reason),
                other => other,
            })
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compare names so that `page2` sorts before `page10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_number(&mut a_chars);
                let nb = take_number(&mut b_chars);
                let na_trimmed = na.trim_start_matches('0');
                let nb_trimmed = nb.trim_start_matches('0');
                let ord = na_trimmed
                    .len()
                    .cmp(&nb_trimmed.len())
                    .then_with(|| na_trimmed.cmp(nb_trimmed))
                    .then_with(|| na.len().cmp(&nb.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            },
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a_chars.next();
                b_chars.next();
            },
        }
    }
}
