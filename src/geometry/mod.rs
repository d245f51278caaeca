//! Geometric primitives and the image-to-page coordinate transform.
//!
//! Recognition boxes live in image space: origin at the top-left corner,
//! y growing downward, units are pixels. Output pages live in page space:
//! origin at the bottom-left corner, y growing upward, units are points.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Output page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// US Letter (8.5" x 11")
    #[default]
    Letter,
    /// A4 (210mm x 297mm)
    A4,
    /// Arbitrary size
    Custom {
        /// Width in points
        width: f32,
        /// Height in points
        height: f32,
    },
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Where and how large a recognized word lands on the output page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Baseline x in page space
    pub x: f32,
    /// Baseline y in page space
    pub y: f32,
    /// Font size in points, never below the configured floor
    pub font_size: f32,
}

/// Linear map from one page image's pixel space to output page space.
///
/// Scales each axis independently and flips y so that a box touching the
/// bottom of the image lands on the bottom edge of the page.
///
/// # Examples
///
/// ```
/// use folio_oxide::geometry::CoordinateTransform;
///
/// // 2x downscale: a 1224x1584 scan onto a Letter page
/// let transform = CoordinateTransform::new(612.0, 792.0, 1224, 1584).unwrap();
/// let p = transform.apply(100.0, 200.0, 40.0);
/// assert_eq!(p.x, 50.0);
/// assert_eq!(p.y, 792.0 - 100.0 - 20.0);
/// assert_eq!(p.font_size, 20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    page_width: f32,
    page_height: f32,
    image_height: f32,
    scale_x: f32,
    scale_y: f32,
    min_font_size: f32,
}

impl CoordinateTransform {
    /// Create a transform for one page image.
    ///
    /// Fails with `InvalidGeometry` if any dimension is not strictly positive.
    pub fn new(
        page_width: f32,
        page_height: f32,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self> {
        if !(page_width > 0.0 && page_height > 0.0) || !page_width.is_finite() || !page_height.is_finite() {
            return Err(Error::InvalidGeometry(format!(
                "page dimensions must be positive, got {}x{}",
                page_width, page_height
            )));
        }
        if image_width == 0 || image_height == 0 {
            return Err(Error::InvalidGeometry(format!(
                "image dimensions must be positive, got {}x{}",
                image_width, image_height
            )));
        }

        Ok(Self {
            page_width,
            page_height,
            image_height: image_height as f32,
            scale_x: page_width / image_width as f32,
            scale_y: page_height / image_height as f32,
            min_font_size: crate::config::DEFAULT_MIN_FONT_SIZE,
        })
    }

    /// Create a transform for a named page size.
    pub fn for_page(page_size: PageSize, image_width: u32, image_height: u32) -> Result<Self> {
        let (width, height) = page_size.dimensions();
        Self::new(width, height, image_width, image_height)
    }

    /// Set the font size floor.
    pub fn with_min_font_size(mut self, min_font_size: f32) -> Self {
        self.min_font_size = min_font_size;
        self
    }

    /// Horizontal and vertical scale factors (page units per pixel).
    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }

    /// Output page dimensions.
    pub fn page_dimensions(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    /// Map a word box's top-left corner and pixel height into page space.
    ///
    /// `y = pageHeight - py * scaleY - pixelHeight * scaleY`, computed as
    /// `pageHeight * (imageHeight - py - pixelHeight) / imageHeight` so that
    /// in-bounds boxes can never round below zero.
    pub fn apply(&self, px: f32, py: f32, pixel_height: f32) -> Placement {
        let remaining = f64::from(self.image_height) - f64::from(py) - f64::from(pixel_height);
        let y = f64::from(self.page_height) * remaining / f64::from(self.image_height);

        Placement {
            x: px * self.scale_x,
            y: y as f32,
            font_size: (pixel_height * self.scale_y).max(self.min_font_size),
        }
    }
}
