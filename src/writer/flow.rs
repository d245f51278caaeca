//! Flowed text layout for plain-text chapters.
//!
//! Greedy word wrap with an average-glyph-width estimate, top to bottom,
//! spilling onto continuation pages. No hyphenation or justification.

use crate::geometry::PageSize;

/// Average Helvetica glyph advance as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLine {
    /// Line text
    pub text: String,
    /// Baseline x
    pub x: f32,
    /// Baseline y
    pub y: f32,
    /// Font size
    pub font_size: f32,
}

/// Page geometry and type sizes for flowed text.
#[derive(Debug, Clone)]
pub struct FlowLayout {
    page_width: f32,
    page_height: f32,
    /// Margin on all four sides
    pub margin: f32,
    /// Paragraph font size
    pub body_size: f32,
    /// Heading font size
    pub heading_size: f32,
    /// Line height multiplier
    pub line_height: f32,
}

impl FlowLayout {
    /// Layout for `page_size` with one-inch margins.
    pub fn new(page_size: PageSize) -> Self {
        let (page_width, page_height) = page_size.dimensions();
        Self {
            page_width,
            page_height,
            margin: 72.0,
            body_size: 11.0,
            heading_size: 18.0,
            line_height: 1.2,
        }
    }

    /// Lay out a heading and paragraphs; returns the lines of each physical page.
    ///
    /// Always returns at least one page, possibly empty.
    pub fn layout(&self, heading: Option<&str>, paragraphs: &[&str]) -> Vec<Vec<FlowLine>> {
        let mut cursor = Cursor::new(self);

        if let Some(heading) = heading {
            for line in wrap_text(heading, self.max_chars(self.heading_size)) {
                cursor.push(line, self.heading_size);
            }
            cursor.skip(self.heading_size * 0.5);
        }

        for paragraph in paragraphs {
            for line in wrap_text(paragraph, self.max_chars(self.body_size)) {
                cursor.push(line, self.body_size);
            }
            cursor.skip(self.body_size * 0.5);
        }

        cursor.finish()
    }

    fn max_chars(&self, font_size: f32) -> usize {
        let usable = (self.page_width - 2.0 * self.margin).max(font_size);
        ((usable / (font_size * AVERAGE_GLYPH_WIDTH)).floor() as usize).max(1)
    }

    fn top_baseline(&self, font_size: f32) -> f32 {
        self.page_height - self.margin - font_size
    }
}

struct Cursor<'a> {
    layout: &'a FlowLayout,
    pages: Vec<Vec<FlowLine>>,
    current: Vec<FlowLine>,
    /// Top of the next line box
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(layout: &'a FlowLayout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
            current: Vec::new(),
            y: layout.page_height - layout.margin,
        }
    }

    fn push(&mut self, text: String, font_size: f32) {
        let advance = font_size * self.layout.line_height;
        // A page always takes at least one line, however tall
        if self.y - advance < self.layout.margin && !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = self.layout.page_height - self.layout.margin;
        }
        let baseline = if self.current.is_empty() {
            self.layout.top_baseline(font_size)
        } else {
            self.y - font_size
        };
        self.current.push(FlowLine {
            text,
            x: self.layout.margin,
            y: baseline,
            font_size,
        });
        self.y -= advance;
    }

    fn skip(&mut self, points: f32) {
        self.y -= points;
    }

    fn finish(mut self) -> Vec<Vec<FlowLine>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

/// Greedy word wrap at `max_chars` characters.
///
/// A word longer than a line gets a line to itself. Whitespace inside the
/// text, line breaks included, collapses to single spaces.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= max_chars {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}
