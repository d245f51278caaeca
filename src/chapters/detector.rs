//! Heading matching and stream segmentation.

use super::{ChapterSpan, HeadingMatch, Segmentation};
use crate::config::{HeadingPattern, ReconstructionConfig, DEFAULT_CHAPTER_TITLE};
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `Chapter <roman>`, `Chapter <n>` or `<n>. <title>` on a line of its own
    static ref STANDARD_HEADING: Regex = Regex::new(
        r"(?imR)^[ \t]*(?:chapter[ \t]+[ivxlcdm]+\b|chapter[ \t]+\d+\b|\d+\.[ \t]+.*?)[ \t]*$"
    )
    .unwrap();

    /// `Chapter <n>` on a line of its own
    static ref CHAPTER_NUMBER_HEADING: Regex =
        Regex::new(r"(?imR)^[ \t]*chapter[ \t]+\d+[ \t]*$").unwrap();
}

/// Finds chapter headings in text.
///
/// One detector serves both input shapes:
/// - [`segment`](Self::segment) partitions a whole text stream (plain-text input);
/// - [`find_page_heading`](Self::find_page_heading) decides whether one OCR page
///   opens a chapter.
///
/// Both use the same compiled pattern, so a heading means the same thing in
/// either mode.
#[derive(Debug, Clone)]
pub struct ChapterDetector {
    pattern: Regex,
    default_title: String,
    page_heading_lines: Option<usize>,
}

impl Default for ChapterDetector {
    fn default() -> Self {
        Self {
            pattern: STANDARD_HEADING.clone(),
            default_title: DEFAULT_CHAPTER_TITLE.to_string(),
            page_heading_lines: Some(1),
        }
    }
}

impl ChapterDetector {
    /// Build a detector for `pattern`.
    ///
    /// Custom patterns are compiled case-insensitive and multi-line, with
    /// `\r\n` treated as a line terminator.
    pub fn new(pattern: &HeadingPattern) -> Result<Self> {
        let pattern = match pattern {
            HeadingPattern::Standard => STANDARD_HEADING.clone(),
            HeadingPattern::ChapterNumber => CHAPTER_NUMBER_HEADING.clone(),
            HeadingPattern::Custom(source) => Regex::new(&format!("(?imR){}", source))?,
        };
        Ok(Self {
            pattern,
            ..Self::default()
        })
    }

    /// Build a detector from the reconstruction configuration.
    pub fn from_config(config: &ReconstructionConfig) -> Result<Self> {
        Ok(Self::new(&config.heading_pattern)?
            .with_default_title(config.default_title.clone())
            .with_page_heading_lines(config.page_heading_lines))
    }

    /// Title for content that precedes the first heading.
    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Restrict per-page headings to the first `lines` non-blank lines.
    pub fn with_page_heading_lines(mut self, lines: Option<usize>) -> Self {
        self.page_heading_lines = lines;
        self
    }

    /// Title used for the implicit leading chapter.
    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    /// All heading matches in `text`, in order.
    pub fn headings(&self, text: &str) -> Vec<HeadingMatch> {
        self.pattern
            .find_iter(text)
            .filter(|m| !m.as_str().trim().is_empty())
            .map(|m| HeadingMatch {
                title: m.as_str().trim().to_string(),
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    /// Partition a text stream into chapters.
    ///
    /// Every heading opens a chapter, and the text up to the next heading is
    /// its content. Non-blank text before the first heading becomes an
    /// implicit chapter titled with the default title. Blank text there is
    /// folded into the first chapter's span so that the spans still tile the
    /// whole input. Two adjacent headings give a chapter with empty content;
    /// it is kept, not dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_oxide::chapters::ChapterDetector;
    ///
    /// let text = "Intro text.\n\nChapter 1\nBody one.\n\nChapter 2\nBody two.\n";
    /// let segmentation = ChapterDetector::default().segment(text);
    ///
    /// let titles: Vec<&str> = segmentation.chapters.iter().map(|c| c.title.as_str()).collect();
    /// assert_eq!(titles, vec!["Introduction", "Chapter 1", "Chapter 2"]);
    /// assert_eq!(segmentation.chapters[0].content, "Intro text.");
    /// ```
    pub fn segment(&self, text: &str) -> Segmentation {
        let headings = self.headings(text);

        let first_start = headings.first().map(|h| h.start).unwrap_or(text.len());
        let has_preamble = headings.is_empty() || !text[..first_start].trim().is_empty();

        let preamble = has_preamble.then(|| ChapterSpan {
            title: self.default_title.clone(),
            heading: None,
            span: 0..first_start,
            content: text[..first_start].trim().to_string(),
        });

        let chapters = headings
            .iter()
            .enumerate()
            .fold(preamble.into_iter().collect::<Vec<_>>(), |mut chapters, (i, heading)| {
                let start = if i == 0 && !has_preamble { 0 } else { heading.start };
                let end = headings.get(i + 1).map(|next| next.start).unwrap_or(text.len());
                chapters.push(ChapterSpan {
                    title: heading.title.clone(),
                    heading: Some(heading.start..heading.end),
                    span: start..end,
                    content: text[heading.end..end].trim().to_string(),
                });
                chapters
            });

        if headings.is_empty() {
            log::debug!("No headings matched; whole stream is '{}'", self.default_title);
        } else {
            log::debug!("Matched {} chapter headings", headings.len());
        }

        Segmentation { chapters }
    }

    /// The heading that opens a chapter on this page, if any.
    ///
    /// With a line limit configured, only the first N non-blank lines of the
    /// page are eligible; a heading further down is treated as body text.
    pub fn find_page_heading(&self, page_text: &str) -> Option<HeadingMatch> {
        let first = self.headings(page_text).into_iter().next()?;

        match self.page_heading_lines {
            None => Some(first),
            Some(limit) => {
                let lines_before = page_text[..first.start]
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .count();
                (lines_before < limit).then_some(first)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(segmentation: &Segmentation) -> Vec<&str> {
        segmentation.chapters.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_standard_heading_shapes() {
        let detector = ChapterDetector::default();
        for heading in ["Chapter 1", "CHAPTER XIV", "chapter iv", "12. The Storm", "  Chapter 3  "] {
            assert_eq!(detector.headings(heading).len(), 1, "expected heading: {:?}", heading);
        }
        for body in [
            "Chapter One",
            "The chapter 3 ended",
            "Chapter 1: Beginnings",
            "Chapter Idle thoughts",
            "3.14 is pi",
        ] {
            assert!(detector.headings(body).is_empty(), "unexpected heading: {:?}", body);
        }
    }

    #[test]
    fn test_chapter_number_pattern_ignores_sections() {
        let detector = ChapterDetector::new(&HeadingPattern::ChapterNumber).unwrap();
        assert_eq!(detector.headings("Chapter 7\n").len(), 1);
        assert!(detector.headings("Chapter VII\n").is_empty());
        assert!(detector.headings("7. Seventh\n").is_empty());
    }

    #[test]
    fn test_custom_pattern() {
        let detector = ChapterDetector::new(&HeadingPattern::Custom(r"^part \w+$".into())).unwrap();
        let seg = detector.segment("Part One\nalpha\nPART TWO\nbeta");
        assert_eq!(titles(&seg), vec!["Part One", "PART TWO"]);
    }

    #[test]
    fn test_crlf_lines() {
        let seg = ChapterDetector::default().segment("Chapter 1\r\nBody.\r\nChapter 2\r\nMore.\r\n");
        assert_eq!(titles(&seg), vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(seg.chapters[0].content, "Body.");
    }

    #[test]
    fn test_scenario_intro_and_two_chapters() {
        let text = "Intro text.\n\nChapter 1\nBody one.\n\nChapter 2\nBody two.\n";
        let seg = ChapterDetector::default().segment(text);
        assert_eq!(titles(&seg), vec!["Introduction", "Chapter 1", "Chapter 2"]);
        assert_eq!(seg.chapters[0].content, "Intro text.");
        assert_eq!(seg.chapters[1].content, "Body one.");
        assert_eq!(seg.chapters[2].content, "Body two.");
        assert!(seg.chapters[0].heading.is_none());
        assert_eq!(seg.reconstruct(text), text);
    }

    #[test]
    fn test_no_headings_is_single_default_chapter() {
        let detector = ChapterDetector::default().with_default_title("book.txt");
        let seg = detector.segment("Just prose.\n\nMore prose.");
        assert_eq!(titles(&seg), vec!["book.txt"]);
        assert!(seg.is_implicit_only());
        assert_eq!(seg.chapters[0].paragraphs(), vec!["Just prose.", "More prose."]);
    }

    #[test]
    fn test_empty_stream() {
        let seg = ChapterDetector::default().segment("");
        assert_eq!(seg.chapters.len(), 1);
        assert_eq!(seg.chapters[0].content, "");
        assert!(seg.is_implicit_only());
    }

    #[test]
    fn test_adjacent_headings_keep_empty_chapter() {
        let text = "Chapter 1\nChapter 2\nBody two.\n";
        let seg = ChapterDetector::default().segment(text);
        assert_eq!(titles(&seg), vec!["Chapter 1", "Chapter 2"]);
        assert_eq!(seg.chapters[0].content, "");
        assert!(seg.chapters[0].paragraphs().is_empty());
        assert_eq!(seg.chapters[1].content, "Body two.");
    }

    #[test]
    fn test_blank_preamble_folds_into_first_chapter() {
        let text = "\n\n  \nChapter I\nText";
        let seg = ChapterDetector::default().segment(text);
        assert_eq!(titles(&seg), vec!["Chapter I"]);
        assert_eq!(seg.chapters[0].span, 0..text.len());
        assert_eq!(seg.boundaries()[0].start_offset, 0);
        assert_eq!(seg.chapters[0].heading, Some(5..14));
        assert_eq!(seg.reconstruct(text), text);
    }

    #[test]
    fn test_boundaries_strictly_increasing() {
        let text = "Preface\nChapter 1\na\n2. Second\nb\nChapter III\nc";
        let seg = ChapterDetector::default().segment(text);
        let offsets: Vec<usize> = seg.boundaries().iter().map(|b| b.start_offset).collect();
        assert_eq!(offsets[0], 0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(offsets.len(), 4);
    }

    #[test]
    fn test_page_heading_first_line_only() {
        let detector = ChapterDetector::default();
        assert_eq!(
            detector.find_page_heading("\n  \nChapter 2\nIt was night.").map(|h| h.title),
            Some("Chapter 2".to_string())
        );
        assert!(detector.find_page_heading("It was night.\nChapter 2\n").is_none());
    }

    #[test]
    fn test_page_heading_window() {
        let text = "17\nChapter 2\nIt was night.";
        let strict = ChapterDetector::default();
        assert!(strict.find_page_heading(text).is_none());

        let relaxed = ChapterDetector::default().with_page_heading_lines(Some(2));
        assert!(relaxed.find_page_heading(text).is_some());

        let anywhere = ChapterDetector::default().with_page_heading_lines(None);
        let found = anywhere.find_page_heading("a\nb\nc\nChapter 9\n").unwrap();
        assert_eq!(found.title, "Chapter 9");
        assert_eq!(found.start, 6);
    }

    #[test]
    fn test_blank_page_has_no_heading() {
        assert!(ChapterDetector::default().find_page_heading("").is_none());
        assert!(ChapterDetector::default().find_page_heading("\n\x0c").is_none());
    }
}
