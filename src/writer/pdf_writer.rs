//! PDF document writer.
//!
//! Assembles complete PDF documents with proper structure:
//! header, body, xref table, and trailer.

use super::content_stream::ContentStreamBuilder;
use super::object_serializer::ObjectSerializer;
use super::outline_builder::OutlineBuilder;
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Write;

/// Resource name of the single text font on every page.
const FONT_RESOURCE: &str = "F1";

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Base-14 font for all text
    pub font_name: String,
    /// Whether to compress content streams
    pub compress: bool,
    /// Written as `/CreationDate` when set
    pub creation_date: Option<DateTime<Utc>>,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            creator: Some(format!("{} {}", crate::NAME, crate::VERSION)),
            font_name: "Helvetica".to_string(),
            compress: true,
            creation_date: Some(Utc::now()),
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the text font.
    pub fn with_font_name(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Enable or disable FlateDecode compression of content streams.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set or clear the creation date.
    pub fn with_creation_date(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.creation_date = date;
        self
    }
}

/// Compress data using Flate/Deflate compression.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// PDF date string, e.g. `D:20240131120000+00'00'`.
fn pdf_date(date: &DateTime<Utc>) -> String {
    date.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

/// A page being built.
pub struct PageBuilder<'a> {
    writer: &'a mut PdfWriter,
    page_index: usize,
}

impl<'a> PageBuilder<'a> {
    /// Add text with its baseline origin at `(x, y)`.
    pub fn add_text(&mut self, text: &str, x: f32, y: f32, font_size: f32) -> &mut Self {
        let page = &mut self.writer.pages[self.page_index];
        page.content_builder
            .begin_text()
            .set_font(FONT_RESOURCE, font_size)
            .text(text, x, y);
        self
    }

    /// Index of this page in the document.
    pub fn index(&self) -> usize {
        self.page_index
    }

    /// Finish building this page and return to the writer.
    pub fn finish(self) -> &'a mut PdfWriter {
        let page = &mut self.writer.pages[self.page_index];
        page.content_builder.end_text();
        self.writer
    }
}

struct PageData {
    width: f32,
    height: f32,
    content_builder: ContentStreamBuilder,
}

/// PDF document writer.
///
/// Builds a complete PDF document with pages, one font, bookmarks and
/// document info.
pub struct PdfWriter {
    config: PdfWriterConfig,
    pages: Vec<PageData>,
    outline: OutlineBuilder,
    next_obj_id: u32,
}

impl PdfWriter {
    /// Create a PDF writer with custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            outline: OutlineBuilder::new(),
            next_obj_id: 1,
        }
    }

    fn alloc_obj_id(&mut self) -> u32 {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        id
    }

    /// Add a page with the given dimensions.
    pub fn add_page(&mut self, width: f32, height: f32) -> PageBuilder<'_> {
        let page_index = self.pages.len();
        self.pages.push(PageData {
            width,
            height,
            content_builder: ContentStreamBuilder::new(),
        });
        PageBuilder {
            writer: self,
            page_index,
        }
    }

    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Add a bookmark to page `page_index`.
    pub fn add_bookmark(&mut self, title: impl Into<String>, page_index: usize) -> &mut Self {
        self.outline.item(title, page_index);
        self
    }

    /// Build the complete PDF document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer;
        let mut output = Vec::new();
        let mut xref_offsets: Vec<(u32, usize)> = Vec::new();

        writeln!(output, "%PDF-{}", self.config.version)?;
        // Binary marker
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let catalog_id = self.alloc_obj_id();
        let pages_id = self.alloc_obj_id();
        let font_id = self.alloc_obj_id();

        let page_ids: Vec<(u32, u32)> = (0..self.pages.len())
            .map(|_| (self.alloc_obj_id(), self.alloc_obj_id()))
            .collect();
        let page_refs: Vec<ObjectRef> = page_ids
            .iter()
            .map(|(page_id, _)| ObjectRef::new(*page_id, 0))
            .collect();

        let outline = self.outline.build(&page_refs, self.next_obj_id);
        if let Some(built) = &outline {
            self.next_obj_id = built.next_obj_id;
        }
        let info_id = self.alloc_obj_id();

        let font_obj = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Font")),
            ("Subtype", ObjectSerializer::name("Type1")),
            ("BaseFont", ObjectSerializer::name(&self.config.font_name)),
            ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
        ]);
        let resources = ObjectSerializer::dict(vec![(
            "Font",
            ObjectSerializer::dict(vec![(FONT_RESOURCE, ObjectSerializer::reference(font_id, 0))]),
        )]);

        let mut page_objects: Vec<(u32, Object)> = Vec::with_capacity(self.pages.len() * 2);
        for (page_data, &(page_id, content_id)) in self.pages.iter().zip(&page_ids) {
            let raw_content = page_data.content_builder.build()?;
            let (content_bytes, is_compressed) = if self.config.compress {
                (compress_data(&raw_content)?, true)
            } else {
                (raw_content, false)
            };

            let mut content_dict = HashMap::new();
            content_dict.insert("Length".to_string(), Object::Integer(content_bytes.len() as i64));
            if is_compressed {
                content_dict.insert("Filter".to_string(), Object::Name("FlateDecode".to_string()));
            }

            let page_obj = ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Page")),
                ("Parent", ObjectSerializer::reference(pages_id, 0)),
                (
                    "MediaBox",
                    ObjectSerializer::rect(0.0, 0.0, page_data.width as f64, page_data.height as f64),
                ),
                ("Contents", ObjectSerializer::reference(content_id, 0)),
                ("Resources", resources.clone()),
            ]);

            page_objects.push((page_id, page_obj));
            page_objects.push((
                content_id,
                Object::Stream {
                    dict: content_dict,
                    data: bytes::Bytes::from(content_bytes),
                },
            ));
        }

        let pages_obj = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Pages")),
            ("Kids", Object::Array(page_refs.iter().map(|r| Object::Reference(*r)).collect())),
            ("Count", ObjectSerializer::integer(self.pages.len() as i64)),
        ]);

        let mut catalog_entries = vec![
            ("Type", ObjectSerializer::name("Catalog")),
            ("Pages", ObjectSerializer::reference(pages_id, 0)),
        ];
        if let Some(built) = &outline {
            catalog_entries.push(("Outlines", Object::Reference(built.root_ref)));
            catalog_entries.push(("PageMode", ObjectSerializer::name("UseOutlines")));
        }
        let catalog_obj = ObjectSerializer::dict(catalog_entries);

        let mut info_entries = Vec::new();
        if let Some(title) = &self.config.title {
            info_entries.push(("Title", ObjectSerializer::string(title)));
        }
        if let Some(author) = &self.config.author {
            info_entries.push(("Author", ObjectSerializer::string(author)));
        }
        if let Some(creator) = &self.config.creator {
            info_entries.push(("Creator", ObjectSerializer::string(creator)));
            info_entries.push(("Producer", ObjectSerializer::string(creator)));
        }
        if let Some(date) = &self.config.creation_date {
            info_entries.push(("CreationDate", ObjectSerializer::string(&pdf_date(date))));
        }
        let info_obj = ObjectSerializer::dict(info_entries);

        let mut body: Vec<(u32, &Object)> = vec![
            (catalog_id, &catalog_obj),
            (pages_id, &pages_obj),
            (font_id, &font_obj),
        ];
        body.extend(page_objects.iter().map(|(id, obj)| (*id, obj)));
        if let Some(built) = &outline {
            let mut ids: Vec<&u32> = built.objects.keys().collect();
            ids.sort();
            body.extend(ids.into_iter().filter_map(|id| built.objects.get(id).map(|o| (*id, o))));
        }
        body.push((info_id, &info_obj));

        for (id, obj) in body {
            xref_offsets.push((id, output.len()));
            output.extend_from_slice(&serializer.serialize_indirect(id, 0, obj)?);
        }

        // Every allocated id is written, so the table is one contiguous section
        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", self.next_obj_id)?;
        writeln!(output, "0000000000 65535 f ")?;

        xref_offsets.sort_by_key(|(id, _)| *id);
        for (_, offset) in &xref_offsets {
            writeln!(output, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", ObjectSerializer::integer(self.next_obj_id as i64)),
            ("Root", ObjectSerializer::reference(catalog_id, 0)),
            ("Info", ObjectSerializer::reference(info_id, 0)),
        ]);

        writeln!(output, "trailer")?;
        output.extend_from_slice(&serializer.serialize(&trailer)?);
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!("Wrote PDF: {} pages, {} bytes", self.pages.len(), output.len());
        Ok(output)
    }
}
