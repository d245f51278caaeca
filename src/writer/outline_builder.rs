//! Document outline (bookmarks) for PDF generation.
//!
//! One flat level of entries, each jumping to a page, per ISO 32000-1
//! Section 12.3.3 (Document Outline). Chapters never nest, so neither do
//! the entries.
//!
//! # Example
//!
//! ```
//! use folio_oxide::writer::OutlineBuilder;
//! use folio_oxide::object::ObjectRef;
//!
//! let mut outline = OutlineBuilder::new();
//! outline.item("Chapter 1", 0).item("Chapter 2", 1);
//!
//! let pages = [ObjectRef::new(3, 0), ObjectRef::new(5, 0)];
//! let built = outline.build(&pages, 10).unwrap();
//! assert_eq!(built.root_ref.id, 10);
//! assert_eq!(built.next_obj_id, 13);
//! ```

use crate::object::{Object, ObjectRef};
use std::collections::HashMap;

/// A single outline entry (bookmark).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    /// Display title
    pub title: String,
    /// Destination page (0-indexed)
    pub page: usize,
}

impl OutlineItem {
    /// Create an entry pointing to a page.
    pub fn new(title: impl Into<String>, page: usize) -> Self {
        Self {
            title: title.into(),
            page,
        }
    }
}

/// Builder for document outlines.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    items: Vec<OutlineItem>,
}

/// Result of building an outline.
#[derive(Debug)]
pub struct OutlineBuildResult {
    /// Reference to the root outline object
    pub root_ref: ObjectRef,
    /// All outline objects
    pub objects: HashMap<u32, Object>,
    /// Next available object ID
    pub next_obj_id: u32,
}

impl OutlineBuilder {
    /// Create a new outline builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn add_item(&mut self, item: OutlineItem) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Append an entry with a page destination.
    pub fn item(&mut self, title: impl Into<String>, page: usize) -> &mut Self {
        self.add_item(OutlineItem::new(title, page))
    }

    /// Check if the outline is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The entries in order.
    pub fn items(&self) -> &[OutlineItem] {
        &self.items
    }

    /// Build the outline objects, numbering them from `start_obj_id`.
    ///
    /// The root takes `start_obj_id` and entries follow in order. An entry
    /// whose page has no reference gets no `/Dest`. Returns `None` for an
    /// empty outline.
    pub fn build(&self, page_refs: &[ObjectRef], start_obj_id: u32) -> Option<OutlineBuildResult> {
        if self.items.is_empty() {
            return None;
        }

        let root_id = start_obj_id;
        let item_ids: Vec<u32> = (0..self.items.len() as u32)
            .map(|i| root_id + 1 + i)
            .collect();
        let reference = |id: u32| Object::Reference(ObjectRef::new(id, 0));

        let mut objects: HashMap<u32, Object> = HashMap::new();
        for (i, item) in self.items.iter().enumerate() {
            let mut dict = HashMap::new();
            dict.insert("Title".to_string(), Object::String(outline_title(&item.title)));
            dict.insert("Parent".to_string(), reference(root_id));

            if let Some(page_ref) = page_refs.get(item.page) {
                dict.insert(
                    "Dest".to_string(),
                    Object::Array(vec![Object::Reference(*page_ref), Object::Name("Fit".to_string())]),
                );
            }
            if i > 0 {
                dict.insert("Prev".to_string(), reference(item_ids[i - 1]));
            }
            if let Some(&next) = item_ids.get(i + 1) {
                dict.insert("Next".to_string(), reference(next));
            }

            objects.insert(item_ids[i], Object::Dictionary(dict));
        }

        let first = item_ids[0];
        let last = item_ids[item_ids.len() - 1];
        let mut root_dict = HashMap::new();
        root_dict.insert("Type".to_string(), Object::Name("Outlines".to_string()));
        root_dict.insert("First".to_string(), reference(first));
        root_dict.insert("Last".to_string(), reference(last));
        root_dict.insert("Count".to_string(), Object::Integer(item_ids.len() as i64));
        objects.insert(root_id, Object::Dictionary(root_dict));

        Some(OutlineBuildResult {
            root_ref: ObjectRef::new(root_id, 0),
            objects,
            next_obj_id: last + 1,
        })
    }
}

/// Outline titles are text strings: PDFDocEncoding when ASCII, UTF-16BE otherwise.
fn outline_title(title: &str) -> Vec<u8> {
    if title.is_ascii() {
        return title.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
