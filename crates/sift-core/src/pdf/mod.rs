//! Document access: the page contract consumed by extraction and table strategies.

mod extractor;

pub use extractor::PdfDocument;

use std::path::Path;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for page operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A paged document. Page numbers are 1-indexed.
pub trait Document: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract the text layer of one page.
    fn page_text(&self, page: usize) -> Result<String>;

    /// Produce a raster image of one page at the requested resolution.
    fn render_page(&self, page: usize, dpi: u32) -> Result<DynamicImage>;

    /// Iterate over the pages in order.
    fn pages(&self) -> Pages<'_>
    where
        Self: Sized,
    {
        Pages::new(self)
    }
}

/// Borrowed handle to one page of a [`Document`].
#[derive(Clone, Copy)]
pub struct PageRef<'a> {
    doc: &'a dyn Document,
    /// Page number (1-indexed).
    pub number: usize,
}

impl<'a> PageRef<'a> {
    pub fn text(&self) -> Result<String> {
        self.doc.page_text(self.number)
    }

    pub fn render(&self, dpi: u32) -> Result<DynamicImage> {
        self.doc.render_page(self.number, dpi)
    }
}

/// Iterator over the pages of a document.
pub struct Pages<'a> {
    doc: &'a dyn Document,
    next: usize,
    count: usize,
}

impl<'a> Pages<'a> {
    pub fn new(doc: &'a dyn Document) -> Self {
        Self {
            doc,
            next: 1,
            count: doc.page_count(),
        }
    }
}

impl<'a> Iterator for Pages<'a> {
    type Item = PageRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.count {
            return None;
        }
        let page = PageRef {
            doc: self.doc,
            number: self.next,
        };
        self.next += 1;
        Some(page)
    }
}

/// In-memory document built from page strings, with optional page images.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<String>,
    images: Vec<Option<DynamicImage>>,
}

impl MemoryDocument {
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages: Vec<String> = pages.into_iter().map(Into::into).collect();
        let images = vec![None; pages.len()];
        Self { pages, images }
    }

    /// Split plain text into pages on form feed characters.
    pub fn from_text(text: &str) -> Self {
        Self::from_pages(text.split('\u{c}'))
    }

    /// Load a plain text file.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_text(&std::fs::read_to_string(path)?))
    }

    /// Attach a raster image to a page, returned by `render_page` at any DPI.
    pub fn with_page_image(mut self, page: usize, image: DynamicImage) -> Self {
        if let Some(slot) = page.checked_sub(1).and_then(|i| self.images.get_mut(i)) {
            *slot = Some(image);
        }
        self
    }
}

impl Document for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page: usize) -> Result<String> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or(PdfError::InvalidPage(page))
    }

    fn render_page(&self, page: usize, _dpi: u32) -> Result<DynamicImage> {
        let slot = page
            .checked_sub(1)
            .and_then(|i| self.images.get(i))
            .ok_or(PdfError::InvalidPage(page))?;
        slot.clone().ok_or_else(|| PdfError::Render {
            page,
            reason: "no image attached to page".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_splits_on_form_feed() {
        let doc = MemoryDocument::from_text("first page\u{c}second page");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_text(2).unwrap(), "second page");
    }

    #[test]
    fn test_pages_iterator_is_one_indexed() {
        let doc = MemoryDocument::from_pages(["a", "b", "c"]);
        let numbers: Vec<usize> = doc.pages().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(doc.pages().nth(1).unwrap().text().unwrap(), "b");
    }

    #[test]
    fn test_out_of_range_page() {
        let doc = MemoryDocument::from_pages(["only"]);
        assert!(matches!(doc.page_text(0), Err(PdfError::InvalidPage(0))));
        assert!(matches!(doc.page_text(2), Err(PdfError::InvalidPage(2))));
    }

    #[test]
    fn test_render_without_image_fails() {
        let doc = MemoryDocument::from_pages(["only"]);
        assert!(matches!(doc.render_page(1, 200), Err(PdfError::Render { page: 1, .. })));

        let doc = doc.with_page_image(1, DynamicImage::new_rgb8(4, 4));
        assert_eq!(doc.render_page(1, 200).unwrap().width(), 4);
    }
}
