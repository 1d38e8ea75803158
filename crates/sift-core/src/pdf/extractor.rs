//! PDF-backed document using lopdf and pdf-extract.

use std::path::Path;
use std::sync::OnceLock;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{Document, Result};
use crate::error::PdfError;

/// A loaded PDF.
///
/// Text comes from pdf-extract's per-page output, falling back to lopdf's own
/// text extraction for a page when pdf-extract cannot process the file.
/// Rendering returns the page's embedded raster image; vector pages without an
/// embedded image cannot be rendered.
pub struct PdfDocument {
    doc: lopdf::Document,
    raw_data: Vec<u8>,
    page_texts: OnceLock<Option<Vec<String>>>,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        Self::from_bytes(&data)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            doc,
            raw_data,
            page_texts: OnceLock::new(),
        })
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        u32::try_from(page)
            .ok()
            .and_then(|n| self.doc.get_pages().get(&n).copied())
            .ok_or(PdfError::InvalidPage(page))
    }

    fn extracted_pages(&self) -> Option<&Vec<String>> {
        self.page_texts
            .get_or_init(|| match pdf_extract::extract_text_from_mem_by_pages(&self.raw_data) {
                Ok(pages) => Some(pages),
                Err(e) => {
                    warn!("pdf-extract failed, using lopdf text extraction: {}", e);
                    None
                }
            })
            .as_ref()
    }

    fn page_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let mut images = Vec::new();
        let Some(resources) = self.page_resources(page_id) else {
            return images;
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return images;
        };
        if let Ok((_, Object::Dictionary(xobj_dict))) = self.doc.dereference(xobjects) {
            for (_name, obj_ref) in xobj_dict.iter() {
                if let Ok((_, obj)) = self.doc.dereference(obj_ref) {
                    if let Some(img) = self.decode_image(obj) {
                        images.push(img);
                    }
                }
            }
        }
        images
    }

    /// Resources dictionary for a page node, following `Parent` inheritance.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Ok(Object::Dictionary(dict)) = self.doc.get_object(node_id) else {
            return None;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = self.doc.dereference(resources) {
                return Some(res_dict.clone());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }

    fn decode_image(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
        trace!("Found image object: {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });
        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter");
                return None;
            }
            _ => {}
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");
        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        raw_to_rgba(&data, width, height, color_space)
    }
}

fn raw_to_rgba(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);
    let channels = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => return None,
    };
    if data.len() < pixels * channels {
        trace!("Image data too short: {} < {}", data.len(), pixels * channels);
        return None;
    }

    let mut rgba = Vec::with_capacity(pixels * 4);
    for chunk in data[..pixels * channels].chunks(channels) {
        match chunk {
            [r, g, b] => rgba.extend_from_slice(&[*r, *g, *b, 255]),
            [gray] => rgba.extend_from_slice(&[*gray, *gray, *gray, 255]),
            _ => return None,
        }
    }
    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

impl Document for PdfDocument {
    fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn page_text(&self, page: usize) -> Result<String> {
        self.page_id(page)?;
        if let Some(pages) = self.extracted_pages() {
            if let Some(text) = pages.get(page - 1) {
                return Ok(text.clone());
            }
        }
        self.doc
            .extract_text(&[page as u32])
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))
    }

    fn render_page(&self, page: usize, dpi: u32) -> Result<DynamicImage> {
        let page_id = self.page_id(page)?;
        let image = self
            .page_images(page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()));

        match image {
            Some(img) => {
                debug!("Page {} raster {}x{} (requested {} dpi)", page, img.width(), img.height(), dpi);
                Ok(img)
            }
            None => Err(PdfError::Render {
                page,
                reason: "page has no embedded raster image".to_string(),
            }),
        }
    }
}
