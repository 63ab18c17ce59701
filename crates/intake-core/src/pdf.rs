//! Native PDF inspection
//!
//! The browser renders through pdf.js; native front-ends use this module to open a document
//! handle, count its pages and size the viewport for a given zoom scale.

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

use crate::error::{IntakeError, Result};

/// US Letter, used when a page has no MediaBox anywhere in its parent chain
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Page size in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Pixel size of the drawing surface at `scale`
    pub fn viewport(&self, scale: f64) -> (u32, u32) {
        (
            (self.width * scale).round().max(0.0) as u32,
            (self.height * scale).round().max(0.0) as u32,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
}

/// Loaded document, the native counterpart of a pdf.js document proxy
pub struct PdfDocument {
    document: Document,
    info: DocumentInfo,
}

impl PdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(IntakeError::PdfParse(
                "not a PDF file (missing %PDF- header)".to_string(),
            ));
        }

        let document =
            Document::load_mem(bytes).map_err(|e| IntakeError::PdfParse(e.to_string()))?;

        let info = DocumentInfo {
            page_count: document.get_pages().len() as u32,
            version: document.version.clone(),
            encrypted: document.is_encrypted(),
            size_bytes: bytes.len(),
            title: info_title(&document),
        };

        Ok(Self { document, info })
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn page_count(&self) -> u32 {
        self.info.page_count
    }

    /// Size of 1-indexed `page`
    pub fn page_size(&self, page: u32) -> Result<PageSize> {
        let page_id = self
            .document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or_else(|| {
                IntakeError::PdfParse(format!(
                    "page {} out of range (document has {} pages)",
                    page, self.info.page_count
                ))
            })?;

        let rect = self.media_box(page_id)?;
        Ok(PageSize {
            width: (rect[2] - rect[0]).abs(),
            height: (rect[3] - rect[1]).abs(),
        })
    }

    /// MediaBox of a page, inherited from the page tree when absent
    fn media_box(&self, page_id: ObjectId) -> Result<[f64; 4]> {
        let mut current = Some(page_id);

        while let Some(id) = current {
            let dict = self
                .document
                .get_dictionary(id)
                .map_err(|e| IntakeError::PdfParse(e.to_string()))?;

            if let Ok(media_box) = dict.get(b"MediaBox") {
                return self.parse_rect(media_box);
            }

            current = parent_of(dict);
        }

        Ok(DEFAULT_MEDIA_BOX)
    }

    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4]> {
        let obj = self.resolve(obj)?;
        let arr = obj
            .as_array()
            .map_err(|_| IntakeError::PdfParse("MediaBox is not an array".to_string()))?;

        if arr.len() != 4 {
            return Err(IntakeError::PdfParse(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, item) in values.iter_mut().zip(arr) {
            *slot = match self.resolve(item)? {
                Object::Integer(i) => *i as f64,
                Object::Real(r) => *r as f64,
                _ => {
                    return Err(IntakeError::PdfParse(
                        "expected number in MediaBox".to_string(),
                    ))
                }
            };
        }
        Ok(values)
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => self
                .document
                .get_object(*id)
                .map_err(|e| IntakeError::PdfParse(e.to_string())),
            other => Ok(other),
        }
    }
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").ok()?.as_reference().ok()
}

fn info_title(document: &Document) -> Option<String> {
    let info_id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = document.get_dictionary(info_id).ok()?;
    let title = info.get(b"Title").ok()?.as_str().ok()?;
    let decoded = String::from_utf8_lossy(title).into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

/// Page count of a PDF held in memory
pub fn page_count(bytes: &[u8]) -> Result<u32> {
    PdfDocument::load(bytes).map(|doc| doc.page_count())
}

/// Build an in-memory PDF with the given page sizes
#[cfg(any(test, feature = "test-fixtures"))]
pub fn sample_pdf(page_sizes: &[(i64, i64)]) -> Vec<u8> {
    use lopdf::dictionary;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_sizes
        .iter()
        .map(|(width, height)| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
            })
            .into()
        })
        .collect();

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => page_sizes.len() as i64,
        "Kids" => kids,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("sample PDF serializes");
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_counts_pages() {
        let bytes = sample_pdf(&[(612, 792), (595, 842), (612, 792)]);
        let doc = PdfDocument::load(&bytes).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.info().size_bytes, bytes.len());
        assert_eq!(page_count(&bytes).unwrap(), 3);
    }

    #[test]
    fn test_page_size_and_viewport() {
        let bytes = sample_pdf(&[(612, 792), (595, 842)]);
        let doc = PdfDocument::load(&bytes).unwrap();
        let a4 = doc.page_size(2).unwrap();
        assert_eq!(a4.width, 595.0);
        assert_eq!(a4.height, 842.0);
        assert_eq!(doc.page_size(1).unwrap().viewport(1.5), (918, 1188));
    }

    #[test]
    fn test_page_out_of_range() {
        let bytes = sample_pdf(&[(612, 792)]);
        let doc = PdfDocument::load(&bytes).unwrap();
        assert!(matches!(doc.page_size(2), Err(IntakeError::PdfParse(_))));
        assert!(doc.page_size(0).is_err());
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert!(matches!(
            PdfDocument::load(b"hello world"),
            Err(IntakeError::PdfParse(_))
        ));
        assert!(PdfDocument::load(b"%PDF-1.7 garbage").is_err());
    }
}
