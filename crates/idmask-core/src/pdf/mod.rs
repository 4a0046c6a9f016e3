//! PDF processing module: positioned page text and redaction compositing.

mod cmap;
mod embed;
mod extractor;
mod fonts;
mod redact;

pub use embed::FontAsset;
pub use extractor::{load_fragments, PdfExtractor};
pub use redact::{mask_layout, sanitize_file_name, MaskLayout, Redactor};

use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// A positioned run of text as emitted by one text-showing operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Decoded text of the run.
    pub text: String,
    /// Text rendering matrix `[a, b, c, d, e, f]` at the start of the run.
    pub transform: [f64; 6],
    /// Horizontal advance of the whole run, in device units.
    pub advance_width: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, transform: [f64; 6], advance_width: f64) -> Self {
        Self {
            text: text.into(),
            transform,
            advance_width,
        }
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for page text readers.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Extract the positioned text fragments of a page (0-indexed), in content-stream order.
    fn extract_fragments(&self, page_index: usize) -> Result<Vec<TextFragment>>;
}

/// Read an integer or real operand.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Follow a reference, returning the object itself when it is not one.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    doc.dereference(obj).map(|(_, o)| o).unwrap_or(obj)
}
