//! Core library for identifier redaction in generated PDF documents.
//!
//! This crate provides:
//! - Positioned page text extraction from PDF content streams
//! - Identifier localization with delimited, exact-run and containment strategies
//! - Redaction compositing (white mask plus replacement text in an embedded font)
//! - CSV record tables with encoding detection
//! - Batch orchestration with per-document outcomes

pub mod batch;
pub mod error;
pub mod geometry;
pub mod locate;
pub mod models;
pub mod pdf;
pub mod records;

#[cfg(test)]
mod fixtures;

pub use batch::{convert_all, list_documents, process_document, Batch};
pub use error::{IdmaskError, PdfError, RecordError, RenderError, Result};
pub use geometry::{to_device_space, to_top_left_rect, BoundingBox, DeviceCoordinate, TopLeftRect};
pub use locate::{resolve_id_from_filename, Detection, IdentifierMatch, Locator};
pub use models::config::IdmaskConfig;
pub use models::outcome::{BatchReport, FileOutcome, FileStatus, MaskMode};
pub use pdf::{FontAsset, PdfExtractor, PdfProcessor, Redactor, TextFragment};
pub use records::{Record, RecordStore};
