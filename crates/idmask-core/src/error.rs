//! Error types for the idmask-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the idmask library.
#[derive(Error, Debug)]
pub enum IdmaskError {
    /// PDF parsing or text extraction error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Redaction rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Record store error.
    #[error("record store error: {0}")]
    Records(#[from] RecordError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading a document's page text.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to interpret a page content stream.
    #[error("failed to read page content: {0}")]
    Content(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page index requested (0-indexed).
    #[error("invalid page index: {0}")]
    InvalidPage(usize),
}

/// Errors raised while compositing a redaction into a document.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The TrueType font asset could not be found.
    #[error("font not found: {}", .0.display())]
    FontMissing(PathBuf),

    /// The font asset is not a usable TrueType font.
    #[error("failed to parse font: {0}")]
    FontParse(String),

    /// The source document could not be modified or serialized.
    #[error("failed to render redaction: {0}")]
    Document(String),
}

/// Errors related to loading the id → name record store.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The table header lacks a required column.
    #[error("record header must contain `id` and `name` columns, found: {0}")]
    Schema(String),

    /// The table is empty.
    #[error("record file is empty")]
    Empty,

    /// Malformed CSV content.
    #[error("failed to parse records: {0}")]
    Csv(#[from] csv::Error),

    /// The record file could not be read.
    #[error("failed to read record file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the idmask library.
pub type Result<T> = std::result::Result<T, IdmaskError>;
