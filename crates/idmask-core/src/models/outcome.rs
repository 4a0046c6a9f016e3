//! Per-document outcomes accumulated by a batch run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Final status of one input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// A redacted copy was written.
    Ok,
    /// Nothing was written; see `reason`.
    Skipped,
    /// Processing failed; see `error`.
    Error,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Ok => write!(f, "ok"),
            FileStatus::Skipped => write!(f, "skipped"),
            FileStatus::Error => write!(f, "error"),
        }
    }
}

/// Where the mask of a successful document was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskMode {
    /// At the box found by the locator.
    MaskByDetect,
    /// At the configured fallback box.
    MaskByFallback,
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskMode::MaskByDetect => write!(f, "mask-by-detect"),
            MaskMode::MaskByFallback => write!(f, "mask-by-fallback"),
        }
    }
}

/// Outcome for a single input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    /// Input file name.
    pub file: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MaskMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn ok(file: impl Into<String>, mode: MaskMode, out_path: PathBuf) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Ok,
            mode: Some(mode),
            out_path: Some(out_path),
            reason: None,
            error: None,
        }
    }

    pub fn skipped(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Skipped,
            mode: None,
            out_path: None,
            reason: Some(reason.into()),
            error: None,
        }
    }

    pub fn error(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Error,
            mode: None,
            out_path: None,
            reason: None,
            error: Some(error.into()),
        }
    }
}

/// Result of a whole batch run, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Directory the redacted documents were written to.
    pub out_dir: PathBuf,
    /// Number of documents processed.
    pub count: usize,
    pub results: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(out_dir: PathBuf, results: Vec<FileOutcome>) -> Self {
        Self {
            out_dir,
            count: results.len(),
            results,
        }
    }

    /// Number of outcomes with the given status.
    pub fn count_status(&self, status: FileStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
