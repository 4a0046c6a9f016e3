//! Batch orchestration: every PDF of a directory through locate → lookup → redact.
//!
//! Documents are processed one at a time in file-name order. A failure in one
//! document becomes an `error` outcome and the batch moves on; only missing
//! preconditions (record table, font, output directory) abort the run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use glob::{glob, Pattern};
use tracing::{debug, info, warn};

use crate::error::{IdmaskError, Result};
use crate::geometry::BoundingBox;
use crate::locate::Locator;
use crate::models::config::IdmaskConfig;
use crate::models::outcome::{BatchReport, FileOutcome, MaskMode};
use crate::pdf::{load_fragments, sanitize_file_name, FontAsset, Redactor};
use crate::records::RecordStore;

/// Skip reason when neither the page nor the file name yields an identifier.
pub const REASON_NO_IDENTIFIER: &str = "no identifier found";
/// Skip reason when the identifier has no record.
pub const REASON_NOT_IN_RECORDS: &str = "identifier not found in records";

/// PDF files directly inside `dir`, sorted by file name.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IdmaskError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("input directory not found: {}", dir.display()),
        )));
    }
    let dir_str = dir
        .to_str()
        .ok_or_else(|| IdmaskError::Config(format!("non UTF-8 input path: {}", dir.display())))?;

    let pattern = format!("{}/*", Pattern::escape(dir_str));
    let mut files: Vec<PathBuf> = glob(&pattern)
        .map_err(|e| IdmaskError::Config(e.to_string()))?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Name of a timestamped output directory, e.g. `Output_202610171234`.
pub fn output_dir_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}{}", prefix, at.format("%Y%m%d%H%M"))
}

/// Default output directory inside `input_dir`, stamped with the current UTC time.
pub fn default_output_dir(input_dir: &Path, prefix: &str) -> PathBuf {
    input_dir.join(output_dir_name(prefix, Utc::now()))
}

/// A batch with all preconditions checked, ready to run.
pub struct Batch {
    documents: Vec<PathBuf>,
    out_dir: PathBuf,
    records: RecordStore,
    locator: Locator,
    redactor: Redactor,
}

impl Batch {
    /// Load the record table and font, list the inputs and create the output directory.
    pub fn prepare(
        input_dir: &Path,
        record_path: &Path,
        output_dir: Option<&Path>,
        config: &IdmaskConfig,
    ) -> Result<Self> {
        let records = RecordStore::load(record_path)?;
        let font = FontAsset::resolve(&config.font)?;
        let documents = list_documents(input_dir)?;

        let out_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_output_dir(input_dir, &config.output.dir_prefix),
        };
        fs::create_dir_all(&out_dir)?;

        info!(
            "Prepared batch of {} documents from {} into {}",
            documents.len(),
            input_dir.display(),
            out_dir.display()
        );

        Ok(Self {
            documents,
            out_dir,
            records,
            locator: Locator::new(config.detection.clone()),
            redactor: Redactor::new(config.mask.clone(), font),
        })
    }

    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Process every document in order, reporting each outcome as it is produced.
    pub fn run<F>(self, mut on_outcome: F) -> BatchReport
    where
        F: FnMut(&Path, &FileOutcome),
    {
        let mut results = Vec::with_capacity(self.documents.len());
        for path in &self.documents {
            let outcome = process_document(path, &self.records, &self.locator, &self.redactor, &self.out_dir);
            on_outcome(path, &outcome);
            results.push(outcome);
        }
        BatchReport::new(self.out_dir, results)
    }
}

/// Redact every PDF in `input_dir`, replacing identifiers with names from `record_path`.
pub fn convert_all(
    input_dir: &Path,
    record_path: &Path,
    output_dir: Option<&Path>,
    config: &IdmaskConfig,
) -> Result<BatchReport> {
    let batch = Batch::prepare(input_dir, record_path, output_dir, config)?;
    Ok(batch.run(|_, _| {}))
}

/// Run one document through the pipeline. Never fails; errors become the outcome.
pub fn process_document(
    path: &Path,
    records: &RecordStore,
    locator: &Locator,
    redactor: &Redactor,
    out_dir: &Path,
) -> FileOutcome {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match redact_document(path, &file, records, locator, redactor, out_dir) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Failed to process {}: {}", file, e);
            FileOutcome::error(file, e.to_string())
        }
    }
}

fn redact_document(
    path: &Path,
    file: &str,
    records: &RecordStore,
    locator: &Locator,
    redactor: &Redactor,
    out_dir: &Path,
) -> Result<FileOutcome> {
    let data = fs::read(path)?;
    let fragments = load_fragments(&data, locator.config().page_index)?;

    let filename_id = locator.filename_id(file);
    let detection = locator.locate(&fragments, filename_id.as_deref());
    debug!("{}: {} (filename id {:?})", file, detection.strategy(), filename_id);

    let Some(id) = detection.id_text().map(str::to_string).or(filename_id) else {
        return Ok(FileOutcome::skipped(file, REASON_NO_IDENTIFIER));
    };
    let Some(name) = records.name(&id) else {
        debug!("{}: identifier {} has no record", file, id);
        return Ok(FileOutcome::skipped(file, REASON_NOT_IN_RECORDS));
    };

    let (bbox, mode): (BoundingBox, MaskMode) = match detection.bbox() {
        Some(bbox) => (*bbox, MaskMode::MaskByDetect),
        None => (redactor.config().fallback_box, MaskMode::MaskByFallback),
    };

    let output = redactor.render(&data, &bbox, name)?;
    let out_path = out_dir.join(format!("{}.pdf", sanitize_file_name(name)));
    if out_path.exists() {
        warn!("Overwriting existing output {}", out_path.display());
    }
    fs::write(&out_path, output)?;

    info!("Wrote {} ({}) for {}", out_path.display(), mode, file);
    Ok(FileOutcome::ok(file, mode, out_path))
}
