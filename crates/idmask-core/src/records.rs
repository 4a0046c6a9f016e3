//! Identifier → display name lookup table loaded from CSV.
//!
//! The file encoding is detected from its byte order mark, or guessed with
//! chardetng when there is none, so tables exported as Shift_JIS or UTF-16
//! load the same as UTF-8 ones.

use std::collections::HashMap;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RecordError;

const ID_COLUMN: &str = "id";
const NAME_COLUMN: &str = "name";

/// One row of the record table. Identifiers are kept verbatim, leading zeros included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
}

/// Read-only id → record map.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: HashMap<String, Record>,
    encoding: &'static str,
    rejected: usize,
}

impl RecordStore {
    /// Load a CSV record table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let store = Self::from_bytes(&bytes)?;
        info!(
            "Loaded {} records from {} ({}, {} rejected)",
            store.len(),
            path.display(),
            store.encoding,
            store.rejected
        );
        Ok(store)
    }

    /// Parse raw CSV bytes in any supported encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        let (text, encoding) = decode(bytes);
        let mut store = Self::from_text(&text)?;
        store.encoding = encoding;
        Ok(store)
    }

    /// Parse CSV text.
    pub fn from_text(text: &str) -> Result<Self, RecordError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(RecordError::Empty);
        }

        let column = |name: &str| headers.iter().position(|h| h == name);
        let (Some(id_idx), Some(name_idx)) = (column(ID_COLUMN), column(NAME_COLUMN)) else {
            return Err(RecordError::Schema(headers.join(",")));
        };

        let mut records = HashMap::new();
        let mut rejected = 0;
        for row in reader.records() {
            let row = row?;
            let id = row.get(id_idx).unwrap_or_default();
            let name = row.get(name_idx).unwrap_or_default();
            if id.is_empty() || name.is_empty() {
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                warn!("Rejected record on line {}: empty id or name", line);
                rejected += 1;
                continue;
            }

            let record = Record {
                id: id.to_string(),
                name: name.to_string(),
            };
            if let Some(previous) = records.insert(record.id.clone(), record) {
                debug!("Duplicate record id {}, replacing {:?}", previous.id, previous.name);
            }
        }

        Ok(Self {
            records,
            encoding: encoding_rs::UTF_8.name(),
            rejected,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Display name for an identifier.
    pub fn name(&self, id: &str) -> Option<&str> {
        self.get(id).map(|r| r.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Name of the encoding the table was decoded with.
    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    /// Rows dropped for an empty id or name.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

/// Decode `bytes`, honoring a BOM and otherwise guessing the encoding.
fn decode(bytes: &[u8]) -> (String, &'static str) {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            return (text.into_owned(), encoding.name());
        }
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        warn!("Record file has bytes invalid in {}", encoding.name());
    }
    debug!("Detected record file encoding {}", encoding.name());
    (text.into_owned(), encoding.name())
}
