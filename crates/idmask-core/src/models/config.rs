//! Configuration structures for the redaction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::geometry::BoundingBox;

/// Main configuration for the idmask pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdmaskConfig {
    /// Identifier detection configuration.
    pub detection: DetectionConfig,

    /// Mask and replacement text configuration.
    pub mask: MaskConfig,

    /// Font asset configuration.
    pub font: FontConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Identifier detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Page searched for the identifier (0-indexed).
    pub page_index: usize,

    /// Literal marker opening a delimited identifier.
    pub delimiter_start: String,

    /// Literal marker closing a delimited identifier.
    pub delimiter_end: String,

    /// Exact number of digits between the delimiters.
    pub digit_length: usize,

    /// Maximum baseline deviation between adjacent digit fragments.
    pub max_baseline_drift: f64,

    /// Smallest allowed gap after the previous fragment's right edge (may be negative).
    pub min_gap: f64,

    /// Largest allowed gap after the previous fragment's right edge.
    pub max_gap: f64,

    /// Minimum digit run accepted from a non-numeric file name.
    pub min_filename_digits: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            page_index: 0,
            delimiter_start: "##".to_string(),
            delimiter_end: "##".to_string(),
            digit_length: 6,
            max_baseline_drift: 2.0,
            min_gap: -1.0,
            max_gap: 8.0,
            min_filename_digits: 6,
        }
    }
}

/// Geometry of the white mask and the replacement text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Horizontal padding on each side of the detected box.
    pub padding_x: f64,

    /// Vertical padding above and below the detected box.
    pub padding_y: f64,

    /// Extra downward extension of the mask, covers descenders.
    pub bottom_margin: f64,

    /// Replacement text size.
    pub font_size: f64,

    /// Distance from the mask top down to the replacement text baseline.
    pub baseline_offset: f64,

    /// Box used when a name was resolved but no position was detected.
    pub fallback_box: BoundingBox,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            padding_x: 10.0,
            padding_y: 0.0,
            bottom_margin: 2.0,
            font_size: 8.0,
            baseline_offset: 9.0,
            fallback_box: BoundingBox {
                x: 400.0,
                y: 760.0,
                width: 150.0,
                height: 26.0,
                page_index: 0,
            },
        }
    }
}

/// TrueType font used for the replacement text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Explicit font path; searched for in the default locations when unset.
    pub path: Option<PathBuf>,

    /// Font file name looked up in the default locations.
    pub file_name: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            file_name: "NotoSansJP-Regular.ttf".to_string(),
        }
    }
}

/// Output directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix of the timestamped output directory created inside the input directory.
    pub dir_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_prefix: "Output_".to_string(),
        }
    }
}

impl IdmaskConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
