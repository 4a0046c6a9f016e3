//! Data models shared by the pipeline stages.

pub mod config;
pub mod outcome;

pub use config::{DetectionConfig, FontConfig, IdmaskConfig, MaskConfig, OutputConfig};
pub use outcome::{BatchReport, FileOutcome, FileStatus, MaskMode};
