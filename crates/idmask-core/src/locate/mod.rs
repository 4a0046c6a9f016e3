//! Identifier localization: an ordered chain of detection strategies over
//! the positioned text fragments of a page.
//!
//! 1. [`DelimitedFinder`]: a fixed-length digit token between literal markers.
//! 2. [`ExactRunFinder`]: a contiguous run of digit fragments spelling the target.
//! 3. [`ContainmentFinder`]: the first fragment whose text contains the target.
//!
//! Strategies 2 and 3 need a target identifier, usually taken from the file
//! name with [`resolve_id_from_filename`].

pub mod containment;
pub mod delimited;
pub mod exact;
pub mod filename;

pub use containment::ContainmentFinder;
pub use delimited::DelimitedFinder;
pub use exact::ExactRunFinder;
pub use filename::resolve_id_from_filename;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{to_device_space, BoundingBox, DeviceCoordinate};
use crate::models::config::DetectionConfig;
use crate::pdf::TextFragment;

/// An identifier found on the page together with its baseline box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierMatch {
    pub id_text: String,
    pub bbox: BoundingBox,
}

/// Outcome of the detection chain, tagged with the strategy that matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum Detection {
    Delimited(IdentifierMatch),
    ExactRun(IdentifierMatch),
    LooseContainment(IdentifierMatch),
    NoMatch,
}

impl Detection {
    fn matched(&self) -> Option<&IdentifierMatch> {
        match self {
            Detection::Delimited(m) | Detection::ExactRun(m) | Detection::LooseContainment(m) => Some(m),
            Detection::NoMatch => None,
        }
    }

    pub fn id_text(&self) -> Option<&str> {
        self.matched().map(|m| m.id_text.as_str())
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.matched().map(|m| &m.bbox)
    }

    pub fn is_match(&self) -> bool {
        self.matched().is_some()
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Detection::Delimited(_) => "delimited",
            Detection::ExactRun(_) => "exact-run",
            Detection::LooseContainment(_) => "loose-containment",
            Detection::NoMatch => "no-match",
        }
    }
}

/// Runs the detection strategies in order; the first usable match wins.
#[derive(Debug, Clone)]
pub struct Locator {
    config: DetectionConfig,
    delimited: DelimitedFinder,
    exact: ExactRunFinder,
    containment: ContainmentFinder,
}

impl Locator {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            delimited: DelimitedFinder::from_config(&config),
            exact: ExactRunFinder::from_config(&config),
            containment: ContainmentFinder::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Identifier encoded in a document file name, if any.
    pub fn filename_id(&self, file_name: &str) -> Option<String> {
        resolve_id_from_filename(file_name, self.config.min_filename_digits)
    }

    /// Find the identifier among `fragments`.
    ///
    /// `filename_hint` is the target for the exact-run and containment
    /// strategies; without it only delimited tokens are searched.
    pub fn locate(&self, fragments: &[TextFragment], filename_hint: Option<&str>) -> Detection {
        if let Some(m) = self.delimited.find(fragments) {
            debug!("Delimited identifier {} at {:?}", m.id_text, m.bbox);
            return Detection::Delimited(m);
        }

        let Some(target) = filename_hint.filter(|t| !t.is_empty()) else {
            debug!("No delimited identifier and no filename hint");
            return Detection::NoMatch;
        };

        if let Some(m) = self.exact.find(fragments, target) {
            debug!("Exact digit run {} at {:?}", m.id_text, m.bbox);
            return Detection::ExactRun(m);
        }

        if let Some(m) = self.containment.find(fragments, target) {
            debug!("Fragment containing {} at {:?}", m.id_text, m.bbox);
            return Detection::LooseContainment(m);
        }

        debug!("Identifier {} not found in {} fragments", target, fragments.len());
        Detection::NoMatch
    }
}

/// Device-space origin of a fragment.
pub(crate) fn origin(fragment: &TextFragment) -> DeviceCoordinate {
    to_device_space(&fragment.transform, 0.0, 0.0)
}
