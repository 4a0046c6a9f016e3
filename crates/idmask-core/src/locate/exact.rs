//! Exact detection of an identifier drawn as adjacent digit fragments.

use super::{origin, IdentifierMatch};
use crate::geometry::{glyph_scale, BoundingBox};
use crate::models::config::DetectionConfig;
use crate::pdf::TextFragment;

const MIN_SIZE: f64 = 8.0;
const HEIGHT_FACTOR: f64 = 1.2;

/// Finds a run of digit-only fragments that spells the target and sits on one line.
#[derive(Debug, Clone)]
pub struct ExactRunFinder {
    max_baseline_drift: f64,
    min_gap: f64,
    max_gap: f64,
    page_index: usize,
}

impl Default for ExactRunFinder {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

impl ExactRunFinder {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            max_baseline_drift: config.max_baseline_drift,
            min_gap: config.min_gap,
            max_gap: config.max_gap,
            page_index: config.page_index,
        }
    }

    pub fn find(&self, fragments: &[TextFragment], target: &str) -> Option<IdentifierMatch> {
        if target.is_empty() {
            return None;
        }

        let digits: Vec<&TextFragment> = fragments
            .iter()
            .filter(|f| !f.text.is_empty() && f.text.bytes().all(|b| b.is_ascii_digit()))
            .collect();

        for start in 0..digits.len() {
            let mut spelled = String::new();
            for end in start..digits.len() {
                spelled.push_str(&digits[end].text);
                if !target.starts_with(spelled.as_str()) {
                    break;
                }
                if spelled == target {
                    let run = &digits[start..=end];
                    if self.is_contiguous(run) {
                        return Some(self.to_match(run, target));
                    }
                    break;
                }
            }
        }
        None
    }

    /// Same line, and each fragment starts close to where the previous one ended.
    fn is_contiguous(&self, run: &[&TextFragment]) -> bool {
        run.windows(2).all(|pair| {
            let a = origin(pair[0]);
            let b = origin(pair[1]);
            if (a.y - b.y).abs() > self.max_baseline_drift {
                return false;
            }
            let a_right = a.x + pair[0].advance_width;
            b.x >= a_right + self.min_gap && b.x <= a_right + self.max_gap
        })
    }

    fn to_match(&self, run: &[&TextFragment], target: &str) -> IdentifierMatch {
        let first = run[0];
        let last = run[run.len() - 1];
        let left = origin(first);
        let right = origin(last).x + last.advance_width;

        IdentifierMatch {
            id_text: target.to_string(),
            bbox: BoundingBox {
                x: left.x,
                y: left.y,
                width: (right - left.x).max(MIN_SIZE),
                height: (glyph_scale(&first.transform) * HEIGHT_FACTOR).max(MIN_SIZE),
                page_index: self.page_index,
            },
        }
    }
}
