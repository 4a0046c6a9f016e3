//! Loose detection: the whole fragment that contains the target text.

use super::{origin, IdentifierMatch};
use crate::geometry::{glyph_scale, BoundingBox};
use crate::models::config::DetectionConfig;
use crate::pdf::TextFragment;

/// Glyph size assumed when a fragment's transform has no vertical extent.
const DEFAULT_GLYPH_SIZE: f64 = 12.0;
/// Average glyph width as a share of the glyph size.
const AVERAGE_CHAR_WIDTH: f64 = 0.6;
const HEIGHT_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Default)]
pub struct ContainmentFinder {
    page_index: usize,
}

impl ContainmentFinder {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            page_index: config.page_index,
        }
    }

    /// Box of the first fragment, in stream order, whose text contains `target`.
    pub fn find(&self, fragments: &[TextFragment], target: &str) -> Option<IdentifierMatch> {
        if target.is_empty() {
            return None;
        }
        let fragment = fragments
            .iter()
            .find(|f| !f.text.is_empty() && f.text.contains(target))?;

        let start = origin(fragment);
        let size = match glyph_scale(&fragment.transform) {
            s if s > 0.0 => s,
            _ => DEFAULT_GLYPH_SIZE,
        };
        let width = if fragment.advance_width > 0.0 {
            fragment.advance_width
        } else {
            size * fragment.text.chars().count() as f64 * AVERAGE_CHAR_WIDTH
        };

        Some(IdentifierMatch {
            id_text: target.to_string(),
            bbox: BoundingBox {
                x: start.x,
                y: start.y,
                width,
                height: size * HEIGHT_FACTOR,
                page_index: self.page_index,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::test_support::fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_containing_fragment_wins() {
        let fragments = vec![
            fragment("header", 0.0, 800.0),
            fragment("ID 674508", 30.0, 700.0),
            fragment("674508", 300.0, 100.0),
        ];
        let m = ContainmentFinder::default().find(&fragments, "674508").unwrap();
        assert_eq!(m.bbox.x, 30.0);
        assert_eq!(m.bbox.y, 700.0);
        assert_eq!(m.bbox.width, fragments[1].advance_width);
    }

    #[test]
    fn test_width_estimated_without_advance() {
        let fragments = vec![TextFragment::new("x674508", [10.0, 0.0, 0.0, 10.0, 5.0, 6.0], 0.0)];
        let m = ContainmentFinder::default().find(&fragments, "674508").unwrap();
        assert!((m.bbox.width - 42.0).abs() < 1e-9);
        assert!((m.bbox.height - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_transform_uses_default_size() {
        let fragments = vec![TextFragment::new("674508", [0.0; 6], 0.0)];
        let m = ContainmentFinder::default().find(&fragments, "674508").unwrap();
        assert!((m.bbox.height - 14.4).abs() < 1e-9);
        assert!((m.bbox.width - 43.2).abs() < 1e-9);
    }

    #[test]
    fn test_no_containing_fragment() {
        let fragments = vec![fragment("67450", 0.0, 0.0), fragment("8", 30.0, 0.0)];
        assert_eq!(ContainmentFinder::default().find(&fragments, "674508"), None);
    }
}
