//! Delimited token detection (`##674508##`), tolerant of tokens split across fragments.

use super::{origin, IdentifierMatch};
use crate::geometry::{glyph_scale, BoundingBox};
use crate::models::config::DetectionConfig;
use crate::pdf::TextFragment;

const MIN_WIDTH: f64 = 8.0;
const MIN_HEIGHT: f64 = 10.0;
const HEIGHT_FACTOR: f64 = 1.2;

/// Finds a fixed-length digit token enclosed by literal start and end markers.
#[derive(Debug, Clone)]
pub struct DelimitedFinder {
    start: String,
    end: String,
    digit_length: usize,
    page_index: usize,
}

/// Concatenated page text with the owning fragment of every byte.
struct PageText {
    text: String,
    owners: Vec<usize>,
}

impl PageText {
    fn new(fragments: &[TextFragment]) -> Self {
        let mut text = String::new();
        let mut owners = Vec::new();
        for (idx, fragment) in fragments.iter().enumerate() {
            text.push_str(&fragment.text);
            owners.extend(std::iter::repeat(idx).take(fragment.text.len()));
        }
        Self { text, owners }
    }
}

impl DelimitedFinder {
    pub fn new(start: impl Into<String>, end: impl Into<String>, digit_length: usize) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            digit_length,
            page_index: 0,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(&config.delimiter_start, &config.delimiter_end, config.digit_length).with_page_index(config.page_index)
    }

    /// Set the page index recorded in produced boxes.
    pub fn with_page_index(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }

    /// Check the token between the first start marker and the next end marker.
    ///
    /// Only the first start marker on the page is considered; a malformed
    /// token there means no match.
    pub fn find(&self, fragments: &[TextFragment]) -> Option<IdentifierMatch> {
        if self.start.is_empty() || self.end.is_empty() {
            return None;
        }
        let page = PageText::new(fragments);
        let start_pos = page.text.find(&self.start)?;
        self.token_at(&page, fragments, start_pos)
    }

    fn token_at(&self, page: &PageText, fragments: &[TextFragment], start_pos: usize) -> Option<IdentifierMatch> {
        let inner_start = start_pos + self.start.len();
        let end_pos = inner_start + page.text[inner_start..].find(&self.end)?;

        let raw = &page.text[inner_start..end_pos];
        let digits = raw.trim();
        if digits.len() != self.digit_length || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let first_byte = inner_start + (raw.len() - raw.trim_start().len());
        let last_byte = first_byte + digits.len() - 1;
        let first = &fragments[page.owners[first_byte]];
        let last = &fragments[page.owners[last_byte]];

        let left = origin(first);
        let right = origin(last).x + last.advance_width;

        Some(IdentifierMatch {
            id_text: digits.to_string(),
            bbox: BoundingBox {
                x: left.x,
                y: left.y,
                width: (right - left.x).max(MIN_WIDTH),
                height: (glyph_scale(&first.transform) * HEIGHT_FACTOR).max(MIN_HEIGHT),
                page_index: self.page_index,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::test_support::{fragment, line};
    use pretty_assertions::assert_eq;

    fn finder() -> DelimitedFinder {
        DelimitedFinder::new("##", "##", 6)
    }

    #[test]
    fn test_exact_digit_count_required() {
        for text in ["##12345##", "##1234567##", "##12a456##", "########", "##"] {
            assert_eq!(finder().find(&[fragment(text, 0.0, 0.0)]), None, "{}", text);
        }
        let m = finder().find(&[fragment("##123456##", 0.0, 0.0)]).unwrap();
        assert_eq!(m.id_text, "123456");
    }

    #[test]
    fn test_inner_whitespace_is_trimmed() {
        let fragments = line(&["## ", "674508", " ##"], 10.0, 20.0);
        let m = finder().find(&fragments).unwrap();
        assert_eq!(m.id_text, "674508");
        // box starts at the fragment holding the first digit
        assert_eq!(m.bbox.x, fragments[1].transform[4]);
    }

    #[test]
    fn test_malformed_first_token_hides_later_ones() {
        let fragments = line(&["## draft ##", " ref ", "##674508##"], 0.0, 0.0);
        assert_eq!(finder().find(&fragments), None);
    }

    #[test]
    fn test_closing_marker_is_not_reused_as_opener() {
        for text in ["##12345##678901##", "###674508##", "## draft ## ##674508##"] {
            assert_eq!(finder().find(&[fragment(text, 0.0, 0.0)]), None, "{}", text);
        }
    }

    #[test]
    fn test_distinct_markers_and_length() {
        let finder = DelimitedFinder::new("[", "]", 4).with_page_index(2);
        let m = finder.find(&[fragment("code [0042] end", 5.0, 5.0)]).unwrap();
        assert_eq!(m.id_text, "0042");
        assert_eq!(m.bbox.page_index, 2);
    }

    #[test]
    fn test_minimum_box_size() {
        let tiny = TextFragment::new("##123456##", [2.0, 0.0, 0.0, 2.0, 0.0, 0.0], 1.0);
        let m = finder().find(&[tiny]).unwrap();
        assert_eq!(m.bbox.width, MIN_WIDTH);
        assert_eq!(m.bbox.height, MIN_HEIGHT);
    }

    #[test]
    fn test_non_ascii_text_around_token() {
        let fragments = line(&["番号：", "##674508##", "様"], 0.0, 0.0);
        let m = finder().find(&fragments).unwrap();
        assert_eq!(m.id_text, "674508");
        assert_eq!(m.bbox.x, fragments[1].transform[4]);
    }
}
