//! Identifier hints taken from document file names.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// Identifier encoded in a file name.
///
/// A purely numeric stem is used as-is; otherwise the first run of at least
/// `min_digits` ASCII digits.
pub fn resolve_id_from_filename(file_name: &str, min_digits: usize) -> Option<String> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) {
        return Some(stem.to_string());
    }
    DIGIT_RUN
        .find_iter(stem)
        .find(|m| m.as_str().len() >= min_digits)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numeric_stem() {
        assert_eq!(resolve_id_from_filename("20231005.pdf", 6), Some("20231005".to_string()));
        assert_eq!(resolve_id_from_filename("0042.PDF", 6), Some("0042".to_string()));
    }

    #[test]
    fn test_embedded_digit_run() {
        assert_eq!(
            resolve_id_from_filename("invoice_12_674508_v2.pdf", 6),
            Some("674508".to_string())
        );
        assert_eq!(resolve_id_from_filename("dir/report-1234567.pdf", 6), Some("1234567".to_string()));
    }

    #[test]
    fn test_no_identifier() {
        assert_eq!(resolve_id_from_filename("report_12345.pdf", 6), None);
        assert_eq!(resolve_id_from_filename("summary.pdf", 6), None);
        assert_eq!(resolve_id_from_filename("", 6), None);
    }

    #[test]
    fn test_custom_minimum() {
        assert_eq!(resolve_id_from_filename("report_12345.pdf", 4), Some("12345".to_string()));
    }
}
