//! Font resource decoding: character codes to text and glyph widths.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};
use tracing::trace;

use super::cmap::ToUnicodeMap;
use super::{number, resolve};

/// Width used by simple fonts that carry no metrics (standard 14 fonts).
const DEFAULT_SIMPLE_WIDTH: f64 = 500.0;
/// Default `/DW` of CID fonts.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub text: String,
    /// Advance in glyph space (1/1000 of the font size).
    pub width: f64,
    /// Single-byte code 32, the only code word spacing applies to.
    pub is_space: bool,
}

/// Decoder for strings shown with one font resource.
#[derive(Debug, Clone)]
pub(crate) struct FontDecoder {
    two_byte: bool,
    to_unicode: Option<ToUnicodeMap>,
    widths: HashMap<u32, f64>,
    default_width: f64,
}

impl Default for FontDecoder {
    fn default() -> Self {
        Self {
            two_byte: false,
            to_unicode: None,
            widths: HashMap::new(),
            default_width: DEFAULT_SIMPLE_WIDTH,
        }
    }
}

impl FontDecoder {
    /// Build a decoder from a `/Font` dictionary.
    pub(crate) fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = font
            .get(b"Subtype")
            .and_then(Object::as_name)
            .unwrap_or(b"Type1");
        let two_byte = subtype == b"Type0";

        let to_unicode = font
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .map(|s| {
                let data = s.decompressed_content().unwrap_or_else(|_| s.content.clone());
                ToUnicodeMap::parse(&data)
            });

        let (widths, default_width) = if two_byte {
            cid_widths(doc, font)
        } else {
            simple_widths(doc, font)
        };

        trace!(
            "Font decoder: two_byte={}, to_unicode={}, {} widths",
            two_byte,
            to_unicode.as_ref().map(ToUnicodeMap::len).unwrap_or(0),
            widths.len()
        );

        Self {
            two_byte,
            to_unicode,
            widths,
            default_width,
        }
    }

    /// Split a shown string into glyphs.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks(2)
                .map(|p| p.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        };

        codes
            .into_iter()
            .map(|code| Glyph {
                text: self.code_text(code),
                width: self.widths.get(&code).copied().unwrap_or(self.default_width),
                is_space: !self.two_byte && code == 32,
            })
            .collect()
    }

    fn code_text(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(code)) {
            return text.to_string();
        }
        // Latin-1 for simple fonts, raw code point for CID fonts without a map
        char::from_u32(code)
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string()
    }
}

fn simple_widths(doc: &Document, font: &Dictionary) -> (HashMap<u32, f64>, f64) {
    let mut widths = HashMap::new();
    let first_char = font
        .get(b"FirstChar")
        .ok()
        .and_then(number)
        .unwrap_or(0.0) as u32;

    if let Ok(Object::Array(arr)) = font.get(b"Widths").map(|o| resolve(doc, o)) {
        for (i, w) in arr.iter().enumerate() {
            if let Some(w) = number(resolve(doc, w)) {
                widths.insert(first_char + i as u32, w);
            }
        }
    }

    let missing = font
        .get(b"FontDescriptor")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .and_then(|d| d.get(b"MissingWidth").ok())
        .and_then(number)
        .filter(|w| *w > 0.0)
        .unwrap_or(DEFAULT_SIMPLE_WIDTH);

    (widths, missing)
}

fn cid_widths(doc: &Document, font: &Dictionary) -> (HashMap<u32, f64>, f64) {
    let mut widths = HashMap::new();

    let descendant = font
        .get(b"DescendantFonts")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok());

    let Some(cid_font) = descendant else {
        return (widths, DEFAULT_CID_WIDTH);
    };

    let default_width = cid_font
        .get(b"DW")
        .ok()
        .and_then(number)
        .unwrap_or(DEFAULT_CID_WIDTH);

    if let Ok(Object::Array(w)) = cid_font.get(b"W").map(|o| resolve(doc, o)) {
        let mut i = 0;
        while i < w.len() {
            let Some(first) = number(resolve(doc, &w[i])) else {
                break;
            };
            let first = first as u32;
            match w.get(i + 1).map(|o| resolve(doc, o)) {
                // c [w1 w2 ...]
                Some(Object::Array(run)) => {
                    for (k, v) in run.iter().enumerate() {
                        if let Some(v) = number(resolve(doc, v)) {
                            widths.insert(first.saturating_add(k as u32), v);
                        }
                    }
                    i += 2;
                }
                // c_first c_last w
                Some(last) => {
                    let (Some(last), Some(v)) = (number(last), w.get(i + 2).and_then(number)) else {
                        break;
                    };
                    for code in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                        widths.insert(code, v);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    (widths, default_width)
}
