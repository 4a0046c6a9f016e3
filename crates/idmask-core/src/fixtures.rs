//! In-memory test documents and fonts.
//!
//! Shared by unit tests and mounted by the integration tests, so only
//! external crates are referenced here.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Width of every printable ASCII glyph of the fixture font (1/1000 em).
pub const GLYPH_WIDTH: i64 = 556;

/// A text run placed with `Td` inside its own text object.
#[derive(Debug, Clone)]
pub struct Run {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Run {
    pub fn new(text: &str, x: f32, y: f32) -> Self {
        Self {
            text: text.to_string(),
            x,
            y,
            size: 12.0,
        }
    }

    pub fn sized(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// Device width of `chars` fixture glyphs at `size`.
pub fn advance(chars: usize, size: f64) -> f64 {
    chars as f64 * GLYPH_WIDTH as f64 / 1000.0 * size
}

/// Single-page document showing each run with one `Tj`.
pub fn pdf_with_runs(runs: &[Run]) -> Vec<u8> {
    let mut operations = Vec::new();
    for run in runs {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), Object::Real(run.size)]));
        operations.push(Operation::new("Td", vec![Object::Real(run.x), Object::Real(run.y)]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(run.text.as_str())]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations }.encode().unwrap();
    pdf_with_pages(&[content])
}

/// Single-page document with a raw content stream.
pub fn pdf_with_content(content: &[u8]) -> Vec<u8> {
    pdf_with_pages(&[content.to_vec()])
}

/// Document with one page per content stream; `/F1` is inherited from the page tree.
pub fn pdf_with_pages(contents: &[Vec<u8>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "FirstChar" => 32,
        "LastChar" => 126,
        "Widths" => vec![Object::Integer(GLYPH_WIDTH); 95],
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.clone()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    doc.save_to(&mut data).unwrap();
    data
}

/// Advance of glyph 0 (`.notdef`) in the fixture font.
pub const NOTDEF_ADVANCE: u16 = 500;
/// Advance of every mapped glyph in the fixture font.
pub const GLYPH_ADVANCE: u16 = 1000;

const ASCII_FIRST: u32 = 0x20;
const ASCII_LAST: u32 = 0x7E;
const CJK_FIRST: u32 = 0x4E00;
const CJK_LAST: u32 = 0x9FFF;

/// Glyph id the fixture font assigns to `c`, if mapped.
pub fn fixture_glyph_id(c: char) -> Option<u16> {
    let cp = c as u32;
    let ascii_count = ASCII_LAST - ASCII_FIRST + 1;
    if (ASCII_FIRST..=ASCII_LAST).contains(&cp) {
        Some((1 + cp - ASCII_FIRST) as u16)
    } else if (CJK_FIRST..=CJK_LAST).contains(&cp) {
        Some((1 + ascii_count + cp - CJK_FIRST) as u16)
    } else {
        None
    }
}

/// A minimal TrueType font covering printable ASCII and the CJK Unified
/// Ideographs block. Every glyph outline is empty.
pub fn minimal_ttf() -> Vec<u8> {
    build_ttf(true)
}

/// The same font without `glyf`/`loca`, as a CFF-flavored face would look.
pub fn minimal_ttf_without_glyf() -> Vec<u8> {
    build_ttf(false)
}

fn build_ttf(with_glyf: bool) -> Vec<u8> {
    let ascii_count = ASCII_LAST - ASCII_FIRST + 1;
    let cjk_count = CJK_LAST - CJK_FIRST + 1;
    let num_glyphs = (1 + ascii_count + cjk_count) as u16;

    let mut cmap = Vec::new();
    put16(&mut cmap, 0); // version
    put16(&mut cmap, 1); // numTables
    put16(&mut cmap, 3); // Windows
    put16(&mut cmap, 10); // Unicode full repertoire
    put32(&mut cmap, 12);
    let groups = [
        (ASCII_FIRST, ASCII_LAST, 1),
        (CJK_FIRST, CJK_LAST, 1 + ascii_count),
    ];
    put16(&mut cmap, 12); // format
    put16(&mut cmap, 0);
    put32(&mut cmap, 16 + 12 * groups.len() as u32);
    put32(&mut cmap, 0); // language
    put32(&mut cmap, groups.len() as u32);
    for (start, end, glyph) in groups {
        put32(&mut cmap, start);
        put32(&mut cmap, end);
        put32(&mut cmap, glyph);
    }

    let mut head = Vec::new();
    put16(&mut head, 1);
    put16(&mut head, 0);
    put32(&mut head, 0x0001_0000); // fontRevision
    put32(&mut head, 0); // checksumAdjustment
    put32(&mut head, 0x5F0F_3CF5); // magic
    put16(&mut head, 0); // flags
    put16(&mut head, 1000); // unitsPerEm
    head.extend_from_slice(&[0; 16]); // created, modified
    put16(&mut head, 0); // xMin
    put16(&mut head, (-200i16) as u16); // yMin
    put16(&mut head, 1000); // xMax
    put16(&mut head, 800); // yMax
    put16(&mut head, 0); // macStyle
    put16(&mut head, 8); // lowestRecPPEM
    put16(&mut head, 2); // fontDirectionHint
    put16(&mut head, 0); // indexToLocFormat
    put16(&mut head, 0); // glyphDataFormat

    let mut hhea = Vec::new();
    put16(&mut hhea, 1);
    put16(&mut hhea, 0);
    put16(&mut hhea, 800); // ascender
    put16(&mut hhea, (-200i16) as u16); // descender
    put16(&mut hhea, 0); // lineGap
    put16(&mut hhea, GLYPH_ADVANCE); // advanceWidthMax
    put16(&mut hhea, 0);
    put16(&mut hhea, 0);
    put16(&mut hhea, 1000); // xMaxExtent
    put16(&mut hhea, 1); // caretSlopeRise
    put16(&mut hhea, 0);
    put16(&mut hhea, 0);
    hhea.extend_from_slice(&[0; 8]); // reserved
    put16(&mut hhea, 0); // metricDataFormat
    put16(&mut hhea, 2); // numberOfHMetrics

    let mut hmtx = Vec::new();
    put16(&mut hmtx, NOTDEF_ADVANCE);
    put16(&mut hmtx, 0);
    put16(&mut hmtx, GLYPH_ADVANCE);
    put16(&mut hmtx, 0);
    hmtx.extend(std::iter::repeat(0u8).take(2 * (num_glyphs as usize - 2)));

    let mut maxp = Vec::new();
    put32(&mut maxp, 0x0000_5000);
    put16(&mut maxp, num_glyphs);

    // short loca: every offset zero, so each glyph is empty
    let loca = vec![0u8; 2 * (num_glyphs as usize + 1)];
    let glyf = vec![0u8; 4];

    let mut tables: Vec<(&[u8; 4], Vec<u8>)> = vec![(b"cmap", cmap)];
    if with_glyf {
        tables.push((b"glyf", glyf));
    }
    tables.extend([(b"head", head), (b"hhea", hhea), (b"hmtx", hmtx)]);
    if with_glyf {
        tables.push((b"loca", loca));
    }
    tables.push((b"maxp", maxp));

    let mut font = Vec::new();
    put32(&mut font, 0x0001_0000);
    put16(&mut font, tables.len() as u16);
    put16(&mut font, 64); // searchRange
    put16(&mut font, 2); // entrySelector
    put16(&mut font, 16); // rangeShift

    let mut offset = 12 + 16 * tables.len() as u32;
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        put32(&mut font, 0); // checksum
        put32(&mut font, offset);
        put32(&mut font, data.len() as u32);

        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() as u32 + body.len() as u32;
    }
    font.extend_from_slice(&body);
    font
}

fn put16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}
