//! Redaction compositing: an opaque white mask plus replacement text, drawn
//! above the original page content.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::embed::FontAsset;
use super::extractor::page_resources;
use super::resolve;
use crate::error::RenderError;
use crate::geometry::{to_top_left_rect, BoundingBox};
use crate::models::config::MaskConfig;

/// Width assumed for a box without horizontal extent.
const DEFAULT_BOX_WIDTH: f64 = 140.0;
/// Height assumed for a box without vertical extent.
const DEFAULT_BOX_HEIGHT: f64 = 24.0;

/// Characters that cannot appear in file names on common file systems.
const ILLEGAL_FILE_NAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Placement of the mask rectangle and the replacement text baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskLayout {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
    pub text_x: f64,
    pub baseline: f64,
}

impl MaskLayout {
    pub fn top(&self) -> f64 {
        self.bottom + self.height
    }
}

/// Compute where the mask and text go for a baseline-anchored box.
pub fn mask_layout(bbox: &BoundingBox, config: &MaskConfig) -> MaskLayout {
    let sized = BoundingBox {
        width: if bbox.width > 0.0 { bbox.width } else { DEFAULT_BOX_WIDTH },
        height: if bbox.height > 0.0 { bbox.height } else { DEFAULT_BOX_HEIGHT },
        ..*bbox
    };
    let rect = to_top_left_rect(&sized);

    let width = rect.width + config.padding_x * 2.0;
    let height = rect.height + config.padding_y * 2.0;
    let left = rect.x - config.padding_x;
    let bottom = (rect.top + config.padding_y) - height - config.bottom_margin;

    MaskLayout {
        left,
        bottom,
        width,
        height,
        text_x: left,
        baseline: bottom + height - config.baseline_offset,
    }
}

/// Replace characters that are illegal in file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILE_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Draws masks and replacement text into documents.
#[derive(Debug, Clone)]
pub struct Redactor {
    config: MaskConfig,
    font: FontAsset,
}

impl Redactor {
    pub fn new(config: MaskConfig, font: FontAsset) -> Self {
        Self { config, font }
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Mask `bbox` on its page and write `display_text` over it, returning the new document bytes.
    pub fn render(
        &self,
        data: &[u8],
        bbox: &BoundingBox,
        display_text: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::load_mem(data).map_err(|e| RenderError::Document(e.to_string()))?;
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|e| RenderError::Document(e.to_string()))?;
        }

        let out_of_range = || RenderError::Document(format!("page {} out of range", bbox.page_index));
        let page_number = u32::try_from(bbox.page_index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .ok_or_else(out_of_range)?;
        let page_id = doc.get_pages().get(&page_number).copied().ok_or_else(out_of_range)?;

        let layout = mask_layout(bbox, &self.config);
        debug!(
            "Mask rect x={:.2} y={:.2} w={:.2} h={:.2}, text baseline {:.2}",
            layout.left, layout.bottom, layout.width, layout.height, layout.baseline
        );

        let embedded = self.font.embed(&mut doc, display_text)?;
        let font_name = register_font(&mut doc, page_id, embedded.font_id)?;

        let operations = overlay_operations(&layout, &font_name, embedded.encoded, self.config.font_size);
        let overlay = Content { operations }
            .encode()
            .map_err(|e| RenderError::Document(e.to_string()))?;
        wrap_page_contents(&mut doc, page_id, overlay)?;

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| RenderError::Document(e.to_string()))?;
        Ok(out)
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn overlay_operations(layout: &MaskLayout, font_name: &[u8], encoded: Vec<u8>, font_size: f64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![1.into(), 1.into(), 1.into()]),
        Operation::new(
            "re",
            vec![real(layout.left), real(layout.bottom), real(layout.width), real(layout.height)],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
        Operation::new("Tf", vec![Object::Name(font_name.to_vec()), real(font_size)]),
        Operation::new("Td", vec![real(layout.text_x), real(layout.baseline)]),
        Operation::new("Tj", vec![Object::String(encoded, StringFormat::Hexadecimal)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Add the font to the page's own resources under an unused name.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<Vec<u8>, RenderError> {
    let mut resources = page_resources(doc, page_id).unwrap_or_default();
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve(doc, obj).as_dict().cloned().unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };

    let mut index = 0;
    let name = loop {
        let candidate = format!("FIdm{}", index).into_bytes();
        if !fonts.has(&candidate) {
            break candidate;
        }
        index += 1;
    };

    fonts.set(name.clone(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Wrap the existing content in `q … Q` and append the overlay after it.
fn wrap_page_contents(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<(), RenderError> {
    let current = page_dict_mut(doc, page_id)?.get(b"Contents").ok().cloned();

    let existing = match current {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(arr)) => arr,
        Some(Object::Stream(stream)) => vec![Object::Reference(doc.add_object(stream))],
        _ => Vec::new(),
    };

    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let mut data = b"\nQ\n".to_vec();
    data.extend_from_slice(&overlay);
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, data));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, RenderError> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RenderError::Document(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, Run};
    use crate::pdf::load_fragments;
    use pretty_assertions::assert_eq;

    fn redactor() -> Redactor {
        let font = FontAsset::from_bytes("Fixture.ttf", fixtures::minimal_ttf()).unwrap();
        Redactor::new(MaskConfig::default(), font)
    }

    #[test]
    fn test_mask_layout_defaults() {
        let bbox = BoundingBox { x: 100.0, y: 700.0, width: 60.0, height: 14.0, page_index: 0 };
        let layout = mask_layout(&bbox, &MaskConfig::default());
        assert_eq!(layout.left, 90.0);
        assert_eq!(layout.width, 80.0);
        assert_eq!(layout.height, 14.0);
        // top 714, minus height, minus 2 unit margin
        assert_eq!(layout.bottom, 698.0);
        assert_eq!(layout.top(), 712.0);
        assert_eq!(layout.baseline, 703.0);
        assert_eq!(layout.text_x, 90.0);
    }

    #[test]
    fn test_mask_layout_zero_box_uses_defaults() {
        let bbox = BoundingBox { x: 0.0, y: 0.0, width: 0.0, height: 0.0, page_index: 0 };
        let layout = mask_layout(&bbox, &MaskConfig::default());
        assert_eq!(layout.width, DEFAULT_BOX_WIDTH + 20.0);
        assert_eq!(layout.height, DEFAULT_BOX_HEIGHT);
    }

    #[test]
    fn test_mask_layout_padding_y() {
        let config = MaskConfig { padding_y: 3.0, ..MaskConfig::default() };
        let bbox = BoundingBox { x: 10.0, y: 20.0, width: 30.0, height: 10.0, page_index: 0 };
        let layout = mask_layout(&bbox, &config);
        assert_eq!(layout.height, 16.0);
        // (30 + 3) - 16 - 2
        assert_eq!(layout.bottom, 15.0);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a/b\\c:d*e?f\"g<h>i|j.pdf"), "a_b_c_d_e_f_g_h_i_j.pdf");
        assert_eq!(sanitize_file_name("田中太郎.pdf"), "田中太郎.pdf");
    }

    #[test]
    fn test_render_overlays_text_after_original_content() {
        let pdf = fixtures::pdf_with_runs(&[Run::new("##674508##", 100.0, 700.0)]);
        let bbox = BoundingBox { x: 100.0, y: 700.0, width: 66.72, height: 14.4, page_index: 0 };

        let out = redactor().render(&pdf, &bbox, "田中太郎").unwrap();
        let fragments = load_fragments(&out, 0).unwrap();

        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["##674508##", "田中太郎"]);

        let replacement = &fragments[1];
        assert!((replacement.transform[4] - 90.0).abs() < 1e-3);
        // top 714.4, bottom 698, mask top 712.4, baseline 703.4
        assert!((replacement.transform[5] - 703.4).abs() < 1e-3);
        assert!((replacement.transform[3] - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_render_keeps_inherited_fonts() {
        let pdf = fixtures::pdf_with_runs(&[Run::new("12345", 50.0, 50.0)]);
        let bbox = BoundingBox { x: 50.0, y: 50.0, width: 20.0, height: 10.0, page_index: 0 };
        let out = redactor().render(&pdf, &bbox, "A").unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let resources = page_resources(&doc, page_id).unwrap();
        let fonts = resolve(&doc, resources.get(b"Font").unwrap()).as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(b"FIdm0"));

        // original text still decodes with the inherited font
        let fragments = load_fragments(&out, 0).unwrap();
        assert_eq!(fragments[0].text, "12345");
        assert!((fragments[0].advance_width - fixtures::advance(5, 12.0)).abs() < 1e-6);
    }

    #[test]
    fn test_render_is_deterministic() {
        let pdf = fixtures::pdf_with_runs(&[Run::new("##674508##", 100.0, 700.0)]);
        let bbox = BoundingBox { x: 100.0, y: 700.0, width: 66.72, height: 14.4, page_index: 0 };
        let redactor = redactor();
        let first = redactor.render(&pdf, &bbox, "田中太郎").unwrap();
        let second = redactor.render(&pdf, &bbox, "田中太郎").unwrap();
        assert!(first == second, "redaction output differs between runs");
    }

    #[test]
    fn test_render_rejects_bad_page_and_bytes() {
        let pdf = fixtures::pdf_with_runs(&[Run::new("x", 0.0, 0.0)]);
        let bbox = BoundingBox { x: 0.0, y: 0.0, width: 1.0, height: 1.0, page_index: 5 };
        assert!(matches!(redactor().render(&pdf, &bbox, "A"), Err(RenderError::Document(_))));
        assert!(matches!(
            redactor().render(b"not a pdf", &bbox, "A"),
            Err(RenderError::Document(_))
        ));
    }

    #[test]
    fn test_render_rejects_huge_page_index() {
        let pdf = fixtures::pdf_with_runs(&[Run::new("x", 0.0, 0.0)]);
        for page_index in [u32::MAX as usize, usize::MAX] {
            let bbox = BoundingBox { x: 0.0, y: 0.0, width: 1.0, height: 1.0, page_index };
            assert!(matches!(redactor().render(&pdf, &bbox, "A"), Err(RenderError::Document(_))));
        }
    }
}
