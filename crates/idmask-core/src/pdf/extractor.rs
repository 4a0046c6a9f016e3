//! Positioned text extraction from page content streams using lopdf.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::fonts::FontDecoder;
use super::{number, resolve, PdfProcessor, Result, TextFragment};
use crate::error::PdfError;
use crate::geometry::Matrix;

/// Page text reader backed by lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
}

/// Load the text fragments of one page from raw PDF bytes.
pub fn load_fragments(data: &[u8], page_index: usize) -> Result<Vec<TextFragment>> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;
    extractor.extract_fragments(page_index)
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self { document: None }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, doc: &Document, page_index: usize) -> Result<ObjectId> {
        let page_number = u32::try_from(page_index)
            .ok()
            .and_then(|i| i.checked_add(1))
            .ok_or(PdfError::InvalidPage(page_index))?;
        doc.get_pages()
            .get(&page_number)
            .copied()
            .ok_or(PdfError::InvalidPage(page_index))
    }

    /// Decoders for every font in the page resources, keyed by resource name.
    fn page_fonts(&self, doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, FontDecoder> {
        let mut fonts = HashMap::new();
        let Some(resources) = page_resources(doc, page_id) else {
            return fonts;
        };

        if let Ok(Object::Dictionary(font_dict)) = resources.get(b"Font").map(|o| resolve(doc, o)) {
            for (name, font_ref) in font_dict.iter() {
                if let Ok(font) = resolve(doc, font_ref).as_dict() {
                    fonts.insert(name.clone(), FontDecoder::from_dict(doc, font));
                }
            }
        }

        debug!("Loaded {} font decoders for page {:?}", fonts.len(), page_id);
        fonts
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn extract_fragments(&self, page_index: usize) -> Result<Vec<TextFragment>> {
        let doc = self.document()?;
        let page_id = self.page_id(doc, page_index)?;

        let data = doc
            .get_page_content(page_id)
            .map_err(|e| PdfError::Content(e.to_string()))?;
        let content = Content::decode(&data).map_err(|e| PdfError::Content(e.to_string()))?;

        let fonts = self.page_fonts(doc, page_id);
        let mut interpreter = TextInterpreter::new(&fonts);
        for op in &content.operations {
            interpreter.apply(&op.operator, &op.operands);
        }

        let fragments = interpreter.fragments;
        debug!("Extracted {} text fragments from page {}", fragments.len(), page_index);
        Ok(fragments)
    }
}

/// Get resources dictionary for a page, handling inheritance.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut node_id = page_id;
    // bounded walk up the page tree
    for _ in 0..64 {
        let dict = doc.get_object(node_id).ok()?.as_dict().ok()?;
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok(res_dict) = resolve(doc, resources).as_dict() {
                return Some(res_dict.clone());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return None,
        }
    }
    None
}

/// Graphics state parameters that affect text placement.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Vec<u8>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

enum ShowItem<'a> {
    Text(&'a [u8]),
    Adjust(f64),
}

/// Executes the text-related subset of the content stream operators.
struct TextInterpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, FontDecoder>,
    fallback_font: FontDecoder,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    fragments: Vec<TextFragment>,
}

impl<'a> TextInterpreter<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, FontDecoder>) -> Self {
        Self {
            fonts,
            fallback_font: FontDecoder::default(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            fragments: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let nums: Vec<f64> = operands.iter().filter_map(number).collect();

        match operator {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" if nums.len() >= 6 => {
                let m = Matrix::new(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                self.state.ctm = m.multiply(&self.state.ctm);
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tm" if nums.len() >= 6 => {
                self.text_matrix = Matrix::new(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                self.line_matrix = self.text_matrix;
            }
            "Td" if nums.len() >= 2 => self.move_line(nums[0], nums[1]),
            "TD" if nums.len() >= 2 => {
                self.state.leading = -nums[1];
                self.move_line(nums[0], nums[1]);
            }
            "T*" => self.next_line(),
            "TL" if !nums.is_empty() => self.state.leading = nums[0],
            "Tc" if !nums.is_empty() => self.state.char_spacing = nums[0],
            "Tw" if !nums.is_empty() => self.state.word_spacing = nums[0],
            "Tz" if !nums.is_empty() => self.state.horizontal_scaling = nums[0] / 100.0,
            "Ts" if !nums.is_empty() => self.state.rise = nums[0],
            "Tf" if operands.len() >= 2 => {
                self.state.font = operands[0].as_name().ok().map(<[u8]>::to_vec);
                if let Some(size) = number(&operands[1]) {
                    self.state.font_size = size;
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "\"" if operands.len() >= 3 => {
                if let (Some(aw), Some(ac)) = (number(&operands[0]), number(&operands[1])) {
                    self.state.word_spacing = aw;
                    self.state.char_spacing = ac;
                }
                self.next_line();
                if let Object::String(bytes, _) = &operands[2] {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let items: Vec<ShowItem> = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(bytes, _) => Some(ShowItem::Text(bytes)),
                            other => number(other).map(ShowItem::Adjust),
                        })
                        .collect();
                    self.show(&items);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.move_line(0.0, -leading);
    }

    fn show(&mut self, items: &[ShowItem]) {
        let state = &self.state;
        let decoder = state
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback_font);

        let size = state.font_size;
        let th = state.horizontal_scaling;
        let rendering = Matrix::new(size * th, 0.0, 0.0, size, 0.0, state.rise)
            .multiply(&self.text_matrix)
            .multiply(&state.ctm);

        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                ShowItem::Text(bytes) => {
                    for glyph in decoder.decode(bytes) {
                        let spacing = if glyph.is_space {
                            state.char_spacing + state.word_spacing
                        } else {
                            state.char_spacing
                        };
                        advance += (glyph.width / 1000.0 * size + spacing) * th;
                        text.push_str(&glyph.text);
                    }
                }
                ShowItem::Adjust(n) => advance -= n / 1000.0 * size * th,
            }
        }

        let device_scale = self.text_matrix.multiply(&state.ctm).x_scale();
        let advance_width = advance * device_scale;
        self.text_matrix = Matrix::translation(advance, 0.0).multiply(&self.text_matrix);

        if text.is_empty() {
            return;
        }
        trace!("Fragment {:?} at {:?}, width {:.3}", text, rendering.0, advance_width);
        self.fragments.push(TextFragment::new(text, rendering.0, advance_width));
    }
}
