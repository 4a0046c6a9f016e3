//! TrueType font asset loading and full (non-subset) embedding as a Type0 font.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};
use ttf_parser::{Face, GlyphId};

use crate::error::RenderError;
use crate::models::config::FontConfig;

/// Entries per `beginbfchar` block allowed by the CMap format.
const BFCHAR_BLOCK: usize = 100;

/// A validated TrueType font file held in memory.
#[derive(Debug, Clone)]
pub struct FontAsset {
    path: PathBuf,
    data: Arc<[u8]>,
}

/// Objects added to a document for one piece of replacement text.
#[derive(Debug, Clone)]
pub(crate) struct EmbeddedText {
    /// The Type0 font dictionary.
    pub font_id: ObjectId,
    /// The text as big-endian glyph ids (`Identity-H`).
    pub encoded: Vec<u8>,
}

impl FontAsset {
    /// Load and validate a font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RenderError::FontMissing(path.to_path_buf()));
        }
        let data = std::fs::read(path).map_err(|_| RenderError::FontMissing(path.to_path_buf()))?;
        Self::from_bytes(path, data)
    }

    /// Validate font bytes; `path` only names the asset.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Result<Self, RenderError> {
        let face = Face::parse(&data, 0).map_err(|e| RenderError::FontParse(e.to_string()))?;
        if face.tables().glyf.is_none() {
            return Err(RenderError::FontParse(
                "no TrueType outlines (glyf table)".to_string(),
            ));
        }
        Ok(Self {
            path: path.into(),
            data: data.into(),
        })
    }

    /// Find and load the font named by the configuration.
    pub fn resolve(config: &FontConfig) -> Result<Self, RenderError> {
        let candidates = Self::candidate_paths(config);
        for candidate in &candidates {
            if candidate.is_file() {
                debug!("Using font {}", candidate.display());
                return Self::load(candidate);
            }
        }
        let first = candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| PathBuf::from(&config.file_name));
        Err(RenderError::FontMissing(first))
    }

    /// Locations searched for the font, most specific first.
    pub fn candidate_paths(config: &FontConfig) -> Vec<PathBuf> {
        if let Some(path) = &config.path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join("assets").join("fonts").join(&config.file_name));
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir.join("fonts").join(&config.file_name));
            paths.push(exe_dir.join("resources").join("fonts").join(&config.file_name));
            // macOS app bundle: Contents/MacOS/<exe> -> Contents/Resources
            if let Some(contents_dir) = exe_dir.parent() {
                paths.push(contents_dir.join("Resources").join("fonts").join(&config.file_name));
            }
        }
        paths
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn base_font_name(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let name: String = stem
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        if name.is_empty() {
            "EmbeddedFont".to_string()
        } else {
            name
        }
    }

    /// Add the whole font to `doc` and encode `text` against it.
    pub(crate) fn embed(&self, doc: &mut Document, text: &str) -> Result<EmbeddedText, RenderError> {
        let face = Face::parse(&self.data, 0).map_err(|e| RenderError::FontParse(e.to_string()))?;
        let scale = 1000.0 / face.units_per_em() as f64;
        let to_pdf = |v: i16| (v as f64 * scale).round() as i64;

        let mut encoded = Vec::with_capacity(text.len() * 2);
        let mut used: BTreeMap<u16, (i64, String)> = BTreeMap::new();
        for ch in text.chars() {
            let gid = match face.glyph_index(ch) {
                Some(g) => g.0,
                None => {
                    warn!("Font {} has no glyph for {:?}", self.path.display(), ch);
                    0
                }
            };
            encoded.extend_from_slice(&gid.to_be_bytes());
            let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
            used.entry(gid)
                .or_insert_with(|| ((advance as f64 * scale).round() as i64, String::new()))
                .1
                .push(ch);
        }

        let base_font = self.base_font_name();
        let bbox = face.global_bounding_box();
        let ascent = to_pdf(face.ascender());
        let descent = to_pdf(face.descender());
        let cap_height = face.capital_height().map(to_pdf).unwrap_or(ascent);

        let mut font_file = Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.to_vec(),
        );
        font_file
            .compress()
            .map_err(|e| RenderError::Document(e.to_string()))?;
        let font_file_id = doc.add_object(font_file);

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            "Flags" => 4,
            "FontBBox" => vec![
                Object::Integer(to_pdf(bbox.x_min)),
                Object::Integer(to_pdf(bbox.y_min)),
                Object::Integer(to_pdf(bbox.x_max)),
                Object::Integer(to_pdf(bbox.y_max)),
            ],
            "ItalicAngle" => 0,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => cap_height,
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let mut widths = Vec::with_capacity(used.len() * 2);
        for (gid, (width, _)) in &used {
            widths.push(Object::Integer(*gid as i64));
            widths.push(Object::Array(vec![Object::Integer(*width)]));
        }

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(base_font.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&used)));

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(base_font.into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        });

        debug!("Embedded font {} with {} distinct glyphs", self.path.display(), used.len());
        Ok(EmbeddedText { font_id, encoded })
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, (i64, String)>) -> Vec<u8> {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    // a glyph shared by several characters keeps the first one
    let entries: Vec<(u16, char)> = used
        .iter()
        .filter(|(gid, _)| **gid != 0)
        .filter_map(|(gid, (_, chars))| chars.chars().next().map(|c| (*gid, c)))
        .collect();

    for block in entries.chunks(BFCHAR_BLOCK) {
        out.push_str(&format!("{} beginbfchar\n", block.len()));
        for (gid, ch) in block {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    out.into_bytes()
}
