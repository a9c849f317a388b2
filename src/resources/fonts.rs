//! The font metrics store.
//!
//! Glyph rasterization lives behind [`Graphics2D`](crate::graphics::Graphics2D);
//! everything the layout needs — per-glyph metrics, kern pairs, ligatures,
//! next-larger chains, extension recipes and the TeX font dimens — comes from
//! the font definition XML loaded here. All scalar values are fractions of
//! the font's em; the [`Environment`](crate::environment::Environment)
//! multiplies by the current size.

use std::collections::HashMap;

use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult, ResourceError, ResourceResult};

use super::{parse_attr, parse_attr_or, parse_char_attr, require_attr, xml_error};

pub type FontId = u16;

/// A code point in a concrete font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharFont {
    pub font: FontId,
    pub code: char,
}

impl CharFont {
    pub const fn new(font: FontId, code: char) -> CharFont {
        CharFont { font, code }
    }
}

/// Glyph box metrics, em fractions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub italic: f64,
}

/// Recipe for building an arbitrarily tall glyph out of pieces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extension {
    pub top: Option<char>,
    pub mid: Option<char>,
    pub rep: char,
    pub bot: Option<char>,
}

#[derive(Debug, Clone, Default)]
pub struct GlyphInfo {
    pub metrics: Metrics,
    pub kern: HashMap<char, f64>,
    pub ligatures: HashMap<char, char>,
    pub next_larger: Option<CharFont>,
    pub extension: Option<Extension>,
}

/// TeX font dimens, em fractions. Missing attributes take the defaults
/// below, which mirror the Computer Modern symbol/extension values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontParams {
    pub space: f64,
    pub x_height: f64,
    pub quad: f64,
    pub axis_height: f64,
    pub default_rule_thickness: f64,
    pub big_op_spacing1: f64,
    pub big_op_spacing2: f64,
    pub big_op_spacing3: f64,
    pub big_op_spacing4: f64,
    pub big_op_spacing5: f64,
    pub sup1: f64,
    pub sup2: f64,
    pub sup3: f64,
    pub sub1: f64,
    pub sub2: f64,
    pub sup_drop: f64,
    pub sub_drop: f64,
    pub num1: f64,
    pub num2: f64,
    pub num3: f64,
    pub denom1: f64,
    pub denom2: f64,
}

impl Default for FontParams {
    fn default() -> FontParams {
        FontParams {
            space: 0.0,
            x_height: 0.431,
            quad: 1.0,
            axis_height: 0.25,
            default_rule_thickness: 0.04,
            big_op_spacing1: 0.111,
            big_op_spacing2: 0.166,
            big_op_spacing3: 0.2,
            big_op_spacing4: 0.6,
            big_op_spacing5: 0.1,
            sup1: 0.413,
            sup2: 0.363,
            sup3: 0.289,
            sub1: 0.15,
            sub2: 0.247,
            sup_drop: 0.386,
            sub_drop: 0.05,
            num1: 0.676,
            num2: 0.394,
            num3: 0.444,
            denom1: 0.686,
            denom2: 0.345,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FontInfo {
    pub id: FontId,
    pub name: String,
    pub params: FontParams,
    pub skew_char: Option<char>,
    pub glyphs: HashMap<char, GlyphInfo>,
    pub bold_version: Option<FontId>,
    pub roman_version: Option<FontId>,
    pub ss_version: Option<FontId>,
    pub tt_version: Option<FontId>,
    pub it_version: Option<FontId>,
}

impl FontInfo {
    pub fn glyph(&self, code: char) -> LayoutResult<&GlyphInfo> {
        self.glyphs.get(&code).ok_or(LayoutError::MissingGlyph {
            font: self.id,
            code,
        })
    }
}

/// All loaded fonts, keyed by id. Duplicate ids are a load error.
pub struct FontStore {
    fonts: HashMap<FontId, FontInfo>,
    by_name: HashMap<String, FontId>,
    mu_font: FontId,
}

const RESOURCE: &str = "font definition";

impl FontStore {
    pub fn new(mu_font: FontId) -> FontStore {
        FontStore {
            fonts: HashMap::new(),
            by_name: HashMap::new(),
            mu_font,
        }
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn mu_font(&self) -> FontId {
        self.mu_font
    }

    pub fn font(&self, id: FontId) -> LayoutResult<&FontInfo> {
        self.fonts.get(&id).ok_or(LayoutError::FontNotLoaded(id))
    }

    pub fn by_name(&self, name: &str) -> Option<&FontInfo> {
        self.by_name.get(name).and_then(|id| self.fonts.get(id))
    }

    pub fn metrics(&self, cf: CharFont) -> LayoutResult<Metrics> {
        Ok(self.font(cf.font)?.glyph(cf.code)?.metrics)
    }

    /// Signed kern between two code points of the same font, em fractions.
    pub fn kern(&self, left: CharFont, right: char) -> f64 {
        self.fonts
            .get(&left.font)
            .and_then(|f| f.glyphs.get(&left.code))
            .and_then(|g| g.kern.get(&right))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn ligature(&self, left: CharFont, right: char) -> Option<char> {
        self.fonts
            .get(&left.font)?
            .glyphs
            .get(&left.code)?
            .ligatures
            .get(&right)
            .copied()
    }

    pub fn next_larger(&self, cf: CharFont) -> Option<CharFont> {
        self.fonts.get(&cf.font)?.glyphs.get(&cf.code)?.next_larger
    }

    pub fn extension(&self, cf: CharFont) -> Option<Extension> {
        self.fonts.get(&cf.font)?.glyphs.get(&cf.code)?.extension
    }

    /// Load every `<Font>` element of one XML document into the store.
    pub fn load_xml(&mut self, xml: &str) -> ResourceResult<()> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| xml_error(RESOURCE, e))?;
        for node in doc.root_element().descendants() {
            if node.has_tag_name("Font") {
                self.load_font(node)?;
            }
        }
        Ok(())
    }

    fn load_font(&mut self, node: roxmltree::Node) -> ResourceResult<()> {
        let id: FontId = parse_attr(RESOURCE, node, "id")?;
        if self.fonts.contains_key(&id) {
            return Err(ResourceError::FontLoaded(id));
        }
        let name = require_attr(RESOURCE, node, "name")?.to_string();

        let d = FontParams::default();
        let params = FontParams {
            space: parse_attr_or(RESOURCE, node, "space", d.space)?,
            x_height: parse_attr_or(RESOURCE, node, "xHeight", d.x_height)?,
            quad: parse_attr_or(RESOURCE, node, "quad", d.quad)?,
            axis_height: parse_attr_or(RESOURCE, node, "axisHeight", d.axis_height)?,
            default_rule_thickness: parse_attr_or(
                RESOURCE,
                node,
                "defaultRuleThickness",
                d.default_rule_thickness,
            )?,
            big_op_spacing1: parse_attr_or(RESOURCE, node, "bigOpSpacing1", d.big_op_spacing1)?,
            big_op_spacing2: parse_attr_or(RESOURCE, node, "bigOpSpacing2", d.big_op_spacing2)?,
            big_op_spacing3: parse_attr_or(RESOURCE, node, "bigOpSpacing3", d.big_op_spacing3)?,
            big_op_spacing4: parse_attr_or(RESOURCE, node, "bigOpSpacing4", d.big_op_spacing4)?,
            big_op_spacing5: parse_attr_or(RESOURCE, node, "bigOpSpacing5", d.big_op_spacing5)?,
            sup1: parse_attr_or(RESOURCE, node, "sup1", d.sup1)?,
            sup2: parse_attr_or(RESOURCE, node, "sup2", d.sup2)?,
            sup3: parse_attr_or(RESOURCE, node, "sup3", d.sup3)?,
            sub1: parse_attr_or(RESOURCE, node, "sub1", d.sub1)?,
            sub2: parse_attr_or(RESOURCE, node, "sub2", d.sub2)?,
            sup_drop: parse_attr_or(RESOURCE, node, "supDrop", d.sup_drop)?,
            sub_drop: parse_attr_or(RESOURCE, node, "subDrop", d.sub_drop)?,
            num1: parse_attr_or(RESOURCE, node, "num1", d.num1)?,
            num2: parse_attr_or(RESOURCE, node, "num2", d.num2)?,
            num3: parse_attr_or(RESOURCE, node, "num3", d.num3)?,
            denom1: parse_attr_or(RESOURCE, node, "denom1", d.denom1)?,
            denom2: parse_attr_or(RESOURCE, node, "denom2", d.denom2)?,
        };

        let mut info = FontInfo {
            id,
            name: name.clone(),
            params,
            skew_char: node.attribute("skewChar").and_then(super::char_from_str),
            glyphs: HashMap::new(),
            bold_version: opt_font_ref(node, "boldVersion")?,
            roman_version: opt_font_ref(node, "romanVersion")?,
            ss_version: opt_font_ref(node, "ssVersion")?,
            tt_version: opt_font_ref(node, "ttVersion")?,
            it_version: opt_font_ref(node, "itVersion")?,
        };

        for ch in node.children().filter(|c| c.has_tag_name("Char")) {
            let code = parse_char_attr(RESOURCE, ch, "code")?;
            let mut glyph = GlyphInfo {
                metrics: Metrics {
                    width: parse_attr_or(RESOURCE, ch, "width", 0.0)?,
                    height: parse_attr_or(RESOURCE, ch, "height", 0.0)?,
                    depth: parse_attr_or(RESOURCE, ch, "depth", 0.0)?,
                    italic: parse_attr_or(RESOURCE, ch, "italic", 0.0)?,
                },
                ..GlyphInfo::default()
            };
            for sub in ch.children().filter(roxmltree::Node::is_element) {
                match sub.tag_name().name() {
                    "Kern" => {
                        let other = parse_char_attr(RESOURCE, sub, "code")?;
                        let val = parse_attr(RESOURCE, sub, "val")?;
                        glyph.kern.insert(other, val);
                    }
                    "Lig" => {
                        let other = parse_char_attr(RESOURCE, sub, "code")?;
                        let lig = parse_char_attr(RESOURCE, sub, "ligCode")?;
                        glyph.ligatures.insert(other, lig);
                    }
                    "NextLarger" => {
                        let font = parse_attr(RESOURCE, sub, "fontId")?;
                        let code = parse_char_attr(RESOURCE, sub, "code")?;
                        glyph.next_larger = Some(CharFont::new(font, code));
                    }
                    "Extension" => {
                        glyph.extension = Some(Extension {
                            rep: parse_char_attr(RESOURCE, sub, "rep")?,
                            top: sub.attribute("top").and_then(super::char_from_str),
                            mid: sub.attribute("mid").and_then(super::char_from_str),
                            bot: sub.attribute("bot").and_then(super::char_from_str),
                        });
                    }
                    _ => {}
                }
            }
            info.glyphs.insert(code, glyph);
        }

        debug!("loaded font {} '{}' ({} glyphs)", id, name, info.glyphs.len());
        self.by_name.insert(name, id);
        self.fonts.insert(id, info);
        Ok(())
    }
}

fn opt_font_ref(node: roxmltree::Node, attr: &str) -> ResourceResult<Option<FontId>> {
    match node.attribute(attr) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ResourceError::InvalidAttribute {
                resource: RESOURCE.to_string(),
                attribute: attr.to_string(),
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <TeXFonts>
          <Font name="base" id="0" xHeight="0.45" quad="1.0">
            <Char code="102" width="0.5" height="0.7" italic="0.1">
              <Lig code="105" ligCode="64257"/>
              <Kern code="102" val="0.03"/>
            </Char>
            <Char code="105" width="0.3" height="0.65"/>
          </Font>
        </TeXFonts>"#;

    #[test]
    fn loads_glyphs_ligatures_and_kerns() {
        let mut store = FontStore::new(0);
        store.load_xml(DOC).unwrap();
        let fi = CharFont::new(0, 'f');
        assert_eq!(store.metrics(fi).unwrap().width, 0.5);
        assert_eq!(store.ligature(fi, 'i'), Some('ﬁ'));
        assert_eq!(store.kern(fi, 'f'), 0.03);
        assert_eq!(store.kern(fi, 'x'), 0.0);
    }

    #[test]
    fn duplicate_font_id_is_rejected() {
        let mut store = FontStore::new(0);
        store.load_xml(DOC).unwrap();
        assert_eq!(store.load_xml(DOC), Err(ResourceError::FontLoaded(0)));
    }

    #[test]
    fn missing_glyph_is_a_layout_error() {
        let mut store = FontStore::new(0);
        store.load_xml(DOC).unwrap();
        assert_eq!(
            store.metrics(CharFont::new(0, 'Z')),
            Err(LayoutError::MissingGlyph { font: 0, code: 'Z' })
        );
    }
}
