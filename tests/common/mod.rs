//! Shared fixtures: a small in-memory resource set plus a recording
//! backend.
#![allow(dead_code)]

use mathtex::boxes::{BoxKind, BoxNode};
use mathtex::resources::{ResourceConfig, TexContext};
use mathtex::{Color, Graphics2D, Stroke};

pub const SYMBOLS_XML: &str = r#"
<TeXSymbols>
  <Symbol name="plus" type="bin" code="43"/>
  <Symbol name="minus" type="bin" code="8722"/>
  <Symbol name="equals" type="rel" code="61"/>
  <Symbol name="sum" type="op" code="8721"/>
  <Symbol name="lbrack" type="open" del="true" code="40"/>
  <Symbol name="rbrack" type="close" del="true" code="41"/>
  <Symbol name="lsqbrack" type="open" del="true" code="91"/>
  <Symbol name="rsqbrack" type="close" del="true" code="93"/>
  <Symbol name="lbrace" type="open" del="true" code="123"/>
  <Symbol name="rbrace" type="close" del="true" code="125"/>
  <Symbol name="vert" type="ord" del="true" code="124"/>
  <Symbol name="surd" type="ord" del="true" code="8730"/>
  <Symbol name="prime" type="ord" code="8242"/>
  <Symbol name="cdots" type="ord" code="8943"/>
  <Symbol name="rightarrow" type="rel" code="8594"/>
  <Symbol name="hat" type="acc" code="94"/>
  <Symbol name="comma" type="punct" code="44"/>
</TeXSymbols>"#;

pub const SETTINGS_XML: &str = r#"
<TeXFormulaSettings>
  <CharacterToSymbolMappings>
    <Map char="+" symbol="plus"/>
    <Map char="-" symbol="minus"/>
    <Map char="−" symbol="minus"/>
    <Map char="=" symbol="equals"/>
    <Map char="(" symbol="lbrack"/>
    <Map char=")" symbol="rbrack"/>
    <Map char="[" symbol="lsqbrack"/>
    <Map char="]" symbol="rsqbrack"/>
    <Map char="|" symbol="vert"/>
    <Map char="," symbol="comma"/>
  </CharacterToSymbolMappings>
  <CharacterToFormulaMappings>
    <Map char="²" formula="^2"/>
  </CharacterToFormulaMappings>
</TeXFormulaSettings>"#;

pub const GLUE_XML: &str = r#"
<GlueSettings>
  <GlueTypes>
    <GlueType name="default" space="0" stretch="0" shrink="0"/>
    <GlueType name="thin" space="3" stretch="0" shrink="0"/>
    <GlueType name="med" space="4" stretch="2" shrink="4"/>
    <GlueType name="thick" space="5" stretch="5" shrink="0"/>
  </GlueTypes>
  <GlueTable>
    <Glue lefttype="ord" righttype="op" gluetype="thin">
      <Style name="display"/><Style name="text"/>
      <Style name="script"/><Style name="script_script"/>
    </Glue>
    <Glue lefttype="op" righttype="ord" gluetype="thin">
      <Style name="display"/><Style name="text"/>
      <Style name="script"/><Style name="script_script"/>
    </Glue>
    <Glue lefttype="ord" righttype="bin" gluetype="med">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="bin" righttype="ord" gluetype="med">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="close" righttype="bin" gluetype="med">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="inner" righttype="bin" gluetype="med">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="bin" righttype="inner" gluetype="med">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="ord" righttype="rel" gluetype="thick">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="rel" righttype="ord" gluetype="thick">
      <Style name="display"/><Style name="text"/>
    </Glue>
    <Glue lefttype="punct" righttype="ord" gluetype="thin">
      <Style name="display"/><Style name="text"/>
    </Glue>
  </GlueTable>
</GlueSettings>"#;

pub const FONTS_XML: &str = r#"
<TeXFonts>
  <Font name="base" id="0" space="0.33" xHeight="0.43" quad="1.0"
        axisHeight="0.25" defaultRuleThickness="0.04">
    <Char code="97" width="0.51" height="0.45"/>
    <Char code="98" width="0.46" height="0.7"/>
    <Char code="99" width="0.43" height="0.45"/>
    <Char code="100" width="0.52" height="0.7"/>
    <Char code="102" width="0.49" height="0.7" depth="0.2" italic="0.1">
      <Lig code="105" ligCode="64257"/>
      <Kern code="102" val="0.03"/>
    </Char>
    <Char code="105" width="0.28" height="0.66"/>
    <Char code="110" width="0.6" height="0.45"/>
    <Char code="120" width="0.57" height="0.45"/>
    <Char code="121" width="0.54" height="0.45" depth="0.2"/>
    <Char code="77" width="0.97" height="0.68"/>
    <Char code="48" width="0.5" height="0.65"/>
    <Char code="49" width="0.5" height="0.65"/>
    <Char code="50" width="0.5" height="0.65"/>
    <Char code="51" width="0.5" height="0.65"/>
    <Char code="52" width="0.5" height="0.65"/>
    <Char code="53" width="0.5" height="0.65"/>
    <Char code="54" width="0.5" height="0.65"/>
    <Char code="55" width="0.5" height="0.65"/>
    <Char code="56" width="0.5" height="0.65"/>
    <Char code="57" width="0.5" height="0.65"/>
    <Char code="43" width="0.78" height="0.58" depth="0.08"/>
    <Char code="8722" width="0.78" height="0.58" depth="0.08"/>
    <Char code="61" width="0.78" height="0.37"/>
    <Char code="44" width="0.28" depth="0.12"/>
    <Char code="40" width="0.39" height="0.75" depth="0.25">
      <NextLarger fontId="1" code="40"/>
    </Char>
    <Char code="41" width="0.39" height="0.75" depth="0.25">
      <NextLarger fontId="1" code="41"/>
    </Char>
    <Char code="91" width="0.28" height="0.75" depth="0.25"/>
    <Char code="93" width="0.28" height="0.75" depth="0.25"/>
    <Char code="123" width="0.5" height="0.75" depth="0.25"/>
    <Char code="125" width="0.5" height="0.75" depth="0.25"/>
    <Char code="124" width="0.28" height="0.75" depth="0.25"/>
    <Char code="8730" width="0.56" height="0.85" depth="0.05">
      <NextLarger fontId="1" code="8730"/>
    </Char>
    <Char code="8721" width="1.0" height="0.75" depth="0.25">
      <NextLarger fontId="1" code="8721"/>
    </Char>
    <Char code="8242" width="0.28" height="0.56"/>
    <Char code="8943" width="1.0" height="0.45"/>
    <Char code="8594" width="1.0" height="0.37"/>
    <Char code="94" width="0.5" height="0.7"/>
    <Char code="64257" width="0.78" height="0.7" depth="0.2"/>
  </Font>
  <Font name="big" id="1" quad="1.0" axisHeight="0.25" defaultRuleThickness="0.04">
    <Char code="40" width="0.45" height="1.15" depth="0.65">
      <Extension top="9115" rep="9116" bot="9117"/>
    </Char>
    <Char code="41" width="0.45" height="1.15" depth="0.65">
      <Extension top="9118" rep="9119" bot="9120"/>
    </Char>
    <Char code="9115" width="0.45" height="0.6"/>
    <Char code="9116" width="0.45" height="0.6"/>
    <Char code="9117" width="0.45" height="0.6"/>
    <Char code="9118" width="0.45" height="0.6"/>
    <Char code="9119" width="0.45" height="0.6"/>
    <Char code="9120" width="0.45" height="0.6"/>
    <Char code="8730" width="0.65" height="1.45" depth="0.35">
      <Extension top="9121" rep="9122" bot="9123"/>
    </Char>
    <Char code="9121" width="0.65" height="0.65"/>
    <Char code="9122" width="0.65" height="0.65"/>
    <Char code="9123" width="0.65" height="0.65"/>
    <Char code="8721" width="1.4" height="1.15" depth="0.65"/>
  </Font>
</TeXFonts>"#;

pub fn fixture_config() -> ResourceConfig {
    ResourceConfig {
        symbols_xml: SYMBOLS_XML.to_string(),
        formula_settings_xml: SETTINGS_XML.to_string(),
        glue_xml: GLUE_XML.to_string(),
        font_xml: vec![FONTS_XML.to_string()],
        mu_font: 0,
        pixels_per_point: 1.0,
    }
}

pub fn fixture_context() -> TexContext {
    let _ = env_logger::builder().is_test(true).try_init();
    TexContext::load(&fixture_config()).expect("fixture resources load")
}

/// Depth-first collection of every painted glyph in a box tree.
pub fn collect_chars(node: &BoxNode, out: &mut Vec<char>) {
    if let BoxKind::Char(cb) = &node.kind {
        out.push(cb.cf.code);
    }
    match &node.kind {
        BoxKind::OverUnder(ou) => {
            collect_chars(&ou.base, out);
            collect_chars(&ou.delimiter, out);
            if let Some(s) = &ou.script {
                collect_chars(s, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_chars(child, out);
            }
        }
    }
}

pub fn chars_of(node: &BoxNode) -> Vec<char> {
    let mut out = Vec::new();
    collect_chars(node, &mut out);
    out
}

pub fn count_kind(node: &BoxNode, pred: &dyn Fn(&BoxKind) -> bool) -> usize {
    let mut n = usize::from(pred(&node.kind));
    for child in node.children() {
        n += count_kind(child, pred);
    }
    n
}

/// Records every backend call; good enough to check what got painted.
#[derive(Default)]
pub struct RecordingBackend {
    pub chars: Vec<(char, f64, f64)>,
    pub texts: Vec<String>,
    pub rects: usize,
    pub colors: Vec<Color>,
}

impl Graphics2D for RecordingBackend {
    fn set_color(&mut self, color: Color) {
        self.colors.push(color);
    }
    fn set_stroke(&mut self, _stroke: Stroke) {}
    fn set_font(&mut self, _font: u16, _size: f64) {}
    fn translate(&mut self, _dx: f64, _dy: f64) {}
    fn scale(&mut self, _sx: f64, _sy: f64) {}
    fn rotate(&mut self, _angle: f64, _px: f64, _py: f64) {}
    fn draw_line(&mut self, _x1: f64, _y1: f64, _x2: f64, _y2: f64) {}
    fn draw_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64) {
        self.rects += 1;
    }
    fn fill_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64) {
        self.rects += 1;
    }
    fn draw_round_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64, _rx: f64, _ry: f64) {}
    fn draw_char(&mut self, code: char, x: f64, y: f64) {
        self.chars.push((code, x, y));
    }
    fn draw_text(&mut self, text: &str, _x: f64, _y: f64) {
        self.texts.push(text.to_string());
    }
}
