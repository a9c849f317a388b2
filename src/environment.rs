//! The current typesetting environment: style, font, color, sizes.
//!
//! Environments are small value types; every style derivation returns a
//! fresh copy at the mechanically derived style.

use std::cell::Cell;

use crate::dimensions::Length;
use crate::graphics::Color;
use crate::resources::fonts::{FontId, FontInfo, FontParams};
use crate::resources::TexContext;

/// TeX style as its small-integer encoding: display 0, text 2, script 4,
/// scriptScript 6; `style | 1` is the cramped variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TexStyle(pub u8);

impl TexStyle {
    pub const DISPLAY: TexStyle = TexStyle(0);
    pub const TEXT: TexStyle = TexStyle(2);
    pub const SCRIPT: TexStyle = TexStyle(4);
    pub const SCRIPT_SCRIPT: TexStyle = TexStyle(6);

    pub fn is_cramped(self) -> bool {
        self.0 % 2 == 1
    }

    /// Display or cramped display.
    pub fn is_display(self) -> bool {
        self.0 < Self::TEXT.0
    }

    /// Script or scriptScript, cramped or not.
    pub fn is_script(self) -> bool {
        self.0 >= Self::SCRIPT.0
    }

    /// 0..=3, the glue table's style axis.
    pub fn size_group(self) -> usize {
        (self.0 / 2) as usize
    }

    pub fn cramp(self) -> TexStyle {
        let s = self.0;
        TexStyle(if s % 2 == 1 { s } else { s + 1 })
    }

    pub fn num(self) -> TexStyle {
        let s = self.0;
        TexStyle(s + 2 - 2 * (s / 6))
    }

    pub fn dnom(self) -> TexStyle {
        let s = self.0;
        TexStyle(2 * (s / 2) + 1 + 2 - 2 * (s / 6))
    }

    pub fn sub(self) -> TexStyle {
        let s = self.0;
        TexStyle(2 * (s / 4) + 4 + 1)
    }

    pub fn sup(self) -> TexStyle {
        let s = self.0;
        TexStyle(2 * (s / 4) + 4 + s % 2)
    }

    pub fn root(self) -> TexStyle {
        Self::SCRIPT_SCRIPT
    }
}

/// Per-style font size multipliers, overridable via `\DeclareMathSizes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeFactors {
    pub text: f64,
    pub script: f64,
    pub script_script: f64,
}

impl Default for SizeFactors {
    fn default() -> SizeFactors {
        SizeFactors {
            text: 1.0,
            script: 0.7,
            script_script: 0.5,
        }
    }
}

impl SizeFactors {
    pub fn factor(&self, style: TexStyle) -> f64 {
        match style.0 / 2 {
            0 => 1.0,
            1 => self.text,
            2 => self.script,
            _ => self.script_script,
        }
    }
}

#[derive(Clone)]
pub struct Environment<'c> {
    pub ctx: &'c TexContext,
    pub style: TexStyle,
    pub font_id: FontId,
    pub text_style: Option<String>,
    pub foreground: Color,
    pub background: Color,
    pub small_cap: bool,
    pub scale_factor: f64,
    /// Base text size in pixels.
    pub text_size: f64,
    pub sizes: SizeFactors,
    /// Width budget for the formula breaker, pixels. 0 disables breaking.
    pub text_width: f64,
    pub interline: Length,
    last_font: Cell<FontId>,
}

impl<'c> Environment<'c> {
    pub fn new(ctx: &'c TexContext, style: TexStyle, font_id: FontId, text_size: f64) -> Self {
        Environment {
            ctx,
            style,
            font_id,
            text_style: None,
            foreground: Color::TRANSPARENT,
            background: Color::TRANSPARENT,
            small_cap: false,
            scale_factor: 1.0,
            text_size,
            sizes: SizeFactors::default(),
            text_width: 0.0,
            interline: Length::zero(),
            last_font: Cell::new(font_id),
        }
    }

    fn with_style(&self, style: TexStyle) -> Environment<'c> {
        let mut out = self.clone();
        out.style = style;
        out
    }

    pub fn cramp_style(&self) -> Environment<'c> {
        self.with_style(self.style.cramp())
    }

    pub fn num_style(&self) -> Environment<'c> {
        self.with_style(self.style.num())
    }

    pub fn dnom_style(&self) -> Environment<'c> {
        self.with_style(self.style.dnom())
    }

    pub fn sub_style(&self) -> Environment<'c> {
        self.with_style(self.style.sub())
    }

    pub fn sup_style(&self) -> Environment<'c> {
        self.with_style(self.style.sup())
    }

    pub fn root_style(&self) -> Environment<'c> {
        self.with_style(self.style.root())
    }

    pub fn style_env(&self, style: TexStyle) -> Environment<'c> {
        self.with_style(style)
    }

    /// Effective font size in pixels at the current style.
    pub fn size(&self) -> f64 {
        self.text_size * self.sizes.factor(self.style) * self.scale_factor
    }

    pub fn pixels_per_point(&self) -> f64 {
        self.ctx.pixels_per_point
    }

    pub fn last_font(&self) -> FontId {
        self.last_font.get()
    }

    pub fn set_last_font(&self, font: FontId) {
        self.last_font.set(font);
    }

    fn params_of(&self, font: FontId) -> FontParams {
        self.ctx
            .fonts
            .font(font)
            .map(|f| f.params)
            .unwrap_or_default()
    }

    pub fn font(&self) -> Option<&'c FontInfo> {
        self.ctx.fonts.font(self.font_id).ok()
    }

    fn params(&self) -> FontParams {
        self.params_of(self.font_id)
    }

    pub fn em(&self) -> f64 {
        self.params().quad * self.size()
    }

    pub fn x_height(&self) -> f64 {
        self.params_of(self.last_font.get()).x_height * self.size()
    }

    pub fn quad(&self) -> f64 {
        self.params().quad * self.size()
    }

    pub fn mu_quad(&self) -> f64 {
        self.params_of(self.ctx.fonts.mu_font()).quad * self.size()
    }

    pub fn space(&self) -> f64 {
        self.params().space * self.size()
    }

    pub fn axis_height(&self) -> f64 {
        self.params().axis_height * self.size()
    }

    pub fn default_rule_thickness(&self) -> f64 {
        self.params().default_rule_thickness * self.size()
    }

    pub fn big_op_spacing(&self, index: u8) -> f64 {
        let p = self.params();
        let v = match index {
            1 => p.big_op_spacing1,
            2 => p.big_op_spacing2,
            3 => p.big_op_spacing3,
            4 => p.big_op_spacing4,
            _ => p.big_op_spacing5,
        };
        v * self.size()
    }

    pub fn sup_shift(&self) -> (f64, f64, f64) {
        let p = self.params();
        let s = self.size();
        (p.sup1 * s, p.sup2 * s, p.sup3 * s)
    }

    pub fn sub_shift(&self) -> (f64, f64) {
        let p = self.params();
        let s = self.size();
        (p.sub1 * s, p.sub2 * s)
    }

    pub fn script_drops(&self) -> (f64, f64) {
        let p = self.params();
        let s = self.size();
        (p.sup_drop * s, p.sub_drop * s)
    }

    pub fn num_shifts(&self) -> (f64, f64, f64) {
        let p = self.params();
        let s = self.size();
        (p.num1 * s, p.num2 * s, p.num3 * s)
    }

    pub fn denom_shifts(&self) -> (f64, f64) {
        let p = self.params();
        let s = self.size();
        (p.denom1 * s, p.denom2 * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cramping_is_idempotent() {
        for s in 0..8u8 {
            let st = TexStyle(s);
            assert_eq!(st.cramp().cramp(), st.cramp());
            assert!(st.cramp().is_cramped());
        }
    }

    #[test]
    fn sub_is_cramped_sup_inherits_cramp() {
        for s in 0..8u8 {
            let st = TexStyle(s);
            assert!(st.sub().is_cramped());
            assert_eq!(st.sup().is_cramped(), st.is_cramped());
            assert_eq!(st.root(), TexStyle::SCRIPT_SCRIPT);
        }
    }

    #[test]
    fn fraction_styles_match_the_tables() {
        assert_eq!(TexStyle::DISPLAY.num(), TexStyle::TEXT);
        assert_eq!(TexStyle::DISPLAY.dnom(), TexStyle(3));
        assert_eq!(TexStyle::TEXT.num(), TexStyle::SCRIPT);
        assert_eq!(TexStyle::SCRIPT.sub(), TexStyle(7));
        assert_eq!(TexStyle::SCRIPT_SCRIPT.num(), TexStyle::SCRIPT_SCRIPT);
    }

    #[test]
    fn size_factor_table() {
        let sizes = SizeFactors::default();
        assert_eq!(sizes.factor(TexStyle::DISPLAY), 1.0);
        assert_eq!(sizes.factor(TexStyle(1)), 1.0);
        assert_eq!(sizes.factor(TexStyle::SCRIPT), 0.7);
        assert_eq!(sizes.factor(TexStyle(7)), 0.5);
    }
}
