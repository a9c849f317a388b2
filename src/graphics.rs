//! The capability surface a drawing backend must provide, plus ARGB colors.
//!
//! The core never touches a concrete graphics library; the renderer walks
//! the box tree and issues calls against [`Graphics2D`].

use serde_derive::{Deserialize, Serialize};

use crate::resources::fonts::FontId;

/// 32-bit ARGB color. Alpha 0 ([`Color::TRANSPARENT`]) means "inherit".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const RED: Color = Color(0xFFFF_0000);

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Color {
        Color((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color::argb(0xFF, r, g, b)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn is_transparent(self) -> bool {
        self.alpha() == 0
    }

    /// `self` unless transparent, in which case `fallback`.
    pub fn or(self, fallback: Color) -> Color {
        if self.is_transparent() {
            fallback
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapStyle {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    Bevel,
    Round,
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub cap: CapStyle,
    pub join: JoinStyle,
    pub miter_limit: f64,
}

impl Default for Stroke {
    fn default() -> Stroke {
        Stroke {
            width: 1.0,
            cap: CapStyle::Butt,
            join: JoinStyle::Miter,
            miter_limit: 10.0,
        }
    }
}

/// What the core expects from a 2-D backend. Coordinates are pixels with
/// the y axis growing downwards; `(x, y)` of the text calls is the baseline
/// start point.
pub trait Graphics2D {
    fn set_color(&mut self, color: Color);
    fn set_stroke(&mut self, stroke: Stroke);
    /// Select the glyph source for subsequent `draw_char` calls.
    fn set_font(&mut self, font: FontId, size: f64);
    fn translate(&mut self, dx: f64, dy: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    /// Rotate by `angle` radians around `(px, py)`.
    fn rotate(&mut self, angle: f64, px: f64, py: f64);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
    fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn draw_round_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64);
    fn draw_char(&mut self, code: char, x: f64, y: f64);
    fn draw_text(&mut self, text: &str, x: f64, y: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argb_packing() {
        let c = Color::argb(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.0, 0x1234_5678);
        assert_eq!(c.alpha(), 0x12);
    }

    #[test]
    fn transparent_inherits() {
        assert_eq!(Color::TRANSPARENT.or(Color::RED), Color::RED);
        assert_eq!(Color::BLACK.or(Color::RED), Color::BLACK);
    }
}
