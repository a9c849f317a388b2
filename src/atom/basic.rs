//! Leaf and styling atoms: characters, symbols, spaces, rules, phantoms,
//! color/font/style switches and the decorating wrappers.

use log::debug;

use crate::boxes::{builders, BoxKind, BoxNode, CharBox, FrameBox, TextBox};
use crate::dimensions::{Length, Unit};
use crate::environment::{Environment, TexStyle};
use crate::error::{LayoutError, LayoutResult};
use crate::graphics::Color;
use crate::resources::fonts::{CharFont, FontId};
use crate::resources::symbols::SymbolSpec;

use super::{AtomType, LimitsType, SharedAtom};

/// Char metrics scaled to the environment size, as a paintable box.
pub(crate) fn glyph_box(cf: CharFont, env: &Environment) -> LayoutResult<BoxNode> {
    let m = env.ctx.fonts.metrics(cf)?;
    let size = env.size();
    env.set_last_font(cf.font);
    Ok(BoxNode::new(
        BoxKind::Char(CharBox {
            cf,
            size,
            italic: m.italic * size,
        }),
        m.width * size,
        m.height * size,
        m.depth * size,
    ))
}

/// A bare code point drawn in the environment's current font.
#[derive(Debug)]
pub struct CharAtom {
    pub code: char,
    /// Set when the character came from text mode rather than math mode.
    pub text_mode: bool,
}

impl CharAtom {
    pub fn new(code: char) -> CharAtom {
        CharAtom {
            code,
            text_mode: false,
        }
    }

    pub fn char_font(&self, env: &Environment) -> CharFont {
        CharFont::new(env.font_id, self.code)
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        glyph_box(self.char_font(env), env)
    }
}

/// A named entry of the symbol table.
#[derive(Debug)]
pub struct SymbolAtom {
    pub spec: SymbolSpec,
    pub limits: LimitsType,
}

impl SymbolAtom {
    pub fn new(spec: SymbolSpec) -> SymbolAtom {
        SymbolAtom {
            spec,
            limits: LimitsType::Normal,
        }
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        // Big operators take their next-larger variant in display style and
        // sit centered on the math axis.
        if self.spec.atom_type == AtomType::BigOperator && env.style.is_display() {
            let cf = env
                .ctx
                .fonts
                .next_larger(self.spec.char_font)
                .unwrap_or(self.spec.char_font);
            let glyph = glyph_box(cf, env)?;
            let axis = env.axis_height();
            return Ok(glyph.centered_on_axis(axis));
        }
        glyph_box(self.spec.char_font, env)
    }
}

/// A ligature outcome: the glyph is already resolved, no further rewrites.
#[derive(Debug)]
pub struct FixedCharAtom {
    pub cf: CharFont,
}

impl FixedCharAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        glyph_box(self.cf, env)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpaceKind {
    ThinMu,
    MedMu,
    ThickMu,
    NegThinMu,
    NegMedMu,
    NegThickMu,
    Quad,
    /// The `~` tie: one interword space, never a break point.
    NonBreaking,
    Custom {
        width: Length,
        height: Length,
        depth: Length,
    },
}

#[derive(Debug)]
pub struct SpaceAtom {
    pub kind: SpaceKind,
}

impl SpaceAtom {
    pub fn new(kind: SpaceKind) -> SpaceAtom {
        SpaceAtom { kind }
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let mu = |v: f64| Length::new(v, Unit::Mu).to_px(env);
        Ok(match self.kind {
            SpaceKind::ThinMu => kern!(horz: mu(3.0)),
            SpaceKind::MedMu => kern!(horz: mu(4.0)),
            SpaceKind::ThickMu => kern!(horz: mu(5.0)),
            SpaceKind::NegThinMu => kern!(horz: mu(-3.0)),
            SpaceKind::NegMedMu => kern!(horz: mu(-4.0)),
            SpaceKind::NegThickMu => kern!(horz: mu(-5.0)),
            SpaceKind::Quad => kern!(horz: env.quad()),
            SpaceKind::NonBreaking => {
                let w = env.space().max(Length::new(0.25, Unit::Em).to_px(env));
                kern!(horz: w)
            }
            SpaceKind::Custom {
                width,
                height,
                depth,
            } => BoxNode::new(
                BoxKind::Strut,
                width.to_px(env),
                height.to_px(env),
                depth.to_px(env),
            ),
        })
    }
}

/// `\rule[raise]{width}{height}`.
#[derive(Debug)]
pub struct RuleAtom {
    pub width: Length,
    pub height: Length,
    pub raise: Length,
}

impl RuleAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let node = rule!(
            width: self.width.to_px(env),
            height: self.height.to_px(env)
        );
        Ok(node.shifted(-self.raise.to_px(env)))
    }
}

/// Invisible (or dimension-smashed) rendition of its content.
#[derive(Debug)]
pub struct PhantomAtom {
    pub content: SharedAtom,
    pub keep_width: bool,
    pub keep_height: bool,
    pub keep_depth: bool,
    /// Smashes draw the content; phantoms only reserve space.
    pub visible: bool,
}

impl PhantomAtom {
    pub fn phantom(content: SharedAtom, width: bool, height: bool, depth: bool) -> PhantomAtom {
        PhantomAtom {
            content,
            keep_width: width,
            keep_height: height,
            keep_depth: depth,
            visible: false,
        }
    }

    pub fn smash(content: SharedAtom) -> PhantomAtom {
        PhantomAtom {
            content,
            keep_width: true,
            keep_height: false,
            keep_depth: false,
            visible: true,
        }
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        let width = if self.keep_width { inner.width } else { 0.0 };
        let height = if self.keep_height { inner.height } else { 0.0 };
        let depth = if self.keep_depth { inner.depth } else { 0.0 };
        if self.visible {
            Ok(BoxNode::new(
                BoxKind::Overlap(vec![inner]),
                width,
                height,
                depth,
            ))
        } else {
            Ok(BoxNode::new(BoxKind::Strut, width, height, depth))
        }
    }
}

/// Foreground/background switch for a subtree.
#[derive(Debug)]
pub struct ColorAtom {
    pub content: SharedAtom,
    pub foreground: Color,
    pub background: Color,
}

impl ColorAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let mut sub = env.clone();
        sub.foreground = self.foreground.or(sub.foreground);
        sub.background = self.background.or(sub.background);
        let inner = self.content.create_box(&sub)?;
        let (w, h, d) = (inner.width, inner.height, inner.depth);
        Ok(BoxNode::new(
            BoxKind::Wrapper {
                content: Box::new(inner),
                inset: 0.0,
            },
            w,
            h,
            d,
        )
        .with_foreground(self.foreground)
        .with_background(self.background))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontStyleKind {
    Bold,
    Italic,
    Roman,
    SansSerif,
    Typewriter,
    Calligraphic,
    Fraktur,
    Blackboard,
    /// A math font selected by name (`\mathversion`-style switches).
    Named(String),
}

#[derive(Debug)]
pub struct FontStyleAtom {
    pub kind: FontStyleKind,
    pub content: SharedAtom,
}

impl FontStyleAtom {
    fn resolve(&self, env: &Environment) -> LayoutResult<FontId> {
        let font = env
            .ctx
            .fonts
            .font(env.font_id)
            .map_err(|_| LayoutError::FontNotLoaded(env.font_id))?;
        let version = match &self.kind {
            FontStyleKind::Bold => font.bold_version,
            FontStyleKind::Italic => font.it_version,
            FontStyleKind::Roman => font.roman_version,
            FontStyleKind::SansSerif => font.ss_version,
            FontStyleKind::Typewriter => font.tt_version,
            FontStyleKind::Calligraphic => return self.by_name(env, "cal"),
            FontStyleKind::Fraktur => return self.by_name(env, "frak"),
            FontStyleKind::Blackboard => return self.by_name(env, "bb"),
            FontStyleKind::Named(name) => return self.by_name(env, name),
        };
        Ok(version.unwrap_or_else(|| {
            debug!("font {} has no {:?} variant", env.font_id, self.kind);
            env.font_id
        }))
    }

    fn by_name(&self, env: &Environment, name: &str) -> LayoutResult<FontId> {
        env.ctx
            .fonts
            .by_name(name)
            .map(|f| f.id)
            .ok_or_else(|| LayoutError::TextStyleMappingNotFound(name.to_string()))
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let mut sub = env.clone();
        sub.font_id = self.resolve(env)?;
        self.content.create_box(&sub)
    }
}

/// Explicit TeX style switch (`\displaystyle` and friends).
#[derive(Debug)]
pub struct StyleAtom {
    pub style: TexStyle,
    pub content: SharedAtom,
}

impl StyleAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        self.content.create_box(&env.style_env(self.style))
    }
}

#[derive(Debug)]
pub struct ScaleAtom {
    pub sx: f64,
    pub sy: f64,
    pub content: SharedAtom,
}

impl ScaleAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        // Non-finite factors collapse to the identity.
        let sx = if self.sx.is_finite() { self.sx } else { 1.0 };
        let sy = if self.sy.is_finite() { self.sy } else { 1.0 };
        let width = inner.width * sx.abs();
        let height = if sy >= 0.0 {
            inner.height * sy
        } else {
            -inner.depth * sy
        };
        let depth = if sy >= 0.0 {
            inner.depth * sy
        } else {
            -inner.height * sy
        };
        Ok(BoxNode::new(
            BoxKind::Scale {
                sx,
                sy,
                content: Box::new(inner),
            },
            width,
            height,
            depth,
        ))
    }
}

#[derive(Debug)]
pub struct ReflectAtom {
    pub content: SharedAtom,
}

impl ReflectAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        let (w, h, d) = (inner.width, inner.height, inner.depth);
        Ok(BoxNode::new(BoxKind::Reflect(Box::new(inner)), w, h, d))
    }
}

/// Rotation pivot: a named corner/edge or an explicit point. Lowercase
/// names measure from the bounding box, capitalized ones from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationOrigin {
    BottomLeft,
    BottomCenter,
    BottomRight,
    CenterLeft,
    Center,
    CenterRight,
    TopLeft,
    TopCenter,
    TopRight,
    BaselineLeft,
    BaselineCenter,
    BaselineRight,
    Point(Length, Length),
}

impl RotationOrigin {
    pub fn from_name(name: &str) -> Option<RotationOrigin> {
        Some(match name {
            "bl" => RotationOrigin::BottomLeft,
            "bc" => RotationOrigin::BottomCenter,
            "br" => RotationOrigin::BottomRight,
            "cl" => RotationOrigin::CenterLeft,
            "cc" => RotationOrigin::Center,
            "cr" => RotationOrigin::CenterRight,
            "tl" => RotationOrigin::TopLeft,
            "tc" => RotationOrigin::TopCenter,
            "tr" => RotationOrigin::TopRight,
            "Bl" => RotationOrigin::BaselineLeft,
            "Bc" => RotationOrigin::BaselineCenter,
            "Br" => RotationOrigin::BaselineRight,
            _ => return None,
        })
    }
}

#[derive(Debug)]
pub struct RotateAtom {
    /// Degrees, counter-clockwise.
    pub angle: f64,
    pub origin: RotationOrigin,
    pub content: SharedAtom,
}

impl RotateAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        let (w, h, d) = (inner.width, inner.height, inner.depth);
        // pivot in baseline coordinates, y grows upwards
        let (px, py) = match self.origin {
            RotationOrigin::BottomLeft => (0.0, -d),
            RotationOrigin::BottomCenter => (w * 0.5, -d),
            RotationOrigin::BottomRight => (w, -d),
            RotationOrigin::CenterLeft => (0.0, (h - d) * 0.5),
            RotationOrigin::Center => (w * 0.5, (h - d) * 0.5),
            RotationOrigin::CenterRight => (w, (h - d) * 0.5),
            RotationOrigin::TopLeft => (0.0, h),
            RotationOrigin::TopCenter => (w * 0.5, h),
            RotationOrigin::TopRight => (w, h),
            RotationOrigin::BaselineLeft => (0.0, 0.0),
            RotationOrigin::BaselineCenter => (w * 0.5, 0.0),
            RotationOrigin::BaselineRight => (w, 0.0),
            RotationOrigin::Point(x, y) => (x.to_px(env), y.to_px(env)),
        };
        let angle = self.angle.to_radians();
        let (sin, cos) = angle.sin_cos();
        let rotate = |x: f64, y: f64| {
            let (rx, ry) = (x - px, y - py);
            (px + rx * cos - ry * sin, py + rx * sin + ry * cos)
        };
        let corners = [
            rotate(0.0, -d),
            rotate(w, -d),
            rotate(w, h),
            rotate(0.0, h),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);
        // the image of the content's baseline-left corner is the renderer's
        // anchor; dy is measured downwards
        let anchor = rotate(0.0, 0.0);
        Ok(BoxNode::new(
            BoxKind::Rotate {
                angle,
                dx: anchor.0 - min_x,
                dy: -anchor.1,
                content: Box::new(inner),
            },
            max_x - min_x,
            max_y.max(0.0),
            (-min_y).max(0.0),
        ))
    }
}

/// `\raisebox{len}[height][depth]{..}`.
#[derive(Debug)]
pub struct RaiseAtom {
    pub content: SharedAtom,
    pub raise: Length,
    pub height: Option<Length>,
    pub depth: Option<Length>,
}

impl RaiseAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let raise = self.raise.to_px(env);
        let inner = self.content.create_box(env)?.shifted(-raise);
        let width = inner.width;
        let height = match self.height {
            Some(h) => h.to_px(env),
            None => (inner.height + raise).max(0.0),
        };
        let depth = match self.depth {
            Some(d) => d.to_px(env),
            None => (inner.depth - raise).max(0.0),
        };
        Ok(BoxNode::new(
            BoxKind::Shift(Box::new(inner)),
            width,
            height,
            depth,
        ))
    }
}

#[derive(Debug)]
pub struct ResizeAtom {
    pub content: SharedAtom,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub keep_aspect: bool,
}

impl ResizeAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        let mut sx = self
            .width
            .map(|w| w.to_px(env) / inner.width.max(f64::MIN_POSITIVE))
            .unwrap_or(1.0);
        let mut sy = self
            .height
            .map(|h| h.to_px(env) / inner.total_height().max(f64::MIN_POSITIVE))
            .unwrap_or(1.0);
        if self.keep_aspect {
            let s = match (self.width, self.height) {
                (Some(_), None) => sx,
                (None, Some(_)) => sy,
                _ => sx.min(sy),
            };
            sx = s;
            sy = s;
        }
        if !sx.is_finite() {
            sx = 1.0;
        }
        if !sy.is_finite() {
            sy = 1.0;
        }
        let (w, h, d) = (inner.width * sx, inner.height * sy, inner.depth * sy);
        Ok(BoxNode::new(
            BoxKind::Scale {
                sx,
                sy,
                content: Box::new(inner),
            },
            w,
            h,
            d,
        ))
    }
}

/// Overrides the glue class of its content on both sides.
#[derive(Debug)]
pub struct TypedAtom {
    pub left: AtomType,
    pub right: AtomType,
    pub content: SharedAtom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeKind {
    Horizontal,
    Slash,
    Backslash,
    Cross,
}

/// `\cancel`, `\bcancel`, `\xcancel` and `\st`.
#[derive(Debug)]
pub struct StrikeAtom {
    pub kind: StrikeKind,
    pub content: SharedAtom,
}

impl StrikeAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        let (w, h, d) = (inner.width, inner.height, inner.depth);
        let t = env.default_rule_thickness();
        // a thin rule rotated corner to corner, anchored bottom-left (up)
        // or top-left (down)
        let diagonal = |up: bool| {
            let angle = (h + d).atan2(w) * if up { 1.0 } else { -1.0 };
            let len = (w * w + (h + d) * (h + d)).sqrt();
            let line = rule!(width: len, height: t);
            BoxNode::new(
                BoxKind::Rotate {
                    angle,
                    dx: 0.0,
                    dy: if up { d } else { -h },
                    content: Box::new(line),
                },
                w,
                h,
                d,
            )
        };
        let mut layers = vec![inner];
        match self.kind {
            StrikeKind::Horizontal => {
                let mid = (h - d) * 0.5;
                layers.push(rule!(width: w, height: t).shifted(-mid));
            }
            StrikeKind::Slash => layers.push(diagonal(true)),
            StrikeKind::Backslash => layers.push(diagonal(false)),
            StrikeKind::Cross => {
                layers.push(diagonal(true));
                layers.push(diagonal(false));
            }
        }
        Ok(BoxNode::new(BoxKind::Overlap(layers), w, h, d))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Box,
    Oval,
    Shadow,
}

/// `\fbox`, `\ovalbox`, `\shadowbox`.
#[derive(Debug)]
pub struct FramedAtom {
    pub kind: FrameKind,
    pub content: SharedAtom,
}

impl FramedAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let inner = self.content.create_box(env)?;
        let thickness = Length::new(0.75, Unit::Pt).to_px(env);
        let space = Length::new(0.65, Unit::Ex).to_px(env);
        let pad = thickness + space;
        let (w, h, d) = (
            inner.width + 2.0 * pad,
            inner.height + pad,
            inner.depth + pad,
        );
        let frame = FrameBox {
            content: Box::new(inner),
            thickness,
            space,
        };
        let kind = match self.kind {
            FrameKind::Box => BoxKind::Framed(frame),
            FrameKind::Oval => BoxKind::Oval(frame),
            FrameKind::Shadow => BoxKind::Shadow {
                frame,
                shadow: 4.0 * thickness,
            },
        };
        let extra = match self.kind {
            FrameKind::Shadow => 4.0 * thickness,
            _ => 0.0,
        };
        Ok(BoxNode::new(kind, w + extra, h, d + extra))
    }
}

/// Backend-rendered plain text (`\text`, `\mbox`).
#[derive(Debug)]
pub struct TextAtom {
    pub text: String,
}

impl TextAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let size = env.size();
        let mut width = 0.0;
        let mut height: f64 = 0.0;
        let mut depth: f64 = 0.0;
        let fallback = env.space().max(0.5 * env.quad());
        for code in self.text.chars() {
            match env.ctx.fonts.metrics(CharFont::new(env.font_id, code)) {
                Ok(m) => {
                    width += m.width * size;
                    height = height.max(m.height * size);
                    depth = depth.max(m.depth * size);
                }
                Err(_) => width += fallback,
            }
        }
        Ok(BoxNode::new(
            BoxKind::Text(TextBox {
                text: self.text.clone(),
                font: env.font_id,
                size,
            }),
            width,
            height.max(env.x_height()),
            depth,
        ))
    }
}

/// A worked long division, quotient above the overline.
#[derive(Debug)]
pub struct LongDivAtom {
    pub divisor: i64,
    pub dividend: i64,
}

impl LongDivAtom {
    /// The rows of the worked division, top to bottom, with the indent of
    /// each row in digit positions.
    fn steps(&self) -> Vec<(usize, String)> {
        let dividend = self.dividend.to_string();
        let mut rows = Vec::new();
        let mut remainder: i64 = 0;
        for (i, digit) in dividend.bytes().enumerate() {
            remainder = remainder * 10 + i64::from(digit - b'0');
            if remainder >= self.divisor {
                let consumed = i + 1;
                let product = (remainder / self.divisor) * self.divisor;
                let text = product.to_string();
                rows.push((consumed.saturating_sub(text.len()), text));
                remainder -= product;
                let rem = remainder.to_string();
                rows.push((consumed.saturating_sub(rem.len()), rem));
            }
        }
        if rows.is_empty() {
            rows.push((0, remainder.to_string()));
        }
        rows
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let size = env.size();
        let digit_width = env
            .ctx
            .fonts
            .metrics(CharFont::new(env.font_id, '0'))
            .map(|m| m.width * size)
            .unwrap_or(0.5 * env.quad());
        let text_row = |text: &str, env: &Environment| -> LayoutResult<BoxNode> {
            let mut hb = builders::HBox::new();
            for code in text.chars() {
                hb.add(glyph_box(CharFont::new(env.font_id, code), env)?);
            }
            Ok(hb.build())
        };

        let quotient = (self.dividend / self.divisor).to_string();
        let dividend = self.dividend.to_string();
        let rule_t = env.default_rule_thickness();
        let clearance = 2.0 * rule_t;

        let mut vb = builders::VBox::new();
        // quotient, right-aligned over the dividend
        let q_row = text_row(&quotient, env)?;
        let q_pad = dividend.len().saturating_sub(quotient.len());
        let divisor_row = text_row(&format!("{})", self.divisor), env)?;
        let indent = divisor_row.width;
        vb.add(hbox![
            kern!(horz: indent + digit_width * q_pad as f64),
            q_row
        ]);
        // overlined dividend with the divisor to its left
        let head = builders::over_bar(text_row(&dividend, env)?, clearance, rule_t);
        vb.add(hbox![divisor_row, head]);
        for (offset, text) in self.steps() {
            vb.add(kern!(vert: clearance));
            let row = text_row(&text, env)?;
            vb.add(hbox![
                kern!(horz: indent + digit_width * offset as f64),
                row
            ]);
        }
        Ok(vb.build())
    }
}
