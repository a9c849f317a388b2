//! Top-level façade: parse → build the root box → break → paint.

use std::f64::consts::FRAC_PI_2;

use log::debug;

use crate::boxes::{Alignment, BoxKind, BoxNode};
use crate::breaker;
use crate::dimensions::Length;
use crate::environment::{Environment, TexStyle};
use crate::error::Error;
use crate::graphics::{Color, Graphics2D, Stroke};
use crate::parser::parse_formula;
use crate::resources::fonts::FontId;
use crate::resources::TexContext;

/// Reusable rendering settings; [`TexRenderer::render`] is the whole
/// pipeline.
pub struct TexRenderer {
    pub width: Length,
    pub text_size: f64,
    pub line_space: Length,
    pub foreground: Color,
    /// Recoverable parse errors render as red placeholders.
    pub partial: bool,
    pub style: TexStyle,
    pub font: FontId,
}

impl Default for TexRenderer {
    fn default() -> TexRenderer {
        TexRenderer {
            width: Length::zero(),
            text_size: 20.0,
            line_space: Length::zero(),
            foreground: Color::BLACK,
            partial: false,
            style: TexStyle::DISPLAY,
            font: 0,
        }
    }
}

impl TexRenderer {
    pub fn render(&self, ctx: &TexContext, source: &str) -> Result<Render, Error> {
        let formula = parse_formula(ctx, source, self.partial)?;

        let mut env = Environment::new(ctx, self.style, self.font, self.text_size);
        env.sizes = formula.sizes;
        env.foreground = self.foreground;
        env.interline = self.line_space;
        let width_px = self.width.to_px(&env);
        env.text_width = width_px;

        let root = formula.root.create_box(&env)?;
        debug!(
            "layout done: {:.1} x {:.1}+{:.1}",
            root.width, root.height, root.depth
        );
        let interline = self.line_space.to_px(&env);
        let root = breaker::split(root, width_px, interline);

        Ok(Render {
            root,
            foreground: self.foreground,
        })
    }
}

/// A finished, paintable formula.
pub struct Render {
    root: BoxNode,
    foreground: Color,
}

impl Render {
    pub fn width(&self) -> f64 {
        self.root.width
    }

    /// Extent above the baseline.
    pub fn baseline(&self) -> f64 {
        self.root.height
    }

    /// Extent below the baseline.
    pub fn depth(&self) -> f64 {
        self.root.depth
    }

    /// Full vertical extent.
    pub fn height(&self) -> f64 {
        self.root.height + self.root.depth
    }

    pub fn root(&self) -> &BoxNode {
        &self.root
    }

    /// Paint at `(x, y)` = top-left corner of the formula's bounds.
    pub fn draw(&self, g2: &mut dyn Graphics2D, x: f64, y: f64) {
        g2.set_color(self.foreground);
        g2.set_stroke(Stroke::default());
        draw_box(g2, &self.root, x, y + self.root.height, self.foreground);
    }
}

/// Recursive painter; `(x, y)` is the baseline-left anchor of `node`.
fn draw_box(g2: &mut dyn Graphics2D, node: &BoxNode, x: f64, y: f64, inherited: Color) {
    let color = node.foreground.or(inherited);
    if color != inherited {
        g2.set_color(color);
    }
    if !node.background.is_transparent() {
        g2.set_color(node.background);
        g2.fill_rect(x, y - node.height, node.width, node.height + node.depth);
        g2.set_color(color);
    }

    match &node.kind {
        BoxKind::Strut | BoxKind::Glue(_) => {}

        BoxKind::Char(cb) => {
            g2.set_font(cb.cf.font, cb.size);
            g2.draw_char(cb.cf.code, x, y);
        }

        BoxKind::Text(tb) => {
            g2.set_font(tb.font, tb.size);
            g2.draw_text(&tb.text, x, y);
        }

        BoxKind::Rule => {
            g2.fill_rect(x, y - node.height, node.width, node.height + node.depth);
        }

        BoxKind::HBox(hb) => {
            let natural: f64 = hb.children.iter().map(|c| c.width).sum();
            let mut cx = x + match hb.alignment {
                Alignment::Center => (node.width - natural) * 0.5,
                Alignment::Right => node.width - natural,
                _ => 0.0,
            };
            for child in &hb.children {
                draw_box(g2, child, cx, y + child.shift, color);
                cx += child.width;
            }
        }

        BoxKind::VBox(vb) | BoxKind::Line(vb) => {
            let mut cy = y - node.height;
            for child in &vb.children {
                let baseline = cy + child.height;
                draw_box(g2, child, x, baseline, color);
                cy += child.height + child.depth;
            }
        }

        BoxKind::Overlap(children) => {
            for child in children {
                draw_box(g2, child, x, y + child.shift, color);
            }
        }

        BoxKind::Wrapper { content, inset } => {
            draw_box(g2, content, x + inset, y + content.shift, color);
        }

        BoxKind::Shift(content) => {
            draw_box(g2, content, x, y + content.shift, color);
        }

        BoxKind::Scale { sx, sy, content } => {
            if sx.abs() > f64::EPSILON && sy.abs() > f64::EPSILON {
                g2.scale(*sx, *sy);
                draw_box(g2, content, x / sx, y / sy, color);
                g2.scale(1.0 / sx, 1.0 / sy);
            }
        }

        BoxKind::Reflect(content) => {
            g2.scale(-1.0, 1.0);
            draw_box(g2, content, -(x + node.width), y, color);
            g2.scale(-1.0, 1.0);
        }

        BoxKind::Rotate {
            angle,
            dx,
            dy,
            content,
        } => {
            let (px, py) = (x + dx, y + dy);
            g2.rotate(-angle, px, py);
            draw_box(g2, content, px, py, color);
            g2.rotate(*angle, px, py);
        }

        BoxKind::Framed(fb) => {
            let t = fb.thickness;
            g2.set_stroke(Stroke {
                width: t,
                ..Stroke::default()
            });
            g2.draw_rect(
                x + t * 0.5,
                y - node.height + t * 0.5,
                node.width - t,
                node.height + node.depth - t,
            );
            draw_box(g2, &fb.content, x + t + fb.space, y, color);
        }

        BoxKind::Oval(fb) => {
            let t = fb.thickness;
            let r = (node.height + node.depth) * 0.5;
            g2.set_stroke(Stroke {
                width: t,
                ..Stroke::default()
            });
            g2.draw_round_rect(
                x + t * 0.5,
                y - node.height + t * 0.5,
                node.width - t,
                node.height + node.depth - t,
                r,
                r,
            );
            draw_box(g2, &fb.content, x + t + fb.space, y, color);
        }

        BoxKind::Shadow { frame, shadow } => {
            let t = frame.thickness;
            let h = node.height + node.depth - shadow;
            let w = node.width - shadow;
            g2.set_stroke(Stroke {
                width: t,
                ..Stroke::default()
            });
            g2.draw_rect(x + t * 0.5, y - node.height + t * 0.5, w - t, h - t);
            g2.fill_rect(x + shadow, y - node.height + h, w, *shadow);
            g2.fill_rect(x + w, y - node.height + shadow, *shadow, h);
            draw_box(g2, &frame.content, x + t + frame.space, y, color);
        }

        BoxKind::OverUnder(ou) => {
            draw_box(g2, &ou.base, x, y, color);
            let thickness = ou.delimiter.width;
            let (del_y, script_y) = if ou.over {
                let del_y = y - ou.base.height - thickness;
                (del_y, del_y - ou.kern)
            } else {
                let del_y = y + ou.base.depth;
                (del_y, del_y + thickness + ou.kern)
            };
            // the delimiter is built vertically; paint it turned a quarter
            // turn, spanning the base
            g2.rotate(-FRAC_PI_2, x, del_y);
            draw_box(g2, &ou.delimiter, x, del_y, color);
            g2.rotate(FRAC_PI_2, x, del_y);
            if let Some(script) = &ou.script {
                let sx = x + (node.width - script.width) * 0.5;
                let baseline = if ou.over {
                    script_y - script.depth
                } else {
                    script_y + script.height
                };
                draw_box(g2, script, sx, baseline, color);
            }
        }
    }

    if color != inherited {
        g2.set_color(inherited);
    }
}
