//! The geometric box tree.
//!
//! A [`BoxNode`] is a rectangle with a baseline: `height` above it, `depth`
//! below it, plus a vertical `shift` applied by the parent. Boxes own their
//! children exclusively; they are produced by atom layout, painted once and
//! dropped.

#[macro_use]
pub mod builders;

use serde_derive::Serialize;

use crate::graphics::Color;
use crate::resources::fonts::{CharFont, FontId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Bottom,
    None,
}

impl Default for Alignment {
    fn default() -> Alignment {
        Alignment::None
    }
}

#[derive(Clone, Serialize)]
pub struct BoxNode {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    /// Positive shifts move the box down relative to the parent baseline.
    pub shift: f64,
    pub foreground: Color,
    pub background: Color,
    pub kind: BoxKind,
}

#[derive(Clone, Serialize)]
pub enum BoxKind {
    HBox(HorizontalBox),
    VBox(VerticalBox),
    Char(CharBox),
    /// Fixed blank space.
    Strut,
    /// Elastic blank space; `width` carries the natural size.
    Glue(GlueBox),
    Rule,
    Scale {
        sx: f64,
        sy: f64,
        content: Box<BoxNode>,
    },
    Reflect(Box<BoxNode>),
    Rotate {
        /// Radians, counter-clockwise.
        angle: f64,
        /// Translation that re-seats the rotated content on its baseline.
        dx: f64,
        dy: f64,
        content: Box<BoxNode>,
    },
    Framed(FrameBox),
    Oval(FrameBox),
    Shadow {
        frame: FrameBox,
        shadow: f64,
    },
    /// Children drawn at a common origin.
    Overlap(Vec<BoxNode>),
    /// Padding plus an optional background fill around one child.
    Wrapper {
        content: Box<BoxNode>,
        inset: f64,
    },
    /// Marks a pure vertical displacement of its child.
    Shift(Box<BoxNode>),
    /// Backend-rendered plain text.
    Text(TextBox),
    /// Stacked formula lines produced by the breaker.
    Line(VerticalBox),
    /// A base with a delimiter (and optional script) above or below.
    OverUnder(OverUnderBox),
}

#[derive(Clone, Default, Serialize)]
pub struct HorizontalBox {
    pub children: Vec<BoxNode>,
    pub alignment: Alignment,
    /// Child indices where the formula breaker may split.
    pub break_positions: Vec<usize>,
}

#[derive(Clone, Default, Serialize)]
pub struct VerticalBox {
    pub children: Vec<BoxNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CharBox {
    pub cf: CharFont,
    /// Font size in pixels the glyph is drawn at.
    pub size: f64,
    pub italic: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GlueBox {
    pub stretch: f64,
    pub shrink: f64,
}

#[derive(Clone, Serialize)]
pub struct FrameBox {
    pub content: Box<BoxNode>,
    pub thickness: f64,
    pub space: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextBox {
    pub text: String,
    pub font: FontId,
    pub size: f64,
}

#[derive(Clone, Serialize)]
pub struct OverUnderBox {
    pub base: Box<BoxNode>,
    pub delimiter: Box<BoxNode>,
    pub script: Option<Box<BoxNode>>,
    pub kern: f64,
    /// true: delimiter/script above the base; false: below.
    pub over: bool,
}

impl BoxNode {
    pub fn new(kind: BoxKind, width: f64, height: f64, depth: f64) -> BoxNode {
        BoxNode {
            width,
            height,
            depth,
            shift: 0.0,
            foreground: Color::TRANSPARENT,
            background: Color::TRANSPARENT,
            kind,
        }
    }

    pub fn total_height(&self) -> f64 {
        self.height + self.depth
    }

    pub fn shifted(mut self, shift: f64) -> BoxNode {
        self.shift += shift;
        self
    }

    pub fn with_foreground(mut self, color: Color) -> BoxNode {
        self.foreground = color;
        self
    }

    pub fn with_background(mut self, color: Color) -> BoxNode {
        self.background = color;
        self
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, BoxKind::Strut | BoxKind::Glue(_))
    }

    /// The single glyph this box paints, when it is (a chain of wrappers
    /// around) one character. Used by ligature and script kern decisions.
    pub fn char_box(&self) -> Option<&CharBox> {
        match &self.kind {
            BoxKind::Char(cb) => Some(cb),
            BoxKind::HBox(hb) => single_child(&hb.children)?.char_box(),
            BoxKind::VBox(vb) => single_child(&vb.children)?.char_box(),
            _ => None,
        }
    }

    /// Center this box vertically on the math axis.
    pub fn centered_on_axis(self, axis: f64) -> BoxNode {
        let shift = (self.height - self.depth) * 0.5 - axis;
        self.shifted(shift)
    }

    fn fmt_tree(&self, f: &mut std::fmt::Formatter, depth: usize) -> std::fmt::Result {
        for i in 0..depth {
            write!(f, "{}", if i + 1 == depth { "|-" } else { "| " })?;
        }
        let name = match &self.kind {
            BoxKind::HBox(_) => "HBox",
            BoxKind::VBox(_) => "VBox",
            BoxKind::Char(cb) => return writeln!(f, "Char({:?})", cb.cf.code),
            BoxKind::Strut => "Strut",
            BoxKind::Glue(_) => "Glue",
            BoxKind::Rule => "Rule",
            BoxKind::Scale { .. } => "Scale",
            BoxKind::Reflect(_) => "Reflect",
            BoxKind::Rotate { .. } => "Rotate",
            BoxKind::Framed(_) => "Framed",
            BoxKind::Oval(_) => "Oval",
            BoxKind::Shadow { .. } => "Shadow",
            BoxKind::Overlap(_) => "Overlap",
            BoxKind::Wrapper { .. } => "Wrapper",
            BoxKind::Shift(_) => "Shift",
            BoxKind::Text(_) => "Text",
            BoxKind::Line(_) => "Line",
            BoxKind::OverUnder(_) => "OverUnder",
        };
        writeln!(
            f,
            "{} w={:.2} h={:.2} d={:.2}{}",
            name,
            self.width,
            self.height,
            self.depth,
            if self.shift != 0.0 {
                format!(" s={:.2}", self.shift)
            } else {
                String::new()
            }
        )?;
        for child in self.children() {
            child.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }

    pub fn children(&self) -> &[BoxNode] {
        match &self.kind {
            BoxKind::HBox(hb) => &hb.children,
            BoxKind::VBox(vb) | BoxKind::Line(vb) => &vb.children,
            BoxKind::Overlap(children) => children,
            BoxKind::Scale { content, .. }
            | BoxKind::Reflect(content)
            | BoxKind::Rotate { content, .. }
            | BoxKind::Wrapper { content, .. }
            | BoxKind::Shift(content) => std::slice::from_ref(content),
            BoxKind::Framed(fb) | BoxKind::Oval(fb) | BoxKind::Shadow { frame: fb, .. } => {
                std::slice::from_ref(&fb.content)
            }
            BoxKind::OverUnder(ou) => std::slice::from_ref(&ou.base),
            _ => &[],
        }
    }
}

fn single_child(children: &[BoxNode]) -> Option<&BoxNode> {
    let mut solid = children.iter().filter(|c| !c.is_blank());
    match (solid.next(), solid.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl std::fmt::Debug for BoxNode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_box_sees_through_wrapping() {
        let cb = CharBox {
            cf: CharFont::new(0, 'x'),
            size: 10.0,
            italic: 0.0,
        };
        let node = BoxNode::new(BoxKind::Char(cb), 5.0, 4.0, 0.0);
        let mut hb = builders::HBox::new();
        hb.add(kern!(horz: 2.0));
        hb.add(node);
        let wrapped = hb.build();
        assert_eq!(wrapped.char_box().map(|c| c.cf.code), Some('x'));
    }

    #[test]
    fn axis_centering_moves_the_midpoint() {
        let node = BoxNode::new(BoxKind::Rule, 1.0, 8.0, 0.0);
        let centered = node.centered_on_axis(2.0);
        // midpoint was at 4.0 above baseline, must land on the axis
        assert_eq!(centered.shift, 2.0);
    }
}
