//! Incremental horizontal/vertical box builders plus the construction macros
//! the layout code leans on.

use super::{Alignment, BoxKind, BoxNode, GlueBox, HorizontalBox, VerticalBox};

macro_rules! hbox {
    (align: $align:expr; width: $width:expr; $($child:expr),* $(,)?) => ({
        let mut _hb = $crate::boxes::builders::HBox::new();
        $( _hb.add($child); )*
        _hb.set_alignment($align);
        _hb.set_width($width);
        _hb.build()
    });

    ( $($child:expr),* $(,)? ) => ({
        let mut _hb = $crate::boxes::builders::HBox::new();
        $( _hb.add($child); )*
        _hb.build()
    });
}

macro_rules! vbox {
    (raise: $raise:expr; $($child:expr),* $(,)?) => ({
        let mut _vb = $crate::boxes::builders::VBox::new();
        $( _vb.add($child); )*
        _vb.raise($raise);
        _vb.build()
    });

    ( $($child:expr),* $(,)? ) => ({
        let mut _vb = $crate::boxes::builders::VBox::new();
        $( _vb.add($child); )*
        _vb.build()
    });
}

/// Fixed blank space, horizontal or vertical.
macro_rules! kern {
    (horz: $width:expr) => {
        $crate::boxes::BoxNode::new($crate::boxes::BoxKind::Strut, $width, 0.0, 0.0)
    };

    (vert: $height:expr) => {
        $crate::boxes::BoxNode::new($crate::boxes::BoxKind::Strut, 0.0, $height, 0.0)
    };
}

macro_rules! rule {
    (width: $width:expr, height: $height:expr) => {
        rule!(width: $width, height: $height, depth: 0.0)
    };

    (width: $width:expr, height: $height:expr, depth: $depth:expr) => {
        $crate::boxes::BoxNode::new($crate::boxes::BoxKind::Rule, $width, $height, $depth)
    };
}

/// Builds an HBox, tracking metrics as children arrive. A child's shift
/// moves it down, so it grows the depth and eats into the height.
#[derive(Default)]
pub struct HBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    node: HorizontalBox,
}

impl HBox {
    pub fn new() -> HBox {
        HBox::default()
    }

    pub fn add(&mut self, child: BoxNode) {
        self.width += child.width;
        self.height = self.height.max(child.height - child.shift);
        self.depth = self.depth.max(child.depth + child.shift);
        self.node.children.push(child);
    }

    pub fn len(&self) -> usize {
        self.node.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.children.is_empty()
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.node.alignment = alignment;
    }

    /// Widen to `width` without adding content; pair with an alignment.
    pub fn set_width(&mut self, width: f64) {
        self.width = self.width.max(width);
    }

    pub fn mark_break(&mut self) {
        let at = self.node.children.len();
        if self.node.break_positions.last() != Some(&at) {
            self.node.break_positions.push(at);
        }
    }

    pub fn build(self) -> BoxNode {
        BoxNode::new(BoxKind::HBox(self.node), self.width, self.height, self.depth)
    }
}

/// Builds a VBox. Children stack downwards; the baseline defaults to the
/// last child's baseline and `raise` lifts it.
#[derive(Default)]
pub struct VBox {
    pub width: f64,
    size: f64,
    raise: f64,
    last_depth: f64,
    node: VerticalBox,
}

impl VBox {
    pub fn new() -> VBox {
        VBox::default()
    }

    pub fn add(&mut self, child: BoxNode) {
        self.width = self.width.max(child.width);
        self.size += child.total_height();
        self.last_depth = child.depth;
        self.node.children.push(child);
    }

    /// Stack a formula line with `interline` blank space before it.
    pub fn add_line(&mut self, child: BoxNode, interline: f64) {
        if !self.node.children.is_empty() {
            self.add(kern!(vert: interline));
        }
        self.add(child);
    }

    pub fn len(&self) -> usize {
        self.node.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.children.is_empty()
    }

    /// Lift the baseline `raise` pixels above the last child's baseline.
    /// Negative values push it down.
    pub fn raise(&mut self, raise: f64) {
        self.raise = raise;
    }

    /// Total stacked size so far (heights plus depths).
    pub fn total_size(&self) -> f64 {
        self.size
    }

    pub fn build(self) -> BoxNode {
        let depth = self.last_depth + self.raise;
        let height = self.size - depth;
        BoxNode::new(BoxKind::VBox(self.node), self.width, height, depth)
    }

    /// Same metrics maths, but tagged as a line stack.
    pub fn build_lines(self) -> BoxNode {
        let depth = self.last_depth + self.raise;
        let height = self.size - depth;
        BoxNode::new(BoxKind::Line(self.node), self.width, height, depth)
    }
}

/// Blank elastic space from a glue spec already scaled to pixels.
pub fn glue(space: f64, stretch: f64, shrink: f64) -> BoxNode {
    BoxNode::new(BoxKind::Glue(GlueBox { stretch, shrink }), space, 0.0, 0.0)
}

/// A bar above `content`: rule of `thickness` with `clearance` blank space
/// between bar and content.
pub fn over_bar(content: BoxNode, clearance: f64, thickness: f64) -> BoxNode {
    let mut vb = VBox::new();
    vb.add(kern!(vert: thickness));
    vb.add(rule!(width: content.width, height: thickness));
    vb.add(kern!(vert: clearance));
    vb.add(content);
    vb.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hbox_sums_widths_and_tracks_extents() {
        let mut hb = HBox::new();
        hb.add(rule!(width: 2.0, height: 3.0, depth: 1.0));
        hb.add(kern!(horz: 4.0));
        hb.add(rule!(width: 1.0, height: 5.0).shifted(2.0));
        let node = hb.build();
        assert_eq!(node.width, 7.0);
        assert_eq!(node.height, 3.0);
        assert_eq!(node.depth, 3.0);
    }

    #[test]
    fn vbox_baseline_is_last_child_plus_raise() {
        let top = rule!(width: 1.0, height: 2.0);
        let base = rule!(width: 3.0, height: 4.0, depth: 1.0);
        let node = vbox![raise: 0.5; top, base];
        assert_eq!(node.width, 3.0);
        assert_eq!(node.depth, 1.5);
        assert_eq!(node.height, 7.0 - 1.5);
    }

    #[test]
    fn break_marks_deduplicate() {
        let mut hb = HBox::new();
        hb.add(kern!(horz: 1.0));
        hb.mark_break();
        hb.mark_break();
        let node = hb.build();
        match node.kind {
            crate::boxes::BoxKind::HBox(h) => assert_eq!(h.break_positions, vec![1]),
            _ => unreachable!(),
        }
    }
}
