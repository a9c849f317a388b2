//! Splitting an over-wide formula into lines.
//!
//! The breaker walks the root HBox left to right, accumulating width. At
//! the child that overflows the budget it takes the nearest recorded break
//! position at or before it, descending into nested HBoxes when they can
//! absorb the split, and stitches the halves into a stack of lines.

use log::debug;

use crate::boxes::{builders, BoxKind, BoxNode, HorizontalBox};

/// Where to cut an HBox: directly between children, or inside a nested
/// HBox child.
enum BreakPlan {
    At(usize),
    Descend { child: usize, plan: Box<BreakPlan> },
}

/// Break `node` into lines no wider than `width`, separated by
/// `interline`. Boxes that fit (or record no break positions) come back
/// unchanged.
pub fn split(node: BoxNode, width: f64, interline: f64) -> BoxNode {
    if width <= 0.0 || node.width <= width {
        return node;
    }
    if !matches!(node.kind, BoxKind::HBox(_)) {
        return node;
    }

    let mut lines = builders::VBox::new();
    let mut first_height = None;
    let mut current = node;
    loop {
        if current.width <= width {
            break;
        }
        let plan = match &current.kind {
            BoxKind::HBox(hb) => find_break(hb, width),
            _ => None,
        };
        let Some(plan) = plan else { break };
        let (line, rest) = apply_plan(current, &plan);
        debug!("breaker: line of width {:.1}", line.width);
        first_height.get_or_insert(line.height);
        lines.add_line(line, interline);
        current = rest;
    }

    if lines.is_empty() {
        return current;
    }
    let last_depth = current.depth;
    first_height.get_or_insert(current.height);
    lines.add_line(current, interline);

    // the stack keeps the first line's baseline
    let mut vb = lines;
    let first = first_height.unwrap_or(0.0);
    let raise = vb.total_size() - first - last_depth;
    vb.raise(raise);
    vb.build_lines()
}

/// First overflow point and the best break for it, per the recorded break
/// positions.
fn find_break(hb: &HorizontalBox, width: f64) -> Option<BreakPlan> {
    let mut cum = 0.0;
    for (i, child) in hb.children.iter().enumerate() {
        let next = cum + child.width;
        if next > width {
            let pos = hb
                .break_positions
                .iter()
                .copied()
                .filter(|&p| p <= i && p > 0)
                .max();
            // a nested HBox may offer a finer-grained split
            if let BoxKind::HBox(sub) = &child.kind {
                if let Some(sub_plan) = find_break(sub, width - cum) {
                    let w = plan_width(sub, &sub_plan);
                    if cum + w <= width || pos.is_none() {
                        return Some(BreakPlan::Descend {
                            child: i,
                            plan: Box::new(sub_plan),
                        });
                    }
                }
            }
            if let Some(pos) = pos {
                return Some(BreakPlan::At(pos));
            }
        }
        cum = next;
    }
    None
}

/// Width of the prefix a plan would keep.
fn plan_width(hb: &HorizontalBox, plan: &BreakPlan) -> f64 {
    match plan {
        BreakPlan::At(pos) => hb.children.iter().take(*pos).map(|c| c.width).sum(),
        BreakPlan::Descend { child, plan } => {
            let before: f64 = hb.children.iter().take(*child).map(|c| c.width).sum();
            match &hb.children[*child].kind {
                BoxKind::HBox(sub) => before + plan_width(sub, plan),
                _ => before,
            }
        }
    }
}

/// Execute a plan, producing the kept line and the remainder.
fn apply_plan(node: BoxNode, plan: &BreakPlan) -> (BoxNode, BoxNode) {
    let BoxKind::HBox(hb) = node.kind else {
        unreachable!("plans are only made for HBoxes");
    };
    match plan {
        BreakPlan::At(pos) => rebuild_halves(hb, *pos),
        BreakPlan::Descend { child, plan } => {
            let mut children = hb.children;
            let rest_children = children.split_off(child + 1);
            let descended = children.pop().expect("child index in range");
            let (sub_first, sub_rest) = apply_plan(descended, plan);
            let first = {
                let mut b = builders::HBox::new();
                for c in children {
                    b.add(c);
                }
                b.add(sub_first);
                b.build()
            };
            let rest = {
                let mut b = builders::HBox::new();
                b.add(sub_rest);
                for c in rest_children {
                    b.add(c);
                }
                b.build()
            };
            (first, rest)
        }
    }
}

/// Split children at `pos`, keeping break positions on the correct sides.
fn rebuild_halves(hb: HorizontalBox, pos: usize) -> (BoxNode, BoxNode) {
    let mut children = hb.children;
    let rest: Vec<BoxNode> = children.split_off(pos);
    let mut first = builders::HBox::new();
    for c in children {
        first.add(c);
    }
    let mut second = builders::HBox::new();
    for (i, c) in rest.into_iter().enumerate() {
        if hb.break_positions.contains(&(pos + i)) && i > 0 {
            second.mark_break();
        }
        second.add(c);
    }
    (first.build(), second.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(width: f64) -> BoxNode {
        rule!(width: width, height: 4.0)
    }

    fn hbox_with_breaks(widths: &[f64], breaks: &[usize]) -> BoxNode {
        let mut hb = builders::HBox::new();
        for (i, &w) in widths.iter().enumerate() {
            if breaks.contains(&i) {
                hb.mark_break();
            }
            hb.add(piece(w));
        }
        hb.build()
    }

    #[test]
    fn fitting_box_is_untouched() {
        let node = hbox_with_breaks(&[10.0, 10.0], &[1]);
        let out = split(node, 100.0, 2.0);
        assert!(matches!(out.kind, BoxKind::HBox(_)));
        assert_eq!(out.width, 20.0);
    }

    #[test]
    fn no_break_positions_means_no_split() {
        let node = hbox_with_breaks(&[30.0, 30.0, 30.0], &[]);
        let out = split(node, 40.0, 2.0);
        assert!(matches!(out.kind, BoxKind::HBox(_)));
        assert_eq!(out.width, 90.0);
    }

    #[test]
    fn splits_at_the_recorded_position() {
        let node = hbox_with_breaks(&[30.0, 30.0, 30.0], &[1, 2]);
        let out = split(node, 40.0, 2.0);
        match &out.kind {
            BoxKind::Line(vb) => {
                assert!(vb.children.len() >= 3, "two lines and an interline strut");
                assert!(vb.children[0].width <= 40.0);
            }
            other => panic!("expected a line stack, got {:?}", std::mem::discriminant(other)),
        }
    }

    #[test]
    fn keeps_splitting_until_lines_fit() {
        let node = hbox_with_breaks(&[20.0, 20.0, 20.0, 20.0], &[1, 2, 3]);
        let out = split(node, 25.0, 2.0);
        match &out.kind {
            BoxKind::Line(vb) => {
                let wide = vb.children.iter().filter(|c| c.width > 25.0).count();
                assert_eq!(wide, 0, "every line fits the budget");
            }
            _ => panic!("expected a line stack"),
        }
    }
}
