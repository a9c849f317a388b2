//! Horizontal and vertical sequences of atoms.
//!
//! [`RowAtom`] is where the inter-atom machinery lives: the bin→ord
//! demotion, ligature collapsing, font kerning, glue insertion and break
//! position recording all happen while its children are converted to boxes.

use log::trace;

use crate::boxes::{builders, Alignment, BoxNode};
use crate::dimensions::{Length, Unit};
use crate::environment::Environment;
use crate::error::LayoutResult;

use super::{Atom, AtomType, SharedAtom};

/// What the previous element of a row was, as seen by glue and bin→ord
/// decisions.
#[derive(Clone, Copy, PartialEq)]
enum Prev {
    Start,
    Kern,
    Solid(AtomType),
}

/// Atom types that keep a binary operator binary when preceding it.
fn demotes_bin(t: AtomType) -> bool {
    matches!(
        t,
        AtomType::BinaryOperator
            | AtomType::BigOperator
            | AtomType::Relation
            | AtomType::Opening
            | AtomType::Punctuation
    )
}

/// Atom types that may participate in ligatures and kerning.
fn lig_kern_type(t: AtomType) -> bool {
    matches!(
        t,
        AtomType::Ordinary
            | AtomType::BigOperator
            | AtomType::BinaryOperator
            | AtomType::Relation
            | AtomType::Opening
            | AtomType::Closing
            | AtomType::Punctuation
    )
}

#[derive(Debug)]
pub struct RowAtom {
    pub elements: Vec<SharedAtom>,
    pub breakable: bool,
    /// Record a break position before every child, not just digits and
    /// break marks.
    pub break_everywhere: bool,
}

impl RowAtom {
    pub fn new(elements: Vec<SharedAtom>) -> RowAtom {
        RowAtom {
            elements,
            breakable: true,
            break_everywhere: false,
        }
    }

    /// Wrap a single atom, flattening redundant row nesting.
    pub fn of(atom: SharedAtom) -> RowAtom {
        match &*atom {
            Atom::Row(inner) => RowAtom {
                elements: inner.elements.clone(),
                breakable: inner.breakable,
                break_everywhere: inner.break_everywhere,
            },
            _ => RowAtom::new(vec![atom]),
        }
    }

    pub fn left_type(&self) -> AtomType {
        self.elements
            .first()
            .map(|a| a.left_type())
            .unwrap_or(AtomType::Ordinary)
    }

    pub fn right_type(&self) -> AtomType {
        self.elements
            .last()
            .map(|a| a.right_type())
            .unwrap_or(AtomType::Ordinary)
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        self.layout(env, Prev::Start)
    }

    fn layout(&self, env: &Environment, incoming: Prev) -> LayoutResult<BoxNode> {
        let mut hbox = builders::HBox::new();
        let mut prev = incoming;
        let mut pending_break = false;

        let mut i = 0;
        while i < self.elements.len() {
            let atom = &self.elements[i];

            if matches!(**atom, Atom::BreakMark) {
                pending_break = true;
                i += 1;
                continue;
            }

            let is_kern = matches!(**atom, Atom::Space(_) | Atom::Empty);
            let next = self.elements.get(i + 1);

            // bin → ord: `+` at the start of a row, after another operator,
            // or before a closing construct is an ordinary sign.
            let mut left = atom.left_type();
            let mut right = atom.right_type();
            if left == AtomType::BinaryOperator {
                let after_bin = match prev {
                    Prev::Start => true,
                    Prev::Kern => false,
                    Prev::Solid(t) => demotes_bin(t),
                };
                if after_bin || next.is_none() {
                    left = AtomType::Ordinary;
                    right = AtomType::Ordinary;
                }
            }
            if right == AtomType::BinaryOperator {
                if let Some(next) = next {
                    if matches!(
                        next.left_type(),
                        AtomType::Relation | AtomType::Closing | AtomType::Punctuation
                    ) {
                        left = AtomType::Ordinary;
                        right = AtomType::Ordinary;
                    }
                }
            }

            // glue between solid neighbours
            if let Prev::Solid(prev_type) = prev {
                if !is_kern {
                    if let Some(spec) = env.ctx.glue.lookup(prev_type, left, env.style) {
                        let mu = Length::new(1.0, Unit::Mu).to_px(env);
                        trace!(
                            "glue '{}' between {:?} and {:?}",
                            spec.name,
                            prev_type,
                            left
                        );
                        hbox.add(builders::glue(
                            spec.space * mu,
                            spec.stretch * mu,
                            spec.shrink * mu,
                        ));
                    }
                }
            }

            // ligatures and kerning between character symbols
            let mut kern = 0.0;
            let mut node = None;
            if right == AtomType::Ordinary {
                if let Some(mut cf) = atom.char_symbol(env) {
                    let mut j = i;
                    let mut replaced = false;
                    while let Some(follow) = self.elements.get(j + 1) {
                        if !lig_kern_type(follow.left_type()) {
                            break;
                        }
                        let Some(next_cf) = follow.char_symbol(env) else {
                            break;
                        };
                        if next_cf.font != cf.font {
                            break;
                        }
                        if let Some(lig) = env.ctx.fonts.ligature(cf, next_cf.code) {
                            trace!("ligature {:?}+{:?} -> {:?}", cf.code, next_cf.code, lig);
                            cf = crate::resources::fonts::CharFont::new(cf.font, lig);
                            replaced = true;
                            j += 1;
                        } else {
                            kern = env.ctx.fonts.kern(cf, next_cf.code) * env.size();
                            break;
                        }
                    }
                    if replaced {
                        node = Some(super::basic::glyph_box(cf, env)?);
                        i = j;
                    }
                }
            }

            // break positions: explicit marks, digits, or everywhere
            if self.breakable
                && (pending_break || self.break_everywhere || atom.is_digit())
            {
                hbox.mark_break();
            }
            pending_break = false;

            let node = match node {
                Some(node) => node,
                None => match &**atom {
                    // nested rows see the atom to their left so their first
                    // element gets the right bin→ord treatment
                    Atom::Row(row) => row.layout(env, prev)?,
                    _ => atom.create_box(env)?,
                },
            };

            // italic correction between adjacent character glyphs
            if let (Some(cb), Some(follow)) = (node.char_box(), self.elements.get(i + 1)) {
                if follow.char_symbol(env).is_some() {
                    kern += cb.italic;
                }
            }

            hbox.add(node);
            if kern.abs() > f64::EPSILON {
                hbox.add(kern!(horz: kern));
            }

            prev = if is_kern { Prev::Kern } else { Prev::Solid(right) };
            i += 1;
        }

        Ok(hbox.build())
    }
}

/// A vertical stack of atoms (`\substack`, `\shortstack`, gathered lines).
#[derive(Debug)]
pub struct VRowAtom {
    pub elements: Vec<SharedAtom>,
    pub halign: Alignment,
    /// Baseline position: `None` keeps the last row's baseline, otherwise
    /// the stack is raised by this length.
    pub raise: Option<Length>,
    pub add_interline: bool,
}

impl VRowAtom {
    pub fn new(elements: Vec<SharedAtom>) -> VRowAtom {
        VRowAtom {
            elements,
            halign: Alignment::Center,
            raise: None,
            add_interline: false,
        }
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let mut boxes = Vec::with_capacity(self.elements.len());
        let mut width: f64 = 0.0;
        for atom in &self.elements {
            let b = atom.create_box(env)?;
            width = width.max(b.width);
            boxes.push(b);
        }
        let interline = if self.add_interline {
            env.interline.to_px(env)
        } else {
            0.0
        };
        let mut vb = builders::VBox::new();
        let count = boxes.len();
        for (idx, b) in boxes.into_iter().enumerate() {
            vb.add(hbox![align: self.halign; width: width; b]);
            if idx + 1 < count {
                vb.add(kern!(vert: interline));
            }
        }
        if let Some(raise) = self.raise {
            vb.raise(raise.to_px(env));
        }
        Ok(vb.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn row_types_come_from_the_ends() {
        let row = RowAtom::new(vec![]);
        assert_eq!(row.left_type(), AtomType::Ordinary);
        assert_eq!(row.right_type(), AtomType::Ordinary);
    }

    #[test]
    fn single_row_wrapping_flattens() {
        let inner = Rc::new(Atom::Row(RowAtom::new(vec![
            Rc::new(Atom::Empty),
            Rc::new(Atom::Empty),
        ])));
        let outer = RowAtom::of(inner);
        assert_eq!(outer.elements.len(), 2);
    }
}
