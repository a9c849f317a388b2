//! The atom tree: every parsed construct is an [`Atom`] that knows how to
//! produce a box for the current environment.
//!
//! Atoms are shared immutable nodes (`Rc`); layout never mutates them. The
//! deep inheritance of classic TeX implementations maps onto one sum type
//! with the atom type carried explicitly on every variant.

pub mod accent;
pub mod basic;
pub mod fenced;
pub mod fraction;
pub mod matrix;
pub mod radical;
pub mod row;
pub mod scripts;

use std::rc::Rc;

use crate::boxes::BoxNode;
use crate::environment::Environment;
use crate::error::LayoutResult;

pub use self::accent::AccentedAtom;
pub use self::basic::{
    CharAtom, ColorAtom, FixedCharAtom, FontStyleAtom, FontStyleKind, FramedAtom, FrameKind,
    LongDivAtom, PhantomAtom, RaiseAtom, ReflectAtom, ResizeAtom, RotateAtom, RotationOrigin,
    RuleAtom, ScaleAtom, SpaceAtom, SpaceKind, StrikeAtom, StrikeKind, StyleAtom, SymbolAtom,
    TextAtom, TypedAtom,
};
pub use self::fenced::{FencedAtom, SizedDelimiterAtom};
pub use self::fraction::{BarThickness, FractionAtom};
pub use self::matrix::{ColumnSpec, MatrixAtom, MatrixVariant, MulticolumnAtom};
pub use self::radical::RadicalAtom;
pub use self::row::{RowAtom, VRowAtom};
pub use self::scripts::{
    BigOperatorAtom, CumulativeScriptsAtom, OverlineAtom, OverUnderDelimiterAtom, ScriptsAtom,
    UnderOverAtom, XArrowAtom,
};

pub type SharedAtom = Rc<Atom>;

/// The glue-relevant class of an atom, plus the auxiliary classes the
/// parser needs for arrays and accents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AtomType {
    Ordinary = 0,
    BigOperator = 1,
    BinaryOperator = 2,
    Relation = 3,
    Opening = 4,
    Closing = 5,
    Punctuation = 6,
    Inner = 7,
    Accent = 8,
    Intertext = 9,
    Multicolumn = 10,
    Hline = 11,
    Multirow = 12,
    None = 13,
}

impl AtomType {
    pub fn from_name(name: &str) -> Option<AtomType> {
        Some(match name {
            "ord" => AtomType::Ordinary,
            "op" => AtomType::BigOperator,
            "bin" => AtomType::BinaryOperator,
            "rel" => AtomType::Relation,
            "open" => AtomType::Opening,
            "close" => AtomType::Closing,
            "punct" => AtomType::Punctuation,
            "inner" => AtomType::Inner,
            "acc" => AtomType::Accent,
            _ => return None,
        })
    }

    /// Index into the glue table; everything past `inner` reads as ordinary.
    pub fn glue_index(self) -> usize {
        let i = self as u8;
        if i <= AtomType::Inner as u8 {
            i as usize
        } else {
            0
        }
    }
}

/// Whether a big operator typesets its scripts above/below or to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitsType {
    /// Limits in display style, scripts otherwise.
    Normal,
    Limits,
    NoLimits,
}

#[derive(Debug)]
pub enum Atom {
    Char(CharAtom),
    Symbol(SymbolAtom),
    FixedChar(FixedCharAtom),
    Space(SpaceAtom),
    Rule(RuleAtom),
    BreakMark,
    Empty,
    Phantom(PhantomAtom),
    Color(ColorAtom),
    FontStyle(FontStyleAtom),
    Style(StyleAtom),
    Scale(ScaleAtom),
    Reflect(ReflectAtom),
    Rotate(RotateAtom),
    Raise(RaiseAtom),
    Resize(ResizeAtom),
    Typed(TypedAtom),
    Strike(StrikeAtom),
    Framed(FramedAtom),
    Text(TextAtom),
    Row(RowAtom),
    VRow(VRowAtom),
    Scripts(ScriptsAtom),
    CumulativeScripts(CumulativeScriptsAtom),
    BigOperator(BigOperatorAtom),
    Overline(OverlineAtom),
    SizedDelimiter(SizedDelimiterAtom),
    UnderOver(UnderOverAtom),
    OverUnderDelimiter(OverUnderDelimiterAtom),
    XArrow(XArrowAtom),
    Accented(AccentedAtom),
    Fraction(FractionAtom),
    Radical(RadicalAtom),
    Fenced(FencedAtom),
    Matrix(MatrixAtom),
    Multicolumn(MulticolumnAtom),
    Hline,
    LongDiv(LongDivAtom),
}

impl Atom {
    /// Atom class seen by a left neighbour when choosing glue.
    pub fn left_type(&self) -> AtomType {
        match self {
            Atom::Char(_) | Atom::FixedChar(_) | Atom::Text(_) => AtomType::Ordinary,
            Atom::Symbol(sym) => sym.spec.atom_type,
            Atom::Space(_) | Atom::BreakMark => AtomType::None,
            Atom::Rule(_) | Atom::Empty => AtomType::Ordinary,
            Atom::Phantom(p) => p.content.left_type(),
            Atom::Color(c) => c.content.left_type(),
            Atom::FontStyle(fs) => fs.content.left_type(),
            Atom::Style(s) => s.content.left_type(),
            Atom::Scale(s) => s.content.left_type(),
            Atom::Reflect(r) => r.content.left_type(),
            Atom::Rotate(r) => r.content.left_type(),
            Atom::Raise(r) => r.content.left_type(),
            Atom::Resize(r) => r.content.left_type(),
            Atom::Typed(t) => t.left,
            Atom::Strike(s) => s.content.left_type(),
            Atom::Framed(_) => AtomType::Ordinary,
            Atom::Row(row) => row.left_type(),
            Atom::VRow(_) => AtomType::Ordinary,
            Atom::Scripts(s) => s.base_type(),
            Atom::CumulativeScripts(c) => c.base.left_type(),
            Atom::BigOperator(_) => AtomType::BigOperator,
            Atom::Overline(_) => AtomType::Ordinary,
            Atom::SizedDelimiter(_) => AtomType::Ordinary,
            Atom::UnderOver(u) => u.base.left_type(),
            Atom::OverUnderDelimiter(_) => AtomType::Inner,
            Atom::XArrow(_) => AtomType::Relation,
            Atom::Accented(a) => a.base.left_type(),
            Atom::Fraction(_) => AtomType::Inner,
            Atom::Radical(_) => AtomType::Ordinary,
            Atom::Fenced(_) => AtomType::Inner,
            Atom::Matrix(_) => AtomType::Inner,
            Atom::Multicolumn(_) => AtomType::Multicolumn,
            Atom::Hline => AtomType::Hline,
            Atom::LongDiv(_) => AtomType::Inner,
        }
    }

    /// Atom class seen by a right neighbour. Differs from the left type
    /// only for rows and explicitly re-typed atoms.
    pub fn right_type(&self) -> AtomType {
        match self {
            Atom::Row(row) => row.right_type(),
            Atom::Typed(t) => t.right,
            Atom::Scripts(s) => s.base_type(),
            _ => self.left_type(),
        }
    }

    pub fn limits(&self) -> LimitsType {
        match self {
            Atom::BigOperator(op) => op.limits,
            Atom::Symbol(sym) => sym.limits,
            _ => LimitsType::Normal,
        }
    }

    /// Produce geometry for this atom under `env`.
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        match self {
            Atom::Char(a) => a.create_box(env),
            Atom::Symbol(a) => a.create_box(env),
            Atom::FixedChar(a) => a.create_box(env),
            Atom::Space(a) => a.create_box(env),
            Atom::Rule(a) => a.create_box(env),
            Atom::BreakMark | Atom::Empty => Ok(kern!(horz: 0.0)),
            Atom::Phantom(a) => a.create_box(env),
            Atom::Color(a) => a.create_box(env),
            Atom::FontStyle(a) => a.create_box(env),
            Atom::Style(a) => a.create_box(env),
            Atom::Scale(a) => a.create_box(env),
            Atom::Reflect(a) => a.create_box(env),
            Atom::Rotate(a) => a.create_box(env),
            Atom::Raise(a) => a.create_box(env),
            Atom::Resize(a) => a.create_box(env),
            Atom::Typed(a) => a.content.create_box(env),
            Atom::Strike(a) => a.create_box(env),
            Atom::Framed(a) => a.create_box(env),
            Atom::Text(a) => a.create_box(env),
            Atom::Row(a) => a.create_box(env),
            Atom::VRow(a) => a.create_box(env),
            Atom::Scripts(a) => a.create_box(env),
            Atom::CumulativeScripts(a) => a.create_box(env),
            Atom::BigOperator(a) => a.create_box(env),
            Atom::Overline(a) => a.create_box(env),
            Atom::SizedDelimiter(a) => a.create_box(env),
            Atom::UnderOver(a) => a.create_box(env),
            Atom::OverUnderDelimiter(a) => a.create_box(env),
            Atom::XArrow(a) => a.create_box(env),
            Atom::Accented(a) => a.create_box(env),
            Atom::Fraction(a) => a.create_box(env),
            Atom::Radical(a) => a.create_box(env),
            Atom::Fenced(a) => a.create_box(env),
            Atom::Matrix(a) => a.create_box(env),
            Atom::Multicolumn(a) => a.create_box(env),
            Atom::Hline => Ok(kern!(horz: 0.0)),
            Atom::LongDiv(a) => a.create_box(env),
        }
    }

    /// The character this atom ultimately draws, when it is one glyph in
    /// the current font; drives ligature and kern lookups in rows.
    pub fn char_symbol(&self, env: &Environment) -> Option<crate::resources::fonts::CharFont> {
        match self {
            Atom::Char(c) => Some(c.char_font(env)),
            Atom::FixedChar(fc) => Some(fc.cf),
            Atom::Symbol(sym) => Some(sym.spec.char_font),
            _ => None,
        }
    }

    pub fn is_digit(&self) -> bool {
        matches!(self, Atom::Char(c) if c.code.is_ascii_digit())
    }
}

/// Wrap a list of atoms as a single atom: the sole member itself, or a Row.
pub fn rowify(mut atoms: Vec<SharedAtom>) -> SharedAtom {
    if atoms.len() == 1 {
        atoms.remove(0)
    } else {
        Rc::new(Atom::Row(RowAtom::new(atoms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_type_names_round_trip() {
        for (name, ty) in [
            ("ord", AtomType::Ordinary),
            ("op", AtomType::BigOperator),
            ("bin", AtomType::BinaryOperator),
            ("rel", AtomType::Relation),
            ("open", AtomType::Opening),
            ("close", AtomType::Closing),
            ("punct", AtomType::Punctuation),
            ("acc", AtomType::Accent),
        ] {
            assert_eq!(AtomType::from_name(name), Some(ty));
        }
        assert_eq!(AtomType::from_name("sideways"), None);
    }

    #[test]
    fn aux_types_collapse_for_glue() {
        assert_eq!(AtomType::Hline.glue_index(), 0);
        assert_eq!(AtomType::Inner.glue_index(), 7);
    }
}
