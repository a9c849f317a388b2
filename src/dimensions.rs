//! Units and symbolic lengths.
//!
//! A [`Length`] stays `(unit, value)` until a box is produced; conversion to
//! pixels needs the current [`Environment`] because most units depend on the
//! active font and style.

use serde_derive::{Deserialize, Serialize};

use crate::environment::Environment;

/// TeX points per big point, picas, centimeters and friends are all
/// expressed through the printer's-point factor below.
const POINT_PER_BP: f64 = 0.9962640099;
const BP_PER_PICA: f64 = 12.0;
const BP_PER_CM: f64 = 28.346456693;
const BP_PER_MM: f64 = 2.8346456693;
const BP_PER_IN: f64 = 72.0;
const BP_PER_SP: f64 = 65536.0;
const BP_PER_DD: f64 = 1.0660349422;
const BP_PER_CC: f64 = 12.7924193070;

/// The fourteen length units the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Width of an `M` in the current font.
    Em,
    /// x-height of the current font.
    Ex,
    Px,
    /// TeX point.
    Pt,
    /// Big (PostScript) point.
    Bp,
    /// Pica, 12bp.
    Pc,
    /// Math unit, 1/18 of the mu-font quad.
    Mu,
    Cm,
    Mm,
    In,
    /// Scaled point.
    Sp,
    /// Didot point.
    Dd,
    /// Cicero, 12dd.
    Cc,
    /// One default-rule-thickness of the current font.
    X8,
}

static UNIT_NAMES: phf::Map<&'static str, Unit> = phf::phf_map! {
    "em" => Unit::Em,
    "ex" => Unit::Ex,
    "px" => Unit::Px,
    "pix" => Unit::Px,
    "pixel" => Unit::Px,
    "pt" => Unit::Pt,
    "bp" => Unit::Bp,
    "pica" => Unit::Pc,
    "pc" => Unit::Pc,
    "mu" => Unit::Mu,
    "cm" => Unit::Cm,
    "mm" => Unit::Mm,
    "in" => Unit::In,
    "sp" => Unit::Sp,
    "dd" => Unit::Dd,
    "cc" => Unit::Cc,
    "x8" => Unit::X8,
};

impl Unit {
    /// Case-insensitive lookup of a unit suffix. Unknown suffixes fall back
    /// to pixels, matching the lenient behaviour of the length parser.
    pub fn from_name(name: &str) -> Unit {
        let lower = name.to_ascii_lowercase();
        UNIT_NAMES.get(lower.as_str()).copied().unwrap_or(Unit::Px)
    }

    /// Pixels per one of `self` under `env`.
    pub fn factor(self, env: &Environment) -> f64 {
        let bp = env.pixels_per_point();
        match self {
            Unit::Em => env.em(),
            Unit::Ex => env.x_height(),
            Unit::Px => 1.0,
            Unit::Pt => POINT_PER_BP * bp,
            Unit::Bp => bp,
            Unit::Pc => BP_PER_PICA * bp,
            Unit::Mu => env.mu_quad() / 18.0,
            Unit::Cm => BP_PER_CM * bp,
            Unit::Mm => BP_PER_MM * bp,
            Unit::In => BP_PER_IN * bp,
            Unit::Sp => BP_PER_SP * bp,
            Unit::Dd => BP_PER_DD * bp,
            Unit::Cc => BP_PER_CC * bp,
            Unit::X8 => env.default_rule_thickness(),
        }
    }
}

/// A symbolic length; only [`Length::to_px`] commits it to a concrete size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const fn new(value: f64, unit: Unit) -> Length {
        Length { value, unit }
    }

    pub const fn zero() -> Length {
        Length::new(0.0, Unit::Px)
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    pub fn to_px(&self, env: &Environment) -> f64 {
        self.value * self.unit.factor(env)
    }

    /// Parse a `<float><unit>` pair, e.g. `1.5em` or `-3mu`. A missing or
    /// unknown unit suffix means pixels.
    pub fn parse(text: &str) -> Option<Length> {
        let text = text.trim();
        let split = text
            .char_indices()
            .find(|&(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let (num, suffix) = text.split_at(split);
        let value: f64 = num.trim().parse().ok()?;
        Some(Length::new(value, Unit::from_name(suffix.trim())))
    }
}

impl std::ops::Neg for Length {
    type Output = Length;
    fn neg(self) -> Length {
        Length::new(-self.value, self.unit)
    }
}

impl std::ops::Mul<f64> for Length {
    type Output = Length;
    fn mul(self, rhs: f64) -> Length {
        Length::new(self.value * rhs, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_suffix_is_case_insensitive() {
        assert_eq!(Unit::from_name("EM"), Unit::Em);
        assert_eq!(Unit::from_name("Pt"), Unit::Pt);
        assert_eq!(Unit::from_name("pica"), Unit::Pc);
    }

    #[test]
    fn unknown_unit_falls_back_to_px() {
        assert_eq!(Unit::from_name("parsec"), Unit::Px);
    }

    #[test]
    fn parses_signed_floats_with_suffix() {
        assert_eq!(Length::parse("1.5em"), Some(Length::new(1.5, Unit::Em)));
        assert_eq!(Length::parse("-3mu"), Some(Length::new(-3.0, Unit::Mu)));
        assert_eq!(Length::parse("12"), Some(Length::new(12.0, Unit::Px)));
        assert_eq!(Length::parse("two em"), None);
    }
}
