//! Fractions, following the TeXBook's rules 15a–15d.

use crate::boxes::{builders, BoxNode};
use crate::dimensions::{Length, Unit};
use crate::environment::Environment;
use crate::error::LayoutResult;

use super::SharedAtom;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarThickness {
    Default,
    /// `\atop` and binomials: no bar at all.
    None,
    Unit(Length),
}

#[derive(Debug)]
pub struct FractionAtom {
    pub numerator: SharedAtom,
    pub denominator: SharedAtom,
    pub thickness: BarThickness,
    /// Pad the fraction with thin math spaces on both sides.
    pub use_kern: bool,
}

impl FractionAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let num = self.numerator.create_box(&env.num_style())?;
        let den = self.denominator.create_box(&env.dnom_style())?;

        let t = match self.thickness {
            BarThickness::Default => env.default_rule_thickness(),
            BarThickness::None => 0.0,
            BarThickness::Unit(len) => len.to_px(env),
        };

        let width = num.width.max(den.width);
        let center = |child: BoxNode| {
            let lead = (width - child.width) * 0.5;
            let mut hb = builders::HBox::new();
            hb.add(kern!(horz: lead));
            hb.add(child);
            hb.set_width(width);
            hb.build()
        };
        let num = center(num);
        let den = center(den);

        let axis = env.axis_height();
        let default_t = env.default_rule_thickness();
        let (num1, num2, num3) = env.num_shifts();
        let (denom1, denom2) = env.denom_shifts();

        // 15a/15b: initial shifts by style and bar presence
        let mut u = if env.style.is_display() {
            num1
        } else if t != 0.0 {
            num2
        } else {
            num3
        };
        let mut v = if env.style.is_display() {
            denom1
        } else {
            denom2
        };

        if t == 0.0 {
            // 15c: no bar; keep a minimum clearance between the parts
            let phi = if env.style.is_display() {
                7.0 * default_t
            } else {
                3.0 * default_t
            };
            let actual = (u - num.depth) - (den.height - v);
            if actual < phi {
                let bump = (phi - actual) * 0.5;
                u += bump;
                v += bump;
            }
        } else {
            // 15d: bar present; clear both sides of the rule
            let phi = if env.style.is_display() {
                3.0 * t
            } else {
                t
            };
            let over = phi - ((u - num.depth) - (axis + t * 0.5));
            if over > 0.0 {
                u += over;
            }
            let under = phi - ((axis - t * 0.5) - (den.height - v));
            if under > 0.0 {
                v += under;
            }
        }

        let above_gap = (u - num.depth) - (axis + t * 0.5);
        let below_gap = (axis - t * 0.5) - (den.height - v);

        let mut vb = builders::VBox::new();
        vb.add(num);
        vb.add(kern!(vert: above_gap));
        if t != 0.0 {
            vb.add(rule!(width: width, height: t));
        }
        vb.add(kern!(vert: below_gap));
        vb.add(den);
        vb.raise(v);
        let inner = vb.build();

        if self.use_kern {
            let thin = Length::new(3.0, Unit::Mu).to_px(env);
            Ok(hbox![kern!(horz: thin), inner, kern!(horz: thin)])
        } else {
            Ok(inner)
        }
    }
}
