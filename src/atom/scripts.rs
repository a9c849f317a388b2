//! Sub/superscript attachment and the limit-style stacks above and below
//! big operators.

use crate::boxes::{builders, BoxKind, BoxNode, OverUnderBox};
use crate::dimensions::{Length, Unit};
use crate::environment::Environment;
use crate::error::LayoutResult;
use crate::resources::symbols::SymbolSpec;

use super::fenced::create_delimiter;
use super::{rowify, Atom, AtomType, LimitsType, SharedAtom};

/// Fixed space appended after a script pair.
const SCRIPT_SPACE_PT: f64 = 0.5;

#[derive(Debug)]
pub struct ScriptsAtom {
    pub base: SharedAtom,
    pub sub: Option<SharedAtom>,
    pub sup: Option<SharedAtom>,
}

impl ScriptsAtom {
    pub fn base_type(&self) -> AtomType {
        self.base.left_type()
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let base = self.base.create_box(env)?;
        // Scripts on an accented atom hang off its nucleus; the full accent
        // stack is only what gets painted.
        let accent_kernel = match &*self.base {
            Atom::Accented(acc) => Some(acc.base.create_box(&env.cramp_style())?),
            _ => None,
        };
        let kernel = accent_kernel.as_ref().unwrap_or(&base);
        // A plain character hangs its scripts directly off the baseline;
        // anything taller also drops them relative to its own extents.
        let is_char = kernel.char_box().is_some();
        let delta = kernel.char_box().map(|cb| cb.italic).unwrap_or(0.0);

        let sup = match &self.sup {
            Some(s) => Some(s.create_box(&env.sup_style())?),
            None => None,
        };
        let sub = match &self.sub {
            Some(s) => Some(s.create_box(&env.sub_style())?),
            None => None,
        };

        let (sup_drop, sub_drop) = env.script_drops();
        let (u, v) = if is_char {
            (0.0, 0.0)
        } else {
            (kernel.height - sup_drop, kernel.depth + sub_drop)
        };

        let x_height = env.x_height();
        let rule_t = env.default_rule_thickness();
        let (sup1, sup2, sup3) = env.sup_shift();
        let (sub1, sub2) = env.sub_shift();

        let mut shift_up = 0.0;
        if let Some(sup) = &sup {
            let p = if env.style.is_display() {
                sup1
            } else if env.style.is_cramped() {
                sup3
            } else {
                sup2
            };
            shift_up = u.max(p).max(sup.depth + x_height * 0.25);
        }

        let script_space = Length::new(SCRIPT_SPACE_PT, Unit::Pt).to_px(env);
        let mut hb = builders::HBox::new();
        hb.add(base);

        match (sup, sub) {
            (None, None) => {}
            (Some(sup), None) => {
                hb.add(kern!(horz: delta));
                hb.add(sup.shifted(-shift_up));
                hb.add(kern!(horz: script_space));
            }
            (None, Some(sub)) => {
                let shift_down = v.max(sub1).max(sub.height - 0.8 * x_height);
                hb.add(sub.shifted(shift_down));
                hb.add(kern!(horz: script_space));
            }
            (Some(sup), Some(sub)) => {
                let mut shift_down = v.max(sub2);
                // keep at least 4 rule thicknesses between the scripts
                let gap = (shift_up - sup.depth) - (sub.height - shift_down);
                if gap < 4.0 * rule_t {
                    shift_down += 4.0 * rule_t - gap;
                    // and the superscript bottom at least 0.8 ex above the
                    // baseline
                    let psi = 0.8 * x_height - (shift_up - sup.depth);
                    if psi > 0.0 {
                        shift_up += psi;
                        shift_down -= psi;
                    }
                }
                let between = (shift_up - sup.depth) - (sub.height - shift_down);
                let mut vb = builders::VBox::new();
                vb.add(hbox![kern!(horz: delta), sup]);
                vb.add(kern!(vert: between));
                vb.add(sub);
                vb.raise(shift_down);
                hb.add(vb.build());
                hb.add(kern!(horz: script_space));
            }
        }
        Ok(hb.build())
    }
}

/// Primes and repeated script marks accumulated onto one base (`f''` and
/// backprime runs). Collapses to a single script pair at layout time.
#[derive(Debug)]
pub struct CumulativeScriptsAtom {
    pub base: SharedAtom,
    pub subs: Vec<SharedAtom>,
    pub sups: Vec<SharedAtom>,
}

impl CumulativeScriptsAtom {
    pub fn new(base: SharedAtom) -> CumulativeScriptsAtom {
        CumulativeScriptsAtom {
            base,
            subs: Vec::new(),
            sups: Vec::new(),
        }
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let scripts = ScriptsAtom {
            base: self.base.clone(),
            sub: if self.subs.is_empty() {
                None
            } else {
                Some(rowify(self.subs.clone()))
            },
            sup: if self.sups.is_empty() {
                None
            } else {
                Some(rowify(self.sups.clone()))
            },
        };
        scripts.create_box(env)
    }
}

/// A big operator with optional scripts, honouring its limits mode.
#[derive(Debug)]
pub struct BigOperatorAtom {
    pub base: SharedAtom,
    pub under: Option<SharedAtom>,
    pub over: Option<SharedAtom>,
    pub limits: LimitsType,
}

impl BigOperatorAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let use_limits = match self.limits {
            LimitsType::Limits => true,
            LimitsType::NoLimits => false,
            LimitsType::Normal => env.style.is_display(),
        };
        if !use_limits {
            return ScriptsAtom {
                base: self.base.clone(),
                sub: self.under.clone(),
                sup: self.over.clone(),
            }
            .create_box(env);
        }

        let base = self.base.create_box(env)?;
        let delta = base.char_box().map(|cb| cb.italic).unwrap_or(0.0);
        let over = match &self.over {
            Some(o) => Some(o.create_box(&env.sup_style())?),
            None => None,
        };
        let under = match &self.under {
            Some(u) => Some(u.create_box(&env.sub_style())?),
            None => None,
        };

        let width = base
            .width
            .max(over.as_ref().map(|b| b.width + delta).unwrap_or(0.0))
            .max(under.as_ref().map(|b| b.width + delta).unwrap_or(0.0));
        // center `child` in `width`, the script rows nudged by the italic
        // correction of the operator
        let seat = |child: BoxNode, nudge: f64| {
            let lead = (width - child.width) * 0.5 + nudge;
            let mut hb = builders::HBox::new();
            hb.add(kern!(horz: lead));
            hb.add(child);
            hb.set_width(width);
            hb.build()
        };

        let mut below_base = 0.0;
        let base_depth = base.depth;
        let mut vb = builders::VBox::new();
        if let Some(over) = over {
            let k = env.big_op_spacing(1).max(env.big_op_spacing(3) - over.depth);
            vb.add(kern!(vert: env.big_op_spacing(5)));
            vb.add(seat(over, delta * 0.5));
            vb.add(kern!(vert: k));
        }
        vb.add(seat(base, 0.0));
        if let Some(under) = under {
            let k = env.big_op_spacing(2).max(env.big_op_spacing(4) - under.height);
            below_base += k + under.total_height() + env.big_op_spacing(5);
            vb.add(kern!(vert: k));
            vb.add(seat(under, -delta * 0.5));
            vb.add(kern!(vert: env.big_op_spacing(5)));
        }
        vb.raise(below_base + base_depth);
        Ok(vb.build())
    }
}

/// `\overline` / `\underline`: a rule spanning the content.
#[derive(Debug)]
pub struct OverlineAtom {
    pub content: SharedAtom,
    pub over: bool,
}

impl OverlineAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let t = env.default_rule_thickness();
        if self.over {
            let inner = self.content.create_box(&env.cramp_style())?;
            Ok(builders::over_bar(inner, 3.0 * t, t))
        } else {
            let inner = self.content.create_box(env)?;
            let depth = inner.depth;
            let width = inner.width;
            let mut vb = builders::VBox::new();
            vb.add(inner);
            vb.add(kern!(vert: 3.0 * t));
            vb.add(rule!(width: width, height: t));
            vb.raise(4.0 * t + depth);
            Ok(vb.build())
        }
    }
}

/// Material stacked above and/or below a base with explicit separation
/// (`\overset`, `\underset`, `\stackrel`, over/underlines).
#[derive(Debug)]
pub struct UnderOverAtom {
    pub base: SharedAtom,
    pub over: Option<(SharedAtom, Length, bool)>,
    pub under: Option<(SharedAtom, Length, bool)>,
}

impl UnderOverAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let base = self.base.create_box(env)?;
        let over = match &self.over {
            Some((atom, sep, small)) => {
                let e = if *small { env.sup_style() } else { env.clone() };
                Some((atom.create_box(&e)?, sep.to_px(env)))
            }
            None => None,
        };
        let under = match &self.under {
            Some((atom, sep, small)) => {
                let e = if *small { env.sub_style() } else { env.clone() };
                Some((atom.create_box(&e)?, sep.to_px(env)))
            }
            None => None,
        };

        let width = base
            .width
            .max(over.as_ref().map(|(b, _)| b.width).unwrap_or(0.0))
            .max(under.as_ref().map(|(b, _)| b.width).unwrap_or(0.0));
        let seat = |child: BoxNode| {
            let lead = (width - child.width) * 0.5;
            let mut hb = builders::HBox::new();
            hb.add(kern!(horz: lead));
            hb.add(child);
            hb.set_width(width);
            hb.build()
        };

        let base_depth = base.depth;
        let mut below = 0.0;
        let mut vb = builders::VBox::new();
        if let Some((over, sep)) = over {
            vb.add(seat(over));
            vb.add(kern!(vert: sep));
        }
        vb.add(seat(base));
        if let Some((under, sep)) = under {
            below += sep + under.total_height();
            vb.add(kern!(vert: sep));
            vb.add(seat(under));
        }
        vb.raise(below + base_depth);
        Ok(vb.build())
    }
}

/// A horizontally stretched delimiter above or below its base, with an
/// optional script beyond the delimiter (`\overbrace`, `\underbrace`).
/// The delimiter is built vertically and painted rotated a quarter turn.
#[derive(Debug)]
pub struct OverUnderDelimiterAtom {
    pub base: SharedAtom,
    pub script: Option<SharedAtom>,
    pub delimiter: SymbolSpec,
    pub kern: Length,
    pub over: bool,
}

impl OverUnderDelimiterAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let base = self.base.create_box(env)?;
        let delimiter = create_delimiter(self.delimiter.char_font, env, base.width);
        let script = match &self.script {
            Some(s) => Some(if self.over {
                s.create_box(&env.sup_style())?
            } else {
                s.create_box(&env.sub_style())?
            }),
            None => None,
        };
        let kern = self.kern.to_px(env);
        // after rotation the delimiter's width is its thickness
        let thickness = delimiter.width;
        let width = base.width.max(script.as_ref().map(|s| s.width).unwrap_or(0.0));
        let script_extent = script
            .as_ref()
            .map(|s| s.total_height() + kern)
            .unwrap_or(0.0);
        let (height, depth) = if self.over {
            (base.height + thickness + script_extent, base.depth)
        } else {
            (base.height, base.depth + thickness + script_extent)
        };
        Ok(BoxNode::new(
            BoxKind::OverUnder(OverUnderBox {
                base: Box::new(base),
                delimiter: Box::new(delimiter),
                script: script.map(Box::new),
                kern,
                over: self.over,
            }),
            width,
            height,
            depth,
        ))
    }
}

/// `\xleftarrow[under]{over}` and `\xrightarrow`: an arrow stretched to its
/// scripts.
#[derive(Debug)]
pub struct XArrowAtom {
    pub over: Option<SharedAtom>,
    pub under: Option<SharedAtom>,
    pub left: bool,
}

impl XArrowAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let over = match &self.over {
            Some(o) => Some(o.create_box(&env.sup_style())?),
            None => None,
        };
        let under = match &self.under {
            Some(u) => Some(u.create_box(&env.sub_style())?),
            None => None,
        };
        let pad = env.quad();
        let width = over
            .as_ref()
            .map(|b| b.width)
            .unwrap_or(0.0)
            .max(under.as_ref().map(|b| b.width).unwrap_or(0.0))
            + pad;

        let arrow = self.arrow_body(env, width)?;
        let axis = env.axis_height();
        let base_depth = arrow.depth;
        let sep = 2.0 * env.default_rule_thickness();

        let seat = |child: BoxNode| {
            let lead = (width - child.width) * 0.5;
            let mut hb = builders::HBox::new();
            hb.add(kern!(horz: lead));
            hb.add(child);
            hb.set_width(width);
            hb.build()
        };

        let mut below = 0.0;
        let mut vb = builders::VBox::new();
        if let Some(over) = over {
            vb.add(seat(over));
            vb.add(kern!(vert: sep));
        }
        vb.add(seat(arrow));
        if let Some(under) = under {
            below += sep + under.total_height();
            vb.add(kern!(vert: sep));
            vb.add(seat(under));
        }
        vb.raise(below + base_depth);
        Ok(vb.build().centered_on_axis(axis))
    }

    /// The stretched arrow: the glyph when wide enough, otherwise the glyph
    /// with a rule filling the remaining span.
    fn arrow_body(&self, env: &Environment, width: f64) -> LayoutResult<BoxNode> {
        let name = if self.left { "leftarrow" } else { "rightarrow" };
        let head = env
            .ctx
            .symbols
            .get(name)
            .map(|spec| super::basic::glyph_box(spec.char_font, env))
            .transpose()?;
        let t = env.default_rule_thickness();
        Ok(match head {
            Some(head) if head.width >= width => head,
            Some(head) => {
                let shaft = rule!(width: width - head.width, height: t)
                    .shifted(-(head.height - head.depth) * 0.5);
                if self.left {
                    hbox![head, shaft]
                } else {
                    hbox![shaft, head]
                }
            }
            None => rule!(width: width, height: t),
        })
    }
}
