//! `\left … \right` fences and the delimiter factory shared by radicals,
//! braces and matrix delimiters.

use log::trace;

use crate::boxes::{builders, BoxNode};
use crate::dimensions::{Length, Unit};
use crate::environment::Environment;
use crate::error::LayoutResult;
use crate::resources::fonts::CharFont;
use crate::resources::symbols::SymbolSpec;

use super::basic::glyph_box;
use super::{AtomType, SharedAtom};

/// TeX's `\delimiterfactor` (permille) and `\delimitershortfall`.
const DELIMITER_FACTOR: f64 = 0.901;
const SHORTFALL_PT: f64 = 5.0;

/// A delimiter at least `min_total` tall (height+depth): walk the
/// next-larger chain, then fall back to stacking extension pieces. When a
/// glyph has neither, the largest variant found is returned as-is.
pub fn create_delimiter(cf: CharFont, env: &Environment, min_total: f64) -> BoxNode {
    let mut current = cf;
    loop {
        if let Ok(node) = glyph_box(current, env) {
            if node.total_height() >= min_total {
                return node;
            }
        }
        match env.ctx.fonts.next_larger(current) {
            Some(larger) => current = larger,
            None => break,
        }
    }

    if let Some(ext) = env.ctx.fonts.extension(current) {
        let font = current.font;
        let piece = |code: Option<char>| -> Option<BoxNode> {
            code.and_then(|c| glyph_box(CharFont::new(font, c), env).ok())
        };
        let top = piece(ext.top);
        let mid = piece(ext.mid);
        let bot = piece(ext.bot);
        let rep = match glyph_box(CharFont::new(font, ext.rep), env) {
            Ok(rep) => rep,
            Err(_) => return fallback_rule(env, min_total),
        };

        let fixed: f64 = [&top, &mid, &bot]
            .iter()
            .filter_map(|p| p.as_ref().map(BoxNode::total_height))
            .sum();
        let rep_h = rep.total_height().max(f64::MIN_POSITIVE);
        let segments = if ext.mid.is_some() { 2.0 } else { 1.0 };
        let mut per_segment = 0usize;
        if fixed < min_total {
            per_segment = ((min_total - fixed) / (rep_h * segments)).ceil() as usize;
        }

        trace!(
            "extensible delimiter {:?}: {} repeats per segment",
            cf.code,
            per_segment
        );

        let mut vb = builders::VBox::new();
        if let Some(top) = top {
            vb.add(top);
        }
        for _ in 0..per_segment {
            vb.add(rep.clone());
        }
        if let Some(mid) = mid {
            vb.add(mid);
            for _ in 0..per_segment {
                vb.add(rep.clone());
            }
        }
        if let Some(bot) = bot {
            vb.add(bot);
        }
        // hang half below the baseline like a grown glyph would
        let mut node = vb.build();
        let half = node.total_height() * 0.5;
        node.height = half;
        node.depth = half;
        return node;
    }

    match glyph_box(current, env) {
        Ok(node) => node,
        Err(_) => fallback_rule(env, min_total),
    }
}

fn fallback_rule(env: &Environment, min_total: f64) -> BoxNode {
    let t = env.default_rule_thickness();
    rule!(width: t, height: min_total * 0.5, depth: min_total * 0.5)
}

/// `\big`, `\Big`, `\bigg`, `\Bigg` and their l/r/m variants: a delimiter
/// grown to a fixed number of size steps.
#[derive(Debug)]
pub struct SizedDelimiterAtom {
    pub spec: SymbolSpec,
    /// 1..=4, the `\big`…`\Bigg` ladder.
    pub size: u8,
}

impl SizedDelimiterAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        // heights of the classic ladder in em: 0.85, 1.15, 1.45, 1.75
        let min_total = (0.55 + 0.3 * f64::from(self.size)) * env.em();
        let axis = env.axis_height();
        Ok(create_delimiter(self.spec.char_font, env, min_total).centered_on_axis(axis))
    }
}

/// A group surrounded by `\left`/`\right` (and split by `\middle`)
/// delimiters grown to the content height.
#[derive(Debug)]
pub struct FencedAtom {
    pub left: Option<SymbolSpec>,
    pub right: Option<SymbolSpec>,
    /// `\middle` separators with the content slice following each.
    pub content: SharedAtom,
    pub middle: Vec<(SymbolSpec, SharedAtom)>,
}

impl FencedAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let axis = env.axis_height();
        let content = self.content.create_box(env)?;

        // clearance per TeX: delimiters cover at least the factor'd reach
        // from the axis and never fall short more than the shortfall
        let reach = (content.height - axis).max(content.depth + axis) * 2.0;
        let shortfall = Length::new(SHORTFALL_PT, Unit::Pt).to_px(env);
        let clearance = (reach * DELIMITER_FACTOR).max(content.total_height() - shortfall);

        let null_space = Length::new(0.12, Unit::Em).to_px(env);

        let mut hb = builders::HBox::new();
        match &self.left {
            Some(spec) => {
                let del = create_delimiter(spec.char_font, env, clearance).centered_on_axis(axis);
                hb.add(del);
                if let Some(glue) =
                    env.ctx
                        .glue
                        .lookup(AtomType::Opening, self.content.left_type(), env.style)
                {
                    let mu = Length::new(1.0, Unit::Mu).to_px(env);
                    hb.add(builders::glue(glue.space * mu, glue.stretch * mu, glue.shrink * mu));
                }
            }
            None => hb.add(kern!(horz: null_space)),
        }

        hb.add(content);
        for (spec, follow) in &self.middle {
            let del = create_delimiter(spec.char_font, env, clearance).centered_on_axis(axis);
            hb.add(del);
            hb.add(follow.create_box(env)?);
        }

        match &self.right {
            Some(spec) => {
                if let Some(glue) =
                    env.ctx
                        .glue
                        .lookup(self.content.right_type(), AtomType::Closing, env.style)
                {
                    let mu = Length::new(1.0, Unit::Mu).to_px(env);
                    hb.add(builders::glue(glue.space * mu, glue.stretch * mu, glue.shrink * mu));
                }
                let del = create_delimiter(spec.char_font, env, clearance).centered_on_axis(axis);
                hb.add(del);
            }
            None => hb.add(kern!(horz: null_space)),
        }
        Ok(hb.build())
    }
}
