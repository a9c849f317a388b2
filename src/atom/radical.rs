//! Square and nth roots, TeXBook rule 11.

use crate::boxes::{builders, BoxNode};
use crate::environment::Environment;
use crate::error::{LayoutError, LayoutResult};

use super::fenced::create_delimiter;
use super::SharedAtom;

/// Fraction of the radical's height the index baseline sits at.
const INDEX_SEAT: f64 = 0.55;
/// How far the index reaches into the radical's hook, as a fraction of the
/// radical glyph width.
const INDEX_OVERLAP: f64 = 0.5;

#[derive(Debug)]
pub struct RadicalAtom {
    pub radicand: SharedAtom,
    pub index: Option<SharedAtom>,
}

impl RadicalAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let radicand = self.radicand.create_box(&env.cramp_style())?;

        let rule_t = env.default_rule_thickness();
        let mut clearance = if env.style.is_display() {
            rule_t + env.x_height() * 0.25
        } else {
            rule_t + rule_t * 0.25
        };

        let surd = env
            .ctx
            .symbols
            .get("surd")
            .or_else(|| env.ctx.symbols.get("sqrt"))
            .ok_or_else(|| LayoutError::SymbolNotFound("surd".to_string()))?;

        let needed = radicand.total_height() + clearance + rule_t;
        let radical = create_delimiter(surd.char_font, env, needed);

        // split any excess between the bar and the radicand
        let excess = radical.total_height() - needed;
        if excess > 0.0 {
            clearance += excess * 0.5;
        }

        let body = builders::over_bar(radicand, clearance, rule_t);
        // hang the radical glyph so its top meets the top of the bar
        let radical_shift = radical.height - body.height;
        let radical_total = radical.total_height();
        let radical_width = radical.width;

        let mut hb = builders::HBox::new();
        if let Some(index) = &self.index {
            let index = index.create_box(&env.root_style())?;
            // seated up in the hook of the radical, overlapping to its left
            let seat = INDEX_SEAT * radical_total - radical.depth;
            let overlap = (INDEX_OVERLAP * radical_width).min(index.width);
            hb.add(index.shifted(-seat));
            hb.add(kern!(horz: -overlap));
        }
        hb.add(radical.shifted(radical_shift));
        hb.add(body);
        Ok(hb.build())
    }
}
