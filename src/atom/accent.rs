//! Accents above a base, with skew and next-larger widening.

use crate::boxes::{builders, BoxNode};
use crate::environment::Environment;
use crate::error::LayoutResult;
use crate::resources::symbols::SymbolSpec;

use super::basic::glyph_box;
use super::SharedAtom;

#[derive(Debug)]
pub struct AccentedAtom {
    pub accent: SymbolSpec,
    pub base: SharedAtom,
}

impl AccentedAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let cramped = env.cramp_style();
        let base = self.base.create_box(&cramped)?;

        // widen the accent along its next-larger chain while it still fits
        // the base
        let mut cf = self.accent.char_font;
        let mut accent = glyph_box(cf, env)?;
        while let Some(larger) = env.ctx.fonts.next_larger(cf) {
            let candidate = glyph_box(larger, env)?;
            if candidate.width > base.width {
                break;
            }
            cf = larger;
            accent = candidate;
        }

        // the skew char of the base's font tells how far accents lean
        let skew = match (base.char_box(), env.font().and_then(|f| f.skew_char)) {
            (Some(cb), Some(skew_char)) => env.ctx.fonts.kern(cb.cf, skew_char) * env.size(),
            _ => 0.0,
        };

        // the accent rides at one x-height, or directly on a shorter base
        let clearance = base.height.min(env.x_height());
        let accent_width = accent.width;
        let width = base.width.max(accent_width);

        let lead = skew + (width - accent_width) * 0.5;
        let mut top = builders::HBox::new();
        top.add(kern!(horz: lead.max(0.0)));
        top.add(accent);
        top.set_width(width);

        let base_row = {
            let mut hb = builders::HBox::new();
            hb.add(kern!(horz: (width - base.width) * 0.5));
            hb.add(base);
            hb.set_width(width);
            hb.build()
        };

        // the accent glyph is drawn as if sitting on the x-height; drop it
        // onto the base
        let mut vb = builders::VBox::new();
        vb.add(top.build());
        vb.add(kern!(vert: -clearance));
        vb.add(base_row);
        Ok(vb.build())
    }
}
