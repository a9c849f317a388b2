//! A TeX math typesetting core: parse a LaTeX formula, lay it out into a
//! resolution-independent box tree, and paint it through a [`Graphics2D`]
//! backend of your choosing.
//!
//! The resource tables (symbols, font metrics, glue, character mappings)
//! are loaded exactly once through [`init`]; everything afterwards is
//! read-only and safe to share between concurrent parses.
//!
//! ```no_run
//! # fn demo(backend: &mut dyn mathtex::Graphics2D, config: mathtex::ResourceConfig) {
//! mathtex::init(config).unwrap();
//! let render = mathtex::render(
//!     r"\frac{1}{2} + x^2",
//!     mathtex::Length::new(400.0, mathtex::Unit::Px),
//!     20.0,
//!     mathtex::Length::new(1.0, mathtex::Unit::Ex),
//!     mathtex::Color::BLACK,
//! )
//! .unwrap();
//! render.draw(backend, 10.0, 10.0);
//! # }
//! ```

pub mod error;

pub mod dimensions;
pub mod graphics;

#[macro_use]
pub mod boxes;

pub mod atom;
pub mod breaker;
pub mod environment;
pub mod parser;
pub mod render;
pub mod resources;

use std::sync::{Arc, RwLock};

pub use dimensions::{Length, Unit};
pub use environment::{Environment, TexStyle};
pub use error::{Error, LayoutError, ParseError, Position, ResourceError};
pub use graphics::{CapStyle, Color, Graphics2D, JoinStyle, Stroke};
pub use parser::{parse_formula, Formula};
pub use render::{Render, TexRenderer};
pub use resources::{ResourceConfig, TexContext};

static CONTEXT: RwLock<Option<Arc<TexContext>>> = RwLock::new(None);

/// Load the resource tables. Fails fast on any malformed document; no
/// parse can run before this succeeds.
pub fn init(config: ResourceConfig) -> Result<(), Error> {
    let ctx = TexContext::load(&config)?;
    let mut slot = CONTEXT.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(Arc::new(ctx));
    Ok(())
}

/// Drop the loaded tables. Renders created earlier stay valid; new parses
/// fail until [`init`] runs again.
pub fn release() {
    let mut slot = CONTEXT.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

pub fn is_initialized() -> bool {
    CONTEXT
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .is_some()
}

fn current_context() -> Result<Arc<TexContext>, Error> {
    CONTEXT
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .ok_or(Error::Layout(LayoutError::NotInitialized))
}

/// Parse, lay out and break `source` against the globally loaded tables.
///
/// `width` is the line budget for the formula breaker (zero disables
/// breaking), `text_size` the base font size in pixels, `line_space` the
/// blank space between broken lines.
pub fn render(
    source: &str,
    width: Length,
    text_size: f64,
    line_space: Length,
    color: Color,
) -> Result<Render, Error> {
    let ctx = current_context()?;
    let renderer = TexRenderer {
        width,
        text_size,
        line_space,
        foreground: color,
        ..TexRenderer::default()
    };
    renderer.render(&ctx, source)
}
