//! The once-loaded resource tables: symbols, fonts, glue, character maps.
//!
//! All four are populated from their XML documents during [`TexContext::load`]
//! and are read-only afterwards; concurrent parses may share one context
//! freely. Loading is fail-fast: the first malformed element aborts `init`.

pub mod fonts;
pub mod glue;
pub mod symbols;

use log::info;

use crate::error::{ResourceError, ResourceResult};
use crate::parser::macros::MacroRegistry;

use self::fonts::{FontId, FontStore};
use self::glue::GlueSettings;
use self::symbols::{CharMappings, SymbolTable};

/// The serialized resource documents handed to `init`. The core treats them
/// as opaque strings; where they come from (files, embedded assets) is the
/// embedder's business.
#[derive(Debug, Clone, Default)]
pub struct ResourceConfig {
    pub symbols_xml: String,
    pub formula_settings_xml: String,
    pub glue_xml: String,
    pub font_xml: Vec<String>,
    /// Font whose quad defines the math unit. Defaults to font 0.
    pub mu_font: FontId,
    /// Pixels per big point for absolute units. Defaults to 1.0.
    pub pixels_per_point: f64,
}

/// Everything a parse/layout run needs to look up, frozen after load.
pub struct TexContext {
    pub symbols: SymbolTable,
    pub mappings: CharMappings,
    pub fonts: FontStore,
    pub glue: GlueSettings,
    pub macros: MacroRegistry,
    pub pixels_per_point: f64,
}

impl TexContext {
    pub fn load(config: &ResourceConfig) -> ResourceResult<TexContext> {
        let mut fonts = FontStore::new(config.mu_font);
        for doc in &config.font_xml {
            fonts.load_xml(doc)?;
        }
        let symbols = SymbolTable::load_xml(&config.symbols_xml)?;
        let mappings = CharMappings::load_xml(&config.formula_settings_xml)?;
        let glue = GlueSettings::load_xml(&config.glue_xml)?;

        for spec in symbols.iter() {
            if fonts.font(spec.char_font.font).is_err() {
                return Err(ResourceError::DanglingFontRef {
                    symbol: spec.name.clone(),
                    font: spec.char_font.font,
                });
            }
        }

        info!(
            "resource tables loaded: {} symbols, {} fonts, {} glue types",
            symbols.len(),
            fonts.len(),
            glue.type_count()
        );

        Ok(TexContext {
            symbols,
            mappings,
            fonts,
            glue,
            macros: MacroRegistry::new(),
            pixels_per_point: if config.pixels_per_point > 0.0 {
                config.pixels_per_point
            } else {
                1.0
            },
        })
    }
}

pub(crate) fn xml_error(resource: &str, err: roxmltree::Error) -> ResourceError {
    ResourceError::Xml {
        resource: resource.to_string(),
        detail: err.to_string(),
    }
}

pub(crate) fn require_attr<'a>(
    resource: &str,
    node: roxmltree::Node<'a, '_>,
    name: &str,
) -> ResourceResult<&'a str> {
    node.attribute(name).ok_or_else(|| ResourceError::MissingAttribute {
        resource: resource.to_string(),
        element: node.tag_name().name().to_string(),
        attribute: name.to_string(),
    })
}

pub(crate) fn parse_attr<T: std::str::FromStr>(
    resource: &str,
    node: roxmltree::Node,
    name: &str,
) -> ResourceResult<T> {
    let raw = require_attr(resource, node, name)?;
    raw.parse().map_err(|_| ResourceError::InvalidAttribute {
        resource: resource.to_string(),
        attribute: name.to_string(),
        value: raw.to_string(),
    })
}

/// Optional numeric attribute with a default.
pub(crate) fn parse_attr_or<T: std::str::FromStr>(
    resource: &str,
    node: roxmltree::Node,
    name: &str,
    default: T,
) -> ResourceResult<T> {
    match node.attribute(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ResourceError::InvalidAttribute {
            resource: resource.to_string(),
            attribute: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// A glyph code attribute: either a decimal code point or a single literal
/// character.
pub(crate) fn parse_char_attr(
    resource: &str,
    node: roxmltree::Node,
    name: &str,
) -> ResourceResult<char> {
    let raw = require_attr(resource, node, name)?;
    char_from_str(raw).ok_or_else(|| ResourceError::InvalidAttribute {
        resource: resource.to_string(),
        attribute: name.to_string(),
        value: raw.to_string(),
    })
}

pub(crate) fn char_from_str(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if !c.is_ascii_digit() || raw.len() == 1 {
            return Some(c);
        }
    }
    raw.parse::<u32>().ok().and_then(char::from_u32)
}
