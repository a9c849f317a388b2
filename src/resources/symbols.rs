//! Symbol table and character rewrite maps.

use std::collections::HashMap;

use crate::atom::AtomType;
use crate::error::{ResourceError, ResourceResult};

use super::fonts::CharFont;
use super::{parse_attr_or, require_attr, xml_error};

/// One `<Symbol>` entry: a named glyph with its atom type.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSpec {
    pub name: String,
    pub atom_type: AtomType,
    pub delimiter: bool,
    pub char_font: CharFont,
}

#[derive(Debug)]
pub struct SymbolTable {
    map: HashMap<String, SymbolSpec>,
}

const RESOURCE: &str = "TeXSymbols";

impl SymbolTable {
    pub fn get(&self, name: &str) -> Option<&SymbolSpec> {
        self.map.get(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolSpec> {
        self.map.values()
    }

    pub fn load_xml(xml: &str) -> ResourceResult<SymbolTable> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| xml_error(RESOURCE, e))?;
        let mut map = HashMap::new();
        for node in doc.root_element().descendants() {
            if !node.has_tag_name("Symbol") {
                continue;
            }
            let name = require_attr(RESOURCE, node, "name")?.to_string();
            let type_name = require_attr(RESOURCE, node, "type")?;
            let atom_type =
                AtomType::from_name(type_name).ok_or_else(|| ResourceError::InvalidAttribute {
                    resource: RESOURCE.to_string(),
                    attribute: "type".to_string(),
                    value: type_name.to_string(),
                })?;
            // A one-character name doubles as its own code point when the
            // entry doesn't spell one out.
            let code = match node.attribute("code").and_then(super::char_from_str) {
                Some(c) => c,
                None => {
                    let mut chars = name.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(ResourceError::MissingAttribute {
                                resource: RESOURCE.to_string(),
                                element: "Symbol".to_string(),
                                attribute: "code".to_string(),
                            })
                        }
                    }
                }
            };
            let spec = SymbolSpec {
                atom_type,
                delimiter: node.attribute("del") == Some("true"),
                char_font: CharFont::new(parse_attr_or(RESOURCE, node, "font", 0)?, code),
                name: name.clone(),
            };
            map.insert(name, spec);
        }
        Ok(SymbolTable { map })
    }
}

/// Rewrites applied to bare characters before they become `Char` atoms:
/// either to a named symbol or to a whole formula snippet.
#[derive(Default)]
pub struct CharMappings {
    symbols: HashMap<char, String>,
    text_symbols: HashMap<char, String>,
    formulas: HashMap<char, String>,
    text_formulas: HashMap<char, String>,
}

const SETTINGS: &str = "TeXFormulaSettings";

impl CharMappings {
    pub fn symbol_for(&self, ch: char, text_mode: bool) -> Option<&str> {
        if text_mode {
            if let Some(name) = self.text_symbols.get(&ch) {
                return Some(name);
            }
        }
        self.symbols.get(&ch).map(String::as_str)
    }

    pub fn formula_for(&self, ch: char, text_mode: bool) -> Option<&str> {
        if text_mode {
            if let Some(f) = self.text_formulas.get(&ch) {
                return Some(f);
            }
        }
        self.formulas.get(&ch).map(String::as_str)
    }

    pub fn load_xml(xml: &str) -> ResourceResult<CharMappings> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| xml_error(SETTINGS, e))?;
        let mut out = CharMappings::default();
        for section in doc.root_element().children().filter(roxmltree::Node::is_element) {
            let (value_attr, plain, text) = match section.tag_name().name() {
                "CharacterToSymbolMappings" => {
                    ("symbol", &mut out.symbols, &mut out.text_symbols)
                }
                "CharacterToFormulaMappings" => {
                    ("formula", &mut out.formulas, &mut out.text_formulas)
                }
                _ => continue,
            };
            for map in section.children().filter(|c| c.has_tag_name("Map")) {
                let ch = super::parse_char_attr(SETTINGS, map, "char")?;
                let value = require_attr(SETTINGS, map, value_attr)?.to_string();
                if let Some(t) = map.attribute("text") {
                    text.insert(ch, t.to_string());
                }
                plain.insert(ch, value);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_symbols_with_implicit_code() {
        let table = SymbolTable::load_xml(
            r#"<TeXSymbols>
                 <Symbol name="plus" type="bin" font="0" code="43"/>
                 <Symbol name="(" type="open" del="true"/>
               </TeXSymbols>"#,
        )
        .unwrap();
        let plus = table.get("plus").unwrap();
        assert_eq!(plus.atom_type, AtomType::BinaryOperator);
        assert_eq!(plus.char_font.code, '+');
        let paren = table.get("(").unwrap();
        assert!(paren.delimiter);
        assert_eq!(paren.char_font.code, '(');
    }

    #[test]
    fn bad_atom_type_fails_fast() {
        let err = SymbolTable::load_xml(
            r#"<TeXSymbols><Symbol name="x" type="sideways"/></TeXSymbols>"#,
        )
        .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidAttribute { .. }));
    }

    #[test]
    fn char_mappings_prefer_text_entry_in_text_mode() {
        let maps = CharMappings::load_xml(
            r#"<TeXFormulaSettings>
                 <CharacterToSymbolMappings>
                   <Map char="=" symbol="equals" text="textequals"/>
                 </CharacterToSymbolMappings>
                 <CharacterToFormulaMappings>
                   <Map char="²" formula="^2"/>
                 </CharacterToFormulaMappings>
               </TeXFormulaSettings>"#,
        )
        .unwrap();
        assert_eq!(maps.symbol_for('=', false), Some("equals"));
        assert_eq!(maps.symbol_for('=', true), Some("textequals"));
        assert_eq!(maps.formula_for('²', false), Some("^2"));
    }
}
