//! Inter-atom glue: named specs plus the `[left][right][style]` code table.

use serde_derive::{Deserialize, Serialize};

use crate::atom::AtomType;
use crate::environment::TexStyle;
use crate::error::{ResourceError, ResourceResult};

use super::{parse_attr_or, require_attr, xml_error};

/// Elastic spacing in math units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlueSpec {
    pub name: String,
    pub space: f64,
    pub stretch: f64,
    pub shrink: f64,
}

impl GlueSpec {
    pub fn is_zero(&self) -> bool {
        self.space == 0.0 && self.stretch == 0.0 && self.shrink == 0.0
    }
}

const TYPES: usize = 8;
const STYLES: usize = 4;

pub struct GlueSettings {
    types: Vec<GlueSpec>,
    table: [[[u8; STYLES]; TYPES]; TYPES],
}

const RESOURCE: &str = "GlueSettings";

impl GlueSettings {
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Spacing between a `left` and `right` atom at `style`. `None` when the
    /// table selects the zero "default" glue. Atom types past `inner`
    /// collapse to ordinary, and the script styles drop the binary/relation/
    /// punctuation spacing entirely (the TeX rule).
    pub fn lookup(&self, left: AtomType, right: AtomType, style: TexStyle) -> Option<&GlueSpec> {
        let l = left.glue_index();
        let r = right.glue_index();
        if style.is_script() {
            let scripted = |t: usize| {
                t == AtomType::BinaryOperator.glue_index()
                    || t == AtomType::Relation.glue_index()
                    || t == AtomType::Punctuation.glue_index()
            };
            if scripted(l) || scripted(r) {
                return None;
            }
        }
        let code = self.table[l][r][style.size_group()] as usize;
        let spec = self.types.get(code)?;
        if spec.is_zero() {
            None
        } else {
            Some(spec)
        }
    }

    pub fn load_xml(xml: &str) -> ResourceResult<GlueSettings> {
        let doc = roxmltree::Document::parse(xml).map_err(|e| xml_error(RESOURCE, e))?;
        let root = doc.root_element();

        let mut types: Vec<GlueSpec> = Vec::new();
        if let Some(section) = root.children().find(|c| c.has_tag_name("GlueTypes")) {
            for node in section.children().filter(|c| c.has_tag_name("GlueType")) {
                types.push(GlueSpec {
                    name: require_attr(RESOURCE, node, "name")?.to_string(),
                    space: parse_attr_or(RESOURCE, node, "space", 0.0)?,
                    stretch: parse_attr_or(RESOURCE, node, "stretch", 0.0)?,
                    shrink: parse_attr_or(RESOURCE, node, "shrink", 0.0)?,
                });
            }
        }
        // The zero "default" spec must sit at index 0; synthesize one when
        // the document doesn't carry it.
        let default_at = types.iter().position(|t| t.name.eq_ignore_ascii_case("default"));
        match default_at {
            Some(0) => {}
            Some(i) => types.swap(0, i),
            None => types.insert(
                0,
                GlueSpec {
                    name: "default".to_string(),
                    space: 0.0,
                    stretch: 0.0,
                    shrink: 0.0,
                },
            ),
        }

        let mut table = [[[0u8; STYLES]; TYPES]; TYPES];
        if let Some(section) = root.children().find(|c| c.has_tag_name("GlueTable")) {
            for node in section.children().filter(|c| c.has_tag_name("Glue")) {
                let l = type_index(require_attr(RESOURCE, node, "lefttype")?)?;
                let r = type_index(require_attr(RESOURCE, node, "righttype")?)?;
                let glue_name = require_attr(RESOURCE, node, "gluetype")?;
                let code = types
                    .iter()
                    .position(|t| t.name == glue_name)
                    .ok_or_else(|| ResourceError::InvalidAttribute {
                        resource: RESOURCE.to_string(),
                        attribute: "gluetype".to_string(),
                        value: glue_name.to_string(),
                    })? as u8;
                for style in node.children().filter(|c| c.has_tag_name("Style")) {
                    let s = style_index(require_attr(RESOURCE, style, "name")?)?;
                    table[l][r][s] = code;
                }
            }
        }

        Ok(GlueSettings { types, table })
    }
}

fn type_index(name: &str) -> ResourceResult<usize> {
    AtomType::from_name(name)
        .filter(|t| (*t as u8) < TYPES as u8)
        .map(AtomType::glue_index)
        .ok_or_else(|| ResourceError::InvalidAttribute {
            resource: RESOURCE.to_string(),
            attribute: "lefttype/righttype".to_string(),
            value: name.to_string(),
        })
}

fn style_index(name: &str) -> ResourceResult<usize> {
    match name {
        "display" => Ok(0),
        "text" => Ok(1),
        "script" => Ok(2),
        "script_script" => Ok(3),
        _ => Err(ResourceError::InvalidAttribute {
            resource: RESOURCE.to_string(),
            attribute: "name".to_string(),
            value: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <GlueSettings>
          <GlueTypes>
            <GlueType name="thin" space="3" stretch="0" shrink="0"/>
            <GlueType name="med" space="4" stretch="2" shrink="4"/>
            <GlueType name="default" space="0" stretch="0" shrink="0"/>
          </GlueTypes>
          <GlueTable>
            <Glue lefttype="bin" righttype="ord" gluetype="med">
              <Style name="display"/><Style name="text"/>
            </Glue>
            <Glue lefttype="ord" righttype="op" gluetype="thin">
              <Style name="display"/><Style name="text"/>
              <Style name="script"/><Style name="script_script"/>
            </Glue>
          </GlueTable>
        </GlueSettings>"#;

    #[test]
    fn table_lookup_by_style() {
        let glue = GlueSettings::load_xml(DOC).unwrap();
        let med = glue
            .lookup(AtomType::BinaryOperator, AtomType::Ordinary, TexStyle::DISPLAY)
            .unwrap();
        assert_eq!(med.space, 4.0);
        assert!(glue
            .lookup(AtomType::Opening, AtomType::Closing, TexStyle::DISPLAY)
            .is_none());
    }

    #[test]
    fn script_styles_drop_bin_glue() {
        let glue = GlueSettings::load_xml(DOC).unwrap();
        assert!(glue
            .lookup(AtomType::BinaryOperator, AtomType::Ordinary, TexStyle::SCRIPT)
            .is_none());
        // ord→op spacing survives in scripts
        assert!(glue
            .lookup(AtomType::Ordinary, AtomType::BigOperator, TexStyle::SCRIPT)
            .is_some());
    }

    #[test]
    fn aux_types_collapse_to_ordinary() {
        let glue = GlueSettings::load_xml(DOC).unwrap();
        let spacing = glue.lookup(AtomType::BinaryOperator, AtomType::Accent, TexStyle::TEXT);
        assert_eq!(spacing.unwrap().space, 4.0);
    }
}
