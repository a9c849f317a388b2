//! User macro and environment definitions (`\newcommand`,
//! `\newenvironment`) and their expansion into the source buffer.

use std::collections::HashMap;

use crate::error::{ParseError, ParseResult, Position};

/// A `\newcommand` definition: replacement text with `#1…#n` slots.
#[derive(Debug, Clone)]
pub struct UserMacro {
    pub argc: usize,
    /// Default for `#1` when the caller omits the optional argument.
    pub optional_default: Option<String>,
    pub body: String,
}

impl UserMacro {
    /// Substitute the captured arguments into the body. `optional` replaces
    /// `#1` (falling back to the declared default), mandatory arguments
    /// fill the remaining slots.
    pub fn expand(&self, optional: Option<&str>, args: &[String]) -> String {
        let mut body = self.body.clone();
        let mut slot = 1usize;
        if self.optional_default.is_some() {
            let value = optional
                .map(str::to_string)
                .or_else(|| self.optional_default.clone())
                .unwrap_or_default();
            body = replace_slot(&body, 1, &value);
            slot = 2;
        }
        for arg in args {
            body = replace_slot(&body, slot, arg);
            slot += 1;
        }
        body
    }
}

/// Substitute `#<index>` occurrences, leaving longer slot numbers alone:
/// filling `#1` must not eat the prefix of `#10`.
fn replace_slot(body: &str, index: usize, value: &str) -> String {
    let needle = format!("#{index}");
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(at) = rest.find(&needle) {
        let after = &rest[at + needle.len()..];
        if after.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            // part of a longer slot number, copy it through untouched
            out.push_str(&rest[..at + needle.len()]);
        } else {
            out.push_str(&rest[..at]);
            out.push_str(value);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// A `\newenvironment` definition. The begin/end material wraps the body,
/// which is passed as the last macro argument.
#[derive(Debug, Clone)]
pub struct UserEnvironment {
    pub argc: usize,
    pub begin: String,
    pub end: String,
}

impl UserEnvironment {
    /// As a macro body: `begin #<argc+1> end`, the body slot coming last.
    pub fn as_macro(&self) -> UserMacro {
        UserMacro {
            argc: self.argc + 1,
            optional_default: None,
            body: format!("{} #{} {}", self.begin, self.argc + 1, self.end),
        }
    }
}

/// Registry of user definitions. One lives on the context (for embedder
/// pre-registration, frozen at `init`) and each parse works on its own
/// clone, so `\newcommand` in one formula never races another.
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, UserMacro>,
    environments: HashMap<String, UserEnvironment>,
}

impl MacroRegistry {
    pub fn new() -> MacroRegistry {
        MacroRegistry::default()
    }

    pub fn get(&self, name: &str) -> Option<&UserMacro> {
        self.macros.get(name)
    }

    pub fn environment(&self, name: &str) -> Option<&UserEnvironment> {
        self.environments.get(name)
    }

    pub fn define(
        &mut self,
        name: &str,
        definition: UserMacro,
        pos: Position,
    ) -> ParseResult<()> {
        if self.macros.contains_key(name) {
            return Err(ParseError::MacroAlreadyDefined {
                name: name.to_string(),
                pos,
            });
        }
        self.macros.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn redefine(
        &mut self,
        name: &str,
        definition: UserMacro,
        pos: Position,
    ) -> ParseResult<()> {
        if !self.macros.contains_key(name) {
            return Err(ParseError::MacroNotDefined {
                name: name.to_string(),
                pos,
            });
        }
        self.macros.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn define_environment(
        &mut self,
        name: &str,
        env: UserEnvironment,
        pos: Position,
    ) -> ParseResult<()> {
        if self.environments.contains_key(name) {
            return Err(ParseError::MacroAlreadyDefined {
                name: name.to_string(),
                pos,
            });
        }
        self.environments.insert(name.to_string(), env);
        Ok(())
    }

    pub fn redefine_environment(
        &mut self,
        name: &str,
        env: UserEnvironment,
        pos: Position,
    ) -> ParseResult<()> {
        if !self.environments.contains_key(name) {
            return Err(ParseError::MacroNotDefined {
                name: name.to_string(),
                pos,
            });
        }
        self.environments.insert(name.to_string(), env);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_fills_slots_in_order() {
        let mac = UserMacro {
            argc: 2,
            optional_default: None,
            body: "#1 + #2".to_string(),
        };
        assert_eq!(
            mac.expand(None, &["a".to_string(), "b".to_string()]),
            "a + b"
        );
    }

    #[test]
    fn optional_argument_defaults() {
        let mac = UserMacro {
            argc: 1,
            optional_default: Some("x".to_string()),
            body: "[#1:#2]".to_string(),
        };
        assert_eq!(mac.expand(None, &["y".to_string()]), "[x:y]");
        assert_eq!(mac.expand(Some("z"), &["y".to_string()]), "[z:y]");
    }

    #[test]
    fn slot_substitution_respects_digit_boundaries() {
        let mac = UserMacro {
            argc: 10,
            optional_default: None,
            body: "#1 #10 #2".to_string(),
        };
        let args: Vec<String> = (1..=10).map(|i| format!("a{i}")).collect();
        assert_eq!(mac.expand(None, &args), "a1 a10 a2");
    }

    #[test]
    fn duplicate_definition_fails() {
        let mut reg = MacroRegistry::new();
        let mac = UserMacro {
            argc: 0,
            optional_default: None,
            body: "x".to_string(),
        };
        let pos = Position::default();
        reg.define("foo", mac.clone(), pos).unwrap();
        assert!(matches!(
            reg.define("foo", mac.clone(), pos),
            Err(ParseError::MacroAlreadyDefined { .. })
        ));
        assert!(matches!(
            reg.redefine("bar", mac, pos),
            Err(ParseError::MacroNotDefined { .. })
        ));
    }
}
