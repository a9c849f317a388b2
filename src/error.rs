//! Error taxonomy for parsing, resource loading and layout.
//!
//! Parse errors carry a [`Position`] pointing into the source buffer as it
//! looked when the error was raised (macro expansion splices included).

use thiserror::Error;

pub type ParseResult<T> = std::result::Result<T, ParseError>;
pub type LayoutResult<T> = std::result::Result<T, LayoutError>;
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Line/column of an error in the parsed source, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Syntax error in the formula source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{pos}: unknown symbol or command '\\{name}'")]
    UnknownCommand { name: String, pos: Position },
    #[error("{pos}: unknown symbol '{ch}'")]
    UnknownSymbol { ch: char, pos: Position },
    #[error("{pos}: group '{open}…{close}' is unbalanced")]
    UnbalancedGroup {
        open: String,
        close: String,
        pos: Position,
    },
    #[error("{pos}: missing argument {index} for '\\{name}'")]
    MissingArgument {
        name: String,
        index: usize,
        pos: Position,
    },
    #[error("{pos}: '{snippet}' is not a valid length")]
    InvalidLength { snippet: String, pos: Position },
    #[error("{pos}: '{snippet}' is not a valid delimiter")]
    InvalidDelimiter { snippet: String, pos: Position },
    #[error("{pos}: '{snippet}' is not a valid color")]
    InvalidColor { snippet: String, pos: Position },
    #[error("{pos}: '{snippet}' is not a valid number")]
    InvalidNumber { snippet: String, pos: Position },
    #[error("{pos}: command '\\{name}' already defined, use \\renewcommand")]
    MacroAlreadyDefined { name: String, pos: Position },
    #[error("{pos}: command '\\{name}' is not defined, use \\newcommand")]
    MacroNotDefined { name: String, pos: Position },
    #[error("{pos}: environment '{name}' is not defined")]
    UnknownEnvironment { name: String, pos: Position },
    #[error("{pos}: '{ch}' is only allowed in array mode")]
    MisplacedColumnSep { ch: char, pos: Position },
    #[error("{pos}: \\longdiv divisor must not be zero")]
    ZeroDivisor { pos: Position },
    #[error("{pos}: numerator and denominator of a fraction must not be empty")]
    EmptyFraction { pos: Position },
    #[error("{pos}: macro expansion did not terminate")]
    ExpansionOverflow { pos: Position },
    #[error("'{0}' does not name an atom type")]
    InvalidAtomType(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Failure while turning atoms into boxes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("font {0} is not loaded")]
    FontNotLoaded(u16),
    #[error("font {font} has no metrics for '{code}'")]
    MissingGlyph { font: u16, code: char },
    #[error("symbol '{0}' is not in the symbol table")]
    SymbolNotFound(String),
    #[error("text style mapping '{0}' not found")]
    TextStyleMappingNotFound(String),
    #[error("the typesetting context is not initialized; call init() first")]
    NotInitialized,
}

/// Fatal error while loading the resource tables at `init`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("malformed XML in {resource}: {detail}")]
    Xml { resource: String, detail: String },
    #[error("{resource}: element <{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        resource: String,
        element: String,
        attribute: String,
    },
    #[error("{resource}: '{value}' is not a valid value for '{attribute}'")]
    InvalidAttribute {
        resource: String,
        attribute: String,
        value: String,
    },
    #[error("font id {0} is already loaded")]
    FontLoaded(u16),
    #[error("symbol '{symbol}' maps to unloaded font {font}")]
    DanglingFontRef { symbol: String, font: u16 },
}

/// Any failure surfaced by the public façade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
