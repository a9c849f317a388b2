//! The TeX scanner: one forward cursor over a mutable char buffer.
//!
//! Parsing is two passes. The preprocess pass rewrites `\newcommand`-family
//! definitions, user environments and user macro calls into their expansion
//! in the source buffer. The main pass walks the expanded buffer and builds
//! the atom tree, dispatching built-in commands through
//! [`commands::lookup`].

pub mod color;
pub mod commands;
pub mod macros;

use std::rc::Rc;

use log::{debug, warn};

use crate::atom::{
    rowify, Atom, BigOperatorAtom, CharAtom, ColorAtom, CumulativeScriptsAtom, FontStyleAtom,
    LimitsType, PhantomAtom, RowAtom, ScriptsAtom, SharedAtom, SpaceAtom, SpaceKind, StyleAtom,
    SymbolAtom,
};
use crate::environment::SizeFactors;
use crate::error::{ParseError, ParseResult, Position};
use crate::resources::symbols::SymbolSpec;
use crate::resources::TexContext;

use self::commands::{Cmd, Outcome, Switch};
use self::macros::{MacroRegistry, UserEnvironment, UserMacro};

/// Cap on buffer splices, so a self-referential macro cannot spin forever.
const SPLICE_BUDGET: u32 = 10_000;

/// A parsed formula plus the per-parse settings layout needs.
#[derive(Debug)]
pub struct Formula {
    pub root: SharedAtom,
    pub sizes: SizeFactors,
}

/// Parse `source` against the loaded tables. With `partial` set,
/// recoverable errors render as red placeholder atoms instead of failing.
pub fn parse_formula(ctx: &TexContext, source: &str, partial: bool) -> ParseResult<Formula> {
    let mut parser = TexParser::new(ctx, source, partial);
    parser.preprocess()?;
    let atoms = parser.parse_all()?;
    // Row(Row(x)) never survives; a sole nested row is hoisted
    let root = Rc::new(Atom::Row(RowAtom::of(rowify_or_empty(atoms))));
    Ok(Formula {
        root,
        sizes: parser.sizes,
    })
}

/// One frame per open group: the atoms collected so far and any pending
/// rest-of-group switches (`\color`, `\displaystyle`, `\bf`).
struct Frame {
    atoms: Vec<SharedAtom>,
    switches: Vec<(usize, Switch)>,
}

impl Frame {
    fn new() -> Frame {
        Frame {
            atoms: Vec::new(),
            switches: Vec::new(),
        }
    }
}

pub struct TexParser<'c> {
    pub(crate) ctx: &'c TexContext,
    src: Vec<char>,
    pos: usize,
    group: i32,
    pub(crate) at_is_letter: u32,
    math_mode: bool,
    partial: bool,
    registry: MacroRegistry,
    sizes: SizeFactors,
    splices: u32,
    frames: Vec<Frame>,
}

impl<'c> TexParser<'c> {
    pub fn new(ctx: &'c TexContext, source: &str, partial: bool) -> TexParser<'c> {
        TexParser {
            ctx,
            src: source.chars().collect(),
            pos: 0,
            group: 0,
            at_is_letter: 0,
            math_mode: true,
            partial,
            registry: ctx.macros.clone(),
            sizes: SizeFactors::default(),
            splices: 0,
            frames: vec![Frame::new()],
        }
    }

    // ------------------------------------------------------------------
    // cursor primitives

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn position(&self) -> Position {
        let mut line = 1;
        let mut col = 1;
        for &c in self.src.iter().take(self.pos) {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Position { line, col }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_command_letter(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || (self.at_is_letter > 0 && c == '@')
    }

    /// Command name starting at `start` (the char after the backslash):
    /// the longest letter run, or a single non-letter char. Returns the
    /// name and the index past it.
    fn command_name_at(&self, start: usize) -> (String, usize) {
        if start >= self.src.len() {
            return (String::new(), self.src.len());
        }
        let mut end = start;
        while end < self.src.len() && self.is_command_letter(self.src[end]) {
            end += 1;
        }
        if end == start && start < self.src.len() {
            end = start + 1;
        }
        (self.src[start..end].iter().collect(), end)
    }

    /// Consume the command name at the cursor (cursor sits on `\`).
    fn get_command(&mut self) -> String {
        let (name, end) = self.command_name_at(self.pos + 1);
        self.pos = end;
        name
    }

    fn splice(&mut self, start: usize, end: usize, replacement: &str) -> ParseResult<()> {
        self.splices += 1;
        if self.splices > SPLICE_BUDGET {
            return Err(ParseError::ExpansionOverflow {
                pos: self.position(),
            });
        }
        self.src.splice(start..end, replacement.chars());
        Ok(())
    }

    // ------------------------------------------------------------------
    // preprocess pass: user macro inflation

    pub fn preprocess(&mut self) -> ParseResult<()> {
        let mut at_depth = 0u32;
        let mut i = 0;
        while i < self.src.len() {
            match self.src[i] {
                '%' => {
                    while i < self.src.len() && self.src[i] != '\n' {
                        i += 1;
                    }
                }
                '\\' => {
                    let saved_at = self.at_is_letter;
                    self.at_is_letter = at_depth;
                    let (name, name_end) = self.command_name_at(i + 1);
                    self.at_is_letter = saved_at;
                    match name.as_str() {
                        "newcommand" | "renewcommand" => {
                            self.pos = name_end;
                            self.define_user_macro(name == "renewcommand")?;
                            let end = self.pos;
                            self.splice(i, end, "")?;
                        }
                        "newenvironment" | "renewenvironment" => {
                            self.pos = name_end;
                            self.define_user_environment(name == "renewenvironment")?;
                            let end = self.pos;
                            self.splice(i, end, "")?;
                        }
                        "makeatletter" => {
                            at_depth += 1;
                            i = name_end;
                        }
                        "makeatother" => {
                            at_depth = at_depth.saturating_sub(1);
                            i = name_end;
                        }
                        "begin" => {
                            self.pos = name_end;
                            let env_name = self.get_arg_text()?;
                            match self.registry.environment(&env_name).cloned() {
                                Some(env) => {
                                    self.inflate_environment(i, &env_name, env)?
                                }
                                // built-in environment, handled in the main
                                // pass
                                None => i = name_end,
                            }
                        }
                        _ => {
                            if let Some(mac) = self.registry.get(&name).cloned() {
                                self.pos = name_end;
                                self.expand_user_macro(i, &mac)?;
                            } else {
                                i = name_end.max(i + 1);
                            }
                        }
                    }
                }
                _ => i += 1,
            }
        }
        Ok(())
    }

    /// `\newcommand{\name}[argc][default]{body}`
    fn define_user_macro(&mut self, renew: bool) -> ParseResult<()> {
        let pos = self.position();
        let name_group = self.get_arg_text()?;
        let name = name_group.trim().trim_start_matches('\\').to_string();
        let argc_text = self.get_opt_text()?;
        let default = self.get_opt_text()?;
        let body = self.get_arg_text()?;

        let declared: usize = match &argc_text {
            Some(text) => text.trim().parse().map_err(|_| ParseError::InvalidNumber {
                snippet: text.clone(),
                pos,
            })?,
            None => 0,
        };
        // the optional argument occupies slot #1, so it is not captured
        let argc = if default.is_some() {
            declared.saturating_sub(1)
        } else {
            declared
        };
        let mac = UserMacro {
            argc,
            optional_default: default,
            body,
        };
        if renew {
            self.registry.redefine(&name, mac, pos)
        } else {
            self.registry.define(&name, mac, pos)
        }
    }

    /// `\newenvironment{name}[argc]{begin}{end}`
    fn define_user_environment(&mut self, renew: bool) -> ParseResult<()> {
        let pos = self.position();
        let name = self.get_arg_text()?.trim().to_string();
        let argc_text = self.get_opt_text()?;
        let begin = self.get_arg_text()?;
        let end = self.get_arg_text()?;
        let argc: usize = match &argc_text {
            Some(text) => text.trim().parse().map_err(|_| ParseError::InvalidNumber {
                snippet: text.clone(),
                pos,
            })?,
            None => 0,
        };
        let env = UserEnvironment { argc, begin, end };
        if renew {
            self.registry.redefine_environment(&name, env, pos)
        } else {
            self.registry.define_environment(&name, env, pos)
        }
    }

    /// Replace a user macro call (starting at `start`, arguments at the
    /// cursor) with its expansion; scanning resumes at `start`.
    fn expand_user_macro(&mut self, start: usize, mac: &UserMacro) -> ParseResult<()> {
        let optional = if mac.optional_default.is_some() {
            self.get_opt_text()?
        } else {
            None
        };
        let mut args = Vec::with_capacity(mac.argc);
        for _ in 0..mac.argc {
            args.push(self.get_arg_text()?);
        }
        let expansion = mac.expand(optional.as_deref(), &args);
        let end = self.pos;
        debug!("expanding user macro into {} chars", expansion.len());
        self.splice(start, end, &expansion)
    }

    /// Rewrite `\begin{env}…\end{env}` of a user environment into
    /// `{\makeatletter\env@env{a1}…{an}{body}\makeatother}`.
    fn inflate_environment(
        &mut self,
        start: usize,
        name: &str,
        env: UserEnvironment,
    ) -> ParseResult<()> {
        let mut args = Vec::with_capacity(env.argc);
        for _ in 0..env.argc {
            args.push(self.get_arg_text()?);
        }
        let body = self.get_multi_group(
            &format!("\\begin{{{name}}}"),
            &format!("\\end{{{name}}}"),
        )?;
        let macro_name = format!("{name}@env");
        if self.registry.get(&macro_name).is_none() {
            self.registry.define(
                &macro_name,
                env.as_macro(),
                self.position(),
            )?;
        }
        let mut call = format!("{{\\makeatletter\\{macro_name}");
        for arg in &args {
            call.push('{');
            call.push_str(arg);
            call.push('}');
        }
        call.push('{');
        call.push_str(&body);
        call.push_str("}\\makeatother}");
        let end = self.pos;
        self.splice(start, end, &call)
    }

    // ------------------------------------------------------------------
    // group and argument capture

    /// Content of a balanced `{…}` group; cursor sits on the opening
    /// brace and ends past the closing one.
    fn get_group_content(&mut self, open: char, close: char) -> ParseResult<String> {
        let start_pos = self.position();
        debug_assert_eq!(self.peek(), Some(open));
        self.advance();
        let start = self.pos;
        let mut depth = 1;
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.advance();
                self.advance();
                continue;
            }
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    let content: String = self.src[start..self.pos].iter().collect();
                    self.advance();
                    return Ok(content);
                }
            }
            self.advance();
        }
        if self.partial {
            Ok(self.src[start..].iter().collect())
        } else {
            Err(ParseError::UnbalancedGroup {
                open: open.to_string(),
                close: close.to_string(),
                pos: start_pos,
            })
        }
    }

    /// Balanced scan between multi-char delimiters (`\left…\right`,
    /// `\begin{x}…\end{x}`); `open` has already been consumed. Ends past
    /// the closing delimiter and returns the content between.
    fn get_multi_group(&mut self, open: &str, close: &str) -> ParseResult<String> {
        let start_pos = self.position();
        let open: Vec<char> = open.chars().collect();
        let close: Vec<char> = close.chars().collect();
        let start = self.pos;
        let mut depth = 1;
        let mut i = self.pos;
        while i < self.src.len() {
            if self.src[i] == '\\' && self.matches_at(i, &close) {
                depth -= 1;
                if depth == 0 {
                    let content: String = self.src[start..i].iter().collect();
                    self.pos = i + close.len();
                    return Ok(content);
                }
                i += close.len();
            } else if self.src[i] == '\\' && self.matches_at(i, &open) {
                depth += 1;
                i += open.len();
            } else if self.src[i] == '\\' {
                i += 2;
            } else {
                i += 1;
            }
        }
        if self.partial {
            self.pos = self.src.len();
            Ok(self.src[start..].iter().collect())
        } else {
            Err(ParseError::UnbalancedGroup {
                open: open.iter().collect(),
                close: close.iter().collect(),
                pos: start_pos,
            })
        }
    }

    /// `needle` (starting with `\`) matches at `i`, on a command-name
    /// boundary.
    fn matches_at(&self, i: usize, needle: &[char]) -> bool {
        if i + needle.len() > self.src.len() {
            return false;
        }
        if self.src[i..i + needle.len()] != *needle {
            return false;
        }
        // reject "\leftarrow" when probing for "\left"
        let last = needle[needle.len() - 1];
        if last.is_ascii_alphabetic() {
            match self.src.get(i + needle.len()) {
                Some(c) if c.is_ascii_alphabetic() => return false,
                _ => {}
            }
        }
        true
    }

    /// One mandatory argument as raw text: a `{…}` group, a `\command`
    /// token, or a single character.
    pub(crate) fn get_arg_text(&mut self) -> ParseResult<String> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.get_group_content('{', '}'),
            Some('\\') => {
                let (name, end) = self.command_name_at(self.pos + 1);
                self.pos = end;
                Ok(format!("\\{name}"))
            }
            Some(c) => {
                self.advance();
                Ok(c.to_string())
            }
            None => Err(ParseError::MissingArgument {
                name: String::new(),
                index: 0,
                pos: self.position(),
            }),
        }
    }

    /// A bracketed optional argument, when present.
    pub(crate) fn get_opt_text(&mut self) -> ParseResult<Option<String>> {
        self.skip_whitespace();
        if self.peek() == Some('[') {
            self.get_group_content('[', ']').map(Some)
        } else {
            Ok(None)
        }
    }

    /// One argument parsed into an atom.
    pub(crate) fn get_argument_atom(&mut self) -> ParseResult<SharedAtom> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => {
                let content = self.get_group_content('{', '}')?;
                self.parse_fragment(&content)
            }
            Some('\\') => {
                self.frames.push(Frame::new());
                let result = self.parse_escape();
                let frame = self.frames.pop().expect("frame pushed above");
                result?;
                Ok(rowify_or_empty(frame.atoms))
            }
            Some(c) => {
                self.advance();
                self.char_atom(c)
            }
            None => Ok(Rc::new(Atom::Empty)),
        }
    }

    /// Parse an independent source fragment into one atom.
    pub(crate) fn parse_fragment(&mut self, src: &str) -> ParseResult<SharedAtom> {
        let mut sub = TexParser::new(self.ctx, src, self.partial);
        sub.registry = self.registry.clone();
        sub.at_is_letter = self.at_is_letter;
        sub.sizes = self.sizes;
        sub.preprocess()?;
        let atoms = sub.parse_all()?;
        Ok(rowify_or_empty(atoms))
    }

    pub(crate) fn int_arg(&mut self) -> ParseResult<i64> {
        let pos = self.position();
        let text = self.get_arg_text()?;
        text.trim()
            .parse()
            .map_err(|_| ParseError::InvalidNumber { snippet: text, pos })
    }

    pub(crate) fn float_arg(&mut self) -> ParseResult<f64> {
        let pos = self.position();
        let text = self.get_arg_text()?;
        text.trim()
            .parse()
            .map_err(|_| ParseError::InvalidNumber { snippet: text, pos })
    }

    // ------------------------------------------------------------------
    // symbols and delimiters

    pub(crate) fn symbol_for_char(&self, ch: char) -> Option<SymbolSpec> {
        if let Some(name) = self.ctx.mappings.symbol_for(ch, !self.math_mode) {
            if let Some(spec) = self.ctx.symbols.get(name) {
                return Some(spec.clone());
            }
        }
        let mut buf = [0u8; 4];
        self.ctx.symbols.get(ch.encode_utf8(&mut buf)).cloned()
    }

    /// The delimiter token after `\left`, `\right`, `\big`…: `.` means
    /// "no delimiter".
    pub(crate) fn get_delimiter(&mut self) -> ParseResult<Option<SymbolSpec>> {
        self.skip_whitespace();
        let pos = self.position();
        match self.peek() {
            Some('.') => {
                self.advance();
                Ok(None)
            }
            Some('\\') => {
                let name = self.get_command();
                match self.ctx.symbols.get(&name) {
                    Some(spec) if spec.delimiter => Ok(Some(spec.clone())),
                    Some(_) | None => self.delimiter_failure(&format!("\\{name}"), pos),
                }
            }
            Some(c) => {
                self.advance();
                match self.symbol_for_char(c) {
                    Some(spec) if spec.delimiter => Ok(Some(spec)),
                    _ => self.delimiter_failure(&c.to_string(), pos),
                }
            }
            None => self.delimiter_failure("", pos),
        }
    }

    fn delimiter_failure(
        &self,
        snippet: &str,
        pos: Position,
    ) -> ParseResult<Option<SymbolSpec>> {
        if self.partial {
            warn!("{pos}: '{snippet}' is not a delimiter, dropping it");
            Ok(None)
        } else {
            Err(ParseError::InvalidDelimiter {
                snippet: snippet.to_string(),
                pos,
            })
        }
    }

    /// A delimiter given as argument text (`\genfrac` arms).
    pub(crate) fn delimiter_from_text(&self, text: &str) -> ParseResult<Option<SymbolSpec>> {
        let text = text.trim();
        if text.is_empty() || text == "." {
            return Ok(None);
        }
        if let Some(name) = text.strip_prefix('\\') {
            return Ok(self.ctx.symbols.get(name).cloned());
        }
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(self.symbol_for_char(c)),
            _ => Err(ParseError::InvalidDelimiter {
                snippet: text.to_string(),
                pos: Position::default(),
            }),
        }
    }

    pub(crate) fn dots_atom(&self) -> SharedAtom {
        for name in ["cdots", "ldots", "dots"] {
            if let Some(spec) = self.ctx.symbols.get(name) {
                return Rc::new(Atom::Symbol(SymbolAtom::new(spec.clone())));
            }
        }
        Rc::new(Atom::Text(crate::atom::TextAtom {
            text: "⋯".to_string(),
        }))
    }

    // ------------------------------------------------------------------
    // main pass

    pub fn parse_all(&mut self) -> ParseResult<Vec<SharedAtom>> {
        while self.peek().is_some() {
            self.parse_token()?;
        }
        let frame = self.frames.pop().unwrap_or_else(Frame::new);
        self.frames.push(Frame::new());
        Ok(apply_switches(frame))
    }

    fn top(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack never empty")
    }

    fn push_atom(&mut self, atom: SharedAtom) {
        self.top().atoms.push(atom);
    }

    pub(crate) fn pop_last_atom(&mut self) -> Option<SharedAtom> {
        self.top().atoms.pop()
    }

    fn parse_token(&mut self) -> ParseResult<()> {
        let Some(ch) = self.peek() else {
            return Ok(());
        };
        match ch {
            '%' => {
                while matches!(self.peek(), Some(c) if c != '\n') {
                    self.advance();
                }
            }
            c if c.is_whitespace() => self.advance(),
            '\\' => self.parse_escape()?,
            '{' => {
                let group = self.parse_group()?;
                self.push_atom(group);
            }
            '}' => {
                if self.partial {
                    warn!("{}: stray closing brace", self.position());
                    self.advance();
                } else {
                    return Err(ParseError::UnbalancedGroup {
                        open: "{".to_string(),
                        close: "}".to_string(),
                        pos: self.position(),
                    });
                }
            }
            '^' | '_' => self.parse_scripts(ch)?,
            '\'' | '`' | '"' => self.parse_primes(ch)?,
            '&' => {
                if self.partial {
                    self.advance();
                } else {
                    return Err(ParseError::MisplacedColumnSep {
                        ch: '&',
                        pos: self.position(),
                    });
                }
            }
            '~' => {
                self.advance();
                self.push_atom(Rc::new(Atom::Space(SpaceAtom::new(SpaceKind::NonBreaking))));
            }
            '$' => {
                // inline/display toggles only mean something in text mode
                if self.partial {
                    self.advance();
                } else {
                    return Err(ParseError::UnknownSymbol {
                        ch: '$',
                        pos: self.position(),
                    });
                }
            }
            c => {
                // character→formula rewrites splice into the buffer, so a
                // replacement like `^2` still sees the atom before it
                if let Some(formula) = self.ctx.mappings.formula_for(c, !self.math_mode) {
                    let formula = formula.to_string();
                    self.splice(self.pos, self.pos + 1, &formula)?;
                } else {
                    self.advance();
                    let atom = self.char_atom(c)?;
                    self.push_atom(atom);
                }
            }
        }
        Ok(())
    }

    /// `{…}`: parse a nested group into one atom.
    fn parse_group(&mut self) -> ParseResult<SharedAtom> {
        let open_pos = self.position();
        self.advance();
        self.group += 1;
        self.frames.push(Frame::new());
        loop {
            match self.peek() {
                Some('}') => {
                    self.advance();
                    self.group -= 1;
                    break;
                }
                Some(_) => {
                    if let Err(e) = self.parse_token() {
                        self.frames.pop();
                        return Err(e);
                    }
                }
                None => {
                    self.frames.pop();
                    if self.partial {
                        return Ok(Rc::new(Atom::Empty));
                    }
                    return Err(ParseError::UnbalancedGroup {
                        open: "{".to_string(),
                        close: "}".to_string(),
                        pos: open_pos,
                    });
                }
            }
        }
        let frame = self.frames.pop().expect("group frame pushed above");
        Ok(rowify_or_empty(apply_switches(frame)))
    }

    /// `\…`: a built-in command, a symbol, or (partial mode) a red
    /// placeholder.
    fn parse_escape(&mut self) -> ParseResult<()> {
        let pos = self.position();
        let name = self.get_command();
        if name.is_empty() {
            self.push_atom(Rc::new(Atom::Empty));
            return Ok(());
        }

        if let Some(cmd) = commands::lookup(&name) {
            match cmd.invoke(self) {
                Ok(Outcome::Atom(atom)) => self.push_atom(atom),
                Ok(Outcome::Switch(switch)) => {
                    let at = self.top().atoms.len();
                    self.top().switches.push((at, switch));
                }
                Ok(Outcome::Nothing) => {}
                Err(e) if self.partial && !matches!(e, ParseError::ExpansionOverflow { .. }) => {
                    warn!("partial mode: {e}");
                    self.push_atom(commands::error_placeholder(&name));
                }
                Err(e) => return Err(e),
            }
            return Ok(());
        }

        if let Some(spec) = self.ctx.symbols.get(&name) {
            self.push_atom(Rc::new(Atom::Symbol(SymbolAtom::new(spec.clone()))));
            return Ok(());
        }

        if self.partial {
            warn!("partial mode: unknown command '\\{name}'");
            self.push_atom(commands::error_placeholder(&name));
            Ok(())
        } else {
            Err(ParseError::UnknownCommand { name, pos })
        }
    }

    /// A plain character: formula rewrites first, then symbol rewrites,
    /// then a bare char atom.
    fn char_atom(&mut self, ch: char) -> ParseResult<SharedAtom> {
        if let Some(formula) = self.ctx.mappings.formula_for(ch, !self.math_mode) {
            let formula = formula.to_string();
            return self.parse_fragment(&formula);
        }
        if let Some(spec) = self.symbol_for_char(ch) {
            return Ok(Rc::new(Atom::Symbol(SymbolAtom::new(spec))));
        }
        if ch.is_alphanumeric() {
            return Ok(Rc::new(Atom::Char(CharAtom::new(ch))));
        }
        if self.partial {
            warn!("partial mode: unknown character '{ch}'");
            Ok(Rc::new(Atom::Empty))
        } else {
            Err(ParseError::UnknownSymbol {
                ch,
                pos: self.position(),
            })
        }
    }

    // ------------------------------------------------------------------
    // scripts

    fn parse_scripts(&mut self, first: char) -> ParseResult<()> {
        self.advance();
        let first_arg = self.get_argument_atom()?;
        self.skip_whitespace();
        let second = self.peek();

        let (mut sub, mut sup) = (None, None);
        match (first, second) {
            ('_', Some('^')) => {
                self.advance();
                sub = Some(first_arg);
                sup = Some(self.get_argument_atom()?);
            }
            ('^', Some('_')) => {
                self.advance();
                sup = Some(first_arg);
                sub = Some(self.get_argument_atom()?);
            }
            ('^', _) => sup = Some(first_arg),
            (_, _) => sub = Some(first_arg),
        }

        let atom = self.attach_scripts(sub, sup);
        self.push_atom(atom);
        Ok(())
    }

    fn attach_scripts(
        &mut self,
        sub: Option<SharedAtom>,
        sup: Option<SharedAtom>,
    ) -> SharedAtom {
        let Some(prev) = self.pop_last_atom() else {
            // nothing to attach to: hang the scripts off an invisible M
            let base = Rc::new(Atom::Phantom(PhantomAtom::phantom(
                Rc::new(Atom::Char(CharAtom::new('M'))),
                false,
                true,
                true,
            )));
            return Rc::new(Atom::Scripts(ScriptsAtom { base, sub, sup }));
        };

        match &*prev {
            Atom::CumulativeScripts(cs) => {
                let mut merged = CumulativeScriptsAtom {
                    base: cs.base.clone(),
                    subs: cs.subs.clone(),
                    sups: cs.sups.clone(),
                };
                if let Some(sub) = sub {
                    merged.subs.push(sub);
                }
                if let Some(sup) = sup {
                    merged.sups.push(sup);
                }
                Rc::new(Atom::CumulativeScripts(merged))
            }
            Atom::Scripts(s) if s.sub.is_none() && sub.is_some() && sup.is_none() => {
                Rc::new(Atom::Scripts(ScriptsAtom {
                    base: s.base.clone(),
                    sub,
                    sup: s.sup.clone(),
                }))
            }
            Atom::Scripts(s) if s.sup.is_none() && sup.is_some() && sub.is_none() => {
                Rc::new(Atom::Scripts(ScriptsAtom {
                    base: s.base.clone(),
                    sub: s.sub.clone(),
                    sup,
                }))
            }
            Atom::BigOperator(op)
                if (sub.is_none() || op.under.is_none())
                    && (sup.is_none() || op.over.is_none()) =>
            {
                Rc::new(Atom::BigOperator(BigOperatorAtom {
                    base: op.base.clone(),
                    under: op.under.clone().or(sub),
                    over: op.over.clone().or(sup),
                    limits: op.limits,
                }))
            }
            Atom::OverUnderDelimiter(od) if od.script.is_none() && od.over && sup.is_some() => {
                let with_script = Rc::new(Atom::OverUnderDelimiter(
                    crate::atom::OverUnderDelimiterAtom {
                        base: od.base.clone(),
                        script: sup,
                        delimiter: od.delimiter.clone(),
                        kern: od.kern,
                        over: od.over,
                    },
                ));
                match sub {
                    Some(sub) => Rc::new(Atom::Scripts(ScriptsAtom {
                        base: with_script,
                        sub: Some(sub),
                        sup: None,
                    })),
                    None => with_script,
                }
            }
            _ if prev.right_type() == crate::atom::AtomType::BigOperator => {
                let limits = prev.limits();
                Rc::new(Atom::BigOperator(BigOperatorAtom {
                    base: prev.clone(),
                    under: sub,
                    over: sup,
                    limits,
                }))
            }
            _ => Rc::new(Atom::Scripts(ScriptsAtom {
                base: prev.clone(),
                sub,
                sup,
            })),
        }
    }

    /// `'`, `` ` `` and `"` shorthand: primes accumulate on the previous
    /// atom.
    fn parse_primes(&mut self, mark: char) -> ParseResult<()> {
        let mut count = 0usize;
        while self.peek() == Some(mark) {
            self.advance();
            count += 1;
        }
        let (name, fallback) = match mark {
            '`' => ("backprime", '‵'),
            _ => ("prime", '′'),
        };
        if mark == '"' {
            count *= 2;
        }
        let prime: SharedAtom = match self.ctx.symbols.get(name) {
            Some(spec) => Rc::new(Atom::Symbol(SymbolAtom::new(spec.clone()))),
            None => Rc::new(Atom::Char(CharAtom::new(fallback))),
        };

        let prev = self.pop_last_atom();
        let base = match prev {
            Some(prev) => prev,
            None => Rc::new(Atom::Empty),
        };
        let mut cumulative = match &*base {
            Atom::CumulativeScripts(cs) => CumulativeScriptsAtom {
                base: cs.base.clone(),
                subs: cs.subs.clone(),
                sups: cs.sups.clone(),
            },
            _ => CumulativeScriptsAtom::new(base.clone()),
        };
        for _ in 0..count {
            cumulative.sups.push(prime.clone());
        }
        self.push_atom(Rc::new(Atom::CumulativeScripts(cumulative)));
        Ok(())
    }

    // ------------------------------------------------------------------
    // fences and environments

    /// `\left` has been consumed: read the delimiter, the body up to the
    /// matching `\right`, and its delimiter.
    pub(crate) fn parse_fenced(&mut self) -> ParseResult<Outcome> {
        let left = self.get_delimiter()?;
        let body = self.get_multi_group("\\left", "\\right")?;
        let right = self.get_delimiter()?;

        let (first, middles) = split_on_middle(&body);
        let content = self.parse_fragment(&first)?;
        let mut middle = Vec::new();
        for (token, segment) in middles {
            if let Some(spec) = self.delimiter_from_text(&token)? {
                middle.push((spec, self.parse_fragment(&segment)?));
            } else {
                // a dropped middle delimiter keeps its content
                middle.push((
                    SymbolSpec {
                        name: ".".to_string(),
                        atom_type: crate::atom::AtomType::Ordinary,
                        delimiter: true,
                        char_font: crate::resources::fonts::CharFont::new(0, ' '),
                    },
                    self.parse_fragment(&segment)?,
                ));
            }
        }
        Ok(Outcome::Atom(Rc::new(Atom::Fenced(
            crate::atom::FencedAtom {
                left,
                right,
                content,
                middle,
            },
        ))))
    }

    /// `\begin` has been consumed: a built-in environment.
    pub(crate) fn parse_environment(&mut self) -> ParseResult<Outcome> {
        let pos = self.position();
        let name = self.get_arg_text()?;
        let Some((variant, left, right, has_spec)) = commands::environment_variant(&name)
        else {
            if self.partial {
                warn!("unknown environment '{name}'");
                return Ok(Outcome::Atom(commands::error_placeholder(&name)));
            }
            return Err(ParseError::UnknownEnvironment { name, pos });
        };

        let mut columns = if has_spec {
            let spec = self.get_arg_text()?;
            commands::parse_column_spec(self, &spec)?
        } else {
            Vec::new()
        };
        if columns.is_empty() && variant == crate::atom::MatrixVariant::Aligned {
            columns = vec![
                crate::atom::ColumnSpec::Right,
                crate::atom::ColumnSpec::Left,
            ];
        }
        if variant == crate::atom::MatrixVariant::Cases && columns.is_empty() {
            columns = vec![
                crate::atom::ColumnSpec::Left,
                crate::atom::ColumnSpec::Left,
            ];
        }

        let body = self.get_multi_group(
            &format!("\\begin{{{name}}}"),
            &format!("\\end{{{name}}}"),
        )?;
        let rows = self.split_matrix_rows(&body)?;
        let left = left.and_then(|c| self.symbol_for_char(c));
        let right = right.and_then(|c| self.symbol_for_char(c));
        Ok(Outcome::Atom(commands::build_matrix(
            variant, columns, rows, left, right,
        )))
    }

    /// Rows for `\substack`: one atom per `\\`-separated line.
    pub(crate) fn split_rows(&mut self, body: &str) -> ParseResult<Vec<SharedAtom>> {
        let mut out = Vec::new();
        for line in split_top_level(body, Separator::Newline) {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                out.push(self.parse_fragment(trimmed)?);
            }
        }
        Ok(out)
    }

    /// Rows and cells for a matrix body.
    fn split_matrix_rows(&mut self, body: &str) -> ParseResult<Vec<Vec<SharedAtom>>> {
        let mut rows = Vec::new();
        for line in split_top_level(body, Separator::Newline) {
            let mut line = line.trim();
            // leading \hline becomes its own rule row
            while let Some(rest) = strip_command(line, "hline") {
                rows.push(vec![Rc::new(Atom::Hline) as SharedAtom]);
                line = rest.trim_start();
            }
            if line.is_empty() {
                continue;
            }
            let mut cells = Vec::new();
            for cell in split_top_level(line, Separator::Ampersand) {
                cells.push(self.parse_fragment(cell.trim())?);
            }
            rows.push(cells);
        }
        Ok(rows)
    }

    pub(crate) fn apply_limits(&mut self, limits: LimitsType) -> ParseResult<()> {
        match self.pop_last_atom() {
            Some(prev) => {
                let replaced: SharedAtom = match &*prev {
                    Atom::BigOperator(op) => Rc::new(Atom::BigOperator(BigOperatorAtom {
                        base: op.base.clone(),
                        under: op.under.clone(),
                        over: op.over.clone(),
                        limits,
                    })),
                    Atom::Symbol(sym) => {
                        let mut with = SymbolAtom::new(sym.spec.clone());
                        with.limits = limits;
                        Rc::new(Atom::Symbol(with))
                    }
                    _ => {
                        debug!("\\limits after a non-operator atom, ignoring");
                        prev
                    }
                };
                self.push_atom(replaced);
            }
            None => debug!("\\limits with nothing before it, ignoring"),
        }
        Ok(())
    }

    pub(crate) fn declare_math_sizes(
        &mut self,
        base: f64,
        text: f64,
        script: f64,
        script_script: f64,
    ) {
        if base > 0.0 {
            self.sizes = SizeFactors {
                text: text / base,
                script: script / base,
                script_script: script_script / base,
            };
        }
    }
}

fn rowify_or_empty(atoms: Vec<SharedAtom>) -> SharedAtom {
    if atoms.is_empty() {
        Rc::new(Atom::Empty)
    } else {
        rowify(atoms)
    }
}

/// Wrap any pending rest-of-group switches around the atoms that followed
/// them, innermost last.
fn apply_switches(mut frame: Frame) -> Vec<SharedAtom> {
    while let Some((at, switch)) = frame.switches.pop() {
        let at = at.min(frame.atoms.len());
        let tail: Vec<SharedAtom> = frame.atoms.split_off(at);
        if tail.is_empty() {
            continue;
        }
        let content = rowify(tail);
        let wrapped: SharedAtom = match switch {
            Switch::Style(style) => Rc::new(Atom::Style(StyleAtom { style, content })),
            Switch::Font(kind) => Rc::new(Atom::FontStyle(FontStyleAtom { kind, content })),
            Switch::Color {
                foreground,
                background,
            } => Rc::new(Atom::Color(ColorAtom {
                content,
                foreground: foreground.unwrap_or(crate::graphics::Color::TRANSPARENT),
                background: background.unwrap_or(crate::graphics::Color::TRANSPARENT),
            })),
        };
        frame.atoms.push(wrapped);
    }
    frame.atoms
}

#[derive(Clone, Copy, PartialEq)]
enum Separator {
    /// `\\` (and `\cr`).
    Newline,
    Ampersand,
}

/// Split at separators that sit outside braces and outside nested
/// `\begin`/`\end` and `\left`/`\right` pairs.
fn split_top_level(text: &str, sep: Separator) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut brace = 0i32;
    let mut env = 0i32;
    let mut i = 0;
    let matches_word = |i: usize, word: &str| -> bool {
        let w: Vec<char> = word.chars().collect();
        if i + w.len() > chars.len() || chars[i..i + w.len()] != w[..] {
            return false;
        }
        match chars.get(i + w.len()) {
            Some(c) if c.is_ascii_alphabetic() => false,
            _ => true,
        }
    };
    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => brace += 1,
            '}' => brace -= 1,
            '\\' => {
                if matches_word(i, "\\begin") || matches_word(i, "\\left") {
                    env += 1;
                } else if matches_word(i, "\\end") || matches_word(i, "\\right") {
                    env -= 1;
                } else if brace == 0 && env == 0 {
                    if sep == Separator::Newline
                        && (chars.get(i + 1) == Some(&'\\') || matches_word(i, "\\cr"))
                    {
                        parts.push(std::mem::take(&mut current));
                        i += if chars.get(i + 1) == Some(&'\\') { 2 } else { 3 };
                        continue;
                    }
                }
                // copy the escape pair verbatim
                current.push(c);
                i += 1;
                if let Some(&next) = chars.get(i) {
                    current.push(next);
                    i += 1;
                }
                continue;
            }
            '&' if sep == Separator::Ampersand && brace == 0 && env == 0 => {
                parts.push(std::mem::take(&mut current));
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push(c);
        i += 1;
    }
    parts.push(current);
    parts
}

/// `text` starts with `\name` (on a word boundary): the remainder.
fn strip_command<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let rest = text.strip_prefix('\\')?.strip_prefix(name)?;
    match rest.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => None,
        _ => Some(rest),
    }
}

/// Split a `\left…\right` body at its top-level `\middle` tokens. Returns
/// the first segment and `(delimiter-token, segment)` pairs.
fn split_on_middle(body: &str) -> (String, Vec<(String, String)>) {
    let chars: Vec<char> = body.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut brace = 0i32;
    let mut nest = 0i32;
    let mut i = 0;
    let word = |i: usize, w: &str| -> bool {
        let w: Vec<char> = w.chars().collect();
        i + w.len() <= chars.len()
            && chars[i..i + w.len()] == w[..]
            && !matches!(chars.get(i + w.len()), Some(c) if c.is_ascii_alphabetic())
    };
    let mut pending_token: Option<String> = None;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' => brace += 1,
            '}' => brace -= 1,
            '\\' if word(i, "\\left") => nest += 1,
            '\\' if word(i, "\\right") => nest -= 1,
            '\\' if brace == 0 && nest == 0 && word(i, "\\middle") => {
                // close the running segment, read the delimiter token
                let segment = std::mem::take(&mut current);
                match pending_token.take() {
                    Some(token) => segments.push((token, segment)),
                    None => segments.push((String::new(), segment)),
                }
                i += "\\middle".len();
                while matches!(chars.get(i), Some(c) if c.is_whitespace()) {
                    i += 1;
                }
                let token = if chars.get(i) == Some(&'\\') {
                    let mut name = String::from("\\");
                    i += 1;
                    while matches!(chars.get(i), Some(c) if c.is_ascii_alphabetic()) {
                        name.push(chars[i]);
                        i += 1;
                    }
                    name
                } else {
                    let t = chars.get(i).map(|c| c.to_string()).unwrap_or_default();
                    i += 1;
                    t
                };
                pending_token = Some(token);
                continue;
            }
            // escape pairs are copied verbatim so \{ and \} don't disturb
            // the depth counters
            '\\' => {
                current.push(c);
                i += 1;
                if let Some(&next) = chars.get(i) {
                    current.push(next);
                    i += 1;
                }
                continue;
            }
            _ => {}
        }
        current.push(c);
        i += 1;
    }
    let mut iter = segments.into_iter();
    let first = match iter.next() {
        Some((_, seg)) => seg,
        None => {
            return match pending_token {
                Some(token) => (String::new(), vec![(token, current)]),
                None => (current, Vec::new()),
            }
        }
    };
    let mut middles: Vec<(String, String)> = iter.collect();
    if let Some(token) = pending_token {
        middles.push((token, current));
    }
    (first, middles)
}
