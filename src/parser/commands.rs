//! Built-in command registry: a static table mapping command names to a
//! [`Cmd`] value, and the dispatch that turns a `Cmd` plus captured
//! arguments into atoms.

use std::rc::Rc;

use crate::atom::{
    AccentedAtom, Atom, AtomType, BarThickness, BigOperatorAtom, ColorAtom, ColumnSpec,
    FencedAtom, FontStyleAtom, FontStyleKind, FractionAtom, FrameKind, FramedAtom, LimitsType,
    LongDivAtom, MatrixAtom, MatrixVariant, MulticolumnAtom, OverlineAtom, OverUnderDelimiterAtom,
    PhantomAtom, RadicalAtom, RaiseAtom, ReflectAtom, ResizeAtom, RotateAtom, RotationOrigin,
    RuleAtom, ScaleAtom, SharedAtom, SizedDelimiterAtom, SpaceAtom, SpaceKind, StrikeAtom,
    StrikeKind, StyleAtom, TextAtom, TypedAtom, UnderOverAtom, VRowAtom, XArrowAtom,
};
use crate::dimensions::{Length, Unit};
use crate::environment::TexStyle;
use crate::error::{ParseError, ParseResult};
use crate::graphics::Color;

use super::color::parse_color;
use super::TexParser;

/// What a command handler hands back to the parse loop.
pub enum Outcome {
    Atom(SharedAtom),
    /// Applies to the remainder of the enclosing group.
    Switch(Switch),
    Nothing,
}

#[derive(Debug, Clone)]
pub enum Switch {
    Style(TexStyle),
    Color {
        foreground: Option<Color>,
        background: Option<Color>,
    },
    Font(FontStyleKind),
}

/// A built-in command. Variants carry everything that distinguishes the
/// command family members so one handler serves the whole family.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Fraction {
        bar: BarThickness,
        style: Option<TexStyle>,
        binomial: bool,
    },
    GenFrac,
    Sqrt,
    Space(SpaceKind),
    HSpace,
    Style(TexStyle),
    FontSwitch(FontStyleKind),
    FontArg(FontStyleKind),
    Text,
    TextColor,
    ColorSwitch,
    ColorBox,
    FColorBox,
    FgColor,
    BgColor,
    Framed(FrameKind),
    Rule,
    RaiseBox,
    ScaleBox,
    ReflectBox,
    RotateBox,
    ResizeBox,
    Phantom {
        width: bool,
        height: bool,
        depth: bool,
    },
    Smash,
    Accent(&'static str),
    Overline(bool),
    OverUnderBrace(bool),
    Overset,
    Underset,
    Stackrel,
    Substack,
    XArrow {
        left: bool,
    },
    Strike(StrikeKind),
    TextOperator {
        name: &'static str,
        own_limits: bool,
    },
    OperatorName,
    MathOp,
    MathType(AtomType),
    DelimiterSize {
        size: u8,
        atom_type: AtomType,
    },
    Left,
    Middle,
    Right,
    Begin,
    End,
    NewLine,
    Hline,
    HdotsFor,
    Multicolumn,
    Limits(LimitsType),
    LongDiv,
    DeclareMathSizes,
    MakeAtLetter,
    MakeAtOther,
    AllowBreak,
    EscapedChar(char),
}

pub fn lookup(name: &str) -> Option<Cmd> {
    COMMANDS.get(name).cloned()
}

static COMMANDS: phf::Map<&'static str, Cmd> = phf::phf_map! {
    // fractions and binomials
    "frac" => Cmd::Fraction { bar: BarThickness::Default, style: None, binomial: false },
    "dfrac" => Cmd::Fraction { bar: BarThickness::Default, style: Some(TexStyle::DISPLAY), binomial: false },
    "tfrac" => Cmd::Fraction { bar: BarThickness::Default, style: Some(TexStyle::TEXT), binomial: false },
    "cfrac" => Cmd::Fraction { bar: BarThickness::Default, style: Some(TexStyle::DISPLAY), binomial: false },
    "binom" => Cmd::Fraction { bar: BarThickness::None, style: None, binomial: true },
    "dbinom" => Cmd::Fraction { bar: BarThickness::None, style: Some(TexStyle::DISPLAY), binomial: true },
    "tbinom" => Cmd::Fraction { bar: BarThickness::None, style: Some(TexStyle::TEXT), binomial: true },
    "genfrac" => Cmd::GenFrac,

    "sqrt" => Cmd::Sqrt,
    "longdiv" => Cmd::LongDiv,

    // spacing
    "," => Cmd::Space(SpaceKind::ThinMu),
    ":" => Cmd::Space(SpaceKind::MedMu),
    ">" => Cmd::Space(SpaceKind::MedMu),
    ";" => Cmd::Space(SpaceKind::ThickMu),
    "!" => Cmd::Space(SpaceKind::NegThinMu),
    "quad" => Cmd::Space(SpaceKind::Quad),
    "qquad" => Cmd::Space(SpaceKind::Custom {
        width: Length::new(2.0, Unit::Em),
        height: Length::zero(),
        depth: Length::zero(),
    }),
    "thinspace" => Cmd::Space(SpaceKind::ThinMu),
    "medspace" => Cmd::Space(SpaceKind::MedMu),
    "thickspace" => Cmd::Space(SpaceKind::ThickMu),
    "negthinspace" => Cmd::Space(SpaceKind::NegThinMu),
    "negmedspace" => Cmd::Space(SpaceKind::NegMedMu),
    "negthickspace" => Cmd::Space(SpaceKind::NegThickMu),
    "hspace" => Cmd::HSpace,
    "hskip" => Cmd::HSpace,
    "allowbreak" => Cmd::AllowBreak,

    // styles
    "displaystyle" => Cmd::Style(TexStyle::DISPLAY),
    "textstyle" => Cmd::Style(TexStyle::TEXT),
    "scriptstyle" => Cmd::Style(TexStyle::SCRIPT),
    "scriptscriptstyle" => Cmd::Style(TexStyle::SCRIPT_SCRIPT),

    // fonts
    "mathbf" => Cmd::FontArg(FontStyleKind::Bold),
    "mathit" => Cmd::FontArg(FontStyleKind::Italic),
    "mathrm" => Cmd::FontArg(FontStyleKind::Roman),
    "mathsf" => Cmd::FontArg(FontStyleKind::SansSerif),
    "mathtt" => Cmd::FontArg(FontStyleKind::Typewriter),
    "mathcal" => Cmd::FontArg(FontStyleKind::Calligraphic),
    "mathfrak" => Cmd::FontArg(FontStyleKind::Fraktur),
    "mathbb" => Cmd::FontArg(FontStyleKind::Blackboard),
    "bf" => Cmd::FontSwitch(FontStyleKind::Bold),
    "it" => Cmd::FontSwitch(FontStyleKind::Italic),
    "rm" => Cmd::FontSwitch(FontStyleKind::Roman),
    "sf" => Cmd::FontSwitch(FontStyleKind::SansSerif),
    "tt" => Cmd::FontSwitch(FontStyleKind::Typewriter),
    "cal" => Cmd::FontSwitch(FontStyleKind::Calligraphic),
    "frak" => Cmd::FontSwitch(FontStyleKind::Fraktur),
    "Bbb" => Cmd::FontSwitch(FontStyleKind::Blackboard),
    "boldsymbol" => Cmd::FontArg(FontStyleKind::Bold),

    "text" => Cmd::Text,
    "mbox" => Cmd::Text,

    // color
    "textcolor" => Cmd::TextColor,
    "color" => Cmd::ColorSwitch,
    "colorbox" => Cmd::ColorBox,
    "fcolorbox" => Cmd::FColorBox,
    "fgcolor" => Cmd::FgColor,
    "bgcolor" => Cmd::BgColor,

    // framed boxes
    "fbox" => Cmd::Framed(FrameKind::Box),
    "boxed" => Cmd::Framed(FrameKind::Box),
    "ovalbox" => Cmd::Framed(FrameKind::Oval),
    "shadowbox" => Cmd::Framed(FrameKind::Shadow),

    "rule" => Cmd::Rule,
    "raisebox" => Cmd::RaiseBox,
    "scalebox" => Cmd::ScaleBox,
    "reflectbox" => Cmd::ReflectBox,
    "rotatebox" => Cmd::RotateBox,
    "resizebox" => Cmd::ResizeBox,

    "phantom" => Cmd::Phantom { width: true, height: true, depth: true },
    "hphantom" => Cmd::Phantom { width: true, height: false, depth: false },
    "vphantom" => Cmd::Phantom { width: false, height: true, depth: true },
    "smash" => Cmd::Smash,

    // accents
    "hat" => Cmd::Accent("hat"),
    "widehat" => Cmd::Accent("widehat"),
    "check" => Cmd::Accent("check"),
    "tilde" => Cmd::Accent("tilde"),
    "widetilde" => Cmd::Accent("widetilde"),
    "acute" => Cmd::Accent("acute"),
    "grave" => Cmd::Accent("grave"),
    "dot" => Cmd::Accent("dot"),
    "ddot" => Cmd::Accent("ddot"),
    "breve" => Cmd::Accent("breve"),
    "bar" => Cmd::Accent("bar"),
    "vec" => Cmd::Accent("vec"),

    "overline" => Cmd::Overline(true),
    "underline" => Cmd::Overline(false),
    "overbrace" => Cmd::OverUnderBrace(true),
    "underbrace" => Cmd::OverUnderBrace(false),
    "overset" => Cmd::Overset,
    "underset" => Cmd::Underset,
    "stackrel" => Cmd::Stackrel,
    "substack" => Cmd::Substack,
    "xleftarrow" => Cmd::XArrow { left: true },
    "xrightarrow" => Cmd::XArrow { left: false },

    "cancel" => Cmd::Strike(StrikeKind::Slash),
    "bcancel" => Cmd::Strike(StrikeKind::Backslash),
    "xcancel" => Cmd::Strike(StrikeKind::Cross),
    "st" => Cmd::Strike(StrikeKind::Horizontal),

    // named text operators
    "sin" => Cmd::TextOperator { name: "sin", own_limits: false },
    "cos" => Cmd::TextOperator { name: "cos", own_limits: false },
    "tan" => Cmd::TextOperator { name: "tan", own_limits: false },
    "cot" => Cmd::TextOperator { name: "cot", own_limits: false },
    "sec" => Cmd::TextOperator { name: "sec", own_limits: false },
    "csc" => Cmd::TextOperator { name: "csc", own_limits: false },
    "sinh" => Cmd::TextOperator { name: "sinh", own_limits: false },
    "cosh" => Cmd::TextOperator { name: "cosh", own_limits: false },
    "tanh" => Cmd::TextOperator { name: "tanh", own_limits: false },
    "coth" => Cmd::TextOperator { name: "coth", own_limits: false },
    "arcsin" => Cmd::TextOperator { name: "arcsin", own_limits: false },
    "arccos" => Cmd::TextOperator { name: "arccos", own_limits: false },
    "arctan" => Cmd::TextOperator { name: "arctan", own_limits: false },
    "log" => Cmd::TextOperator { name: "log", own_limits: false },
    "lg" => Cmd::TextOperator { name: "lg", own_limits: false },
    "ln" => Cmd::TextOperator { name: "ln", own_limits: false },
    "exp" => Cmd::TextOperator { name: "exp", own_limits: false },
    "arg" => Cmd::TextOperator { name: "arg", own_limits: false },
    "deg" => Cmd::TextOperator { name: "deg", own_limits: false },
    "dim" => Cmd::TextOperator { name: "dim", own_limits: false },
    "hom" => Cmd::TextOperator { name: "hom", own_limits: false },
    "ker" => Cmd::TextOperator { name: "ker", own_limits: false },
    "lim" => Cmd::TextOperator { name: "lim", own_limits: true },
    "limsup" => Cmd::TextOperator { name: "lim sup", own_limits: true },
    "liminf" => Cmd::TextOperator { name: "lim inf", own_limits: true },
    "max" => Cmd::TextOperator { name: "max", own_limits: true },
    "min" => Cmd::TextOperator { name: "min", own_limits: true },
    "sup" => Cmd::TextOperator { name: "sup", own_limits: true },
    "inf" => Cmd::TextOperator { name: "inf", own_limits: true },
    "det" => Cmd::TextOperator { name: "det", own_limits: true },
    "gcd" => Cmd::TextOperator { name: "gcd", own_limits: true },
    "Pr" => Cmd::TextOperator { name: "Pr", own_limits: true },
    "operatorname" => Cmd::OperatorName,
    "mathop" => Cmd::MathOp,

    // atom re-typing
    "mathord" => Cmd::MathType(AtomType::Ordinary),
    "mathbin" => Cmd::MathType(AtomType::BinaryOperator),
    "mathrel" => Cmd::MathType(AtomType::Relation),
    "mathopen" => Cmd::MathType(AtomType::Opening),
    "mathclose" => Cmd::MathType(AtomType::Closing),
    "mathpunct" => Cmd::MathType(AtomType::Punctuation),
    "mathinner" => Cmd::MathType(AtomType::Inner),

    // delimiter sizing
    "big" => Cmd::DelimiterSize { size: 1, atom_type: AtomType::Ordinary },
    "Big" => Cmd::DelimiterSize { size: 2, atom_type: AtomType::Ordinary },
    "bigg" => Cmd::DelimiterSize { size: 3, atom_type: AtomType::Ordinary },
    "Bigg" => Cmd::DelimiterSize { size: 4, atom_type: AtomType::Ordinary },
    "bigl" => Cmd::DelimiterSize { size: 1, atom_type: AtomType::Opening },
    "Bigl" => Cmd::DelimiterSize { size: 2, atom_type: AtomType::Opening },
    "biggl" => Cmd::DelimiterSize { size: 3, atom_type: AtomType::Opening },
    "Biggl" => Cmd::DelimiterSize { size: 4, atom_type: AtomType::Opening },
    "bigr" => Cmd::DelimiterSize { size: 1, atom_type: AtomType::Closing },
    "Bigr" => Cmd::DelimiterSize { size: 2, atom_type: AtomType::Closing },
    "biggr" => Cmd::DelimiterSize { size: 3, atom_type: AtomType::Closing },
    "Biggr" => Cmd::DelimiterSize { size: 4, atom_type: AtomType::Closing },
    "bigm" => Cmd::DelimiterSize { size: 1, atom_type: AtomType::Relation },
    "Bigm" => Cmd::DelimiterSize { size: 2, atom_type: AtomType::Relation },
    "biggm" => Cmd::DelimiterSize { size: 3, atom_type: AtomType::Relation },
    "Biggm" => Cmd::DelimiterSize { size: 4, atom_type: AtomType::Relation },

    "left" => Cmd::Left,
    "middle" => Cmd::Middle,
    "right" => Cmd::Right,
    "begin" => Cmd::Begin,
    "end" => Cmd::End,
    "\\" => Cmd::NewLine,
    "cr" => Cmd::NewLine,
    "hline" => Cmd::Hline,
    "hdotsfor" => Cmd::HdotsFor,
    "multicolumn" => Cmd::Multicolumn,

    "limits" => Cmd::Limits(LimitsType::Limits),
    "nolimits" => Cmd::Limits(LimitsType::NoLimits),

    "DeclareMathSizes" => Cmd::DeclareMathSizes,
    "makeatletter" => Cmd::MakeAtLetter,
    "makeatother" => Cmd::MakeAtOther,

    // escaped literals
    "{" => Cmd::EscapedChar('{'),
    "}" => Cmd::EscapedChar('}'),
    "$" => Cmd::EscapedChar('$'),
    "%" => Cmd::EscapedChar('%'),
    "&" => Cmd::EscapedChar('&'),
    "#" => Cmd::EscapedChar('#'),
    "_" => Cmd::EscapedChar('_'),
    "|" => Cmd::EscapedChar('‖'),
};

impl Cmd {
    pub fn invoke(self, p: &mut TexParser) -> ParseResult<Outcome> {
        let atom = |a: Atom| Ok(Outcome::Atom(Rc::new(a)));
        match self {
            Cmd::Fraction {
                bar,
                style,
                binomial,
            } => {
                let pos = p.position();
                let num = p.get_argument_atom()?;
                let den = p.get_argument_atom()?;
                if matches!(*num, Atom::Empty) || matches!(*den, Atom::Empty) {
                    return Err(ParseError::EmptyFraction { pos });
                }
                let frac = Rc::new(Atom::Fraction(FractionAtom {
                    numerator: num,
                    denominator: den,
                    thickness: bar,
                    use_kern: true,
                }));
                let inner: SharedAtom = if binomial {
                    Rc::new(Atom::Fenced(FencedAtom {
                        left: p.symbol_for_char('('),
                        right: p.symbol_for_char(')'),
                        content: frac,
                        middle: Vec::new(),
                    }))
                } else {
                    frac
                };
                match style {
                    Some(style) => atom(Atom::Style(StyleAtom {
                        style,
                        content: inner,
                    })),
                    None => Ok(Outcome::Atom(inner)),
                }
            }

            Cmd::GenFrac => {
                let pos = p.position();
                let left = p.get_arg_text()?;
                let right = p.get_arg_text()?;
                let thickness = p.get_arg_text()?;
                let style_text = p.get_arg_text()?;
                let num = p.get_argument_atom()?;
                let den = p.get_argument_atom()?;
                let bar = if thickness.trim().is_empty() {
                    BarThickness::Default
                } else {
                    let len = Length::parse(&thickness).ok_or(ParseError::InvalidLength {
                        snippet: thickness.clone(),
                        pos,
                    })?;
                    if len.is_zero() {
                        BarThickness::None
                    } else {
                        BarThickness::Unit(len)
                    }
                };
                let style = match style_text.trim() {
                    "0" => Some(TexStyle::DISPLAY),
                    "1" => Some(TexStyle::TEXT),
                    "2" => Some(TexStyle::SCRIPT),
                    "3" => Some(TexStyle::SCRIPT_SCRIPT),
                    _ => None,
                };
                let frac = Rc::new(Atom::Fraction(FractionAtom {
                    numerator: num,
                    denominator: den,
                    thickness: bar,
                    use_kern: true,
                }));
                let fenced = Rc::new(Atom::Fenced(FencedAtom {
                    left: p.delimiter_from_text(&left)?,
                    right: p.delimiter_from_text(&right)?,
                    content: frac,
                    middle: Vec::new(),
                }));
                match style {
                    Some(style) => atom(Atom::Style(StyleAtom {
                        style,
                        content: fenced,
                    })),
                    None => Ok(Outcome::Atom(fenced)),
                }
            }

            Cmd::Sqrt => {
                let index = match p.get_opt_text()? {
                    Some(text) => Some(p.parse_fragment(&text)?),
                    None => None,
                };
                let radicand = p.get_argument_atom()?;
                atom(Atom::Radical(RadicalAtom { radicand, index }))
            }

            Cmd::LongDiv => {
                let pos = p.position();
                let divisor = p.int_arg()?;
                let dividend = p.int_arg()?;
                if divisor == 0 {
                    return Err(ParseError::ZeroDivisor { pos });
                }
                atom(Atom::LongDiv(LongDivAtom { divisor, dividend }))
            }

            Cmd::Space(kind) => atom(Atom::Space(SpaceAtom::new(kind))),

            Cmd::HSpace => {
                let pos = p.position();
                let text = p.get_arg_text()?;
                let len = Length::parse(&text).ok_or(ParseError::InvalidLength {
                    snippet: text,
                    pos,
                })?;
                atom(Atom::Space(SpaceAtom::new(SpaceKind::Custom {
                    width: len,
                    height: Length::zero(),
                    depth: Length::zero(),
                })))
            }

            Cmd::AllowBreak => atom(Atom::BreakMark),

            Cmd::Style(style) => Ok(Outcome::Switch(Switch::Style(style))),
            Cmd::FontSwitch(kind) => Ok(Outcome::Switch(Switch::Font(kind))),

            Cmd::FontArg(kind) => {
                let content = p.get_argument_atom()?;
                atom(Atom::FontStyle(FontStyleAtom { kind, content }))
            }

            Cmd::Text => {
                let text = p.get_arg_text()?;
                atom(Atom::Text(TextAtom { text }))
            }

            Cmd::TextColor => {
                let pos = p.position();
                let spec = p.get_arg_text()?;
                let color = parse_color(&spec, pos)?;
                let content = p.get_argument_atom()?;
                atom(Atom::Color(ColorAtom {
                    content,
                    foreground: color,
                    background: Color::TRANSPARENT,
                }))
            }

            Cmd::ColorSwitch => {
                let pos = p.position();
                let spec = p.get_arg_text()?;
                let color = parse_color(&spec, pos)?;
                Ok(Outcome::Switch(Switch::Color {
                    foreground: Some(color),
                    background: None,
                }))
            }

            Cmd::ColorBox => {
                let pos = p.position();
                let spec = p.get_arg_text()?;
                let background = parse_color(&spec, pos)?;
                let content = p.get_argument_atom()?;
                atom(Atom::Color(ColorAtom {
                    content,
                    foreground: Color::TRANSPARENT,
                    background,
                }))
            }

            Cmd::FColorBox => {
                let pos = p.position();
                let frame_spec = p.get_arg_text()?;
                let frame = parse_color(&frame_spec, pos)?;
                let bg_spec = p.get_arg_text()?;
                let background = parse_color(&bg_spec, pos)?;
                let content = p.get_argument_atom()?;
                let colored = Rc::new(Atom::Color(ColorAtom {
                    content,
                    foreground: Color::TRANSPARENT,
                    background,
                }));
                atom(Atom::Color(ColorAtom {
                    content: Rc::new(Atom::Framed(FramedAtom {
                        kind: FrameKind::Box,
                        content: colored,
                    })),
                    foreground: frame,
                    background: Color::TRANSPARENT,
                }))
            }

            Cmd::FgColor => one_color(p, true),
            Cmd::BgColor => one_color(p, false),

            Cmd::Framed(kind) => {
                let content = p.get_argument_atom()?;
                atom(Atom::Framed(FramedAtom { kind, content }))
            }

            Cmd::Rule => {
                let pos = p.position();
                let raise = p.get_opt_text()?;
                let width = p.get_arg_text()?;
                let height = p.get_arg_text()?;
                let parse = |text: String| {
                    Length::parse(&text).ok_or(ParseError::InvalidLength { snippet: text, pos })
                };
                atom(Atom::Rule(RuleAtom {
                    width: parse(width)?,
                    height: parse(height)?,
                    raise: raise.map(parse).transpose()?.unwrap_or(Length::zero()),
                }))
            }

            Cmd::RaiseBox => {
                let pos = p.position();
                let raise_text = p.get_arg_text()?;
                let raise = Length::parse(&raise_text).ok_or(ParseError::InvalidLength {
                    snippet: raise_text,
                    pos,
                })?;
                let height = p.get_opt_text()?.and_then(|t| Length::parse(&t));
                let depth = p.get_opt_text()?.and_then(|t| Length::parse(&t));
                let content = p.get_argument_atom()?;
                atom(Atom::Raise(RaiseAtom {
                    content,
                    raise,
                    height,
                    depth,
                }))
            }

            Cmd::ScaleBox => {
                let sx = p.float_arg()?;
                let sy = p.get_opt_text()?.and_then(|t| t.trim().parse().ok());
                let content = p.get_argument_atom()?;
                atom(Atom::Scale(ScaleAtom {
                    sx,
                    sy: sy.unwrap_or(sx),
                    content,
                }))
            }

            Cmd::ReflectBox => {
                let content = p.get_argument_atom()?;
                atom(Atom::Reflect(ReflectAtom { content }))
            }

            Cmd::RotateBox => {
                let origin = p
                    .get_opt_text()?
                    .and_then(|t| RotationOrigin::from_name(t.trim()))
                    .unwrap_or(RotationOrigin::BaselineLeft);
                let angle = p.float_arg()?;
                let content = p.get_argument_atom()?;
                atom(Atom::Rotate(RotateAtom {
                    angle,
                    origin,
                    content,
                }))
            }

            Cmd::ResizeBox => {
                let width = p.get_arg_text()?;
                let height = p.get_arg_text()?;
                let content = p.get_argument_atom()?;
                let parse = |t: &str| {
                    let t = t.trim();
                    if t == "!" {
                        None
                    } else {
                        Length::parse(t)
                    }
                };
                atom(Atom::Resize(ResizeAtom {
                    width: parse(&width),
                    height: parse(&height),
                    keep_aspect: width.trim() == "!" || height.trim() == "!",
                    content,
                }))
            }

            Cmd::Phantom {
                width,
                height,
                depth,
            } => {
                let content = p.get_argument_atom()?;
                atom(Atom::Phantom(PhantomAtom::phantom(
                    content, width, height, depth,
                )))
            }

            Cmd::Smash => {
                let content = p.get_argument_atom()?;
                atom(Atom::Phantom(PhantomAtom::smash(content)))
            }

            Cmd::Accent(name) => {
                let pos = p.position();
                let base = p.get_argument_atom()?;
                let spec = p
                    .ctx
                    .symbols
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ParseError::UnknownCommand {
                        name: name.to_string(),
                        pos,
                    })?;
                atom(Atom::Accented(AccentedAtom { accent: spec, base }))
            }

            Cmd::Overline(over) => {
                let content = p.get_argument_atom()?;
                atom(Atom::Overline(OverlineAtom { content, over }))
            }

            Cmd::OverUnderBrace(over) => {
                let pos = p.position();
                let base = p.get_argument_atom()?;
                let spec = p
                    .ctx
                    .symbols
                    .get("lbrace")
                    .or_else(|| p.ctx.symbols.get("{"))
                    .cloned()
                    .ok_or_else(|| ParseError::UnknownCommand {
                        name: "lbrace".to_string(),
                        pos,
                    })?;
                atom(Atom::OverUnderDelimiter(OverUnderDelimiterAtom {
                    base,
                    script: None,
                    delimiter: spec,
                    kern: Length::new(0.2, Unit::Em),
                    over,
                }))
            }

            Cmd::Overset => overset(p, false),
            Cmd::Stackrel => overset(p, true),

            Cmd::Underset => {
                let bottom = p.get_argument_atom()?;
                let base = p.get_argument_atom()?;
                atom(Atom::UnderOver(UnderOverAtom {
                    base,
                    over: None,
                    under: Some((bottom, Length::new(1.5, Unit::X8), true)),
                }))
            }

            Cmd::Substack => {
                let body = p.get_arg_text()?;
                let lines = p.split_rows(&body)?;
                atom(Atom::VRow(VRowAtom::new(lines)))
            }

            Cmd::XArrow { left } => {
                let under = match p.get_opt_text()? {
                    Some(text) => Some(p.parse_fragment(&text)?),
                    None => None,
                };
                let over = Some(p.get_argument_atom()?);
                atom(Atom::XArrow(XArrowAtom { over, under, left }))
            }

            Cmd::Strike(kind) => {
                let content = p.get_argument_atom()?;
                atom(Atom::Strike(StrikeAtom { kind, content }))
            }

            Cmd::TextOperator { name, own_limits } => {
                Ok(Outcome::Atom(text_operator(name, own_limits)))
            }

            Cmd::OperatorName => {
                let name = p.get_arg_text()?;
                Ok(Outcome::Atom(text_operator(&name, false)))
            }

            Cmd::MathOp => {
                let base = p.get_argument_atom()?;
                atom(Atom::BigOperator(BigOperatorAtom {
                    base,
                    under: None,
                    over: None,
                    limits: LimitsType::Normal,
                }))
            }

            Cmd::MathType(ty) => {
                let content = p.get_argument_atom()?;
                atom(Atom::Typed(TypedAtom {
                    left: ty,
                    right: ty,
                    content,
                }))
            }

            Cmd::DelimiterSize { size, atom_type } => {
                let pos = p.position();
                let spec = p.get_delimiter()?.ok_or(ParseError::InvalidDelimiter {
                    snippet: ".".to_string(),
                    pos,
                })?;
                atom(Atom::Typed(TypedAtom {
                    left: atom_type,
                    right: atom_type,
                    content: Rc::new(Atom::SizedDelimiter(SizedDelimiterAtom { spec, size })),
                }))
            }

            Cmd::Left => p.parse_fenced(),

            Cmd::Middle | Cmd::Right => {
                // only valid inside \left … \right, which consumes them
                Err(ParseError::UnbalancedGroup {
                    open: "\\left".to_string(),
                    close: "\\right".to_string(),
                    pos: p.position(),
                })
            }

            Cmd::Begin => p.parse_environment(),

            Cmd::End => Err(ParseError::UnbalancedGroup {
                open: "\\begin".to_string(),
                close: "\\end".to_string(),
                pos: p.position(),
            }),

            Cmd::NewLine => atom(Atom::BreakMark),
            Cmd::Hline => atom(Atom::Hline),

            Cmd::HdotsFor => {
                let span = p.int_arg()?.max(1) as usize;
                let dots = p.dots_atom();
                atom(Atom::Multicolumn(MulticolumnAtom {
                    span,
                    align: crate::boxes::Alignment::Center,
                    content: dots,
                }))
            }

            Cmd::Multicolumn => {
                let span = p.int_arg()?.max(1) as usize;
                let spec = p.get_arg_text()?;
                let align = spec
                    .chars()
                    .find_map(|c| match c {
                        'l' => Some(crate::boxes::Alignment::Left),
                        'c' => Some(crate::boxes::Alignment::Center),
                        'r' => Some(crate::boxes::Alignment::Right),
                        _ => None,
                    })
                    .unwrap_or(crate::boxes::Alignment::Center);
                let content = p.get_argument_atom()?;
                atom(Atom::Multicolumn(MulticolumnAtom {
                    span,
                    align,
                    content,
                }))
            }

            Cmd::Limits(limits) => {
                p.apply_limits(limits)?;
                Ok(Outcome::Nothing)
            }

            Cmd::DeclareMathSizes => {
                let base = p.float_arg()?;
                let text = p.float_arg()?;
                let script = p.float_arg()?;
                let script_script = p.float_arg()?;
                p.declare_math_sizes(base, text, script, script_script);
                Ok(Outcome::Nothing)
            }

            Cmd::MakeAtLetter => {
                p.at_is_letter += 1;
                Ok(Outcome::Nothing)
            }
            Cmd::MakeAtOther => {
                p.at_is_letter = p.at_is_letter.saturating_sub(1);
                Ok(Outcome::Nothing)
            }

            Cmd::EscapedChar(ch) => match p.symbol_for_char(ch) {
                Some(spec) => atom(Atom::Symbol(crate::atom::SymbolAtom::new(spec))),
                None => atom(Atom::Char(crate::atom::CharAtom::new(ch))),
            },
        }
    }
}

/// `\fgcolor`/`\bgcolor`: one color argument applied to one side.
fn one_color(p: &mut TexParser, is_foreground: bool) -> ParseResult<Outcome> {
    let pos = p.position();
    let spec = p.get_arg_text()?;
    let color = parse_color(&spec, pos)?;
    let content = p.get_argument_atom()?;
    let (foreground, background) = if is_foreground {
        (color, Color::TRANSPARENT)
    } else {
        (Color::TRANSPARENT, color)
    };
    Ok(Outcome::Atom(Rc::new(Atom::Color(ColorAtom {
        content,
        foreground,
        background,
    }))))
}

/// `\overset`/`\stackrel`: material above a base; `\stackrel` re-types the
/// base as a relation.
fn overset(p: &mut TexParser, as_relation: bool) -> ParseResult<Outcome> {
    let top = p.get_argument_atom()?;
    let base = p.get_argument_atom()?;
    let base: SharedAtom = if as_relation {
        Rc::new(Atom::Typed(TypedAtom {
            left: AtomType::Relation,
            right: AtomType::Relation,
            content: base,
        }))
    } else {
        base
    };
    Ok(Outcome::Atom(Rc::new(Atom::UnderOver(UnderOverAtom {
        base,
        over: Some((top, Length::new(1.5, Unit::X8), true)),
        under: None,
    }))))
}

/// `\sin`-style operators: roman text typed as a big operator.
fn text_operator(name: &str, own_limits: bool) -> SharedAtom {
    let text = Rc::new(Atom::FontStyle(FontStyleAtom {
        kind: FontStyleKind::Roman,
        content: Rc::new(Atom::Text(TextAtom {
            text: name.to_string(),
        })),
    }));
    Rc::new(Atom::BigOperator(BigOperatorAtom {
        base: text,
        under: None,
        over: None,
        limits: if own_limits {
            LimitsType::Normal
        } else {
            LimitsType::NoLimits
        },
    }))
}

/// Parse an `array`/`cases` column specification: `l c r |` plus `@{…}`.
pub(super) fn parse_column_spec(p: &mut TexParser, text: &str) -> ParseResult<Vec<ColumnSpec>> {
    let mut specs = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            'l' => specs.push(ColumnSpec::Left),
            'c' => specs.push(ColumnSpec::Center),
            'r' => specs.push(ColumnSpec::Right),
            '|' => specs.push(ColumnSpec::VerticalBar),
            '@' => {
                // @{…}: inline separator material
                if chars.get(i + 1) == Some(&'{') {
                    let mut depth = 1;
                    let start = i + 2;
                    let mut end = start;
                    while end < chars.len() && depth > 0 {
                        match chars[end] {
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        end += 1;
                    }
                    let inner: String = chars[start..end.saturating_sub(1)].iter().collect();
                    specs.push(ColumnSpec::Separator(p.parse_fragment(&inner)?));
                    i = end;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    Ok(specs)
}

/// Environment name → matrix variant and implicit delimiters.
pub(super) fn environment_variant(
    name: &str,
) -> Option<(MatrixVariant, Option<char>, Option<char>, bool)> {
    Some(match name {
        "matrix" => (MatrixVariant::Matrix, None, None, false),
        "pmatrix" => (MatrixVariant::Matrix, Some('('), Some(')'), false),
        "bmatrix" => (MatrixVariant::Matrix, Some('['), Some(']'), false),
        "Bmatrix" => (MatrixVariant::Matrix, Some('{'), Some('}'), false),
        "vmatrix" => (MatrixVariant::Matrix, Some('|'), Some('|'), false),
        "Vmatrix" => (MatrixVariant::Matrix, Some('‖'), Some('‖'), false),
        "smallmatrix" => (MatrixVariant::SmallMatrix, None, None, false),
        "array" => (MatrixVariant::Array, None, None, true),
        "cases" => (MatrixVariant::Cases, Some('{'), None, false),
        "aligned" | "align" | "align*" => (MatrixVariant::Aligned, None, None, false),
        "gathered" | "gather" | "gather*" => (MatrixVariant::Gathered, None, None, false),
        "multline" | "multline*" => (MatrixVariant::Multline, None, None, false),
        _ => return None,
    })
}

pub(super) fn build_matrix(
    variant: MatrixVariant,
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<SharedAtom>>,
    left: Option<crate::resources::symbols::SymbolSpec>,
    right: Option<crate::resources::symbols::SymbolSpec>,
) -> SharedAtom {
    let matrix = Rc::new(Atom::Matrix(MatrixAtom {
        rows,
        columns,
        variant,
    }));
    if left.is_none() && right.is_none() {
        matrix
    } else {
        Rc::new(Atom::Fenced(FencedAtom {
            left,
            right,
            content: matrix,
            middle: Vec::new(),
        }))
    }
}

/// Build the red monospace placeholder partial mode shows for a broken
/// command.
pub(super) fn error_placeholder(command: &str) -> SharedAtom {
    Rc::new(Atom::Color(ColorAtom {
        content: Rc::new(Atom::FontStyle(FontStyleAtom {
            kind: FontStyleKind::Typewriter,
            content: Rc::new(Atom::Text(TextAtom {
                text: format!("\\{command}"),
            })),
        })),
        foreground: Color::RED,
        background: Color::TRANSPARENT,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_the_families() {
        assert!(matches!(
            lookup("frac"),
            Some(Cmd::Fraction {
                bar: BarThickness::Default,
                ..
            })
        ));
        assert!(matches!(lookup("bigl"), Some(Cmd::DelimiterSize { size: 1, .. })));
        assert!(matches!(lookup("\\"), Some(Cmd::NewLine)));
        assert!(lookup("notacommand").is_none());
    }
}
