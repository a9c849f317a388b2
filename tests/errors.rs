//! Error behaviour: strict failures, partial-mode placeholders, resource
//! load rejection, and the global init/release lifecycle.

mod common;

use common::{fixture_config, fixture_context, RecordingBackend};
use mathtex::atom::Atom;
use mathtex::environment::Environment;
use mathtex::error::{LayoutError, ParseError, ResourceError};
use mathtex::parser::parse_formula;
use mathtex::resources::TexContext;
use mathtex::{Color, Length, TexStyle, Unit};

#[test]
fn unknown_command_fails_in_strict_mode() {
    let ctx = fixture_context();
    let err = parse_formula(&ctx, r"\notacommand x", false).unwrap_err();
    match err {
        ParseError::UnknownCommand { name, pos } => {
            assert_eq!(name, "notacommand");
            assert_eq!((pos.line, pos.col), (1, 1));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn partial_mode_inserts_a_red_placeholder() {
    let ctx = fixture_context();
    let formula = parse_formula(&ctx, r"\notacommand x", true).expect("partial parse");
    let Atom::Row(row) = &*formula.root else {
        panic!("root is a row");
    };
    let Atom::Color(color) = &*row.elements[0] else {
        panic!("placeholder is a colored atom");
    };
    assert_eq!(color.foreground, Color::RED);

    // the placeholder carries the offending command name in monospace
    let render = mathtex::TexRenderer {
        partial: true,
        ..mathtex::TexRenderer::default()
    }
    .render(&ctx, r"\notacommand x")
    .expect("render");
    let mut backend = RecordingBackend::default();
    render.draw(&mut backend, 0.0, 0.0);
    assert!(backend.texts.iter().any(|t| t == "\\notacommand"));
    assert!(backend.colors.contains(&Color::RED));
}

#[test]
fn unbalanced_group_is_reported_with_position() {
    let ctx = fixture_context();
    let err = parse_formula(&ctx, "x + {y", false).unwrap_err();
    assert!(matches!(err, ParseError::UnbalancedGroup { .. }));
}

#[test]
fn macro_redefinition_rules() {
    let ctx = fixture_context();
    let err = parse_formula(
        &ctx,
        r"\newcommand{\foo}{a}\newcommand{\foo}{b}",
        false,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::MacroAlreadyDefined { .. }));

    let err = parse_formula(&ctx, r"\renewcommand{\bar}{a}", false).unwrap_err();
    assert!(matches!(err, ParseError::MacroNotDefined { .. }));

    // renewing an existing macro is fine
    let ok = parse_formula(
        &ctx,
        r"\newcommand{\foo}{a}\renewcommand{\foo}{b}\foo",
        false,
    );
    assert!(ok.is_ok());
}

#[test]
fn invalid_arguments_are_typed() {
    let ctx = fixture_context();
    assert!(matches!(
        parse_formula(&ctx, r"\hspace{abc}", false).unwrap_err(),
        ParseError::InvalidLength { .. }
    ));
    assert!(matches!(
        parse_formula(&ctx, r"\textcolor{notacolor}{x}", false).unwrap_err(),
        ParseError::InvalidColor { .. }
    ));
    assert!(matches!(
        parse_formula(&ctx, r"\longdiv{0}{8}", false).unwrap_err(),
        ParseError::ZeroDivisor { .. }
    ));
    assert!(matches!(
        parse_formula(&ctx, r"x & y", false).unwrap_err(),
        ParseError::MisplacedColumnSep { .. }
    ));
    assert!(matches!(
        parse_formula(&ctx, r"\frac{}{2}", false).unwrap_err(),
        ParseError::EmptyFraction { .. }
    ));
    assert!(matches!(
        parse_formula(&ctx, r"\begin{notanenv} x \end{notanenv}", false).unwrap_err(),
        ParseError::UnknownEnvironment { .. }
    ));
    assert!(matches!(
        parse_formula(&ctx, r"\left= x \right)", false).unwrap_err(),
        ParseError::InvalidDelimiter { .. }
    ));
}

#[test]
fn unknown_font_mapping_surfaces_at_layout() {
    let ctx = fixture_context();
    let formula = parse_formula(&ctx, r"\mathbb{x}", false).expect("parse");
    let env = Environment::new(&ctx, TexStyle::DISPLAY, 0, 20.0);
    let err = formula.root.create_box(&env).unwrap_err();
    assert_eq!(err, LayoutError::TextStyleMappingNotFound("bb".to_string()));
}

#[test]
fn missing_glyph_surfaces_at_layout() {
    let ctx = fixture_context();
    let formula = parse_formula(&ctx, "Q", false).expect("parse");
    let env = Environment::new(&ctx, TexStyle::DISPLAY, 0, 20.0);
    assert_eq!(
        formula.root.create_box(&env).unwrap_err(),
        LayoutError::MissingGlyph { font: 0, code: 'Q' }
    );
}

#[test]
fn malformed_resources_fail_at_load() {
    let mut config = fixture_config();
    config.symbols_xml = "<TeXSymbols><Symbol».</TeXSymbols>".to_string();
    assert!(matches!(
        TexContext::load(&config),
        Err(ResourceError::Xml { .. })
    ));

    let mut config = fixture_config();
    config.glue_xml = r#"<GlueSettings><GlueTable>
        <Glue lefttype="ord" righttype="op" gluetype="nosuchtype"/>
    </GlueTable></GlueSettings>"#
        .to_string();
    assert!(matches!(
        TexContext::load(&config),
        Err(ResourceError::InvalidAttribute { .. })
    ));

    let mut config = fixture_config();
    config.symbols_xml =
        r#"<TeXSymbols><Symbol name="ghost" type="ord" font="9" code="42"/></TeXSymbols>"#
            .to_string();
    assert!(matches!(
        TexContext::load(&config),
        Err(ResourceError::DanglingFontRef { .. })
    ));

    let mut config = fixture_config();
    config.font_xml.push(common::FONTS_XML.to_string());
    assert!(matches!(
        TexContext::load(&config),
        Err(ResourceError::FontLoaded(0))
    ));
}

/// One test owns the whole global lifecycle so parallel test threads never
/// race the shared context.
#[test]
fn facade_lifecycle() {
    mathtex::release();
    let before = mathtex::render(
        "x",
        Length::zero(),
        20.0,
        Length::zero(),
        Color::BLACK,
    );
    assert!(before.is_err());

    mathtex::init(fixture_config()).expect("init");
    assert!(mathtex::is_initialized());
    let render = mathtex::render(
        "x+y",
        Length::new(500.0, Unit::Px),
        20.0,
        Length::new(1.0, Unit::Ex),
        Color::BLACK,
    )
    .expect("render");
    assert!(render.width() > 0.0);
    assert!(render.baseline() > 0.0);

    let mut backend = RecordingBackend::default();
    render.draw(&mut backend, 0.0, 0.0);
    let drawn: Vec<char> = backend.chars.iter().map(|&(c, _, _)| c).collect();
    assert!(drawn.contains(&'x') && drawn.contains(&'+') && drawn.contains(&'y'));
    // left to right on a shared baseline
    assert!(backend.chars.windows(2).all(|w| w[0].1 <= w[1].1));

    mathtex::release();
    assert!(!mathtex::is_initialized());
    let after = mathtex::render(
        "x",
        Length::zero(),
        20.0,
        Length::zero(),
        Color::BLACK,
    );
    assert!(after.is_err());
}
