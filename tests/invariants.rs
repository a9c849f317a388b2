//! The universal properties: finite boxes, additive row widths, ligature
//! rewriting, macro equivalence, unit linearity, serde round-trips.

mod common;

use common::{chars_of, fixture_context};
use mathtex::boxes::{BoxKind, BoxNode};
use mathtex::environment::Environment;
use mathtex::parser::parse_formula;
use mathtex::resources::glue::GlueSpec;
use mathtex::resources::TexContext;
use mathtex::{Color, Length, TexStyle, Unit};

const SIZE: f64 = 20.0;

fn layout(ctx: &TexContext, src: &str, style: TexStyle) -> BoxNode {
    let formula = parse_formula(ctx, src, false).expect("parse");
    let env = Environment::new(ctx, style, 0, SIZE);
    formula.root.create_box(&env).expect("layout")
}

const CORPUS: &[&str] = &[
    r"x",
    r"x + y = 1",
    r"x^2 + y_3",
    r"x_1^2",
    r"\frac{1}{2}",
    r"\frac{x+1}{y-1} = 2",
    r"\sqrt{x}",
    r"\sqrt[3]{x+1}",
    r"\sum_{i=1}^{n} i",
    r"\left( x + y \right)",
    r"\begin{matrix} a & b \\ c & d \end{matrix}",
    r"\begin{pmatrix} 1 & 0 \\ 0 & 1 \end{pmatrix}",
    r"\hat{x} + \overline{y}",
    r"\overbrace{x+y}^{n}",
    r"\underbrace{a-b}_{n}",
    r"\textcolor{red}{x} + \phantom{y} - \cancel{n}",
    r"{\displaystyle \frac{a}{b}} + {\bf x}",
    r"a\,b\;c\!d \quad x",
    r"\binom{n}{2}",
    r"f''",
    r"x \cdots y",
    r"\mathrm{x} \mathbf{y}",
    r"\text{abc} + \sin x",
    r"\lim_{n} \frac{1}{n}",
    r"\stackrel{a}{=}",
    r"\xrightarrow{ab}",
    r"\underset{b}{a}",
    r"\rule{2px}{4px} \raisebox{1px}{x}",
    r"\scalebox{2}{x} \reflectbox{y} \rotatebox{45}{a}",
    r"\fbox{x} \ovalbox{y} \shadowbox{a}",
    r"\big( x \bigr)",
    r"\substack{a \\ b}",
    r"\begin{cases} a & b \\ c & d \end{cases}",
    r"\begin{smallmatrix} 1 & 2 \\ 3 & 4 \end{smallmatrix}",
    r"\begin{array}{l|r} a & b \end{array}",
    r"\longdiv{4}{1024}",
    r"\multicolumn{1}{c}{x}",
    r"x~y",
    r"x² = y",
    r"\smash{y} \vphantom{b}",
    r"\operatorname{tr} x",
];

#[test]
fn every_box_is_finite_with_positive_extents() {
    let ctx = fixture_context();
    for src in CORPUS {
        for style in [TexStyle::DISPLAY, TexStyle::TEXT, TexStyle::SCRIPT] {
            let node = layout(&ctx, src, style);
            assert!(node.height >= 0.0 && node.depth >= 0.0, "negative extents for {src}");
            check_finite(&node, src);
        }
    }
}

fn check_finite(node: &BoxNode, src: &str) {
    assert!(
        node.width.is_finite() && node.height.is_finite() && node.depth.is_finite(),
        "non-finite metrics for {src}"
    );
    for child in node.children() {
        check_finite(child, src);
    }
}

#[test]
fn row_width_is_the_sum_of_its_children() {
    let ctx = fixture_context();
    for src in CORPUS {
        let node = layout(&ctx, src, TexStyle::DISPLAY);
        if let BoxKind::HBox(hb) = &node.kind {
            let sum: f64 = hb.children.iter().map(|c| c.width).sum();
            assert!(
                (node.width - sum).abs() < 1e-9,
                "row width mismatch for {src}: {} vs {sum}",
                node.width
            );
        }
    }
}

#[test]
fn scripts_on_accented_base_use_the_nucleus_metrics() {
    let ctx = fixture_context();
    let accented = layout(&ctx, r"\hat{b}", TexStyle::DISPLAY);
    let scripted = layout(&ctx, r"\hat{b}^2", TexStyle::DISPLAY);
    // the superscript hangs off the `b` itself, so the accent stack still
    // sets the overall height
    assert!(
        (scripted.height - accented.height).abs() < 1e-9,
        "accent stack raised the script: {} vs {}",
        scripted.height,
        accented.height
    );
    assert!(chars_of(&scripted).contains(&'2'));
}

#[test]
fn ligature_pair_collapses_to_one_glyph() {
    let ctx = fixture_context();
    let node = layout(&ctx, "fi", TexStyle::TEXT);
    assert_eq!(chars_of(&node), vec!['ﬁ']);
}

#[test]
fn kern_pair_inserts_a_strut() {
    let ctx = fixture_context();
    let node = layout(&ctx, "ff", TexStyle::TEXT);
    assert_eq!(chars_of(&node), vec!['f', 'f']);
    // f+f kerns by 0.03 em on top of the two advances and the trailing
    // italic correction
    let expected = (0.49 + 0.49 + 0.03 + 0.1) * SIZE;
    assert!((node.width - expected).abs() < 1e-9, "{}", node.width);
}

#[test]
fn unit_conversion_is_linear() {
    let ctx = fixture_context();
    let env = Environment::new(&ctx, TexStyle::DISPLAY, 0, SIZE);
    for unit in [
        Unit::Em,
        Unit::Ex,
        Unit::Px,
        Unit::Pt,
        Unit::Bp,
        Unit::Pc,
        Unit::Mu,
        Unit::Cm,
        Unit::Mm,
        Unit::In,
        Unit::Sp,
        Unit::Dd,
        Unit::Cc,
        Unit::X8,
    ] {
        let one = Length::new(1.5, unit).to_px(&env);
        for k in [0.0, 2.0, -3.5, 10.0] {
            let scaled = Length::new(1.5 * k, unit).to_px(&env);
            assert!(
                (scaled - k * one).abs() < 1e-9,
                "unit {unit:?} not linear"
            );
        }
    }
}

#[test]
fn style_size_factors_shrink_scripts() {
    let ctx = fixture_context();
    let display = layout(&ctx, "x", TexStyle::DISPLAY);
    let script = layout(&ctx, "x", TexStyle::SCRIPT);
    assert!((display.width * 0.7 - script.width).abs() < 1e-9);
}

#[test]
fn user_macro_matches_its_expansion() {
    let ctx = fixture_context();
    let via_macro = layout(
        &ctx,
        r"\newcommand{\foo}[1]{[#1]} \foo{x}",
        TexStyle::DISPLAY,
    );
    let expanded = layout(&ctx, r"[x]", TexStyle::DISPLAY);
    assert_eq!(format!("{via_macro:?}"), format!("{expanded:?}"));
}

#[test]
fn optional_macro_argument_defaults() {
    let ctx = fixture_context();
    let defaulted = layout(
        &ctx,
        r"\newcommand{\pair}[2][1]{#1+#2} \pair{2}",
        TexStyle::DISPLAY,
    );
    let explicit = layout(&ctx, r"1+2", TexStyle::DISPLAY);
    assert_eq!(format!("{defaulted:?}"), format!("{explicit:?}"));

    let overridden = layout(
        &ctx,
        r"\newcommand{\pair}[2][1]{#1+#2} \pair[3]{2}",
        TexStyle::DISPLAY,
    );
    let explicit = layout(&ctx, r"3+2", TexStyle::DISPLAY);
    assert_eq!(format!("{overridden:?}"), format!("{explicit:?}"));
}

#[test]
fn user_environment_expands_around_its_body() {
    let ctx = fixture_context();
    let via_env = layout(
        &ctx,
        r"\newenvironment{wrap}{a+}{+b} \begin{wrap}x\end{wrap}",
        TexStyle::DISPLAY,
    );
    let expanded = layout(&ctx, r"{a+ x +b}", TexStyle::DISPLAY);
    assert_eq!(format!("{via_env:?}"), format!("{expanded:?}"));
}

#[test]
fn character_formula_mapping_rewrites() {
    let ctx = fixture_context();
    let mapped = layout(&ctx, r"x²", TexStyle::DISPLAY);
    let spelled = layout(&ctx, r"x^2", TexStyle::DISPLAY);
    assert_eq!(format!("{mapped:?}"), format!("{spelled:?}"));
}

#[test]
fn breaker_leaves_fitting_formulas_alone() {
    let ctx = fixture_context();
    let renderer = mathtex::TexRenderer {
        width: Length::new(10_000.0, Unit::Px),
        text_size: SIZE,
        ..mathtex::TexRenderer::default()
    };
    let render = renderer.render(&ctx, "1+2+3").expect("render");
    assert!(matches!(render.root().kind, BoxKind::HBox(_)));
}

#[test]
fn breaker_splits_wide_formulas_at_digit_marks() {
    let ctx = fixture_context();
    let source = "1+2+3+4+5+6+7+8+9+1+2+3+4+5+6+7+8+9";
    let unbroken = mathtex::TexRenderer {
        text_size: SIZE,
        ..mathtex::TexRenderer::default()
    }
    .render(&ctx, source)
    .expect("render");
    let budget = unbroken.width() / 3.0;

    let renderer = mathtex::TexRenderer {
        width: Length::new(budget, Unit::Px),
        text_size: SIZE,
        line_space: Length::new(4.0, Unit::Px),
        ..mathtex::TexRenderer::default()
    };
    let render = renderer.render(&ctx, source).expect("render");
    match &render.root().kind {
        BoxKind::Line(vb) => {
            for line in vb.children.iter().filter(|c| !c.is_blank()) {
                assert!(line.width <= budget + 1e-9);
            }
        }
        _ => panic!("expected a line stack"),
    }
    assert!(render.height() > unbroken.height());
}

#[test]
fn geometry_types_round_trip_through_serde() {
    let color: Color = serde_yaml::from_str(&serde_yaml::to_string(&Color::RED).unwrap()).unwrap();
    assert_eq!(color, Color::RED);

    let len = Length::new(1.5, Unit::Mu);
    let back: Length = serde_yaml::from_str(&serde_yaml::to_string(&len).unwrap()).unwrap();
    assert_eq!(back, len);

    let glue = GlueSpec {
        name: "med".to_string(),
        space: 4.0,
        stretch: 2.0,
        shrink: 4.0,
    };
    let back: GlueSpec = serde_yaml::from_str(&serde_yaml::to_string(&glue).unwrap()).unwrap();
    assert_eq!(back, glue);

    // the whole box tree is snapshotable
    let ctx = fixture_context();
    let node = layout(&ctx, r"x+y", TexStyle::DISPLAY);
    let dump = serde_yaml::to_string(&node).unwrap();
    assert!(dump.contains("HBox"));
}
