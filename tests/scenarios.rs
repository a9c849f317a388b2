//! Structural expectations for the classic constructs: parse, lay out,
//! and inspect the atom and box trees.

mod common;

use common::{chars_of, count_kind, fixture_context};
use mathtex::atom::{Atom, SharedAtom};
use mathtex::boxes::{BoxKind, BoxNode};
use mathtex::environment::Environment;
use mathtex::parser::parse_formula;
use mathtex::resources::TexContext;
use mathtex::TexStyle;

const SIZE: f64 = 20.0;

fn layout(ctx: &TexContext, src: &str, style: TexStyle) -> BoxNode {
    let formula = parse_formula(ctx, src, false).expect("parse");
    let env = Environment::new(ctx, style, 0, SIZE);
    formula.root.create_box(&env).expect("layout")
}

fn root_elements(ctx: &TexContext, src: &str) -> Vec<SharedAtom> {
    let formula = parse_formula(ctx, src, false).expect("parse");
    match &*formula.root {
        Atom::Row(row) => row.elements.clone(),
        _ => panic!("formula root is always a row"),
    }
}

#[test]
fn fraction_structure() {
    let ctx = fixture_context();
    let elements = root_elements(&ctx, r"\frac{1}{2}");
    assert_eq!(elements.len(), 1);
    let Atom::Fraction(frac) = &*elements[0] else {
        panic!("expected a fraction root");
    };
    assert!(matches!(&*frac.numerator, Atom::Char(c) if c.code == '1'));
    assert!(matches!(&*frac.denominator, Atom::Char(c) if c.code == '2'));

    let node = layout(&ctx, r"\frac{1}{2}", TexStyle::DISPLAY);
    assert_eq!(count_kind(&node, &|k| matches!(k, BoxKind::Rule)), 1);
    let chars = chars_of(&node);
    assert!(chars.contains(&'1') && chars.contains(&'2'));
    // both parts centered in a box at least as wide as the wider part
    assert!(node.width >= 0.5 * SIZE);
}

#[test]
fn scripts_and_binary_spacing() {
    let ctx = fixture_context();
    let elements = root_elements(&ctx, r"x^2 + y_3");
    assert_eq!(elements.len(), 3);
    match (&*elements[0], &*elements[1], &*elements[2]) {
        (Atom::Scripts(x), Atom::Symbol(plus), Atom::Scripts(y)) => {
            assert!(matches!(&*x.base, Atom::Char(c) if c.code == 'x'));
            assert!(x.sup.is_some() && x.sub.is_none());
            assert_eq!(plus.spec.name, "plus");
            assert!(matches!(&*y.base, Atom::Char(c) if c.code == 'y'));
            assert!(y.sub.is_some() && y.sup.is_none());
        }
        _ => panic!("expected scripts, plus, scripts"),
    }

    // glue between the scripted atoms and the binary: medmuskip on both
    // sides, 4mu each
    let node = layout(&ctx, r"x^2 + y_3", TexStyle::DISPLAY);
    let BoxKind::HBox(hb) = &node.kind else {
        panic!("row layout yields an hbox");
    };
    let mu = SIZE / 18.0;
    let glues: Vec<&BoxNode> = hb
        .children
        .iter()
        .filter(|c| matches!(c.kind, BoxKind::Glue(_)))
        .collect();
    assert_eq!(glues.len(), 2);
    for glue in glues {
        assert!((glue.width - 4.0 * mu).abs() < 1e-9);
    }
}

#[test]
fn big_operator_limits_depend_on_style() {
    let ctx = fixture_context();
    let elements = root_elements(&ctx, r"\sum_{i=1}^{n} i");
    let Atom::BigOperator(op) = &*elements[0] else {
        panic!("expected a big operator root");
    };
    assert!(op.under.is_some() && op.over.is_some());

    let display = layout(&ctx, r"\sum_{i=1}^{n} i", TexStyle::DISPLAY);
    let text = layout(&ctx, r"\sum_{i=1}^{n} i", TexStyle::TEXT);
    // display stacks the limits above and below: much taller, narrower
    assert!(display.total_height() > text.total_height());
    // display style picks the next-larger sum glyph
    assert!(chars_of(&display).contains(&'∑'));
    let display_sum_in_big_font = {
        fn find(node: &BoxNode) -> bool {
            if let BoxKind::Char(cb) = &node.kind {
                if cb.cf.code == '∑' && cb.cf.font == 1 {
                    return true;
                }
            }
            node.children().iter().any(find)
        }
        find(&display)
    };
    assert!(display_sum_in_big_font);
}

#[test]
fn nth_root_structure() {
    let ctx = fixture_context();
    let elements = root_elements(&ctx, r"\sqrt[3]{x+1}");
    let Atom::Radical(rad) = &*elements[0] else {
        panic!("expected a radical root");
    };
    assert!(rad.index.is_some());
    match &*rad.radicand {
        Atom::Row(row) => assert_eq!(row.elements.len(), 3),
        other => panic!("radicand should be a row, got {other:?}"),
    }

    let node = layout(&ctx, r"\sqrt[3]{x+1}", TexStyle::DISPLAY);
    let chars = chars_of(&node);
    for expected in ['3', 'x', '+', '1', '√'] {
        assert!(chars.contains(&expected), "missing {expected}");
    }
    // the overbar above the radicand
    assert!(count_kind(&node, &|k| matches!(k, BoxKind::Rule)) >= 1);
}

#[test]
fn matrix_grid() {
    let ctx = fixture_context();
    let src = r"\begin{matrix} a & b \\ c & d \end{matrix}";
    let elements = root_elements(&ctx, src);
    let Atom::Matrix(matrix) = &*elements[0] else {
        panic!("expected a matrix root");
    };
    assert_eq!(matrix.rows.len(), 2);
    assert!(matrix.rows.iter().all(|r| r.len() == 2));

    let node = layout(&ctx, src, TexStyle::DISPLAY);
    let chars = chars_of(&node);
    for expected in ['a', 'b', 'c', 'd'] {
        assert!(chars.contains(&expected), "missing {expected}");
    }
    // two columns of uniform width plus the column separation
    let col0 = 0.51 * SIZE;
    let col1 = 0.52 * SIZE;
    let sep = 5.0 / 12.0 * SIZE;
    assert!(node.width >= col0 + col1 + sep - 1e-9);
    assert!(node.total_height() > 0.0);
}

#[test]
fn short_matrix_rows_are_padded() {
    let ctx = fixture_context();
    let src = r"\begin{matrix} a & b \\ c \end{matrix}";
    let node = layout(&ctx, src, TexStyle::DISPLAY);
    let chars = chars_of(&node);
    assert!(chars.contains(&'a') && chars.contains(&'c'));
}

#[test]
fn fenced_delimiters_grow_with_content() {
    let ctx = fixture_context();
    let src = r"\left( \frac{a}{b} \right)";
    let elements = root_elements(&ctx, src);
    let Atom::Fenced(fenced) = &*elements[0] else {
        panic!("expected a fenced root");
    };
    assert!(fenced.left.is_some() && fenced.right.is_some());

    // a display fraction outgrows the text-size paren; the next-larger
    // variant takes over
    let node = layout(&ctx, src, TexStyle::DISPLAY);
    fn big_paren(node: &BoxNode) -> bool {
        if let BoxKind::Char(cb) = &node.kind {
            if cb.cf.code == '(' && cb.cf.font == 1 {
                return true;
            }
        }
        node.children().iter().any(big_paren)
    }
    assert!(big_paren(&node));

    // a nested fraction outgrows every whole glyph: the extensible
    // assembly kicks in
    let tall = layout(&ctx, r"\left( \frac{\frac{a}{b}}{c} \right)", TexStyle::DISPLAY);
    let chars = chars_of(&tall);
    assert!(chars.contains(&'⎛') && chars.contains(&'⎝'));
    assert!(tall.total_height() > 2.0 * SIZE);
}

#[test]
fn inline_fence_keeps_the_small_glyph() {
    let ctx = fixture_context();
    let node = layout(&ctx, r"\left( x \right)", TexStyle::TEXT);
    let chars = chars_of(&node);
    // a lone x is shorter than the base paren; no growth
    assert!(chars.contains(&'('));
    assert!(!chars.contains(&'⎛'));
}

#[test]
fn primes_accumulate() {
    let ctx = fixture_context();
    let elements = root_elements(&ctx, r"f''");
    let Atom::CumulativeScripts(cs) = &*elements[0] else {
        panic!("expected cumulative scripts");
    };
    assert_eq!(cs.sups.len(), 2);
    let node = layout(&ctx, r"f''", TexStyle::TEXT);
    let primes = chars_of(&node)
        .into_iter()
        .filter(|&c| c == '′')
        .count();
    assert_eq!(primes, 2);
}

#[test]
fn overbrace_takes_the_upper_script() {
    let ctx = fixture_context();
    let elements = root_elements(&ctx, r"\overbrace{x+y}^{n}");
    let Atom::OverUnderDelimiter(od) = &*elements[0] else {
        panic!("expected an over-delimiter root");
    };
    assert!(od.over);
    assert!(od.script.is_some());
}
