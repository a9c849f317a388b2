//! Matrices, arrays and their alignment environments.

use log::trace;

use crate::boxes::{builders, Alignment, BoxNode};
use crate::dimensions::{Length, Unit};
use crate::environment::{Environment, TexStyle};
use crate::error::LayoutResult;

use super::{Atom, SharedAtom};

/// Which environment produced the grid; governs spacing and cell style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixVariant {
    Matrix,
    SmallMatrix,
    Array,
    Cases,
    Aligned,
    Gathered,
    Multline,
}

impl MatrixVariant {
    fn column_sep(self) -> Length {
        match self {
            MatrixVariant::SmallMatrix => Length::new(1.0 / 3.0, Unit::Em),
            MatrixVariant::Aligned => Length::new(0.0, Unit::Em),
            _ => Length::new(5.0 / 12.0, Unit::Em),
        }
    }

    fn row_sep(self) -> Length {
        match self {
            MatrixVariant::SmallMatrix => Length::new(0.15, Unit::Em),
            MatrixVariant::Multline | MatrixVariant::Gathered => Length::new(0.35, Unit::Em),
            _ => Length::new(0.25, Unit::Em),
        }
    }

    fn cell_style(self, style: TexStyle) -> TexStyle {
        match self {
            MatrixVariant::SmallMatrix => TexStyle::SCRIPT,
            _ => style,
        }
    }
}

/// One entry of the column specification (`l c r |` and `@{…}`).
#[derive(Debug, Clone)]
pub enum ColumnSpec {
    Left,
    Center,
    Right,
    VerticalBar,
    /// `@{…}`: user separator material instead of the default gap.
    Separator(SharedAtom),
}

impl ColumnSpec {
    fn alignment(&self) -> Option<Alignment> {
        match self {
            ColumnSpec::Left => Some(Alignment::Left),
            ColumnSpec::Center => Some(Alignment::Center),
            ColumnSpec::Right => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// A cell spanning several columns.
#[derive(Debug)]
pub struct MulticolumnAtom {
    pub span: usize,
    pub align: Alignment,
    pub content: SharedAtom,
}

impl MulticolumnAtom {
    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        self.content.create_box(env)
    }
}

#[derive(Debug)]
pub struct MatrixAtom {
    /// Cell atoms, row-major. A row whose single cell is `Hline` paints a
    /// full-width horizontal line instead.
    pub rows: Vec<Vec<SharedAtom>>,
    /// Alignment entries; empty means every column is centered.
    pub columns: Vec<ColumnSpec>,
    pub variant: MatrixVariant,
}

struct Cell {
    node: BoxNode,
    span: usize,
    align: Option<Alignment>,
}

impl MatrixAtom {
    fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match &**cell {
                        Atom::Multicolumn(mc) => mc.span,
                        _ => 1,
                    })
                    .sum()
            })
            .max()
            .unwrap_or(0)
    }

    fn alignment_of(&self, col: usize) -> Option<Alignment> {
        self.columns
            .iter()
            .filter(|c| !matches!(c, ColumnSpec::VerticalBar | ColumnSpec::Separator(_)))
            .nth(col)
            .and_then(ColumnSpec::alignment)
    }

    pub fn create_box(&self, env: &Environment) -> LayoutResult<BoxNode> {
        let env = env.style_env(self.variant.cell_style(env.style));
        let num_cols = self.column_count();
        if num_cols == 0 {
            return Ok(kern!(horz: 0.0));
        }

        let strut_height = Length::new(0.7, Unit::Em).to_px(&env);
        let strut_depth = Length::new(0.3, Unit::Em).to_px(&env);
        let row_sep = self.variant.row_sep().to_px(&env);
        let col_sep = self.variant.column_sep().to_px(&env);

        // lay out every cell, tracking per-column widths (multicolumn cells
        // are distributed afterwards)
        let mut grid: Vec<Option<Vec<Cell>>> = Vec::with_capacity(self.rows.len());
        let mut col_widths = vec![0.0f64; num_cols];
        for row in &self.rows {
            if row.len() == 1 && matches!(*row[0], Atom::Hline) {
                grid.push(None);
                continue;
            }
            let mut cells = Vec::with_capacity(num_cols);
            let mut col = 0usize;
            for atom in row {
                let (node, span, align) = match &**atom {
                    Atom::Multicolumn(mc) => {
                        (mc.create_box(&env)?, mc.span.max(1), Some(mc.align))
                    }
                    _ => (atom.create_box(&env)?, 1, None),
                };
                if span == 1 && node.width > col_widths[col] {
                    col_widths[col] = node.width;
                }
                col += span;
                cells.push(Cell { node, span, align });
            }
            // missing trailing cells read as empty
            while col < num_cols {
                cells.push(Cell {
                    node: kern!(horz: 0.0),
                    span: 1,
                    align: None,
                });
                col += 1;
            }
            grid.push(Some(cells));
        }

        // widen spanned columns when a multicolumn cell needs more room
        for cells in grid.iter().flatten() {
            let mut col = 0usize;
            for cell in cells {
                if cell.span > 1 {
                    let covered: f64 = col_widths[col..(col + cell.span).min(num_cols)]
                        .iter()
                        .sum::<f64>()
                        + col_sep * (cell.span.saturating_sub(1)) as f64;
                    if cell.node.width > covered {
                        let last = (col + cell.span - 1).min(num_cols - 1);
                        col_widths[last] += cell.node.width - covered;
                    }
                }
                col += cell.span;
            }
        }

        let total_width: f64 =
            col_widths.iter().sum::<f64>() + col_sep * (num_cols.saturating_sub(1)) as f64;
        trace!(
            "matrix {:?}: {} rows x {} cols, width {:.1}",
            self.variant,
            grid.len(),
            num_cols,
            total_width
        );

        let mut vb = builders::VBox::new();
        let row_count = grid.len();
        for (ri, row) in grid.into_iter().enumerate() {
            let Some(cells) = row else {
                vb.add(rule!(width: total_width, height: env.default_rule_thickness()));
                vb.add(kern!(vert: row_sep));
                continue;
            };
            let mut hb = builders::HBox::new();
            let mut col = 0usize;
            let mut spec_iter = self.columns.iter().peekable();
            for cell in cells {
                // any bars or separators declared before this column
                loop {
                    let is_alignment = match spec_iter.peek() {
                        Some(ColumnSpec::VerticalBar) | Some(ColumnSpec::Separator(_)) => false,
                        Some(_) => true,
                        None => break,
                    };
                    match spec_iter.next() {
                        Some(ColumnSpec::VerticalBar) => hb.add(rule!(
                            width: env.default_rule_thickness(),
                            height: strut_height,
                            depth: strut_depth
                        )),
                        Some(ColumnSpec::Separator(atom)) => hb.add(atom.create_box(&env)?),
                        _ => {}
                    }
                    if is_alignment {
                        break;
                    }
                }
                let width: f64 = col_widths[col..(col + cell.span).min(num_cols)]
                    .iter()
                    .sum::<f64>()
                    + col_sep * (cell.span.saturating_sub(1)) as f64;
                let align = cell
                    .align
                    .or_else(|| self.alignment_of(col))
                    .unwrap_or(Alignment::Center);
                let lead = match align {
                    Alignment::Left => 0.0,
                    Alignment::Right => width - cell.node.width,
                    _ => (width - cell.node.width) * 0.5,
                };
                let mut cell_box = builders::HBox::new();
                cell_box.add(kern!(horz: lead.max(0.0)));
                cell_box.add(cell.node);
                cell_box.set_width(width);
                hb.add(cell_box.build());
                col += cell.span;
                if col < num_cols {
                    hb.add(kern!(horz: col_sep));
                }
            }
            // trailing bars
            for spec in spec_iter {
                if matches!(spec, ColumnSpec::VerticalBar) {
                    hb.add(rule!(
                        width: env.default_rule_thickness(),
                        height: strut_height,
                        depth: strut_depth
                    ));
                }
            }
            let mut line = hb.build();
            line.height = line.height.max(strut_height);
            line.depth = line.depth.max(strut_depth);
            vb.add(line);
            if ri + 1 < row_count {
                vb.add(kern!(vert: row_sep));
            }
        }

        // the grid sits centered on the math axis
        let mut node = vb.build();
        let axis = env.axis_height();
        let half = node.total_height() * 0.5;
        node.height = half + axis;
        node.depth = half - axis;
        Ok(node)
    }
}
