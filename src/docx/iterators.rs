//! Iterate over the extracted nested structure without deep indentation.
//!
//! Extraction produces a fixed four-deep nesting:
//!
//! ```text
//! [  # tables
//!     [  # table
//!         [  # row
//!             [  # cell
//!                 item  # paragraph
//!             ]
//!         ]
//!     ]
//! ]
//! ```
//!
//! These helpers enumerate any such structure at a chosen depth, yielding
//! each element with its positional index tuple. Asking to iterate past the
//! structure's leaves is a type mismatch reported as
//! [`Error::IterationDepth`], not a panic.

use crate::common::error::{Error, Result};
use crate::docx::collector::{Par, join_par_runs};

/// A generic four-deep nesting with leaf type `T`.
pub type Nested4<T> = Vec<Vec<Vec<Vec<T>>>>;

/// A view into one level of a four-deep nesting.
#[derive(Debug, PartialEq, Eq)]
pub enum DepthView<'a, T> {
    /// Depth 1: one table
    Table(&'a Vec<Vec<Vec<T>>>),
    /// Depth 2: one row
    Row(&'a Vec<Vec<T>>),
    /// Depth 3: one cell
    Cell(&'a Vec<T>),
    /// Depth 4: one leaf item
    Item(&'a T),
}

/// Enumerate a nested structure at `depth` (1–4).
///
/// Yields `(index tuple, view)` pairs in document order:
/// depth 1 yields `((i,), table)`, depth 2 `((i, j), row)`, and so on.
pub fn enum_at_depth<T>(
    tables: &Nested4<T>,
    depth: usize,
) -> Result<Vec<(Vec<usize>, DepthView<'_, T>)>> {
    if !(1..=4).contains(&depth) {
        return Err(Error::IterationDepth(depth));
    }

    let mut out = Vec::new();
    for (i, table) in tables.iter().enumerate() {
        if depth == 1 {
            out.push((vec![i], DepthView::Table(table)));
            continue;
        }
        for (j, row) in table.iter().enumerate() {
            if depth == 2 {
                out.push((vec![i, j], DepthView::Row(row)));
                continue;
            }
            for (k, cell) in row.iter().enumerate() {
                if depth == 3 {
                    out.push((vec![i, j, k], DepthView::Cell(cell)));
                    continue;
                }
                for (m, item) in cell.iter().enumerate() {
                    out.push((vec![i, j, k, m], DepthView::Item(item)));
                }
            }
        }
    }
    Ok(out)
}

/// Iterate over `tables[i]`.
pub fn iter_tables<T>(tables: &Nested4<T>) -> impl Iterator<Item = &Vec<Vec<Vec<T>>>> {
    tables.iter()
}

/// Iterate over `tables[:][j]`.
pub fn iter_rows<T>(tables: &Nested4<T>) -> impl Iterator<Item = &Vec<Vec<T>>> {
    tables.iter().flat_map(|table| table.iter())
}

/// Iterate over `tables[:][:][k]`.
pub fn iter_cells<T>(tables: &Nested4<T>) -> impl Iterator<Item = &Vec<T>> {
    iter_rows(tables).flat_map(|row| row.iter())
}

/// Iterate over `tables[:][:][:][m]`.
pub fn iter_paragraphs<T>(tables: &Nested4<T>) -> impl Iterator<Item = &T> {
    iter_cells(tables).flat_map(|cell| cell.iter())
}

/// Did this output table come from a real `w:tbl`?
///
/// Top-level flow content is wrapped in synthetic tables; the lineage of the
/// collected paragraphs tells the two apart.
pub fn is_tbl(table: &[Vec<Vec<Par>>]) -> bool {
    table
        .iter()
        .flat_map(|row| row.iter())
        .flat_map(|cell| cell.iter())
        .next()
        .is_some_and(|par| par.lineage.table.as_deref() == Some("tbl"))
}

/// Did this output row come from a real `w:tr`?
pub fn is_tr(row: &[Vec<Par>]) -> bool {
    row.iter()
        .flat_map(|cell| cell.iter())
        .next()
        .is_some_and(|par| par.lineage.row.as_deref() == Some("tr"))
}

/// Did this output cell come from a real `w:tc`?
pub fn is_tc(cell: &[Par]) -> bool {
    cell.first()
        .is_some_and(|par| par.lineage.cell.as_deref() == Some("tc"))
}

/// A visual map of extracted content as browsable HTML.
///
/// Each table renders as a bordered grid; each paragraph is prefixed with its
/// index tuple, so `[[[["text"]]]]` shows as `(0, 0, 0, 0) text`.
pub fn get_html_map(tables: &Nested4<String>) -> String {
    let mut html = String::from("<html><body>");
    for table in tables {
        html.push_str("<table border=\"1\">");
        for row in table {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                for paragraph in cell {
                    html.push_str(&format!("<pre>{paragraph}</pre>"));
                }
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
    }
    html.push_str("</body></html>");
    html
}

/// Prefix every paragraph with its index tuple, for [`get_html_map`].
pub fn index_paragraphs(tables: &Nested4<String>) -> Nested4<String> {
    tables
        .iter()
        .enumerate()
        .map(|(i, table)| {
            table
                .iter()
                .enumerate()
                .map(|(j, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(k, cell)| {
                            cell.iter()
                                .enumerate()
                                .map(|(m, par)| format!("({i}, {j}, {k}, {m}) {par}"))
                                .collect()
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Join a runs view into a paragraphs view (each paragraph one string).
pub fn join_runs(runs: &Nested4<Vec<String>>) -> Nested4<String> {
    runs.iter()
        .map(|table| {
            table
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| cell.iter().map(|par| join_par_runs(par)).collect())
                        .collect()
                })
                .collect()
        })
        .collect()
}
