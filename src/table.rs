//! Fixed-width table rendering.
//!
//! Pure string building — no I/O. The caller prints the result.
//!
//! Layout:
//! ```text
//! | Name  |   Qty |
//! -----------------
//! | apple |     3 |
//! -----------------
//! ```
//! The divider follows the header and closes the table, never between rows.

use std::fmt;

use crate::types::{Alignment, ColumnSpec, DEFAULT_DIVIDER};

/// Width and alignment of a column, without its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellFormat {
    width: i32,
    center_pad: bool,
}

impl CellFormat {
    fn with_text(self, text: impl Into<String>) -> ColumnSpec {
        ColumnSpec::new(text, self.width, self.center_pad)
    }
}

impl From<&ColumnSpec> for CellFormat {
    fn from(spec: &ColumnSpec) -> Self {
        Self {
            width: spec.width,
            center_pad: spec.center_pad,
        }
    }
}

/// A table with a fixed header and any number of body rows.
///
/// The header fixes the column count and each column's width and
/// alignment for the table's lifetime.
#[derive(Debug, Clone)]
pub struct Table {
    formats: Vec<CellFormat>,
    header: String,
    divider: String,
    rows: Vec<String>,
}

impl Table {
    /// Build a table from its header columns, using `-` for dividers.
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnSpec>,
    {
        Self::with_divider(columns, DEFAULT_DIVIDER)
    }

    /// Build a table whose divider line repeats `divider`.
    pub fn with_divider<I, C>(columns: I, divider: char) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnSpec>,
    {
        let columns: Vec<ColumnSpec> = columns.into_iter().map(Into::into).collect();
        let header = render_row(&columns);
        let divider = divider.to_string().repeat(header.chars().count());

        Self {
            formats: columns.iter().map(CellFormat::from).collect(),
            header,
            divider,
            rows: Vec::new(),
        }
    }

    /// Append a row of bare values, formatted with the header's columns.
    ///
    /// Missing trailing values render as empty cells; extras are dropped.
    pub fn append_row<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = values.into_iter();
        let cells: Vec<ColumnSpec> = self
            .formats
            .iter()
            .map(|format| {
                let text = values.next();
                format.with_text(text.as_ref().map_or("", |s| s.as_ref()))
            })
            .collect();

        self.rows.push(render_row(&cells));
        self
    }

    /// Append a row whose cells carry their own width and alignment.
    ///
    /// The header's formats are left untouched. Cells beyond the column
    /// count are dropped; missing ones render empty with the header format.
    pub fn append_columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnSpec>,
    {
        let mut columns = columns.into_iter().map(Into::into);
        let cells: Vec<ColumnSpec> = self
            .formats
            .iter()
            .map(|format| columns.next().unwrap_or_else(|| format.with_text("")))
            .collect();

        self.rows.push(render_row(&cells));
        self
    }

    pub fn column_count(&self) -> usize {
        self.formats.len()
    }

    /// The rendered header line.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The divider line, as long as the header line.
    pub fn divider(&self) -> &str {
        &self.divider
    }

    /// Rendered body rows in insertion order.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        writeln!(f, "{}", self.divider)?;
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        writeln!(f, "{}", self.divider)
    }
}

// ============================================================================
// CELL LAYOUT
// ============================================================================

/// Pad `text` to `|width|` characters.
///
/// Centered text puts the odd extra space on the right. Text longer than
/// the field is kept whole.
pub fn pad_cell(cell: &ColumnSpec) -> String {
    let text = cell.text.as_str();
    let width = cell.field_width();

    match cell.alignment() {
        Alignment::Center => format!("{text:^width$}"),
        Alignment::Left => format!("{text:<width$}"),
        Alignment::Right => format!("{text:>width$}"),
    }
}

/// Render one line: each padded cell wrapped in spaces, bars between.
pub fn render_row(cells: &[ColumnSpec]) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(&pad_cell(cell));
        line.push_str(" |");
    }
    line
}

// ============================================================================
// TESTS
// ============================================================================
