//! Table formatting utilities

use prettytable::format::{Alignment, consts::FORMAT_NO_LINESEP_WITH_TITLE};
use prettytable::{Cell, Row, Table};

/// Create a table with bold headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(headers.iter().map(|h| Cell::new(h).style_spec("b")).collect());
    table
}

/// Add a row to a table; plain numbers are right aligned
pub fn add_table_row(table: &mut Table, cells: Vec<String>) {
    let row: Row = cells
        .iter()
        .map(|text| {
            if text.parse::<f64>().is_ok() {
                Cell::new_align(text, Alignment::RIGHT)
            } else {
                Cell::new(text)
            }
        })
        .collect();
    table.add_row(row);
}
