//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Create a table with headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).style_spec("b"))
        .collect();
    table.set_titles(Row::new(header_cells));

    table
}

/// Add a row to a table
pub fn add_table_row(table: &mut Table, cells: Vec<String>) {
    let row_cells: Vec<Cell> = cells.into_iter().map(|s| Cell::new(&s)).collect();
    table.add_row(Row::new(row_cells));
}

/// Right-aligned numeric cell text for a seconds value
pub fn seconds_cell(seconds: f32) -> String {
    format!("{seconds:>8.3}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows() {
        let mut table = create_table(&["#", "Event"]);
        add_table_row(&mut table, vec!["0".into(), "PuntPawn".into()]);
        add_table_row(&mut table, vec!["1".into(), "Mote".into()]);
        assert_eq!(table.len(), 2);

        let rendered = table.to_string();
        assert!(rendered.contains("PuntPawn"));
        assert!(rendered.contains("Event"));
    }

    #[test]
    fn test_seconds_cell() {
        assert_eq!(seconds_cell(0.5), "   0.500");
    }
}
