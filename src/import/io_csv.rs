// Primitives for reading CSV files.

use election_tables::Cell;

use crate::import::{io_common::drop_empty_rows, *};

/// Reads a csv file into a grid of text cells. Rows may have different
/// lengths; the decoder rejects ragged extracts.
pub fn read_csv_grid(path: &str, delimiter: u8) -> ImportResult<Vec<Vec<Cell>>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut grid: Vec<Vec<Cell>> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_grid: lineno: {:?} row: {:?}", lineno, line);
        grid.push(line.iter().map(read_cell).collect());
    }
    Ok(drop_empty_rows(grid))
}

fn read_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}
