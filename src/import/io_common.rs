use std::path::Path;

use election_tables::Cell;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Excel,
    Csv,
}

/// Picks the reader from the file extension.
pub fn provider_for(path: &Path) -> Option<Provider> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" => Some(Provider::Excel),
        "csv" => Some(Provider::Csv),
        _ => None,
    }
}

/// Drops the rows made only of empty cells. Spreadsheets often carry a few
/// of them after the data.
pub fn drop_empty_rows(grid: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    grid.into_iter()
        .filter(|row| !row.iter().all(|c| c.is_empty()))
        .collect()
}
