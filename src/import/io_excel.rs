use calamine::{open_workbook, DataType, Reader, Xlsx};

use election_tables::Cell;

use crate::import::{io_common::drop_empty_rows, *};

/// Reads a worksheet into a grid of cells. Without a worksheet name, the
/// first worksheet of the workbook is used.
pub fn read_excel_grid(path: &str, worksheet: Option<&str>) -> ImportResult<Vec<Vec<Cell>>> {
    let wrange = get_range(path, worksheet)?;
    debug!(
        "read_excel_grid: path: {:?} size: {:?}",
        path,
        wrange.get_size()
    );
    let grid: Vec<Vec<Cell>> = wrange
        .rows()
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    Ok(drop_empty_rows(grid))
}

fn read_cell(dt: &DataType) -> Cell {
    match dt {
        DataType::Empty => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Int(i) => Cell::Int(*i),
        DataType::Float(f) => Cell::Float(*f),
        other => Cell::Text(other.to_string()),
    }
}

fn get_range(path: &str, worksheet: Option<&str>) -> ImportResult<calamine::Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                worksheet: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}
