mod config;
pub mod normalize;
mod query;
pub mod resolver;

use log::{debug, info, warn};

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

pub use crate::config::*;
pub use crate::query::*;
use crate::normalize::{capitalize, clean_name, normalize_department_code};

// ********* Input data structures ***********

/// One cell of an extract, as read from the spreadsheet.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The textual content of the cell. Integral floats are printed without
    /// a fractional part, since spreadsheets store codes such as `1` as `1.0`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => match integral(*f) {
                Some(i) => i.to_string(),
                None => f.to_string(),
            },
        }
    }

    /// Reads the cell as a whole count. Group separators (spaces, including
    /// non-breaking ones) are accepted in text cells.
    /// Negative values are returned as-is; rejecting them is the caller's policy.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            Cell::Empty => None,
            Cell::Int(i) => Some(*i),
            Cell::Float(f) => integral(*f),
            Cell::Text(s) => {
                let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                compact.parse::<i64>().ok()
            }
        }
    }
}

// Floats outside the i64 range would saturate when cast.
fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// A raw extract: an optional header row and one data row per department.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Extract {
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<Cell>>,
}

impl Extract {
    pub fn new(header: Option<Vec<String>>, rows: Vec<Vec<Cell>>) -> Extract {
        Extract { header, rows }
    }

    /// Splits a grid into header and data rows.
    pub fn from_grid(mut grid: Vec<Vec<Cell>>, has_header_row: bool) -> Extract {
        let header = if has_header_row && !grid.is_empty() {
            let first = grid.remove(0);
            Some(first.iter().map(|c| c.as_text()).collect())
        } else {
            None
        };
        Extract { header, rows: grid }
    }

    /// Drops data rows by their 0-based index. Unknown indexes are ignored.
    pub fn drop_rows(&mut self, indexes: &[usize]) {
        if indexes.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.rows);
        self.rows = rows
            .into_iter()
            .enumerate()
            .filter_map(|(idx, row)| {
                if indexes.contains(&idx) {
                    debug!("drop_rows: dropping row {}: {:?}", idx, row);
                    None
                } else {
                    Some(row)
                }
            })
            .collect();
    }

    /// The common width of all rows, or of the header when there is no data.
    fn width(&self) -> Result<usize, DecodeError> {
        let width = match (self.rows.first(), &self.header) {
            (Some(first), _) => first.len(),
            (None, Some(header)) => header.len(),
            (None, None) => return Err(DecodeError::layout("empty extract".to_string())),
        };
        for (idx, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(DecodeError::layout(format!(
                    "row {} has {} columns, expected {}",
                    idx,
                    row.len(),
                    width
                )));
            }
        }
        Ok(width)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    /// Accepts "M"/"F" in any case, as well as the spelled-out French forms.
    pub fn parse(raw: &str) -> Option<Sex> {
        match raw.trim().to_uppercase().as_str() {
            "M" | "MASCULIN" | "H" | "HOMME" => Some(Sex::M),
            "F" | "FEMININ" | "FÉMININ" | "FEMME" => Some(Sex::F),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DepartmentRow {
    pub code: String,
    pub name: String,
}

/// Aggregate counters of one department.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StatsRow {
    /// Index of the data row in the extract.
    pub row: usize,
    pub department_code: String,
    pub registered: i64,
    pub abstentions: i64,
    pub voters: i64,
    pub blank_or_invalid: i64,
}

/// One department x candidate line of the long-form results table.
#[derive(PartialEq, Debug, Clone)]
pub struct CandidateResult {
    pub row: usize,
    pub block: usize,
    pub department_code: String,
    pub department_name: String,
    pub sex: String,
    pub surname: String,
    pub given_name: String,
    /// Left unparsed; the loader rejects anything that is not a non-negative integer.
    pub votes: Cell,
}

#[derive(PartialEq, Debug, Clone)]
pub struct DecodedExtract {
    pub num_candidate_blocks: usize,
    pub departments: Vec<DepartmentRow>,
    pub stats: Vec<StatsRow>,
    pub results: Vec<CandidateResult>,
}

/// Errors that prevent an extract from being decoded. No partial output is
/// produced when one of them is returned.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DecodeError {
    /// The extract or the layout does not have the expected columns.
    LayoutMismatch { reason: String },
    InvalidCount {
        row: usize,
        column: String,
        content: String,
    },
    InvalidDepartmentCode { row: usize, content: String },
    EmptyDepartmentName { row: usize },
}

impl DecodeError {
    pub(crate) fn layout(reason: String) -> DecodeError {
        DecodeError::LayoutMismatch { reason }
    }
}

impl Error for DecodeError {}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::LayoutMismatch { reason } => write!(f, "layout mismatch: {}", reason),
            DecodeError::InvalidCount {
                row,
                column,
                content,
            } => write!(f, "row {}: invalid count {:?} in column {}", row, content, column),
            DecodeError::InvalidDepartmentCode { row, content } => {
                write!(f, "row {}: invalid department code {:?}", row, content)
            }
            DecodeError::EmptyDepartmentName { row } => {
                write!(f, "row {}: empty department name", row)
            }
        }
    }
}

// ******** Decoding *********

/// Decodes a wide extract into the department, stats and long-form results tables.
///
/// Arguments:
/// * `extract` the raw cells, one row per department
/// * `layout` the positional description of the extract
pub fn decode(extract: &Extract, layout: &Layout) -> Result<DecodedExtract, DecodeError> {
    let general = layout.validate()?;
    let total_columns = extract.width()?;
    let num_candidate_blocks = layout.check_extract(total_columns)?;
    info!(
        "decode: {} rows, {} columns, {} candidate blocks",
        extract.rows.len(),
        total_columns,
        num_candidate_blocks
    );

    let (code_idx, name_idx) = identity_columns(extract, layout, total_columns)?;

    // Rows not yet fully tallied are discarded.
    let kept: Vec<(usize, &Vec<Cell>)> = extract
        .rows
        .iter()
        .enumerate()
        .filter(|(idx, row)| {
            let keep = match general.filter {
                Some(filter_idx) => {
                    let status = capitalize(&row[filter_idx].as_text());
                    let status = if status.is_empty() {
                        layout.filter_value.clone()
                    } else {
                        status
                    };
                    status == layout.filter_value
                }
                None => true,
            };
            if !keep {
                debug!("decode: filtering out row {}", idx);
            }
            keep
        })
        .collect();
    if kept.len() < extract.rows.len() {
        info!(
            "decode: kept {} of {} rows ({} == {})",
            kept.len(),
            extract.rows.len(),
            layout.filter_column,
            layout.filter_value
        );
    }

    let mut departments: Vec<DepartmentRow> = Vec::new();
    let mut department_names: HashMap<String, String> = HashMap::new();
    let mut stats: Vec<StatsRow> = Vec::new();
    for (idx, row) in kept.iter() {
        let code = read_department_code(*idx, &row[general.code])?;
        let name = read_department_name(*idx, &row[general.name])?;
        match department_names.get(&code) {
            Some(existing) if *existing != name => {
                warn!(
                    "decode: row {}: department {} already named {:?}, ignoring {:?}",
                    idx, code, existing, name
                );
            }
            Some(_) => {}
            None => {
                department_names.insert(code.clone(), name.clone());
                departments.push(DepartmentRow {
                    code: code.clone(),
                    name,
                });
            }
        }

        let blank_or_invalid = match general.blank_or_invalid {
            BallotCountColumns::Merged(col) => read_count(*idx, layout, row, col)?,
            BallotCountColumns::Separate { blank, invalid } => {
                read_count_or_zero(*idx, layout, row, blank)?
                    + read_count_or_zero(*idx, layout, row, invalid)?
            }
        };
        stats.push(StatsRow {
            row: *idx,
            department_code: code,
            registered: read_count(*idx, layout, row, general.registered)?,
            abstentions: read_count(*idx, layout, row, general.abstentions)?,
            voters: read_count(*idx, layout, row, general.voters)?,
            blank_or_invalid,
        });
    }

    // Wide to long: every candidate block becomes its own set of rows, stacked
    // block after block.
    let mut results: Vec<CandidateResult> = Vec::new();
    for block in 0..num_candidate_blocks {
        let start = layout.general_column_count + block * layout.candidate_block_width;
        for (idx, row) in kept.iter() {
            let cells = &row[start..start + layout.candidate_block_width];
            if cells[0].is_empty() && cells[1].is_empty() && cells[2].is_empty() {
                debug!("decode: row {} block {}: empty candidate block", idx, block);
                continue;
            }
            results.push(CandidateResult {
                row: *idx,
                block,
                department_code: read_department_code(*idx, &row[code_idx])?,
                department_name: read_department_name(*idx, &row[name_idx])?,
                sex: cells[0].as_text(),
                surname: cells[1].as_text(),
                given_name: cells[2].as_text(),
                votes: cells[3].clone(),
            });
        }
    }

    debug!(
        "decode: {} departments, {} stats rows, {} results",
        departments.len(),
        stats.len(),
        results.len()
    );
    Ok(DecodedExtract {
        num_candidate_blocks,
        departments,
        stats,
        results,
    })
}

/// The (code, name) columns that key the candidate blocks.
fn identity_columns(
    extract: &Extract,
    layout: &Layout,
    total_columns: usize,
) -> Result<(usize, usize), DecodeError> {
    match (&layout.department_identity_columns, &extract.header) {
        (Some((code_name, dept_name)), Some(header)) => {
            let find = |name: &String| -> Result<usize, DecodeError> {
                match header.iter().position(|h| h == name) {
                    Some(idx) if idx < total_columns => Ok(idx),
                    Some(idx) => Err(DecodeError::layout(format!(
                        "column {:?} is at position {}, rows have {} columns",
                        name, idx, total_columns
                    ))),
                    None => Err(DecodeError::layout(format!(
                        "column {:?} not found in the header",
                        name
                    ))),
                }
            };
            Ok((find(code_name)?, find(dept_name)?))
        }
        (Some(_), None) => {
            debug!("identity_columns: no header row, using the configured column index");
            let idx = layout.department_code_column_index;
            Ok((idx, idx + 1))
        }
        (None, _) => {
            let idx = layout.department_code_column_index;
            Ok((idx, idx + 1))
        }
    }
}

fn read_department_code(row: usize, cell: &Cell) -> Result<String, DecodeError> {
    let raw = cell.as_text();
    normalize_department_code(&raw).ok_or(DecodeError::InvalidDepartmentCode { row, content: raw })
}

fn read_department_name(row: usize, cell: &Cell) -> Result<String, DecodeError> {
    let name = clean_name(&cell.as_text());
    if name.is_empty() {
        return Err(DecodeError::EmptyDepartmentName { row });
    }
    Ok(name)
}

fn read_count(row: usize, layout: &Layout, cells: &[Cell], col: usize) -> Result<i64, DecodeError> {
    cells[col]
        .as_count()
        .ok_or_else(|| DecodeError::InvalidCount {
            row,
            column: layout.general_column_names[col].clone(),
            content: format!("{:?}", cells[col]),
        })
}

// Separate blank and invalid columns are summed with missing values as zero.
fn read_count_or_zero(
    row: usize,
    layout: &Layout,
    cells: &[Cell],
    col: usize,
) -> Result<i64, DecodeError> {
    if cells[col].is_empty() {
        Ok(0)
    } else {
        read_count(row, layout, cells, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    // A 2012-style general block (13 columns).
    fn general_2012(code: Cell, name: &str, registered: i64, voters: i64, blank: i64) -> Vec<Cell> {
        vec![
            code,
            t(name),
            Cell::Int(registered),
            Cell::Int(registered - voters),
            Cell::Float(20.5),
            Cell::Int(voters),
            Cell::Float(79.5),
            Cell::Int(blank),
            Cell::Float(1.0),
            Cell::Float(1.2),
            Cell::Int(voters - blank),
            Cell::Float(70.0),
            Cell::Float(90.0),
        ]
    }

    fn block(sex: &str, surname: &str, given_name: &str, votes: Cell) -> Vec<Cell> {
        vec![
            t(sex),
            t(surname),
            t(given_name),
            votes,
            Cell::Float(12.5),
            Cell::Float(25.0),
        ]
    }

    fn row(general: Vec<Cell>, blocks: Vec<Vec<Cell>>) -> Vec<Cell> {
        let mut res = general;
        for b in blocks {
            res.extend(b);
        }
        res
    }

    fn two_row_extract() -> Extract {
        Extract::new(
            None,
            vec![
                row(
                    general_2012(t("1"), "Ain", 1000, 800, 20),
                    vec![block("M", "DUPONT", "Jean", Cell::Int(300))],
                ),
                row(
                    general_2012(t("2a"), "Corse-du-Sud", 500, 400, 10),
                    vec![block("M", "DUPONT", "Jean", Cell::Float(150.0))],
                ),
            ],
        )
    }

    #[test]
    fn decode_single_block() {
        init();
        let layout = Layout::builtin("presidential-2012").unwrap();
        let decoded = decode(&two_row_extract(), &layout).unwrap();
        assert_eq!(decoded.num_candidate_blocks, 1);
        assert_eq!(
            decoded.departments,
            vec![
                DepartmentRow {
                    code: "01".to_string(),
                    name: "Ain".to_string()
                },
                DepartmentRow {
                    code: "2A".to_string(),
                    name: "Corse-du-Sud".to_string()
                },
            ]
        );
        assert_eq!(
            decoded.stats[0],
            StatsRow {
                row: 0,
                department_code: "01".to_string(),
                registered: 1000,
                abstentions: 200,
                voters: 800,
                blank_or_invalid: 20,
            }
        );
        assert_eq!(decoded.results.len(), 2);
        assert_eq!(decoded.results[1].department_code, "2A");
        assert_eq!(decoded.results[1].surname, "DUPONT");
        assert_eq!(decoded.results[1].votes, Cell::Float(150.0));
    }

    #[test]
    fn blocks_are_stacked_block_major() {
        init();
        let layout = Layout::builtin("presidential-2012").unwrap();
        let extract = Extract::new(
            None,
            vec![
                row(
                    general_2012(t("01"), "Ain", 1000, 800, 20),
                    vec![
                        block("M", "DUPONT", "Jean", Cell::Int(300)),
                        block("F", "MARTIN", "Anne", Cell::Int(480)),
                    ],
                ),
                row(
                    general_2012(t("02"), "Aisne", 900, 700, 10),
                    vec![
                        block("M", "DUPONT", "Jean", Cell::Int(200)),
                        block("F", "MARTIN", "Anne", Cell::Int(490)),
                    ],
                ),
            ],
        );
        let decoded = decode(&extract, &layout).unwrap();
        assert_eq!(decoded.num_candidate_blocks, 2);
        let order: Vec<(String, String, usize)> = decoded
            .results
            .iter()
            .map(|r| (r.department_code.clone(), r.surname.clone(), r.block))
            .collect();
        assert_eq!(
            order,
            vec![
                ("01".to_string(), "DUPONT".to_string(), 0),
                ("02".to_string(), "DUPONT".to_string(), 0),
                ("01".to_string(), "MARTIN".to_string(), 1),
                ("02".to_string(), "MARTIN".to_string(), 1),
            ]
        );
    }

    #[test]
    fn trailing_columns_are_a_layout_mismatch() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        let mut extract = two_row_extract();
        for r in extract.rows.iter_mut() {
            r.push(Cell::Empty);
        }
        assert!(matches!(
            decode(&extract, &layout),
            Err(DecodeError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn ragged_rows_are_a_layout_mismatch() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        let mut extract = two_row_extract();
        extract.rows[1].truncate(15);
        assert!(matches!(
            decode(&extract, &layout),
            Err(DecodeError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn empty_extract_is_a_layout_mismatch() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        assert!(decode(&Extract::default(), &layout).is_err());
    }

    #[test]
    fn separate_blank_and_invalid_are_summed() {
        let layout = Layout::builtin("presidential-2017").unwrap();
        let general = vec![
            t("75"),
            t("Paris"),
            Cell::Int(1000),
            Cell::Int(250),
            Cell::Float(25.0),
            Cell::Int(750),
            Cell::Float(75.0),
            Cell::Int(12),
            Cell::Float(1.2),
            Cell::Float(1.6),
            Cell::Int(5),
            Cell::Float(0.5),
            Cell::Float(0.7),
            Cell::Int(733),
            Cell::Float(73.3),
            Cell::Float(97.7),
        ];
        let mut missing_invalid = general.clone();
        missing_invalid[0] = t("76");
        missing_invalid[1] = t("Seine-Maritime");
        missing_invalid[10] = Cell::Empty;
        let extract = Extract::new(
            None,
            vec![
                row(general, vec![block("F", "MARTIN", "Anne", Cell::Int(733))]),
                row(
                    missing_invalid,
                    vec![block("F", "MARTIN", "Anne", Cell::Int(733))],
                ),
            ],
        );
        let decoded = decode(&extract, &layout).unwrap();
        assert_eq!(decoded.stats[0].blank_or_invalid, 17);
        assert_eq!(decoded.stats[1].blank_or_invalid, 12);
    }

    #[test]
    fn rows_not_complete_are_filtered() {
        let layout = Layout::builtin("presidential-2022").unwrap();
        let make = |code: &str, status: Cell| {
            let mut general = vec![t(code), t("Dept"), status];
            general.extend(vec![
                Cell::Int(100),
                Cell::Int(20),
                Cell::Float(20.0),
                Cell::Int(80),
                Cell::Float(80.0),
                Cell::Int(1),
                Cell::Float(1.0),
                Cell::Float(1.2),
                Cell::Int(1),
                Cell::Float(1.0),
                Cell::Float(1.2),
                Cell::Int(78),
                Cell::Float(78.0),
                Cell::Float(97.5),
            ]);
            row(general, vec![block("M", "DUPONT", "Jean", Cell::Int(78))])
        };
        let extract = Extract::new(
            None,
            vec![
                make("01", t("Complet")),
                make("02", t("En cours")),
                make("03", t("COMPLET")),
                make("04", Cell::Empty),
            ],
        );
        let decoded = decode(&extract, &layout).unwrap();
        let codes: Vec<String> = decoded.departments.iter().map(|d| d.code.clone()).collect();
        assert_eq!(codes, vec!["01", "03", "04"]);
        assert_eq!(decoded.stats.len(), 3);
        assert_eq!(decoded.results.len(), 3);
        assert!(decoded.results.iter().all(|r| r.department_code != "02"));
    }

    #[test]
    fn padding_blocks_are_skipped() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        let empty_block = vec![Cell::Empty; 6];
        let extract = Extract::new(
            None,
            vec![row(
                general_2012(t("01"), "Ain", 1000, 800, 20),
                vec![block("M", "DUPONT", "Jean", Cell::Int(300)), empty_block],
            )],
        );
        let decoded = decode(&extract, &layout).unwrap();
        assert_eq!(decoded.num_candidate_blocks, 2);
        assert_eq!(decoded.results.len(), 1);
    }

    #[test]
    fn identity_columns_from_header() {
        let mut layout = Layout::builtin("presidential-2012").unwrap();
        layout.department_identity_columns = Some((
            "Code du département".to_string(),
            "Libellé du département".to_string(),
        ));
        let mut header: Vec<String> = (0..19).map(|i| format!("col{}", i)).collect();
        header[0] = "Code du département".to_string();
        header[1] = "Libellé du département".to_string();
        let extract = Extract::new(Some(header.clone()), two_row_extract().rows);
        let decoded = decode(&extract, &layout).unwrap();
        assert_eq!(decoded.results[0].department_name, "Ain");

        header[0] = "Code".to_string();
        let extract = Extract::new(Some(header), two_row_extract().rows);
        assert!(matches!(
            decode(&extract, &layout),
            Err(DecodeError::LayoutMismatch { .. })
        ));
    }

    #[test]
    fn invalid_registered_count() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        let mut extract = two_row_extract();
        extract.rows[1][2] = t("n/a");
        assert_eq!(
            decode(&extract, &layout),
            Err(DecodeError::InvalidCount {
                row: 1,
                column: "nb_inscrits".to_string(),
                content: "Text(\"n/a\")".to_string(),
            })
        );
    }

    #[test]
    fn invalid_department_code() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        let mut extract = two_row_extract();
        extract.rows[0][0] = t("Ain");
        assert!(matches!(
            decode(&extract, &layout),
            Err(DecodeError::InvalidDepartmentCode { row: 0, .. })
        ));
    }

    #[test]
    fn float_codes_are_normalized() {
        let layout = Layout::builtin("presidential-2012").unwrap();
        let mut extract = two_row_extract();
        extract.rows[0][0] = Cell::Float(1.0);
        let decoded = decode(&extract, &layout).unwrap();
        assert_eq!(decoded.departments[0].code, "01");
    }

    #[test]
    fn grid_with_header_and_dropped_rows() {
        let grid = vec![
            vec![t("Code"), t("Name")],
            vec![t("01"), t("Ain")],
            vec![t("02"), t("Aisne")],
            vec![t("03"), t("Allier")],
        ];
        let mut extract = Extract::from_grid(grid, true);
        assert_eq!(
            extract.header,
            Some(vec!["Code".to_string(), "Name".to_string()])
        );
        extract.drop_rows(&[1, 7]);
        assert_eq!(extract.rows.len(), 2);
        assert_eq!(extract.rows[1][0], t("03"));
    }

    #[test]
    fn cell_counts() {
        assert_eq!(Cell::Int(12).as_count(), Some(12));
        assert_eq!(Cell::Float(12.0).as_count(), Some(12));
        assert_eq!(Cell::Float(12.5).as_count(), None);
        assert_eq!(Cell::Float(1e30).as_count(), None);
        assert_eq!(Cell::Float(-1e30).as_count(), None);
        assert_eq!(Cell::Float(f64::NAN).as_count(), None);
        assert_eq!(Cell::Float(f64::INFINITY).as_count(), None);
        assert_eq!(Cell::Float(1e30).as_text(), "1000000000000000000000000000000");
        assert_eq!(t(" 1 234 ").as_count(), Some(1234));
        assert_eq!(t("1\u{a0}234").as_count(), Some(1234));
        assert_eq!(t("-3").as_count(), Some(-3));
        assert_eq!(t("abc").as_count(), None);
        assert_eq!(Cell::Empty.as_count(), None);
    }

    #[test]
    fn sex_values() {
        assert_eq!(Sex::parse("m"), Some(Sex::M));
        assert_eq!(Sex::parse(" F "), Some(Sex::F));
        assert_eq!(Sex::parse("Féminin"), Some(Sex::F));
        assert_eq!(Sex::parse("X"), None);
    }
}
