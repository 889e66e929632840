use log::{debug, info};

use election_tables::*;
use snafu::{prelude::*, Snafu};

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::import::config_reader::*;
use crate::import::loader::*;
use crate::import::store::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
pub mod loader;
pub mod store;

/// The steps of an import, used to report progress and to name the failing step.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Stage {
    Open,
    Schema,
    Query,
    Election,
    Departments,
    Stats,
    Results,
    Export,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Open => "open",
            Stage::Schema => "schema",
            Stage::Query => "query",
            Stage::Election => "election",
            Stage::Departments => "departments",
            Stage::Stats => "stats",
            Stage::Results => "results",
            Stage::Export => "export",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ImportError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Worksheet {worksheet} not found in {path}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("Error opening csv file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error reading configuration {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Unknown layout {source_id}"))]
    UnknownLayout { source_id: String },
    #[snafu(display("Invalid layout {source_id}"))]
    InvalidLayout {
        source: DecodeError,
        source_id: String,
    },
    #[snafu(display("No reader for file {path} (expected .xlsx, .xlsm or .csv)"))]
    UnsupportedProvider { path: String },
    #[snafu(display("Invalid date {content:?}, expected YYYY-MM-DD"))]
    InvalidDate {
        source: chrono::ParseError,
        content: String,
    },
    #[snafu(display("Invalid election type {content:?}"))]
    InvalidElectionType { content: String },
    #[snafu(display("Invalid round {round}, rounds start at 1"))]
    InvalidRound { round: u32 },
    #[snafu(display("Invalid csv delimiter {content:?}, expected a single character"))]
    InvalidDelimiter { content: String },
    #[snafu(display("Error decoding {path}"))]
    Decoding { source: DecodeError, path: String },
    #[snafu(display("[{stage}] row {row}: {reason}"))]
    Validation {
        stage: Stage,
        row: usize,
        reason: String,
    },
    #[snafu(display("Election {election_type} {date} round {round} already exists"))]
    DuplicateElectionIdentity {
        date: String,
        election_type: String,
        round: u32,
    },
    #[snafu(display("[{stage}] store error"))]
    Store {
        stage: Stage,
        source: rusqlite::Error,
    },
    #[snafu(display("[{stage}] row {row}: store error"))]
    StoreRow {
        stage: Stage,
        row: usize,
        source: rusqlite::Error,
    },
    #[snafu(display("Error writing {path}"))]
    Export { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    WritingExport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating directory {path}"))]
    CreatingDirectory {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Reads the grid of one job and turns it into an extract ready for decoding.
pub fn read_extract(path: &Path, job: &ImportJob) -> ImportResult<Extract> {
    let p = path.display().to_string();
    info!("Attempting to read extract {:?}", p);
    let grid = match io_common::provider_for(path) {
        Some(io_common::Provider::Excel) => io_excel::read_excel_grid(&p, job.worksheet.as_deref())?,
        Some(io_common::Provider::Csv) => io_csv::read_csv_grid(&p, job.csv_delimiter)?,
        None => return UnsupportedProviderSnafu { path: p }.fail(),
    };
    debug!("read_extract: {} rows in {:?}", grid.len(), p);
    let mut extract = Extract::from_grid(grid, job.layout.has_header_row);
    extract.drop_rows(&job.skip_rows);
    Ok(extract)
}

/// Creates the schema of a store, optionally dropping existing tables first.
pub fn run_init(database: &str, reset: bool) -> ImportResult<()> {
    let store = Store::open(Path::new(database))?;
    if reset {
        info!("run_init: dropping all tables in {}", database);
        store.reset_schema()?;
    } else {
        store.create_schema()?;
    }
    for table in Table::ALL {
        println!("{}: {} rows", table.name(), store.count_rows(table)?);
    }
    Ok(())
}

/// Runs the import jobs of a configuration file, in order.
///
/// Each job is decoded completely before anything is written.
pub fn run_import(config_path: &str, only: Option<&str>) -> ImportResult<Vec<ImportReport>> {
    let config = read_config(config_path)?;
    let root_p = config_root(config_path)?;
    let database: PathBuf = root_p.join(&config.database);

    let mut store = Store::open(&database)?;
    store.create_schema()?;

    let mut reports: Vec<ImportReport> = Vec::new();
    for job in config.jobs.iter() {
        if let Some(source_id) = only {
            if job.source_id != source_id {
                debug!("run_import: skipping job {}", job.label());
                continue;
            }
        }
        let path = root_p.join(&job.file_path);
        let extract = read_extract(&path, job)?;
        let decoded = decode(&extract, &job.layout).context(DecodingSnafu {
            path: path.display().to_string(),
        })?;
        info!(
            "run_import: {}: {} departments, {} candidate blocks",
            job.label(),
            decoded.departments.len(),
            decoded.num_candidate_blocks
        );

        let label = job.label();
        let mut loader = Loader::new(&mut store);
        let report = loader.import_extract(&decoded, &job.identity, |stage, msg| {
            println!("[{}] {}: {}", label, stage, msg)
        })?;
        reports.push(report);
    }
    Ok(reports)
}

/// Writes every table of a store as csv into `out_dir`.
pub fn run_export(database: &str, out_dir: &str) -> ImportResult<Vec<PathBuf>> {
    let store = Store::open(Path::new(database))?;
    let written = store.export_csv(Path::new(out_dir))?;
    for p in written.iter() {
        println!("wrote {}", p.display());
    }
    Ok(written)
}

fn config_root(config_path: &str) -> ImportResult<PathBuf> {
    let config_p = Path::new(config_path);
    let root_p = config_p.parent().context(MissingParentDirSnafu {
        path: config_path.to_string(),
    })?;
    Ok(root_p.to_path_buf())
}
