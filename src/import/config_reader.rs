use crate::import::loader::{ElectionIdentity, ElectionType};
use crate::import::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use std::collections::BTreeMap;
use std::fs;

/// A layout as written in the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(rename = "generalColumnCount")]
    pub general_column_count: usize,
    #[serde(rename = "generalColumnNames")]
    pub general_column_names: Vec<String>,
    #[serde(rename = "candidateBlockWidth")]
    pub candidate_block_width: Option<usize>,
    #[serde(rename = "candidateBlockNames")]
    pub candidate_block_names: Option<Vec<String>>,
    #[serde(rename = "filterColumn")]
    pub filter_column: Option<String>,
    #[serde(rename = "filterValue")]
    pub filter_value: Option<String>,
    #[serde(rename = "departmentCodeColumnIndex")]
    pub department_code_column_index: Option<usize>,
    #[serde(rename = "departmentIdentityColumns")]
    pub department_identity_columns: Option<(String, String)>,
    #[serde(rename = "hasHeaderRow")]
    pub has_header_row: Option<bool>,
}

impl LayoutConfig {
    fn to_layout(&self) -> Layout {
        let names: Vec<&str> = self.general_column_names.iter().map(|s| s.as_str()).collect();
        let mut layout = Layout::new(&names);
        // The count is kept as written, validation compares it to the names.
        layout.general_column_count = self.general_column_count;
        if let Some(width) = self.candidate_block_width {
            layout.candidate_block_width = width;
        }
        if let Some(block_names) = &self.candidate_block_names {
            layout.candidate_block_names = block_names.clone();
        }
        if let Some(filter_column) = &self.filter_column {
            layout.filter_column = filter_column.clone();
        }
        if let Some(filter_value) = &self.filter_value {
            layout.filter_value = filter_value.clone();
        }
        if let Some(idx) = self.department_code_column_index {
            layout.department_code_column_index = idx;
        }
        layout.department_identity_columns = self.department_identity_columns.clone();
        if let Some(has_header_row) = self.has_header_row {
            layout.has_header_row = has_header_row;
        }
        layout
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub layout: String,
    pub date: String,
    #[serde(rename = "electionType")]
    pub election_type: String,
    round: JSValue,
    pub worksheet: Option<String>,
    #[serde(rename = "skipRows")]
    pub skip_rows: Option<Vec<usize>>,
    #[serde(rename = "csvDelimiter")]
    pub csv_delimiter: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfigFile {
    pub database: String,
    pub layouts: Option<BTreeMap<String, LayoutConfig>>,
    pub imports: Vec<JobConfig>,
}

/// One validated import job.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ImportJob {
    pub source_id: String,
    pub file_path: String,
    pub layout: Layout,
    pub identity: ElectionIdentity,
    pub worksheet: Option<String>,
    /// 0-based indexes of data rows dropped before decoding.
    pub skip_rows: Vec<usize>,
    pub csv_delimiter: u8,
}

impl ImportJob {
    pub fn label(&self) -> String {
        format!("{} round {}", self.source_id, self.identity.round)
    }

    #[cfg(test)]
    pub fn for_test(source_id: &str, file_path: &str) -> ImportJob {
        ImportJob {
            source_id: source_id.to_string(),
            file_path: file_path.to_string(),
            layout: Layout::builtin("presidential-2012").unwrap(),
            identity: ElectionIdentity {
                date: NaiveDate::from_ymd_opt(2012, 4, 22).unwrap(),
                election_type: ElectionType::Presidential,
                round: 1,
            },
            worksheet: None,
            skip_rows: Vec::new(),
            csv_delimiter: b',',
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ImportConfig {
    /// Path of the database, relative to the directory of the configuration file.
    pub database: String,
    pub jobs: Vec<ImportJob>,
}

pub fn read_config(path: &str) -> ImportResult<ImportConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ImportConfigFile =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    validate_config(&config)
}

/// Resolves the layouts of every job and checks the job parameters.
///
/// The layouts of the configuration file replace the built-in ones with
/// the same identifier. All layouts are validated, used or not.
pub fn validate_config(config: &ImportConfigFile) -> ImportResult<ImportConfig> {
    let mut layouts: BTreeMap<String, Layout> = builtin_layouts().into_iter().collect();
    if let Some(custom) = &config.layouts {
        for (source_id, lc) in custom.iter() {
            if layouts.contains_key(source_id) {
                info!("validate_config: overriding built-in layout {}", source_id);
            }
            layouts.insert(source_id.clone(), lc.to_layout());
        }
    }
    for (source_id, layout) in layouts.iter() {
        layout
            .validate()
            .context(InvalidLayoutSnafu { source_id })?;
    }

    let mut jobs: Vec<ImportJob> = Vec::new();
    for jc in config.imports.iter() {
        let layout = layouts
            .get(&jc.layout)
            .context(UnknownLayoutSnafu {
                source_id: &jc.layout,
            })?
            .clone();
        jobs.push(validate_job(jc, layout)?);
    }
    info!("validate_config: {} import jobs", jobs.len());
    Ok(ImportConfig {
        database: config.database.clone(),
        jobs,
    })
}

fn validate_job(jc: &JobConfig, layout: Layout) -> ImportResult<ImportJob> {
    let date = NaiveDate::parse_from_str(jc.date.trim(), "%Y-%m-%d").context(InvalidDateSnafu {
        content: &jc.date,
    })?;
    let election_type =
        ElectionType::from_name(&jc.election_type).context(InvalidElectionTypeSnafu {
            content: &jc.election_type,
        })?;
    let round = read_js_int(&jc.round)?;
    ensure!(round >= 1, InvalidRoundSnafu { round });
    let csv_delimiter = match &jc.csv_delimiter {
        None => b',',
        Some(s) if s.len() == 1 && s.is_ascii() => s.as_bytes()[0],
        Some(s) => return InvalidDelimiterSnafu { content: s }.fail(),
    };
    Ok(ImportJob {
        source_id: jc.layout.clone(),
        file_path: jc.file_path.clone(),
        layout,
        identity: ElectionIdentity {
            date,
            election_type,
            round,
        },
        worksheet: jc.worksheet.clone(),
        skip_rows: jc.skip_rows.clone().unwrap_or_default(),
        csv_delimiter,
    })
}

// Rounds are accepted as numbers or as strings.
fn read_js_int(x: &JSValue) -> ImportResult<u32> {
    let parsed = match x {
        JSValue::Number(n) => n.as_u64().and_then(|x| u32::try_from(x).ok()),
        JSValue::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.context(InvalidRoundSnafu { round: 0u32 })
}
