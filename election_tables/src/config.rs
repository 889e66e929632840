// ********* Layout configuration ***********

use crate::DecodeError;

/// Number of columns describing one candidate in the official extracts:
/// sex, surname, given name, votes, % of registered, % of cast.
pub const CANDIDATE_BLOCK_WIDTH: usize = 6;

pub const DEFAULT_FILTER_COLUMN: &str = "etat_saisie";
pub const DEFAULT_FILTER_VALUE: &str = "Complet";

// Canonical names of the general block. The layouts map the positional
// columns of an extract onto these names.
pub const CODE_DEPT: &str = "code_dept";
pub const NOM_DEPT: &str = "nom_dept";
pub const NB_INSCRITS: &str = "nb_inscrits";
pub const NB_ABSTENTIONS: &str = "nb_abstentions";
pub const NB_VOTANTS: &str = "nb_votants";
pub const NB_BLANCS_NULS: &str = "nb_blancs_nuls";
pub const NB_BLANCS: &str = "nb_blancs";
pub const NB_NULS: &str = "nb_nuls";

pub const DEFAULT_CANDIDATE_BLOCK_NAMES: [&str; CANDIDATE_BLOCK_WIDTH] = [
    "sexe",
    "nom",
    "prenom",
    "voix",
    "pct_voix_ins",
    "pct_voix_exp",
];

/// How blank and invalid ballots are reported by a source.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BallotCountColumns {
    /// A single `nb_blancs_nuls` column.
    Merged(usize),
    /// Separate `nb_blancs` and `nb_nuls` columns, summed by the decoder.
    Separate { blank: usize, invalid: usize },
}

/// Positions of the canonical columns inside the general block.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct GeneralColumns {
    pub code: usize,
    pub name: usize,
    pub registered: usize,
    pub abstentions: usize,
    pub voters: usize,
    pub blank_or_invalid: BallotCountColumns,
    pub filter: Option<usize>,
}

/// Describes the positional structure of one family of extracts.
///
/// An extract is a fixed general block of `general_column_count` columns
/// followed by repeating candidate blocks of `candidate_block_width` columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Layout {
    pub general_column_count: usize,
    pub general_column_names: Vec<String>,
    pub candidate_block_width: usize,
    pub candidate_block_names: Vec<String>,
    pub filter_column: String,
    pub filter_value: String,
    pub department_code_column_index: usize,
    /// Raw header names of the (code, name) columns used to key the
    /// candidate blocks. Only used when the extract carries a header row.
    pub department_identity_columns: Option<(String, String)>,
    pub has_header_row: bool,
}

impl Layout {
    /// A layout with the given general block and the defaults for everything else.
    pub fn new(general_column_names: &[&str]) -> Layout {
        Layout {
            general_column_count: general_column_names.len(),
            general_column_names: general_column_names.iter().map(|s| s.to_string()).collect(),
            candidate_block_width: CANDIDATE_BLOCK_WIDTH,
            candidate_block_names: DEFAULT_CANDIDATE_BLOCK_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            filter_column: DEFAULT_FILTER_COLUMN.to_string(),
            filter_value: DEFAULT_FILTER_VALUE.to_string(),
            department_code_column_index: 0,
            department_identity_columns: None,
            has_header_row: true,
        }
    }

    /// Looks up one of the built-in layouts by source identifier.
    pub fn builtin(source_id: &str) -> Option<Layout> {
        builtin_layouts()
            .into_iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, layout)| layout)
    }

    /// Checks the layout on its own, before any extract is seen.
    pub fn validate(&self) -> Result<GeneralColumns, DecodeError> {
        if self.general_column_names.len() != self.general_column_count {
            return Err(DecodeError::layout(format!(
                "{} general column names for {} general columns",
                self.general_column_names.len(),
                self.general_column_count
            )));
        }
        // Sex, surname, given name and votes are read positionally.
        if self.candidate_block_width < 4 {
            return Err(DecodeError::layout(format!(
                "candidate blocks need at least 4 columns, got {}",
                self.candidate_block_width
            )));
        }
        if self.candidate_block_names.len() != self.candidate_block_width {
            return Err(DecodeError::layout(format!(
                "{} candidate block names for a block width of {}",
                self.candidate_block_names.len(),
                self.candidate_block_width
            )));
        }
        if self.department_code_column_index + 1 >= self.general_column_count {
            return Err(DecodeError::layout(format!(
                "department code column {} is outside the general block",
                self.department_code_column_index
            )));
        }

        let blank_or_invalid = match (
            self.position(NB_BLANCS_NULS),
            self.position(NB_BLANCS),
            self.position(NB_NULS),
        ) {
            (Some(merged), _, _) => BallotCountColumns::Merged(merged),
            (None, Some(blank), Some(invalid)) => BallotCountColumns::Separate { blank, invalid },
            _ => {
                return Err(DecodeError::layout(format!(
                    "missing {} or the pair {}/{}",
                    NB_BLANCS_NULS, NB_BLANCS, NB_NULS
                )))
            }
        };

        Ok(GeneralColumns {
            code: self.required(CODE_DEPT)?,
            name: self.required(NOM_DEPT)?,
            registered: self.required(NB_INSCRITS)?,
            abstentions: self.required(NB_ABSTENTIONS)?,
            voters: self.required(NB_VOTANTS)?,
            blank_or_invalid,
            filter: self.position(&self.filter_column),
        })
    }

    /// Validates the layout against the column count of an actual extract and
    /// returns the number of candidate blocks.
    pub fn check_extract(&self, total_columns: usize) -> Result<usize, DecodeError> {
        if total_columns < self.general_column_count {
            return Err(DecodeError::layout(format!(
                "extract has {} columns, the general block alone needs {}",
                total_columns, self.general_column_count
            )));
        }
        let remaining = total_columns - self.general_column_count;
        if remaining % self.candidate_block_width != 0 {
            return Err(DecodeError::layout(format!(
                "{} columns after the general block is not a multiple of the block width {}",
                remaining, self.candidate_block_width
            )));
        }
        let blocks = self.candidate_block_count(total_columns);
        if blocks == 0 {
            return Err(DecodeError::layout(
                "extract has no candidate block".to_string(),
            ));
        }
        Ok(blocks)
    }

    pub fn candidate_block_count(&self, total_columns: usize) -> usize {
        total_columns.saturating_sub(self.general_column_count) / self.candidate_block_width
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.general_column_names.iter().position(|n| n == name)
    }

    fn required(&self, name: &str) -> Result<usize, DecodeError> {
        self.position(name)
            .ok_or_else(|| DecodeError::layout(format!("missing general column {}", name)))
    }
}

/// The layouts of the official presidential extracts, keyed by source identifier.
///
/// The historical files differ in the width of the general block and in
/// whether blank and invalid ballots share a column.
pub fn builtin_layouts() -> Vec<(String, Layout)> {
    let presidential_2012 = Layout::new(&[
        CODE_DEPT,
        NOM_DEPT,
        NB_INSCRITS,
        NB_ABSTENTIONS,
        "pct_abstentions",
        NB_VOTANTS,
        "pct_votants",
        NB_BLANCS_NULS,
        "pct_blancs_nuls_inscrits",
        "pct_blancs_nuls_votants",
        "nb_exprimes",
        "pct_exprimes_inscrits",
        "pct_exprimes_votants",
    ]);

    let presidential_2017 = Layout::new(&[
        CODE_DEPT,
        NOM_DEPT,
        NB_INSCRITS,
        NB_ABSTENTIONS,
        "pct_abstentions",
        NB_VOTANTS,
        "pct_votants",
        NB_BLANCS,
        "pct_blancs_inscrits",
        "pct_blancs_votants",
        NB_NULS,
        "pct_nuls_inscrits",
        "pct_nuls_votants",
        "nb_exprimes",
        "pct_exprimes_inscrits",
        "pct_exprimes_votants",
    ]);

    let presidential_2022 = Layout::new(&[
        CODE_DEPT,
        NOM_DEPT,
        DEFAULT_FILTER_COLUMN,
        NB_INSCRITS,
        NB_ABSTENTIONS,
        "pct_abstentions",
        NB_VOTANTS,
        "pct_votants",
        NB_BLANCS,
        "pct_blancs_inscrits",
        "pct_blancs_votants",
        NB_NULS,
        "pct_nuls_inscrits",
        "pct_nuls_votants",
        "nb_exprimes",
        "pct_exprimes_inscrits",
        "pct_exprimes_votants",
    ]);

    vec![
        ("presidential-2012".to_string(), presidential_2012),
        ("presidential-2017".to_string(), presidential_2017),
        ("presidential-2022".to_string(), presidential_2022),
    ]
}
