use log::{debug, info, warn};

use chrono::NaiveDate;

use std::collections::HashSet;
use std::fmt::Display;

use election_tables::normalize::{clean_name, fold_name, normalize_department_code, CandidateKey};
use election_tables::resolver::{EntityResolver, Resolution};
use election_tables::{CandidateResult, Cell, DecodedExtract, DepartmentRow, Sex, StatsRow};

use crate::import::store::{self, Store};
use crate::import::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ElectionType {
    Presidential,
    Legislative,
    Municipal,
    Regional,
    Other,
}

impl ElectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionType::Presidential => "presidential",
            ElectionType::Legislative => "legislative",
            ElectionType::Municipal => "municipal",
            ElectionType::Regional => "regional",
            ElectionType::Other => "other",
        }
    }

    /// Accepts the english names and the french ones, ignoring case and accents.
    pub fn from_name(name: &str) -> Option<ElectionType> {
        match fold_name(name).as_str() {
            "PRESIDENTIAL" | "PRESIDENTIELLE" => Some(ElectionType::Presidential),
            "LEGISLATIVE" => Some(ElectionType::Legislative),
            "MUNICIPAL" | "MUNICIPALE" => Some(ElectionType::Municipal),
            "REGIONAL" | "REGIONALE" => Some(ElectionType::Regional),
            "OTHER" | "AUTRE" => Some(ElectionType::Other),
            _ => None,
        }
    }
}

impl Display for ElectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The natural key of an election.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ElectionIdentity {
    pub date: NaiveDate,
    pub election_type: ElectionType,
    pub round: u32,
}

impl ElectionIdentity {
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Election {
    pub id: i64,
    pub identity: ElectionIdentity,
    /// False when the election was already in the store.
    pub created: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct UpsertSummary {
    pub written: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct LoadSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub candidates_created: usize,
    pub candidates_reused: usize,
}

impl Display for LoadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} inserted, {} skipped", self.inserted, self.skipped)?;
        if self.candidates_created + self.candidates_reused > 0 {
            write!(
                f,
                " (candidates: {} created, {} reused)",
                self.candidates_created, self.candidates_reused
            )?;
        }
        Ok(())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ImportReport {
    pub election: Election,
    pub departments: UpsertSummary,
    pub stats: LoadSummary,
    pub results: LoadSummary,
}

/// A result row that passed validation.
struct ValidResult {
    row: usize,
    key: CandidateKey,
    surname: String,
    given_name: String,
    sex: Sex,
    department_code: String,
    votes: i64,
}

/// Loads decoded extracts into a store.
///
/// Every batch is validated completely before the first write, then written
/// in one transaction. Batches committed earlier are kept when a later one
/// fails. Loads of the same election must not run concurrently.
pub struct Loader<'s> {
    store: &'s mut Store,
}

impl<'s> Loader<'s> {
    pub fn new(store: &'s mut Store) -> Loader<'s> {
        Loader { store }
    }

    /// Returns the election with this identity, creating it if needed.
    /// A newly created election is committed immediately.
    pub fn resolve_or_create_election(
        &mut self,
        identity: &ElectionIdentity,
    ) -> ImportResult<Election> {
        if identity.round == 0 {
            return ValidationSnafu {
                stage: Stage::Election,
                row: 0usize,
                reason: "round must be at least 1",
            }
            .fail();
        }
        let existing = store::find_election(self.store.connection(), identity).context(
            StoreSnafu {
                stage: Stage::Election,
            },
        )?;
        match existing {
            Some(id) => {
                debug!(
                    "resolve_or_create_election: found election {} for {:?}",
                    id, identity
                );
                Ok(Election {
                    id,
                    identity: identity.clone(),
                    created: false,
                })
            }
            None => self.create_election(identity),
        }
    }

    fn create_election(&mut self, identity: &ElectionIdentity) -> ImportResult<Election> {
        match store::insert_election(self.store.connection(), identity) {
            Ok(id) => {
                info!("Created election {} for {:?}", id, identity);
                Ok(Election {
                    id,
                    identity: identity.clone(),
                    created: true,
                })
            }
            Err(e) if store::is_constraint_violation(&e) => DuplicateElectionIdentitySnafu {
                date: identity.date_string(),
                election_type: identity.election_type.as_str(),
                round: identity.round,
            }
            .fail(),
            Err(e) => Err(e).context(StoreSnafu {
                stage: Stage::Election,
            }),
        }
    }

    /// Inserts the departments, replacing the name of the existing ones.
    pub fn upsert_departments(&mut self, rows: &[DepartmentRow]) -> ImportResult<UpsertSummary> {
        let mut validated: Vec<(String, String)> = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let code = normalize_department_code(&row.code).context(ValidationSnafu {
                stage: Stage::Departments,
                row: idx,
                reason: format!("invalid department code {:?}", row.code),
            })?;
            let name = clean_name(&row.name);
            ensure!(
                !name.is_empty(),
                ValidationSnafu {
                    stage: Stage::Departments,
                    row: idx,
                    reason: format!("empty name for department {}", code),
                }
            );
            validated.push((code, name));
        }

        let tx = self
            .store
            .connection_mut()
            .transaction()
            .context(StoreSnafu {
                stage: Stage::Departments,
            })?;
        for (code, name) in validated.iter() {
            store::upsert_department(&tx, code, name).context(StoreSnafu {
                stage: Stage::Departments,
            })?;
        }
        tx.commit().context(StoreSnafu {
            stage: Stage::Departments,
        })?;
        debug!("upsert_departments: {} departments written", validated.len());
        Ok(UpsertSummary {
            written: validated.len(),
        })
    }

    /// Inserts the stats that are not in the store yet for this election.
    /// Existing rows are left untouched, even when the source values changed.
    pub fn load_stats(&mut self, rows: &[StatsRow], election_id: i64) -> ImportResult<LoadSummary> {
        for stats in rows.iter() {
            validate_stats(stats)?;
        }

        let tx = self
            .store
            .connection_mut()
            .transaction()
            .context(StoreSnafu {
                stage: Stage::Stats,
            })?;
        let mut summary = LoadSummary::default();
        for stats in rows.iter() {
            let inserted = store::insert_stats_if_absent(&tx, election_id, stats)
                .context(StoreRowSnafu {
                    stage: Stage::Stats,
                    row: stats.row,
                })?;
            if inserted {
                summary.inserted += 1;
            } else {
                debug!(
                    "load_stats: stats for department {} already present, skipping",
                    stats.department_code
                );
                summary.skipped += 1;
            }
        }
        tx.commit().context(StoreSnafu {
            stage: Stage::Stats,
        })?;
        Ok(summary)
    }

    /// Resolves the candidates and inserts the missing results of this election.
    ///
    /// Candidates and the results already stored are preloaded once, then
    /// every row is resolved against that snapshot. The whole batch is
    /// committed at the end.
    pub fn load_candidates_and_results(
        &mut self,
        rows: &[CandidateResult],
        election_id: i64,
    ) -> ImportResult<LoadSummary> {
        let mut validated: Vec<ValidResult> = Vec::with_capacity(rows.len());
        for r in rows.iter() {
            validated.push(validate_result(r)?);
        }

        let conn = self.store.connection();
        let stored_candidates = store::load_candidates(conn).context(StoreSnafu {
            stage: Stage::Results,
        })?;
        let stored_results = store::load_result_keys(conn, election_id).context(StoreSnafu {
            stage: Stage::Results,
        })?;
        let mut candidates: EntityResolver<CandidateKey, i64> =
            EntityResolver::preload(stored_candidates.iter().filter_map(|c| match Sex::parse(&c.sex) {
                Some(sex) => Some((CandidateKey::new(&c.surname, &c.given_name, sex), c.id)),
                None => {
                    warn!("Ignoring candidate {} with unknown sex {:?}", c.id, c.sex);
                    None
                }
            }));
        let mut results: EntityResolver<(i64, String), i64> = EntityResolver::preload(
            stored_results
                .into_iter()
                .map(|(id, candidate_id, code)| ((candidate_id, code), id)),
        );
        debug!(
            "load_candidates_and_results: preloaded {} candidates, {} results",
            candidates.len(),
            results.len()
        );

        let tx = self
            .store
            .connection_mut()
            .transaction()
            .context(StoreSnafu {
                stage: Stage::Results,
            })?;
        let mut summary = LoadSummary::default();
        let mut seen: HashSet<CandidateKey> = HashSet::new();
        for v in validated.iter() {
            let (candidate_id, _) = candidates.resolve_or_create(v.key.clone(), |key| {
                store::insert_candidate(&tx, &v.surname, &v.given_name, v.sex, key).context(
                    StoreRowSnafu {
                        stage: Stage::Results,
                        row: v.row,
                    },
                )
            })?;
            seen.insert(v.key.clone());

            let (_, resolution) = results.resolve_or_create(
                (candidate_id, v.department_code.clone()),
                |(candidate_id, code)| {
                    store::insert_result(&tx, election_id, *candidate_id, code, v.votes).context(
                        StoreRowSnafu {
                            stage: Stage::Results,
                            row: v.row,
                        },
                    )
                },
            )?;
            match resolution {
                Resolution::Created => summary.inserted += 1,
                Resolution::Existing => summary.skipped += 1,
            }
        }
        tx.commit().context(StoreSnafu {
            stage: Stage::Results,
        })?;

        summary.candidates_created = candidates.created();
        summary.candidates_reused = seen.len() - candidates.created();
        info!(
            "load_candidates_and_results: election {}: {}",
            election_id, summary
        );
        Ok(summary)
    }

    /// Loads a decoded extract: election, departments, stats, then results.
    ///
    /// `progress` is called once per completed stage.
    pub fn import_extract<F>(
        &mut self,
        decoded: &DecodedExtract,
        identity: &ElectionIdentity,
        mut progress: F,
    ) -> ImportResult<ImportReport>
    where
        F: FnMut(Stage, &str),
    {
        let election = self.resolve_or_create_election(identity)?;
        let status = if election.created { "created" } else { "existing" };
        progress(
            Stage::Election,
            &format!("{} {} (id {})", status, identity.date_string(), election.id),
        );

        let departments = self.upsert_departments(&decoded.departments)?;
        progress(
            Stage::Departments,
            &format!("{} written", departments.written),
        );

        let stats = self.load_stats(&decoded.stats, election.id)?;
        progress(Stage::Stats, &stats.to_string());

        let results = self.load_candidates_and_results(&decoded.results, election.id)?;
        progress(Stage::Results, &results.to_string());

        Ok(ImportReport {
            election,
            departments,
            stats,
            results,
        })
    }
}

fn validate_stats(stats: &StatsRow) -> ImportResult<()> {
    let fail = |reason: String| -> ImportResult<()> {
        ValidationSnafu {
            stage: Stage::Stats,
            row: stats.row,
            reason,
        }
        .fail()
    };
    if normalize_department_code(&stats.department_code).is_none() {
        return fail(format!(
            "invalid department code {:?}",
            stats.department_code
        ));
    }
    let counts = [
        ("registered", stats.registered),
        ("abstentions", stats.abstentions),
        ("voters", stats.voters),
        ("blank or invalid", stats.blank_or_invalid),
    ];
    for (name, count) in counts {
        if count < 0 {
            return fail(format!("negative {} count {}", name, count));
        }
    }
    if stats.voters > stats.registered {
        return fail(format!(
            "{} voters for {} registered",
            stats.voters, stats.registered
        ));
    }
    Ok(())
}

fn validate_result(r: &CandidateResult) -> ImportResult<ValidResult> {
    let fail = |reason: String| -> ImportResult<ValidResult> {
        ValidationSnafu {
            stage: Stage::Results,
            row: r.row,
            reason: format!("candidate block {}: {}", r.block, reason),
        }
        .fail()
    };
    let votes = match r.votes.as_count() {
        Some(v) if v >= 0 => v,
        Some(v) => return fail(format!("negative vote count {}", v)),
        None => return fail(format!("vote count {} is not an integer", describe(&r.votes))),
    };
    let sex = match Sex::parse(&r.sex) {
        Some(sex) => sex,
        None => return fail(format!("unknown sex {:?}", r.sex)),
    };
    let surname = clean_name(&r.surname);
    let given_name = clean_name(&r.given_name);
    if surname.is_empty() || given_name.is_empty() {
        return fail(format!(
            "incomplete candidate name {:?} {:?}",
            r.given_name, r.surname
        ));
    }
    let department_code = match normalize_department_code(&r.department_code) {
        Some(code) => code,
        None => return fail(format!("invalid department code {:?}", r.department_code)),
    };
    Ok(ValidResult {
        row: r.row,
        key: CandidateKey::new(&surname, &given_name, sex),
        surname,
        given_name,
        sex,
        department_code,
        votes,
    })
}

fn describe(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "(empty)".to_string(),
        c => format!("{:?}", c.as_text()),
    }
}
