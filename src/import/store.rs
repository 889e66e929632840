// The relational store: schema, row-level statements and csv export.

use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};

use std::fs;
use std::path::{Path, PathBuf};

use election_tables::normalize::CandidateKey;
use election_tables::{Sex, StatsRow};

use crate::import::loader::ElectionIdentity;
use crate::import::*;

/// The tables of the store, in creation order.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Table {
    Departments,
    Elections,
    ElectionStats,
    Candidates,
    Results,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Departments,
        Table::Elections,
        Table::ElectionStats,
        Table::Candidates,
        Table::Results,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Departments => "departments",
            Table::Elections => "elections",
            Table::ElectionStats => "election_stats",
            Table::Candidates => "candidates",
            Table::Results => "resultats_election",
        }
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS departments (
    code TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0)
);

CREATE TABLE IF NOT EXISTS elections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    election_type TEXT NOT NULL,
    round INTEGER NOT NULL CHECK (round >= 1),
    UNIQUE (date, election_type, round)
);

CREATE TABLE IF NOT EXISTS election_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    department_code TEXT NOT NULL REFERENCES departments(code),
    election_id INTEGER NOT NULL REFERENCES elections(id) ON DELETE CASCADE,
    registered INTEGER NOT NULL CHECK (registered >= 0),
    abstentions INTEGER NOT NULL CHECK (abstentions >= 0),
    voters INTEGER NOT NULL CHECK (voters >= 0),
    blank_or_invalid INTEGER NOT NULL CHECK (blank_or_invalid >= 0),
    CHECK (voters <= registered),
    UNIQUE (department_code, election_id)
);

CREATE TABLE IF NOT EXISTS candidates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    surname TEXT NOT NULL CHECK (length(surname) > 0),
    given_name TEXT NOT NULL CHECK (length(given_name) > 0),
    sex TEXT NOT NULL CHECK (sex IN ('M', 'F')),
    surname_key TEXT NOT NULL,
    given_name_key TEXT NOT NULL,
    UNIQUE (surname_key, given_name_key, sex)
);

CREATE TABLE IF NOT EXISTS resultats_election (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    election_id INTEGER NOT NULL REFERENCES elections(id) ON DELETE CASCADE,
    candidate_id INTEGER NOT NULL REFERENCES candidates(id),
    department_code TEXT NOT NULL REFERENCES departments(code),
    votes INTEGER NOT NULL CHECK (votes >= 0),
    UNIQUE (election_id, candidate_id, department_code)
);

CREATE INDEX IF NOT EXISTS ix_stats_election ON election_stats(election_id);
CREATE INDEX IF NOT EXISTS ix_results_election ON resultats_election(election_id);
CREATE INDEX IF NOT EXISTS ix_candidates_surname ON candidates(surname);
";

/// A connection to the store, opened once per run and passed explicitly.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> ImportResult<Store> {
        info!("Opening store {}", path.display());
        let conn = Connection::open(path).context(StoreSnafu { stage: Stage::Open })?;
        Store::configure(conn)
    }

    pub fn open_in_memory() -> ImportResult<Store> {
        let conn = Connection::open_in_memory().context(StoreSnafu { stage: Stage::Open })?;
        Store::configure(conn)
    }

    fn configure(conn: Connection) -> ImportResult<Store> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context(StoreSnafu { stage: Stage::Open })?;
        Ok(Store { conn })
    }

    /// Creates the missing tables. Existing tables and their rows are kept.
    pub fn create_schema(&self) -> ImportResult<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context(StoreSnafu {
                stage: Stage::Schema,
            })
    }

    /// Drops every table and creates them again, empty.
    pub fn reset_schema(&self) -> ImportResult<()> {
        let mut sql = String::new();
        for table in Table::ALL.iter().rev() {
            sql.push_str(&format!("DROP TABLE IF EXISTS {};\n", table.name()));
        }
        debug!("reset_schema: {}", sql);
        self.conn.execute_batch(&sql).context(StoreSnafu {
            stage: Stage::Schema,
        })?;
        self.create_schema()
    }

    pub fn count_rows(&self, table: Table) -> ImportResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let n: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .context(StoreSnafu { stage: Stage::Query })?;
        Ok(n as usize)
    }

    /// Writes one `<table>.csv` file per table, with a header row.
    pub fn export_csv(&self, dir: &Path) -> ImportResult<Vec<PathBuf>> {
        fs::create_dir_all(dir).context(CreatingDirectorySnafu {
            path: dir.display().to_string(),
        })?;
        let mut written: Vec<PathBuf> = Vec::new();
        for table in Table::ALL {
            let path = dir.join(format!("{}.csv", table.name()));
            let p = path.display().to_string();
            let num_rows = self.export_table(table, &path)?;
            info!("export_csv: {} rows written to {}", num_rows, p);
            written.push(path);
        }
        Ok(written)
    }

    fn export_table(&self, table: Table, path: &Path) -> ImportResult<usize> {
        let p = path.display().to_string();
        let mut wtr = csv::Writer::from_path(path).context(ExportSnafu { path: p.clone() })?;
        let sql = format!("SELECT * FROM {} ORDER BY rowid", table.name());
        let mut stmt = self.conn.prepare(&sql).context(StoreSnafu {
            stage: Stage::Export,
        })?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        wtr.write_record(&columns)
            .context(ExportSnafu { path: p.clone() })?;

        let mut rows = stmt.query([]).context(StoreSnafu {
            stage: Stage::Export,
        })?;
        let mut num_rows = 0;
        while let Some(row) = rows.next().context(StoreSnafu {
            stage: Stage::Export,
        })? {
            let mut record: Vec<String> = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let v: Value = row.get(idx).context(StoreSnafu {
                    stage: Stage::Export,
                })?;
                record.push(value_to_field(v));
            }
            wtr.write_record(&record)
                .context(ExportSnafu { path: p.clone() })?;
            num_rows += 1;
        }
        wtr.flush().context(WritingExportSnafu { path: p })?;
        Ok(num_rows)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

fn value_to_field(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => format!("{:?}", b),
    }
}

/// True when a statement failed on a UNIQUE, CHECK, NOT NULL or FOREIGN KEY constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation)
}

// ******** Row-level statements *********
// These take a plain connection so that they run the same inside or
// outside of a transaction.

pub(crate) fn find_election(
    conn: &Connection,
    identity: &ElectionIdentity,
) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM elections WHERE date = ?1 AND election_type = ?2 AND round = ?3",
        params![
            identity.date_string(),
            identity.election_type.as_str(),
            identity.round
        ],
        |row| row.get(0),
    )
    .optional()
}

pub(crate) fn insert_election(conn: &Connection, identity: &ElectionIdentity) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO elections (date, election_type, round) VALUES (?1, ?2, ?3)",
        params![
            identity.date_string(),
            identity.election_type.as_str(),
            identity.round
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn upsert_department(conn: &Connection, code: &str, name: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO departments (code, name) VALUES (?1, ?2)
         ON CONFLICT(code) DO UPDATE SET name = excluded.name",
        params![code, name],
    )?;
    Ok(())
}

/// Returns false when the row already existed. An existing row is never modified.
pub(crate) fn insert_stats_if_absent(
    conn: &Connection,
    election_id: i64,
    stats: &StatsRow,
) -> rusqlite::Result<bool> {
    let changes = conn.execute(
        "INSERT INTO election_stats
            (department_code, election_id, registered, abstentions, voters, blank_or_invalid)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(department_code, election_id) DO NOTHING",
        params![
            stats.department_code,
            election_id,
            stats.registered,
            stats.abstentions,
            stats.voters,
            stats.blank_or_invalid
        ],
    )?;
    Ok(changes == 1)
}

/// A stored candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateRecord {
    pub id: i64,
    pub surname: String,
    pub given_name: String,
    pub sex: String,
}

pub(crate) fn load_candidates(conn: &Connection) -> rusqlite::Result<Vec<CandidateRecord>> {
    let mut stmt = conn.prepare("SELECT id, surname, given_name, sex FROM candidates ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(CandidateRecord {
            id: row.get(0)?,
            surname: row.get(1)?,
            given_name: row.get(2)?,
            sex: row.get(3)?,
        })
    })?;
    rows.collect()
}

pub(crate) fn insert_candidate(
    conn: &Connection,
    surname: &str,
    given_name: &str,
    sex: Sex,
    key: &CandidateKey,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO candidates (surname, given_name, sex, surname_key, given_name_key)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![surname, given_name, sex.as_str(), key.surname, key.given_name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The (result id, candidate id, department code) triples of one election.
pub(crate) fn load_result_keys(
    conn: &Connection,
    election_id: i64,
) -> rusqlite::Result<Vec<(i64, i64, String)>> {
    let mut stmt = conn.prepare(
        "SELECT id, candidate_id, department_code FROM resultats_election WHERE election_id = ?1",
    )?;
    let rows = stmt.query_map(params![election_id], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    })?;
    rows.collect()
}

pub(crate) fn insert_result(
    conn: &Connection,
    election_id: i64,
    candidate_id: i64,
    department_code: &str,
    votes: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO resultats_election (election_id, candidate_id, department_code, votes)
         VALUES (?1, ?2, ?3, ?4)",
        params![election_id, candidate_id, department_code, votes],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::loader::ElectionType;
    use chrono::NaiveDate;

    fn identity() -> ElectionIdentity {
        ElectionIdentity {
            date: NaiveDate::from_ymd_opt(2012, 4, 22).unwrap(),
            election_type: ElectionType::Presidential,
            round: 1,
        }
    }

    fn stats(code: &str, registered: i64, voters: i64) -> StatsRow {
        StatsRow {
            row: 0,
            department_code: code.to_string(),
            registered,
            abstentions: registered - voters,
            voters,
            blank_or_invalid: 0,
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        store.create_schema().unwrap();
        for table in Table::ALL {
            assert_eq!(store.count_rows(table).unwrap(), 0);
        }
    }

    #[test]
    fn reset_drops_rows() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        upsert_department(store.connection(), "01", "Ain").unwrap();
        assert_eq!(store.count_rows(Table::Departments).unwrap(), 1);
        store.reset_schema().unwrap();
        assert_eq!(store.count_rows(Table::Departments).unwrap(), 0);
    }

    #[test]
    fn election_lookup() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        let conn = store.connection();
        assert_eq!(find_election(conn, &identity()).unwrap(), None);
        let id = insert_election(conn, &identity()).unwrap();
        assert_eq!(find_election(conn, &identity()).unwrap(), Some(id));

        let err = insert_election(conn, &identity()).unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn department_upsert_overwrites_name() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        let conn = store.connection();
        upsert_department(conn, "2A", "Corse du Sud").unwrap();
        upsert_department(conn, "2A", "Corse-du-Sud").unwrap();
        let name: String = conn
            .query_row("SELECT name FROM departments WHERE code = '2A'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(name, "Corse-du-Sud");
        assert_eq!(store.count_rows(Table::Departments).unwrap(), 1);
    }

    #[test]
    fn stats_insert_if_absent() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        let conn = store.connection();
        upsert_department(conn, "01", "Ain").unwrap();
        let election_id = insert_election(conn, &identity()).unwrap();
        assert!(insert_stats_if_absent(conn, election_id, &stats("01", 100, 80)).unwrap());
        assert!(!insert_stats_if_absent(conn, election_id, &stats("01", 200, 150)).unwrap());
        let registered: i64 = conn
            .query_row("SELECT registered FROM election_stats", [], |r| r.get(0))
            .unwrap();
        assert_eq!(registered, 100);
    }

    #[test]
    fn check_constraints_backstop() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        let conn = store.connection();
        upsert_department(conn, "01", "Ain").unwrap();
        let election_id = insert_election(conn, &identity()).unwrap();
        let err = insert_stats_if_absent(conn, election_id, &stats("01", 80, 100)).unwrap_err();
        assert!(is_constraint_violation(&err));
        // Unknown department.
        let err = insert_stats_if_absent(conn, election_id, &stats("02", 100, 80)).unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn candidate_natural_key_is_unique() {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        let conn = store.connection();
        let key = CandidateKey::new("Mélenchon", "Jean-Luc", Sex::M);
        insert_candidate(conn, "Mélenchon", "Jean-Luc", Sex::M, &key).unwrap();
        let err = insert_candidate(conn, "MELENCHON", "Jean-Luc", Sex::M, &key).unwrap_err();
        assert!(is_constraint_violation(&err));
        let records = load_candidates(conn).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].surname, "Mélenchon");
    }

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        upsert_department(store.connection(), "01", "Ain").unwrap();
        upsert_department(store.connection(), "2A", "Corse-du-Sud").unwrap();
        let written = store.export_csv(&dir.path().join("export")).unwrap();
        assert_eq!(written.len(), 5);

        let content = fs::read_to_string(dir.path().join("export/departments.csv")).unwrap();
        assert_eq!(content, "code,name\n01,Ain\n2A,Corse-du-Sud\n");
        let content = fs::read_to_string(dir.path().join("export/resultats_election.csv")).unwrap();
        assert_eq!(
            content,
            "id,election_id,candidate_id,department_code,votes\n"
        );
    }
}
