// ********* Queries over a decoded extract ***********

use std::collections::BTreeSet;

use crate::normalize::{department_sort_key, normalize_department_code};
use crate::{Cell, DecodedExtract, StatsRow};

/// A candidate as it appears in an extract.
#[derive(Eq, PartialEq, Debug, Clone, PartialOrd, Ord)]
pub struct CandidateName {
    pub surname: String,
    pub given_name: String,
    pub sex: String,
}

/// Votes of one candidate in one department.
#[derive(PartialEq, Debug, Clone)]
pub struct DepartmentVotes {
    pub department_code: String,
    pub department_name: String,
    pub votes: Cell,
}

#[derive(PartialEq, Debug, Clone)]
pub struct DepartmentSummary {
    pub stats: StatsRow,
    pub votes: Cell,
}

impl DecodedExtract {
    /// The distinct candidates, sorted by surname then given name.
    pub fn candidates(&self) -> Vec<CandidateName> {
        let set: BTreeSet<CandidateName> = self
            .results
            .iter()
            .map(|r| CandidateName {
                surname: r.surname.clone(),
                given_name: r.given_name.clone(),
                sex: r.sex.clone(),
            })
            .collect();
        set.into_iter().collect()
    }

    /// The votes of one candidate in every department, in department order.
    pub fn votes_by_department(&self, surname: &str, given_name: &str) -> Vec<DepartmentVotes> {
        let mut res: Vec<DepartmentVotes> = self
            .results
            .iter()
            .filter(|r| r.surname == surname && r.given_name == given_name)
            .map(|r| DepartmentVotes {
                department_code: r.department_code.clone(),
                department_name: r.department_name.clone(),
                votes: r.votes.clone(),
            })
            .collect();
        res.sort_by_key(|v| department_sort_key(&v.department_code));
        res
    }

    pub fn stats_for_department(&self, code: &str) -> Option<&StatsRow> {
        let code = normalize_department_code(code)?;
        self.stats.iter().find(|s| s.department_code == code)
    }

    pub fn department_summary(
        &self,
        code: &str,
        surname: &str,
        given_name: &str,
    ) -> Option<DepartmentSummary> {
        let stats = self.stats_for_department(code)?;
        let result = self.results.iter().find(|r| {
            r.department_code == stats.department_code
                && r.surname == surname
                && r.given_name == given_name
        })?;
        Some(DepartmentSummary {
            stats: stats.clone(),
            votes: result.votes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CandidateResult, DepartmentRow};

    fn result(code: &str, surname: &str, given_name: &str, votes: i64) -> CandidateResult {
        CandidateResult {
            row: 0,
            block: 0,
            department_code: code.to_string(),
            department_name: format!("Dept {}", code),
            sex: "M".to_string(),
            surname: surname.to_string(),
            given_name: given_name.to_string(),
            votes: Cell::Int(votes),
        }
    }

    fn stats(code: &str, registered: i64) -> StatsRow {
        StatsRow {
            row: 0,
            department_code: code.to_string(),
            registered,
            abstentions: 10,
            voters: registered - 10,
            blank_or_invalid: 1,
        }
    }

    fn decoded() -> DecodedExtract {
        DecodedExtract {
            num_candidate_blocks: 2,
            departments: vec![DepartmentRow {
                code: "03".to_string(),
                name: "Allier".to_string(),
            }],
            stats: vec![stats("03", 100), stats("2A", 50), stats("01", 80)],
            results: vec![
                result("03", "ZOLA", "Emile", 3),
                result("2A", "ZOLA", "Emile", 2),
                result("01", "ZOLA", "Emile", 1),
                result("03", "ARNAUD", "Marie", 30),
                result("2A", "ARNAUD", "Marie", 20),
                result("01", "ARNAUD", "Marie", 10),
            ],
        }
    }

    #[test]
    fn candidates_are_unique_and_sorted() {
        let names: Vec<String> = decoded()
            .candidates()
            .into_iter()
            .map(|c| c.surname)
            .collect();
        assert_eq!(names, vec!["ARNAUD", "ZOLA"]);
    }

    #[test]
    fn votes_sorted_by_department() {
        let votes = decoded().votes_by_department("ZOLA", "Emile");
        let codes: Vec<&str> = votes.iter().map(|v| v.department_code.as_str()).collect();
        assert_eq!(codes, vec!["01", "2A", "03"]);
        assert_eq!(votes[1].votes, Cell::Int(2));
        assert!(decoded().votes_by_department("ZOLA", "Nana").is_empty());
    }

    #[test]
    fn stats_lookup_normalizes_code() {
        let d = decoded();
        assert_eq!(d.stats_for_department("1").map(|s| s.registered), Some(80));
        assert_eq!(d.stats_for_department("2a").map(|s| s.registered), Some(50));
        assert_eq!(d.stats_for_department("95"), None);
    }

    #[test]
    fn summary_for_one_candidate() {
        let summary = decoded().department_summary("3", "ARNAUD", "Marie").unwrap();
        assert_eq!(summary.stats.registered, 100);
        assert_eq!(summary.votes, Cell::Int(30));
        assert_eq!(decoded().department_summary("03", "DOE", "John"), None);
    }
}
