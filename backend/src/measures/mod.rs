//! Measures over a completed matching.
//!
//! All measures are pure functions of `(instance, matching)`:
//!
//! - **Achieved rank**: 0-based position of an agent's partner in its own list
//! - **Average rank**: mean achieved rank of the matched agents of one side
//! - **Egalitarian cost**: sum of every achieved rank, both sides
//! - **Utilitarian welfare**: sum of `1 - rank / (n - 1)` over matched agents
//! - **Average score**: mean of the same satisfaction, per side
//! - **Pareto verdict**: see [`pareto`]
//!
//! Full floating precision is returned; rounding for display is left to the
//! presentation layer.
//!
//! # Example
//!
//! ```rust
//! use stable_match_core_rs::{compute_measures, engine, Instance};
//!
//! let instance = Instance::from_rows(
//!     [("A", ["X", "Y"]), ("B", ["Y", "X"])],
//!     [("X", ["A", "B"]), ("Y", ["B", "A"])],
//! )
//! .unwrap();
//! let matching = engine::solve(&instance).unwrap();
//!
//! let measures = compute_measures(&instance, &matching).unwrap();
//! assert_eq!(measures.egalitarian_cost, 0);
//! assert_eq!(measures.welfare, 4.0);
//! assert!(measures.pareto_optimal);
//! ```

pub mod pareto;
pub mod stability;

use crate::models::instance::{Instance, Side};
use crate::models::matching::Matching;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use pareto::{is_pareto_optimal, pareto_witness, ParetoWitness};
pub use stability::{blocking_pairs, is_stable, BlockingPair};

/// Measure calculation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    #[error("Matching names unknown {side}: {id}")]
    UnknownAgent { side: Side, id: String },

    #[error("Matching lists school {school} more than once")]
    SchoolListedTwice { school: String },

    #[error("Matching assigns student {student} to more than one school")]
    StudentMatchedTwice { student: String },
}

/// Achieved rank of every matched agent, per side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievedRanks {
    pub students: BTreeMap<String, usize>,
    pub schools: BTreeMap<String, usize>,
}

/// Complete measures record for one matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measures {
    /// Per-agent achieved ranks
    pub ranks: AchievedRanks,

    /// Mean achieved rank of matched students (0 = everyone got first choice)
    pub avg_rank_students: f64,

    /// Mean achieved rank of matched schools
    pub avg_rank_schools: f64,

    /// Sum of all achieved ranks, both sides
    pub egalitarian_cost: usize,
    pub egalitarian_cost_students: usize,
    pub egalitarian_cost_schools: usize,

    /// Sum of normalized satisfaction, both sides
    pub welfare: f64,
    pub welfare_students: f64,
    pub welfare_schools: f64,

    /// Mean normalized satisfaction per side (1 = first choice)
    pub avg_score_students: f64,
    pub avg_score_schools: f64,

    /// School-side Pareto verdict
    pub pareto_optimal: bool,
}

/// Index form of a matching, checked against an instance
#[derive(Debug, Clone)]
pub(crate) struct ResolvedMatching {
    pub school_to_student: Vec<Option<usize>>,
    pub student_to_school: Vec<Option<usize>>,
}

impl ResolvedMatching {
    /// Map the names of `matching` onto `instance` indices.
    ///
    /// Schools absent from the matching count as unmatched.
    pub fn resolve(instance: &Instance, matching: &Matching) -> Result<Self, MeasureError> {
        let n = instance.len();
        let mut school_to_student = vec![None; n];
        let mut student_to_school = vec![None; n];
        let mut seen_schools = vec![false; n];

        for assignment in matching.assignments() {
            let school =
                instance
                    .school_idx(&assignment.school)
                    .ok_or_else(|| MeasureError::UnknownAgent {
                        side: Side::School,
                        id: assignment.school.clone(),
                    })?;
            if std::mem::replace(&mut seen_schools[school], true) {
                return Err(MeasureError::SchoolListedTwice {
                    school: assignment.school.clone(),
                });
            }

            let Some(student_id) = assignment.student.as_deref() else {
                continue;
            };
            let student = instance
                .student_idx(student_id)
                .ok_or_else(|| MeasureError::UnknownAgent {
                    side: Side::Student,
                    id: student_id.to_string(),
                })?;
            if student_to_school[student].is_some() {
                return Err(MeasureError::StudentMatchedTwice {
                    student: student_id.to_string(),
                });
            }

            school_to_student[school] = Some(student);
            student_to_school[student] = Some(school);
        }

        Ok(Self {
            school_to_student,
            student_to_school,
        })
    }
}

/// Achieved rank of every matched agent
pub fn compute_ranks(instance: &Instance, matching: &Matching) -> Result<AchievedRanks, MeasureError> {
    let resolved = ResolvedMatching::resolve(instance, matching)?;
    Ok(ranks_from_resolved(instance, &resolved))
}

fn ranks_from_resolved(instance: &Instance, resolved: &ResolvedMatching) -> AchievedRanks {
    let students = resolved
        .student_to_school
        .iter()
        .enumerate()
        .filter_map(|(s, school)| {
            school.map(|e| (instance.student_id(s).to_string(), instance.student_rank(s, e)))
        })
        .collect();

    let schools = resolved
        .school_to_student
        .iter()
        .enumerate()
        .filter_map(|(e, student)| {
            student.map(|s| (instance.school_id(e).to_string(), instance.school_rank(e, s)))
        })
        .collect();

    AchievedRanks { students, schools }
}

/// Mean of the ranks, 0.0 when empty
pub fn mean_rank(ranks: &BTreeMap<String, usize>) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    ranks.values().sum::<usize>() as f64 / ranks.len() as f64
}

/// Sum of all achieved ranks on both sides
pub fn egalitarian_cost(ranks: &AchievedRanks) -> usize {
    ranks.students.values().sum::<usize>() + ranks.schools.values().sum::<usize>()
}

/// Normalized satisfaction of one agent: 1.0 for first choice, 0.0 for last.
///
/// With a single agent per side every rank is 0 and the satisfaction is 1.0.
pub fn satisfaction(rank: usize, n: usize) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    1.0 - rank as f64 / (n - 1) as f64
}

/// Sum of satisfactions over both sides
pub fn welfare(ranks: &AchievedRanks, n: usize) -> f64 {
    side_welfare(&ranks.students, n) + side_welfare(&ranks.schools, n)
}

fn side_welfare(ranks: &BTreeMap<String, usize>, n: usize) -> f64 {
    ranks.values().map(|&r| satisfaction(r, n)).sum()
}

fn side_score(ranks: &BTreeMap<String, usize>, n: usize) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    if ranks.is_empty() {
        return 0.0;
    }
    side_welfare(ranks, n) / ranks.len() as f64
}

/// Compute every measure for `matching` over `instance`.
///
/// # Errors
///
/// Returns [`MeasureError`] if the matching names agents that are not part of
/// the instance or is not one-to-one.
pub fn compute_measures(instance: &Instance, matching: &Matching) -> Result<Measures, MeasureError> {
    let n = instance.len();
    let resolved = ResolvedMatching::resolve(instance, matching)?;
    let ranks = ranks_from_resolved(instance, &resolved);

    let egalitarian_cost_students = ranks.students.values().sum();
    let egalitarian_cost_schools = ranks.schools.values().sum();
    let welfare_students = side_welfare(&ranks.students, n);
    let welfare_schools = side_welfare(&ranks.schools, n);

    Ok(Measures {
        avg_rank_students: mean_rank(&ranks.students),
        avg_rank_schools: mean_rank(&ranks.schools),
        egalitarian_cost: egalitarian_cost_students + egalitarian_cost_schools,
        egalitarian_cost_students,
        egalitarian_cost_schools,
        welfare: welfare_students + welfare_schools,
        welfare_students,
        welfare_schools,
        avg_score_students: side_score(&ranks.students, n),
        avg_score_schools: side_score(&ranks.schools, n),
        pareto_optimal: pareto::witness_in(instance, &resolved).is_none(),
        ranks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_satisfaction_bounds() {
        assert_eq!(satisfaction(0, 5), 1.0);
        assert_eq!(satisfaction(4, 5), 0.0);
        assert_eq!(satisfaction(2, 5), 0.5);
        assert_eq!(satisfaction(0, 1), 1.0);
    }

    #[test]
    fn test_mean_rank_empty_is_zero() {
        assert_eq!(mean_rank(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn test_partial_matching_averages_over_matched_only() {
        let instance = Instance::from_rows(
            [("A", ["X", "Y"]), ("B", ["Y", "X"])],
            [("X", ["B", "A"]), ("Y", ["B", "A"])],
        )
        .unwrap();
        let matching = Matching::from_pairs([("X", Some("A")), ("Y", None)]);

        let measures = compute_measures(&instance, &matching).unwrap();

        assert_eq!(measures.ranks.students.len(), 1);
        assert_eq!(measures.avg_rank_students, 0.0);
        assert_eq!(measures.avg_rank_schools, 1.0);
        assert_eq!(measures.egalitarian_cost, 1);
        assert_eq!(measures.welfare, 1.0);
    }

    #[test]
    fn test_unknown_school_rejected() {
        let instance = Instance::from_rows([("A", ["X"])], [("X", ["A"])]).unwrap();
        let matching = Matching::from_pairs([("Q", Some("A"))]);

        let err = compute_measures(&instance, &matching).unwrap_err();
        assert_eq!(
            err,
            MeasureError::UnknownAgent {
                side: Side::School,
                id: "Q".to_string()
            }
        );
    }

    #[test]
    fn test_student_matched_twice_rejected() {
        let instance = Instance::from_rows(
            [("A", ["X", "Y"]), ("B", ["Y", "X"])],
            [("X", ["B", "A"]), ("Y", ["B", "A"])],
        )
        .unwrap();
        let matching = Matching::from_pairs([("X", Some("A")), ("Y", Some("A"))]);

        assert!(matches!(
            compute_ranks(&instance, &matching),
            Err(MeasureError::StudentMatchedTwice { .. })
        ));
    }
}
