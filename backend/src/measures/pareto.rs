//! Pareto verdict, scanned from the schools' side.
//!
//! For each school `e` holding `cur`, walk `e`'s list from the top down to
//! (not including) `cur`. Every student `s` met on the way is one `e` would
//! rather have. If `s` in turn ranks `e` strictly above its own current
//! school, the two can both improve and the matching is not Pareto-optimal.
//!
//! An unmatched school scans its whole list, and an unmatched student ranks
//! any school above having none. This goes beyond a scan of matched schools
//! only; both agree on complete matchings.
//!
//! The scan runs from the schools' side only. It is not mirrored from the
//! students' side; results must stay comparable with earlier batches.

use crate::measures::{MeasureError, ResolvedMatching};
use crate::models::instance::Instance;
use crate::models::matching::Matching;
use serde::{Deserialize, Serialize};

/// A school and a student that would both gain by being matched together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParetoWitness {
    pub school: String,
    pub student: String,
}

/// First improving (school, student) pair, in school order
pub fn pareto_witness(
    instance: &Instance,
    matching: &Matching,
) -> Result<Option<ParetoWitness>, MeasureError> {
    let resolved = ResolvedMatching::resolve(instance, matching)?;
    Ok(witness_in(instance, &resolved))
}

/// True when no improving pair exists
pub fn is_pareto_optimal(instance: &Instance, matching: &Matching) -> Result<bool, MeasureError> {
    pareto_witness(instance, matching).map(|w| w.is_none())
}

pub(crate) fn witness_in(instance: &Instance, resolved: &ResolvedMatching) -> Option<ParetoWitness> {
    for (school, &current) in resolved.school_to_student.iter().enumerate() {
        for &student in instance.school_pref_indices(school) {
            if Some(student) == current {
                break;
            }

            let improves = match resolved.student_to_school[student] {
                Some(held) => instance.student_rank(student, school) < instance.student_rank(student, held),
                None => true,
            };
            if improves {
                return Some(ParetoWitness {
                    school: instance.school_id(school).to_string(),
                    student: instance.student_id(student).to_string(),
                });
            }
        }
    }
    None
}
