//! Stability audit.
//!
//! A blocking pair is a student `s` and a school `e`, not matched to each
//! other, where `s` prefers `e` to its current school and `e` prefers `s` to
//! its current student. Being unmatched is worse than any partner.

use crate::measures::{MeasureError, ResolvedMatching};
use crate::models::instance::Instance;
use crate::models::matching::Matching;
use serde::{Deserialize, Serialize};

/// A student and a school that would both leave their partners for each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingPair {
    pub student: String,
    pub school: String,
}

/// Every blocking pair, students in instance order
pub fn blocking_pairs(instance: &Instance, matching: &Matching) -> Result<Vec<BlockingPair>, MeasureError> {
    let resolved = ResolvedMatching::resolve(instance, matching)?;
    let mut pairs = Vec::new();

    for student in 0..instance.len() {
        let held = resolved.student_to_school[student];
        for &school in instance.student_pref_indices(student) {
            if Some(school) == held {
                break;
            }
            let school_prefers = match resolved.school_to_student[school] {
                Some(current) => instance.school_rank(school, student) < instance.school_rank(school, current),
                None => true,
            };
            if school_prefers {
                pairs.push(BlockingPair {
                    student: instance.student_id(student).to_string(),
                    school: instance.school_id(school).to_string(),
                });
            }
        }
    }

    Ok(pairs)
}

/// True when the matching has no blocking pair
pub fn is_stable(instance: &Instance, matching: &Matching) -> Result<bool, MeasureError> {
    blocking_pairs(instance, matching).map(|pairs| pairs.is_empty())
}
