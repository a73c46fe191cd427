//! Matchings between schools and students.
//!
//! A [`Matching`] maps every school to at most one student. It is stored as
//! one [`Assignment`] per school, in the order the schools were listed, which
//! is also the row order used for tabular export.

use crate::models::instance::Instance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One school and the student it currently holds (if any)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub school: String,
    pub student: Option<String>,
}

/// School -> student mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matching {
    assignments: Vec<Assignment>,
}

impl Matching {
    /// Build a matching from `(school, student)` pairs.
    ///
    /// # Example
    /// ```
    /// use stable_match_core_rs::Matching;
    ///
    /// let matching = Matching::from_pairs([("X", Some("A")), ("Y", None)]);
    /// assert_eq!(matching.student_for("X"), Some("A"));
    /// assert_eq!(matching.matched_count(), 1);
    /// ```
    pub fn from_pairs<I, E, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, Option<S>)>,
        E: Into<String>,
        S: Into<String>,
    {
        Self {
            assignments: pairs
                .into_iter()
                .map(|(school, student)| Assignment {
                    school: school.into(),
                    student: student.map(Into::into),
                })
                .collect(),
        }
    }

    /// Build from the engine's index form (`engaged[school] = student`)
    pub(crate) fn from_engaged(instance: &Instance, engaged: &[Option<usize>]) -> Self {
        Self {
            assignments: engaged
                .iter()
                .enumerate()
                .map(|(school, student)| Assignment {
                    school: instance.school_id(school).to_string(),
                    student: student.map(|s| instance.student_id(s).to_string()),
                })
                .collect(),
        }
    }

    /// One entry per school
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Number of schools covered by the matching
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Student held by `school`
    pub fn student_for(&self, school: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.school == school)
            .and_then(|a| a.student.as_deref())
    }

    /// School holding `student`
    pub fn school_for(&self, student: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.student.as_deref() == Some(student))
            .map(|a| a.school.as_str())
    }

    /// Matched `(school, student)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignments
            .iter()
            .filter_map(|a| a.student.as_deref().map(|s| (a.school.as_str(), s)))
    }

    /// Number of schools holding a student
    pub fn matched_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.student.is_some()).count()
    }

    /// True when the matching is total and bijective over `instance`:
    /// every school of the instance appears once and holds a distinct
    /// student of the instance.
    pub fn is_complete(&self, instance: &Instance) -> bool {
        if self.assignments.len() != instance.len() {
            return false;
        }

        let mut schools = HashSet::with_capacity(instance.len());
        let mut students = HashSet::with_capacity(instance.len());
        self.assignments.iter().all(|a| {
            let Some(student) = a.student.as_deref() else {
                return false;
            };
            instance.school_idx(&a.school).is_some()
                && instance.student_idx(student).is_some()
                && schools.insert(a.school.as_str())
                && students.insert(student)
        })
    }
}
