//! Preference instances.
//!
//! An [`Instance`] holds two equal-size sides (students and schools) and one
//! strict, complete preference list per agent over the opposite side.
//!
//! # Critical Invariants
//!
//! 1. Both sides have the same cardinality `n` (one-to-one matching only)
//! 2. Agent identifiers are unique within a side
//! 3. Every preference list is a permutation of the full opposite side
//!
//! The invariants are checked once, at construction. An `Instance` value that
//! exists is always valid; deserialization goes through the same checks.
//!
//! # Example
//!
//! ```rust
//! use stable_match_core_rs::Instance;
//!
//! let instance = Instance::from_rows(
//!     [("A", ["X", "Y"]), ("B", ["Y", "X"])],
//!     [("X", ["A", "B"]), ("Y", ["B", "A"])],
//! )
//! .unwrap();
//!
//! assert_eq!(instance.len(), 2);
//! assert_eq!(instance.rank_of(stable_match_core_rs::Side::School, "Y", "B"), Some(0));
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// One side of the two-sided market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Student,
    School,
}

impl Side {
    /// The side an agent of this side ranks
    pub fn opposite(self) -> Side {
        match self {
            Side::Student => Side::School,
            Side::School => Side::Student,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Student => write!(f, "student"),
            Side::School => write!(f, "school"),
        }
    }
}

/// Precondition violations detected while building an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("Side size mismatch: {students} students, {schools} schools")]
    SizeMismatch { students: usize, schools: usize },

    #[error("Duplicate {side} identifier: {id}")]
    DuplicateAgent { side: Side, id: String },

    #[error("Missing preference list for {side} {id}")]
    MissingPreferences { side: Side, id: String },

    #[error("Preference list given for unknown {side} {id}")]
    UnexpectedPreferences { side: Side, id: String },

    #[error("Preference list for {side} {id} given twice")]
    DuplicatePreferences { side: Side, id: String },

    #[error("Preference list of {side} {id} has {actual} entries, expected {expected}")]
    WrongLength {
        side: Side,
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Preference list of {side} {id} names unknown agent {entry}")]
    UnknownEntry { side: Side, id: String, entry: String },

    #[error("Preference list of {side} {id} ranks {entry} more than once")]
    DuplicateEntry { side: Side, id: String, entry: String },
}

/// Plain-data form of an instance: agent lists plus one preference mapping
/// per side. This is the shape external generators hand over and the shape
/// used for (de)serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceData {
    pub students: Vec<String>,
    pub schools: Vec<String>,
    pub prefs_students: BTreeMap<String, Vec<String>>,
    pub prefs_schools: BTreeMap<String, Vec<String>>,
}

/// Validated preference instance.
///
/// Agents are stored in the order they were given; that order is the FIFO
/// order the matching engine uses for its initial free queue. Preferences are
/// kept as indices into the opposite side, with pre-computed rank tables so
/// "where does X sit in Y's list" is O(1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InstanceData", into = "InstanceData")]
pub struct Instance {
    students: Vec<String>,
    schools: Vec<String>,
    student_index: HashMap<String, usize>,
    school_index: HashMap<String, usize>,
    /// student -> school indices, most preferred first
    student_prefs: Vec<Vec<usize>>,
    /// school -> student indices, most preferred first
    school_prefs: Vec<Vec<usize>>,
    /// student_rank[s][e] = position of school e in student s's list
    student_rank: Vec<Vec<usize>>,
    /// school_rank[e][s] = position of student s in school e's list
    school_rank: Vec<Vec<usize>>,
}

impl Instance {
    /// Build an instance from the two agent lists and the two preference
    /// mappings.
    ///
    /// # Errors
    ///
    /// Returns an [`InstanceError`] for any precondition violation. Nothing
    /// is built in that case.
    pub fn new<S, E>(
        students: Vec<String>,
        schools: Vec<String>,
        prefs_students: S,
        prefs_schools: E,
    ) -> Result<Self, InstanceError>
    where
        S: IntoIterator<Item = (String, Vec<String>)>,
        E: IntoIterator<Item = (String, Vec<String>)>,
    {
        if students.len() != schools.len() {
            return Err(InstanceError::SizeMismatch {
                students: students.len(),
                schools: schools.len(),
            });
        }

        let student_index = index_side(Side::Student, &students)?;
        let school_index = index_side(Side::School, &schools)?;

        let student_prefs = resolve_lists(
            Side::Student,
            &students,
            &student_index,
            &school_index,
            prefs_students,
        )?;
        let school_prefs = resolve_lists(
            Side::School,
            &schools,
            &school_index,
            &student_index,
            prefs_schools,
        )?;

        let student_rank = rank_table(&student_prefs);
        let school_rank = rank_table(&school_prefs);

        Ok(Self {
            students,
            schools,
            student_index,
            school_index,
            student_prefs,
            school_prefs,
            student_rank,
            school_rank,
        })
    }

    /// Build an instance from ordered `(agent, preferences)` rows.
    ///
    /// Agent order on each side is the row order.
    pub fn from_rows<S, E, N1, P1, M1, N2, P2, M2>(
        student_rows: S,
        school_rows: E,
    ) -> Result<Self, InstanceError>
    where
        S: IntoIterator<Item = (N1, P1)>,
        E: IntoIterator<Item = (N2, P2)>,
        N1: Into<String>,
        P1: IntoIterator<Item = M1>,
        M1: Into<String>,
        N2: Into<String>,
        P2: IntoIterator<Item = M2>,
        M2: Into<String>,
    {
        let (students, prefs_students) = split_rows(student_rows);
        let (schools, prefs_schools) = split_rows(school_rows);
        Self::new(students, schools, prefs_students, prefs_schools)
    }

    /// Number of agents per side (`n`)
    pub fn len(&self) -> usize {
        self.students.len()
    }

    /// True when both sides are empty
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Student identifiers in instance order
    pub fn students(&self) -> &[String] {
        &self.students
    }

    /// School identifiers in instance order
    pub fn schools(&self) -> &[String] {
        &self.schools
    }

    /// Agent identifiers of one side
    pub fn agents(&self, side: Side) -> &[String] {
        match side {
            Side::Student => &self.students,
            Side::School => &self.schools,
        }
    }

    /// Preference list of an agent as identifiers, most preferred first
    pub fn preferences(&self, side: Side, id: &str) -> Option<Vec<&str>> {
        let (owner, opposite) = match side {
            Side::Student => (
                &self.student_prefs[*self.student_index.get(id)?],
                &self.schools,
            ),
            Side::School => (
                &self.school_prefs[*self.school_index.get(id)?],
                &self.students,
            ),
        };
        Some(owner.iter().map(|&i| opposite[i].as_str()).collect())
    }

    /// Position (0 = best) of `target` in the list of `owner` on `side`
    pub fn rank_of(&self, side: Side, owner: &str, target: &str) -> Option<usize> {
        match side {
            Side::Student => {
                let s = *self.student_index.get(owner)?;
                let e = *self.school_index.get(target)?;
                Some(self.student_rank[s][e])
            }
            Side::School => {
                let e = *self.school_index.get(owner)?;
                let s = *self.student_index.get(target)?;
                Some(self.school_rank[e][s])
            }
        }
    }

    /// Plain-data copy of the instance
    pub fn to_data(&self) -> InstanceData {
        let expand = |lists: &[Vec<usize>], owners: &[String], opposite: &[String]| {
            owners
                .iter()
                .zip(lists)
                .map(|(owner, list)| {
                    (
                        owner.clone(),
                        list.iter().map(|&i| opposite[i].clone()).collect(),
                    )
                })
                .collect()
        };

        InstanceData {
            students: self.students.clone(),
            schools: self.schools.clone(),
            prefs_students: expand(&self.student_prefs, &self.students, &self.schools),
            prefs_schools: expand(&self.school_prefs, &self.schools, &self.students),
        }
    }

    /// SHA-256 fingerprint of the instance content.
    ///
    /// Preference lists are hashed in sorted agent order, so two instances
    /// with the same preferences share a fingerprint regardless of the order
    /// their agents were listed in.
    pub fn fingerprint(&self) -> String {
        let data = self.to_data();
        let mut hasher = Sha256::new();

        for (tag, prefs) in [("S", &data.prefs_students), ("E", &data.prefs_schools)] {
            for (owner, list) in prefs {
                hasher.update(tag.as_bytes());
                hasher.update([0x1f]);
                hasher.update(owner.as_bytes());
                for entry in list {
                    hasher.update([0x1e]);
                    hasher.update(entry.as_bytes());
                }
                hasher.update([0x1d]);
            }
        }

        format!("{:x}", hasher.finalize())
    }

    // ========================================================================
    // Index-level access (engine and measures)
    // ========================================================================

    pub(crate) fn student_id(&self, student: usize) -> &str {
        &self.students[student]
    }

    pub(crate) fn school_id(&self, school: usize) -> &str {
        &self.schools[school]
    }

    pub(crate) fn student_idx(&self, id: &str) -> Option<usize> {
        self.student_index.get(id).copied()
    }

    pub(crate) fn school_idx(&self, id: &str) -> Option<usize> {
        self.school_index.get(id).copied()
    }

    pub(crate) fn student_pref_indices(&self, student: usize) -> &[usize] {
        &self.student_prefs[student]
    }

    pub(crate) fn school_pref_indices(&self, school: usize) -> &[usize] {
        &self.school_prefs[school]
    }

    /// Rank of `school` in `student`'s list
    pub(crate) fn student_rank(&self, student: usize, school: usize) -> usize {
        self.student_rank[student][school]
    }

    /// Rank of `student` in `school`'s list
    pub(crate) fn school_rank(&self, school: usize, student: usize) -> usize {
        self.school_rank[school][student]
    }
}

impl TryFrom<InstanceData> for Instance {
    type Error = InstanceError;

    fn try_from(data: InstanceData) -> Result<Self, Self::Error> {
        Instance::new(
            data.students,
            data.schools,
            data.prefs_students,
            data.prefs_schools,
        )
    }
}

impl From<Instance> for InstanceData {
    fn from(instance: Instance) -> Self {
        instance.to_data()
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

fn split_rows<I, N, P, M>(rows: I) -> (Vec<String>, Vec<(String, Vec<String>)>)
where
    I: IntoIterator<Item = (N, P)>,
    N: Into<String>,
    P: IntoIterator<Item = M>,
    M: Into<String>,
{
    let rows: Vec<(String, Vec<String>)> = rows
        .into_iter()
        .map(|(name, prefs)| (name.into(), prefs.into_iter().map(Into::into).collect()))
        .collect();
    let names = rows.iter().map(|(name, _)| name.clone()).collect();
    (names, rows)
}

fn index_side(side: Side, names: &[String]) -> Result<HashMap<String, usize>, InstanceError> {
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.clone(), i).is_some() {
            return Err(InstanceError::DuplicateAgent {
                side,
                id: name.clone(),
            });
        }
    }
    Ok(index)
}

fn resolve_lists<I>(
    side: Side,
    owners: &[String],
    owner_index: &HashMap<String, usize>,
    opposite_index: &HashMap<String, usize>,
    prefs: I,
) -> Result<Vec<Vec<usize>>, InstanceError>
where
    I: IntoIterator<Item = (String, Vec<String>)>,
{
    let n = owners.len();
    let mut resolved: Vec<Option<Vec<usize>>> = vec![None; n];

    for (owner, list) in prefs {
        let Some(&slot) = owner_index.get(&owner) else {
            return Err(InstanceError::UnexpectedPreferences { side, id: owner });
        };
        if resolved[slot].is_some() {
            return Err(InstanceError::DuplicatePreferences { side, id: owner });
        }
        if list.len() != n {
            return Err(InstanceError::WrongLength {
                side,
                id: owner,
                expected: n,
                actual: list.len(),
            });
        }

        let mut seen = vec![false; n];
        let mut indices = Vec::with_capacity(n);
        for entry in list {
            let Some(&target) = opposite_index.get(&entry) else {
                return Err(InstanceError::UnknownEntry {
                    side,
                    id: owner,
                    entry,
                });
            };
            if std::mem::replace(&mut seen[target], true) {
                return Err(InstanceError::DuplicateEntry {
                    side,
                    id: owner,
                    entry,
                });
            }
            indices.push(target);
        }
        resolved[slot] = Some(indices);
    }

    resolved
        .into_iter()
        .zip(owners)
        .map(|(list, owner)| {
            list.ok_or_else(|| InstanceError::MissingPreferences {
                side,
                id: owner.clone(),
            })
        })
        .collect()
}

fn rank_table(prefs: &[Vec<usize>]) -> Vec<Vec<usize>> {
    prefs
        .iter()
        .map(|list| {
            let mut ranks = vec![0; list.len()];
            for (rank, &target) in list.iter().enumerate() {
                ranks[target] = rank;
            }
            ranks
        })
        .collect()
}
