//! Tests for preference instance validation
//!
//! An Instance can only exist when every precondition holds: equal side
//! sizes, one complete strict list per agent, unique ids.

use stable_match_core_rs::{Instance, InstanceData, InstanceError, Side};
use std::collections::BTreeMap;

// ============================================================================
// Test Helpers
// ============================================================================

fn rows(data: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    data.iter()
        .map(|(name, prefs)| {
            (
                name.to_string(),
                prefs.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

fn names(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn valid_students() -> Vec<(String, Vec<String>)> {
    rows(&[("A", &["X", "Y"]), ("B", &["Y", "X"])])
}

fn valid_schools() -> Vec<(String, Vec<String>)> {
    rows(&[("X", &["A", "B"]), ("Y", &["B", "A"])])
}

fn build(
    students: Vec<(String, Vec<String>)>,
    schools: Vec<(String, Vec<String>)>,
) -> Result<Instance, InstanceError> {
    Instance::from_rows(students, schools)
}

// ============================================================================
// Valid instances
// ============================================================================

#[test]
fn test_valid_instance_keeps_row_order() {
    let instance = build(valid_students(), valid_schools()).unwrap();

    assert_eq!(instance.len(), 2);
    assert_eq!(instance.students(), ["A", "B"]);
    assert_eq!(instance.schools(), ["X", "Y"]);
    assert_eq!(instance.agents(Side::School), ["X", "Y"]);
}

#[test]
fn test_empty_instance_is_valid() {
    let instance = build(Vec::new(), Vec::new()).unwrap();

    assert!(instance.is_empty());
}

#[test]
fn test_rank_of_both_sides() {
    let instance = build(valid_students(), valid_schools()).unwrap();

    assert_eq!(instance.rank_of(Side::Student, "B", "Y"), Some(0));
    assert_eq!(instance.rank_of(Side::Student, "B", "X"), Some(1));
    assert_eq!(instance.rank_of(Side::School, "X", "B"), Some(1));
    assert_eq!(instance.rank_of(Side::School, "Q", "B"), None);
}

#[test]
fn test_new_with_mappings_in_any_order() {
    let mut prefs_students = BTreeMap::new();
    prefs_students.insert("B".to_string(), names(&["Y", "X"]));
    prefs_students.insert("A".to_string(), names(&["X", "Y"]));

    let instance = Instance::new(
        names(&["B", "A"]),
        names(&["X", "Y"]),
        prefs_students,
        valid_schools(),
    )
    .unwrap();

    assert_eq!(instance.students(), ["B", "A"], "Agent order comes from the list, not the mapping");
    assert_eq!(instance.preferences(Side::Student, "B"), Some(vec!["Y", "X"]));
}

// ============================================================================
// Precondition violations
// ============================================================================

#[test]
fn test_size_mismatch() {
    let err = build(
        valid_students(),
        rows(&[("X", &["A", "B"]), ("Y", &["B", "A"]), ("Z", &["A", "B"])]),
    )
    .unwrap_err();

    assert_eq!(err, InstanceError::SizeMismatch { students: 2, schools: 3 });
}

#[test]
fn test_duplicate_agent() {
    let err = build(
        rows(&[("A", &["X", "Y"]), ("A", &["Y", "X"])]),
        valid_schools(),
    )
    .unwrap_err();

    assert_eq!(
        err,
        InstanceError::DuplicateAgent {
            side: Side::Student,
            id: "A".to_string()
        }
    );
}

#[test]
fn test_missing_preferences() {
    let err = Instance::new(
        names(&["A", "B"]),
        names(&["X", "Y"]),
        rows(&[("A", &["X", "Y"])]),
        valid_schools(),
    )
    .unwrap_err();

    assert_eq!(
        err,
        InstanceError::MissingPreferences {
            side: Side::Student,
            id: "B".to_string()
        }
    );
}

#[test]
fn test_unexpected_preferences() {
    let err = Instance::new(
        names(&["A", "B"]),
        names(&["X", "Y"]),
        valid_students(),
        rows(&[("X", &["A", "B"]), ("Y", &["B", "A"]), ("Z", &["A", "B"])]),
    )
    .unwrap_err();

    assert_eq!(
        err,
        InstanceError::UnexpectedPreferences {
            side: Side::School,
            id: "Z".to_string()
        }
    );
}

#[test]
fn test_wrong_length() {
    let err = build(rows(&[("A", &["X"]), ("B", &["Y", "X"])]), valid_schools()).unwrap_err();

    assert_eq!(
        err,
        InstanceError::WrongLength {
            side: Side::Student,
            id: "A".to_string(),
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn test_unknown_entry() {
    let err = build(valid_students(), rows(&[("X", &["A", "C"]), ("Y", &["B", "A"])])).unwrap_err();

    assert_eq!(
        err,
        InstanceError::UnknownEntry {
            side: Side::School,
            id: "X".to_string(),
            entry: "C".to_string()
        }
    );
}

#[test]
fn test_duplicate_entry() {
    let err = build(rows(&[("A", &["X", "X"]), ("B", &["Y", "X"])]), valid_schools()).unwrap_err();

    assert_eq!(
        err,
        InstanceError::DuplicateEntry {
            side: Side::Student,
            id: "A".to_string(),
            entry: "X".to_string()
        }
    );
}

// ============================================================================
// Serialization and fingerprint
// ============================================================================

#[test]
fn test_json_round_trip_revalidates() {
    let instance = build(valid_students(), valid_schools()).unwrap();

    let json = serde_json::to_string(&instance).unwrap();
    let back: Instance = serde_json::from_str(&json).unwrap();

    assert_eq!(back, instance);
}

#[test]
fn test_json_with_broken_list_rejected() {
    let mut data: InstanceData = build(valid_students(), valid_schools()).unwrap().to_data();
    data.prefs_schools.insert("X".to_string(), names(&["A", "A"]));

    let json = serde_json::to_string(&data).unwrap();
    let result: Result<Instance, _> = serde_json::from_str(&json);

    assert!(result.is_err(), "Deserialization must re-validate");
}

#[test]
fn test_fingerprint_changes_with_preferences() {
    let a = build(valid_students(), valid_schools()).unwrap();
    let b = build(valid_students(), rows(&[("X", &["B", "A"]), ("Y", &["B", "A"])])).unwrap();

    assert_eq!(a.fingerprint().len(), 64);
    assert_ne!(a.fingerprint(), b.fingerprint());
}
