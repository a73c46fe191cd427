//! Tests for matching measures
//!
//! Exact values on hand-checked instances, the Pareto witness, stability
//! audit, and idempotence.

use stable_match_core_rs::engine::solve;
use stable_match_core_rs::generator::{PreferenceGenerator, RandomPreferenceGenerator};
use stable_match_core_rs::measures::{
    blocking_pairs, compute_measures, compute_ranks, egalitarian_cost, is_pareto_optimal,
    is_stable, mean_rank, pareto_witness, satisfaction, welfare, BlockingPair, MeasureError,
    ParetoWitness,
};
use stable_match_core_rs::{Instance, Matching, Side};

// ============================================================================
// Test Helpers
// ============================================================================

fn aligned_instance() -> Instance {
    Instance::from_rows(
        [("A", ["X", "Y"]), ("B", ["Y", "X"])],
        [("X", ["A", "B"]), ("Y", ["B", "A"])],
    )
    .unwrap()
}

fn conflict_instance() -> Instance {
    Instance::from_rows(
        [("A", ["X", "Y"]), ("B", ["X", "Y"])],
        [("X", ["B", "A"]), ("Y", ["A", "B"])],
    )
    .unwrap()
}

/// Matching X-B, Y-A, Z-C: A and X, and B and Y, would both rather swap
fn three_by_three() -> (Instance, Matching) {
    let instance = Instance::from_rows(
        [("A", ["X", "Y", "Z"]), ("B", ["Y", "X", "Z"]), ("C", ["Z", "X", "Y"])],
        [("X", ["A", "B", "C"]), ("Y", ["B", "A", "C"]), ("Z", ["C", "A", "B"])],
    )
    .unwrap();
    let matching = Matching::from_pairs([("X", Some("B")), ("Y", Some("A")), ("Z", Some("C"))]);
    (instance, matching)
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_first_choice_scenario() {
    let instance = aligned_instance();
    let matching = solve(&instance).unwrap();

    let measures = compute_measures(&instance, &matching).unwrap();

    assert_eq!(measures.egalitarian_cost, 0);
    assert_eq!(measures.welfare, 4.0);
    assert_eq!(measures.avg_rank_students, 0.0);
    assert_eq!(measures.avg_rank_schools, 0.0);
    assert_eq!(measures.avg_score_students, 1.0);
    assert_eq!(measures.avg_score_schools, 1.0);
    assert!(measures.pareto_optimal);
}

#[test]
fn test_conflict_scenario() {
    let instance = conflict_instance();
    let matching = solve(&instance).unwrap();

    let measures = compute_measures(&instance, &matching).unwrap();

    assert_eq!(measures.ranks.students.get("A"), Some(&1));
    assert_eq!(measures.ranks.students.get("B"), Some(&0));
    assert_eq!(measures.avg_rank_students, 0.5);
    assert_eq!(measures.avg_rank_schools, 0.0);
    assert_eq!(measures.egalitarian_cost, 1);
    assert_eq!(measures.egalitarian_cost_students, 1);
    assert_eq!(measures.egalitarian_cost_schools, 0);
    assert_eq!(measures.welfare, 3.0);
    assert_eq!(measures.welfare_students, 1.0);
    assert_eq!(measures.welfare_schools, 2.0);
    assert_eq!(measures.avg_score_students, 0.5);
    assert!(measures.pareto_optimal);
}

#[test]
fn test_single_agent_satisfaction_is_one() {
    let instance = Instance::from_rows([("A", ["X"])], [("X", ["A"])]).unwrap();
    let matching = solve(&instance).unwrap();

    let measures = compute_measures(&instance, &matching).unwrap();

    assert_eq!(measures.welfare, 2.0);
    assert_eq!(measures.avg_score_students, 1.0);
    assert!(measures.pareto_optimal);
}

// ============================================================================
// Pareto and stability
// ============================================================================

#[test]
fn test_three_by_three_not_pareto_optimal() {
    let (instance, matching) = three_by_three();

    assert!(!is_pareto_optimal(&instance, &matching).unwrap());
    assert_eq!(
        pareto_witness(&instance, &matching).unwrap(),
        Some(ParetoWitness {
            school: "X".to_string(),
            student: "A".to_string()
        })
    );

    let measures = compute_measures(&instance, &matching).unwrap();
    assert!(!measures.pareto_optimal);
}

#[test]
fn test_three_by_three_blocking_pairs() {
    let (instance, matching) = three_by_three();

    let pairs = blocking_pairs(&instance, &matching).unwrap();

    assert_eq!(
        pairs,
        vec![
            BlockingPair {
                student: "A".to_string(),
                school: "X".to_string()
            },
            BlockingPair {
                student: "B".to_string(),
                school: "Y".to_string()
            },
        ]
    );
    assert!(!is_stable(&instance, &matching).unwrap());
}

#[test]
fn test_engine_result_on_three_by_three_is_pareto() {
    let (instance, _) = three_by_three();
    let matching = solve(&instance).unwrap();

    assert_eq!(matching.student_for("X"), Some("A"));
    assert_eq!(matching.student_for("Y"), Some("B"));
    assert_eq!(matching.student_for("Z"), Some("C"));
    assert!(is_pareto_optimal(&instance, &matching).unwrap());
}

// ============================================================================
// Building blocks
// ============================================================================

#[test]
fn test_helpers_agree_with_record() {
    let instance = PreferenceGenerator::generate(&RandomPreferenceGenerator::new(3), 0, 8).unwrap();
    let matching = solve(&instance).unwrap();

    let ranks = compute_ranks(&instance, &matching).unwrap();
    let measures = compute_measures(&instance, &matching).unwrap();

    assert_eq!(ranks, measures.ranks);
    assert_eq!(egalitarian_cost(&ranks), measures.egalitarian_cost);
    assert_eq!(mean_rank(&ranks.students), measures.avg_rank_students);
    assert!((welfare(&ranks, 8) - measures.welfare).abs() < 1e-12);
}

#[test]
fn test_satisfaction_scale() {
    assert_eq!(satisfaction(0, 3), 1.0);
    assert_eq!(satisfaction(1, 3), 0.5);
    assert_eq!(satisfaction(2, 3), 0.0);
}

#[test]
fn test_measures_are_idempotent() {
    for seed in 0..10 {
        let instance = PreferenceGenerator::generate(&RandomPreferenceGenerator::new(seed), 0, 6).unwrap();
        let matching = solve(&instance).unwrap();

        let first = compute_measures(&instance, &matching).unwrap();
        let second = compute_measures(&instance, &matching).unwrap();

        assert_eq!(first, second);
    }
}

#[test]
fn test_measures_bounds() {
    for seed in 0..10 {
        let n = 5;
        let instance = PreferenceGenerator::generate(&RandomPreferenceGenerator::new(seed), 1, n).unwrap();
        let matching = solve(&instance).unwrap();

        let measures = compute_measures(&instance, &matching).unwrap();

        assert!(measures.avg_rank_students <= (n - 1) as f64);
        assert!(measures.egalitarian_cost <= 2 * n * (n - 1));
        assert!(measures.welfare >= 0.0 && measures.welfare <= 2.0 * n as f64);
        assert!(measures.avg_score_schools >= 0.0 && measures.avg_score_schools <= 1.0);
    }
}

// ============================================================================
// Invalid matchings
// ============================================================================

#[test]
fn test_unknown_student_rejected() {
    let instance = aligned_instance();
    let matching = Matching::from_pairs([("X", Some("A")), ("Y", Some("Q"))]);

    assert_eq!(
        compute_measures(&instance, &matching).unwrap_err(),
        MeasureError::UnknownAgent {
            side: Side::Student,
            id: "Q".to_string()
        }
    );
}

#[test]
fn test_school_listed_twice_rejected() {
    let instance = aligned_instance();
    let matching = Matching::from_pairs([("X", Some("A")), ("X", Some("B"))]);

    assert_eq!(
        compute_measures(&instance, &matching).unwrap_err(),
        MeasureError::SchoolListedTwice {
            school: "X".to_string()
        }
    );
}

#[test]
fn test_empty_matching_measures() {
    let instance = aligned_instance();
    let matching = Matching::from_pairs(Vec::<(&str, Option<&str>)>::new());

    let measures = compute_measures(&instance, &matching).unwrap();

    assert_eq!(measures.avg_rank_students, 0.0);
    assert_eq!(measures.egalitarian_cost, 0);
    assert_eq!(measures.welfare, 0.0);
    assert_eq!(measures.avg_score_students, 0.0);
    assert!(!measures.pareto_optimal, "An unmatched school with an unmatched student can improve");
}
