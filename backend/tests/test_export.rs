//! Tests for CSV / JSON export and the instance file format

use stable_match_core_rs::batch::{BatchConfig, BatchReport, BatchRunner};
use stable_match_core_rs::engine::{run, TraceMode};
use stable_match_core_rs::export::{
    read_instance_csv, to_json_pretty, write_instance_csv, write_json, write_matching_csv,
    write_ranks_csv, write_series_csv, write_trace_csv, ExportError,
};
use stable_match_core_rs::generator::{PreferenceGenerator, RandomPreferenceGenerator};
use stable_match_core_rs::measures::compute_measures;
use stable_match_core_rs::{Instance, Measures, Side};

// ============================================================================
// Test Helpers
// ============================================================================

fn conflict_instance() -> Instance {
    Instance::from_rows(
        [("A", ["X", "Y"]), ("B", ["X", "Y"])],
        [("X", ["B", "A"]), ("Y", ["A", "B"])],
    )
    .unwrap()
}

fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ExportError>) -> String {
    let mut buf = Vec::new();
    f(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

// ============================================================================
// Instance file
// ============================================================================

#[test]
fn test_instance_csv_layout() {
    let out = render(|buf| write_instance_csv(buf, &conflict_instance()));

    assert_eq!(
        out,
        "Type,Name,Preferences\n\
         Student,A,X - Y\n\
         Student,B,X - Y\n\
         School,X,B - A\n\
         School,Y,A - B\n"
    );
}

#[test]
fn test_instance_csv_round_trip() {
    let original = PreferenceGenerator::generate(&RandomPreferenceGenerator::new(11), 0, 7).unwrap();

    let out = render(|buf| write_instance_csv(buf, &original));
    let back = read_instance_csv(out.as_bytes()).unwrap();

    assert_eq!(back, original);
    assert_eq!(back.fingerprint(), original.fingerprint());
}

#[test]
fn test_instance_csv_with_real_names() {
    let data = "Type,Name,Preferences\n\
                Student,Jean-Paul,Lycee Hoche - College Curie\n\
                Student,Anne,College Curie - Lycee Hoche\n\
                School,Lycee Hoche,Anne - Jean-Paul\n\
                School,College Curie,Jean-Paul - Anne\n";

    let instance = read_instance_csv(data.as_bytes()).unwrap();

    assert_eq!(instance.students(), ["Jean-Paul", "Anne"]);
    assert_eq!(instance.rank_of(Side::School, "Lycee Hoche", "Jean-Paul"), Some(1));
}

#[test]
fn test_instance_csv_missing_name() {
    let data = "Type,Name,Preferences\nStudent,,X\n";

    let err = read_instance_csv(data.as_bytes()).unwrap_err();

    assert!(matches!(err, ExportError::MalformedRow { line: 2, .. }));
}

// ============================================================================
// Result tables
// ============================================================================

#[test]
fn test_matching_and_trace_tables() {
    let outcome = run(&conflict_instance(), TraceMode::Enabled).unwrap();

    let matching = render(|buf| write_matching_csv(buf, &outcome.matching));
    assert_eq!(matching, "school,student\nX,B\nY,A\n");

    let trace = render(|buf| write_trace_csv(buf, outcome.trace.as_ref().unwrap()));
    assert_eq!(
        trace,
        "step,student,school,outcome,other\n\
         1,A,X,Accepted,\n\
         2,B,X,Displaced,A\n\
         3,A,Y,Accepted,\n"
    );
}

#[test]
fn test_ranks_table() {
    let instance = conflict_instance();
    let outcome = run(&instance, TraceMode::Disabled).unwrap();
    let measures = compute_measures(&instance, &outcome.matching).unwrap();

    let out = render(|buf| write_ranks_csv(buf, &measures.ranks));

    assert_eq!(
        out,
        "side,agent,rank\nstudent,A,1\nstudent,B,0\nschool,X,0\nschool,Y,0\n"
    );
}

#[test]
fn test_series_table_one_row_per_trial() {
    let report = BatchRunner::new(BatchConfig {
        num_agents: 4,
        num_trials: 5,
        ..Default::default()
    })
    .unwrap()
    .run(&RandomPreferenceGenerator::new(3));

    let out = render(|buf| write_series_csv(buf, &report.series));
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("trial,fingerprint,proposals,avg_rank_students"));
    assert!(lines[1].starts_with("0,"));
    assert!(lines[5].starts_with("4,"));
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_measures_json_round_trip() {
    let instance = conflict_instance();
    let outcome = run(&instance, TraceMode::Disabled).unwrap();
    let measures = compute_measures(&instance, &outcome.matching).unwrap();

    let json = to_json_pretty(&measures).unwrap();
    let back: Measures = serde_json::from_str(&json).unwrap();

    assert_eq!(back, measures);
}

#[test]
fn test_report_json_round_trip() {
    // n = 2 keeps every float a multiple of 0.5, exact in JSON
    let report = BatchRunner::new(BatchConfig {
        num_agents: 2,
        num_trials: 3,
        ..Default::default()
    })
    .unwrap()
    .run(&RandomPreferenceGenerator::new(3));

    let out = render(|buf| write_json(buf, &report));
    let back: BatchReport = serde_json::from_str(&out).unwrap();

    assert!(out.ends_with('\n'));
    assert_eq!(back, report);
}
