//! CSV tables.
//!
//! | Table    | Columns                                  |
//! |----------|------------------------------------------|
//! | matching | `school,student` (empty when unmatched)  |
//! | ranks    | `side,agent,rank`                        |
//! | series   | one column per [`TrialRow`] field        |
//! | trace    | `step,student,school,outcome,other`      |

use crate::batch::series::{TrialRow, TrialSeries};
use crate::export::ExportError;
use crate::measures::AchievedRanks;
use crate::models::event::StepTrace;
use crate::models::instance::Side;
use crate::models::matching::Matching;
use std::io;

/// One row per school, in instance order
pub fn write_matching_csv<W: io::Write>(writer: W, matching: &Matching) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["school", "student"])?;

    for assignment in matching.assignments() {
        wtr.write_record([
            assignment.school.as_str(),
            assignment.student.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Student ranks first, then school ranks, each sorted by agent id
pub fn write_ranks_csv<W: io::Write>(writer: W, ranks: &AchievedRanks) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["side", "agent", "rank"])?;

    for (side, table) in [(Side::Student, &ranks.students), (Side::School, &ranks.schools)] {
        for (agent, rank) in table {
            wtr.write_record([side.to_string(), agent.clone(), rank.to_string()])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// One row per successful trial; the header is written even when empty
pub fn write_series_csv<W: io::Write>(writer: W, series: &TrialSeries) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(TRIAL_ROW_COLUMNS)?;
    for row in series.rows() {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Field order of [`TrialRow`]
const TRIAL_ROW_COLUMNS: [&str; 14] = [
    "trial",
    "fingerprint",
    "proposals",
    "avg_rank_students",
    "avg_rank_schools",
    "egalitarian_cost",
    "welfare",
    "pareto_optimal",
    "egalitarian_cost_students",
    "egalitarian_cost_schools",
    "welfare_students",
    "welfare_schools",
    "avg_score_students",
    "avg_score_schools",
];

/// One row per proposal; `other` is the kept or displaced incumbent
pub fn write_trace_csv<W: io::Write>(writer: W, trace: &StepTrace) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["step", "student", "school", "outcome", "other"])?;

    for record in trace.steps() {
        wtr.write_record([
            record.step.to_string().as_str(),
            record.student.as_str(),
            record.school.as_str(),
            record.event_type(),
            record.outcome.other_student().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ExportError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_matching_csv_leaves_unmatched_empty() {
        let matching = Matching::from_pairs([("X", Some("A")), ("Y", None)]);

        let out = to_string(|buf| write_matching_csv(buf, &matching));

        assert_eq!(out, "school,student\nX,A\nY,\n");
    }

    #[test]
    fn test_empty_series_has_header_only() {
        let out = to_string(|buf| write_series_csv(buf, &TrialSeries::new()));

        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("trial,fingerprint,proposals,"));
    }

    #[test]
    fn test_header_matches_row_fields() {
        let row = TrialRow {
            trial: 0,
            fingerprint: "abc".to_string(),
            proposals: 3,
            avg_rank_students: 0.5,
            avg_rank_schools: 0.5,
            egalitarian_cost: 2,
            welfare: 3.0,
            pareto_optimal: true,
            egalitarian_cost_students: 1,
            egalitarian_cost_schools: 1,
            welfare_students: 1.5,
            welfare_schools: 1.5,
            avg_score_students: 0.75,
            avg_score_schools: 0.75,
        };
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(&row).unwrap();
        let derived = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

        assert_eq!(derived.lines().next().unwrap(), TRIAL_ROW_COLUMNS.join(","));
    }

    #[test]
    fn test_ranks_csv_rows() {
        let mut ranks = AchievedRanks::default();
        ranks.students.insert("A".to_string(), 1);
        ranks.schools.insert("X".to_string(), 0);

        let out = to_string(|buf| write_ranks_csv(buf, &ranks));

        assert_eq!(out, "side,agent,rank\nstudent,A,1\nschool,X,0\n");
    }
}
