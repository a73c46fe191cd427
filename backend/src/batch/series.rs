//! Per-trial series accumulated by the batch runner.
//!
//! The series are stored row-wise (one [`TrialRow`] per successful trial, in
//! trial order) and exposed column-wise for plotting. Rows are only appended
//! by the runner; callers get read-only access.

use crate::measures::Measures;
use serde::{Deserialize, Serialize};

/// Scalar measures of one successful trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRow {
    pub trial: usize,
    pub fingerprint: String,
    pub proposals: usize,
    pub avg_rank_students: f64,
    pub avg_rank_schools: f64,
    pub egalitarian_cost: usize,
    pub welfare: f64,
    pub pareto_optimal: bool,
    pub egalitarian_cost_students: usize,
    pub egalitarian_cost_schools: usize,
    pub welfare_students: f64,
    pub welfare_schools: f64,
    pub avg_score_students: f64,
    pub avg_score_schools: f64,
}

impl TrialRow {
    pub fn from_measures(trial: usize, fingerprint: String, proposals: usize, measures: &Measures) -> Self {
        Self {
            trial,
            fingerprint,
            proposals,
            avg_rank_students: measures.avg_rank_students,
            avg_rank_schools: measures.avg_rank_schools,
            egalitarian_cost: measures.egalitarian_cost,
            welfare: measures.welfare,
            pareto_optimal: measures.pareto_optimal,
            egalitarian_cost_students: measures.egalitarian_cost_students,
            egalitarian_cost_schools: measures.egalitarian_cost_schools,
            welfare_students: measures.welfare_students,
            welfare_schools: measures.welfare_schools,
            avg_score_students: measures.avg_score_students,
            avg_score_schools: measures.avg_score_schools,
        }
    }
}

/// Means over all successful trials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub trials: usize,
    pub mean_avg_rank_students: f64,
    pub mean_avg_rank_schools: f64,
    pub mean_egalitarian_cost: f64,
    pub mean_welfare: f64,
    pub mean_avg_score_students: f64,
    pub mean_avg_score_schools: f64,
    /// Fraction of trials whose matching passed the Pareto check
    pub pareto_rate: f64,
}

/// Accumulated series of a batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialSeries {
    rows: Vec<TrialRow>,
}

impl TrialSeries {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub(crate) fn push(&mut self, row: TrialRow) {
        debug_assert!(self.rows.last().map_or(true, |last| last.trial < row.trial));
        self.rows.push(row);
    }

    /// Number of successful trials
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One row per successful trial, in trial order
    pub fn rows(&self) -> &[TrialRow] {
        &self.rows
    }

    /// Trial index of each entry
    pub fn trials(&self) -> Vec<usize> {
        self.column(|r| r.trial)
    }

    pub fn avg_rank_students(&self) -> Vec<f64> {
        self.column(|r| r.avg_rank_students)
    }

    pub fn avg_rank_schools(&self) -> Vec<f64> {
        self.column(|r| r.avg_rank_schools)
    }

    pub fn egalitarian_cost(&self) -> Vec<usize> {
        self.column(|r| r.egalitarian_cost)
    }

    pub fn welfare(&self) -> Vec<f64> {
        self.column(|r| r.welfare)
    }

    pub fn pareto_optimal(&self) -> Vec<bool> {
        self.column(|r| r.pareto_optimal)
    }

    pub fn welfare_students(&self) -> Vec<f64> {
        self.column(|r| r.welfare_students)
    }

    pub fn welfare_schools(&self) -> Vec<f64> {
        self.column(|r| r.welfare_schools)
    }

    pub fn egalitarian_cost_students(&self) -> Vec<usize> {
        self.column(|r| r.egalitarian_cost_students)
    }

    pub fn egalitarian_cost_schools(&self) -> Vec<usize> {
        self.column(|r| r.egalitarian_cost_schools)
    }

    pub fn avg_score_students(&self) -> Vec<f64> {
        self.column(|r| r.avg_score_students)
    }

    pub fn avg_score_schools(&self) -> Vec<f64> {
        self.column(|r| r.avg_score_schools)
    }

    /// Instance fingerprint of each entry
    pub fn fingerprints(&self) -> Vec<String> {
        self.column(|r| r.fingerprint.clone())
    }

    fn column<T>(&self, f: impl Fn(&TrialRow) -> T) -> Vec<T> {
        self.rows.iter().map(f).collect()
    }

    /// Global means over the batch
    pub fn summary(&self) -> SeriesSummary {
        if self.rows.is_empty() {
            return SeriesSummary::default();
        }

        let count = self.rows.len() as f64;
        let mean = |f: fn(&TrialRow) -> f64| self.rows.iter().map(f).sum::<f64>() / count;

        SeriesSummary {
            trials: self.rows.len(),
            mean_avg_rank_students: mean(|r| r.avg_rank_students),
            mean_avg_rank_schools: mean(|r| r.avg_rank_schools),
            mean_egalitarian_cost: mean(|r| r.egalitarian_cost as f64),
            mean_welfare: mean(|r| r.welfare),
            mean_avg_score_students: mean(|r| r.avg_score_students),
            mean_avg_score_schools: mean(|r| r.avg_score_schools),
            pareto_rate: mean(|r| if r.pareto_optimal { 1.0 } else { 0.0 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(trial: usize, welfare: f64, pareto_optimal: bool) -> TrialRow {
        TrialRow {
            trial,
            fingerprint: String::new(),
            proposals: 0,
            avg_rank_students: 0.0,
            avg_rank_schools: 1.0,
            egalitarian_cost: trial,
            welfare,
            pareto_optimal,
            egalitarian_cost_students: 0,
            egalitarian_cost_schools: trial,
            welfare_students: 0.0,
            welfare_schools: welfare,
            avg_score_students: 1.0,
            avg_score_schools: 0.5,
        }
    }

    #[test]
    fn test_summary_means() {
        let mut series = TrialSeries::new();
        series.push(row(0, 2.0, true));
        series.push(row(2, 4.0, false));

        let summary = series.summary();
        assert_eq!(summary.trials, 2);
        assert_eq!(summary.mean_welfare, 3.0);
        assert_eq!(summary.mean_egalitarian_cost, 1.0);
        assert_eq!(summary.pareto_rate, 0.5);
    }

    #[test]
    fn test_columns_follow_trial_order() {
        let mut series = TrialSeries::new();
        series.push(row(1, 2.0, true));
        series.push(row(3, 5.0, true));

        assert_eq!(series.trials(), vec![1, 3]);
        assert_eq!(series.welfare(), vec![2.0, 5.0]);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        assert_eq!(TrialSeries::new().summary(), SeriesSummary::default());
    }
}
