//! Trajectory: the per-bar portfolio series produced by one run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Snapshot of the account at the close of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    pub position: f64,
    pub stock_value: f64,
    pub portfolio_value: f64,
    /// `None` on the first bar.
    pub period_return: Option<f64>,
    /// Buy-and-hold value: initial capital in shares at the first close,
    /// marked at this bar's close. `None` if that is not a finite number.
    #[serde(default)]
    pub benchmark_value: Option<f64>,
}

/// Append-only sequence of snapshots, one per input bar.
///
/// There is no way to mutate a point once pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, point: TrajectoryPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn portfolio_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.portfolio_value).collect()
    }

    pub fn cash_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cash).collect()
    }

    pub fn stock_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.stock_value).collect()
    }

    pub fn positions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Buy-and-hold series, if every bar has one.
    pub fn benchmark_values(&self) -> Option<Vec<f64>> {
        self.points.iter().map(|p| p.benchmark_value).collect()
    }

    /// Period returns from bar 1 onward (bar 0 contributes none).
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.period_return).collect()
    }
}
