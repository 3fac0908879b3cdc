//! Parameter sweep over capital, leverage and fee amount.
//!
//! Every configuration runs against the same loaded series with its own
//! engine state. A failing run is recorded in its own slot and never aborts
//! the others.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::config::BacktestConfig;
use crate::data_loader::LoadedData;
use crate::runner::{run_backtest_from_data, RunError, RunReport};

/// Parameter grid specification.
///
/// An empty axis keeps the base config's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    pub initial_capitals: Vec<f64>,
    pub leverages: Vec<f64>,
    pub fee_amounts: Vec<f64>,
}

impl ParamGrid {
    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.initial_capitals.len().max(1) * self.leverages.len().max(1) * self.fee_amounts.len().max(1)
    }

    /// Generates all configurations in the grid, capital-major.
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let capitals = axis(&self.initial_capitals, base.backtest.initial_capital);
        let leverages = axis(&self.leverages, base.backtest.leverage);
        let fees = axis(&self.fee_amounts, base.fees.amount);

        let mut configs = Vec::with_capacity(self.size());
        for &capital in &capitals {
            for &leverage in &leverages {
                for &fee in &fees {
                    let mut config = base.clone();
                    config.backtest.initial_capital = capital;
                    config.backtest.leverage = leverage;
                    config.fees.amount = fee;
                    configs.push(config);
                }
            }
        }
        configs
    }
}

fn axis(values: &[f64], base: f64) -> Vec<f64> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// Parameter sweep executor.
///
/// Runs backtests for all configurations in a grid, in parallel by default.
#[derive(Debug, Clone)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Executes a parameter sweep over the given grid.
    ///
    /// Output order follows `ParamGrid::generate_configs` in both modes.
    pub fn sweep(&self, grid: &ParamGrid, base: &BacktestConfig, data: &LoadedData) -> SweepResults {
        let configs = grid.generate_configs(base);
        log::info!(
            "sweeping {} configurations ({})",
            configs.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let run = |config: BacktestConfig| {
            let result = run_backtest_from_data(&config, data);
            if let Err(e) = &result {
                log::warn!("run {} failed: {e}", &config.run_id()[..12]);
            }
            SweepRun { config, result }
        };

        let runs: Vec<SweepRun> = if self.parallel {
            configs.into_par_iter().map(run).collect()
        } else {
            configs.into_iter().map(run).collect()
        };

        SweepResults::new(runs)
    }
}

/// One configuration and its outcome.
#[derive(Debug)]
pub struct SweepRun {
    pub config: BacktestConfig,
    pub result: Result<RunReport, RunError>,
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    runs: Vec<SweepRun>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(runs: Vec<SweepRun>) -> Self {
        let by_run_id = runs
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.result.as_ref().ok().map(|rep| (rep.run_id.clone(), i)))
            .collect();
        Self { runs, by_run_id }
    }

    /// All runs in grid order.
    pub fn runs(&self) -> &[SweepRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Gets a successful report by RunId.
    pub fn get(&self, run_id: &str) -> Option<&RunReport> {
        self.by_run_id
            .get(run_id)
            .and_then(|&i| self.runs[i].result.as_ref().ok())
    }

    pub fn successes(&self) -> Vec<&RunReport> {
        self.runs.iter().filter_map(|r| r.result.as_ref().ok()).collect()
    }

    pub fn failures(&self) -> Vec<(&BacktestConfig, &RunError)> {
        self.runs
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (&r.config, e)))
            .collect()
    }

    /// Successful reports sorted by total return (descending).
    pub fn sorted_by_total_return(&self) -> Vec<&RunReport> {
        let mut sorted = self.successes();
        sorted.sort_by(|a, b| {
            b.total_return_pct()
                .partial_cmp(&a.total_return_pct())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// Returns the top N reports by total return.
    pub fn top_n(&self, n: usize) -> Vec<&RunReport> {
        self.sorted_by_total_return().into_iter().take(n).collect()
    }

    /// Returns the best report by total return.
    pub fn best(&self) -> Option<&RunReport> {
        self.sorted_by_total_return().into_iter().next()
    }
}
