//! Backtest runner: wires together config, data, sizing and the engine.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads the CSV, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded data. Used by sweeps.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocklab_core::engine::{run_backtest, BacktestResult, EngineError};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_annotated_csv, LoadError, LoadedData};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete, self-describing result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub config: BacktestConfig,
    /// Bars failing the OHLC sanity check (kept in the run).
    #[serde(default)]
    pub insane_bars: usize,
    pub result: BacktestResult,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    pub fn total_return_pct(&self) -> f64 {
        self.result.summary.total_return_pct
    }
}

/// Run a single backtest from a config and a CSV path.
pub fn run_single_backtest(config: &BacktestConfig, bars: &Path) -> Result<RunReport, RunError> {
    let data = load_annotated_csv(bars)?;
    run_backtest_from_data(config, &data)
}

/// Run a backtest with pre-loaded data: no I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    data: &LoadedData,
) -> Result<RunReport, RunError> {
    let engine_config = config
        .to_engine_config()
        .map_err(|e| RunError::Config(ConfigError::Invalid(e)))?;
    let bars = data.annotate(config.sizing.quantity_mode, engine_config.initial_capital);
    let result = run_backtest(&bars, &engine_config)?;

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        dataset_hash: data.dataset_hash.clone(),
        config: config.clone(),
        insane_bars: data.insane_bars,
        result,
    })
}
