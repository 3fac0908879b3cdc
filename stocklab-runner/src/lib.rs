//! stocklab runner: backtest orchestration on top of `stocklab-core`.
//!
//! This crate provides:
//! - TOML configuration with a content-addressed run ID
//! - CSV loading of annotated bar series
//! - Quantity sizing into dollar notional
//! - Single-run entry points and parallel parameter sweeps
//! - JSON, CSV and Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sizing;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_annotated_csv, load_annotated_reader, LoadError, LoadedData, RawRow};
pub use runner::{run_backtest_from_data, run_single_backtest, RunError, RunReport, SCHEMA_VERSION};
pub use sizing::QuantityMode;
pub use sweep::{ParamGrid, ParamSweep, SweepResults, SweepRun};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_report_is_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<QuantityMode>();
        assert_sync::<QuantityMode>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
