//! Backtesting engine: bar-by-bar position/cash simulation.
//!
//! The engine consumes bars that already carry a directive, then for each bar:
//!
//! 1. Execute: apply the directive through the trade state machine
//! 2. Mark to market: stock value and portfolio value at the close
//! 3. Record: append the snapshot and the period return
//!
//! Summary metrics are computed once the whole series has been processed.

pub mod error;
pub mod execution;
pub mod fees;
pub mod loop_runner;
pub mod state;

pub use error::{ComputationError, ConfigurationError, EngineError};
pub use execution::{execute_directive, StepOutcome};
pub use fees::{FeeKind, FeeSpec};
pub use loop_runner::run_backtest;
pub use state::{BacktestResult, EngineConfig, EngineState, DEFAULT_RISK_FREE_RATE};
