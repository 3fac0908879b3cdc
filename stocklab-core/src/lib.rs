//! stocklab core: single-stock position/cash simulation engine.
//!
//! This crate contains the heart of the backtester:
//! - Domain types (bars, directives, account state, fills, trajectory)
//! - Fee model (flat or proportional)
//! - Per-bar trade state machine with leverage ceilings
//! - Bar loop producing the portfolio trajectory
//! - Performance metrics (total return, annualized Sharpe ratio)

pub mod domain;
pub mod engine;
pub mod metrics;

pub use domain::{AccountState, Action, AnnotatedBar, Bar, Directive, Fill, FillKind, Trajectory};
pub use engine::{run_backtest, BacktestResult, EngineConfig, EngineError, FeeKind, FeeSpec};
pub use metrics::{BarFrequency, BenchmarkSummary, MetricUndefined, SharpeRatio, Summary};
