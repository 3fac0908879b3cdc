//! stocklab CLI: single runs and parameter sweeps over annotated bar files.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config and an annotated CSV
//! - `sweep`: rank a grid of capital/leverage/fee variations of a config
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see every fill.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use stocklab_runner::export::{format_sharpe, save_artifacts};
use stocklab_runner::sweep::{ParamGrid, ParamSweep};
use stocklab_runner::{load_annotated_csv, run_backtest_from_data, BacktestConfig, RunReport};

#[derive(Parser)]
#[command(
    name = "stocklab",
    about = "stocklab CLI: single-stock position/cash backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Annotated bar CSV (OHLCV plus Signal, Execute, Quantity).
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write manifest, trajectory, fills and summary here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run a grid of config variations and rank them by total return.
    Sweep {
        /// Annotated bar CSV (OHLCV plus Signal, Execute, Quantity).
        #[arg(long)]
        bars: PathBuf,

        /// Base TOML config; unswept parameters come from here.
        #[arg(long)]
        config: PathBuf,

        /// Leverage values to try (comma-separated).
        #[arg(long, value_delimiter = ',')]
        leverage: Vec<f64>,

        /// Fee amounts to try (comma-separated, in the config's fee kind).
        #[arg(long, value_delimiter = ',')]
        fee: Vec<f64>,

        /// Initial capital values to try (comma-separated).
        #[arg(long, value_delimiter = ',')]
        capital: Vec<f64>,

        /// Number of ranked results to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Run configurations one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bars,
            config,
            output_dir,
        } => run_backtest_cmd(bars, config, output_dir),
        Commands::Sweep {
            bars,
            config,
            leverage,
            fee,
            capital,
            top,
            sequential,
        } => run_sweep_cmd(
            bars,
            config,
            ParamGrid {
                initial_capitals: capital,
                leverages: leverage,
                fee_amounts: fee,
            },
            top,
            sequential,
        ),
    }
}

fn run_backtest_cmd(bars: PathBuf, config: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let config = BacktestConfig::from_file(&config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let data = load_annotated_csv(&bars)?;
    let report = run_backtest_from_data(&config, &data)?;

    print_summary(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        println!("Artifacts:      {}", run_dir.display());
    }
    Ok(())
}

fn run_sweep_cmd(
    bars: PathBuf,
    config: PathBuf,
    grid: ParamGrid,
    top: usize,
    sequential: bool,
) -> Result<()> {
    if top == 0 {
        bail!("--top must be at least 1");
    }
    let base = BacktestConfig::from_file(&config)
        .with_context(|| format!("loading config {}", config.display()))?;
    let data = load_annotated_csv(&bars)?;

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&grid, &base, &data);

    let failures = results.failures();
    if failures.len() == results.len() {
        bail!("all {} configurations failed", results.len());
    }

    println!();
    println!("=== Sweep: {} configurations ===", results.len());
    println!(
        "{:>4}  {:>12}  {:>8}  {:>10}  {:>10}  {:>8}",
        "rank", "capital", "leverage", "fee", "return %", "sharpe"
    );
    for (rank, report) in results.top_n(top).into_iter().enumerate() {
        let cfg = &report.config;
        println!(
            "{:>4}  {:>12.2}  {:>8.2}  {:>10}  {:>10.2}  {:>8}",
            rank + 1,
            cfg.backtest.initial_capital,
            cfg.backtest.leverage,
            cfg.fees.amount,
            report.total_return_pct(),
            format_sharpe(&report.result.summary.sharpe)
        );
    }
    for (cfg, err) in failures {
        println!(
            "FAILED: capital {} leverage {} fee {}: {err}",
            cfg.backtest.initial_capital, cfg.backtest.leverage, cfg.fees.amount
        );
    }
    println!();
    Ok(())
}

fn print_summary(report: &RunReport) {
    let s = &report.result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", &report.run_id[..12]);
    println!("Bars:           {}", s.bar_count);
    println!("Fills:          {}", s.fill_count);
    println!("Skipped:        {}", report.result.skipped.len());
    println!();
    println!("--- Performance ---");
    println!("Initial Value:  ${:.2}", s.initial_capital);
    println!("Final Value:    ${:.2}", s.final_value);
    println!("Profit:         ${:.2}", s.profit);
    println!("Total Return:   {:.2}%", s.total_return_pct);
    println!("Sharpe:         {}", format_sharpe(&s.sharpe));
    if let Some(b) = &s.benchmark {
        println!();
        println!("--- Buy & Hold ---");
        println!("Final Value:    ${:.2}", b.final_value);
        println!("Profit:         ${:.2}", b.profit);
        println!("Total Return:   {:.2}%", b.total_return_pct);
        println!("Sharpe:         {}", format_sharpe(&b.sharpe));
    }
    if report.insane_bars > 0 {
        println!();
        println!("WARNING: {} bars fail the OHLC sanity check", report.insane_bars);
    }
    println!();
}
