//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for run reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: bar-by-bar trajectory and fill tape for external analysis tools
//! - **Markdown**: human-readable single-run summary
//!
//! All persisted artifacts include a `schema_version` field. Newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use stocklab_core::{SharpeRatio, Summary};

use crate::runner::{RunReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trajectory as CSV, one row per bar.
///
/// Columns: bar_index, timestamp, cash, position, stock_value,
/// portfolio_value, period_return (empty on the first bar), benchmark_value
pub fn export_trajectory_csv(report: &RunReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "bar_index",
        "timestamp",
        "cash",
        "position",
        "stock_value",
        "portfolio_value",
        "period_return",
        "benchmark_value",
    ])?;
    for p in report.result.trajectory.points() {
        wtr.write_record([
            p.bar_index.to_string(),
            p.timestamp.to_string(),
            p.cash.to_string(),
            p.position.to_string(),
            p.stock_value.to_string(),
            p.portfolio_value.to_string(),
            p.period_return.map(|r| r.to_string()).unwrap_or_default(),
            p.benchmark_value.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the fill tape as CSV.
///
/// Columns: bar_index, timestamp, kind, price, shares, notional, fee,
/// cash_after, position_after
pub fn export_fills_csv(report: &RunReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "bar_index",
        "timestamp",
        "kind",
        "price",
        "shares",
        "notional",
        "fee",
        "cash_after",
        "position_after",
    ])?;
    for f in &report.result.fills {
        wtr.write_record([
            f.bar_index.to_string(),
            f.timestamp.to_string(),
            format!("{:?}", f.kind),
            f.price.to_string(),
            f.shares.to_string(),
            f.notional.to_string(),
            f.fee.to_string(),
            f.cash_after.to_string(),
            f.position_after.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{run_id[..12]}/` under `output_dir` containing:
/// - `manifest.json`: the full `RunReport`
/// - `trajectory.csv`: bar-by-bar cash, position and portfolio value
/// - `fills.csv`: executed trades
/// - `summary.md`: Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(short_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("trajectory.csv"), export_trajectory_csv(report)?)?;
    std::fs::write(run_dir.join("fills.csv"), export_fills_csv(report)?)?;
    std::fs::write(run_dir.join("summary.md"), render_markdown(report))?;

    log::info!("artifacts written to {}", run_dir.display());
    Ok(run_dir)
}

/// Load a `RunReport` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn format_sharpe(sharpe: &SharpeRatio) -> String {
    match sharpe {
        SharpeRatio::Defined { value } => format!("{value:.2}"),
        SharpeRatio::Undefined { reason } => format!("n/a ({reason})"),
    }
}

/// Generate a Markdown summary for a single run.
pub fn render_markdown(report: &RunReport) -> String {
    let mut md = String::with_capacity(1024);
    let s: &Summary = &report.result.summary;
    let cfg = &report.config;

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", report.run_id));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    md.push_str(&format!("| Bars | {} |\n", s.bar_count));
    if let (Some(first), Some(last)) = (
        report.result.trajectory.points().first(),
        report.result.trajectory.last(),
    ) {
        md.push_str(&format!(
            "| Period | {} to {} |\n",
            first.timestamp, last.timestamp
        ));
    }
    if report.insane_bars > 0 {
        md.push_str(&format!("| Insane Bars | **{}** |\n", report.insane_bars));
    }
    md.push('\n');

    md.push_str("## Configuration\n\n");
    md.push_str("| Parameter | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Initial Capital | ${:.2} |\n",
        cfg.backtest.initial_capital
    ));
    md.push_str(&format!("| Leverage | {} |\n", cfg.backtest.leverage));
    md.push_str(&format!("| Fee | {} {} |\n", cfg.fees.kind, cfg.fees.amount));
    md.push_str(&format!(
        "| Risk-Free Rate | {} |\n",
        cfg.backtest.risk_free_rate
    ));
    md.push_str(&format!("| Frequency | {} |\n", cfg.backtest.frequency));
    md.push('\n');

    md.push_str("## Performance\n\n");
    match &s.benchmark {
        Some(b) => {
            md.push_str("| Metric | Strategy | Buy & Hold |\n");
            md.push_str("| --- | --- | --- |\n");
            md.push_str(&format!(
                "| Final Portfolio Value | ${:.2} | ${:.2} |\n",
                s.final_value, b.final_value
            ));
            md.push_str(&format!("| Profit | ${:.2} | ${:.2} |\n", s.profit, b.profit));
            md.push_str(&format!(
                "| Total Return | {:.2}% | {:.2}% |\n",
                s.total_return_pct, b.total_return_pct
            ));
            md.push_str(&format!(
                "| Sharpe Ratio | {} | {} |\n",
                format_sharpe(&s.sharpe),
                format_sharpe(&b.sharpe)
            ));
        }
        None => {
            md.push_str("| Metric | Value |\n");
            md.push_str("| --- | --- |\n");
            md.push_str(&format!("| Final Portfolio Value | ${:.2} |\n", s.final_value));
            md.push_str(&format!("| Profit | ${:.2} |\n", s.profit));
            md.push_str(&format!("| Total Return | {:.2}% |\n", s.total_return_pct));
            md.push_str(&format!("| Sharpe Ratio | {} |\n", format_sharpe(&s.sharpe)));
        }
    }
    md.push('\n');
    md.push_str(&format!("Fills: {}  \n", s.fill_count));
    md.push_str(&format!(
        "Skipped directives: {}\n",
        report.result.skipped.len()
    ));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestConfig;
    use crate::data_loader::load_annotated_reader;
    use crate::runner::run_backtest_from_data;

    const BARS: &str = "\
Date,Open,High,Low,Close,Volume,Signal,Execute,Quantity
2024-01-02,100,105,95,100,1000,Buy,100,1.0
2024-01-03,100,112,99,105,1200,Hold,,
2024-01-04,105,115,105,110,900,Sell,110,
2024-01-05,110,111,100,108,900,Buy,200,1.0
";

    fn make_report() -> RunReport {
        let data = load_annotated_reader(BARS.as_bytes()).unwrap();
        run_backtest_from_data(&BacktestConfig::new(10_000.0), &data).unwrap()
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let json = export_json(&report).unwrap();
        let restored = import_json(&json).unwrap();
        assert_eq!(restored.schema_version, SCHEMA_VERSION);
        assert_eq!(restored.run_id, report.run_id);
        assert_eq!(restored.config, report.config);
        assert_eq!(restored.result.fills.len(), 2);
        assert_eq!(restored.result.trajectory.len(), 4);
        assert_eq!(restored.result.summary.sharpe, report.result.summary.sharpe);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut report = make_report();
        report.schema_version = 99;
        let json = export_json(&report).unwrap();
        let msg = import_json(&json).unwrap_err().to_string();
        assert!(msg.contains("unsupported schema version 99"));
    }

    #[test]
    fn trajectory_csv_has_one_row_per_bar() {
        let csv = export_trajectory_csv(&make_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "bar_index,timestamp,cash,position,stock_value,portfolio_value,period_return,benchmark_value"
        );
        assert_eq!(lines[1], "0,2024-01-02 00:00:00,0,100,10000,10000,,10000");
        assert!(lines[4].ends_with(",10800"));
        assert!(lines[3].starts_with("2,2024-01-04 00:00:00,11000,0,0,11000,"));
    }

    #[test]
    fn fills_csv_lists_trades() {
        let csv = export_fills_csv(&make_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,2024-01-02 00:00:00,OpenLong,100,100,10000,0,"));
        assert!(lines[2].starts_with("2,2024-01-04 00:00:00,CloseLong,110,100,11000,0,"));
    }

    #[test]
    fn markdown_contains_summary() {
        let md = render_markdown(&make_report());
        assert!(md.contains("# Backtest Report"));
        assert!(md.contains("| Metric | Strategy | Buy & Hold |"));
        assert!(md.contains("| Final Portfolio Value | $11000.00 | $10800.00 |"));
        assert!(md.contains("| Total Return | 10.00% | 8.00% |"));
        assert!(md.contains("Fills: 2"));
        assert!(md.contains("Skipped directives: 1"));
    }

    #[test]
    fn save_load_artifacts_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();

        assert_eq!(run_dir, dir.path().join(&report.run_id[..12]));
        for name in ["manifest.json", "trajectory.csv", "fills.csv", "summary.md"] {
            assert!(run_dir.join(name).exists(), "missing {name}");
        }
        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }
}
