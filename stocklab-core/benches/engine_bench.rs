//! Criterion benchmarks for stocklab hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full backtest iteration)
//! 2. Single directive execution (trade state machine)
//! 3. Sharpe ratio over a return series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stocklab_core::domain::{AccountState, Action, AnnotatedBar, Bar, Directive};
use stocklab_core::engine::{execute_directive, run_backtest, EngineConfig, FeeSpec};
use stocklab_core::metrics::sharpe_ratio;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<AnnotatedBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let bar = Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500_000) as f64,
            };
            // Rotate through entries and exits so every rule gets exercised.
            let directive = match i % 20 {
                0 => Directive::buy(close, 2_000.0),
                5 => Directive::sell(close, 2_000.0),
                10 => Directive::sell(close, 2_000.0),
                15 => Directive::close_short(close),
                _ => Directive::hold(),
            };
            AnnotatedBar::new(bar, directive)
        })
        .collect()
}

// ── 1. Bar loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");
    let config = EngineConfig::new(100_000.0, 2.0, FeeSpec::proportional(0.001));

    for n in [252, 2_520, 25_200] {
        let bars = make_bars(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &bars, |b, bars| {
            b.iter(|| run_backtest(black_box(bars), black_box(&config)));
        });
    }
    group.finish();
}

// ── 2. Directive execution ───────────────────────────────────────────

fn bench_execute_directive(c: &mut Criterion) {
    let config = EngineConfig::new(100_000.0, 2.0, FeeSpec::flat(1.0));
    let bars = make_bars(20);
    let buy = &bars[0];
    let sell = &bars[5];
    assert_eq!(buy.directive.action, Action::Buy);

    c.bench_function("execute_round_trip", |b| {
        b.iter(|| {
            let mut account = AccountState::new(100_000.0, 2.0);
            let _ = execute_directive(&mut account, black_box(buy), 0, &config);
            let _ = execute_directive(&mut account, black_box(sell), 5, &config);
            account
        });
    });
}

// ── 3. Metrics ───────────────────────────────────────────────────────

fn bench_sharpe(c: &mut Criterion) {
    let mut group = c.benchmark_group("sharpe_ratio");
    for n in [252, 25_200] {
        let returns: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin() * 0.01).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &returns, |b, r| {
            b.iter(|| sharpe_ratio(black_box(r), 0.03, 252.0));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_bar_loop,
    bench_execute_directive,
    bench_sharpe
);
criterion_main!(benches);
