//! End-to-end coverage of the worked scenarios in spec section 8: builds a
//! fixture, drives a full run through `runner::run`, and reads the
//! resulting `trades.ndjson`/`paths.ndjson` back off disk.

use std::sync::Arc;

use callpath::artifact::{ArtifactWriter, DatasetInfo, GitInfo};
use callpath::config::fee::FeeConfig;
use callpath::config::strategy::StrategySpec;
use callpath::config::RunConfig;
use callpath::domain::{Call, Interval};
use callpath::policy::types::Policy;
use callpath::store::{CandleStore, FixtureBuilder};

const BASE_TS_MS: i64 = 1_704_067_200_000;

fn fee_30_10() -> FeeConfig {
    FeeConfig::Simple { taker_fee_bps: 30.0, slippage_bps: 10.0 }
}

async fn run_single_policy(closes: &[f64], policy: Policy) -> (callpath::runner::RunOutcome, tempfile::TempDir) {
    let candles = FixtureBuilder::new(BASE_TS_MS / 1_000, Interval::M5).build(closes);
    let mut store = callpath::store::InMemoryCandleStore::new();
    store.insert("MINT", "sol", Interval::M5, candles);
    let store: Arc<dyn CandleStore> = Arc::new(store);

    let call = Call::new("call-1", "caller-1", "MINT", "sol", BASE_TS_MS);
    let strategy = StrategySpec {
        interval: Interval::M5,
        indicator_warmup_bars: 0,
        entry_delay_bars: 0,
        max_hold_ms: Interval::M5.to_ms() * 20,
        policies: vec![policy],
    };
    let config = RunConfig { strategy, fee: fee_30_10(), sweep: None, workers: 2 };

    let dir = tempfile::tempdir().unwrap();
    let dataset = DatasetInfo {
        from_iso: "2024-01-01T00:00:00Z".into(),
        to_iso: "2024-01-01T01:00:00Z".into(),
        interval: Interval::M5,
        calls_count: 1,
    };
    let git = GitInfo { commit: "test".into(), branch: "test".into(), dirty: false };
    let config_hash = callpath::fingerprint::hash_json(&config).unwrap();
    let writer = Arc::new(ArtifactWriter::create(dir.path(), "run-test", git, dataset, config_hash).await.unwrap());

    let outcome = callpath::runner::run(store, vec![call], &config, writer.clone()).await.unwrap();
    writer.finalize_ok(outcome.timing.clone()).await.unwrap();
    (outcome, dir)
}

fn read_trade_rows(dir: &std::path::Path) -> Vec<serde_json::Value> {
    let text = std::fs::read_to_string(dir.join("trades.ndjson")).unwrap();
    text.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

fn read_path_rows(dir: &std::path::Path) -> Vec<serde_json::Value> {
    let text = std::fs::read_to_string(dir.join("paths.ndjson")).unwrap();
    text.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
}

#[tokio::test]
async fn monotonic_moon_hits_take_profit() {
    let policy = Policy::FixedStop {
        stop_pct: callpath::config::types::Pct::new(0.20),
        take_profit_pct: Some(callpath::config::types::Pct::new(2.0)),
    };
    let (outcome, dir) = run_single_policy(&[1.0, 1.5, 2.0, 2.5, 3.0], policy).await;
    assert_eq!(outcome.eligible_calls, 1);

    let trades = read_trade_rows(dir.path());
    assert_eq!(trades.len(), 1);
    let trade = &trades[0];
    assert!(trade["ok"].as_bool().unwrap());
    assert_eq!(trade["exit_reason"], "take_profit");
    let net_return_pct = trade["net_return_pct"].as_f64().unwrap();
    // netReturnBps = 20000 - 80 = 19920 -> 199.20%
    assert!((net_return_pct - 199.20).abs() < 1e-6, "got {net_return_pct}");

    let paths = read_path_rows(dir.path());
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0]["hit_2x"], true);
    assert_eq!(paths[0]["hit_3x"], true);
    assert_eq!(paths[0]["hit_4x"], false);
}

#[tokio::test]
async fn bull_trap_stops_out_after_milestones() {
    let policy = Policy::FixedStop {
        stop_pct: callpath::config::types::Pct::new(0.25),
        take_profit_pct: None,
    };
    let (_outcome, dir) = run_single_policy(&[1.0, 2.0, 3.0, 5.0, 3.0, 1.5, 0.5], policy).await;

    let trades = read_trade_rows(dir.path());
    assert_eq!(trades[0]["exit_reason"], "stop_loss");

    let paths = read_path_rows(dir.path());
    assert_eq!(paths[0]["hit_2x"], true);
    assert_eq!(paths[0]["hit_3x"], true);
    assert_eq!(paths[0]["hit_4x"], true);
    assert!(paths[0]["peak_multiple"].as_f64().unwrap() >= 5.0);
}

#[tokio::test]
async fn combo_reports_the_earlier_of_its_sub_policies() {
    let policy = Policy::Combo {
        policies: vec![
            Policy::FixedStop { stop_pct: callpath::config::types::Pct::new(0.25), take_profit_pct: None },
            Policy::TimeStop { max_hold_ms: 600_000, take_profit_pct: None },
        ],
    };
    let (_outcome, dir) = run_single_policy(&[1.0, 0.7, 0.9, 1.2], policy).await;

    let trades = read_trade_rows(dir.path());
    assert_eq!(trades[0]["exit_reason"], "stop_loss");
}

#[tokio::test]
async fn excluded_call_without_coverage_reports_no_coverage() {
    let candles = FixtureBuilder::new(BASE_TS_MS / 1_000, Interval::M5).build(&[1.0, 1.1]);
    let mut store = callpath::store::InMemoryCandleStore::new();
    store.insert("MINT", "sol", Interval::M5, candles);
    let store: Arc<dyn CandleStore> = Arc::new(store);

    // This call's alert is far outside the fixture's covered range.
    let call = Call::new("call-2", "caller-1", "MINT", "sol", BASE_TS_MS + 1_000_000_000);
    let strategy = StrategySpec {
        interval: Interval::M5,
        indicator_warmup_bars: 0,
        entry_delay_bars: 0,
        max_hold_ms: Interval::M5.to_ms() * 5,
        policies: vec![Policy::FixedStop { stop_pct: callpath::config::types::Pct::new(0.1), take_profit_pct: None }],
    };
    let config = RunConfig { strategy, fee: fee_30_10(), sweep: None, workers: 1 };

    let dir = tempfile::tempdir().unwrap();
    let dataset = DatasetInfo {
        from_iso: "2024-01-01T00:00:00Z".into(),
        to_iso: "2024-01-01T01:00:00Z".into(),
        interval: Interval::M5,
        calls_count: 1,
    };
    let git = GitInfo { commit: "test".into(), branch: "test".into(), dirty: false };
    let config_hash = callpath::fingerprint::hash_json(&config).unwrap();
    let writer = Arc::new(ArtifactWriter::create(dir.path(), "run-test", git, dataset, config_hash).await.unwrap());

    let err = callpath::runner::run(store, vec![call], &config, writer.clone()).await.unwrap_err();
    assert!(matches!(err, callpath::EngineError::NoCoverage { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(!dir.path().join("trades.ndjson").exists());
}
