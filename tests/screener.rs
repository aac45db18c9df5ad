mod common;

use common::{
    FakeSource, Feed, long_history, long_setup, quiet_config, short_history, short_setup, zigzag_series,
};
use signal_screener::Screener;
use signal_screener::config::Mode;
use signal_screener::html_report::{ReportContext, write_report};
use signal_screener::models::{AuxSignals, Instrument, MarketKind};
use signal_screener::signals::Signal;

fn symbols(rows: &[signal_screener::ReportRow]) -> Vec<&str> {
    rows.iter().map(|r| r.instrument.symbol.as_str()).collect()
}

#[tokio::test]
async fn engineered_uptrend_classifies_long_with_levels() {
    let source = FakeSource::spot(vec![("UPUSDT", Feed::Series(long_setup()))]);
    let screener = Screener::new(source, quiet_config()).unwrap();
    let outcome = screener.run().await;

    assert_eq!(outcome.rows.len(), 1);
    let row = &outcome.rows[0];
    assert_eq!(row.signal, Signal::Long);

    let snap = &row.snapshot;
    assert!(snap.ema9.unwrap() > snap.ema21.unwrap());
    assert!(snap.ema21.unwrap() > snap.ema50.unwrap());
    let rsi = snap.rsi14.unwrap();
    assert!(rsi > 42.0 && rsi < 68.0, "rsi {rsi}");
    assert!(snap.adx14.unwrap() > 25.0);
    assert!(snap.macd_line.unwrap() > snap.macd_signal.unwrap());
    assert!(snap.volume_ratio().unwrap() > 1.4);

    let levels = &row.levels;
    assert_eq!(levels.entry, 162.0);
    let (stop, target) = (levels.stop.unwrap(), levels.target.unwrap());
    assert!(stop < levels.entry && levels.entry < target);
    approx::assert_relative_eq!(levels.risk_reward.unwrap(), 2.0 / 1.5, epsilon = 1e-9);
}

#[tokio::test]
async fn failing_instruments_do_not_abort_the_batch() {
    let source = FakeSource::spot(vec![
        ("BROKENUSDT", Feed::Fail),
        ("UPUSDT", Feed::Series(long_setup())),
        ("NEWUSDT", Feed::Series(zigzag_series(30, 10.0, 1.0, -0.5, 1000.0))),
        ("DOWNUSDT", Feed::Series(short_setup())),
    ]);
    let screener = Screener::new(source, quiet_config()).unwrap();
    let outcome = screener.run().await;

    assert_eq!(outcome.symbols_seen, 4);
    assert_eq!(symbols(&outcome.rows), vec!["UPUSDT", "DOWNUSDT"]);
    assert_eq!(outcome.rows[1].signal, Signal::Short);

    let counts = outcome.skip_counts();
    assert_eq!(counts.get("fetch"), Some(&1));
    assert_eq!(counts.get("insufficient_history"), Some(&1));
    assert_eq!(outcome.skipped[0].0, Instrument::new("BROKENUSDT", MarketKind::Spot));
}

#[tokio::test]
async fn supplier_outage_writes_an_empty_report() {
    let screener = Screener::new(FakeSource::down(), quiet_config()).unwrap();
    let outcome = screener.run().await;
    assert!(outcome.rows.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("futures.html");
    let ctx = ReportContext::new(screener.config(), chrono::Utc::now());
    write_report(&path, &outcome.rows, &ctx).await.unwrap();
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("NO DATA"));
    assert!(html.contains("</table>"));
}

#[tokio::test]
async fn futures_longs_need_funding_and_rising_open_interest() {
    let mut source = FakeSource::new(
        MarketKind::Futures,
        vec![("UPUSDT", Feed::Series(long_setup()))],
    );
    let mut config = quiet_config();
    config.market.kind = MarketKind::Futures;

    let screener = Screener::new(source, config.clone()).unwrap();
    let outcome = screener.run().await;
    assert_eq!(outcome.rows[0].signal, Signal::Neutral);

    source = FakeSource::new(
        MarketKind::Futures,
        vec![("UPUSDT", Feed::Series(long_setup()))],
    );
    source.aux = AuxSignals {
        funding_rate: Some(0.0001),
        oi_change_pct: Some(2.5),
    };
    let screener = Screener::new(source, config).unwrap();
    let outcome = screener.run().await;
    assert_eq!(outcome.rows[0].signal, Signal::Long);
    assert_eq!(outcome.rows[0].aux.and_then(|a| a.oi_change_pct), Some(2.5));
}

#[tokio::test]
async fn equal_rows_keep_discovery_order() {
    let source = FakeSource::spot(vec![
        ("QUIETUSDT", Feed::Series(zigzag_series(120, 100.0, 3.0, -2.0, 500.0))),
        ("FIRSTUSDT", Feed::Series(long_setup())),
        ("SECONDUSDT", Feed::Series(long_setup())),
    ]);
    let screener = Screener::new(source, quiet_config()).unwrap();
    let outcome = screener.run().await;
    assert_eq!(
        symbols(&outcome.rows),
        vec!["FIRSTUSDT", "SECONDUSDT", "QUIETUSDT"]
    );
    assert_eq!(outcome.rows[2].signal, Signal::Neutral);
}

#[tokio::test]
async fn score_mode_rows_carry_badges() {
    let mut config = quiet_config();
    config.mode = Mode::Score;
    let source = FakeSource::spot(vec![
        ("UPUSDT", Feed::Series(long_history())),
        ("DOWNUSDT", Feed::Series(short_history())),
    ]);
    let screener = Screener::new(source, config).unwrap();
    let outcome = screener.run().await;

    assert_eq!(outcome.rows.len(), 2);
    let up = outcome
        .rows
        .iter()
        .find(|r| r.instrument.symbol == "UPUSDT")
        .unwrap();
    assert_eq!(up.signal, Signal::Long);
    let card = up.score.as_ref().unwrap();
    assert!(card.strong.contains(&"OBV ↑"));
    assert!(card.moderate.contains(&"MACD Up"));
    assert!(card.moderate.contains(&"Volume Spike"));
    assert!(up.levels.risk_reward.unwrap() >= 1.2);

    let again = screener
        .evaluate(&up.instrument, &long_history(), None)
        .unwrap();
    assert_eq!(again[0].score, up.score);
}

#[tokio::test]
async fn default_score_run_awards_cross_badges() {
    let mut config = quiet_config();
    config.mode = Mode::Score;
    config.validate().unwrap();
    assert_eq!(config.kline_limit(), 300);

    let source = FakeSource::spot(vec![
        ("UPUSDT", Feed::Series(long_history())),
        ("DOWNUSDT", Feed::Series(short_history())),
        ("YOUNGUSDT", Feed::Series(long_setup())),
    ]);
    let screener = Screener::new(source, config).unwrap();
    let outcome = screener.run().await;

    assert_eq!(outcome.rows.len(), 2);
    let badges = |symbol: &str| {
        let row = outcome
            .rows
            .iter()
            .find(|r| r.instrument.symbol == symbol)
            .unwrap();
        (row.signal, row.score.clone().unwrap().strong)
    };
    let (signal, strong) = badges("UPUSDT");
    assert_eq!(signal, Signal::Long);
    assert!(strong.contains(&"Golden Cross"), "{strong:?}");
    let (signal, strong) = badges("DOWNUSDT");
    assert_eq!(signal, Signal::Short);
    assert!(strong.contains(&"Death Cross"), "{strong:?}");

    assert_eq!(outcome.skip_counts().get("insufficient_history"), Some(&1));
}

#[tokio::test]
async fn score_mode_respects_min_risk_reward() {
    let mut config = quiet_config();
    config.mode = Mode::Score;
    config.report.min_rr = 1.5;
    let source = FakeSource::spot(vec![("UPUSDT", Feed::Series(long_history()))]);
    let screener = Screener::new(source, config).unwrap();
    let outcome = screener.run().await;
    assert!(outcome.rows.is_empty());
    assert_eq!(outcome.skip_counts().get("below_risk_reward"), Some(&1));
}
