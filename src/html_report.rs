//! Static HTML rendering of the ranked rows.

use crate::analysis::ReportRow;
use crate::config::{AppConfig, Mode};
use crate::models::MarketKind;
use crate::signals::Signal;
use crate::storage_utils::write_atomic;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::Path;

const STYLE: &str = "\
body{background:#020617;color:#e5e7eb;font-family:Arial,sans-serif;padding:20px;}
table{width:100%;border-collapse:collapse;margin-top:20px;}
th{background:#111827;padding:6px;font-size:12px;text-align:right;}
td{padding:6px;font-size:12px;text-align:right;}
tr:nth-child(even){background:#0f172a;}
tr:nth-child(odd){background:#1f2937;}
.sym{text-align:left;font-weight:bold;}
.side{text-align:center;font-weight:bold;}
.long{color:#22c55e;}
.short{color:#ef4444;}
.neutral{color:#94a3b8;}
.left{text-align:left;}
.note{text-align:center;color:#64748b;font-size:11px;margin-top:16px;}";

/// Header text of one report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub title: String,
    pub subtitle: String,
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
}

impl ReportContext {
    pub fn new(config: &AppConfig, generated_at: DateTime<Utc>) -> Self {
        let market = match config.market.kind {
            MarketKind::Futures => "Binance Futures (USDT-M PERP)",
            MarketKind::Spot => "Binance Spot (USDT)",
        };
        let kind = match config.mode {
            Mode::Filter => "Signal Screener",
            Mode::Score => "Long/Short Dashboard",
        };
        let mult = config.levels.multipliers();
        let subtitle = format!(
            "market={} | mode={:?} | interval={} | horizon={:?} | only_signal={} | side={:?} | minRR={} | ATR x{}/x{}",
            config.market.kind,
            config.mode,
            config.klines.interval,
            config.levels.horizon,
            config.report.only_signal,
            config.report.side,
            config.report.min_rr,
            mult.stop,
            mult.target,
        );
        Self {
            title: format!("{market} – {kind}"),
            subtitle,
            mode: config.mode,
            generated_at,
        }
    }
}

/// Escapes text for use in element content and single-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn fmt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "-".to_string(),
    }
}

fn rr_style(rr: Option<f64>) -> &'static str {
    match rr {
        Some(v) if v >= 1.5 => " style='background:#064e3b;'",
        Some(v) if v >= 1.0 => " style='background:#78350f;'",
        Some(_) => " style='background:#7f1d1d;'",
        None => "",
    }
}

fn signal_class(signal: Signal) -> &'static str {
    match signal {
        Signal::Long => "long",
        Signal::Short => "short",
        Signal::Neutral => "neutral",
    }
}

const FILTER_HEADERS: [&str; 11] = [
    "Symbol", "Signal", "Entry", "Stop", "Target", "Last", "Funding", "OI Δ %", "RSI", "ADX",
    "MACD Hist",
];

const SCORE_HEADERS: [&str; 16] = [
    "Symbol", "Side", "Score", "Last", "Entry", "Stop", "TP", "Stop %", "TP %", "R/R", "RSI",
    "ADX", "ATR %", "Vol xAvg", "CMF", "Badges",
];

pub fn render(rows: &[ReportRow], ctx: &ReportContext) -> String {
    let title = if rows.is_empty() {
        format!("{} (NO DATA)", ctx.title)
    } else {
        ctx.title.clone()
    };
    let headers: &[&str] = match ctx.mode {
        Mode::Filter => &FILTER_HEADERS,
        Mode::Score => &SCORE_HEADERS,
    };

    // fmt::Write into a String never fails, hence the ignored results below.
    let mut h = String::new();
    h.push_str("<!DOCTYPE html>\n<html><head><meta charset='UTF-8'>\n");
    let _ = writeln!(h, "<title>{}</title>", escape(&title));
    let _ = writeln!(h, "<style>\n{STYLE}\n</style></head><body>");
    let _ = writeln!(
        h,
        "<h1 style='text-align:center;color:#facc15;'>{}</h1>",
        escape(&title)
    );
    let _ = writeln!(
        h,
        "<div style='text-align:center;color:#94a3b8;'>{}</div>",
        escape(&ctx.subtitle)
    );
    let _ = writeln!(
        h,
        "<div style='text-align:center;color:#94a3b8;'>Generated {} UTC | {} rows</div>",
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S"),
        rows.len()
    );

    h.push_str("<table>\n<tr>");
    for (i, header) in headers.iter().enumerate() {
        let left = i == 0 || (ctx.mode == Mode::Score && i + 1 == headers.len());
        let class = if left { " class='left'" } else { "" };
        let _ = write!(h, "<th{class}>{}</th>", escape(header));
    }
    h.push_str("</tr>\n");

    for row in rows {
        match ctx.mode {
            Mode::Filter => filter_row(&mut h, row),
            Mode::Score => score_row(&mut h, row),
        }
    }

    h.push_str("</table>\n");
    h.push_str("<div class='note'>Rule-based technical screen. Not investment advice.</div>\n");
    h.push_str("</body></html>\n");
    h
}

fn filter_row(h: &mut String, row: &ReportRow) {
    let snap = &row.snapshot;
    let aux = row.aux.unwrap_or_default();
    let _ = writeln!(
        h,
        "<tr><td class='sym'>{}</td><td class='side {}'>{}</td><td>{}</td><td>{}</td><td>{}</td>\
         <td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&row.instrument.symbol),
        signal_class(row.signal),
        row.signal,
        fmt(Some(row.levels.entry), 4),
        fmt(row.levels.stop, 4),
        fmt(row.levels.target, 4),
        fmt(snap.close, 4),
        fmt(aux.funding_rate, 5),
        fmt(aux.oi_change_pct, 2),
        fmt(snap.rsi14, 2),
        fmt(snap.adx14, 2),
        fmt(snap.macd_hist, 4),
    );
}

fn score_row(h: &mut String, row: &ReportRow) {
    let snap = &row.snapshot;
    let levels = &row.levels;
    let badges = row.score.as_ref().map(|c| c.badge_line()).unwrap_or_default();
    let _ = writeln!(
        h,
        "<tr><td class='sym'>{}</td><td class='side {}'>{}</td><td>{}</td><td>{}</td><td>{}</td>\
         <td>{}</td><td>{}</td><td>{}</td><td>{}</td><td{}>{}</td><td>{}</td><td>{}</td>\
         <td>{}</td><td>{}</td><td>{}</td><td class='left'>{}</td></tr>",
        escape(&row.instrument.symbol),
        signal_class(row.signal),
        row.signal,
        row.score_value(),
        fmt(snap.close, 4),
        fmt(Some(levels.entry), 4),
        fmt(levels.stop, 4),
        fmt(levels.target, 4),
        fmt(levels.stop_pct, 2),
        fmt(levels.target_pct, 2),
        rr_style(levels.risk_reward),
        fmt(levels.risk_reward, 2),
        fmt(snap.rsi14, 2),
        fmt(snap.adx14, 2),
        fmt(snap.atr_pct, 2),
        fmt(snap.volume_ratio(), 2),
        fmt(snap.cmf20, 3),
        escape(&badges),
    );
}

/// Renders and writes the report atomically.
pub async fn write_report(path: &Path, rows: &[ReportRow], ctx: &ReportContext) -> anyhow::Result<()> {
    let html = render(rows, ctx);
    write_atomic(path, html.as_bytes())
        .await
        .with_context(|| format!("writing report {}", path.display()))?;
    log::info!("report written to {} ({} rows)", path.display(), rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorSnapshot;
    use crate::levels::TradeLevels;
    use crate::models::{AuxSignals, Instrument};
    use crate::signals::ScoreCard;
    use chrono::TimeZone;

    fn ctx(mode: Mode) -> ReportContext {
        let config = AppConfig {
            mode,
            ..AppConfig::default()
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        ReportContext::new(&config, at)
    }

    fn row(symbol: &str, rr: Option<f64>) -> ReportRow {
        ReportRow {
            instrument: Instrument::new(symbol, MarketKind::Futures),
            signal: Signal::Long,
            score: Some(ScoreCard {
                score: 7,
                strong: vec!["Golden Cross"],
                moderate: vec!["MACD Up"],
            }),
            levels: TradeLevels {
                entry: 100.0,
                stop: Some(97.0),
                target: Some(104.0),
                stop_pct: Some(3.0),
                target_pct: Some(4.0),
                risk_reward: rr,
            },
            snapshot: IndicatorSnapshot {
                close: Some(100.0),
                rsi14: Some(55.123),
                ..IndicatorSnapshot::default()
            },
            aux: Some(AuxSignals {
                funding_rate: Some(0.0001),
                oi_change_pct: None,
            }),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>&'\""), "&lt;b&gt;&amp;&#39;&quot;");
    }

    #[test]
    fn empty_report_is_valid_and_flagged() {
        let html = render(&[], &ctx(Mode::Filter));
        assert!(html.contains("(NO DATA)</title>"));
        assert!(html.contains("<th class='left'>Symbol</th>"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(!html.contains("<tr><td"));
    }

    #[test]
    fn filter_row_formats_and_dashes() {
        let html = render(&[row("BTCUSDT", None)], &ctx(Mode::Filter));
        assert!(html.contains("<td class='sym'>BTCUSDT</td><td class='side long'>LONG</td>"));
        assert!(html.contains("<td>100.0000</td><td>97.0000</td><td>104.0000</td>"));
        assert!(html.contains("<td>0.00010</td><td>-</td><td>55.12</td>"));
        assert!(html.contains("2024-03-01 12:00:00 UTC"));
        assert!(!html.contains("NO DATA"));
    }

    #[test]
    fn score_rows_colour_risk_reward() {
        let rows = [row("A", Some(1.6)), row("B", Some(1.2)), row("C", Some(0.5)), row("D", None)];
        let html = render(&rows, &ctx(Mode::Score));
        assert!(html.contains("<td style='background:#064e3b;'>1.60</td>"));
        assert!(html.contains("<td style='background:#78350f;'>1.20</td>"));
        assert!(html.contains("<td style='background:#7f1d1d;'>0.50</td>"));
        assert!(html.contains("<td>-</td>"));
        assert!(html.contains("<td class='left'>⭐ Golden Cross, • MACD Up</td>"));
        assert!(html.contains("Long/Short Dashboard"));
    }

    #[test]
    fn symbols_are_escaped() {
        let html = render(&[row("<script>", Some(2.0))], &ctx(Mode::Filter));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[tokio::test]
    async fn report_is_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public").join("futures.html");
        write_report(&path, &[row("ETHUSDT", Some(1.33))], &ctx(Mode::Filter))
            .await
            .unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("ETHUSDT"));
        assert!(!path.with_file_name("futures.html.tmp").exists());
    }
}
