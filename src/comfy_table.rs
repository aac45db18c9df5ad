use crate::analysis::ReportRow;
use crate::signals::Signal;
use chrono::{DateTime, Utc};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_BORDERS_ONLY,
};

fn get_visibility_ratio(current: f64, top: f64) -> f64 {
    let ratio = 0.4 + 0.6 * (current / top);
    ratio.clamp(0.4, 1.0)
}

fn signal_color(signal: Signal, ratio: f64) -> Color {
    let bright = (255.0 * ratio) as u8;
    match signal {
        Signal::Long => Color::Rgb { r: 0, g: bright, b: 0 },
        Signal::Short => Color::Rgb { r: bright, g: 0, b: 0 },
        Signal::Neutral => Color::DarkGrey,
    }
}

/// Top `limit` rows as a terminal table. Brightness fades with score so the
/// strongest rows stand out.
pub fn summary_table(rows: &[ReportRow], limit: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Rank").add_attribute(Attribute::Bold),
            Cell::new("Symbol").add_attribute(Attribute::Bold),
            Cell::new("Signal").add_attribute(Attribute::Bold),
            Cell::new("Score")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
            Cell::new("R/R")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        ]);

    let top_score = rows.iter().map(ReportRow::score_value).max().unwrap_or(0);
    let safe_top = if top_score == 0 { 1.0 } else { top_score as f64 };

    for (rank, row) in rows.iter().take(limit).enumerate() {
        let ratio = if row.score.is_some() {
            get_visibility_ratio(row.score_value() as f64, safe_top)
        } else {
            1.0
        };
        let cyan_val = (255.0 * ratio) as u8;

        let score = match &row.score {
            Some(card) => card.score.to_string(),
            None => "-".to_string(),
        };
        let rr = row
            .levels
            .risk_reward
            .map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));

        table.add_row(vec![
            Cell::new(rank + 1).fg(Color::DarkGrey),
            Cell::new(&row.instrument.symbol).fg(Color::Rgb {
                r: 0,
                g: cyan_val,
                b: cyan_val,
            }),
            Cell::new(row.signal).fg(signal_color(row.signal, ratio)),
            Cell::new(score).set_alignment(CellAlignment::Right),
            Cell::new(rr).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

pub fn print_summary(rows: &[ReportRow], limit: usize, generated_at: DateTime<Utc>) {
    if rows.is_empty() {
        println!("No rows to show.");
        return;
    }
    let title = format!(
        "(Data taken at {} UTC)",
        generated_at.format("%d-%m-%Y %H:%M:%S")
    );
    println!("\n{}\n{}", title, summary_table(rows, limit));
}
