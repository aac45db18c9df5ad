pub mod adx;
pub mod analysis;
pub mod cli;
pub mod client;
pub mod comfy_table;
pub mod config;
pub mod error;
pub mod filter_utils;
pub mod find_tickers;
pub mod html_report;
pub mod indicators;
pub mod klines;
pub mod levels;
pub mod models;
pub mod money_flow;
pub mod ranking;
pub mod signals;
pub mod source;
pub mod storage_utils;
pub mod wilder;

pub use analysis::{ReportRow, ScreenOutcome, Screener};
pub use cli::Cli;
pub use config::AppConfig;
pub use source::{BinanceSource, MarketSource};
