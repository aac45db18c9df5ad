use clap::Parser;
use signal_screener::comfy_table::print_summary;
use signal_screener::html_report::{ReportContext, write_report};
use signal_screener::{AppConfig, BinanceSource, Cli, Screener};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // Step 1: Configuration
    let mut config = AppConfig::load(cli.config.as_deref()).await?;
    cli.apply(&mut config);
    config.validate()?;
    log::info!(
        "{} market, {:?} mode, interval {}, limit {}",
        config.market.kind,
        config.mode,
        config.klines.interval,
        config.kline_limit()
    );

    // Step 2: Screen every instrument
    let source = BinanceSource::new(&config)?;
    let screener = Screener::new(source, config)?;
    let outcome = screener.run().await;

    // Step 3: Write the report
    let config = screener.config();
    let generated_at = chrono::Utc::now();
    let ctx = ReportContext::new(config, generated_at);
    write_report(&config.output_path(), &outcome.rows, &ctx).await?;

    // Step 4: Display Table
    print_summary(&outcome.rows, config.report.summary_rows, generated_at);

    Ok(())
}
