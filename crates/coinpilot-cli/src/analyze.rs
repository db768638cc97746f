//! `coinpilot analyze` - one-shot market analysis

use std::path::Path;

use anyhow::Context;
use coinpilot_ai::{
    Attachment, Model,
    analysis::{self, CoinSnapshot, MarketAnalysis},
    coin::{Coin, CoinRecord, DateRange},
    providers::ChatProvider,
};

/// Load a coin record (either listing shape) from a JSON file
pub fn load_coin(path: &Path) -> anyhow::Result<Coin> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading coin file {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("coin file is not valid JSON")?;
    let record = CoinRecord::from_value(value).context("unrecognized coin record")?;
    Ok(record.into())
}

pub async fn analyze_coin(
    provider: &dyn ChatProvider,
    model: &Model,
    path: &Path,
    range: DateRange,
    prices: Vec<f64>,
) -> anyhow::Result<MarketAnalysis> {
    let coin = load_coin(path)?;
    tracing::debug!(coin = %coin.symbol, %range, points = prices.len(), "analyzing coin");
    let request = analysis::coin_analysis_request(&CoinSnapshot {
        coin,
        prices,
        range,
    });
    Ok(analysis::analyze(provider, model, &request).await?)
}

pub async fn analyze_chart(
    provider: &dyn ChatProvider,
    model: &Model,
    image: &Path,
) -> anyhow::Result<MarketAnalysis> {
    let chart = Attachment::file(image)
        .encode()
        .await
        .with_context(|| format!("reading chart {}", image.display()))?;
    let request = analysis::chart_analysis_request(chart);
    Ok(analysis::analyze(provider, model, &request).await?)
}

/// Render an analysis for the terminal
pub fn format_analysis(analysis: &MarketAnalysis) -> String {
    [
        ("General trend", &analysis.general_trend),
        ("Indicators", &analysis.indicator_analysis),
        ("Chart pattern", &analysis.chart_pattern),
        ("Outlook", &analysis.future_market_prediction),
    ]
    .iter()
    .map(|(title, body)| format!("{}:\n  {}", title, body.trim()))
    .collect::<Vec<_>>()
    .join("\n\n")
}
