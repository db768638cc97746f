//! One-shot market analysis requests
//!
//! The analyst is asked for a fixed JSON object. Replies are sometimes
//! wrapped in a markdown code fence, which is stripped before decoding.

use serde::{Deserialize, Serialize};

use crate::{
    coin::{Coin, DateRange},
    error::{Error, Result},
    providers::ChatProvider,
    types::{ChatRequest, EncodedImage, Model, UserTurn},
};

/// Persona shared by chat and analysis requests
pub const ANALYST_SYSTEM_PROMPT: &str = "You are a cryptocurrency analyst specializing in meme coins. \
You read price action, support and resistance levels, and common indicators, and you weigh \
social sentiment, volume spikes, whale activity and liquidity. Keep your analysis objective \
and data-driven so traders can make informed decisions.";

const RESPONSE_FORMAT: &str = r#"Reply with a single JSON object containing exactly these string fields:
{
  "general_trend": "current trend (bullish, bearish or neutral), its strength, recent moves and key levels",
  "indicator_analysis": "at least three indicators and whether they confirm the trend or signal a reversal",
  "chart_pattern": "recognizable chart patterns and whether they point to a breakout, reversal or continuation",
  "future_market_prediction": "forecast with price levels, risks and scenarios to watch"
}"#;

/// Structured analysis returned by the analyst
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub general_trend: String,
    pub indicator_analysis: String,
    pub chart_pattern: String,
    pub future_market_prediction: String,
}

/// Coin statistics and a price series to analyze
#[derive(Debug, Clone)]
pub struct CoinSnapshot {
    pub coin: Coin,
    /// Prices ordered by timestamp, oldest first
    pub prices: Vec<f64>,
    pub range: DateRange,
}

fn system_prompt(fallback: &str) -> String {
    format!("{}\n\n{}\n\n{}", ANALYST_SYSTEM_PROMPT, RESPONSE_FORMAT, fallback)
}

/// Build the request for a coin's statistics and price history
pub fn coin_analysis_request(snapshot: &CoinSnapshot) -> ChatRequest {
    let coin = &snapshot.coin;
    let prices = snapshot
        .prices
        .iter()
        .enumerate()
        .map(|(i, price)| format!("\"{}\": {}", i + 1, price))
        .collect::<Vec<_>>()
        .join(", ");

    let text = format!(
        "Analyze the following meme coin information and historical price data:\n\
         - Coin Name: {}\n\
         - Symbol: {}\n\
         - Current Price: {}\n\
         - Price Change ({}): {}%\n\
         - Volume (24h): ${}\n\
         - Price Data (ordered by timestamp): {{{}}}\n\
         - Date Range: {}\n\
         - Market Cap: {}",
        coin.name,
        coin.symbol,
        coin.price,
        snapshot.range,
        coin.price_change(snapshot.range),
        coin.volume_24h,
        prices,
        snapshot.range,
        coin.effective_market_cap(),
    );

    ChatRequest::new(UserTurn::text(text)).with_system_prompt(system_prompt(
        "If the data is insufficient, return a general market analysis in the same format.",
    ))
}

/// Build the request for a chart screenshot
pub fn chart_analysis_request(chart: EncodedImage) -> ChatRequest {
    ChatRequest::new(UserTurn::with_images(
        "Analyze the chart and provide key insights, including the meme coin's general trend, \
         indicator analysis, chart pattern, and future market prediction.",
        vec![chart],
    ))
    .with_system_prompt(system_prompt(
        "If the image cannot be read, return a general analysis of meme coins and the market in the same format.",
    ))
}

/// Remove a surrounding ```json (or bare ```) fence
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Decode an analyst reply
pub fn parse_analysis(reply: &str) -> Result<MarketAnalysis> {
    serde_json::from_str(strip_code_fence(reply)).map_err(|e| {
        Error::UnexpectedResponse(format!("analysis is not in the expected format: {}", e))
    })
}

/// Send an analysis request and decode the reply
pub async fn analyze(
    provider: &dyn ChatProvider,
    model: &Model,
    request: &ChatRequest,
) -> Result<MarketAnalysis> {
    let reply = provider.complete(model, request).await?;
    tracing::debug!(len = reply.len(), "analysis reply received");
    parse_analysis(&reply)
}
