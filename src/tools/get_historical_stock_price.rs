use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ToolDefinition, ToolResult, encode, input_schema, parse_input};
use crate::market_data::MarketData;

const NAME: &str = "get_historical_stock_price";

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct HistoricalPriceInput {
    #[schemars(description = "The ticker symbol, e.g. AAPL.")]
    ticker: String,
    #[schemars(description = "First day of the range, formatted YYYY-MM-DD.")]
    start_date: String,
    #[schemars(description = "Day after the last day of the range, formatted YYYY-MM-DD.")]
    end_date: String,
}

async fn get_historical_stock_price_impl(
    market: Arc<dyn MarketData>,
    input: serde_json::Value,
) -> ToolResult {
    let input: HistoricalPriceInput = parse_input(NAME, input)?;
    let history = market
        .price_history(&input.ticker, &input.start_date, &input.end_date)
        .await?;
    encode(&history)
}

pub(crate) fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME,
        description: "Get the historical stock price for a given ticker symbol and a start and end date.",
        input_schema: input_schema::<HistoricalPriceInput>(),
        handler: |market, input| Box::pin(get_historical_stock_price_impl(market, input)),
    }
}
