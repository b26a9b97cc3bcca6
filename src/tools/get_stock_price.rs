use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ToolDefinition, ToolResult, encode, input_schema, parse_input};
use crate::market_data::MarketData;

const NAME: &str = "get_stock_price";

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct StockPriceInput {
    #[schemars(description = "The ticker symbol, e.g. AAPL.")]
    ticker: String,
}

async fn get_stock_price_impl(market: Arc<dyn MarketData>, input: serde_json::Value) -> ToolResult {
    let input: StockPriceInput = parse_input(NAME, input)?;
    let price = market.latest_close(&input.ticker).await?;
    encode(&price)
}

pub(crate) fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME,
        description: "Get the current stock price for a given ticker symbol.",
        input_schema: input_schema::<StockPriceInput>(),
        handler: |market, input| Box::pin(get_stock_price_impl(market, input)),
    }
}
