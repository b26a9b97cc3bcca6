use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ToolDefinition, ToolResult, encode, input_schema, parse_input};
use crate::market_data::MarketData;

const NAME: &str = "get_news";

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct NewsInput {
    #[schemars(description = "The ticker symbol, e.g. AAPL.")]
    ticker: String,
}

async fn get_news_impl(market: Arc<dyn MarketData>, input: serde_json::Value) -> ToolResult {
    let input: NewsInput = parse_input(NAME, input)?;
    let news = market.news(&input.ticker).await?;
    encode(&news)
}

pub(crate) fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME,
        description: "Get the latest news for a given ticker symbol.",
        input_schema: input_schema::<NewsInput>(),
        handler: |market, input| Box::pin(get_news_impl(market, input)),
    }
}
