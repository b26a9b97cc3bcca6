use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ToolDefinition, ToolResult, encode, input_schema, parse_input};
use crate::market_data::MarketData;

const NAME: &str = "get_balance_sheet";

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct BalanceSheetInput {
    #[schemars(description = "The ticker symbol, e.g. AAPL.")]
    ticker: String,
}

async fn get_balance_sheet_impl(
    market: Arc<dyn MarketData>,
    input: serde_json::Value,
) -> ToolResult {
    let input: BalanceSheetInput = parse_input(NAME, input)?;
    let sheet = market.balance_sheet(&input.ticker).await?;
    encode(&sheet)
}

pub(crate) fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME,
        description: "Get the balance sheet for the given ticker symbol and year.",
        input_schema: input_schema::<BalanceSheetInput>(),
        handler: |market, input| Box::pin(get_balance_sheet_impl(market, input)),
    }
}
