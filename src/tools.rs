use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::ai_sdk::ToolSpec;
use crate::error::ToolError;
use crate::market_data::MarketData;

mod get_balance_sheet;
mod get_historical_stock_price;
mod get_news;
mod get_stock_price;

pub(crate) type ToolResult = Result<String, ToolError>;

type ToolHandler =
    fn(Arc<dyn MarketData>, serde_json::Value) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub(crate) struct ToolDefinition {
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    pub(crate) input_schema: serde_json::Value,
    pub(crate) handler: ToolHandler,
}

/// Name-indexed tools the model may call, all backed by one market-data client.
pub struct ToolRegistry {
    market: Arc<dyn MarketData>,
    tools: BTreeMap<&'static str, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        let tools = [
            get_stock_price::definition(),
            get_historical_stock_price::definition(),
            get_balance_sheet::definition(),
            get_news::definition(),
        ]
        .into_iter()
        .map(|tool| (tool.name, tool))
        .collect();

        Self { market, tools }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec::function(tool.name, tool.description, tool.input_schema.clone()))
            .collect()
    }

    /// Runs the named tool with the model's JSON-encoded arguments.
    pub async fn invoke(&self, name: &str, arguments: &str) -> ToolResult {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let input = if arguments.trim().is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(arguments).map_err(|source| ToolError::InvalidArguments {
                tool: tool.name,
                source,
            })?
        };

        info!(tool = tool.name, "tool invoked");
        (tool.handler)(Arc::clone(&self.market), input).await
    }
}

/// Parameter schema for a tool input type, without the `$schema` marker.
fn input_schema<T: JsonSchema>() -> serde_json::Value {
    let mut schema = schema_for!(T).to_value();
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}

fn parse_input<T: DeserializeOwned>(
    tool: &'static str,
    input: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn encode<T: serde::Serialize>(value: &T) -> ToolResult {
    serde_json::to_string(value).map_err(ToolError::Encode)
}
