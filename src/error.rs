//! Error types shared across the market-data, tool, model and agent layers.

use thiserror::Error;

/// Failures raised by the market-data client.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("invalid date {value:?}, expected YYYY-MM-DD: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },

    #[error("no {what} data available for {ticker}")]
    NoData { ticker: String, what: &'static str },

    #[error("market data request failed: {status} - {body}")]
    Status { status: u16, body: String },

    /// Error reported by the Yahoo quote connector.
    #[error("Yahoo Finance error: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid market data url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unexpected market data payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures raised while invoking a tool on behalf of the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        source: serde_json::Error,
    },

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("failed to encode tool result: {0}")]
    Encode(serde_json::Error),
}

/// Failures talking to the chat-completions API.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("malformed stream chunk: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reasons an agent run ended without a final answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("agent stopped after {0} model turns without a final answer")]
    TurnLimit(usize),

    #[error("client disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_data_errors_render_context() {
        let err = MarketDataError::NoData {
            ticker: "ZZZZ".to_string(),
            what: "balance sheet",
        };
        assert_eq!(err.to_string(), "no balance sheet data available for ZZZZ");

        let err = MarketDataError::InvalidTicker(String::new());
        assert_eq!(err.to_string(), "invalid ticker symbol: \"\"");
    }

    #[test]
    fn tool_error_is_transparent_over_market_data() {
        let err: ToolError = MarketDataError::Status {
            status: 404,
            body: "Not Found".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "market data request failed: 404 - Not Found");
    }
}
