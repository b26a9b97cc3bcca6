//! In-process fakes for the model and the market-data client.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use crate::ai_sdk::{
    ChatMessage, ChatModel, ChatStreamChunk, ChunkStream, FunctionDelta, StreamChoice,
    StreamDelta, ToolCallDelta, ToolSpec,
};
use crate::error::{MarketDataError, ModelError};
use crate::market_data::{
    BalanceSheet, MarketData, NewsItem, PriceBar, PriceHistory, Result, tabulate,
};

/// Replays one scripted list of chunks per model turn and records every request.
pub(crate) struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<ChatStreamChunk>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    offered_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    pub(crate) fn new(turns: Vec<Vec<ChatStreamChunk>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
            offered_tools: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    /// Tool names sent with each request, in request order.
    pub(crate) fn offered_tools(&self) -> Vec<Vec<String>> {
        self.offered_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> std::result::Result<ChunkStream, ModelError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.offered_tools
            .lock()
            .unwrap()
            .push(tools.iter().map(|tool| tool.function.name.clone()).collect());
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Status {
                status: 500,
                body: "script exhausted".to_string(),
            })?;
        Ok(Box::pin(futures::stream::iter(turn.into_iter().map(Ok::<_, ModelError>))))
    }
}

pub(crate) fn text_chunk(text: &str) -> ChatStreamChunk {
    ChatStreamChunk {
        choices: vec![StreamChoice {
            delta: StreamDelta {
                content: Some(text.to_string()),
                tool_calls: None,
            },
            ..Default::default()
        }],
    }
}

pub(crate) fn text_turn(parts: &[&str]) -> Vec<ChatStreamChunk> {
    parts.iter().map(|part| text_chunk(part)).collect()
}

pub(crate) fn tool_call_turn(id: &str, name: &str, arguments: &str) -> Vec<ChatStreamChunk> {
    vec![ChatStreamChunk {
        choices: vec![StreamChoice {
            delta: StreamDelta {
                content: None,
                tool_calls: Some(vec![ToolCallDelta {
                    index: 0,
                    id: Some(id.to_string()),
                    function: Some(FunctionDelta {
                        name: Some(name.to_string()),
                        arguments: Some(arguments.to_string()),
                    }),
                }]),
            },
            finish_reason: Some("tool_calls".to_string()),
            ..Default::default()
        }],
    }]
}

/// Fixed market data that still rejects empty tickers like the real client.
#[derive(Default)]
pub(crate) struct StaticMarketData {
    calls: Mutex<Vec<String>>,
}

impl StaticMarketData {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn require_ticker(ticker: &str) -> Result<&str> {
    if ticker.trim().is_empty() {
        return Err(MarketDataError::InvalidTicker(ticker.to_string()));
    }
    Ok(ticker)
}

#[async_trait]
impl MarketData for StaticMarketData {
    async fn latest_close(&self, ticker: &str) -> Result<f64> {
        let ticker = require_ticker(ticker)?;
        self.record(format!("latest_close {ticker}"));
        Ok(189.5)
    }

    async fn price_history(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<PriceHistory> {
        let ticker = require_ticker(ticker)?;
        self.record(format!("price_history {ticker} {start_date} {end_date}"));
        Ok(tabulate(&[PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 187.15,
            high: 188.44,
            low: 183.89,
            close: 185.64,
            adjclose: 184.94,
            volume: 82_488_700,
        }]))
    }

    async fn balance_sheet(&self, ticker: &str) -> Result<BalanceSheet> {
        let ticker = require_ticker(ticker)?;
        self.record(format!("balance_sheet {ticker}"));
        let mut sheet = BalanceSheet::new();
        sheet.insert(
            "2023-09-30".to_string(),
            BTreeMap::from([("TotalAssets".to_string(), 352583000000.0)]),
        );
        Ok(sheet)
    }

    async fn news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        let ticker = require_ticker(ticker)?;
        self.record(format!("news {ticker}"));
        Ok(vec![NewsItem {
            uuid: "n-1".to_string(),
            title: "Apple ships new hardware".to_string(),
            publisher: "Example Wire".to_string(),
            link: "https://example.com/apple".to_string(),
            provider_publish_time: 1714000000,
            kind: "STORY".to_string(),
            related_tickers: vec![ticker.to_string()],
        }])
    }
}

pub(crate) fn message_text(message: &ChatMessage) -> Option<&str> {
    match message {
        ChatMessage::System { content }
        | ChatMessage::User { content }
        | ChatMessage::Tool { content, .. } => Some(content),
        ChatMessage::Assistant { content, .. } => content.as_deref(),
    }
}
