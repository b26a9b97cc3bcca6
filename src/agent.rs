use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::ai_sdk::{ChatMessage, ChatModel, ToolCall, ToolCallAccumulator, ToolSpec};
use crate::checkpoint::MemorySaver;
use crate::error::AgentError;
use crate::tools::ToolRegistry;

pub const SYSTEM_PROMPT: &str = "You are a stock analyssis assistant. You have the ability to get real-time stock prices, historical stock prices (given a date range), news and balance sheet data for a given ticker symbol.";

pub const DEFAULT_MAX_TURNS: usize = 25;

const FRAGMENT_BUFFER: usize = 64;

/// Tool-calling chat agent. One instance serves every request.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    checkpoints: MemorySaver,
    system_prompt: String,
    max_turns: usize,
}

struct Turn {
    text: String,
    tool_calls: Vec<ToolCall>,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, checkpoints: MemorySaver) -> Self {
        debug!(tools = ?tools.names().collect::<Vec<_>>(), "agent tools registered");
        Self {
            model,
            tools,
            checkpoints,
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    /// Starts a run in the background and returns its text fragments.
    ///
    /// Dropping the returned stream stops the run at the next model read.
    pub fn stream(self: Arc<Self>, thread_id: String, content: String) -> ReceiverStream<String> {
        let (tx, rx) = mpsc::channel(FRAGMENT_BUFFER);
        let span = info_span!("agent_run", run_id = %Uuid::new_v4(), thread_id = %thread_id);

        tokio::spawn(
            async move {
                match self.run(&thread_id, content, &tx).await {
                    Ok(()) => {
                        let threads = self.checkpoints.thread_count().await;
                        info!(threads, "agent run finished");
                    }
                    Err(AgentError::Disconnected) => info!("client disconnected, run stopped"),
                    Err(err) => error!(error = %err, "agent run failed"),
                }
            }
            .instrument(span),
        );

        ReceiverStream::new(rx)
    }

    /// Runs one user message to completion against the thread's history.
    ///
    /// The history stays locked for the whole run, so turns on one thread
    /// never interleave. A turn is committed only once it and its tool
    /// results are complete.
    pub(crate) async fn run(
        &self,
        thread_id: &str,
        content: String,
        fragments: &mpsc::Sender<String>,
    ) -> Result<(), AgentError> {
        let thread = self.checkpoints.thread(thread_id).await;
        let mut history = thread.lock().await;
        if fragments.is_closed() {
            return Err(AgentError::Disconnected);
        }
        if history.is_empty() {
            history.push(ChatMessage::system(self.system_prompt.clone()));
        }
        history.push(ChatMessage::user(content));

        let tools = self.tools.specs();
        for turn_index in 0..self.max_turns {
            let turn = self.model_turn(&history, &tools, fragments).await?;
            if turn.tool_calls.is_empty() {
                history.push(ChatMessage::assistant(turn.text, Vec::new()));
                return Ok(());
            }

            debug!(
                turn = turn_index,
                calls = turn.tool_calls.len(),
                "model requested tools"
            );
            let mut results = Vec::with_capacity(turn.tool_calls.len());
            for call in &turn.tool_calls {
                let output = self.execute_tool(call).await;
                results.push(ChatMessage::tool(call.id.clone(), output));
            }

            history.push(ChatMessage::assistant(turn.text, turn.tool_calls));
            history.extend(results);
        }

        Err(AgentError::TurnLimit(self.max_turns))
    }

    async fn model_turn(
        &self,
        history: &[ChatMessage],
        tools: &[ToolSpec],
        fragments: &mpsc::Sender<String>,
    ) -> Result<Turn, AgentError> {
        let mut chunks = tokio::select! {
            biased;
            _ = fragments.closed() => return Err(AgentError::Disconnected),
            chunks = self.model.stream_chat(history, tools) => chunks?,
        };

        let mut text = String::new();
        let mut tool_calls = ToolCallAccumulator::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = fragments.closed() => return Err(AgentError::Disconnected),
                next = chunks.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };

            for choice in chunk?.choices {
                if let Some(delta) = choice.delta.content.filter(|delta| !delta.is_empty()) {
                    text.push_str(&delta);
                    fragments
                        .send(delta)
                        .await
                        .map_err(|_| AgentError::Disconnected)?;
                }
                for delta in choice.delta.tool_calls.into_iter().flatten() {
                    tool_calls.push(delta);
                }
            }
        }

        Ok(Turn {
            text,
            tool_calls: tool_calls.finish(),
        })
    }

    /// Tool failures are handed back to the model as the tool's output.
    async fn execute_tool(&self, call: &ToolCall) -> String {
        match self
            .tools
            .invoke(&call.function.name, &call.function.arguments)
            .await
        {
            Ok(output) => output,
            Err(err) => {
                warn!(tool = %call.function.name, error = %err, "tool call failed");
                format!("Error: {err}\n Please fix your mistakes.")
            }
        }
    }
}
