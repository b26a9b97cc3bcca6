mod openai;

pub use openai::{
    ChatMessage, ChatModel, ChunkStream, ModelConfig, OpenAiClient, ToolCall, ToolCallAccumulator,
    ToolSpec,
};

#[cfg(test)]
pub(crate) use openai::{ChatStreamChunk, FunctionDelta, StreamChoice, StreamDelta, ToolCallDelta};
