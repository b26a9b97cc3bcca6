use clap::{Parser, ValueEnum};

use crate::agent::DEFAULT_MAX_TURNS;
use crate::ai_sdk::ModelConfig;
use crate::server::ServerConfig;

const DEFAULT_BASE_URL: &str = "https://api.thesys.dev/v1/embed";
const DEFAULT_MODEL: &str = "c1/openai/gpt-5/v-20250930";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Streaming stock-analysis chat backend.
#[derive(Debug, Parser)]
#[command(name = "stockchat", version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "STOCKCHAT_LISTEN", default_value = "0.0.0.0:8888")]
    pub listen: String,

    /// API key for the chat-completions endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model name sent with every request
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximum model turns per request before giving up
    #[arg(long, env = "STOCKCHAT_MAX_TURNS", default_value_t = DEFAULT_MAX_TURNS)]
    pub max_turns: usize,

    #[arg(long, env = "STOCKCHAT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            listen: self.listen.clone(),
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
        }
    }
}
