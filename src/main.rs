mod agent;
mod ai_sdk;
mod checkpoint;
mod config;
mod error;
mod logging;
mod market_data;
mod protocol;
mod server;
mod tools;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use clap::Parser;

use agent::Agent;
use ai_sdk::OpenAiClient;
use checkpoint::MemorySaver;
use config::Cli;
use market_data::YahooFinance;
use tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.log_format)?;

    let model = OpenAiClient::new(cli.model_config())?;
    let tools = ToolRegistry::new(Arc::new(YahooFinance::new()?));
    let agent =
        Agent::new(Arc::new(model), tools, MemorySaver::new()).with_max_turns(cli.max_turns);

    server::run(cli.server_config(), agent).await
}
