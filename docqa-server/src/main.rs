use clap::Parser;
use docqa_server::{AppState, Cli, ServerConfig, run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    let config = ServerConfig::from_cli(cli)?;
    let state = AppState::from_config(&config).await?;
    run_server(&config, state).await
}
