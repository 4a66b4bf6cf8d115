use anyhow::Context;
use clap::Parser;
use tracing::debug;

use tradestate::adapter::inbound::cli::command::{Cli, Commands};
use tradestate::adapter::inbound::cli::output::{self, OutputConfig};
use tradestate::adapter::inbound::cli::{check, orders, positions};
use tradestate::infrastructure::bootstrap::StateLayer;
use tradestate::infrastructure::config::settings::Config;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    if let Err(e) = run(cli).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.init_logging();
    debug!(config = %cli.config.display(), "Configuration loaded");

    let layer = StateLayer::build(&config).await?;
    match cli.command {
        Commands::Check => check::execute(&layer).await?,
        Commands::Orders => orders::execute(&layer).await?,
        Commands::Positions(args) => positions::execute(&layer, &args.user).await?,
    }
    Ok(())
}
