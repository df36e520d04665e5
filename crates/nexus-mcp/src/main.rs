use clap::Parser as _;
use nexus_mcp::config::Cli;
use nexus_mcp::{logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let settings = cli.into_settings()?;
    server::run(settings).await
}
