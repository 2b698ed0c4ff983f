use anyhow::Result;
use clap::Parser;
use sitestock::cli::Cli;
use sitestock::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run().await
}
