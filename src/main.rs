use clap::Parser;
use coming_attractions::config::Cli;
use coming_attractions::html::build_client;
use coming_attractions::{fetch_all, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    // One client for every venue so cookies and connections are shared.
    let client = build_client(cli.request_timeout())?;
    let scrapers = cli.scrapers();

    let report = fetch_all(&scrapers, &client).await;
    report.write_json(&cli.output)?;

    info!(path = %cli.output.display(), "saved combined results");
    Ok(())
}
