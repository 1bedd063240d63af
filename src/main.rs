use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    ao3_tables::logging::init().context("init logging")?;

    let cli = ao3_tables::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    ao3_tables::crawl::run(cli).await.context("crawl")?;

    Ok(())
}
