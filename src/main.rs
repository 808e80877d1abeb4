use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod card;
mod cli;
mod config;
mod links;
mod lock;
mod metadata;
mod preview;
mod storage;
#[cfg(test)]
mod tests;
mod web;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();

    // the app outlives any runtime the daemon starts, so its blocking http
    // client is never dropped from async code
    let app = Arc::new(app::App::open()?);

    cli::run(args.command, app.clone())
}
