mod config;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wayfarer_pipeline::Pipeline;

use crate::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("wayfarer v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let store = args.store()?;
    let geocoder = args.geocoder()?;
    let recognizer = args.recognizer().context("setting up entity recognizer")?;
    let sentiment = args.sentiment()?;

    let mut pipeline = Pipeline::new(
        recognizer,
        geocoder,
        store,
        sentiment,
        args.pipeline_config(),
    );
    let stats = pipeline.run().await?;

    eprintln!(
        "Done: {} blogs, {} places saved ({} unresolved, {} invalid, {} failed) in {:.1}s",
        stats.blogs,
        stats.saved,
        stats.unresolved,
        stats.invalid,
        stats.save_failed,
        stats.elapsed_secs
    );
    Ok(())
}
