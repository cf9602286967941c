//! podforge CLI entry point.

use anyhow::Result;
use clap::Parser;
use podforge::cli::{commands, Cli, Commands};
use podforge::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then overlay the environment once
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };
    settings.apply_env();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("podforge={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    settings.validate()?;

    // Execute command
    match &cli.command {
        Commands::Instant {
            topic,
            document,
            output,
        } => {
            commands::run_instant(topic, document, output, settings).await?;
        }

        Commands::Create { topic, collection } => {
            commands::run_create(topic, collection.clone(), settings).await?;
        }

        Commands::Upload {
            collection,
            document,
        } => {
            commands::run_upload(collection, document, settings).await?;
        }

        Commands::Finish {
            topic,
            collection,
            output,
        } => {
            commands::run_finish(topic, collection, output, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
