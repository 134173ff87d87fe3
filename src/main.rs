//! CLI entry point for the ecoDMS export tool.

use std::process::ExitCode;

use clap::Parser;
use ecodms_export::app_config::load_default_file_config;
use ecodms_export::run_export;
use tracing::{debug, error, info};

mod cli;
mod settings;

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = load_default_file_config();
    let file_config = loaded
        .as_ref()
        .ok()
        .and_then(|loaded| loaded.config.as_ref());

    // Priority: RUST_LOG env var > debug flag/config > quiet flag > default (info)
    let default_level = if settings::debug_enabled(&args, file_config) {
        "debug"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    debug!("Logging initiated");

    let loaded = match loaded {
        Ok(loaded) => loaded,
        Err(err) => {
            error!(error = %err, "Failed to load config file");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = loaded.config.as_ref().and(loaded.path.as_ref()) {
        debug!(path = %path.display(), "Loaded config file");
    }

    let settings = match settings::resolve_settings(&args, loaded.config.as_ref()) {
        Ok(settings) => settings,
        Err(err) => {
            error!("Invalid configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    debug!(
        base_url = %settings.base_url,
        archive_id = settings.archive_id,
        export_root = %settings.options.export_root.display(),
        cache_dir = ?settings.cache_dir,
        template = %settings.options.template,
        "Settings resolved"
    );

    match run_export(&settings).await {
        Ok(stats) => {
            info!(
                documents = stats.documents(),
                downloaded = stats.downloaded(),
                from_cache = stats.from_cache(),
                fetch_failed = stats.fetch_failed(),
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Export failed");
            ExitCode::FAILURE
        }
    }
}
