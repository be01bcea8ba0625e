mod app;
mod backend;
mod config;
mod sync;
mod topology;
mod util;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::backend::HttpApi;
use crate::config::{DEFAULT_ACTIVITY_PAGE, DEFAULT_API_URL, DashboardConfig};

const DEFAULT_LOG_FILTER: &str = "info,meshpulse=debug";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the operations backend.
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Activity entries requested per poll (1-50).
    #[arg(long, default_value_t = DEFAULT_ACTIVITY_PAGE)]
    activity_limit: usize,

    /// Tracing filter directives; falls back to RUST_LOG.
    #[arg(long)]
    log_filter: Option<String>,
}

fn init_tracing(directives: Option<&str>) -> anyhow::Result<()> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log filter `{directives}`"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref())?;

    let config = DashboardConfig::new(args.api_url, args.activity_limit);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("meshpulse-sync")
        .build()
        .context("failed to start the async runtime")?;
    let api = HttpApi::new(&config.api_url, config.request_timeout)?;
    tracing::info!(api_url = %config.api_url, "starting dashboard");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "meshpulse",
        options,
        Box::new(move |cc| Ok(Box::new(app::DashboardApp::new(cc, config, api, runtime)))),
    )
    .map_err(|error| anyhow!("dashboard window failed: {error}"))
}
