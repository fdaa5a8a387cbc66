mod app;
mod cloud;
mod config;
mod error;
mod events;
mod import;
mod popover;
mod upload;
mod utils;

use app::FileImportApp;
use cloud::{CloudImportBridge, CloudSourceRegistry, SurfaceCatalog};
use config::AppConfig;
use eframe::CreationContext;
use tracing::{info, warn};
use upload::HttpTransport;

fn configure_logging(fallback: Option<&str>) {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback.unwrap_or("info")))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loaded = AppConfig::load();
    configure_logging(
        loaded
            .as_ref()
            .ok()
            .and_then(|config| config.log_filter.as_deref()),
    );
    let config = loaded.unwrap_or_else(|e| {
        warn!("Could not load {:?}: {}, using defaults", AppConfig::path(), e);
        AppConfig::default()
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let transport = HttpTransport::new(&config, runtime.handle().clone())?;
    let bridge = CloudImportBridge::new(
        CloudSourceRegistry::from_values(&config.cloud_sources),
        Box::new(SurfaceCatalog::with_builtin()),
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([400.0, 500.0]),
        ..Default::default()
    };

    info!("Starting file import UI");
    eframe::run_native(
        "File Import",
        options,
        Box::new(move |cc: &CreationContext| {
            Box::new(FileImportApp::new(cc, config, transport, bridge))
        }),
    )?;

    drop(runtime);
    Ok(())
}
