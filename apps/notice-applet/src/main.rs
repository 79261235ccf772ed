//! Notice applet entry point.

mod app;
mod config;
mod notifications;
mod tray_backend;
mod viewer;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting notice applet"
    );

    let config = config::Config::load()?;
    tracing::info!(agent = %config.agent_bus_name, unit = %config.agent_unit, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("applet shut down cleanly");
    Ok(())
}
