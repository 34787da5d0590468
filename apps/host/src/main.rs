//! traybridge host entry point.
//!
//! Serves the `tray_manager` channel as JSON lines: requests on stdin, replies
//! and notifications on stdout, logs on stderr.

mod app;
mod config;
#[cfg(windows)]
mod native;
mod session;

use tracing_subscriber::EnvFilter;

use crate::config::{BackendKind, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        channel = traybridge_protocol::CHANNEL_NAME,
        backend = ?config.backend,
        "starting traybridge host"
    );

    match config.backend {
        BackendKind::Headless => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(app::run(config))?;
        }
        #[cfg(windows)]
        BackendKind::Native => native::run(config)?,
        #[cfg(not(windows))]
        BackendKind::Native => anyhow::bail!("the native backend requires Windows"),
    }

    tracing::info!("host shut down cleanly");
    Ok(())
}
