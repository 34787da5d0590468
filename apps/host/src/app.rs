//! Headless event loop: stdin requests on the tokio runtime.

use std::io::Stdout;

use tokio::io::{AsyncBufReadExt, BufReader};
use traybridge_tray::{HeadlessBackend, TrayController};

use crate::config::Config;
use crate::session::{self, LineTray, LineWriter};

/// Serves requests until stdin closes or ctrl-c is received.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let mut tray: LineTray<HeadlessBackend, Stdout> = TrayController::new(
        HeadlessBackend::new(),
        LineWriter::new(std::io::stdout()),
        config.tray.clone(),
    );
    session::show_startup_icon(&mut tray, config.icon_path.as_deref());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!("headless tray ready");

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    session::handle_line(&mut tray, &line)?;
                    pump_posted_messages(&mut tray);
                }
                None => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
            },
            _ = &mut shutdown => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
        }
    }

    if let Err(e) = tray.destroy() {
        tracing::warn!("failed to remove tray icon: {e}");
    }
    Ok(())
}

/// Delivers window messages the in-memory shell posted while handling a
/// request, such as the command chosen from a popup menu.
fn pump_posted_messages(tray: &mut LineTray<HeadlessBackend, Stdout>) {
    let posted = tray.backend_mut().take_posted_messages();
    for message in &posted {
        tray.handle_window_message(message);
    }
}
