//! JSON-lines framing shared by both event loops.
//!
//! Each stdin line is one [`Request`]; each stdout line is either a [`Reply`]
//! or a notification [`MethodCall`]. Logs never go to stdout.

use std::io::{self, Write};

use serde::Serialize;
use traybridge_protocol::constants::ERR_CODE_INVALID_ARGUMENTS;
use traybridge_protocol::{MethodResponse, Reply, Request, TrayNotification};
use traybridge_tray::{EventSink, ShellBackend, TrayController};

/// Writes replies and notifications as one JSON document per line.
#[derive(Debug)]
pub struct LineWriter<W: Write> {
    out: W,
}

impl<W: Write> LineWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn write_reply(&mut self, reply: &Reply) -> io::Result<()> {
        self.write_line(reply)
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, value)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

impl<W: Write> EventSink for LineWriter<W> {
    fn emit(&mut self, notification: TrayNotification) {
        let written = notification
            .to_call()
            .map_err(io::Error::from)
            .and_then(|call| self.write_line(&call));
        if let Err(e) = written {
            tracing::warn!(method = %notification.name(), "failed to send notification: {e}");
        }
    }
}

/// Controller whose notifications go to a [`LineWriter`].
pub type LineTray<B, W> = TrayController<B, LineWriter<W>>;

/// Runs one request line and writes its reply. Blank lines are skipped.
pub fn handle_line<B: ShellBackend, W: Write>(
    tray: &mut LineTray<B, W>,
    line: &str,
) -> io::Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    let reply = match serde_json::from_str::<Request>(line) {
        Ok(request) => {
            let (id, call) = request.into_parts();
            tracing::debug!(%id, method = %call.method, "request");
            let response = tray.handle_call(&call);
            Reply::new(id, response)
        }
        Err(e) => {
            tracing::warn!("malformed request: {e}");
            Reply::new(
                request_id(line),
                MethodResponse::error(ERR_CODE_INVALID_ARGUMENTS, format!("malformed request: {e}")),
            )
        }
    };
    tray.sink_mut().write_reply(&reply)
}

/// Best-effort `id` of a line that failed to parse as a request.
fn request_id(line: &str) -> String {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_owned))
        .unwrap_or_default()
}

/// Shows the configured startup icon, if any.
pub fn show_startup_icon<B: ShellBackend, S: EventSink>(
    tray: &mut TrayController<B, S>,
    icon_path: Option<&str>,
) {
    let Some(path) = icon_path else {
        return;
    };
    match tray.set_icon(path) {
        Ok(outcome) => tracing::info!(path, ?outcome, "startup icon shown"),
        Err(e) => tracing::warn!(path, "failed to show startup icon: {e}"),
    }
}
