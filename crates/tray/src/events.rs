//! Outbound notification delivery.
//!
//! The controller hands every [`TrayNotification`] to an [`EventSink`]. A
//! channel sender lets another part of the application consume them; the
//! host writes them straight onto its transport.

use std::sync::mpsc;

use traybridge_protocol::TrayNotification;

/// Receives notifications emitted by the tray. Delivery is fire-and-forget.
pub trait EventSink {
    fn emit(&mut self, notification: TrayNotification);
}

impl EventSink for mpsc::Sender<TrayNotification> {
    fn emit(&mut self, notification: TrayNotification) {
        if self.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}

/// Collects notifications in memory.
impl EventSink for Vec<TrayNotification> {
    fn emit(&mut self, notification: TrayNotification) {
        self.push(notification);
    }
}

/// Creates a sink/receiver pair for consuming notifications elsewhere.
pub fn notification_channel() -> (
    mpsc::Sender<TrayNotification>,
    mpsc::Receiver<TrayNotification>,
) {
    mpsc::channel()
}
