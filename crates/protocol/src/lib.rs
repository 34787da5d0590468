//! Wire types for the tray method channel.
//!
//! The application drives the tray with five calls (`setIcon`,
//! `setContextMenu`, `popUpContextMenu`, `destroy`, `getBounds`) and receives
//! three notifications (`onTrayMenuItemClick`, `onTrayIconMouseDown`,
//! `onTrayIconRightMouseDown`). Calls are decoded into the closed
//! [`TrayMethod`] enumeration; anything else is reported as unsupported.

pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{CHANNEL_NAME, MethodName};
pub use envelope::{MethodCall, MethodResponse, Reply, Request};
pub use messages::{MenuItemClickEvent, TrayMethod, TrayNotification};
pub use types::{Bounds, MenuItem};

/// Errors produced while decoding channel traffic.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("missing arguments for {0}")]
    MissingArguments(String),

    #[error("invalid arguments for {method}: {source}")]
    InvalidArguments {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}
