use serde::{Deserialize, Serialize};

/// One entry of a context menu as sent by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub is_separator_item: bool,
}

fn default_true() -> bool {
    true
}

impl MenuItem {
    /// Creates an enabled, clickable item.
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            is_enabled: true,
            is_separator_item: false,
        }
    }

    /// Creates a separator entry.
    pub fn separator(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: String::new(),
            is_enabled: true,
            is_separator_item: true,
        }
    }

    /// Returns this item with `is_enabled` set to `false`.
    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }
}

/// Tray icon rectangle in logical (device-independent) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
