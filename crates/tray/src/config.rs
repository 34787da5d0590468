//! Tray controller configuration.

use serde::{Deserialize, Serialize};

use crate::backend::WM_USER;

/// Corner of the popup menu placed at the cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PopupAlignment {
    /// Menu opens above and to the right of the cursor.
    #[default]
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

/// Configuration for the tray controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayConfig {
    /// Numeric id of the notification icon within its owner window.
    #[serde(default = "default_icon_uid")]
    pub icon_uid: u32,

    /// Private window message used for mouse activity over the icon.
    #[serde(default = "default_callback_message")]
    pub callback_message: u32,

    /// Popup placement relative to the cursor.
    #[serde(default)]
    pub popup_alignment: PopupAlignment,
}

fn default_icon_uid() -> u32 {
    100
}

fn default_callback_message() -> u32 {
    WM_USER + 1
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            icon_uid: default_icon_uid(),
            callback_message: default_callback_message(),
            popup_alignment: PopupAlignment::default(),
        }
    }
}
