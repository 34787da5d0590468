use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name of the method channel shared with the embedding application.
pub const CHANNEL_NAME: &str = "tray_manager";

/// Method identifier carried in the `method` field of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MethodName {
    // Calls from the application to the tray
    #[serde(rename = "setIcon")]
    SetIcon,
    #[serde(rename = "setContextMenu")]
    SetContextMenu,
    #[serde(rename = "popUpContextMenu")]
    PopUpContextMenu,
    #[serde(rename = "destroy")]
    Destroy,
    #[serde(rename = "getBounds")]
    GetBounds,

    // Notifications from the tray to the application
    #[serde(rename = "onTrayMenuItemClick")]
    OnTrayMenuItemClick,
    #[serde(rename = "onTrayIconMouseDown")]
    OnTrayIconMouseDown,
    #[serde(rename = "onTrayIconRightMouseDown")]
    OnTrayIconRightMouseDown,
}

impl MethodName {
    /// Every known method, calls first.
    pub const ALL: [MethodName; 8] = [
        MethodName::SetIcon,
        MethodName::SetContextMenu,
        MethodName::PopUpContextMenu,
        MethodName::Destroy,
        MethodName::GetBounds,
        MethodName::OnTrayMenuItemClick,
        MethodName::OnTrayIconMouseDown,
        MethodName::OnTrayIconRightMouseDown,
    ];

    /// Wire spelling of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            MethodName::SetIcon => "setIcon",
            MethodName::SetContextMenu => "setContextMenu",
            MethodName::PopUpContextMenu => "popUpContextMenu",
            MethodName::Destroy => "destroy",
            MethodName::GetBounds => "getBounds",
            MethodName::OnTrayMenuItemClick => "onTrayMenuItemClick",
            MethodName::OnTrayIconMouseDown => "onTrayIconMouseDown",
            MethodName::OnTrayIconRightMouseDown => "onTrayIconRightMouseDown",
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodName {
    type Err = crate::ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| crate::ProtocolError::UnsupportedMethod(s.to_string()))
    }
}

/// Error code: arguments missing or of the wrong shape.
pub const ERR_CODE_INVALID_ARGUMENTS: &str = "invalid-arguments";
/// Error code: the operation needs a tray icon and none exists.
pub const ERR_CODE_NO_TRAY_ICON: &str = "no-tray-icon";
/// Error code: the native shell rejected the operation.
pub const ERR_CODE_NATIVE: &str = "native-error";
