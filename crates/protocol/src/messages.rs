use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::constants::MethodName;
use crate::envelope::MethodCall;
use crate::types::MenuItem;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Arguments of `setIcon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetIconRequest {
    pub icon_path: String,
}

/// Arguments of `setContextMenu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetContextMenuRequest {
    pub menu_items: Vec<MenuItem>,
}

/// Arguments of `getBounds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoundsRequest {
    pub device_pixel_ratio: f64,
}

// ---------------------------------------------------------------------------
// Notification payloads
// ---------------------------------------------------------------------------

/// Payload of `onTrayMenuItemClick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemClickEvent {
    pub identifier: String,
}

// ---------------------------------------------------------------------------
// Typed dispatch
// ---------------------------------------------------------------------------

/// The closed set of operations the tray accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum TrayMethod {
    SetIcon(SetIconRequest),
    SetContextMenu(SetContextMenuRequest),
    PopUpContextMenu,
    Destroy,
    GetBounds(GetBoundsRequest),
}

impl TrayMethod {
    /// Decodes a raw call into a typed operation.
    ///
    /// Unknown method names and notification names yield
    /// [`ProtocolError::UnsupportedMethod`].
    pub fn from_call(call: &MethodCall) -> Result<Self, ProtocolError> {
        match call.method_name()? {
            MethodName::SetIcon => Ok(TrayMethod::SetIcon(call.require_arguments()?)),
            MethodName::SetContextMenu => {
                Ok(TrayMethod::SetContextMenu(call.require_arguments()?))
            }
            MethodName::PopUpContextMenu => Ok(TrayMethod::PopUpContextMenu),
            MethodName::Destroy => Ok(TrayMethod::Destroy),
            MethodName::GetBounds => Ok(TrayMethod::GetBounds(call.require_arguments()?)),
            other => Err(ProtocolError::UnsupportedMethod(other.as_str().to_string())),
        }
    }

    pub fn name(&self) -> MethodName {
        match self {
            TrayMethod::SetIcon(_) => MethodName::SetIcon,
            TrayMethod::SetContextMenu(_) => MethodName::SetContextMenu,
            TrayMethod::PopUpContextMenu => MethodName::PopUpContextMenu,
            TrayMethod::Destroy => MethodName::Destroy,
            TrayMethod::GetBounds(_) => MethodName::GetBounds,
        }
    }
}

/// Notifications emitted by the tray towards the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayNotification {
    /// Primary button released over the icon.
    IconMouseDown,
    /// Secondary button released over the icon.
    IconRightMouseDown,
    /// A context-menu entry was chosen.
    MenuItemClick(MenuItemClickEvent),
}

impl TrayNotification {
    pub fn menu_item_click(identifier: impl Into<String>) -> Self {
        TrayNotification::MenuItemClick(MenuItemClickEvent {
            identifier: identifier.into(),
        })
    }

    pub fn name(&self) -> MethodName {
        match self {
            TrayNotification::IconMouseDown => MethodName::OnTrayIconMouseDown,
            TrayNotification::IconRightMouseDown => MethodName::OnTrayIconRightMouseDown,
            TrayNotification::MenuItemClick(_) => MethodName::OnTrayMenuItemClick,
        }
    }

    /// Encodes the notification as an outbound method call.
    pub fn to_call(&self) -> Result<MethodCall, serde_json::Error> {
        match self {
            TrayNotification::MenuItemClick(event) => {
                MethodCall::new(self.name().as_str(), Some(event))
            }
            _ => Ok(MethodCall::bare(self.name().as_str())),
        }
    }

    /// Decodes an outbound call back into a notification.
    pub fn from_call(call: &MethodCall) -> Result<Self, ProtocolError> {
        match call.method_name()? {
            MethodName::OnTrayIconMouseDown => Ok(TrayNotification::IconMouseDown),
            MethodName::OnTrayIconRightMouseDown => Ok(TrayNotification::IconRightMouseDown),
            MethodName::OnTrayMenuItemClick => {
                Ok(TrayNotification::MenuItemClick(call.require_arguments()?))
            }
            other => Err(ProtocolError::UnsupportedMethod(other.as_str().to_string())),
        }
    }
}
