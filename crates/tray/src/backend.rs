//! Native shell service behind the tray controller.
//!
//! Handles are opaque integers so the controller never touches raw
//! platform types; each backend maps them to its own representation.

use std::path::{Path, PathBuf};

use crate::config::PopupAlignment;

/// `WM_USER`: first message number free for private use.
pub const WM_USER: u32 = 0x0400;
/// `WM_COMMAND`: a menu item was chosen (`wParam` carries its ID).
pub const WM_COMMAND: u32 = 0x0111;
/// `WM_LBUTTONUP`: primary button released.
pub const WM_LBUTTONUP: u32 = 0x0202;
/// `WM_RBUTTONUP`: secondary button released.
pub const WM_RBUTTONUP: u32 = 0x0205;

/// Owning top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub isize);

/// Loaded icon image. The null handle stands for "no image".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IconHandle(pub isize);

impl IconHandle {
    pub const NULL: IconHandle = IconHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Popup menu widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MenuHandle(pub isize);

/// Screen position in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Screen rectangle in physical pixels (right/bottom exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Identifies a notification icon to the shell: owner window plus uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotifyIconId {
    pub window: WindowHandle,
    pub uid: u32,
}

/// Registration record of a notification icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyIconData {
    pub id: NotifyIconId,
    /// Message posted to the owner window for mouse activity over the icon.
    pub callback_message: u32,
    pub icon: IconHandle,
}

/// One entry appended to a popup menu widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeMenuEntry {
    Separator,
    Item {
        command_id: u32,
        title: String,
        enabled: bool,
    },
}

/// A raw message delivered to the owning window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMessage {
    pub window: WindowHandle,
    pub message: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl WindowMessage {
    pub fn new(window: WindowHandle, message: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            window,
            message,
            wparam,
            lparam,
        }
    }

    /// `WM_COMMAND` as sent when a popup menu item is chosen.
    pub fn menu_command(window: WindowHandle, command_id: u32) -> Self {
        Self::new(window, WM_COMMAND, command_id as usize, 0)
    }
}

/// Errors reported by a shell backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to load icon {}: {reason}", path.display())]
    IconLoad { path: PathBuf, reason: String },

    #[error("{call} failed: {reason}")]
    Native { call: &'static str, reason: String },

    #[error("unknown menu handle {0:?}")]
    UnknownMenu(MenuHandle),
}

impl BackendError {
    pub fn native(call: &'static str, reason: impl ToString) -> Self {
        BackendError::Native {
            call,
            reason: reason.to_string(),
        }
    }
}

/// The notification-area, popup-menu and image services of the platform.
pub trait ShellBackend {
    /// Top-level window that owns the icon and receives its messages.
    fn main_window(&self) -> WindowHandle;

    /// Small-icon metrics `(width, height)`.
    fn small_icon_size(&self) -> (i32, i32);

    fn load_icon(&mut self, path: &Path, width: i32, height: i32)
    -> Result<IconHandle, BackendError>;

    fn destroy_icon(&mut self, icon: IconHandle);

    fn add_notify_icon(&mut self, data: &NotifyIconData) -> Result<(), BackendError>;

    fn modify_notify_icon(&mut self, data: &NotifyIconData) -> Result<(), BackendError>;

    fn delete_notify_icon(&mut self, id: &NotifyIconId) -> Result<(), BackendError>;

    /// Screen rectangle of a registered icon.
    fn notify_icon_rect(&self, id: &NotifyIconId) -> Result<Rect, BackendError>;

    fn create_popup_menu(&mut self) -> Result<MenuHandle, BackendError>;

    fn destroy_menu(&mut self, menu: MenuHandle);

    fn menu_item_count(&self, menu: MenuHandle) -> usize;

    fn remove_menu_item_at(&mut self, menu: MenuHandle, position: usize)
    -> Result<(), BackendError>;

    fn append_menu_entry(
        &mut self,
        menu: MenuHandle,
        entry: &NativeMenuEntry,
    ) -> Result<(), BackendError>;

    fn cursor_position(&self) -> Result<Point, BackendError>;

    fn set_foreground_window(&mut self, window: WindowHandle);

    /// Shows `menu` at `at` and runs the modal menu loop until it closes.
    /// A chosen item arrives later as `WM_COMMAND` on `owner`.
    fn track_popup_menu(
        &mut self,
        menu: MenuHandle,
        at: Point,
        alignment: PopupAlignment,
        owner: WindowHandle,
    ) -> Result<(), BackendError>;

    /// Platform default processing for a message the tray does not consume.
    fn default_window_proc(&mut self, message: &WindowMessage) -> isize;
}
