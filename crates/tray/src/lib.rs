//! Notification-area icon and context menu behind the `tray_manager` channel.
//!
//! A [`TrayController`] owns the icon, its popup menu and the table mapping
//! application identifiers to native menu command IDs. It runs the five
//! channel methods against a [`ShellBackend`] and turns window messages into
//! notifications delivered to an [`EventSink`]:
//! - `WM_COMMAND` → `onTrayMenuItemClick`
//! - callback message with `WM_LBUTTONUP` → `onTrayIconMouseDown`
//! - callback message with `WM_RBUTTONUP` → `onTrayIconRightMouseDown`
//!
//! # Platform notes
//! - Windows: [`Win32Backend`] drives `Shell_NotifyIconW` and Win32 popup menus
//! - Elsewhere, and in tests: [`HeadlessBackend`] keeps the shell in memory
//! - Every call must happen on the thread that owns the top-level window

mod backend;
mod config;
mod controller;
mod events;
mod headless;
mod index;
mod menu;
#[cfg(windows)]
mod win32;

pub use backend::{
    BackendError, IconHandle, MenuHandle, NativeMenuEntry, NotifyIconData, NotifyIconId, Point,
    Rect, ShellBackend, WM_COMMAND, WM_LBUTTONUP, WM_RBUTTONUP, WM_USER, WindowHandle,
    WindowMessage,
};
pub use config::{PopupAlignment, TrayConfig};
pub use controller::{IconLoad, TrayController, TrayError};
pub use events::{EventSink, notification_channel};
pub use headless::{HEADLESS_WINDOW, HeadlessBackend, PopupRecord};
pub use index::{CommandIdAllocator, IdentifierIndex};
pub use menu::ContextMenu;
#[cfg(windows)]
pub use win32::Win32Backend;
