//! Win32 shell backend: `Shell_NotifyIconW`, popup menus and `LoadImageW`.

use std::ffi::c_void;
use std::path::Path;

use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_MESSAGE, NIM_ADD, NIM_DELETE, NIM_MODIFY, NOTIFY_ICON_MESSAGE,
    NOTIFYICONDATAW, NOTIFYICONIDENTIFIER, Shell_NotifyIconGetRect, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DefWindowProcW, DestroyIcon, DestroyMenu, GA_ROOT,
    GetAncestor, GetCursorPos, GetMenuItemCount, GetSystemMetrics, HICON, HMENU, IMAGE_ICON,
    LR_LOADFROMFILE, LoadImageW, MF_BYPOSITION, MF_GRAYED, MF_SEPARATOR, MF_STRING, RemoveMenu,
    SM_CXSMICON, SM_CYSMICON, SetForegroundWindow, TPM_BOTTOMALIGN, TPM_LEFTALIGN,
    TPM_RIGHTALIGN, TPM_TOPALIGN, TRACK_POPUP_MENU_FLAGS, TrackPopupMenu,
};
use windows::core::{HSTRING, PCWSTR};

use crate::backend::{
    BackendError, IconHandle, MenuHandle, NativeMenuEntry, NotifyIconData, NotifyIconId, Point,
    Rect, ShellBackend, WindowHandle, WindowMessage,
};
use crate::config::PopupAlignment;

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut c_void)
}

fn hicon(icon: IconHandle) -> HICON {
    HICON(icon.0 as *mut c_void)
}

fn hmenu(menu: MenuHandle) -> HMENU {
    HMENU(menu.0 as *mut c_void)
}

fn notify_icon_data(data: &NotifyIconData) -> NOTIFYICONDATAW {
    NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd(data.id.window),
        uID: data.id.uid,
        uFlags: NIF_MESSAGE | NIF_ICON,
        uCallbackMessage: data.callback_message,
        hIcon: hicon(data.icon),
        ..Default::default()
    }
}

fn popup_flags(alignment: PopupAlignment) -> TRACK_POPUP_MENU_FLAGS {
    match alignment {
        PopupAlignment::BottomLeft => TPM_BOTTOMALIGN | TPM_LEFTALIGN,
        PopupAlignment::BottomRight => TPM_BOTTOMALIGN | TPM_RIGHTALIGN,
        PopupAlignment::TopLeft => TPM_TOPALIGN | TPM_LEFTALIGN,
        PopupAlignment::TopRight => TPM_TOPALIGN | TPM_RIGHTALIGN,
    }
}

/// Backend bound to the native window of the embedding view.
#[derive(Debug)]
pub struct Win32Backend {
    view: WindowHandle,
}

impl Win32Backend {
    /// `view` is any window inside the application's top-level window.
    pub fn new(view: WindowHandle) -> Self {
        Self { view }
    }

    fn notify(
        &self,
        call: &'static str,
        message: NOTIFY_ICON_MESSAGE,
        data: &NOTIFYICONDATAW,
    ) -> Result<(), BackendError> {
        // SAFETY: `data` is a fully initialised NOTIFYICONDATAW with cbSize set.
        let ok = unsafe { Shell_NotifyIconW(message, data) };
        if ok.as_bool() {
            Ok(())
        } else {
            Err(BackendError::native(call, windows::core::Error::from_win32()))
        }
    }
}

impl ShellBackend for Win32Backend {
    fn main_window(&self) -> WindowHandle {
        let root = unsafe { GetAncestor(hwnd(self.view), GA_ROOT) };
        WindowHandle(root.0 as isize)
    }

    fn small_icon_size(&self) -> (i32, i32) {
        unsafe { (GetSystemMetrics(SM_CXSMICON), GetSystemMetrics(SM_CYSMICON)) }
    }

    fn load_icon(
        &mut self,
        path: &Path,
        width: i32,
        height: i32,
    ) -> Result<IconHandle, BackendError> {
        let wide = HSTRING::from(path.as_os_str());
        let handle = unsafe { LoadImageW(None, &wide, IMAGE_ICON, width, height, LR_LOADFROMFILE) }
            .map_err(|e| BackendError::IconLoad {
                path: path.to_path_buf(),
                reason: e.message().to_string(),
            })?;
        Ok(IconHandle(handle.0 as isize))
    }

    fn destroy_icon(&mut self, icon: IconHandle) {
        if let Err(e) = unsafe { DestroyIcon(hicon(icon)) } {
            tracing::debug!("DestroyIcon failed: {e}");
        }
    }

    fn add_notify_icon(&mut self, data: &NotifyIconData) -> Result<(), BackendError> {
        self.notify("Shell_NotifyIcon(NIM_ADD)", NIM_ADD, &notify_icon_data(data))
    }

    fn modify_notify_icon(&mut self, data: &NotifyIconData) -> Result<(), BackendError> {
        self.notify("Shell_NotifyIcon(NIM_MODIFY)", NIM_MODIFY, &notify_icon_data(data))
    }

    fn delete_notify_icon(&mut self, id: &NotifyIconId) -> Result<(), BackendError> {
        let nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd(id.window),
            uID: id.uid,
            ..Default::default()
        };
        self.notify("Shell_NotifyIcon(NIM_DELETE)", NIM_DELETE, &nid)
    }

    fn notify_icon_rect(&self, id: &NotifyIconId) -> Result<Rect, BackendError> {
        let identifier = NOTIFYICONIDENTIFIER {
            cbSize: std::mem::size_of::<NOTIFYICONIDENTIFIER>() as u32,
            hWnd: hwnd(id.window),
            uID: id.uid,
            ..Default::default()
        };
        let rect = unsafe { Shell_NotifyIconGetRect(&identifier) }
            .map_err(|e| BackendError::native("Shell_NotifyIconGetRect", e.message()))?;
        Ok(Rect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }

    fn create_popup_menu(&mut self) -> Result<MenuHandle, BackendError> {
        let menu = unsafe { CreatePopupMenu() }
            .map_err(|e| BackendError::native("CreatePopupMenu", e.message()))?;
        Ok(MenuHandle(menu.0 as isize))
    }

    fn destroy_menu(&mut self, menu: MenuHandle) {
        if let Err(e) = unsafe { DestroyMenu(hmenu(menu)) } {
            tracing::debug!("DestroyMenu failed: {e}");
        }
    }

    fn menu_item_count(&self, menu: MenuHandle) -> usize {
        let count = unsafe { GetMenuItemCount(hmenu(menu)) };
        usize::try_from(count).unwrap_or(0)
    }

    fn remove_menu_item_at(
        &mut self,
        menu: MenuHandle,
        position: usize,
    ) -> Result<(), BackendError> {
        unsafe { RemoveMenu(hmenu(menu), position as u32, MF_BYPOSITION) }
            .map_err(|e| BackendError::native("RemoveMenu", e.message()))
    }

    fn append_menu_entry(
        &mut self,
        menu: MenuHandle,
        entry: &NativeMenuEntry,
    ) -> Result<(), BackendError> {
        let result = match entry {
            NativeMenuEntry::Separator => unsafe {
                AppendMenuW(hmenu(menu), MF_SEPARATOR, 0, PCWSTR::null())
            },
            NativeMenuEntry::Item {
                command_id,
                title,
                enabled,
            } => {
                let flags = if *enabled {
                    MF_STRING
                } else {
                    MF_STRING | MF_GRAYED
                };
                let title = HSTRING::from(title.as_str());
                unsafe { AppendMenuW(hmenu(menu), flags, *command_id as usize, &title) }
            }
        };
        result.map_err(|e| BackendError::native("AppendMenuW", e.message()))
    }

    fn cursor_position(&self) -> Result<Point, BackendError> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt) }
            .map_err(|e| BackendError::native("GetCursorPos", e.message()))?;
        Ok(Point { x: pt.x, y: pt.y })
    }

    fn set_foreground_window(&mut self, window: WindowHandle) {
        let _ = unsafe { SetForegroundWindow(hwnd(window)) };
    }

    fn track_popup_menu(
        &mut self,
        menu: MenuHandle,
        at: Point,
        alignment: PopupAlignment,
        owner: WindowHandle,
    ) -> Result<(), BackendError> {
        let ok = unsafe {
            TrackPopupMenu(
                hmenu(menu),
                popup_flags(alignment),
                at.x,
                at.y,
                0,
                hwnd(owner),
                None,
            )
        };
        if ok.as_bool() {
            Ok(())
        } else {
            // Dismissing the menu without a choice also returns FALSE.
            let err = windows::core::Error::from_win32();
            if err.code().is_ok() {
                Ok(())
            } else {
                Err(BackendError::native("TrackPopupMenu", err.message()))
            }
        }
    }

    fn default_window_proc(&mut self, message: &WindowMessage) -> isize {
        let result = unsafe {
            DefWindowProcW(
                hwnd(message.window),
                message.message,
                WPARAM(message.wparam),
                LPARAM(message.lparam),
            )
        };
        result.0
    }
}
