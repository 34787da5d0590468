//! The tray controller: method-call dispatch and window-message handling.

use std::path::Path;

use traybridge_protocol::constants::{
    ERR_CODE_INVALID_ARGUMENTS, ERR_CODE_NATIVE, ERR_CODE_NO_TRAY_ICON,
};
use traybridge_protocol::{
    Bounds, MenuItem, MethodCall, MethodResponse, ProtocolError, TrayMethod, TrayNotification,
};

use crate::backend::{
    BackendError, IconHandle, NotifyIconData, NotifyIconId, ShellBackend, WM_COMMAND, WM_LBUTTONUP,
    WM_RBUTTONUP, WindowMessage,
};
use crate::config::TrayConfig;
use crate::events::EventSink;
use crate::index::CommandIdAllocator;
use crate::menu::ContextMenu;

/// Errors produced by tray operations.
#[derive(Debug, thiserror::Error)]
pub enum TrayError {
    #[error("no tray icon has been set")]
    NoIcon,

    #[error("device pixel ratio must be positive, got {0}")]
    InvalidScale(f64),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("native shell error: {0}")]
    Backend(#[from] BackendError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrayError {
    /// Error code reported on the channel.
    pub fn code(&self) -> &'static str {
        match self {
            TrayError::NoIcon => ERR_CODE_NO_TRAY_ICON,
            TrayError::InvalidScale(_) | TrayError::Protocol(_) | TrayError::Json(_) => {
                ERR_CODE_INVALID_ARGUMENTS
            }
            TrayError::Backend(_) => ERR_CODE_NATIVE,
        }
    }
}

impl From<TrayError> for MethodResponse {
    fn from(err: TrayError) -> Self {
        MethodResponse::error(err.code(), err.to_string())
    }
}

/// Whether `set_icon` could load the requested image.
///
/// Either way the icon entry exists afterwards; with `NotLoaded` it shows no
/// image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconLoad {
    Loaded,
    NotLoaded,
}

/// Tray lifecycle.
#[derive(Debug)]
enum TrayState {
    NoIcon,
    IconActive(ActiveTray),
}

#[derive(Debug)]
struct ActiveTray {
    data: NotifyIconData,
    menu: ContextMenu,
}

/// Owns the tray icon, its popup menu and the identifier table.
///
/// All methods run on the thread that owns the top-level window.
pub struct TrayController<B: ShellBackend, S: EventSink> {
    backend: B,
    sink: S,
    config: TrayConfig,
    state: TrayState,
    ids: CommandIdAllocator,
}

impl<B: ShellBackend, S: EventSink> TrayController<B, S> {
    pub fn new(backend: B, sink: S, config: TrayConfig) -> Self {
        Self {
            backend,
            sink,
            config,
            state: TrayState::NoIcon,
            ids: CommandIdAllocator::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    /// Returns `true` once an icon has been set and not yet destroyed.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TrayState::IconActive(_))
    }

    /// Shell identity of the active icon.
    pub fn icon_id(&self) -> Option<NotifyIconId> {
        match &self.state {
            TrayState::IconActive(active) => Some(active.data.id),
            TrayState::NoIcon => None,
        }
    }

    /// The active context menu.
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        match &self.state {
            TrayState::IconActive(active) => Some(&active.menu),
            TrayState::NoIcon => None,
        }
    }

    /// Decodes and runs one method call.
    pub fn handle_call(&mut self, call: &MethodCall) -> MethodResponse {
        let method = match TrayMethod::from_call(call) {
            Ok(method) => method,
            Err(ProtocolError::UnsupportedMethod(name)) => {
                tracing::debug!(method = %name, "unsupported method");
                return MethodResponse::NotImplemented;
            }
            Err(e) => {
                tracing::warn!(method = %call.method, "rejecting call: {e}");
                return TrayError::from(e).into();
            }
        };

        let name = method.name();
        tracing::debug!(method = %name, "handling call");

        let done = |()| serde_json::Value::Bool(true);
        let result: Result<serde_json::Value, TrayError> = match method {
            TrayMethod::SetIcon(req) => self
                .set_icon(&req.icon_path)
                .map(|_| serde_json::Value::Bool(true)),
            TrayMethod::SetContextMenu(req) => self.set_context_menu(&req.menu_items).map(done),
            TrayMethod::PopUpContextMenu => self.pop_up_context_menu().map(done),
            TrayMethod::Destroy => self.destroy().map(done),
            TrayMethod::GetBounds(req) => self
                .get_bounds(req.device_pixel_ratio)
                .and_then(|bounds| serde_json::to_value(bounds).map_err(TrayError::from)),
        };

        match result {
            Ok(result) => MethodResponse::Success { result },
            Err(e) => {
                tracing::warn!(method = %name, "call failed: {e}");
                e.into()
            }
        }
    }

    /// Loads the image at `icon_path` and shows it in the notification area.
    ///
    /// The first call registers the icon and creates its (empty) popup menu;
    /// later calls swap the image in place.
    pub fn set_icon(&mut self, icon_path: &str) -> Result<IconLoad, TrayError> {
        let (width, height) = self.backend.small_icon_size();
        let (icon, outcome) = match self.backend.load_icon(Path::new(icon_path), width, height) {
            Ok(icon) => (icon, IconLoad::Loaded),
            Err(e) => {
                tracing::warn!(path = %icon_path, "icon not loaded: {e}");
                (IconHandle::NULL, IconLoad::NotLoaded)
            }
        };

        match &mut self.state {
            TrayState::IconActive(active) => {
                let previous = std::mem::replace(&mut active.data.icon, icon);
                if let Err(e) = self.backend.modify_notify_icon(&active.data) {
                    tracing::warn!("failed to update tray icon: {e}");
                }
                if !previous.is_null() {
                    self.backend.destroy_icon(previous);
                }
                tracing::debug!(path = %icon_path, "tray icon updated");
            }
            TrayState::NoIcon => {
                let data = NotifyIconData {
                    id: NotifyIconId {
                        window: self.backend.main_window(),
                        uid: self.config.icon_uid,
                    },
                    callback_message: self.config.callback_message,
                    icon,
                };

                if let Err(e) = self.backend.add_notify_icon(&data) {
                    self.release_icon(icon);
                    return Err(e.into());
                }

                let menu = match self.backend.create_popup_menu() {
                    Ok(menu) => menu,
                    Err(e) => {
                        if let Err(e) = self.backend.delete_notify_icon(&data.id) {
                            tracing::warn!("failed to remove tray icon after menu error: {e}");
                        }
                        self.release_icon(icon);
                        return Err(e.into());
                    }
                };

                tracing::info!(
                    window = ?data.id.window,
                    uid = data.id.uid,
                    path = %icon_path,
                    "tray icon created"
                );
                self.state = TrayState::IconActive(ActiveTray {
                    data,
                    menu: ContextMenu::new(menu),
                });
            }
        }

        Ok(outcome)
    }

    /// Replaces the context menu entries.
    pub fn set_context_menu(&mut self, items: &[MenuItem]) -> Result<(), TrayError> {
        let TrayState::IconActive(active) = &mut self.state else {
            return Err(TrayError::NoIcon);
        };
        active
            .menu
            .rebuild(&mut self.backend, items, &mut self.ids)?;
        Ok(())
    }

    /// Shows the context menu at the cursor. Returns once the menu closes.
    pub fn pop_up_context_menu(&mut self) -> Result<(), TrayError> {
        let TrayState::IconActive(active) = &self.state else {
            return Err(TrayError::NoIcon);
        };
        let owner = self.backend.main_window();
        let at = self.backend.cursor_position()?;

        self.backend.set_foreground_window(owner);
        self.backend.track_popup_menu(
            active.menu.handle(),
            at,
            self.config.popup_alignment,
            owner,
        )?;
        tracing::debug!(x = at.x, y = at.y, "context menu closed");
        Ok(())
    }

    /// Removes the icon and releases the icon image and popup menu.
    ///
    /// Without an icon this does nothing.
    pub fn destroy(&mut self) -> Result<(), TrayError> {
        let TrayState::IconActive(active) = std::mem::replace(&mut self.state, TrayState::NoIcon)
        else {
            tracing::debug!("destroy without a tray icon");
            return Ok(());
        };

        if let Err(e) = self.backend.delete_notify_icon(&active.data.id) {
            tracing::warn!("failed to remove tray icon: {e}");
        }
        self.release_icon(active.data.icon);
        self.backend.destroy_menu(active.menu.handle());

        tracing::info!(uid = active.data.id.uid, "tray icon destroyed");
        Ok(())
    }

    /// Icon rectangle scaled from physical to logical pixels.
    pub fn get_bounds(&self, device_pixel_ratio: f64) -> Result<Bounds, TrayError> {
        if !(device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0) {
            return Err(TrayError::InvalidScale(device_pixel_ratio));
        }
        let TrayState::IconActive(active) = &self.state else {
            return Err(TrayError::NoIcon);
        };

        let rect = self.backend.notify_icon_rect(&active.data.id)?;
        Ok(Bounds {
            x: f64::from(rect.left) / device_pixel_ratio,
            y: f64::from(rect.top) / device_pixel_ratio,
            width: f64::from(rect.width()) / device_pixel_ratio,
            height: f64::from(rect.height()) / device_pixel_ratio,
        })
    }

    /// Window-procedure hook for the owning window.
    ///
    /// Returns `Some(result)` when the message was fully processed and `None`
    /// when the window should continue with its own handling.
    pub fn handle_window_message(&mut self, message: &WindowMessage) -> Option<isize> {
        if message.message == WM_COMMAND {
            let command_id = message.wparam as u32;
            let identifier = self
                .context_menu()
                .and_then(|menu| menu.index().identifier_of(command_id))
                .unwrap_or_default()
                .to_string();
            if identifier.is_empty() {
                tracing::debug!(command_id, "menu command without identifier");
            }
            self.sink
                .emit(TrayNotification::menu_item_click(identifier));
            None
        } else if message.message == self.config.callback_message {
            match message.lparam as u32 {
                WM_LBUTTONUP => {
                    self.sink.emit(TrayNotification::IconMouseDown);
                    None
                }
                WM_RBUTTONUP => {
                    self.sink.emit(TrayNotification::IconRightMouseDown);
                    None
                }
                _ => Some(self.backend.default_window_proc(message)),
            }
        } else {
            None
        }
    }

    fn release_icon(&mut self, icon: IconHandle) {
        if !icon.is_null() {
            self.backend.destroy_icon(icon);
        }
    }
}

impl<B: ShellBackend, S: EventSink> Drop for TrayController<B, S> {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NativeMenuEntry, Point, Rect, WM_USER, WindowHandle};
    use crate::headless::HeadlessBackend;

    type Controller = TrayController<HeadlessBackend, Vec<TrayNotification>>;

    struct Fixture {
        _dir: tempfile::TempDir,
        icon: String,
        other_icon: String,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("tray.ico");
        let other = dir.path().join("tray-alt.ico");
        std::fs::write(&icon, b"ico").unwrap();
        std::fs::write(&other, b"ico").unwrap();
        Fixture {
            icon: icon.to_string_lossy().into_owned(),
            other_icon: other.to_string_lossy().into_owned(),
            _dir: dir,
        }
    }

    fn controller() -> Controller {
        TrayController::new(HeadlessBackend::new(), Vec::new(), TrayConfig::default())
    }

    fn items(ids: &[&str]) -> Vec<MenuItem> {
        ids.iter().map(|id| MenuItem::new(*id, id.to_uppercase())).collect()
    }

    fn click(ctl: &mut Controller, identifier: &str) -> Option<TrayNotification> {
        let id = ctl
            .context_menu()
            .and_then(|m| m.index().command_id_of(identifier))?;
        let window = ctl.backend().main_window();
        ctl.sink_mut().clear();
        ctl.handle_window_message(&WindowMessage::menu_command(window, id));
        ctl.sink_mut().pop()
    }

    fn call(json: &str) -> MethodCall {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn first_set_icon_registers_icon_and_menu() {
        let fx = fixture();
        let mut ctl = controller();
        assert!(!ctl.is_active());

        assert_eq!(ctl.set_icon(&fx.icon).unwrap(), IconLoad::Loaded);
        assert!(ctl.is_active());

        let id = ctl.icon_id().unwrap();
        assert_eq!(id.uid, 100);
        assert_eq!(id.window, ctl.backend().main_window());

        let registered = ctl.backend().notify_icon(&id).unwrap();
        assert_eq!(registered.callback_message, WM_USER + 1);
        assert!(!registered.icon.is_null());

        let menu = ctl.context_menu().unwrap().handle();
        assert_eq!(ctl.backend().menu_item_count(menu), 0);
    }

    #[test]
    fn second_set_icon_updates_in_place() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        let menu = ctl.context_menu().unwrap().handle();
        let first = ctl.backend().notify_icon(&ctl.icon_id().unwrap()).unwrap().icon;

        ctl.set_icon(&fx.other_icon).unwrap();
        let second = ctl.backend().notify_icon(&ctl.icon_id().unwrap()).unwrap().icon;

        assert_ne!(first, second);
        assert_eq!(ctl.context_menu().unwrap().handle(), menu);
        assert_eq!(ctl.backend().notify_icon_count(), 1);
        // The replaced image is released.
        assert_eq!(ctl.backend().live_icon_count(), 1);
    }

    #[test]
    fn missing_icon_file_still_succeeds() {
        let mut ctl = controller();
        let outcome = ctl.set_icon("/definitely/not/here.ico").unwrap();
        assert_eq!(outcome, IconLoad::NotLoaded);
        assert!(ctl.is_active());
        let registered = ctl.backend().notify_icon(&ctl.icon_id().unwrap()).unwrap();
        assert!(registered.icon.is_null());

        let resp = ctl.handle_call(&call(
            r#"{"method":"setIcon","arguments":{"iconPath":"/nope.ico"}}"#,
        ));
        assert_eq!(resp, MethodResponse::success(&true).unwrap());
    }

    #[test]
    fn disjoint_menus_resolve_latest_identifiers() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();

        ctl.set_context_menu(&items(&["a", "b", "c"])).unwrap();
        let stale = ctl.context_menu().unwrap().index().command_id_of("a").unwrap();

        ctl.set_context_menu(&items(&["x", "y"])).unwrap();
        for identifier in ["x", "y"] {
            assert_eq!(
                click(&mut ctl, identifier),
                Some(TrayNotification::menu_item_click(identifier))
            );
        }

        // Identifiers from the previous generation are gone.
        assert_eq!(ctl.context_menu().unwrap().index().command_id_of("a"), None);
        let window = ctl.backend().main_window();
        ctl.handle_window_message(&WindowMessage::menu_command(window, stale));
        assert_eq!(
            ctl.sink().last(),
            Some(&TrayNotification::menu_item_click(""))
        );
    }

    #[test]
    fn command_ids_are_never_reused() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();

        ctl.set_context_menu(&items(&["a", "b"])).unwrap();
        let first = ctl.context_menu().unwrap().index().command_id_of("b").unwrap();
        ctl.set_context_menu(&items(&["a"])).unwrap();
        let second = ctl.context_menu().unwrap().index().command_id_of("a").unwrap();
        assert!(second > first);
    }

    #[test]
    fn separators_are_not_clickable() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.set_context_menu(&[
            MenuItem::new("open", "Open"),
            MenuItem::separator("sep"),
            MenuItem::new("quit", "Quit"),
        ])
        .unwrap();

        let menu = ctl.context_menu().unwrap();
        assert_eq!(menu.index().command_id_of("sep"), None);
        assert_eq!(menu.index().len(), 2);

        let entries = ctl.backend().menu_entries(menu.handle());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], NativeMenuEntry::Separator);
    }

    #[test]
    fn shrinking_menu_leaves_only_new_entries() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();

        ctl.set_context_menu(&items(&["a", "b", "c"])).unwrap();
        ctl.set_context_menu(&items(&["z"])).unwrap();

        let handle = ctl.context_menu().unwrap().handle();
        assert_eq!(ctl.backend().menu_item_count(handle), 1);
        let entries = ctl.backend().menu_entries(handle);
        assert!(matches!(
            &entries[0],
            NativeMenuEntry::Item { title, enabled: true, .. } if title == "Z"
        ));
    }

    #[test]
    fn disabled_items_are_grayed_out() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.set_context_menu(&[MenuItem::new("busy", "Working…").disabled()])
            .unwrap();

        let handle = ctl.context_menu().unwrap().handle();
        assert!(matches!(
            ctl.backend().menu_entries(handle)[0],
            NativeMenuEntry::Item { enabled: false, .. }
        ));
    }

    #[test]
    fn unknown_command_id_emits_empty_identifier() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.set_context_menu(&items(&["a"])).unwrap();

        let window = ctl.backend().main_window();
        let handled = ctl.handle_window_message(&WindowMessage::menu_command(window, 9999));
        assert_eq!(handled, None);
        assert_eq!(ctl.sink(), &vec![TrayNotification::menu_item_click("")]);
    }

    #[test]
    fn icon_mouse_messages_map_to_notifications() {
        let mut ctl = controller();
        let window = WindowHandle(1);
        let cb = ctl.config().callback_message;

        assert_eq!(
            ctl.handle_window_message(&WindowMessage::new(window, cb, 100, WM_LBUTTONUP as isize)),
            None
        );
        assert_eq!(
            ctl.handle_window_message(&WindowMessage::new(window, cb, 100, WM_RBUTTONUP as isize)),
            None
        );
        assert_eq!(
            ctl.sink(),
            &vec![
                TrayNotification::IconMouseDown,
                TrayNotification::IconRightMouseDown
            ]
        );
    }

    #[test]
    fn other_icon_activity_goes_to_default_proc() {
        let mut ctl = controller();
        let cb = ctl.config().callback_message;
        // WM_MOUSEMOVE over the icon.
        let msg = WindowMessage::new(WindowHandle(1), cb, 100, 0x0200);
        assert_eq!(ctl.handle_window_message(&msg), Some(0));
        assert!(ctl.sink().is_empty());
        assert_eq!(ctl.backend().default_proc_calls(), 1);
    }

    #[test]
    fn unrelated_messages_are_ignored() {
        let mut ctl = controller();
        // WM_PAINT
        let msg = WindowMessage::new(WindowHandle(1), 0x000F, 0, 0);
        assert_eq!(ctl.handle_window_message(&msg), None);
        assert!(ctl.sink().is_empty());
    }

    #[test]
    fn bounds_scale_by_device_pixel_ratio() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.backend_mut().set_icon_rect(Rect {
            left: 100,
            top: 100,
            right: 140,
            bottom: 132,
        });

        let bounds = ctl.get_bounds(2.0).unwrap();
        assert_eq!(
            bounds,
            Bounds {
                x: 50.0,
                y: 50.0,
                width: 20.0,
                height: 16.0
            }
        );

        let resp = ctl.handle_call(&call(
            r#"{"method":"getBounds","arguments":{"devicePixelRatio":2.0}}"#,
        ));
        assert_eq!(
            resp.result().unwrap(),
            &serde_json::json!({"x": 50.0, "y": 50.0, "width": 20.0, "height": 16.0})
        );
    }

    #[test]
    fn bounds_reject_bad_ratio() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        assert!(matches!(ctl.get_bounds(0.0), Err(TrayError::InvalidScale(_))));
        assert!(matches!(
            ctl.get_bounds(f64::NAN),
            Err(TrayError::InvalidScale(_))
        ));
    }

    #[test]
    fn dispatch_bad_ratio_is_invalid_arguments() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();

        let response = ctl.handle_call(&call(
            r#"{"method":"getBounds","arguments":{"devicePixelRatio":-1.5}}"#,
        ));
        match response {
            MethodResponse::Error { code, .. } => assert_eq!(code, ERR_CODE_INVALID_ARGUMENTS),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn native_registration_failure_rolls_back() {
        let fx = fixture();
        let shared = HeadlessBackend::new();
        let observer = shared.clone();

        let mut first = TrayController::new(
            shared.clone(),
            Vec::<TrayNotification>::new(),
            TrayConfig::default(),
        );
        first.set_icon(&fx.icon).unwrap();

        // Same window and uid: the shell refuses a second registration.
        let mut second =
            TrayController::new(shared, Vec::<TrayNotification>::new(), TrayConfig::default());
        let response = second.handle_call(&call(&format!(
            r#"{{"method":"setIcon","arguments":{{"iconPath":{}}}}}"#,
            serde_json::to_string(&fx.other_icon).unwrap()
        )));
        match response {
            MethodResponse::Error { code, message, .. } => {
                assert_eq!(code, ERR_CODE_NATIVE);
                assert!(message.contains("NIM_ADD"), "{message}");
            }
            other => panic!("unexpected response {other:?}"),
        }

        assert!(!second.is_active());
        assert!(first.is_active());
        assert_eq!(observer.notify_icon_count(), 1);
        assert_eq!(observer.live_icon_count(), 1);
        assert_eq!(observer.menu_count(), 1);
    }

    #[test]
    fn menu_creation_failure_unregisters_icon() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.backend_mut().fail_next_menu_creation();

        assert!(matches!(ctl.set_icon(&fx.icon), Err(TrayError::Backend(_))));
        assert!(!ctl.is_active());
        assert_eq!(ctl.backend().notify_icon_count(), 0);
        assert_eq!(ctl.backend().live_icon_count(), 0);
        assert_eq!(ctl.backend().menu_count(), 0);

        // The next attempt succeeds from scratch.
        ctl.set_icon(&fx.icon).unwrap();
        assert!(ctl.is_active());
        assert_eq!(ctl.backend().notify_icon_count(), 1);
    }

    #[test]
    fn destroy_then_set_icon_starts_fresh() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.set_context_menu(&items(&["a", "b"])).unwrap();
        let old_menu = ctl.context_menu().unwrap().handle();

        ctl.destroy().unwrap();
        assert!(!ctl.is_active());
        assert_eq!(ctl.backend().notify_icon_count(), 0);
        assert_eq!(ctl.backend().live_icon_count(), 0);
        assert!(!ctl.backend().menu_exists(old_menu));

        ctl.set_icon(&fx.icon).unwrap();
        assert!(ctl.is_active());
        let new_menu = ctl.context_menu().unwrap().handle();
        assert_ne!(new_menu, old_menu);
        assert_eq!(ctl.backend().menu_item_count(new_menu), 0);
        assert!(ctl.context_menu().unwrap().index().is_empty());
    }

    #[test]
    fn destroy_without_icon_is_noop() {
        let mut ctl = controller();
        ctl.destroy().unwrap();
        let resp = ctl.handle_call(&MethodCall::bare("destroy"));
        assert_eq!(resp, MethodResponse::success(&true).unwrap());
        assert_eq!(ctl.backend().notify_icon_count(), 0);
    }

    #[test]
    fn operations_without_icon_are_rejected() {
        let mut ctl = controller();
        assert!(matches!(ctl.set_context_menu(&items(&["a"])), Err(TrayError::NoIcon)));
        assert!(matches!(ctl.pop_up_context_menu(), Err(TrayError::NoIcon)));
        assert!(matches!(ctl.get_bounds(1.0), Err(TrayError::NoIcon)));

        let resp = ctl.handle_call(&MethodCall::bare("popUpContextMenu"));
        let MethodResponse::Error { code, .. } = resp else {
            panic!("expected error, got {resp:?}");
        };
        assert_eq!(code, "no-tray-icon");
    }

    #[test]
    fn pop_up_uses_cursor_and_foregrounds_owner() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.backend_mut().set_cursor_position(Point { x: 800, y: 1040 });

        ctl.pop_up_context_menu().unwrap();

        let popups = ctl.backend().popups();
        assert_eq!(popups.len(), 1);
        assert_eq!(popups[0].at, Point { x: 800, y: 1040 });
        assert_eq!(popups[0].owner, ctl.backend().main_window());
        assert_eq!(
            ctl.backend().foreground_window(),
            Some(ctl.backend().main_window())
        );
    }

    #[test]
    fn popup_selection_round_trips_to_click() {
        let fx = fixture();
        let mut ctl = controller();
        ctl.set_icon(&fx.icon).unwrap();
        ctl.set_context_menu(&[
            MenuItem::new("show", "Show"),
            MenuItem::separator("sep"),
            MenuItem::new("quit", "Quit"),
        ])
        .unwrap();

        ctl.backend_mut().select_on_next_popup(2);
        ctl.pop_up_context_menu().unwrap();
        for msg in ctl.backend_mut().take_posted_messages() {
            ctl.handle_window_message(&msg);
        }
        assert_eq!(ctl.sink(), &vec![TrayNotification::menu_item_click("quit")]);

        // Choosing the separator posts nothing.
        ctl.backend_mut().select_on_next_popup(1);
        ctl.pop_up_context_menu().unwrap();
        assert!(ctl.backend_mut().take_posted_messages().is_empty());
    }

    #[test]
    fn dispatch_unknown_method_is_not_implemented() {
        let mut ctl = controller();
        let resp = ctl.handle_call(&MethodCall::bare("setToolTip"));
        assert_eq!(resp, MethodResponse::NotImplemented);

        // Notification names are not callable.
        let resp = ctl.handle_call(&MethodCall::bare("onTrayIconMouseDown"));
        assert_eq!(resp, MethodResponse::NotImplemented);
    }

    #[test]
    fn dispatch_bad_arguments_is_structured_error() {
        let mut ctl = controller();
        let resp = ctl.handle_call(&call(r#"{"method":"setIcon","arguments":{"path":"x"}}"#));
        let MethodResponse::Error { code, .. } = resp else {
            panic!("expected error, got {resp:?}");
        };
        assert_eq!(code, "invalid-arguments");
        assert!(!ctl.is_active());
    }

    #[test]
    fn dispatch_full_sequence() {
        let fx = fixture();
        let mut ctl = controller();
        let set_icon = format!(
            r#"{{"method":"setIcon","arguments":{{"iconPath":{}}}}}"#,
            serde_json::to_string(&fx.icon).unwrap()
        );
        assert!(ctl.handle_call(&call(&set_icon)).is_success());
        assert!(ctl
            .handle_call(&call(
                r#"{"method":"setContextMenu","arguments":{"menuItems":[
                    {"identifier":"show","title":"Show","isEnabled":true,"isSeparatorItem":false}
                ]}}"#
            ))
            .is_success());
        assert!(ctl.handle_call(&MethodCall::bare("popUpContextMenu")).is_success());
        assert!(ctl.handle_call(&MethodCall::bare("destroy")).is_success());
        assert!(!ctl.is_active());
    }

    #[test]
    fn drop_removes_active_icon() {
        let fx = fixture();
        let backend = HeadlessBackend::new();
        let observer = backend.clone();
        {
            let mut ctl = TrayController::new(
                backend,
                Vec::<TrayNotification>::new(),
                TrayConfig::default(),
            );
            ctl.set_icon(&fx.icon).unwrap();
            assert_eq!(observer.notify_icon_count(), 1);
        }
        assert_eq!(observer.notify_icon_count(), 0);
        assert_eq!(observer.live_icon_count(), 0);
        assert_eq!(observer.menu_count(), 0);
    }

    #[test]
    fn custom_config_is_used_for_registration() {
        let fx = fixture();
        let config = TrayConfig {
            icon_uid: 7,
            callback_message: WM_USER + 42,
            ..TrayConfig::default()
        };
        let mut ctl =
            TrayController::new(HeadlessBackend::new(), Vec::<TrayNotification>::new(), config);
        ctl.set_icon(&fx.icon).unwrap();

        let id = ctl.icon_id().unwrap();
        assert_eq!(id.uid, 7);
        assert_eq!(
            ctl.backend().notify_icon(&id).unwrap().callback_message,
            WM_USER + 42
        );

        let msg = WindowMessage::new(id.window, WM_USER + 42, 7, WM_LBUTTONUP as isize);
        ctl.handle_window_message(&msg);
        assert_eq!(ctl.sink(), &vec![TrayNotification::IconMouseDown]);
    }
}
