//! In-memory shell used where no native notification area is available.
//!
//! Tracks registered icons and popup menus the way the shell would, serves a
//! scripted cursor position and icon rectangle, and can be told which menu
//! position to "choose" the next time a popup is tracked. The choice is
//! posted as `WM_COMMAND` to the owner window, just like the native modal
//! loop does; callers drain it with [`HeadlessBackend::take_posted_messages`].

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::backend::{
    BackendError, IconHandle, MenuHandle, NativeMenuEntry, NotifyIconData, NotifyIconId, Point,
    Rect, ShellBackend, WindowHandle, WindowMessage,
};
use crate::config::PopupAlignment;

/// Window handle the headless shell reports as the owner window.
pub const HEADLESS_WINDOW: WindowHandle = WindowHandle(1);

/// One `track_popup_menu` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupRecord {
    pub menu: MenuHandle,
    pub at: Point,
    pub alignment: PopupAlignment,
    pub owner: WindowHandle,
}

#[derive(Debug)]
struct Shell {
    window: WindowHandle,
    next_handle: isize,
    small_icon: (i32, i32),
    icons: HashMap<IconHandle, PathBuf>,
    notify_icons: HashMap<NotifyIconId, NotifyIconData>,
    menus: HashMap<MenuHandle, Vec<NativeMenuEntry>>,
    cursor: Point,
    icon_rect: Rect,
    foreground: Option<WindowHandle>,
    popups: Vec<PopupRecord>,
    pending_selection: Option<usize>,
    fail_next_menu: bool,
    posted: VecDeque<WindowMessage>,
    default_proc_calls: usize,
}

impl Shell {
    fn new() -> Self {
        Self {
            window: HEADLESS_WINDOW,
            next_handle: 0x100,
            small_icon: (16, 16),
            icons: HashMap::new(),
            notify_icons: HashMap::new(),
            menus: HashMap::new(),
            cursor: Point::default(),
            icon_rect: Rect {
                left: 0,
                top: 0,
                right: 16,
                bottom: 16,
            },
            foreground: None,
            popups: Vec::new(),
            pending_selection: None,
            fail_next_menu: false,
            posted: VecDeque::new(),
            default_proc_calls: 0,
        }
    }

    fn allocate(&mut self) -> isize {
        self.next_handle += 1;
        self.next_handle
    }

    fn menu_mut(&mut self, menu: MenuHandle) -> Result<&mut Vec<NativeMenuEntry>, BackendError> {
        self.menus
            .get_mut(&menu)
            .ok_or(BackendError::UnknownMenu(menu))
    }
}

/// Headless [`ShellBackend`].
///
/// Clones share the same shell, so a clone kept aside observes what the
/// controller did even after the controller is gone.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    shell: Rc<RefCell<Shell>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            shell: Rc::new(RefCell::new(Shell::new())),
        }
    }

    fn shell(&self) -> Ref<'_, Shell> {
        self.shell.borrow()
    }

    fn shell_mut(&self) -> RefMut<'_, Shell> {
        self.shell.borrow_mut()
    }

    pub fn set_cursor_position(&mut self, at: Point) {
        self.shell_mut().cursor = at;
    }

    pub fn set_icon_rect(&mut self, rect: Rect) {
        self.shell_mut().icon_rect = rect;
    }

    /// Chooses the entry at `position` when the next popup is tracked.
    pub fn select_on_next_popup(&mut self, position: usize) {
        self.shell_mut().pending_selection = Some(position);
    }

    /// Makes the next `create_popup_menu` fail.
    pub fn fail_next_menu_creation(&mut self) {
        self.shell_mut().fail_next_menu = true;
    }

    /// Messages posted to the owner window since the last call.
    pub fn take_posted_messages(&mut self) -> Vec<WindowMessage> {
        self.shell_mut().posted.drain(..).collect()
    }

    pub fn notify_icon(&self, id: &NotifyIconId) -> Option<NotifyIconData> {
        self.shell().notify_icons.get(id).copied()
    }

    pub fn notify_icon_count(&self) -> usize {
        self.shell().notify_icons.len()
    }

    /// Icon images loaded and not yet destroyed.
    pub fn live_icon_count(&self) -> usize {
        self.shell().icons.len()
    }

    pub fn menu_count(&self) -> usize {
        self.shell().menus.len()
    }

    pub fn menu_exists(&self, menu: MenuHandle) -> bool {
        self.shell().menus.contains_key(&menu)
    }

    pub fn menu_entries(&self, menu: MenuHandle) -> Vec<NativeMenuEntry> {
        self.shell().menus.get(&menu).cloned().unwrap_or_default()
    }

    pub fn popups(&self) -> Vec<PopupRecord> {
        self.shell().popups.clone()
    }

    pub fn foreground_window(&self) -> Option<WindowHandle> {
        self.shell().foreground
    }

    pub fn default_proc_calls(&self) -> usize {
        self.shell().default_proc_calls
    }
}

impl ShellBackend for HeadlessBackend {
    fn main_window(&self) -> WindowHandle {
        self.shell().window
    }

    fn small_icon_size(&self) -> (i32, i32) {
        self.shell().small_icon
    }

    fn load_icon(
        &mut self,
        path: &Path,
        _width: i32,
        _height: i32,
    ) -> Result<IconHandle, BackendError> {
        if !path.is_file() {
            return Err(BackendError::IconLoad {
                path: path.to_path_buf(),
                reason: "file not found".into(),
            });
        }
        let mut shell = self.shell_mut();
        let icon = IconHandle(shell.allocate());
        shell.icons.insert(icon, path.to_path_buf());
        Ok(icon)
    }

    fn destroy_icon(&mut self, icon: IconHandle) {
        self.shell_mut().icons.remove(&icon);
    }

    fn add_notify_icon(&mut self, data: &NotifyIconData) -> Result<(), BackendError> {
        let mut shell = self.shell_mut();
        if shell.notify_icons.contains_key(&data.id) {
            return Err(BackendError::native("Shell_NotifyIcon(NIM_ADD)", "icon already registered"));
        }
        shell.notify_icons.insert(data.id, *data);
        Ok(())
    }

    fn modify_notify_icon(&mut self, data: &NotifyIconData) -> Result<(), BackendError> {
        let mut shell = self.shell_mut();
        match shell.notify_icons.get_mut(&data.id) {
            Some(existing) => {
                *existing = *data;
                Ok(())
            }
            None => Err(BackendError::native("Shell_NotifyIcon(NIM_MODIFY)", "icon not registered")),
        }
    }

    fn delete_notify_icon(&mut self, id: &NotifyIconId) -> Result<(), BackendError> {
        match self.shell_mut().notify_icons.remove(id) {
            Some(_) => Ok(()),
            None => Err(BackendError::native("Shell_NotifyIcon(NIM_DELETE)", "icon not registered")),
        }
    }

    fn notify_icon_rect(&self, id: &NotifyIconId) -> Result<Rect, BackendError> {
        let shell = self.shell();
        if shell.notify_icons.contains_key(id) {
            Ok(shell.icon_rect)
        } else {
            Err(BackendError::native("Shell_NotifyIconGetRect", "icon not registered"))
        }
    }

    fn create_popup_menu(&mut self) -> Result<MenuHandle, BackendError> {
        let mut shell = self.shell_mut();
        if std::mem::take(&mut shell.fail_next_menu) {
            return Err(BackendError::native("CreatePopupMenu", "out of resources"));
        }
        let menu = MenuHandle(shell.allocate());
        shell.menus.insert(menu, Vec::new());
        Ok(menu)
    }

    fn destroy_menu(&mut self, menu: MenuHandle) {
        self.shell_mut().menus.remove(&menu);
    }

    fn menu_item_count(&self, menu: MenuHandle) -> usize {
        self.shell().menus.get(&menu).map_or(0, Vec::len)
    }

    fn remove_menu_item_at(&mut self, menu: MenuHandle, position: usize) -> Result<(), BackendError> {
        let mut shell = self.shell_mut();
        let entries = shell.menu_mut(menu)?;
        if position >= entries.len() {
            return Err(BackendError::native("RemoveMenu", format!("no item at position {position}")));
        }
        entries.remove(position);
        Ok(())
    }

    fn append_menu_entry(
        &mut self,
        menu: MenuHandle,
        entry: &NativeMenuEntry,
    ) -> Result<(), BackendError> {
        self.shell_mut().menu_mut(menu)?.push(entry.clone());
        Ok(())
    }

    fn cursor_position(&self) -> Result<Point, BackendError> {
        Ok(self.shell().cursor)
    }

    fn set_foreground_window(&mut self, window: WindowHandle) {
        self.shell_mut().foreground = Some(window);
    }

    fn track_popup_menu(
        &mut self,
        menu: MenuHandle,
        at: Point,
        alignment: PopupAlignment,
        owner: WindowHandle,
    ) -> Result<(), BackendError> {
        let mut shell = self.shell_mut();
        let selection = shell.pending_selection.take();
        let chosen = {
            let entries = shell.menu_mut(menu)?;
            selection.and_then(|position| match entries.get(position) {
                Some(NativeMenuEntry::Item {
                    command_id,
                    enabled: true,
                    ..
                }) => Some(*command_id),
                _ => None,
            })
        };

        shell.popups.push(PopupRecord {
            menu,
            at,
            alignment,
            owner,
        });
        if let Some(command_id) = chosen {
            shell
                .posted
                .push_back(WindowMessage::menu_command(owner, command_id));
        }
        Ok(())
    }

    fn default_window_proc(&mut self, _message: &WindowMessage) -> isize {
        self.shell_mut().default_proc_calls += 1;
        0
    }
}
