//! Context menu owned by an active tray icon.

use traybridge_protocol::MenuItem;

use crate::backend::{BackendError, MenuHandle, NativeMenuEntry, ShellBackend};
use crate::index::{CommandIdAllocator, IdentifierIndex};

/// A native popup menu and the identifier table of its current entries.
#[derive(Debug)]
pub struct ContextMenu {
    handle: MenuHandle,
    index: IdentifierIndex,
}

impl ContextMenu {
    /// Wraps a freshly created, empty popup menu.
    pub fn new(handle: MenuHandle) -> Self {
        Self {
            handle,
            index: IdentifierIndex::new(),
        }
    }

    pub fn handle(&self) -> MenuHandle {
        self.handle
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    /// Replaces every entry of the widget with `items`.
    ///
    /// Existing entries are removed by position, always at 0 since the
    /// remaining ones shift down after each removal. The identifier table is
    /// swapped for a new one covering exactly the entries appended, including
    /// when an append fails partway.
    pub fn rebuild<B: ShellBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        items: &[MenuItem],
        ids: &mut CommandIdAllocator,
    ) -> Result<(), BackendError> {
        let count = backend.menu_item_count(self.handle);
        for _ in 0..count {
            backend.remove_menu_item_at(self.handle, 0)?;
        }

        let mut index = IdentifierIndex::new();
        let result = append_entries(backend, self.handle, items, ids, &mut index);
        self.index = index;

        tracing::debug!(
            menu = ?self.handle,
            removed = count,
            items = items.len(),
            clickable = self.index.len(),
            "context menu rebuilt"
        );
        result
    }
}

fn append_entries<B: ShellBackend + ?Sized>(
    backend: &mut B,
    menu: MenuHandle,
    items: &[MenuItem],
    ids: &mut CommandIdAllocator,
    index: &mut IdentifierIndex,
) -> Result<(), BackendError> {
    for item in items {
        let entry = native_entry(item, ids);
        backend.append_menu_entry(menu, &entry)?;
        if let NativeMenuEntry::Item { command_id, .. } = entry {
            index.insert(&item.identifier, command_id);
        }
    }
    Ok(())
}

/// Maps an application item to a widget entry, allocating a command ID for
/// clickable items only.
fn native_entry(item: &MenuItem, ids: &mut CommandIdAllocator) -> NativeMenuEntry {
    if item.is_separator_item {
        NativeMenuEntry::Separator
    } else {
        NativeMenuEntry::Item {
            command_id: ids.next_id(),
            title: item.title.clone(),
            enabled: item.is_enabled,
        }
    }
}
