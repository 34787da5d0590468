//! Mapping between application identifiers and native menu command IDs.

use std::collections::HashMap;

/// Hands out menu command IDs.
///
/// IDs start at 1 and increase for the lifetime of the allocator; an ID is
/// never handed out twice, so a click from a stale menu generation can not
/// resolve to an item of the current one.
///
/// Win32 delivers the chosen ID in the low 16 bits of `WM_COMMAND`'s
/// `wParam`, so on the native shell IDs above `0xFFFF` are truncated and
/// their clicks resolve to no identifier. A process rebuilding menus often
/// enough to allocate that many IDs hits this limit.
#[derive(Debug, Default)]
pub struct CommandIdAllocator {
    last: u32,
}

impl CommandIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u32 {
        // 0 means "no command" to the shell.
        self.last = self.last.checked_add(1).unwrap_or(1);
        self.last
    }

    /// Most recently allocated ID (0 before the first allocation).
    pub fn last(&self) -> u32 {
        self.last
    }
}

/// Bidirectional identifier ↔ command ID table for one menu generation.
#[derive(Debug, Default, Clone)]
pub struct IdentifierIndex {
    by_identifier: HashMap<String, u32>,
    by_command: HashMap<u32, String>,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `identifier` under `command_id`.
    ///
    /// When an identifier repeats within one menu, the forward direction keeps
    /// the first ID while every ID still resolves back to the identifier.
    pub fn insert(&mut self, identifier: &str, command_id: u32) {
        self.by_identifier
            .entry(identifier.to_string())
            .or_insert(command_id);
        self.by_command.insert(command_id, identifier.to_string());
    }

    pub fn identifier_of(&self, command_id: u32) -> Option<&str> {
        self.by_command.get(&command_id).map(String::as_str)
    }

    pub fn command_id_of(&self, identifier: &str) -> Option<u32> {
        self.by_identifier.get(identifier).copied()
    }

    /// Number of clickable entries recorded.
    pub fn len(&self) -> usize {
        self.by_command.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_command.is_empty()
    }
}
