//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives in
//! Rust so the browser bridge and native hosts agree on bindings.

use crate::tools::ToolId;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tools ──
    Tool(ToolId),

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Save,
    /// Nudge the selection by one logical pixel (ten with Shift).
    Nudge { dx: i32, dy: i32 },

    // ── Crop / modal ──
    /// Apply the crop when cropping.
    Confirm,
    /// Leave crop without applying, otherwise clear the selection.
    Cancel,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘, elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "s" | "S" => Some(ShortcutAction::Save),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        let step = if shift { 10 } else { 1 };
        let nudge = |dx: i32, dy: i32| Some(ShortcutAction::Nudge { dx, dy });
        match key {
            "ArrowLeft" => return nudge(-step, 0),
            "ArrowRight" => return nudge(step, 0),
            "ArrowUp" => return nudge(0, -step),
            "ArrowDown" => return nudge(0, step),
            _ => {}
        }
        if shift {
            return None;
        }

        match key {
            "r" | "R" => Some(ShortcutAction::Tool(ToolId::Resize)),
            "c" | "C" => Some(ShortcutAction::Tool(ToolId::Crop)),
            "a" | "A" => Some(ShortcutAction::Tool(ToolId::Adjust)),
            "t" | "T" => Some(ShortcutAction::Tool(ToolId::Text)),
            "b" | "B" => Some(ShortcutAction::Tool(ToolId::Background)),
            "e" | "E" => Some(ShortcutAction::Tool(ToolId::AiExtender)),
            "i" | "I" => Some(ShortcutAction::Tool(ToolId::AiEdit)),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Enter" => Some(ShortcutAction::Confirm),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}
