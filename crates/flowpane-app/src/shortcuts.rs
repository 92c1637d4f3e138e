//! Keyboard shortcut registry and documentation.

use flowpane_render::SelectionState;

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Switch the palette selection.
    Select(SelectionState),
    /// Documentation-only gesture hint.
    Gesture,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Move").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new(
                "1",
                false,
                ShortcutAction::Select(SelectionState::Pointer),
                "Pointer tool (pan and drag)",
            ),
            Shortcut::new(
                "2",
                false,
                ShortcutAction::Select(SelectionState::Box),
                "Box tool",
            ),
            Shortcut::new(
                "3",
                false,
                ShortcutAction::Select(SelectionState::Line),
                "Line tool",
            ),
            Shortcut::new("Move", true, ShortcutAction::Gesture, "Pan without holding a button"),
            Shortcut::new("Wheel", false, ShortcutAction::Gesture, "Zoom"),
        ]
    }

    /// Palette selection bound to a key without modifiers.
    pub fn selection_for_key(key: &str) -> Option<SelectionState> {
        Self::all().into_iter().find_map(|shortcut| match shortcut.action {
            ShortcutAction::Select(selection) if !shortcut.ctrl && shortcut.key == key => {
                Some(selection)
            }
            _ => None,
        })
    }

    /// Log all shortcuts.
    pub fn log_all() {
        for shortcut in Self::all() {
            log::info!("  {:12} {}", shortcut.format(), shortcut.description);
        }
    }
}
