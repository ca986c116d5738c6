//! Context menu model.
//!
//! The menu is rebuilt from scratch on every state change. Several labels
//! depend on current state, so patching single entries would leave stale text
//! behind.

use crate::autolaunch;
use crate::geometry::PetSize;

/// Everything a user can trigger from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Resize(u32),
    ToggleInvert,
    ToggleAlwaysOnTop,
    ToggleSleepy,
    ToggleAutolaunch,
    Quit,
}

impl MenuAction {
    /// Action names as registered with the host toolkit.
    pub const NAMES: [&'static str; 6] = [
        "resize",
        "invert",
        "always-on-top",
        "sleepy",
        "autolaunch",
        "quit",
    ];

    pub fn name(self) -> &'static str {
        match self {
            MenuAction::Resize(_) => "resize",
            MenuAction::ToggleInvert => "invert",
            MenuAction::ToggleAlwaysOnTop => "always-on-top",
            MenuAction::ToggleSleepy => "sleepy",
            MenuAction::ToggleAutolaunch => "autolaunch",
            MenuAction::Quit => "quit",
        }
    }

    /// Parameter carried with the action name, if any.
    pub fn target(self) -> Option<u32> {
        match self {
            MenuAction::Resize(size) => Some(size),
            _ => None,
        }
    }

    pub fn parse(name: &str, target: Option<u32>) -> Option<MenuAction> {
        let action = match name {
            "resize" => MenuAction::Resize(target?),
            "invert" => MenuAction::ToggleInvert,
            "always-on-top" => MenuAction::ToggleAlwaysOnTop,
            "sleepy" => MenuAction::ToggleSleepy,
            "autolaunch" => MenuAction::ToggleAutolaunch,
            "quit" => MenuAction::Quit,
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item(MenuItem),
    Separator,
}

impl MenuEntry {
    fn action(label: &str, action: MenuAction) -> Self {
        MenuEntry::Item(MenuItem {
            label: label.to_string(),
            action,
            checked: None,
        })
    }

    fn check(label: &str, action: MenuAction, checked: bool) -> Self {
        MenuEntry::Item(MenuItem {
            label: label.to_string(),
            action,
            checked: Some(checked),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuModel {
    pub entries: Vec<MenuEntry>,
}

#[cfg(test)]
impl MenuModel {
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.entries.iter().filter_map(|entry| match entry {
            MenuEntry::Item(item) => Some(item),
            MenuEntry::Separator => None,
        })
    }

    pub fn find(&self, action: MenuAction) -> Option<&MenuItem> {
        self.items().find(|item| item.action == action)
    }
}

/// State the menu labels depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub window_size: u32,
    pub inverted: bool,
    pub always_on_top: bool,
    pub sleepy: bool,
    /// `None` until the first status query resolves.
    pub autolaunch: Option<bool>,
}

pub fn build_menu(state: &MenuState) -> MenuModel {
    let mut entries: Vec<MenuEntry> = PetSize::ALL
        .iter()
        .map(|size| {
            MenuEntry::check(
                size.label(),
                MenuAction::Resize(size.px()),
                size.px() == state.window_size,
            )
        })
        .collect();

    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::check(
        "Invert Sharkle",
        MenuAction::ToggleInvert,
        state.inverted,
    ));

    entries.push(MenuEntry::Separator);
    let on_top_label = if state.always_on_top {
        "Let Sharkle hide behind windows"
    } else {
        "Keep Sharkle on top"
    };
    entries.push(MenuEntry::action(on_top_label, MenuAction::ToggleAlwaysOnTop));

    entries.push(MenuEntry::Separator);
    let sleepy_label = if state.sleepy {
        "Wake Sharkle up"
    } else {
        "Let Sharkle sleep"
    };
    entries.push(MenuEntry::action(sleepy_label, MenuAction::ToggleSleepy));

    if let Some(enabled) = state.autolaunch {
        entries.push(MenuEntry::action(
            autolaunch::label(enabled),
            MenuAction::ToggleAutolaunch,
        ));
    }

    entries.push(MenuEntry::Separator);
    entries.push(MenuEntry::action("Kill Sharkle :(", MenuAction::Quit));

    MenuModel { entries }
}
