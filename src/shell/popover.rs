use gtk4::gdk;
use gtk4::gio;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::PopoverMenu;

use crate::menu::{MenuEntry, MenuModel};

/// Actions are registered on the application.
const ACTION_PREFIX: &str = "app";

/// Render the menu model as a GIO menu; separators become section breaks.
pub fn to_gio_menu(model: &MenuModel) -> gio::Menu {
    let menu = gio::Menu::new();
    let mut section = gio::Menu::new();

    for entry in &model.entries {
        match entry {
            MenuEntry::Separator => {
                menu.append_section(None, &section);
                section = gio::Menu::new();
            }
            MenuEntry::Item(item) => {
                let gio_item = gio::MenuItem::new(Some(&item.label), None);
                let target = item.action.target().map(|value| value.to_variant());
                gio_item.set_action_and_target_value(
                    Some(&format!("{ACTION_PREFIX}.{}", item.action.name())),
                    target.as_ref(),
                );
                section.append_item(&gio_item);
            }
        }
    }
    menu.append_section(None, &section);

    menu
}

/// Pop a fresh menu up at `(x, y)` relative to `parent`.
pub fn show(parent: &impl IsA<gtk4::Widget>, menu: &gio::Menu, x: i32, y: i32) {
    let popover = PopoverMenu::from_model(Some(menu));
    popover.set_parent(parent);
    popover.set_has_arrow(false);
    popover.set_pointing_to(Some(&gdk::Rectangle::new(x, y, 1, 1)));

    popover.connect_closed(|popover| {
        // Unparent after the activated item has been handled
        let popover = popover.clone();
        glib::idle_add_local_once(move || popover.unparent());
    });

    popover.popup();
}
