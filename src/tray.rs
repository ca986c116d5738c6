use ksni::{self, menu::CheckmarkItem, menu::StandardItem, Tray, TrayService};
use std::sync::mpsc;
use tracing::info;

use crate::menu::{MenuAction, MenuEntry, MenuModel};

/// System tray implementation using SNI protocol. Shows the same menu as
/// the right-click popover.
pub struct SharkleTray {
    sender: mpsc::Sender<MenuAction>,
    menu: MenuModel,
}

impl SharkleTray {
    pub fn new(sender: mpsc::Sender<MenuAction>, menu: MenuModel) -> Self {
        Self { sender, menu }
    }
}

impl Tray for SharkleTray {
    fn id(&self) -> String {
        "sharklepal".into()
    }

    fn title(&self) -> String {
        "SharklePal".into()
    }

    fn icon_name(&self) -> String {
        "face-smile".into()
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        tray_items(&self.menu)
    }
}

fn tray_items(model: &MenuModel) -> Vec<ksni::MenuItem<SharkleTray>> {
    model
        .entries
        .iter()
        .map(|entry| match entry {
            MenuEntry::Separator => ksni::MenuItem::Separator,
            MenuEntry::Item(item) => {
                let action = item.action;
                let activate = Box::new(move |tray: &mut SharkleTray| {
                    let _ = tray.sender.send(action);
                });
                match item.checked {
                    Some(checked) => CheckmarkItem {
                        label: item.label.clone(),
                        checked,
                        activate,
                        ..Default::default()
                    }
                    .into(),
                    None => StandardItem {
                        label: item.label.clone(),
                        activate,
                        ..Default::default()
                    }
                    .into(),
                }
            }
        })
        .collect()
}

/// Spawn the system tray in a separate thread
/// Returns a receiver for menu actions and a handle to replace the menu
pub fn spawn_tray(
    menu: MenuModel,
) -> anyhow::Result<(mpsc::Receiver<MenuAction>, ksni::Handle<SharkleTray>)> {
    let (sender, receiver) = mpsc::channel();

    let tray = SharkleTray::new(sender, menu);
    let service = TrayService::new(tray);
    let handle = service.handle();

    std::thread::spawn(move || {
        info!("Starting system tray service");
        if let Err(e) = service.run() {
            tracing::error!("System tray service error: {}", e);
        }
    });

    info!("System tray spawned");
    Ok((receiver, handle))
}

/// Swap in a freshly built menu
pub fn replace_menu(handle: &ksni::Handle<SharkleTray>, menu: MenuModel) {
    handle.update(move |tray| {
        tray.menu = menu;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{build_menu, MenuState};

    #[test]
    fn tray_mirrors_menu_model() {
        let model = build_menu(&MenuState {
            window_size: 240,
            inverted: false,
            always_on_top: true,
            sleepy: true,
            autolaunch: Some(true),
        });
        let items = tray_items(&model);
        assert_eq!(items.len(), model.entries.len());
        assert!(matches!(items[4], ksni::MenuItem::Separator));
        assert!(matches!(items[0], ksni::MenuItem::Checkmark(_)));
        assert!(matches!(items.last(), Some(ksni::MenuItem::Standard(_))));
    }

    #[test]
    fn activating_item_sends_action() {
        let (sender, receiver) = mpsc::channel();
        let model = build_menu(&MenuState {
            window_size: 80,
            inverted: true,
            always_on_top: false,
            sleepy: false,
            autolaunch: None,
        });
        let mut tray = SharkleTray::new(sender, model);

        let items = tray.menu();
        let Some(ksni::MenuItem::Standard(quit)) = items.last() else {
            panic!("last entry should be a plain item");
        };
        (quit.activate)(&mut tray);
        assert_eq!(receiver.try_recv().unwrap(), MenuAction::Quit);
    }
}
