//! Coordinates the pet window, persisted settings and the menu.
//!
//! Every operation touching the window is a silent no-op while no window
//! exists. Side effects the host has to perform outside of a state borrow
//! (popups, OS calls, quitting) come back as [`ShellCommand`]s.

use tracing::{debug, info};

use crate::autolaunch::{AutolaunchCoordinator, QueryTicket};
use crate::error::Result;
use crate::geometry::{Bounds, Point, WorkArea};
use crate::ipc::{RendererMessage, RendererPush, SECONDARY_BUTTON, SettingsSnapshot};
use crate::menu::{MenuAction, MenuModel, MenuState, build_menu};
use crate::state::AppState;
use crate::window_state::WindowStateKeeper;

/// The host window the controller drives.
pub trait PetWindow {
    fn position(&self) -> Point;
    fn set_bounds(&self, bounds: Bounds);
    fn set_always_on_top(&self, on_top: bool);
    fn send(&self, push: &RendererPush);
}

/// Initial placement handed to the host when opening the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    PopupMenu { x: i32, y: i32 },
    QueryAutolaunch(QueryTicket),
    SetAutolaunch { enable: bool },
    Quit,
}

pub struct PetController<W: PetWindow> {
    state: AppState,
    window_state: WindowStateKeeper,
    autolaunch: AutolaunchCoordinator,
    window: Option<W>,
    settings_pushed: bool,
    menu: MenuModel,
    menu_dirty: bool,
}

impl<W: PetWindow> PetController<W> {
    pub fn new(state: AppState, window_state: WindowStateKeeper) -> Self {
        let mut controller = Self {
            state,
            window_state,
            autolaunch: AutolaunchCoordinator::default(),
            window: None,
            settings_pushed: false,
            menu: MenuModel::default(),
            menu_dirty: false,
        };
        controller.rebuild_menu();
        controller
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn menu(&self) -> &MenuModel {
        &self.menu
    }

    /// The freshly rebuilt menu, once per rebuild.
    pub fn take_menu_update(&mut self) -> Option<MenuModel> {
        if self.menu_dirty {
            self.menu_dirty = false;
            Some(self.menu.clone())
        } else {
            None
        }
    }

    /// Place and open the window: saved position if it still fits,
    /// otherwise the bottom-right corner of the work area.
    pub fn create_window<F>(&mut self, work_area: WorkArea, open: F)
    where
        F: FnOnce(&WindowSpec) -> W,
    {
        if self.window.is_some() {
            debug!("Window already exists, ignoring create");
            return;
        }

        let size = self.state.window_size();
        let origin = self
            .window_state
            .restore(work_area, size)
            .unwrap_or_else(|| work_area.bottom_right(size));
        let spec = WindowSpec {
            bounds: Bounds::square(origin, size),
        };

        let window = open(&spec);
        window.set_always_on_top(self.state.always_on_top());
        self.window_state.track(spec.bounds);
        self.window = Some(window);

        info!(x = origin.x, y = origin.y, size, "Pet window created");
    }

    /// Document finished loading. Only the first load pushes settings.
    pub fn content_loaded(&mut self) {
        if self.settings_pushed || self.window.is_none() {
            return;
        }
        self.settings_pushed = true;
        self.push(RendererPush::LoadSettings(self.snapshot()));
        self.rebuild_menu();
    }

    pub fn close_window(&mut self) {
        if self.window.take().is_some() {
            self.window_state.flush();
            info!("Pet window closed");
        }
    }

    pub fn resize_window(&mut self, size: u32) {
        let Some(window) = &self.window else {
            return;
        };
        let bounds = Bounds::square(window.position(), size);
        window.set_bounds(bounds);
        window.send(&RendererPush::WindowResize(size));

        self.state.set_window_size(size);
        self.window_state.track(bounds);
        self.window_state.flush();
        debug!(size, "Window resized");
    }

    pub fn window_position(&self) -> Point {
        self.window
            .as_ref()
            .map(|window| window.position())
            .unwrap_or_default()
    }

    /// Move without ever letting a drag change the size.
    pub fn set_window_position(&mut self, position: Point) {
        let Some(window) = &self.window else {
            return;
        };
        let bounds = Bounds::square(position, self.state.window_size());
        window.set_bounds(bounds);
        self.window_state.track(bounds);
    }

    pub fn handle_message(&mut self, message: RendererMessage) -> Vec<ShellCommand> {
        match message {
            RendererMessage::MouseDown(event) if event.button == SECONDARY_BUTTON => {
                // Show what we know now, refresh autolaunch in the background.
                let ticket = self.autolaunch.begin_query();
                vec![
                    ShellCommand::PopupMenu {
                        x: event.x,
                        y: event.y,
                    },
                    ShellCommand::QueryAutolaunch(ticket),
                ]
            }
            RendererMessage::MouseDown(_) => Vec::new(),
            RendererMessage::GetWindowPosition => {
                let position = self.window_position();
                self.push(RendererPush::WindowPosition(position));
                Vec::new()
            }
            RendererMessage::SetWindowPosition(position) => {
                self.set_window_position(position);
                Vec::new()
            }
        }
    }

    pub fn activate(&mut self, action: MenuAction) -> Vec<ShellCommand> {
        debug!(?action, "Menu action");
        let mut commands = Vec::new();

        match action {
            MenuAction::Resize(size) => self.resize_window(size),
            MenuAction::ToggleInvert => {
                let inverted = self.state.toggle_inverted();
                self.push(RendererPush::InvertSharkie(inverted));
            }
            MenuAction::ToggleAlwaysOnTop => {
                let on_top = self.state.toggle_always_on_top();
                if let Some(window) = &self.window {
                    window.set_always_on_top(on_top);
                }
            }
            MenuAction::ToggleSleepy => {
                self.state.toggle_sleepy();
                self.push(RendererPush::LoadSettings(self.snapshot()));
            }
            MenuAction::ToggleAutolaunch => match self.autolaunch.begin_toggle() {
                Some(enable) => commands.push(ShellCommand::SetAutolaunch { enable }),
                None => return commands,
            },
            MenuAction::Quit => {
                self.window_state.flush();
                commands.push(ShellCommand::Quit);
                return commands;
            }
        }

        self.rebuild_menu();
        commands
    }

    /// Issue a status query, e.g. at start-up.
    pub fn refresh_autolaunch(&mut self) -> ShellCommand {
        ShellCommand::QueryAutolaunch(self.autolaunch.begin_query())
    }

    pub fn autolaunch_resolved(&mut self, ticket: QueryTicket, result: Result<bool>) {
        if self.autolaunch.finish_query(ticket, result) {
            self.rebuild_menu();
        }
    }

    /// A registration change finished; reconcile with another query.
    pub fn autolaunch_toggled(&mut self, result: Result<()>) -> ShellCommand {
        ShellCommand::QueryAutolaunch(self.autolaunch.finish_toggle(result))
    }

    fn snapshot(&self) -> SettingsSnapshot {
        let settings = self.state.settings();
        SettingsSnapshot {
            inverted: settings.inverted,
            size: settings.window_size,
            sleep_check_interval: settings.sleep_check_interval_ms(),
        }
    }

    fn push(&self, push: RendererPush) {
        if let Some(window) = &self.window {
            window.send(&push);
        }
    }

    fn rebuild_menu(&mut self) {
        self.menu = build_menu(&MenuState {
            window_size: self.state.window_size(),
            inverted: self.state.inverted(),
            always_on_top: self.state.always_on_top(),
            sleepy: self.state.sleepy(),
            autolaunch: self.autolaunch.known(),
        });
        self.menu_dirty = true;
    }
}
