//! GTK host: owns the controller on the main thread and carries out the
//! commands it returns.

mod popover;
mod window;

use gtk4::gdk;
use gtk4::gio;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::Application;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};
use webkit6::prelude::*;
use webkit6::LoadEvent;

use crate::autolaunch::AutolaunchWorker;
use crate::controller::{PetController, ShellCommand};
use crate::error::PetError;
use crate::geometry::WorkArea;
use crate::ipc;
use crate::menu::MenuAction;
use crate::tray::{self, SharkleTray};

pub use window::GtkPetWindow;

/// Transparent windows created right at start-up come up opaque on some
/// compositors.
const STARTUP_DELAY: Duration = Duration::from_millis(300);
const TRAY_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Shell {
    app: Application,
    controller: RefCell<PetController<GtkPetWindow>>,
    worker: AutolaunchWorker,
    document: Option<PathBuf>,
    popover_menu: RefCell<gio::Menu>,
    tray: RefCell<Option<ksni::Handle<SharkleTray>>>,
    started: Cell<bool>,
}

impl Shell {
    pub fn new(
        app: Application,
        controller: PetController<GtkPetWindow>,
        worker: AutolaunchWorker,
        document: Option<PathBuf>,
    ) -> Rc<Self> {
        let popover_menu = popover::to_gio_menu(controller.menu());
        Rc::new(Self {
            app,
            controller: RefCell::new(controller),
            worker,
            document,
            popover_menu: RefCell::new(popover_menu),
            tray: RefCell::new(None),
            started: Cell::new(false),
        })
    }

    /// Handles `activate`; a second activation just raises the window.
    pub fn activate(self: &Rc<Self>) {
        if self.started.replace(true) {
            let window = self.controller.borrow().window().cloned();
            if let Some(window) = window {
                window.present();
            }
            return;
        }

        self.install_actions();
        self.spawn_tray();

        let query = self.controller.borrow_mut().refresh_autolaunch();
        self.execute(vec![query]);

        let hold = self.app.hold();
        let shell = Rc::clone(self);
        glib::timeout_add_local_once(STARTUP_DELAY, move || {
            let app = shell.app.clone();
            window::measure_work_area(&app, monitor_area(), move |work_area| {
                shell.open_window(work_area);
                drop(hold);
            });
        });
    }

    fn open_window(self: &Rc<Self>, work_area: WorkArea) {
        self.controller
            .borrow_mut()
            .create_window(work_area, |spec| GtkPetWindow::build(&self.app, spec));

        let Some(pet) = self.controller.borrow().window().cloned() else {
            return;
        };
        self.connect_window(&pet);
        pet.load(self.document.as_deref());
        pet.present();
    }

    fn connect_window(self: &Rc<Self>, pet: &GtkPetWindow) {
        let weak = Rc::downgrade(self);
        pet.window().connect_close_request(move |_| {
            if let Some(shell) = weak.upgrade() {
                shell.controller.borrow_mut().close_window();
            }
            glib::Propagation::Proceed
        });

        let weak = Rc::downgrade(self);
        pet.webview().connect_load_changed(move |_, event| {
            if event != LoadEvent::Finished {
                return;
            }
            if let Some(shell) = weak.upgrade() {
                shell.controller.borrow_mut().content_loaded();
                shell.sync_menu();
            }
        });

        let weak = Rc::downgrade(self);
        pet.content_manager().connect_script_message_received(
            Some(ipc::HANDLER_NAME),
            move |_, value| {
                let Some(json) = value.to_json(0) else {
                    return;
                };
                match ipc::parse_message(&json) {
                    Ok(message) => {
                        if let Some(shell) = weak.upgrade() {
                            let commands = shell.controller.borrow_mut().handle_message(message);
                            shell.execute(commands);
                        }
                    }
                    Err(e) => warn!("Dropping malformed renderer message {}: {}", json, e),
                }
            },
        );
    }

    fn install_actions(self: &Rc<Self>) {
        for name in MenuAction::NAMES {
            let parameter = (name == "resize").then_some(glib::VariantTy::UINT32);
            let action = gio::SimpleAction::new(name, parameter);

            let weak = Rc::downgrade(self);
            action.connect_activate(move |_, parameter| {
                let target = parameter.and_then(|value| value.get::<u32>());
                let (Some(shell), Some(action)) = (weak.upgrade(), MenuAction::parse(name, target))
                else {
                    return;
                };
                shell.dispatch(action);
            });

            self.app.add_action(&action);
        }
    }

    fn spawn_tray(self: &Rc<Self>) {
        let menu = self.controller.borrow().menu().clone();
        let (receiver, handle) = match tray::spawn_tray(menu) {
            Ok(tray) => tray,
            Err(e) => {
                warn!("System tray unavailable: {}", e);
                return;
            }
        };
        *self.tray.borrow_mut() = Some(handle);
        poll_tray(Rc::downgrade(self), receiver);
    }

    fn dispatch(self: &Rc<Self>, action: MenuAction) {
        let commands = self.controller.borrow_mut().activate(action);
        self.execute(commands);
    }

    /// Runs with no controller borrow held.
    fn execute(self: &Rc<Self>, commands: Vec<ShellCommand>) {
        for command in commands {
            match command {
                ShellCommand::PopupMenu { x, y } => self.popup_menu(x, y),
                ShellCommand::QueryAutolaunch(ticket) => {
                    let handle = self.worker.query();
                    let weak = Rc::downgrade(self);
                    glib::spawn_future_local(async move {
                        let result = handle.await.map_err(PetError::from).and_then(|r| r);
                        let Some(shell) = weak.upgrade() else {
                            return;
                        };
                        shell.controller.borrow_mut().autolaunch_resolved(ticket, result);
                        shell.sync_menu();
                    });
                }
                ShellCommand::SetAutolaunch { enable } => {
                    let handle = self.worker.set_enabled(enable);
                    let weak = Rc::downgrade(self);
                    glib::spawn_future_local(async move {
                        let result = handle.await.map_err(PetError::from).and_then(|r| r);
                        let Some(shell) = weak.upgrade() else {
                            return;
                        };
                        let follow_up = shell.controller.borrow_mut().autolaunch_toggled(result);
                        shell.execute(vec![follow_up]);
                    });
                }
                ShellCommand::Quit => {
                    info!("Quitting");
                    self.app.quit();
                }
            }
        }
        self.sync_menu();
    }

    fn popup_menu(&self, x: i32, y: i32) {
        let Some(pet) = self.controller.borrow().window().cloned() else {
            return;
        };
        let menu = self.popover_menu.borrow().clone();
        popover::show(pet.webview(), &menu, x, y);
    }

    /// Replace both menus wholesale if the controller rebuilt its model.
    fn sync_menu(&self) {
        let Some(model) = self.controller.borrow_mut().take_menu_update() else {
            return;
        };
        debug!(entries = model.entries.len(), "Menu rebuilt");
        *self.popover_menu.borrow_mut() = popover::to_gio_menu(&model);
        if let Some(handle) = self.tray.borrow().as_ref() {
            tray::replace_menu(handle, model);
        }
    }
}

fn poll_tray(shell: Weak<Shell>, receiver: mpsc::Receiver<MenuAction>) {
    glib::timeout_add_local(TRAY_POLL_INTERVAL, move || {
        let Some(shell) = shell.upgrade() else {
            return glib::ControlFlow::Break;
        };
        while let Ok(action) = receiver.try_recv() {
            shell.dispatch(action);
        }
        glib::ControlFlow::Continue
    });
}

/// First monitor's size, used when the real work area cannot be measured.
fn monitor_area() -> WorkArea {
    let monitor = gdk::Display::default()
        .and_then(|display| display.monitors().item(0))
        .and_then(|object| object.downcast::<gdk::Monitor>().ok());

    match monitor {
        Some(monitor) => {
            let geometry = monitor.geometry();
            WorkArea::new(0, 0, geometry.width(), geometry.height())
        }
        None => {
            warn!("No monitor reported, using fallback work area");
            WorkArea::FALLBACK
        }
    }
}
