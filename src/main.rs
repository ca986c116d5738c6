mod assets;
mod autolaunch;
mod controller;
mod error;
mod geometry;
mod ipc;
mod menu;
mod settings;
mod shell;
mod state;
mod tray;
mod window_state;

use anyhow::Result;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::Application;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::autolaunch::{AutolaunchWorker, OsRegistrar, Registrar, UnavailableRegistrar};
use crate::controller::PetController;
use crate::settings::{ConfigPaths, SettingsStore};
use crate::shell::Shell;
use crate::state::AppState;
use crate::window_state::WindowStateKeeper;

const APP_ID: &str = "com.sharklepal.Sharkle";

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting SharklePal");

    let paths = ConfigPaths::resolve();
    let store = SettingsStore::open(&paths.settings);
    info!("Settings file: {:?}", store.path());

    let state = AppState::new(store);
    let controller = PetController::new(state, WindowStateKeeper::open(&paths.window_state));

    let registrar: Arc<dyn Registrar> = match OsRegistrar::new(autolaunch::APP_NAME) {
        Ok(registrar) => Arc::new(registrar),
        Err(e) => {
            warn!("Start at login unavailable: {}", e);
            Arc::new(UnavailableRegistrar::new(e.to_string()))
        }
    };
    let worker = AutolaunchWorker::new(registrar)?;

    let app = Application::builder().application_id(APP_ID).build();

    let shell = Shell::new(app.clone(), controller, worker, assets::find_ui_document());
    app.connect_activate(move |_| shell.activate());

    // Transparent window background
    app.connect_startup(|_| {
        let css_provider = gtk4::CssProvider::new();
        css_provider.load_from_data(
            "window.sharkle-window, window.sharkle-window.background { background-color: transparent; }",
        );
        if let Some(display) = gtk4::gdk::Display::default() {
            gtk4::style_context_add_provider_for_display(
                &display,
                &css_provider,
                gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }
    });

    let exit_code = app.run();

    if exit_code != glib::ExitCode::SUCCESS {
        anyhow::bail!("Application exited with error code");
    }

    Ok(())
}
