//! The GTK side of the pet window: a layer-shell surface hosting a
//! transparent WebView.

use gtk4::gdk;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell as _};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use webkit6::prelude::*;
use webkit6::{
    HardwareAccelerationPolicy, Settings as WebViewSettings, UserContentInjectedFrames,
    UserContentManager, UserScript, UserScriptInjectionTime, WebView,
};

use crate::controller::{PetWindow, WindowSpec};
use crate::geometry::{Bounds, Point, WorkArea};
use crate::ipc::{self, RendererPush};

const NAMESPACE: &str = "sharklepal";
const MEASURE_NAMESPACE: &str = "sharklepal-measure";
/// Give up on the compositor and use the monitor size after this long.
const MEASURE_TIMEOUT: Duration = Duration::from_secs(1);

type PendingMeasure = Rc<RefCell<Option<(ApplicationWindow, Box<dyn FnOnce(WorkArea)>)>>>;

/// Cheap to clone; all clones refer to the same surface.
#[derive(Clone)]
pub struct GtkPetWindow {
    window: ApplicationWindow,
    webview: WebView,
    content: UserContentManager,
    position: Rc<Cell<Point>>,
}

impl GtkPetWindow {
    /// Frameless, fixed-size, transparent and kept out of the taskbar (layer
    /// surfaces never show up there).
    pub fn build(app: &Application, spec: &WindowSpec) -> Self {
        let side = side_px(spec.bounds.size);
        let window = ApplicationWindow::builder()
            .application(app)
            .title("SharklePal")
            .decorated(false)
            .resizable(false)
            .default_width(side)
            .default_height(side)
            .build();
        window.add_css_class("sharkle-window");

        window.init_layer_shell();
        window.set_namespace(Some(NAMESPACE));
        // Margins from the top-left corner are the window position
        window.set_anchor(Edge::Top, true);
        window.set_anchor(Edge::Left, true);
        // Stay clear of panels so margins are work-area relative
        window.set_exclusive_zone(0);
        window.set_keyboard_mode(KeyboardMode::None);

        let content = UserContentManager::new();
        content.add_script(&UserScript::new(
            ipc::BRIDGE_SCRIPT,
            UserContentInjectedFrames::TopFrame,
            UserScriptInjectionTime::Start,
            &[],
            &[],
        ));
        if !content.register_script_message_handler(ipc::HANDLER_NAME, None) {
            warn!("Script message handler {} already registered", ipc::HANDLER_NAME);
        }

        let webview = create_webview(&content);
        window.set_child(Some(&webview));

        let pet = Self {
            window,
            webview,
            content,
            position: Rc::new(Cell::new(spec.bounds.origin())),
        };
        pet.set_bounds(spec.bounds);
        pet
    }

    pub fn window(&self) -> &ApplicationWindow {
        &self.window
    }

    pub fn webview(&self) -> &WebView {
        &self.webview
    }

    pub fn content_manager(&self) -> &UserContentManager {
        &self.content
    }

    pub fn load(&self, document: Option<&Path>) {
        let Some(document) = document else {
            error!("UI document not found, set SHARKLEPAL_UI_DIR to the renderer directory");
            return;
        };

        match glib::filename_to_uri(document, None) {
            Ok(uri) => {
                info!("Loading UI document from: {}", uri);
                self.webview.load_uri(&uri);
            }
            Err(e) => error!("Invalid UI document path {:?}: {}", document, e),
        }
    }

    pub fn present(&self) {
        self.window.present();
    }
}

impl PetWindow for GtkPetWindow {
    fn position(&self) -> Point {
        self.position.get()
    }

    fn set_bounds(&self, bounds: Bounds) {
        let (width, height) = (side_px(bounds.width()), side_px(bounds.height()));
        self.window.set_margin(Edge::Left, bounds.x);
        self.window.set_margin(Edge::Top, bounds.y);
        self.webview.set_size_request(width, height);
        self.window.set_default_size(width, height);
        self.position.set(bounds.origin());
    }

    fn set_always_on_top(&self, on_top: bool) {
        let layer = if on_top { Layer::Overlay } else { Layer::Bottom };
        self.window.set_layer(layer);
        debug!(?layer, "Window layer set");
    }

    fn send(&self, push: &RendererPush) {
        let script = match ipc::push_script(push) {
            Ok(script) => script,
            Err(e) => {
                warn!("Failed to encode renderer push: {}", e);
                return;
            }
        };

        self.webview.evaluate_javascript(
            &script,
            None,
            None,
            None::<&gtk4::gio::Cancellable>,
            |result| {
                if let Err(e) = result {
                    debug!("Renderer push not delivered: {}", e);
                }
            },
        );
    }
}

/// Measure the usable area: the output minus what panels and docks reserve.
///
/// A throwaway, invisible layer surface anchored to all four edges with a
/// zero exclusive zone gets sized by the compositor to exactly the area the
/// pet's margins are measured in. `fallback` is used when layer shell is
/// missing or the compositor never lays the surface out.
pub fn measure_work_area<F>(app: &Application, fallback: WorkArea, done: F)
where
    F: FnOnce(WorkArea) + 'static,
{
    if !gtk4_layer_shell::is_supported() {
        warn!("Layer shell not supported, using monitor size as work area");
        done(fallback);
        return;
    }

    let probe = ApplicationWindow::builder()
        .application(app)
        .decorated(false)
        .build();
    probe.add_css_class("sharkle-window");
    probe.init_layer_shell();
    probe.set_namespace(Some(MEASURE_NAMESPACE));
    probe.set_layer(Layer::Background);
    for edge in [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right] {
        probe.set_anchor(edge, true);
    }
    probe.set_exclusive_zone(0);
    probe.set_keyboard_mode(KeyboardMode::None);
    probe.set_can_target(false);
    probe.set_opacity(0.0);

    let pending: PendingMeasure = Rc::new(RefCell::new(Some((probe.clone(), Box::new(done)))));

    let measured = Rc::clone(&pending);
    probe.connect_realize(move |window| {
        let Some(surface) = window.surface() else {
            return;
        };
        let measured = Rc::clone(&measured);
        surface.connect_layout(move |_, width, height| {
            if width <= 0 || height <= 0 {
                return;
            }
            // Not from inside the probe's own layout signal
            let measured = Rc::clone(&measured);
            glib::idle_add_local_once(move || {
                finish_measure(&measured, WorkArea::new(0, 0, width, height));
            });
        });
    });

    let timed_out = Rc::clone(&pending);
    glib::timeout_add_local_once(MEASURE_TIMEOUT, move || {
        if timed_out.borrow().is_some() {
            warn!("Work area was never laid out, using monitor size");
        }
        finish_measure(&timed_out, fallback);
    });

    probe.present();
}

/// First caller wins; later layouts and the timeout are ignored.
fn finish_measure(pending: &PendingMeasure, work_area: WorkArea) {
    let Some((probe, done)) = pending.borrow_mut().take() else {
        return;
    };
    probe.destroy();
    info!(
        width = work_area.width,
        height = work_area.height,
        "Work area resolved"
    );
    done(work_area);
}

fn create_webview(content: &UserContentManager) -> WebView {
    let settings = WebViewSettings::new();

    settings.set_enable_javascript(true);

    // Sprites are loaded relative to the document
    settings.set_allow_file_access_from_file_urls(true);

    settings.set_enable_developer_extras(cfg!(debug_assertions));

    // Transparent surfaces flicker with GPU compositing on several drivers
    settings.set_hardware_acceleration_policy(HardwareAccelerationPolicy::Never);

    let webview = WebView::builder()
        .settings(&settings)
        .user_content_manager(content)
        .build();

    webview.set_background_color(&gdk::RGBA::new(0.0, 0.0, 0.0, 0.0));

    // The renderer asks for our own menu on secondary click
    webview.connect_context_menu(|_, _, _| true);

    webview
}

fn side_px(size: u32) -> i32 {
    i32::try_from(size).unwrap_or(i32::MAX)
}
