//! Start-at-login registration.
//!
//! OS calls are blocking, so they run on a small worker runtime. The
//! coordinator keeps the best-known status for the menu and decides which
//! late results may still be applied.

use auto_launch::{AutoLaunch, AutoLaunchBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{PetError, Result};

/// Login item name.
pub const APP_NAME: &str = "SharklePal";

pub const DISABLE_LABEL: &str = "I'm awful and I don't want to see Sharkie again";
pub const ENABLE_LABEL: &str = "I really love Sharkie and I want it on my PC every time it starts";

/// Anything that can register the app to start at login.
pub trait Registrar: Send + Sync + 'static {
    fn is_enabled(&self) -> Result<bool>;
    fn enable(&self) -> Result<()>;
    fn disable(&self) -> Result<()>;
}

pub struct OsRegistrar {
    inner: AutoLaunch,
}

impl OsRegistrar {
    /// Registers `$APPIMAGE` when running from an AppImage, else this
    /// executable.
    pub fn new(name: &str) -> Result<Self> {
        let path = match std::env::var_os("APPIMAGE") {
            Some(appimage) => PathBuf::from(appimage),
            None => std::env::current_exe()?,
        };
        debug!("Autolaunch target: {:?}", path);

        let inner = AutoLaunchBuilder::new()
            .set_app_name(name)
            .set_app_path(&path.to_string_lossy())
            .build()?;

        Ok(Self { inner })
    }
}

impl Registrar for OsRegistrar {
    fn is_enabled(&self) -> Result<bool> {
        Ok(self.inner.is_enabled()?)
    }

    fn enable(&self) -> Result<()> {
        Ok(self.inner.enable()?)
    }

    fn disable(&self) -> Result<()> {
        if !self.inner.is_enabled()? {
            return Ok(());
        }
        Ok(self.inner.disable()?)
    }
}

/// Stands in when the OS registrar could not be set up. Every call fails,
/// so the status never becomes known and the menu entry stays hidden.
pub struct UnavailableRegistrar {
    reason: String,
}

impl UnavailableRegistrar {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> PetError {
        PetError::Autolaunch(self.reason.clone())
    }
}

impl Registrar for UnavailableRegistrar {
    fn is_enabled(&self) -> Result<bool> {
        Err(self.error())
    }

    fn enable(&self) -> Result<()> {
        Err(self.error())
    }

    fn disable(&self) -> Result<()> {
        Err(self.error())
    }
}

/// Runs registrar calls off the main thread.
pub struct AutolaunchWorker {
    runtime: Runtime,
    registrar: Arc<dyn Registrar>,
}

impl AutolaunchWorker {
    pub fn new(registrar: Arc<dyn Registrar>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sharkle-autolaunch")
            .build()?;
        Ok(Self { runtime, registrar })
    }

    pub fn query(&self) -> JoinHandle<Result<bool>> {
        let registrar = Arc::clone(&self.registrar);
        self.runtime.spawn_blocking(move || registrar.is_enabled())
    }

    pub fn set_enabled(&self, enable: bool) -> JoinHandle<Result<()>> {
        let registrar = Arc::clone(&self.registrar);
        self.runtime.spawn_blocking(move || {
            if enable {
                registrar.enable()
            } else {
                registrar.disable()
            }
        })
    }
}

/// Identifies one status query so stale answers can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

/// Best-known autolaunch status plus in-flight bookkeeping.
#[derive(Debug, Default)]
pub struct AutolaunchCoordinator {
    known: Option<bool>,
    latest_query: u64,
    toggle_in_flight: bool,
}

impl AutolaunchCoordinator {
    pub fn known(&self) -> Option<bool> {
        self.known
    }

    #[cfg(test)]
    pub fn toggle_in_flight(&self) -> bool {
        self.toggle_in_flight
    }

    /// Start a status query. Any older outstanding query is superseded.
    pub fn begin_query(&mut self) -> QueryTicket {
        self.latest_query += 1;
        QueryTicket(self.latest_query)
    }

    /// Apply a query result. Returns true when the known status changed.
    pub fn finish_query(&mut self, ticket: QueryTicket, result: Result<bool>) -> bool {
        if ticket.0 != self.latest_query || self.toggle_in_flight {
            debug!(?ticket, "Dropping superseded autolaunch status");
            return false;
        }

        match result {
            Ok(enabled) => {
                let changed = self.known != Some(enabled);
                self.known = Some(enabled);
                changed
            }
            Err(e) => {
                warn!("Autolaunch status query failed: {}", e);
                false
            }
        }
    }

    /// Flip registration based on the cached status. Returns the requested
    /// state, or `None` when the status is unknown or a toggle is pending.
    pub fn begin_toggle(&mut self) -> Option<bool> {
        if self.toggle_in_flight {
            debug!("Autolaunch toggle already in flight, ignoring click");
            return None;
        }
        let enable = !self.known?;
        self.toggle_in_flight = true;
        self.known = Some(enable);
        info!(enable, "Requesting autolaunch change");
        Some(enable)
    }

    /// The OS call finished. Always follow up with a fresh query so the
    /// label converges on what the OS actually has.
    pub fn finish_toggle(&mut self, result: Result<()>) -> QueryTicket {
        self.toggle_in_flight = false;
        if let Err(e) = result {
            warn!("Autolaunch change failed: {}", e);
        }
        self.begin_query()
    }
}

pub fn label(enabled: bool) -> &'static str {
    if enabled {
        DISABLE_LABEL
    } else {
        ENABLE_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRegistrar {
        enabled: AtomicBool,
        calls: AtomicUsize,
    }

    impl Registrar for FakeRegistrar {
        fn is_enabled(&self) -> Result<bool> {
            Ok(self.enabled.load(Ordering::SeqCst))
        }

        fn enable(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.enabled.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn disable(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.enabled.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn unknown_status_blocks_toggle() {
        let mut coordinator = AutolaunchCoordinator::default();
        assert_eq!(coordinator.begin_toggle(), None);
        assert!(!coordinator.toggle_in_flight());
    }

    #[test]
    fn query_result_becomes_known() {
        let mut coordinator = AutolaunchCoordinator::default();
        let ticket = coordinator.begin_query();
        assert!(coordinator.finish_query(ticket, Ok(true)));
        assert_eq!(coordinator.known(), Some(true));
        let again = coordinator.begin_query();
        assert!(!coordinator.finish_query(again, Ok(true)));
    }

    #[test]
    fn superseded_query_is_dropped() {
        let mut coordinator = AutolaunchCoordinator::default();
        let first = coordinator.begin_query();
        let second = coordinator.begin_query();
        assert!(!coordinator.finish_query(first, Ok(true)));
        assert_eq!(coordinator.known(), None);
        assert!(coordinator.finish_query(second, Ok(false)));
        assert_eq!(coordinator.known(), Some(false));
    }

    #[test]
    fn failed_query_keeps_previous_status() {
        let mut coordinator = AutolaunchCoordinator::default();
        let ticket = coordinator.begin_query();
        coordinator.finish_query(ticket, Ok(true));
        let ticket = coordinator.begin_query();
        let failed = coordinator.finish_query(ticket, Err(PetError::Autolaunch("dbus".into())));
        assert!(!failed);
        assert_eq!(coordinator.known(), Some(true));
    }

    #[test]
    fn toggle_flips_label_optimistically() {
        let mut coordinator = AutolaunchCoordinator::default();
        let ticket = coordinator.begin_query();
        coordinator.finish_query(ticket, Ok(false));

        assert_eq!(coordinator.begin_toggle(), Some(true));
        assert_eq!(coordinator.known(), Some(true));
        assert!(coordinator.toggle_in_flight());
    }

    #[test]
    fn rapid_double_click_converges_on_os_state() {
        let registrar = FakeRegistrar::default();
        let mut coordinator = AutolaunchCoordinator::default();

        // Menu opened: a query goes out but has not resolved yet.
        let stale = coordinator.begin_query();
        let ticket = coordinator.begin_query();
        coordinator.finish_query(ticket, registrar.is_enabled());

        let first = coordinator.begin_toggle().unwrap();
        assert_eq!(coordinator.begin_toggle(), None);

        registrar.enable().unwrap();
        assert!(first);
        let reconcile = coordinator.finish_toggle(Ok(()));

        // The pre-toggle answer lands late and must not win.
        assert!(!coordinator.finish_query(stale, Ok(false)));
        coordinator.finish_query(reconcile, registrar.is_enabled());

        assert_eq!(coordinator.known(), Some(true));
        assert_eq!(registrar.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_toggle_is_reconciled_by_follow_up_query() {
        let mut coordinator = AutolaunchCoordinator::default();
        let ticket = coordinator.begin_query();
        coordinator.finish_query(ticket, Ok(false));

        coordinator.begin_toggle();
        let reconcile =
            coordinator.finish_toggle(Err(PetError::Autolaunch("permission denied".into())));
        assert_eq!(coordinator.known(), Some(true));

        assert!(coordinator.finish_query(reconcile, Ok(false)));
        assert_eq!(coordinator.known(), Some(false));
    }

    #[test]
    fn worker_runs_registrar_calls() {
        let registrar = Arc::new(FakeRegistrar::default());
        let worker = AutolaunchWorker::new(registrar.clone()).unwrap();

        worker.runtime.block_on(worker.set_enabled(true)).unwrap().unwrap();
        let enabled = worker.runtime.block_on(worker.query()).unwrap().unwrap();
        assert!(enabled);
    }

    #[test]
    fn unavailable_registrar_keeps_status_unknown() {
        let worker = AutolaunchWorker::new(Arc::new(UnavailableRegistrar::new("no executable path")))
            .unwrap();
        let mut coordinator = AutolaunchCoordinator::default();

        let ticket = coordinator.begin_query();
        let result = worker.runtime.block_on(worker.query()).unwrap();
        assert!(matches!(result, Err(PetError::Autolaunch(ref reason)) if reason == "no executable path"));
        assert!(!coordinator.finish_query(ticket, result));
        assert_eq!(coordinator.known(), None);
        assert_eq!(coordinator.begin_toggle(), None);

        let change = worker.runtime.block_on(worker.set_enabled(true)).unwrap();
        assert!(change.is_err());
    }

    #[test]
    fn labels_describe_next_action() {
        assert_eq!(label(true), DISABLE_LABEL);
        assert_eq!(label(false), ENABLE_LABEL);
    }
}
