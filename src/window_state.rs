//! Remembers where the pet was last placed.
//!
//! Drag updates only touch memory; the file is rewritten on resize, on close
//! and on quit.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{Bounds, Point, WorkArea};

#[derive(Debug, Default)]
pub struct WindowStateKeeper {
    path: Option<PathBuf>,
    bounds: Option<Bounds>,
    dirty: bool,
}

impl WindowStateKeeper {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let bounds = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Bounds>(&contents) {
                Ok(bounds) => Some(bounds),
                Err(e) => {
                    warn!("Ignoring unreadable window state {:?}: {}", path, e);
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path: Some(path),
            bounds,
            dirty: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Saved position for a window of `size`, if it still fits `work_area`.
    pub fn restore(&self, work_area: WorkArea, size: u32) -> Option<Point> {
        let origin = self.bounds?.origin();
        if work_area.contains(origin, size) {
            Some(origin)
        } else {
            debug!(?origin, ?work_area, "Saved position is off-screen, using default");
            None
        }
    }

    pub fn track(&mut self, bounds: Bounds) {
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.dirty = true;
        }
    }

    pub fn save(&mut self) -> Result<()> {
        let (Some(path), Some(bounds)) = (&self.path, self.bounds) else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&bounds)?)?;
        self.dirty = false;

        Ok(())
    }

    /// `save`, logging instead of returning the error.
    pub fn flush(&mut self) {
        if let Err(e) = self.save() {
            warn!("Failed to save window state: {}", e);
        }
    }
}
