//! Window placement math. The pet window is always square, so geometry is
//! a top-left corner plus a single side length.

use serde::{Deserialize, Serialize};

/// Top-left corner of the window, in work-area coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Square window bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub size: u32,
}

impl Bounds {
    pub fn square(origin: Point, size: u32) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            size,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn width(&self) -> u32 {
        self.size
    }

    pub fn height(&self) -> u32 {
        self.size
    }
}

/// Usable part of the screen (monitor minus panels/docks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkArea {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl WorkArea {
    /// Used when the display reports no monitors at all.
    pub const FALLBACK: WorkArea = WorkArea {
        x: 0,
        y: 0,
        width: 1280,
        height: 720,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether a `size` x `size` window at `origin` lies fully inside.
    pub fn contains(&self, origin: Point, size: u32) -> bool {
        let side = side_px(size);
        origin.x >= self.x
            && origin.y >= self.y
            && origin.x.saturating_add(side) <= self.x.saturating_add(self.width)
            && origin.y.saturating_add(side) <= self.y.saturating_add(self.height)
    }

    /// Bottom-right corner placement, never left of or above the origin.
    pub fn bottom_right(&self, size: u32) -> Point {
        let side = side_px(size);
        let x = self.x.saturating_add(self.width).saturating_sub(side);
        let y = self.y.saturating_add(self.height).saturating_sub(side);
        Point::new(x.max(self.x), y.max(self.y))
    }
}

/// The sizes offered in the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PetSize {
    Giant,
    Big,
    Medium,
    Small,
}

impl PetSize {
    /// Menu order, largest first.
    pub const ALL: [PetSize; 4] = [PetSize::Giant, PetSize::Big, PetSize::Medium, PetSize::Small];

    pub const DEFAULT: PetSize = PetSize::Big;

    pub fn px(self) -> u32 {
        match self {
            PetSize::Giant => 480,
            PetSize::Big => 240,
            PetSize::Medium => 140,
            PetSize::Small => 80,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PetSize::Giant => "Giant Sharkle",
            PetSize::Big => "Big Sharkle",
            PetSize::Medium => "Medium Sharkle",
            PetSize::Small => "Small Sharkle",
        }
    }
}

fn side_px(size: u32) -> i32 {
    i32::try_from(size).unwrap_or(i32::MAX)
}
