//! Screen Module
//!
//! Usable-area computation for the single managed screen. The root
//! rectangle is read fresh for every map request; margins reserve space at
//! the edges (panels, docks) and shrink what placement centers in.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::Geometry;

/// Reserved space at each screen edge, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Margins {
    /// Shrink `screen` by these margins
    pub fn work_area(&self, screen: Geometry) -> Geometry {
        if *self == Self::default() {
            return screen;
        }

        let work_area = Geometry {
            x: screen.x.saturating_add(self.left.min(screen.width) as i32),
            y: screen.y.saturating_add(self.top.min(screen.height) as i32),
            width: screen.width.saturating_sub(self.left.saturating_add(self.right)),
            height: screen.height.saturating_sub(self.top.saturating_add(self.bottom)),
        };

        debug!(
            "Work area: {}x{} at ({}, {})",
            work_area.width, work_area.height, work_area.x, work_area.y
        );

        work_area
    }
}
