//! Window and screen value types
//!
//! Plain geometry shared by the display backend, the placement policy and
//! the dispatch loop. The X server owns every window; we only ever hold its id.

/// X11 window id. Non-owning: the server decides the window's lifetime.
pub type WindowRef = u32;

/// Rectangle in root-window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Current size of a client window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

