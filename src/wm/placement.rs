//! Placement Module
//!
//! Decides where a newly mapped window goes. Every map request is centered
//! on the usable screen area independently; no history of earlier windows
//! is consulted.

use x11rb::protocol::xproto::StackMode;

use crate::shared::{Geometry, WindowSize};

/// Where a placed window sits in the stacking order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackHint {
    /// Raised above every sibling
    Above,
}

impl From<StackHint> for StackMode {
    fn from(hint: StackHint) -> Self {
        match hint {
            StackHint::Above => StackMode::ABOVE,
        }
    }
}

/// Target configuration for a window, computed before anything is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub border_width: u32,
    pub stacking: StackHint,
}

/// Center `size` on `screen`.
///
/// Odd leftovers are floored, so the window leans one pixel toward the
/// top-left rather than being rounded. Windows larger than the screen get a
/// negative offset and stay symmetric about the center.
pub fn center_on(screen: &Geometry, size: WindowSize) -> Placement {
    let x = screen.x as i64 + (screen.width as i64 - size.width as i64).div_euclid(2);
    let y = screen.y as i64 + (screen.height as i64 - size.height as i64).div_euclid(2);

    Placement {
        x: x as i32,
        y: y as i32,
        border_width: 0,
        stacking: StackHint::Above,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_on_full_hd() {
        let screen = Geometry::new(0, 0, 1920, 1080);
        let placement = center_on(&screen, WindowSize::new(800, 600));

        assert_eq!(placement.x, 560);
        assert_eq!(placement.y, 240);
        assert_eq!(placement.border_width, 0);
        assert_eq!(placement.stacking, StackHint::Above);
    }

    #[test]
    fn odd_sizes_lean_top_left() {
        let screen = Geometry::new(0, 0, 1920, 1080);
        let placement = center_on(&screen, WindowSize::new(801, 601));

        assert_eq!((placement.x, placement.y), (559, 239));
    }

    #[test]
    fn bounding_box_is_symmetric_about_center() {
        let screens = [
            Geometry::new(0, 0, 1920, 1080),
            Geometry::new(0, 0, 1366, 768),
            Geometry::new(40, 30, 1024, 700),
            Geometry::new(0, 0, 1, 1),
        ];
        let sizes = [(1, 1), (333, 222), (800, 600), (1024, 700), (17, 3)];

        for screen in &screens {
            for &(w, h) in &sizes {
                if w > screen.width || h > screen.height {
                    continue;
                }
                let p = center_on(screen, WindowSize::new(w, h));
                let left = p.x - screen.x;
                let right = (screen.x + screen.width as i32) - (p.x + w as i32);
                let top = p.y - screen.y;
                let bottom = (screen.y + screen.height as i32) - (p.y + h as i32);

                assert!(right - left == 0 || right - left == 1, "{screen:?} {w}x{h}");
                assert!(bottom - top == 0 || bottom - top == 1, "{screen:?} {w}x{h}");
            }
        }
    }

    #[test]
    fn window_filling_screen_sits_at_origin() {
        let screen = Geometry::new(10, 20, 640, 480);
        let placement = center_on(&screen, WindowSize::new(640, 480));

        assert_eq!((placement.x, placement.y), (10, 20));
    }

    #[test]
    fn oversized_window_goes_negative() {
        let screen = Geometry::new(0, 0, 800, 600);
        let placement = center_on(&screen, WindowSize::new(1001, 600));

        assert_eq!(placement.x, -101);
        assert_eq!(placement.y, 0);
    }

    #[test]
    fn stack_hint_maps_to_protocol() {
        assert_eq!(StackMode::from(StackHint::Above), StackMode::ABOVE);
    }
}
