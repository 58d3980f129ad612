//! Display Module
//!
//! Owns the X11 connection: resolves the display target, claims
//! window-management rights on the root window and turns protocol traffic
//! into [`WindowEvent`]s. The dispatch loop only talks to the
//! [`DisplayConnection`] trait, so a scripted double can stand in for the
//! server.

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};

use crate::shared::{Geometry, WindowRef, WindowSize};
use crate::wm::placement::Placement;

/// Display used when neither the config nor `$DISPLAY` names one
pub const DEFAULT_DISPLAY: &str = ":0";

/// Event kinds the dispatch loop distinguishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    KeyPress { keycode: u8, state: u16 },
    MapRequest(WindowRef),
    /// Anything else the server delivers, kept as its debug rendering
    Unknown(String),
}

/// Failures surfaced by a display connection
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to connect to display {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: ConnectError,
    },

    #[error("failed to watch the display connection: {0}")]
    Poll(#[from] std::io::Error),

    #[error("window management rights unavailable: {0}")]
    PermissionDenied(String),

    #[error("connection to the display server closed: {0}")]
    ConnectionClosed(String),

    #[error("cannot query geometry of window {window:#x}: {reason}")]
    GeometryQuery { window: WindowRef, reason: String },

    #[error("interrupted by operator")]
    Interrupted,
}

impl From<ConnectionError> for DisplayError {
    fn from(error: ConnectionError) -> Self {
        Self::ConnectionClosed(error.to_string())
    }
}

impl DisplayError {
    /// Map a failed geometry reply: transport loss stays fatal, a protocol
    /// error only concerns this one window.
    fn from_geometry_reply(window: WindowRef, error: ReplyError) -> Self {
        match error {
            ReplyError::ConnectionError(e) => e.into(),
            ReplyError::X11Error(e) => Self::GeometryQuery {
                window,
                reason: format!("{:?}", e.error_kind),
            },
        }
    }
}

/// Operations the dispatch loop issues against the display server
pub trait DisplayConnection {
    /// Ask to become the window manager of the root window
    fn claim_management_rights(&mut self) -> Result<(), DisplayError>;

    /// Whether the last claim succeeded
    fn has_management_rights(&self) -> bool;

    /// Number of events that can be fetched without blocking
    fn pending_count(&mut self) -> Result<usize, DisplayError>;

    /// Block until the next event arrives
    fn next_event(&mut self) -> Result<WindowEvent, DisplayError>;

    /// Park briefly while nothing is pending
    fn idle(&mut self) -> Result<(), DisplayError>;

    /// Current screen rectangle
    fn screen_geometry(&mut self) -> Result<Geometry, DisplayError>;

    /// Current size of `window`
    fn window_size(&mut self, window: WindowRef) -> Result<WindowSize, DisplayError>;

    /// Move, raise and map `window`, then give it input focus
    fn place_and_show(&mut self, window: WindowRef, placement: &Placement)
    -> Result<(), DisplayError>;
}

/// Pick the display target: explicit, then environment, then `:0`.
/// Empty strings count as unset.
pub fn resolve_target(explicit: Option<&str>, env: Option<&str>) -> String {
    explicit
        .filter(|t| !t.is_empty())
        .or(env.filter(|t| !t.is_empty()))
        .unwrap_or(DEFAULT_DISPLAY)
        .to_string()
}

#[cfg(unix)]
pub use self::x11::X11Display;

#[cfg(unix)]
mod x11 {
    use std::collections::VecDeque;
    use std::os::unix::io::AsRawFd;

    use tracing::{debug, info};
    use x11rb::connection::Connection;
    use x11rb::errors::ReplyError;
    use x11rb::protocol::xproto::*;
    use x11rb::protocol::{ErrorKind, Event};
    use x11rb::rust_connection::RustConnection;

    use super::{DisplayConnection, DisplayError, WindowEvent, resolve_target};
    use crate::shared::{Geometry, WindowRef, WindowSize};
    use crate::wm::Interrupt;
    use crate::wm::placement::Placement;
    use crate::x11_poll::FdReadiness;

    /// Live connection to an X server, bound to its default screen
    pub struct X11Display {
        conn: RustConnection,
        root: Window,
        /// Events drained by `pending_count` but not yet handed out
        queue: VecDeque<Event>,
        readiness: FdReadiness,
        managing: bool,
    }

    impl X11Display {
        /// Connect to `target`, falling back to `$DISPLAY` and then `:0`
        pub fn open(target: Option<&str>, interrupt: Interrupt) -> Result<Self, DisplayError> {
            let env = std::env::var("DISPLAY").ok();
            let target = resolve_target(target, env.as_deref());

            let (conn, screen_num) = RustConnection::connect(Some(&target))
                .map_err(|source| DisplayError::Connect {
                    target: target.clone(),
                    source,
                })?;

            let screen = &conn.setup().roots[screen_num];
            let root = screen.root;
            info!(
                "Connected to X server {}, screen {} ({}x{})",
                target, screen_num, screen.width_in_pixels, screen.height_in_pixels
            );

            let readiness = FdReadiness::new(conn.stream().as_raw_fd(), interrupt)?;

            Ok(Self {
                conn,
                root,
                queue: VecDeque::new(),
                readiness,
                managing: false,
            })
        }

        fn drain(&mut self) -> Result<(), DisplayError> {
            while let Some(event) = self.conn.poll_for_event()? {
                self.queue.push_back(event);
            }
            Ok(())
        }
    }

    fn classify(event: Event) -> WindowEvent {
        match event {
            Event::KeyPress(e) => WindowEvent::KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
            },
            Event::MapRequest(e) => WindowEvent::MapRequest(e.window),
            other => WindowEvent::Unknown(format!("{:?}", other)),
        }
    }

    impl DisplayConnection for X11Display {
        /// Select SubstructureRedirect on the root window.
        ///
        /// Only one client may hold it; when another window manager does,
        /// this fails with [`DisplayError::PermissionDenied`] and the
        /// connection stays usable, it just never sees map requests.
        fn claim_management_rights(&mut self) -> Result<(), DisplayError> {
            let attrs =
                ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT);

            match self.conn.change_window_attributes(self.root, &attrs)?.check() {
                Ok(()) => {
                    self.managing = true;
                    Ok(())
                }
                Err(ReplyError::ConnectionError(e)) => Err(e.into()),
                Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => Err(
                    DisplayError::PermissionDenied("another window manager is running".into()),
                ),
                Err(ReplyError::X11Error(e)) => {
                    Err(DisplayError::PermissionDenied(format!("{:?}", e.error_kind)))
                }
            }
        }

        fn has_management_rights(&self) -> bool {
            self.managing
        }

        fn pending_count(&mut self) -> Result<usize, DisplayError> {
            self.drain()?;
            Ok(self.queue.len())
        }

        fn next_event(&mut self) -> Result<WindowEvent, DisplayError> {
            // A steady event stream never reaches the readiness wait
            self.readiness.check_interrupt()?;
            loop {
                if let Some(event) = self.queue.pop_front() {
                    return Ok(classify(event));
                }
                if let Some(event) = self.conn.poll_for_event()? {
                    return Ok(classify(event));
                }
                self.readiness.wait()?;
            }
        }

        fn idle(&mut self) -> Result<(), DisplayError> {
            self.conn.flush()?;
            self.readiness.wait()
        }

        fn screen_geometry(&mut self) -> Result<Geometry, DisplayError> {
            let root = self.root;
            let geom = self
                .conn
                .get_geometry(root)?
                .reply()
                .map_err(|e| DisplayError::from_geometry_reply(root, e))?;

            Ok(Geometry::new(
                geom.x as i32,
                geom.y as i32,
                geom.width as u32,
                geom.height as u32,
            ))
        }

        fn window_size(&mut self, window: WindowRef) -> Result<WindowSize, DisplayError> {
            let geom = self
                .conn
                .get_geometry(window)?
                .reply()
                .map_err(|e| DisplayError::from_geometry_reply(window, e))?;

            Ok(WindowSize::new(geom.width as u32, geom.height as u32))
        }

        fn place_and_show(
            &mut self,
            window: WindowRef,
            placement: &Placement,
        ) -> Result<(), DisplayError> {
            let aux = ConfigureWindowAux::new()
                .x(placement.x)
                .y(placement.y)
                .border_width(placement.border_width)
                .stack_mode(StackMode::from(placement.stacking));

            self.conn.configure_window(window, &aux)?;
            self.conn.map_window(window)?;
            self.conn
                .set_input_focus(InputFocus::PARENT, window, x11rb::CURRENT_TIME)?;
            self.conn.flush()?;

            debug!(
                "Placed window {:#x} at ({}, {}) and focused it",
                window, placement.x, placement.y
            );
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_target_wins() {
        assert_eq!(resolve_target(Some(":2"), Some(":1")), ":2");
    }

    #[test]
    fn environment_target_used_when_no_explicit_one() {
        assert_eq!(resolve_target(None, Some(":1")), ":1");
        assert_eq!(resolve_target(Some(""), Some("host:3.0")), "host:3.0");
    }

    #[test]
    fn falls_back_to_default_display() {
        assert_eq!(resolve_target(None, None), DEFAULT_DISPLAY);
        assert_eq!(resolve_target(Some(""), Some("")), ":0");
    }

    #[test]
    fn connection_loss_is_reported_as_closed() {
        let error = DisplayError::from(ConnectionError::UnknownError);
        assert!(matches!(error, DisplayError::ConnectionClosed(_)));
    }

    #[test]
    fn geometry_failure_names_the_window() {
        let error = DisplayError::GeometryQuery {
            window: 0x1a00003,
            reason: "Window".into(),
        };
        assert_eq!(
            error.to_string(),
            "cannot query geometry of window 0x1a00003: Window"
        );
    }
}
