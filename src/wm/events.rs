//! Events Module
//!
//! The X11 manager's dispatch loop. Events are fetched one at a time in
//! arrival order and classified: key presses are only logged, map requests
//! are centered, raised, mapped and focused, anything else is logged raw.
//!
//! Failures are decided here and never propagate out of `run`: a window
//! whose geometry cannot be read is dropped, transport loss ends the loop,
//! and an operator interrupt ends it cleanly.

use tracing::{debug, error, info, warn};

use crate::shared::WindowRef;
use crate::wm::display::{DisplayConnection, DisplayError, WindowEvent};
use crate::wm::placement::{Placement, center_on};
use crate::wm::screen::Margins;
use crate::wm::{LoopExit, Manager, ManagerState};

/// What dispatching a single event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    KeyLogged,
    Placed(WindowRef),
    /// Geometry could not be read; the map request was discarded
    Dropped(WindowRef),
    Unknown,
    /// The manager was not running, nothing was sent
    Ignored,
}

/// Running tally of dispatch outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub key_presses: u64,
    pub placed: u64,
    pub dropped: u64,
    pub unknown: u64,
}

impl DispatchStats {
    fn record(&mut self, outcome: Dispatch) {
        match outcome {
            Dispatch::KeyLogged => self.key_presses += 1,
            Dispatch::Placed(_) => self.placed += 1,
            Dispatch::Dropped(_) => self.dropped += 1,
            Dispatch::Unknown => self.unknown += 1,
            Dispatch::Ignored => {}
        }
    }
}

/// X11 window manager: owns its display connection for its whole lifetime
pub struct XDisplayManager<C: DisplayConnection> {
    state: ManagerState,
    conn: C,
    margins: Margins,
    stats: DispatchStats,
}

#[cfg(unix)]
impl XDisplayManager<crate::wm::display::X11Display> {
    /// Connect to the X server named by the config (or `$DISPLAY`) and try
    /// to become its window manager.
    pub fn connect(
        config: &crate::config::Config,
        interrupt: crate::wm::Interrupt,
    ) -> Result<Self, DisplayError> {
        let x11 = crate::wm::display::X11Display::open(
            config.display.target.as_deref(),
            interrupt,
        )?;
        Self::manage(x11, config.placement.margins)
    }
}

impl<C: DisplayConnection> XDisplayManager<C> {
    pub fn new(conn: C, margins: Margins) -> Self {
        Self {
            state: ManagerState::default(),
            conn,
            margins,
            stats: DispatchStats::default(),
        }
    }

    /// Claim management rights on `conn` and build a manager around it.
    ///
    /// Losing the race for the rights is not fatal: the manager is still
    /// built, it just receives no map requests. Any other failure is.
    pub fn manage(mut conn: C, margins: Margins) -> Result<Self, DisplayError> {
        match conn.claim_management_rights() {
            Ok(()) => info!("Registered as window manager"),
            Err(DisplayError::PermissionDenied(reason)) => {
                warn!("Continuing without window management rights: {}", reason)
            }
            Err(e) => return Err(e),
        }
        let held = conn.has_management_rights();
        debug!("Management rights held: {}", held);

        Ok(Self::new(conn, margins))
    }

    /// Handle one event.
    ///
    /// Only fatal conditions come back as `Err`; a dropped map request is a
    /// successful [`Dispatch::Dropped`].
    pub fn dispatch(&mut self, event: WindowEvent) -> Result<Dispatch, DisplayError> {
        if !self.is_running() {
            return Ok(Dispatch::Ignored);
        }

        let outcome = match event {
            WindowEvent::KeyPress { keycode, state } => {
                debug!("KeyPress: keycode={}, state={:x}", keycode, state);
                Dispatch::KeyLogged
            }
            WindowEvent::MapRequest(window) => {
                debug!("MapRequest for window {:#x}", window);
                match self.placement_for(window) {
                    Ok(placement) => {
                        self.conn.place_and_show(window, &placement)?;
                        Dispatch::Placed(window)
                    }
                    Err(e @ DisplayError::GeometryQuery { .. }) => {
                        warn!("Dropping map request for window {:#x}: {}", window, e);
                        Dispatch::Dropped(window)
                    }
                    Err(e) => return Err(e),
                }
            }
            WindowEvent::Unknown(raw) => {
                info!("Unhandled event: {}", raw);
                Dispatch::Unknown
            }
        };

        self.stats.record(outcome);
        Ok(outcome)
    }

    fn placement_for(&mut self, window: WindowRef) -> Result<Placement, DisplayError> {
        let size = self.conn.window_size(window)?;
        let screen = self.conn.screen_geometry()?;
        Ok(center_on(&self.margins.work_area(screen), size))
    }

    /// Stop after a failure and report why
    fn halt(&mut self, error: DisplayError) -> LoopExit {
        self.stop();
        let exit = match error {
            DisplayError::Interrupted => {
                info!("Closing due to interrupt");
                LoopExit::Interrupted
            }
            other => {
                error!("Connection closed: {}", other);
                LoopExit::ConnectionClosed
            }
        };
        debug!("Dispatch totals: {:?}", self.stats);
        exit
    }
}

impl<C: DisplayConnection> Manager for XDisplayManager<C> {
    fn state(&self) -> &ManagerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ManagerState {
        &mut self.state
    }

    fn run(&mut self) -> LoopExit {
        info!("Entering event loop");

        while self.is_running() {
            let event = match self.conn.pending_count() {
                Ok(0) => match self.conn.idle() {
                    Ok(()) => continue,
                    Err(e) => return self.halt(e),
                },
                Ok(_) => match self.conn.next_event() {
                    Ok(event) => event,
                    Err(e) => return self.halt(e),
                },
                Err(e) => return self.halt(e),
            };

            if let Err(e) = self.dispatch(event) {
                return self.halt(e);
            }
        }

        info!("Event loop stopped");
        debug!("Dispatch totals: {:?}", self.stats);
        LoopExit::Stopped
    }
}
