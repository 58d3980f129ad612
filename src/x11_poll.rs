//! X11 Socket Readiness
//!
//! Waits for the X11 file descriptor to become readable using mio. The wait
//! is sliced so that an operator interrupt can end a blocking fetch within
//! one slice, while an idle server still leaves us parked indefinitely.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

use tracing::warn;

use crate::wm::Interrupt;
use crate::wm::display::DisplayError;

const X11_TOKEN: mio::Token = mio::Token(0);

/// Upper bound on a single wait before the interrupt flag is rechecked
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Readiness watcher for the display connection's socket
pub struct FdReadiness {
    poll: mio::Poll,
    events: mio::Events,
    interrupt: Interrupt,
}

impl FdReadiness {
    /// Register `fd` for read readiness
    pub fn new(fd: RawFd, interrupt: Interrupt) -> io::Result<Self> {
        let poll = mio::Poll::new()?;
        poll.registry().register(
            &mut mio::unix::SourceFd(&fd),
            X11_TOKEN,
            mio::Interest::READABLE,
        )?;

        Ok(Self {
            poll,
            events: mio::Events::with_capacity(1),
            interrupt,
        })
    }

    /// Fail with [`DisplayError::Interrupted`] once the interrupt is raised
    pub fn check_interrupt(&self) -> Result<(), DisplayError> {
        if self.interrupt.is_raised() {
            Err(DisplayError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Wait at most one slice for the socket to become readable.
    ///
    /// Returns `Ok(())` on readiness or timeout; the caller re-polls the
    /// connection either way. Returns [`DisplayError::Interrupted`] once the
    /// interrupt has been raised.
    pub fn wait(&mut self) -> Result<(), DisplayError> {
        self.check_interrupt()?;

        match self.poll.poll(&mut self.events, Some(WAIT_SLICE)) {
            Ok(()) => {}
            // A signal landing mid-poll; the flag check below decides
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => warn!("X11 socket poll failed: {:?}", e),
        }

        self.check_interrupt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn wakes_when_socket_is_readable() {
        let (watched, mut peer) = UnixStream::pair().unwrap();
        let mut readiness = FdReadiness::new(watched.as_raw_fd(), Interrupt::new()).unwrap();

        peer.write_all(b"x").unwrap();

        assert!(readiness.wait().is_ok());
        assert!(readiness.events.iter().any(|e| e.token() == X11_TOKEN));
    }

    #[test]
    fn quiet_socket_times_out_without_error() {
        let (watched, _peer) = UnixStream::pair().unwrap();
        let mut readiness = FdReadiness::new(watched.as_raw_fd(), Interrupt::new()).unwrap();

        assert!(readiness.wait().is_ok());
    }

    #[test]
    fn raised_interrupt_ends_the_wait() {
        let (watched, _peer) = UnixStream::pair().unwrap();
        let interrupt = Interrupt::new();
        let mut readiness = FdReadiness::new(watched.as_raw_fd(), interrupt.clone()).unwrap();

        interrupt.raise();

        assert!(matches!(readiness.wait(), Err(DisplayError::Interrupted)));
    }

    #[test]
    fn interrupt_is_seen_without_waiting() {
        let (watched, mut peer) = UnixStream::pair().unwrap();
        let interrupt = Interrupt::new();
        let readiness = FdReadiness::new(watched.as_raw_fd(), interrupt.clone()).unwrap();

        // data pending on the socket does not mask the interrupt
        peer.write_all(b"x").unwrap();
        assert!(readiness.check_interrupt().is_ok());

        interrupt.raise();
        assert!(matches!(
            readiness.check_interrupt(),
            Err(DisplayError::Interrupted)
        ));
    }
}
