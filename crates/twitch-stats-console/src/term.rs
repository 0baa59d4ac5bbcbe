use std::io::{self, IsTerminal};

use crossterm::terminal;
use tracing::warn;

/// Columns reserved for prompt decoration when sizing the viewport.
pub const MARGIN: usize = 5;

/// Scoped raw mode: canonical line buffering and local echo off for
/// the lifetime of the guard, original settings restored on drop.
///
/// Failure to switch modes is non-fatal: the editor still runs in
/// degraded cooked-mode form, so the error is logged once and ignored.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enable() -> Self {
        match terminal::enable_raw_mode() {
            Ok(()) => Self { active: true },
            Err(err) => {
                warn!("failed to enable raw mode, continuing cooked: {err}");
                Self { active: false }
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            terminal::disable_raw_mode().ok();
        }
    }
}

/// Current terminal width, re-queried every render cycle since the
/// terminal can be resized mid-session. `None` when stdout is not a
/// terminal (piped output): the caller treats the viewport as
/// unbounded instead of dividing by an undefined size.
pub fn viewport_width() -> Option<usize> {
    if !io::stdout().is_terminal() {
        return None;
    }
    terminal::size().ok().map(|(cols, _)| cols as usize)
}
