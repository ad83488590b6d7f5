//! Trigger sources that decide when a sequence starts and in which direction.
//!
//! Both sources are polled from the outer loop and return at most one
//! [`Direction`] per poll; feed it to
//! [`SequenceController::start_sequence`](crate::SequenceController::start_sequence).

use crate::time::{TimeInstant, has_elapsed};
use crate::types::Direction;

/// Rising-edge detector over the motion sensors at both ends of the stairs.
///
/// Motion at the bottom starts an ascending walk, motion at the top a
/// descending one. A sensor that stays active does not re-trigger until it
/// has gone inactive again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionTrigger {
    bottom: bool,
    top: bool,
}

impl MotionTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the current sensor levels.
    ///
    /// When both sensors rise on the same poll the bottom one wins.
    pub fn update(&mut self, bottom: bool, top: bool) -> Option<Direction> {
        let bottom_rose = bottom && !self.bottom;
        let top_rose = top && !self.top;
        self.bottom = bottom;
        self.top = top;

        if bottom_rose {
            Some(Direction::Ascending)
        } else if top_rose {
            Some(Direction::Descending)
        } else {
            None
        }
    }
}

/// Restarts the sequence on a timer once the stairs have been dark for
/// `off_interval`, for installations without sensors.
pub struct IntervalTrigger<I: TimeInstant> {
    off_interval: I::Duration,
    direction: Direction,
    idle_since: Option<I>,
}

impl<I: TimeInstant> IntervalTrigger<I> {
    pub fn new(off_interval: I::Duration, direction: Direction) -> Self {
        Self {
            off_interval,
            direction,
            idle_since: None,
        }
    }

    /// Polls the timer. `idle` is whether the controller is currently idle.
    ///
    /// The idle period is measured from the first poll that sees the
    /// controller idle.
    pub fn poll(&mut self, idle: bool, now: I) -> Option<Direction> {
        if !idle {
            self.idle_since = None;
            return None;
        }

        let since = *self.idle_since.get_or_insert(now);
        if has_elapsed(since, now, self.off_interval) {
            self.idle_since = None;
            Some(self.direction)
        } else {
            None
        }
    }
}
