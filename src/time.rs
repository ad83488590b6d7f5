//! Time abstraction traits for platform-agnostic timing.
//!
//! The engine never reads a clock on its own; every entry point takes an
//! instant produced by a [`TimeSource`]. [`Millis`] is a ready-made instant
//! for the common case of a free-running 32-bit millisecond counter.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;
}

/// Trait abstraction for instant types.
///
/// `duration_since` must be wrap-safe: for a counter that overflows, the
/// elapsed time is computed by modular subtraction, never by comparing the
/// raw counter values.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Adds duration to instant, returns None on overflow.
    fn checked_add(self, duration: Self::Duration) -> Option<Self>;
}

/// Millisecond duration paired with [`Millis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MillisDuration(pub u32);

impl TimeDuration for MillisDuration {
    const ZERO: Self = MillisDuration(0);

    fn as_millis(&self) -> u64 {
        u64::from(self.0)
    }

    fn from_millis(millis: u64) -> Self {
        MillisDuration(u32::try_from(millis).unwrap_or(u32::MAX))
    }
}

/// A reading of a free-running 32-bit millisecond counter.
///
/// The counter wraps after roughly 49.7 days. Elapsed time is computed with
/// wrapping subtraction, so intervals shorter than a full wrap are measured
/// correctly across the overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Millis(pub u32);

impl TimeInstant for Millis {
    type Duration = MillisDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        MillisDuration(self.0.wrapping_sub(earlier.0))
    }

    fn checked_add(self, duration: Self::Duration) -> Option<Self> {
        Some(Millis(self.0.wrapping_add(duration.0)))
    }
}

/// Returns true once at least `duration` has passed between `start` and `now`.
#[inline]
pub fn has_elapsed<I: TimeInstant>(start: I, now: I, duration: I::Duration) -> bool {
    now.duration_since(start).as_millis() >= duration.as_millis()
}
