//! Fixed pool of reusable animation channels.
//!
//! Provides [`ChannelPool`], a set of `C` independently timed interpolation
//! slots. A slot is acquired, armed with a start instant, a duration and two
//! colors, advanced once per tick, and released when its owner is done with
//! it. Completion is latched: each channel reports reaching the end of its
//! duration exactly once until it is restarted.

use crate::color::Rgbw;
use crate::time::{TimeDuration, TimeInstant};

/// Index of a channel within a [`ChannelPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub usize);

impl From<usize> for ChannelId {
    fn from(id: usize) -> Self {
        ChannelId(id)
    }
}

impl From<ChannelId> for usize {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

/// What an armed channel is animating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelKind {
    /// Paces the whole sequence; its colors are unused.
    Driver,

    /// Fades the pixels of one step.
    StepFade { step: usize },
}

/// Errors reported by pool operations. The operation itself is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// The id does not name a channel of this pool.
    InvalidChannel { id: ChannelId, capacity: usize },

    /// The channel is free (or was never armed, for operations that need timing).
    NotInUse(ChannelId),
}

impl core::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChannelError::InvalidChannel { id, capacity } => {
                write!(
                    f,
                    "channel {} is outside the pool capacity of {}",
                    id.0, capacity
                )
            }
            ChannelError::NotInUse(id) => {
                write!(f, "channel {} is not in use", id.0)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChannelError {}

/// One armed interpolation.
#[derive(Clone, Copy)]
pub struct AnimationChannel<I: TimeInstant> {
    kind: ChannelKind,
    start: I,
    duration: I::Duration,
    from: Rgbw,
    to: Rgbw,
    elapsed_ms: u64,
    completed: bool,
    event_pending: bool,
}

impl<I: TimeInstant> AnimationChannel<I> {
    fn new(kind: ChannelKind, start: I, duration: I::Duration, from: Rgbw, to: Rgbw) -> Self {
        Self {
            kind,
            start,
            duration,
            from,
            to,
            elapsed_ms: 0,
            completed: false,
            event_pending: false,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn start(&self) -> I {
        self.start
    }

    pub fn duration(&self) -> I::Duration {
        self.duration
    }

    /// Instant at which the channel reaches full progress.
    pub fn deadline(&self) -> Option<I> {
        self.start.checked_add(self.duration)
    }

    /// Returns true once the latest `advance` reached the end of the duration.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Interpolated color at the latest `advance`.
    pub fn color(&self) -> Rgbw {
        self.from
            .lerp(self.to, self.elapsed_ms, self.duration.as_millis())
    }

    fn advance(&mut self, now: I) {
        let total = self.duration.as_millis();
        self.elapsed_ms = now.duration_since(self.start).as_millis().min(total);

        if self.elapsed_ms >= total && !self.completed {
            self.completed = true;
            self.event_pending = true;
        }
    }

    fn rearm(&mut self, at: I) {
        self.start = at;
        self.elapsed_ms = 0;
        self.completed = false;
        self.event_pending = false;
    }
}

#[derive(Clone, Copy)]
enum Slot<I: TimeInstant> {
    Free,
    Reserved,
    Armed(AnimationChannel<I>),
}

impl<I: TimeInstant> Slot<I> {
    fn is_free(&self) -> bool {
        matches!(self, Slot::Free)
    }
}

/// A fixed set of `C` animation channels.
///
/// # Type Parameters
/// * `I` - Time instant type
/// * `C` - Number of channels
pub struct ChannelPool<I: TimeInstant, const C: usize> {
    slots: [Slot<I>; C],
}

impl<I: TimeInstant, const C: usize> Default for ChannelPool<I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: TimeInstant, const C: usize> ChannelPool<I, C> {
    /// Creates a pool with every channel free.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Slot::Free),
        }
    }

    /// Number of channels in the pool.
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Reserves the lowest-index free channel.
    ///
    /// Returns `None` when every channel is in use; the caller should drop or
    /// defer its request.
    pub fn acquire(&mut self) -> Option<ChannelId> {
        let idx = self.slots.iter().position(Slot::is_free)?;
        self.slots[idx] = Slot::Reserved;
        trace!("channel {} acquired", idx);
        Some(ChannelId(idx))
    }

    /// Arms an acquired channel, starting its timing at `now`.
    ///
    /// Arming an already armed channel replaces its animation.
    pub fn start(
        &mut self,
        id: ChannelId,
        kind: ChannelKind,
        duration: I::Duration,
        from: Rgbw,
        to: Rgbw,
        now: I,
    ) -> Result<(), ChannelError> {
        let slot = self.slot_mut(id)?;
        if slot.is_free() {
            return Err(Self::not_in_use(id));
        }

        *slot = Slot::Armed(AnimationChannel::new(kind, now, duration, from, to));
        Ok(())
    }

    /// Resets an armed channel's start instant to `at`, keeping its kind,
    /// colors and duration. Clears the completion latch.
    pub fn restart(&mut self, id: ChannelId, at: I) -> Result<(), ChannelError> {
        match self.slot_mut(id)? {
            Slot::Armed(channel) => {
                channel.rearm(at);
                Ok(())
            }
            _ => Err(Self::not_in_use(id)),
        }
    }

    /// Replaces the duration of an armed channel and restarts it at `at`.
    pub fn rearm(&mut self, id: ChannelId, duration: I::Duration, at: I) -> Result<(), ChannelError> {
        match self.slot_mut(id)? {
            Slot::Armed(channel) => {
                channel.duration = duration;
                channel.rearm(at);
                Ok(())
            }
            _ => Err(Self::not_in_use(id)),
        }
    }

    /// Marks a channel free.
    pub fn release(&mut self, id: ChannelId) -> Result<(), ChannelError> {
        let slot = self.slot_mut(id)?;
        if slot.is_free() {
            return Err(Self::not_in_use(id));
        }

        *slot = Slot::Free;
        trace!("channel {} released", id.0);
        Ok(())
    }

    /// Frees every channel.
    pub fn reset(&mut self) {
        self.slots = core::array::from_fn(|_| Slot::Free);
    }

    /// Updates the progress of every armed channel and latches completions.
    ///
    /// Returns the number of channels that completed on this call.
    pub fn advance(&mut self, now: I) -> usize {
        let mut completed = 0;

        for slot in &mut self.slots {
            if let Slot::Armed(channel) = slot {
                let was_complete = channel.completed;
                channel.advance(now);
                if channel.completed && !was_complete {
                    completed += 1;
                }
            }
        }

        completed
    }

    /// Consumes the one-shot completion event of a channel.
    ///
    /// Returns true at most once per completion; the channel stays armed
    /// until it is released or restarted.
    pub fn take_completion(&mut self, id: ChannelId) -> bool {
        match self.slots.get_mut(id.0) {
            Some(Slot::Armed(channel)) if channel.event_pending => {
                channel.event_pending = false;
                true
            }
            _ => false,
        }
    }

    /// Interpolated color of an armed channel at the latest `advance`.
    pub fn color_at(&self, id: ChannelId) -> Option<Rgbw> {
        self.channel(id).map(AnimationChannel::color)
    }

    /// The armed channel with this id.
    pub fn channel(&self, id: ChannelId) -> Option<&AnimationChannel<I>> {
        match self.slots.get(id.0) {
            Some(Slot::Armed(channel)) => Some(channel),
            _ => None,
        }
    }

    /// Kind of an armed channel.
    pub fn kind(&self, id: ChannelId) -> Option<ChannelKind> {
        self.channel(id).map(AnimationChannel::kind)
    }

    /// Time left until an armed channel completes, measured from `now`.
    pub fn remaining(&self, id: ChannelId, now: I) -> Option<I::Duration> {
        let channel = self.channel(id)?;
        let total = channel.duration.as_millis();
        let elapsed = now.duration_since(channel.start).as_millis().min(total);
        Some(I::Duration::from_millis(total - elapsed))
    }

    /// Returns true if the channel is reserved or armed.
    pub fn is_in_use(&self, id: ChannelId) -> bool {
        self.slots.get(id.0).is_some_and(|slot| !slot.is_free())
    }

    /// Number of reserved or armed channels.
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_free()).count()
    }

    /// Number of free channels.
    pub fn free(&self) -> usize {
        C - self.in_use()
    }

    /// Ids of armed channels animating a step, with the step index.
    pub fn step_fades(&self) -> impl Iterator<Item = (ChannelId, usize)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                Slot::Armed(channel) => match channel.kind {
                    ChannelKind::StepFade { step } => Some((ChannelId(idx), step)),
                    ChannelKind::Driver => None,
                },
                _ => None,
            })
    }

    /// Returns true if any step fade is armed.
    pub fn has_step_fades(&self) -> bool {
        self.step_fades().next().is_some()
    }

    fn not_in_use(id: ChannelId) -> ChannelError {
        warn!("channel {} is not in use", id.0);
        ChannelError::NotInUse(id)
    }

    fn slot_mut(&mut self, id: ChannelId) -> Result<&mut Slot<I>, ChannelError> {
        match self.slots.get_mut(id.0) {
            Some(slot) => Ok(slot),
            None => {
                warn!("channel {} outside pool of {}", id.0, C);
                Err(ChannelError::InvalidChannel { id, capacity: C })
            }
        }
    }
}
