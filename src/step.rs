//! A single physical step and its slice of the strip.

/// A contiguous run of pixels on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelRange {
    pub offset: usize,
    pub length: usize,
}

impl PixelRange {
    /// One past the last pixel of the range.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Returns true if the two ranges share at least one pixel.
    #[inline]
    pub fn overlaps(&self, other: &PixelRange) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Fade state of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepState {
    #[default]
    Off,
    FadingIn,
    On,
    FadingOut,
}

/// One stair: its position in the walk, its pixels, and its current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepUnit {
    index: usize,
    range: PixelRange,
    level: u8,
    state: StepState,
}

impl StepUnit {
    /// Creates step `index` covering `leds_per_step` pixels right after the
    /// previous step, so consecutive steps tile the strip without overlap.
    pub fn new(index: usize, leds_per_step: usize) -> Self {
        Self {
            index,
            range: PixelRange {
                offset: index * leds_per_step,
                length: leds_per_step,
            },
            level: 0,
            state: StepState::Off,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn range(&self) -> PixelRange {
        self.range
    }

    /// Current brightness, 0 when off.
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    /// Returns true while a fade is in flight.
    pub fn is_fading(&self) -> bool {
        matches!(self.state, StepState::FadingIn | StepState::FadingOut)
    }

    pub(crate) fn begin_fade_in(&mut self) {
        self.state = StepState::FadingIn;
    }

    pub(crate) fn begin_fade_out(&mut self) {
        self.state = StepState::FadingOut;
    }

    /// Records an intermediate level, clamped to `max`.
    pub(crate) fn set_level(&mut self, level: u8, max: u8) {
        self.level = level.min(max);
    }

    /// Settles the step at the end of its fade.
    pub(crate) fn finish_fade(&mut self, level: u8, max: u8) {
        self.set_level(level, max);
        self.state = match self.state {
            StepState::FadingIn | StepState::On => StepState::On,
            StepState::FadingOut | StepState::Off => StepState::Off,
        };
    }

    pub(crate) fn reset(&mut self) {
        self.level = 0;
        self.state = StepState::Off;
    }
}
