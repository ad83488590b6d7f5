//! Core types shared by the channel pool and the sequence controller.

use crate::color::Rgbw;

/// Which end of the staircase a walk starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// From step 0 toward the last step.
    Ascending,

    /// From the last step toward step 0.
    Descending,
}

impl Direction {
    /// First step of a walk over `count` steps.
    #[inline]
    pub fn first_step(self, count: usize) -> usize {
        match self {
            Direction::Ascending => 0,
            Direction::Descending => count.saturating_sub(1),
        }
    }

    /// Step after `cursor`, or `None` when the walk has left the staircase.
    #[inline]
    pub fn next_step(self, cursor: usize, count: usize) -> Option<usize> {
        match self {
            Direction::Ascending => cursor.checked_add(1).filter(|&next| next < count),
            Direction::Descending => cursor.checked_sub(1),
        }
    }
}

/// Polarity of a walk: lighting steps up or dimming them down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fade {
    /// Steps ramp from off to the lit color.
    In,
    /// Steps ramp from the lit color back to off.
    Out,
}

/// Runtime configuration of the installation.
///
/// Values arrive already parsed from the configuration collaborator, but are
/// not trusted: [`SequenceConfig::sanitized`] clamps them into range before
/// the engine uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceConfig {
    /// Delay between starting two consecutive step fades.
    pub step_interval_ms: u16,

    /// Duration of a single step's fade in or out.
    pub fade_duration_ms: u16,

    /// How long all steps stay lit before dimming starts.
    pub hold_duration_ms: u16,

    /// Peak brightness, 1-255.
    pub max_brightness: u8,

    /// Number of physical steps.
    pub step_count: u8,

    /// Contiguous LEDs backing each step.
    pub leds_per_step: u8,

    /// Color of a fully lit step before brightness scaling.
    pub on_color: Rgbw,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: 250,
            fade_duration_ms: 1000,
            hold_duration_ms: 4000,
            max_brightness: 255,
            step_count: 10,
            leds_per_step: 3,
            on_color: Rgbw::white(255),
        }
    }
}

impl SequenceConfig {
    /// Clamps every field into the range the engine supports for `max_steps`
    /// physical steps.
    pub fn sanitized(self, max_steps: usize) -> Self {
        let step_limit = u8::try_from(max_steps).unwrap_or(u8::MAX).max(1);

        Self {
            max_brightness: self.max_brightness.max(1),
            step_count: self.step_count.clamp(1, step_limit),
            leds_per_step: self.leds_per_step.max(1),
            ..self
        }
    }

    /// Fully lit color: `on_color` scaled to `max_brightness`.
    #[inline]
    pub fn lit_color(&self) -> Rgbw {
        self.on_color.scale(self.max_brightness)
    }

    /// Total number of LEDs covered by all steps.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        usize::from(self.step_count) * usize::from(self.leds_per_step)
    }
}

/// Result of delivering a trigger to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerOutcome {
    /// A new sequence started.
    Started,

    /// A sequence is already running; the trigger was dropped.
    Ignored,
}
