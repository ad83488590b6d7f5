#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`SequenceController`**: Walks the staircase, fading steps in, holding, then fading them out
//! - **`ChannelPool`**: Fixed set of reusable, independently timed animation channels
//! - **`StepUnit`**: One physical step, its pixel range and its fade state
//! - **`SequenceConfig`**: Interval, fade and hold timing plus brightness and layout
//! - **`Direction`**: Which end of the staircase a walk starts from
//! - **`PixelSink`**: Trait to implement for your LED strip driver
//! - **`TimeSource`**: Trait to implement for your timing system
//! - **`MotionTrigger`** / **`IntervalTrigger`**: Ready-made trigger sources
//! - **`StairAction`**: Commands that remote handlers can send to the controller
//!
//! Colors are `Rgbw` with one byte per channel. Fades blend with integer
//! arithmetic and always land exactly on their start and end colors.

#[macro_use]
mod fmt;

pub mod channel;
pub mod color;
pub mod command;
pub mod sequencer;
pub mod sink;
pub mod step;
pub mod time;
pub mod trigger;
pub mod types;

pub use channel::{AnimationChannel, ChannelError, ChannelId, ChannelKind, ChannelPool};
pub use color::Rgbw;
pub use command::StairAction;
pub use sequencer::{SequenceController, SequencePhase, SequencerError, ServiceTiming};
pub use sink::{PixelBuffer, PixelSink, StatusReport, StripWriter};
pub use step::{PixelRange, StepState, StepUnit};
pub use time::{Millis, MillisDuration, TimeDuration, TimeInstant, TimeSource};
pub use trigger::{IntervalTrigger, MotionTrigger};
pub use types::{Direction, Fade, SequenceConfig, TriggerOutcome};

/// Controller for a ten-step staircase: one fade channel per step plus the
/// driver.
pub type StairController<I, P, R> = SequenceController<I, P, R, 10, 11>;
