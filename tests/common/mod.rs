//! Shared test infrastructure for stair-sequencer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use stair_sequencer::{Millis, PixelSink, Rgbw, SequenceConfig, StatusReport, TimeSource};

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<Millis>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(millis: u32) -> Self {
        Self {
            current_time: core::cell::Cell::new(Millis(millis)),
        }
    }

    /// Advance time by the given number of milliseconds, wrapping like a
    /// hardware counter.
    pub fn advance(&self, millis: u32) {
        let current = self.current_time.get();
        self.current_time.set(Millis(current.0.wrapping_add(millis)));
    }

    pub fn set_time(&self, time: Millis) {
        self.current_time.set(time);
    }
}

impl TimeSource<Millis> for MockTimeSource {
    fn now(&self) -> Millis {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Strip
// ============================================================================

pub const STRIP_LEDS: usize = 64;

/// Mock strip that keeps the last written frame and counts writes
pub struct MockStrip {
    pixels: [Rgbw; STRIP_LEDS],
    range_writes: usize,
    flushes: usize,
}

impl MockStrip {
    pub fn new() -> Self {
        Self {
            pixels: [Rgbw::OFF; STRIP_LEDS],
            range_writes: 0,
            flushes: 0,
        }
    }

    pub fn pixel(&self, index: usize) -> Rgbw {
        self.pixels[index]
    }

    pub fn pixels(&self) -> &[Rgbw] {
        &self.pixels
    }

    pub fn range_writes(&self) -> usize {
        self.range_writes
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn reset_counters(&mut self) {
        self.range_writes = 0;
        self.flushes = 0;
    }
}

impl PixelSink for MockStrip {
    fn set_pixel_range(&mut self, offset: usize, length: usize, color: Rgbw) {
        self.range_writes += 1;
        let end = (offset + length).min(STRIP_LEDS);
        for pixel in &mut self.pixels[offset.min(end)..end] {
            *pixel = color;
        }
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

// ============================================================================
// Mock Status Sink
// ============================================================================

/// Records every status message
pub struct MockStatus {
    messages: heapless::Vec<heapless::String<48>, 16>,
}

impl MockStatus {
    pub fn new() -> Self {
        Self {
            messages: heapless::Vec::new(),
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(|m| m.as_str())
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(|m| m.as_str())
    }
}

impl StatusReport for MockStatus {
    fn report(&mut self, message: &str) {
        let mut line = heapless::String::new();
        let _ = line.push_str(message);
        let _ = self.messages.push(line);
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Configuration used by the full-cycle scenario
pub fn scenario_config() -> SequenceConfig {
    SequenceConfig {
        step_interval_ms: 250,
        fade_duration_ms: 1000,
        hold_duration_ms: 5000,
        max_brightness: 128,
        step_count: 10,
        leds_per_step: 3,
        on_color: Rgbw::white(255),
    }
}

/// Ticks the controller every `step_ms` until `done` returns true.
///
/// Returns false if `limit_ms` passed first.
pub fn tick_until<P, R, const S: usize, const C: usize>(
    stairs: &mut stair_sequencer::SequenceController<Millis, P, R, S, C>,
    timer: &MockTimeSource,
    step_ms: u32,
    limit_ms: u32,
    mut done: impl FnMut(&stair_sequencer::SequenceController<Millis, P, R, S, C>) -> bool,
) -> bool
where
    P: PixelSink,
    R: StatusReport,
{
    let mut waited = 0;
    while !done(stairs) {
        if waited >= limit_ms {
            return false;
        }
        timer.advance(step_ms);
        waited += step_ms;
        stairs.service(timer);
    }
    true
}
