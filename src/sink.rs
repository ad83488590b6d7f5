//! Output collaborators: pixel output and status reporting.
//!
//! The engine only ever talks to a [`PixelSink`]. [`PixelBuffer`] is a
//! ready-made sink that keeps a frame in memory and hands it to a
//! [`StripWriter`] on flush, for drivers that take a whole frame at once.

use crate::color::Rgbw;

/// Trait for abstracting the LED strip.
///
/// Implement this for your strip driver (WS2812/SK6812 over PIO, SPI, RMT,
/// etc.). Writes are buffered by the implementation until `flush`.
pub trait PixelSink {
    /// Sets `length` pixels starting at `offset` to `color`.
    ///
    /// Ranges that reach past the end of the strip are truncated by the
    /// implementation. This method cannot fail.
    fn set_pixel_range(&mut self, offset: usize, length: usize, color: Rgbw);

    /// Pushes buffered pixels to the hardware.
    fn flush(&mut self);
}

/// Receives human-readable sequence transition messages.
///
/// Purely observational; the engine never depends on the result.
pub trait StatusReport {
    fn report(&mut self, message: &str);
}

impl StatusReport for () {
    fn report(&mut self, _message: &str) {}
}

impl<R: StatusReport + ?Sized> StatusReport for &mut R {
    fn report(&mut self, message: &str) {
        (**self).report(message);
    }
}

/// Writes a complete frame to the strip hardware.
pub trait StripWriter {
    fn write(&mut self, pixels: &[Rgbw]);
}

/// In-memory frame for `LEDS` pixels, written through to a [`StripWriter`]
/// on flush.
///
/// The frame is only handed to the writer when a pixel actually changed
/// since the previous flush.
pub struct PixelBuffer<W: StripWriter, const LEDS: usize> {
    writer: W,
    pixels: [Rgbw; LEDS],
    dirty: bool,
}

impl<W: StripWriter, const LEDS: usize> PixelBuffer<W, LEDS> {
    /// Creates a buffer with every pixel off. The first flush always writes.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pixels: [Rgbw::OFF; LEDS],
            dirty: true,
        }
    }

    /// Current frame contents.
    pub fn pixels(&self) -> &[Rgbw] {
        &self.pixels
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Returns true if the frame changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl<W: StripWriter, const LEDS: usize> PixelSink for PixelBuffer<W, LEDS> {
    fn set_pixel_range(&mut self, offset: usize, length: usize, color: Rgbw) {
        let start = offset.min(LEDS);
        let end = offset.saturating_add(length).min(LEDS);

        for pixel in &mut self.pixels[start..end] {
            if *pixel != color {
                *pixel = color;
                self.dirty = true;
            }
        }
    }

    fn flush(&mut self) {
        if self.dirty {
            self.writer.write(&self.pixels);
            self.dirty = false;
        }
    }
}
