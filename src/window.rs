//! Window and stream protocol between the rasterizer and a display.

use embedded_graphics_core::pixelcolor::Rgb565;

/// Addressable-window pixel sink.
///
/// A drawing operation selects an inclusive rectangle with
/// [`set_window`](Self::set_window) and then streams exactly
/// `(x1 - x0 + 1) * (y1 - y0 + 1)` pixels into it, row by row. Streaming a
/// different number of pixels desynchronizes the controller's address counter;
/// implementations don't check this.
pub trait PixelWindow {
    /// Error type
    type Error: core::fmt::Debug;

    /// Visible size in the current orientation, `(width, height)`.
    fn size(&self) -> (u16, u16);

    /// Selects the inclusive rectangle `(x0, y0)..=(x1, y1)` for the following pixels.
    ///
    /// Pixels still staged for the previous window are sent first. Each pair
    /// of coordinates may be given in either order.
    async fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Self::Error>;

    /// Appends one pixel to the current window.
    async fn stream_pixel(&mut self, color: Rgb565) -> Result<(), Self::Error>;

    /// Appends `count` pixels of the same colour.
    async fn stream_repeat(&mut self, color: Rgb565, count: u32) -> Result<(), Self::Error> {
        for _ in 0..count {
            self.stream_pixel(color).await?;
        }
        Ok(())
    }

    /// Appends pre-encoded pixel data, two bytes per pixel, most significant byte first.
    async fn stream_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Writes a single pixel without going through the staging buffer.
    async fn write_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Self::Error>;

    /// Sends staged pixels.
    ///
    /// With `wait == false` the call may return while the transfer is still
    /// running.
    async fn flush(&mut self, wait: bool) -> Result<(), Self::Error>;

    /// Discards staged pixels without sending them.
    fn reset_staging(&mut self);
}
