#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

//! Buffered pixel transport and shape rasterization for small TFT displays
//! that implement the MIPI Display Command Set.
//!
//! A [`Display`] is created through the [`Builder`] from a display [model](models),
//! an [interface](interface) and a caller-provided staging buffer. It implements
//! [`PixelWindow`]: select a rectangular window, stream RGB565 pixels into it,
//! flush. Every [`PixelWindow`] gets the drawing primitives of [`RasterExt`].
//!
//! With a [`DmaInterface`](interface::DmaInterface) a full staging half is sent
//! in the background while the next one fills up.

mod fmt;

#[cfg(test)]
mod _mock;

pub mod color;
pub mod dcs;
pub mod interface;
pub mod models;
pub mod options;
pub mod raster;
pub mod staging;
pub mod window;

mod builder;
pub use builder::*;

pub use raster::{Corner, RasterExt};
pub use window::PixelWindow;

use embedded_graphics_core::pixelcolor::{IntoStorage, Rgb565};
use embedded_hal::digital::OutputPin;

use crate::{
    interface::Interface,
    models::Model,
    options::{MemoryMapping, ModelOptions, Orientation},
    staging::StagingBuffer,
};

/// Display driver.
///
/// Owns the interface, the model and the staging buffer. Pixels streamed
/// through [`PixelWindow`] are collected in the staging buffer and sent when
/// it fills up or on [`flush`](PixelWindow::flush).
pub struct Display<'buf, DI, MODEL, RST, BL>
where
    DI: Interface,
    MODEL: Model,
    RST: OutputPin,
    BL: OutputPin,
{
    di: DI,
    model: MODEL,
    rst: Option<RST>,
    backlight: Option<BL>,
    options: ModelOptions,
    staging: StagingBuffer<'buf>,
}

impl<'buf, DI, M, RST, BL> Display<'buf, DI, M, RST, BL>
where
    DI: Interface,
    M: Model,
    RST: OutputPin,
    BL: OutputPin,
{
    /// Returns the current display orientation.
    pub fn orientation(&self) -> Orientation {
        self.options.orientation
    }

    /// Sets the display orientation.
    ///
    /// Staged pixels are sent to the old window first.
    pub async fn set_orientation(&mut self, orientation: Orientation) -> Result<(), DI::Error> {
        self.flush(true).await?;
        self.options.orientation = orientation;
        self.model.update_options(&mut self.di, &self.options).await
    }

    /// Switches the backlight on or off. Does nothing without a backlight pin.
    pub fn set_backlight(&mut self, on: bool) -> Result<(), BL::Error> {
        match self.backlight.as_mut() {
            Some(pin) if on => pin.set_high(),
            Some(pin) => pin.set_low(),
            None => Ok(()),
        }
    }

    /// Sends a raw command after all staged pixels have been transferred.
    pub async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), DI::Error> {
        self.flush(true).await?;
        self.di.send_command(command, args).await
    }

    /// Sends pre-encoded big-endian RGB565 data to the given inclusive window.
    ///
    /// The corners may be given in any order.
    pub async fn show_raw_data(
        &mut self,
        sx: u16,
        sy: u16,
        ex: u16,
        ey: u16,
        pixel_data: &[u8],
    ) -> Result<(), DI::Error> {
        self.set_window(sx, sy, ex, ey).await?;
        self.stream_bytes(pixel_data).await?;
        self.flush(true).await
    }

    /// Returns `true` while a background transfer is still running.
    pub fn is_busy(&self) -> bool {
        self.di.is_busy()
    }

    /// Waits for all pixels to be sent and releases the interface, model and pins.
    pub async fn release(mut self) -> Result<(DI, M, Option<RST>, Option<BL>), DI::Error> {
        self.flush(true).await?;
        Ok((self.di, self.model, self.rst, self.backlight))
    }

    /// Returns a mutable reference to the underlying display interface.
    ///
    /// # Safety
    ///
    /// Commands sent this way bypass the staging buffer. Changing the address
    /// mode or the pixel format leaves the driver out of sync with the display.
    pub unsafe fn raw_interface_mut(&mut self) -> &mut DI {
        &mut self.di
    }

    /// Translates a window in screen coordinates to controller RAM addresses.
    fn map_window(&self, sx: u16, sy: u16, ex: u16, ey: u16) -> (u16, u16, u16, u16) {
        let mut offset = self.options.display_offset;
        let mapping = MemoryMapping::from(self.options.orientation);
        if mapping.reverse_columns {
            offset.0 = M::FRAMEBUFFER_SIZE
                .0
                .saturating_sub(self.options.display_size.0.saturating_add(offset.0));
        }
        if mapping.reverse_rows {
            offset.1 = M::FRAMEBUFFER_SIZE
                .1
                .saturating_sub(self.options.display_size.1.saturating_add(offset.1));
        }
        if mapping.swap_rows_and_columns {
            offset = (offset.1, offset.0);
        }
        (
            sx.saturating_add(offset.0),
            sy.saturating_add(offset.1),
            ex.saturating_add(offset.0),
            ey.saturating_add(offset.1),
        )
    }
}

impl<DI, M, RST, BL> PixelWindow for Display<'_, DI, M, RST, BL>
where
    DI: Interface,
    M: Model,
    RST: OutputPin,
    BL: OutputPin,
{
    type Error = DI::Error;

    fn size(&self) -> (u16, u16) {
        self.options.oriented_size()
    }

    async fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Self::Error> {
        self.flush(true).await?;
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        let (sx, sy, ex, ey) = self.map_window(x0, y0, x1, y1);
        trace!("window ({}, {})..=({}, {})", sx, sy, ex, ey);
        M::update_address_window(&mut self.di, sx, sy, ex, ey).await?;
        M::write_memory_start(&mut self.di).await
    }

    async fn stream_pixel(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        if self.staging.remaining() < 2 {
            self.flush(false).await?;
        }
        let staged = self.staging.push_word(color.into_storage());
        debug_assert!(staged, "staging half holds at least one pixel");
        Ok(())
    }

    async fn stream_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut rest = bytes;
        while !rest.is_empty() {
            let taken = self.staging.push_bytes(rest);
            rest = &rest[taken..];
            if !rest.is_empty() {
                self.flush(false).await?;
            }
        }
        Ok(())
    }

    async fn write_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Self::Error> {
        let (width, height) = self.size();
        if x >= width || y >= height {
            return Ok(());
        }
        self.set_window(x, y, x, y).await?;
        self.di.write_word(color.into_storage()).await
    }

    async fn flush(&mut self, wait: bool) -> Result<(), Self::Error> {
        if self.staging.is_empty() {
            return if wait { self.di.wait_idle().await } else { Ok(()) };
        }
        // SAFETY: the filled half is only written again after a later submit
        // or wait has seen this transfer complete, and the interface waits for
        // it when dropped
        let result = unsafe { self.di.submit(self.staging.filled(), wait) }.await;
        self.staging.rotate();
        result
    }

    fn reset_staging(&mut self) {
        self.staging.reset();
    }
}

#[cfg(test)]
mod tests {
    use core::pin::pin;

    use embassy_futures::block_on;
    use embedded_graphics_core::{geometry::Point, pixelcolor::RgbColor};

    use super::*;
    use crate::{
        _mock::{poll_once, MockBus, MockDelay, MockPin, MockSpi, PinKind},
        interface::{DmaChannel, DmaInterface, LinkId, SpiInterface},
        models::{ST7735S, ST7789},
        options::Rotation,
    };

    type SpiDisplay<'a, M> = Display<'a, SpiInterface<MockSpi, MockPin, MockPin>, M, NoPin, MockPin>;

    fn display<'a, M: Model>(bus: &MockBus, model: M, buffer: &'a mut [u8]) -> SpiDisplay<'a, M> {
        let di = SpiInterface::new(bus.spi(), bus.pin(PinKind::Dc), bus.pin(PinKind::Cs));
        let display = block_on(
            Builder::new(model, di, buffer)
                .backlight_pin(bus.pin(PinKind::Bl))
                .init(&mut MockDelay),
        )
        .unwrap();
        bus.clear();
        display
    }

    #[test]
    fn filled_rect_lands_in_controller_ram() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 64];
        let mut display = display(&bus, ST7789, &mut buffer);

        block_on(display.fill_rect(Point::new(10, 10), Point::new(12, 12), Rgb565::RED)).unwrap();

        let panel = bus.panel();
        assert_eq!(panel.pixel_writes, 9);
        for x in 10..=12 {
            for y in 10..=12 {
                assert_eq!(panel.color_at(x, y), Some(0xF800));
            }
        }
        assert_eq!(panel.unframed, 0);
        assert!(bus.chip_select_balanced());
    }

    #[test]
    fn offsets_follow_the_orientation() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let di = SpiInterface::new(bus.spi(), bus.pin(PinKind::Dc), bus.pin(PinKind::Cs));
        let mut display = block_on(
            Builder::new(ST7735S, di, &mut buffer)
                .display_size(128, 160)
                .display_offset(2, 1)
                .orientation(Orientation::new().rotate(Rotation::Deg90))
                .init(&mut MockDelay),
        )
        .unwrap();
        assert_eq!(display.size(), (160, 128));

        bus.clear();
        block_on(display.set_window(0, 0, 0, 0)).unwrap();

        let panel = bus.panel();
        assert_eq!(panel.last_params(0x2A), Some(&[0, 1, 0, 1][..]));
        assert_eq!(panel.last_params(0x2B), Some(&[0, 2, 0, 2][..]));
        assert_eq!(panel.command_codes().last(), Some(&0x2C));
    }

    #[test]
    fn small_staging_buffer_flushes_in_order() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 8];
        let mut display = display(&bus, ST7789, &mut buffer);

        let colors = [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE, Rgb565::YELLOW];
        block_on(async {
            display.set_window(0, 0, 4, 0).await?;
            for color in colors {
                display.stream_pixel(color).await?;
            }
            display.flush(true).await
        })
        .unwrap();

        let panel = bus.panel();
        for (x, color) in colors.iter().enumerate() {
            assert_eq!(panel.color_at(x as u16, 0), Some(color.into_storage()));
        }
        assert!(bus.chip_select_balanced());
    }

    #[test]
    fn reset_discards_staged_pixels() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let mut display = display(&bus, ST7789, &mut buffer);

        block_on(async {
            display.set_window(0, 0, 1, 0).await?;
            display.stream_pixel(Rgb565::RED).await?;
            display.reset_staging();
            display.stream_pixel(Rgb565::BLUE).await?;
            display.flush(true).await
        })
        .unwrap();

        let panel = bus.panel();
        assert_eq!(panel.pixel_writes, 1);
        assert_eq!(panel.color_at(0, 0), Some(0x001F));
    }

    #[test]
    fn commands_wait_for_staged_pixels() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let mut display = display(&bus, ST7789, &mut buffer);

        block_on(async {
            display.set_window(3, 3, 3, 3).await?;
            display.stream_pixel(Rgb565::GREEN).await?;
            display.send_command(0x13, &[]).await
        })
        .unwrap();

        let panel = bus.panel();
        assert_eq!(panel.color_at(3, 3), Some(0x07E0));
        assert_eq!(panel.command_codes(), [0x2A, 0x2B, 0x2C, 0x13]);
    }

    #[test]
    fn single_pixels_bypass_the_staging_buffer() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let mut display = display(&bus, ST7789, &mut buffer);

        block_on(display.write_pixel(5, 6, Rgb565::RED)).unwrap();
        assert_eq!(bus.panel().color_at(5, 6), Some(0xF800));

        bus.clear();
        block_on(display.write_pixel(240, 0, Rgb565::RED)).unwrap();
        assert!(bus.events().is_empty());
    }

    #[test]
    fn raw_data_fills_a_window() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 8];
        let mut display = display(&bus, ST7789, &mut buffer);

        let data = [0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F, 0xFF, 0xFF];
        block_on(display.show_raw_data(0, 0, 1, 1, &data)).unwrap();

        let panel = bus.panel();
        assert_eq!(panel.color_at(0, 0), Some(0xF800));
        assert_eq!(panel.color_at(1, 0), Some(0x07E0));
        assert_eq!(panel.color_at(0, 1), Some(0x001F));
        assert_eq!(panel.color_at(1, 1), Some(0xFFFF));
    }

    #[test]
    fn swapped_corners_select_the_same_window() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let mut display = display(&bus, ST7789, &mut buffer);

        block_on(display.set_window(5, 6, 1, 2)).unwrap();
        let panel = bus.panel();
        assert_eq!(panel.last_params(0x2A), Some(&[0, 1, 0, 5][..]));
        assert_eq!(panel.last_params(0x2B), Some(&[0, 2, 0, 6][..]));

        bus.clear();
        let data = [0xF8, 0x00, 0x00, 0x1F];
        block_on(display.show_raw_data(9, 4, 8, 4, &data)).unwrap();
        let panel = bus.panel();
        assert_eq!(panel.last_params(0x2A), Some(&[0, 8, 0, 9][..]));
        assert_eq!(panel.color_at(8, 4), Some(0xF800));
        assert_eq!(panel.color_at(9, 4), Some(0x001F));
    }

    #[test]
    fn orientation_rewrites_address_mode() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let mut display = display(&bus, ST7789, &mut buffer);

        block_on(display.set_orientation(Orientation::new().rotate(Rotation::Deg90))).unwrap();

        assert_eq!(bus.panel().last_params(0x36), Some(&[0xA0][..]));
        assert_eq!(display.size(), (320, 240));
        assert_eq!(display.orientation().rotation, Rotation::Deg90);
    }

    #[test]
    fn backlight_follows_requests() {
        let bus = MockBus::new();
        let mut buffer = [0u8; 32];
        let mut display = display(&bus, ST7789, &mut buffer);

        display.set_backlight(false).unwrap();
        assert_eq!(bus.pin_level(PinKind::Bl), Some(false));
        display.set_backlight(true).unwrap();
        assert_eq!(bus.pin_level(PinKind::Bl), Some(true));

        let (_, _, rst, backlight) = block_on(display.release()).unwrap();
        assert!(rst.is_none());
        assert!(backlight.is_some());
    }

    #[test]
    fn staged_half_is_not_reused_while_in_flight() {
        static CHANNEL: DmaChannel<MockPin> = DmaChannel::new();

        let bus = MockBus::new();
        let mut buffer = [0u8; 8];
        let di = DmaInterface::new(
            bus.dma_spi(LinkId(3)),
            bus.pin(PinKind::Dc),
            bus.pin(PinKind::Cs),
            &CHANNEL,
        );
        let mut display = block_on(Builder::new(ST7789, di, &mut buffer).init(&mut MockDelay)).unwrap();

        let colors = [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE, Rgb565::CYAN];
        block_on(display.set_window(0, 0, 4, 0)).unwrap();
        for &color in &colors[..4] {
            block_on(display.stream_pixel(color)).unwrap();
        }

        // first half is on the wire, second half is full
        assert!(display.is_busy());
        assert_eq!(bus.dma_starts(), 1);

        {
            let mut fifth = pin!(display.stream_pixel(colors[4]));
            assert!(poll_once(fifth.as_mut()).is_pending());
            assert_eq!(bus.dma_starts(), 1);

            CHANNEL.signal().complete();
            assert!(poll_once(fifth.as_mut()).is_ready());
            assert_eq!(bus.dma_starts(), 2);
        }

        {
            let mut last = pin!(display.flush(true));
            assert!(poll_once(last.as_mut()).is_pending());
            CHANNEL.signal().complete();
            assert!(poll_once(last.as_mut()).is_pending());
            CHANNEL.signal().complete();
            assert!(matches!(poll_once(last.as_mut()), core::task::Poll::Ready(Ok(()))));
        }

        let panel = bus.panel();
        for (x, color) in colors.iter().enumerate() {
            assert_eq!(panel.color_at(x as u16, 0), Some(color.into_storage()));
        }
        assert!(bus.chip_select_balanced());
        assert!(!display.is_busy());
    }
}
