//! RGB565 helpers.

use embedded_graphics_core::pixelcolor::Rgb565;

/// Converts an 8-bit-per-channel colour by dropping the low bits of each channel.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

/// Builds a colour from its 16-bit wire value.
pub const fn from_raw(value: u16) -> Rgb565 {
    Rgb565::new((value >> 11) as u8, ((value >> 5) & 0x3F) as u8, (value & 0x1F) as u8)
}

pub const WHITE: Rgb565 = from_raw(0xFFFF);
pub const BLACK: Rgb565 = from_raw(0x0000);
pub const RED: Rgb565 = from_raw(0xF800);
pub const GREEN: Rgb565 = from_raw(0x07E0);
pub const BLUE: Rgb565 = from_raw(0x001F);
pub const YELLOW: Rgb565 = from_raw(0xFFE0);
pub const MAGENTA: Rgb565 = from_raw(0xF81F);
pub const CYAN: Rgb565 = from_raw(0x07FF);
pub const BROWN: Rgb565 = from_raw(0xBC40);
/// Brownish red.
pub const BRRED: Rgb565 = from_raw(0xFC07);
pub const GRAY: Rgb565 = from_raw(0x8430);
