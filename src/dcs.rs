//! MIPI DCS commands.

use crate::{
    interface::Interface,
    options::{
        ColorInversion, ColorOrder, HorizontalRefreshOrder, MemoryMapping, ModelOptions,
        VerticalRefreshOrder,
    },
};

/// Common trait for DCS commands.
///
/// The methods in this traits are used to convert a DCS command into bytes.
pub trait DcsCommand {
    /// Returns the instruction code.
    fn instruction(&self) -> u8;

    /// Fills the given buffer with the command parameters.
    fn fill_params_buf(&self, buffer: &mut [u8]) -> usize;
}

/// An extension trait for [Interface] with support for writing DCS commands.
///
/// Commands which are part of the manufacturer independent user command set
/// can be sent to the display by using the [`write_command`](Self::write_command)
/// method with one of the command types in this module.
///
/// All other commands, which aren't included in this module, can be sent using
/// the [`write_raw`](Self::write_raw) method.
pub trait InterfaceExt: Interface {
    /// Sends a DCS command to the display interface.
    async fn write_command(&mut self, command: impl DcsCommand) -> Result<(), Self::Error> {
        let mut param_bytes: [u8; 16] = [0; 16];
        let n = command.fill_params_buf(&mut param_bytes);
        self.write_raw(command.instruction(), &param_bytes[..n]).await
    }

    /// Sends a raw command with the given `instruction` to the display interface.
    ///
    /// The `param_bytes` slice can contain the instruction parameters, which
    /// are sent as data after the instruction code was sent. If no parameters
    /// are required an empty slice can be passed to this method.
    async fn write_raw(&mut self, instruction: u8, param_bytes: &[u8]) -> Result<(), Self::Error> {
        self.send_command(instruction, param_bytes).await
    }
}

impl<T: Interface> InterfaceExt for T {}

macro_rules! dcs_basic_command {
    (#[$meta:meta] $name:ident, $instr:expr) => {
        #[$meta]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl DcsCommand for $name {
            fn instruction(&self) -> u8 {
                $instr
            }

            fn fill_params_buf(&self, _buffer: &mut [u8]) -> usize {
                0
            }
        }
    };
}

dcs_basic_command!(
    /// Software Reset
    SoftReset,
    0x01
);
dcs_basic_command!(
    /// Exit Sleep Mode
    ExitSleepMode,
    0x11
);
dcs_basic_command!(
    /// Set Display into Normal mode
    EnterNormalMode,
    0x13
);
dcs_basic_command!(
    /// Turn Display On
    SetDisplayOn,
    0x29
);
dcs_basic_command!(
    /// Initiate Framebuffer Memory Write
    WriteMemoryStart,
    0x2C
);

/// Set Invert Mode (INVOFF / INVON)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetInvertMode(ColorInversion);

impl SetInvertMode {
    pub const fn new(inversion: ColorInversion) -> Self {
        Self(inversion)
    }
}

impl DcsCommand for SetInvertMode {
    fn instruction(&self) -> u8 {
        match self.0 {
            ColorInversion::Normal => 0x20,
            ColorInversion::Inverted => 0x21,
        }
    }

    fn fill_params_buf(&self, _buffer: &mut [u8]) -> usize {
        0
    }
}

/// Bits per pixel of one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BitsPerPixel {
    Twelve = 0b011,
    Sixteen = 0b101,
    Eighteen = 0b110,
}

/// Pixel format of the RGB (DPI) and MCU (DBI) interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    dpi: Option<BitsPerPixel>,
    dbi: BitsPerPixel,
}

impl PixelFormat {
    /// Same format on both interfaces.
    pub const fn with_all(bpp: BitsPerPixel) -> Self {
        Self {
            dpi: Some(bpp),
            dbi: bpp,
        }
    }

    /// Format for the MCU interface only, RGB interface bits left zero.
    pub const fn with_dbi(bpp: BitsPerPixel) -> Self {
        Self { dpi: None, dbi: bpp }
    }

    pub const fn as_u8(self) -> u8 {
        let dpi = match self.dpi {
            Some(bpp) => (bpp as u8) << 4,
            None => 0,
        };
        dpi | self.dbi as u8
    }
}

/// Set Pixel Format (COLMOD)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPixelFormat(PixelFormat);

impl SetPixelFormat {
    pub const fn new(pixel_format: PixelFormat) -> Self {
        Self(pixel_format)
    }
}

impl DcsCommand for SetPixelFormat {
    fn instruction(&self) -> u8 {
        0x3A
    }

    fn fill_params_buf(&self, buffer: &mut [u8]) -> usize {
        buffer[0] = self.0.as_u8();
        1
    }
}

/// Set Address Mode (MADCTL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetAddressMode(u8);

impl SetAddressMode {
    const ROW_ORDER: u8 = 0x80;
    const COLUMN_ORDER: u8 = 0x40;
    const ROW_COLUMN_SWAP: u8 = 0x20;
    const VERTICAL_REFRESH: u8 = 0x10;
    const BGR: u8 = 0x08;
    const HORIZONTAL_REFRESH: u8 = 0x04;

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw register value.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl From<&ModelOptions> for SetAddressMode {
    fn from(options: &ModelOptions) -> Self {
        let mapping = MemoryMapping::from(options.orientation);
        let flags = [
            (mapping.reverse_rows, Self::ROW_ORDER),
            (mapping.reverse_columns, Self::COLUMN_ORDER),
            (mapping.swap_rows_and_columns, Self::ROW_COLUMN_SWAP),
            (
                options.refresh_order.vertical == VerticalRefreshOrder::BottomToTop,
                Self::VERTICAL_REFRESH,
            ),
            (options.color_order == ColorOrder::Bgr, Self::BGR),
            (
                options.refresh_order.horizontal == HorizontalRefreshOrder::RightToLeft,
                Self::HORIZONTAL_REFRESH,
            ),
        ];

        Self(
            flags
                .iter()
                .filter(|(set, _)| *set)
                .fold(0, |acc, (_, bit)| acc | bit),
        )
    }
}

impl DcsCommand for SetAddressMode {
    fn instruction(&self) -> u8 {
        0x36
    }

    fn fill_params_buf(&self, buffer: &mut [u8]) -> usize {
        buffer[0] = self.0;
        1
    }
}

/// Set Column Address (CASET)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetColumnAddress {
    start_column: u16,
    end_column: u16,
}

impl SetColumnAddress {
    pub const fn new(start_column: u16, end_column: u16) -> Self {
        Self {
            start_column,
            end_column,
        }
    }
}

impl DcsCommand for SetColumnAddress {
    fn instruction(&self) -> u8 {
        0x2A
    }

    fn fill_params_buf(&self, buffer: &mut [u8]) -> usize {
        buffer[0..2].copy_from_slice(&self.start_column.to_be_bytes());
        buffer[2..4].copy_from_slice(&self.end_column.to_be_bytes());
        4
    }
}

/// Set Page Address (RASET)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPageAddress {
    start_row: u16,
    end_row: u16,
}

impl SetPageAddress {
    pub const fn new(start_row: u16, end_row: u16) -> Self {
        Self { start_row, end_row }
    }
}

impl DcsCommand for SetPageAddress {
    fn instruction(&self) -> u8 {
        0x2B
    }

    fn fill_params_buf(&self, buffer: &mut [u8]) -> usize {
        buffer[0..2].copy_from_slice(&self.start_row.to_be_bytes());
        buffer[2..4].copy_from_slice(&self.end_row.to_be_bytes());
        4
    }
}
