//! [super::Display] builder module

use embedded_hal::digital::{self, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::{
    dcs::InterfaceExt,
    interface::Interface,
    models::{Model, ModelInitError},
    options::{ColorInversion, ColorOrder, ModelOptions, Orientation, RefreshOrder},
    staging::StagingBuffer,
    Display,
};

/// Builder for [Display] instances.
///
/// Exposes all possible display options.
///
/// # Examples
///
/// ```ignore
/// use tftgfx::{Builder, options::{Orientation, Rotation}, models::ST7735S};
///
/// let mut buffer = [0u8; 4096];
/// let mut display = Builder::new(ST7735S, di, &mut buffer)
///     .display_size(128, 160)
///     .display_offset(2, 1)
///     .orientation(Orientation::new().rotate(Rotation::Deg270))
///     .reset_pin(rst)
///     .backlight_pin(blk)
///     .init(&mut delay)
///     .await?;
/// ```
pub struct Builder<'buf, DI, MODEL, RST, BL>
where
    DI: Interface,
    MODEL: Model,
{
    di: DI,
    model: MODEL,
    rst: Option<RST>,
    backlight: Option<BL>,
    options: ModelOptions,
    buffer: &'buf mut [u8],
}

impl<'buf, DI, MODEL> Builder<'buf, DI, MODEL, NoPin, NoPin>
where
    DI: Interface,
    MODEL: Model,
{
    /// Constructs a new builder for given [Model].
    ///
    /// `buffer` becomes the staging buffer. It's split into two halves, one
    /// collecting pixels while the other is being transferred.
    #[must_use]
    pub fn new(model: MODEL, di: DI, buffer: &'buf mut [u8]) -> Self {
        Self {
            di,
            model,
            rst: None,
            backlight: None,
            options: ModelOptions::full_size::<MODEL>(),
            buffer,
        }
    }
}

impl<'buf, DI, MODEL, RST, BL> Builder<'buf, DI, MODEL, RST, BL>
where
    DI: Interface,
    MODEL: Model,
    RST: OutputPin,
    BL: OutputPin,
{
    /// Sets the invert color flag
    #[must_use]
    pub fn invert_colors(mut self, color_inversion: ColorInversion) -> Self {
        self.options.invert_colors = color_inversion;
        self
    }

    /// Sets the [ColorOrder]
    #[must_use]
    pub fn color_order(mut self, color_order: ColorOrder) -> Self {
        self.options.color_order = color_order;
        self
    }

    /// Sets the [Orientation]
    #[must_use]
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    /// Sets refresh order
    #[must_use]
    pub fn refresh_order(mut self, refresh_order: RefreshOrder) -> Self {
        self.options.refresh_order = refresh_order;
        self
    }

    /// Sets the display size, in the default orientation.
    ///
    /// Defaults to the full framebuffer of the model.
    #[must_use]
    pub fn display_size(mut self, width: u16, height: u16) -> Self {
        self.options.display_size = (width, height);
        self
    }

    /// Sets the display offset
    #[must_use]
    pub fn display_offset(mut self, x: u16, y: u16) -> Self {
        self.options.display_offset = (x, y);
        self
    }

    /// Sets the reset pin.
    ///
    /// Without a reset pin the display is reset with a DCS soft reset.
    #[must_use]
    pub fn reset_pin<RST2: OutputPin>(self, rst: RST2) -> Builder<'buf, DI, MODEL, RST2, BL> {
        Builder {
            di: self.di,
            model: self.model,
            rst: Some(rst),
            backlight: self.backlight,
            options: self.options,
            buffer: self.buffer,
        }
    }

    /// Sets the backlight pin, driven high at init.
    #[must_use]
    pub fn backlight_pin<BL2: OutputPin>(self, backlight: BL2) -> Builder<'buf, DI, MODEL, RST, BL2> {
        Builder {
            di: self.di,
            model: self.model,
            rst: self.rst,
            backlight: Some(backlight),
            options: self.options,
            buffer: self.buffer,
        }
    }

    /// Consumes the builder to create a new [Display] with an optional reset [OutputPin].
    /// Blocks using the provided delay source for display reset and init.
    ///
    /// ### WARNING
    /// The reset pin needs to be in *high* state in order for the display to operate.
    /// If it wasn't provided the user needs to ensure this is the case.
    pub async fn init(
        mut self,
        delay_source: &mut impl DelayNs,
    ) -> Result<Display<'buf, DI, MODEL, RST, BL>, InitError<DI::Error, RST::Error, BL::Error>>
    {
        if let Err(e) = self.validate() {
            warn!("rejected configuration: {}", e.as_str());
            return Err(InitError::InvalidConfiguration(e));
        }

        if let Some(ref mut rst_pin) = self.rst {
            rst_pin.set_low().map_err(InitError::ResetPin)?;
            delay_source.delay_us(MODEL::RESET_DURATION).await;
            rst_pin.set_high().map_err(InitError::ResetPin)?;
            delay_source.delay_us(10_000).await;
        } else {
            self.di
                .write_command(crate::dcs::SoftReset)
                .await
                .map_err(InitError::Interface)?;
        }

        if let Some(ref mut bl_pin) = self.backlight {
            bl_pin.set_high().map_err(InitError::BacklightPin)?;
        }

        let madctl = self
            .model
            .init(&mut self.di, delay_source, &self.options)
            .await?;
        debug!("display initialized, MADCTL {}", madctl.bits());

        Ok(Display {
            di: self.di,
            model: self.model,
            rst: self.rst,
            backlight: self.backlight,
            options: self.options,
            staging: StagingBuffer::new(self.buffer),
        })
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        let to_u32 = |(a, b)| (u32::from(a), u32::from(b));
        let (width, height) = to_u32(self.options.display_size);
        let (offset_x, offset_y) = to_u32(self.options.display_offset);
        let (max_width, max_height) = to_u32(MODEL::FRAMEBUFFER_SIZE);

        if width == 0 || height == 0 || width > max_width || height > max_height {
            return Err(ConfigurationError::InvalidDisplaySize);
        }
        if width + offset_x > max_width || height + offset_y > max_height {
            return Err(ConfigurationError::InvalidDisplayOffset);
        }
        if self.buffer.len() < MIN_BUFFER_LEN {
            return Err(ConfigurationError::BufferTooSmall);
        }
        Ok(())
    }
}

/// Smallest staging buffer: one pixel per half.
pub const MIN_BUFFER_LEN: usize = 4;

/// Error returned by [`Builder::init`].
#[derive(Debug)]
pub enum InitError<DiError, RstError, BlError> {
    /// Error caused by the display interface.
    Interface(DiError),

    /// Error caused by the reset pin's [`OutputPin`](embedded_hal::digital::OutputPin) implementation.
    ResetPin(RstError),

    /// Error caused by the backlight pin's [`OutputPin`](embedded_hal::digital::OutputPin) implementation.
    BacklightPin(BlError),

    /// Invalid configuration error.
    ///
    /// This error is returned when the configuration passed to the builder is
    /// invalid.
    InvalidConfiguration(ConfigurationError),
}

/// Specifics of [InitError::InvalidConfiguration] if configuration was found invalid
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    /// Display size is zero or exceeds the framebuffer of the model.
    InvalidDisplaySize,
    /// The display does not fit the framebuffer at the given offset.
    InvalidDisplayOffset,
    /// The staging buffer is shorter than [`MIN_BUFFER_LEN`].
    BufferTooSmall,
}

impl ConfigurationError {
    const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidDisplaySize => "invalid display size",
            Self::InvalidDisplayOffset => "invalid display offset",
            Self::BufferTooSmall => "staging buffer too small",
        }
    }
}

impl<DiError, RstError, BlError> From<ModelInitError<DiError>>
    for InitError<DiError, RstError, BlError>
{
    fn from(value: ModelInitError<DiError>) -> Self {
        match value {
            ModelInitError::Interface(e) => InitError::Interface(e),
            ModelInitError::InvalidConfiguration(ce) => InitError::InvalidConfiguration(ce),
        }
    }
}

/// Marker type for an optional pin that isn't connected.
pub enum NoPin {}

impl digital::OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl digital::ErrorType for NoPin {
    type Error = core::convert::Infallible;
}
