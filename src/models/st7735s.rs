use embedded_hal_async::delay::DelayNs;

use crate::{
    dcs::{
        BitsPerPixel, EnterNormalMode, ExitSleepMode, InterfaceExt, PixelFormat, SetAddressMode,
        SetDisplayOn, SetInvertMode, SetPixelFormat, SoftReset,
    },
    interface::Interface,
    models::{Model, ModelInitError},
    options::ModelOptions,
};

/// ST7735s display in Rgb565 color mode.
///
/// Common 0.96", 1.44" and 1.8" panels; the controller RAM is 132x162.
pub struct ST7735S;

impl Model for ST7735S {
    const FRAMEBUFFER_SIZE: (u16, u16) = (132, 162);

    async fn init<DELAY, DI>(
        &mut self,
        di: &mut DI,
        delay: &mut DELAY,
        options: &ModelOptions,
    ) -> Result<SetAddressMode, ModelInitError<DI::Error>>
    where
        DELAY: DelayNs,
        DI: Interface,
    {
        let madctl = SetAddressMode::from(options);

        di.write_command(SoftReset).await?;
        delay.delay_us(150_000).await;

        di.write_command(ExitSleepMode).await?;
        delay.delay_us(255_000).await;

        // frame rate: normal, idle and partial mode
        di.write_raw(0xB1, &[0x01, 0x2C, 0x2D]).await?;
        di.write_raw(0xB2, &[0x01, 0x2C, 0x2D]).await?;
        di.write_raw(0xB3, &[0x01, 0x2C, 0x2D, 0x01, 0x2C, 0x2D])
            .await?;
        // column inversion
        di.write_raw(0xB4, &[0x07]).await?;

        // power control 1-5
        di.write_raw(0xC0, &[0xA2, 0x02, 0x84]).await?;
        di.write_raw(0xC1, &[0xC5]).await?;
        di.write_raw(0xC2, &[0x0A, 0x00]).await?;
        di.write_raw(0xC3, &[0x8A, 0x2A]).await?;
        di.write_raw(0xC4, &[0x8A, 0xEE]).await?;
        // VCOM
        di.write_raw(0xC5, &[0x0E]).await?;

        di.write_command(SetInvertMode::new(options.invert_colors))
            .await?;
        di.write_command(madctl).await?;

        let pf = PixelFormat::with_dbi(BitsPerPixel::Sixteen);
        di.write_command(SetPixelFormat::new(pf)).await?;

        di.write_raw(
            0xE0,
            &[
                0x0F, 0x1A, 0x0F, 0x18, 0x2F, 0x28, 0x20, 0x22, 0x1F, 0x1B, 0x23, 0x37, 0x00, 0x07,
                0x02, 0x10,
            ],
        )
        .await?;
        di.write_raw(
            0xE1,
            &[
                0x0F, 0x1B, 0x0F, 0x17, 0x33, 0x2C, 0x29, 0x2E, 0x30, 0x30, 0x39, 0x3F, 0x00, 0x07,
                0x03, 0x10,
            ],
        )
        .await?;

        di.write_command(EnterNormalMode).await?;
        delay.delay_us(10_000).await;
        di.write_command(SetDisplayOn).await?;
        delay.delay_us(20_000).await;

        Ok(madctl)
    }
}
