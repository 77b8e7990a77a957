use embedded_hal_async::delay::DelayNs;

use crate::{
    dcs::{
        BitsPerPixel, EnterNormalMode, ExitSleepMode, InterfaceExt, PixelFormat, SetAddressMode,
        SetDisplayOn, SetInvertMode, SetPixelFormat,
    },
    interface::Interface,
    models::{Model, ModelInitError},
    options::ModelOptions,
};

/// ST7789 display in Rgb565 color mode.
pub struct ST7789;

impl Model for ST7789 {
    const FRAMEBUFFER_SIZE: (u16, u16) = (240, 320);

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

        delay.delay_us(150_000).await;

        di.write_command(ExitSleepMode).await?;
        delay.delay_us(10_000).await;

        di.write_command(madctl).await?;

        let pf = PixelFormat::with_all(BitsPerPixel::Sixteen);
        di.write_command(SetPixelFormat::new(pf)).await?;

        // porch, gate, VCOM and power settings
        di.write_raw(0xB2, &[0x0C, 0x0C, 0x00, 0x33, 0x33]).await?;
        di.write_raw(0xB7, &[0x72]).await?;
        di.write_raw(0xBB, &[0x3D]).await?;
        di.write_raw(0xC0, &[0x2C]).await?;
        di.write_raw(0xC2, &[0x01]).await?;
        di.write_raw(0xC3, &[0x19]).await?;
        di.write_raw(0xC4, &[0x20]).await?;
        // 90 Hz frame rate
        di.write_raw(0xC6, &[0x05]).await?;
        di.write_raw(0xD0, &[0xA4, 0xA1]).await?;
        di.write_raw(0xD6, &[0xA1]).await?;

        di.write_raw(
            0xE0,
            &[
                0xD0, 0x04, 0x0D, 0x11, 0x13, 0x2B, 0x3F, 0x54, 0x4C, 0x18, 0x0D, 0x0B, 0x1F, 0x23,
            ],
        )
        .await?;
        di.write_raw(
            0xE1,
            &[
                0xD0, 0x04, 0x0C, 0x11, 0x13, 0x2C, 0x3F, 0x44, 0x51, 0x2F, 0x1F, 0x1F, 0x20, 0x23,
            ],
        )
        .await?;

        di.write_command(SetInvertMode::new(options.invert_colors))
            .await?;
        delay.delay_us(10_000).await;
        di.write_command(EnterNormalMode).await?;
        delay.delay_us(10_000).await;
        di.write_command(SetDisplayOn).await?;

        // DISPON requires some time otherwise we risk SPI data issues
        delay.delay_us(120_000).await;

        Ok(madctl)
    }
}
