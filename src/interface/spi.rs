use embedded_hal::digital::OutputPin;
use embedded_hal_async::spi::SpiBus;

use super::Interface;

/// Spi interface error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpiError<SPI, DC, CS> {
    Spi(SPI),
    Dc(DC),
    Cs(CS),
}

/// Serial interface that completes every transfer before returning.
pub struct SpiInterface<SPI, DC, CS> {
    spi: SPI,
    dc: DC,
    cs: CS,
}

impl<SPI, DC, CS> SpiInterface<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    /// Create new interface
    pub fn new(spi: SPI, dc: DC, cs: CS) -> Self {
        Self { spi, dc, cs }
    }

    /// Release the SPI bus and control pins, deconstructing the interface
    pub fn release(self) -> (SPI, DC, CS) {
        (self.spi, self.dc, self.cs)
    }
}

impl<SPI, DC, CS> Interface for SpiInterface<SPI, DC, CS>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
{
    type Error = SpiError<SPI::Error, DC::Error, CS::Error>;

    const ASYNC_CAPABLE: bool = false;

    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error> {
        framed(&mut self.cs, command_frame(&mut self.spi, &mut self.dc, command, args)).await
    }

    async fn send_data_slice(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        framed(&mut self.cs, data_frame(&mut self.spi, &mut self.dc, data)).await
    }

    async unsafe fn submit(&mut self, data: &[u8], _wait: bool) -> Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.send_data_slice(data).await
    }

    async fn wait_idle(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Runs `frame` with chip select asserted.
///
/// Chip select is deasserted afterwards even when the frame failed.
pub(crate) async fn framed<CS, SE, DE>(
    cs: &mut CS,
    frame: impl core::future::Future<Output = Result<(), SpiError<SE, DE, CS::Error>>>,
) -> Result<(), SpiError<SE, DE, CS::Error>>
where
    CS: OutputPin,
{
    cs.set_low().map_err(SpiError::Cs)?;
    let result = frame.await;
    cs.set_high().map_err(SpiError::Cs)?;
    result
}

pub(crate) async fn command_frame<SPI, DC, CE>(
    spi: &mut SPI,
    dc: &mut DC,
    command: u8,
    args: &[u8],
) -> Result<(), SpiError<SPI::Error, DC::Error, CE>>
where
    SPI: SpiBus,
    DC: OutputPin,
{
    dc.set_low().map_err(SpiError::Dc)?;
    spi.write(&[command]).await.map_err(SpiError::Spi)?;
    spi.flush().await.map_err(SpiError::Spi)?;
    if args.is_empty() {
        return Ok(());
    }
    data_frame(spi, dc, args).await
}

pub(crate) async fn data_frame<SPI, DC, CE>(
    spi: &mut SPI,
    dc: &mut DC,
    data: &[u8],
) -> Result<(), SpiError<SPI::Error, DC::Error, CE>>
where
    SPI: SpiBus,
    DC: OutputPin,
{
    dc.set_high().map_err(SpiError::Dc)?;
    spi.write(data).await.map_err(SpiError::Spi)?;
    spi.flush().await.map_err(SpiError::Spi)
}
