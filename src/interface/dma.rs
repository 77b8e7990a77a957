use embedded_hal::digital::{self, OutputPin};
use embedded_hal_async::spi::{ErrorType, SpiBus};

use super::{
    completion::{DmaChannel, LinkId, Registry, RegistryFull, TransferSignal},
    spi::{command_frame, data_frame},
    Interface, SpiError,
};

/// A serial link that can run a write in the background.
///
/// Completion is reported out of band: whatever observes the end of the
/// transfer (typically the DMA interrupt) calls [`Registry::on_complete`] with
/// this link's [`LinkId`].
pub trait DmaWrite: ErrorType {
    /// Identity used to route completion events back to this link.
    fn link_id(&self) -> LinkId;

    /// Starts writing `data` and returns without waiting for the transfer.
    ///
    /// # Safety
    ///
    /// The hardware keeps reading `data` after this returns. The caller must
    /// keep the memory behind `data` alive and unmodified until the
    /// completion of this transfer has been reported.
    unsafe fn start_write(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// Waits in `drop` until the hardware has stopped reading submitted bytes.
struct IdleOnDrop(&'static TransferSignal);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        while self.0.is_in_flight() {
            core::hint::spin_loop();
        }
    }
}

/// Serial interface whose bulk transfers complete in the background.
///
/// Commands and single data words still use blocking writes. Bulk data passed
/// to [`Interface::submit`] is handed to [`DmaWrite::start_write`].
///
/// Chip select lives in a `static` [`DmaChannel`] so the completion handler
/// can deassert it. Dropping the interface blocks until a running transfer
/// has completed.
pub struct DmaInterface<SPI, DC, CS: digital::ErrorType + 'static> {
    // dropped first, while the link is still alive
    _idle: IdleOnDrop,
    spi: SPI,
    dc: DC,
    channel: &'static DmaChannel<CS>,
}

impl<SPI, DC, CS> DmaInterface<SPI, DC, CS>
where
    SPI: SpiBus + DmaWrite,
    DC: OutputPin,
    CS: OutputPin + Send + 'static,
    CS::Error: Send,
{
    /// Create new interface, moving the chip select pin into `channel`
    pub fn new(spi: SPI, dc: DC, cs: CS, channel: &'static DmaChannel<CS>) -> Self {
        channel.install(cs);
        Self {
            _idle: IdleOnDrop(channel.signal()),
            spi,
            dc,
            channel,
        }
    }

    /// Routes completions of this interface's link through `registry`.
    pub fn register<const N: usize>(&self, registry: &Registry<N>) -> Result<(), RegistryFull> {
        registry.register(self.spi.link_id(), self.channel.signal())
    }

    /// Returns the identity of the underlying link.
    pub fn link_id(&self) -> LinkId {
        self.spi.link_id()
    }

    /// Release the SPI bus and control pins, deconstructing the interface
    ///
    /// Waits for a running transfer first. The chip select pin is `None` when
    /// another interface has since been created on the same channel.
    pub async fn release(mut self) -> Result<(SPI, DC, Option<CS>), SpiError<SPI::Error, DC::Error, CS::Error>> {
        self.wait_idle().await?;
        let Self { spi, dc, channel, .. } = self;
        Ok((spi, dc, channel.take()))
    }
}

/// Runs `frame` with the channel's chip select asserted.
async fn selected<CS, SE, DE>(
    channel: &DmaChannel<CS>,
    frame: impl core::future::Future<Output = Result<(), SpiError<SE, DE, CS::Error>>>,
) -> Result<(), SpiError<SE, DE, CS::Error>>
where
    CS: OutputPin + Send + 'static,
    CS::Error: Send,
{
    channel.assert().map_err(SpiError::Cs)?;
    let result = frame.await;
    channel.deassert().map_err(SpiError::Cs)?;
    result
}

impl<SPI, DC, CS> Interface for DmaInterface<SPI, DC, CS>
where
    SPI: SpiBus + DmaWrite,
    DC: OutputPin,
    CS: OutputPin + Send + 'static,
    CS::Error: Send,
{
    type Error = SpiError<SPI::Error, DC::Error, CS::Error>;

    const ASYNC_CAPABLE: bool = true;

    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error> {
        self.wait_idle().await?;
        selected(self.channel, command_frame(&mut self.spi, &mut self.dc, command, args)).await
    }

    async fn send_data_slice(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.wait_idle().await?;
        selected(self.channel, data_frame(&mut self.spi, &mut self.dc, data)).await
    }

    async unsafe fn submit(&mut self, data: &[u8], wait: bool) -> Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.wait_idle().await?;

        self.dc.set_high().map_err(SpiError::Dc)?;
        self.channel.assert().map_err(SpiError::Cs)?;

        let signal = self.channel.signal();
        signal.begin();
        // SAFETY: forwarded from the caller of `submit`
        if let Err(e) = unsafe { self.spi.start_write(data) } {
            signal.complete();
            self.wait_idle().await?;
            return Err(SpiError::Spi(e));
        }
        trace!("link {}: started {} byte transfer", self.spi.link_id().0, data.len());

        if wait {
            self.wait_idle().await?;
        }
        Ok(())
    }

    async fn wait_idle(&mut self) -> Result<(), Self::Error> {
        self.channel.signal().wait().await;
        if let Some(e) = self.channel.take_fault() {
            return Err(SpiError::Cs(e));
        }
        self.channel.deassert().map_err(SpiError::Cs)
    }

    fn is_busy(&self) -> bool {
        self.channel.signal().is_in_flight()
    }
}
