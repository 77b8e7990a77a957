//! Transport between the driver and the display controller.
//!
//! Two implementations are provided: [`SpiInterface`] finishes every transfer
//! before returning, [`DmaInterface`] can leave a transfer running in the
//! background and learns about its completion through a [`DmaChannel`].

mod spi;
pub use spi::*;

mod dma;
pub use dma::*;

pub mod completion;
pub use completion::{DmaChannel, LinkId, Registry, RegistryFull, TransferSignal, MAX_DEVICES};

/// Command and data transport with a separate data/command select line.
///
/// Every method that drives the control lines first waits for a transfer that
/// is still in flight, so transfers on one interface never overlap.
pub trait Interface {
    /// Error type
    type Error: core::fmt::Debug;

    /// `true` when [`submit`](Self::submit) may return before the bytes left the link.
    const ASYNC_CAPABLE: bool;

    /// Send a command with optional parameters.
    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error>;

    /// Send data bytes synchronously, bypassing any background transfer path.
    async fn send_data_slice(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Send a single data byte.
    async fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.send_data_slice(&[byte]).await
    }

    /// Send a 16-bit data word, most significant byte first.
    async fn write_word(&mut self, word: u16) -> Result<(), Self::Error> {
        self.send_data_slice(&word.to_be_bytes()).await
    }

    /// Send a block of data bytes.
    ///
    /// With `wait == false` an async-capable interface returns as soon as the
    /// transfer has started.
    ///
    /// # Safety
    ///
    /// When this returns with a transfer still in flight, the hardware keeps
    /// reading `data`. The caller must keep it alive and unmodified until
    /// [`wait_idle`](Self::wait_idle) returns, the next transfer starts, or
    /// the interface is dropped.
    async unsafe fn submit(&mut self, data: &[u8], wait: bool) -> Result<(), Self::Error>;

    /// Waits until no transfer is in flight and releases chip select.
    async fn wait_idle(&mut self) -> Result<(), Self::Error>;

    /// Returns `true` while a background transfer is in flight.
    fn is_busy(&self) -> bool;
}

impl<T: Interface + ?Sized> Interface for &mut T {
    type Error = T::Error;
    const ASYNC_CAPABLE: bool = T::ASYNC_CAPABLE;

    async fn send_command(&mut self, command: u8, args: &[u8]) -> Result<(), Self::Error> {
        T::send_command(self, command, args).await
    }

    async fn send_data_slice(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::send_data_slice(self, data).await
    }

    async fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        T::write_byte(self, byte).await
    }

    async fn write_word(&mut self, word: u16) -> Result<(), Self::Error> {
        T::write_word(self, word).await
    }

    async unsafe fn submit(&mut self, data: &[u8], wait: bool) -> Result<(), Self::Error> {
        T::submit(self, data, wait).await
    }

    async fn wait_idle(&mut self) -> Result<(), Self::Error> {
        T::wait_idle(self).await
    }

    fn is_busy(&self) -> bool {
        T::is_busy(self)
    }
}
