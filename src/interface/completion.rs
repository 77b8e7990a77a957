//! Completion signalling for transfers that finish in the background.
//!
//! A [`TransferSignal`] is the in-flight flag of one display. The submitting
//! side sets it right before a transfer starts; the completion handler, usually
//! a DMA interrupt, clears it through [`Registry::on_complete`] (or directly
//! through [`TransferSignal::complete`]).
//!
//! A [`DmaChannel`] pairs the flag with the display's chip select line, so the
//! completion handler deasserts chip select before it clears the flag.
//!
//! ```ignore
//! static CHANNEL: DmaChannel<CsPin> = DmaChannel::new();
//! static REGISTRY: Registry<MAX_DEVICES> = Registry::new();
//!
//! #[interrupt]
//! fn DMA1_CHANNEL3() {
//!     REGISTRY.on_complete(LinkId(1));
//! }
//! ```

use core::{
    cell::{Cell, RefCell},
    future::poll_fn,
    sync::atomic::{AtomicBool, Ordering},
    task::Poll,
};

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    waitqueue::AtomicWaker,
};
use embedded_hal::digital::{ErrorType, OutputPin};
use heapless::Vec;

/// Default number of displays a [`Registry`] can route completions for.
pub const MAX_DEVICES: usize = 4;

/// Identity of a serial link, used to route completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkId(pub u8);

/// Work done by the completion handler before the in-flight flag clears.
pub(crate) trait CompletionHook: Sync {
    fn on_complete(&self);
}

/// In-flight flag of one display.
pub struct TransferSignal {
    in_flight: AtomicBool,
    waker: AtomicWaker,
    hook: Mutex<CriticalSectionRawMutex, Cell<Option<&'static dyn CompletionHook>>>,
}

impl TransferSignal {
    pub const fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            waker: AtomicWaker::new(),
            hook: Mutex::new(Cell::new(None)),
        }
    }

    pub(crate) fn attach(&self, hook: &'static dyn CompletionHook) {
        self.hook.lock(|slot| slot.set(Some(hook)));
    }

    /// Marks a transfer as owned by the hardware.
    pub(crate) fn begin(&self) {
        self.in_flight.store(true, Ordering::Release);
    }

    /// Marks the current transfer as finished and wakes the waiting task.
    ///
    /// Chip select of an attached [`DmaChannel`] is deasserted first. Safe to
    /// call from interrupt context. Does not allocate or block.
    pub fn complete(&self) {
        if let Some(hook) = self.hook.lock(Cell::get) {
            hook.on_complete();
        }
        self.in_flight.store(false, Ordering::Release);
        self.waker.wake();
    }

    /// Returns `true` while a transfer is owned by the hardware.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Resolves once no transfer is in flight.
    pub async fn wait(&self) {
        poll_fn(|cx| {
            if !self.is_in_flight() {
                return Poll::Ready(());
            }
            self.waker.register(cx.waker());
            // re-check: the handler may have run between the load and the register
            if self.is_in_flight() {
                Poll::Pending
            } else {
                Poll::Ready(())
            }
        })
        .await
    }
}

impl Default for TransferSignal {
    fn default() -> Self {
        Self::new()
    }
}

struct ChipSelect<CS: ErrorType> {
    pin: Option<CS>,
    // asserted for a transfer that has not been released yet
    held: bool,
    // failure to deassert from the completion handler, reported by the next wait
    fault: Option<CS::Error>,
}

impl<CS: OutputPin> ChipSelect<CS> {
    fn deassert(&mut self) -> Result<(), CS::Error> {
        if !self.held {
            return Ok(());
        }
        self.held = false;
        match self.pin.as_mut() {
            Some(pin) => pin.set_high(),
            None => Ok(()),
        }
    }
}

/// In-flight flag and chip select line of one display on a DMA link.
///
/// Lives in a `static` so the completion handler can reach the chip select
/// pin while the interface is in use. The pin is moved in by
/// [`DmaInterface::new`](super::DmaInterface::new).
pub struct DmaChannel<CS: ErrorType> {
    signal: TransferSignal,
    cs: Mutex<CriticalSectionRawMutex, RefCell<ChipSelect<CS>>>,
}

impl<CS: ErrorType> DmaChannel<CS> {
    pub const fn new() -> Self {
        Self {
            signal: TransferSignal::new(),
            cs: Mutex::new(RefCell::new(ChipSelect {
                pin: None,
                held: false,
                fault: None,
            })),
        }
    }

    /// The in-flight flag, for [`Registry::register`].
    pub fn signal(&self) -> &TransferSignal {
        &self.signal
    }

    /// Returns `true` while chip select is asserted.
    pub fn is_selected(&self) -> bool {
        self.cs.lock(|cs| cs.borrow().held)
    }
}

impl<CS> DmaChannel<CS>
where
    CS: OutputPin + Send + 'static,
    CS::Error: Send,
{
    pub(crate) fn install(&'static self, pin: CS) {
        self.cs.lock(|cs| {
            *cs.borrow_mut() = ChipSelect {
                pin: Some(pin),
                held: false,
                fault: None,
            };
        });
        self.signal.attach(self);
    }

    pub(crate) fn take(&self) -> Option<CS> {
        self.cs.lock(|cs| {
            let mut cs = cs.borrow_mut();
            cs.held = false;
            cs.pin.take()
        })
    }

    pub(crate) fn assert(&self) -> Result<(), CS::Error> {
        self.cs.lock(|cs| {
            let mut cs = cs.borrow_mut();
            cs.held = true;
            match cs.pin.as_mut() {
                Some(pin) => pin.set_low(),
                None => Ok(()),
            }
        })
    }

    pub(crate) fn deassert(&self) -> Result<(), CS::Error> {
        self.cs.lock(|cs| cs.borrow_mut().deassert())
    }

    /// Error the completion handler hit while deasserting chip select.
    pub(crate) fn take_fault(&self) -> Option<CS::Error> {
        self.cs.lock(|cs| cs.borrow_mut().fault.take())
    }
}

impl<CS> CompletionHook for DmaChannel<CS>
where
    CS: OutputPin + Send,
    CS::Error: Send,
{
    fn on_complete(&self) {
        self.cs.lock(|cs| {
            let mut cs = cs.borrow_mut();
            if let Err(e) = cs.deassert() {
                cs.fault = Some(e);
            }
        });
    }
}

impl<CS: ErrorType> Default for DmaChannel<CS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned when a [`Registry`] has no room for another link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryFull;

/// Bounded routing table from link identity to in-flight flag.
///
/// The registry only borrows signals; it never owns a display. Entries are
/// never removed.
pub struct Registry<const N: usize> {
    entries: Mutex<CriticalSectionRawMutex, RefCell<Vec<(LinkId, &'static TransferSignal), N>>>,
}

impl<const N: usize> Registry<N> {
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Routes completions of `id` to `signal`.
    ///
    /// Registering an identity twice replaces the earlier signal.
    pub fn register(&self, id: LinkId, signal: &'static TransferSignal) -> Result<(), RegistryFull> {
        let result = self.entries.lock(|entries| {
            let mut entries = entries.borrow_mut();
            if let Some(entry) = entries.iter_mut().find(|(known, _)| *known == id) {
                entry.1 = signal;
                return Ok(());
            }
            entries.push((id, signal)).map_err(|_| RegistryFull)
        });

        match result {
            Ok(()) => debug!("registered link {}", id.0),
            Err(RegistryFull) => warn!("registry full, link {} not registered", id.0),
        }
        result
    }

    /// Completion handler body: deasserts chip select and clears the
    /// in-flight flag registered for `id`.
    ///
    /// Returns `false` when `id` was never registered.
    pub fn on_complete(&self, id: LinkId) -> bool {
        let signal = self.entries.lock(|entries| {
            entries
                .borrow()
                .iter()
                .find(|(known, _)| *known == id)
                .map(|(_, signal)| *signal)
        });

        match signal {
            Some(signal) => {
                signal.complete();
                true
            }
            None => false,
        }
    }

    /// Number of registered links.
    pub fn len(&self) -> usize {
        self.entries.lock(|entries| entries.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}
