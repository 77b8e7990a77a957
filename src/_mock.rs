//! Test doubles: a recording SPI bus, pins, a delay, a wire decoder and an
//! in-memory [`PixelWindow`].

use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, Mutex, MutexGuard},
};

use embedded_graphics_core::pixelcolor::{raw::RawU16, Rgb565};
use embedded_hal::{digital, spi};
use embedded_hal_async::{delay::DelayNs, spi::SpiBus};

use crate::{
    interface::{DmaWrite, LinkId, TransferSignal},
    window::PixelWindow,
};

pub use embassy_futures::poll_once;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinKind {
    Cs,
    Dc,
    Rst,
    Bl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Pin(PinKind, bool),
    Write(Vec<u8>),
    DmaStart(Vec<u8>),
}

/// Shared event log of one emulated board.
#[derive(Clone, Default)]
pub struct MockBus {
    events: Arc<Mutex<Vec<Event>>>,
}

fn lock(events: &Mutex<Vec<Event>>) -> MutexGuard<'_, Vec<Event>> {
    events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<Event>> {
        lock(&self.events)
    }

    /// A link whose background writes complete only when told to.
    pub fn dma_spi(&self, id: LinkId) -> MockSpi {
        MockSpi {
            events: self.events.clone(),
            id,
            fail: false,
            auto_complete: None,
        }
    }

    pub fn spi(&self) -> MockSpi {
        self.dma_spi(LinkId(0))
    }

    pub fn pin(&self, kind: PinKind) -> MockPin {
        MockPin {
            events: self.events.clone(),
            kind,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log().clone()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn dma_starts(&self) -> usize {
        self.log()
            .iter()
            .filter(|e| matches!(e, Event::DmaStart(_)))
            .count()
    }

    /// `true` when chip select alternates low/high and ends high.
    pub fn chip_select_balanced(&self) -> bool {
        let mut low = false;
        for event in self.log().iter() {
            if let Event::Pin(PinKind::Cs, high) = event {
                if *high != low {
                    return false;
                }
                low = !high;
            }
        }
        !low
    }

    pub fn pin_level(&self, kind: PinKind) -> Option<bool> {
        self.log().iter().rev().find_map(|e| match e {
            Event::Pin(k, level) if *k == kind => Some(*level),
            _ => None,
        })
    }

    /// Replays the recorded traffic into a panel model.
    pub fn panel(&self) -> Panel {
        Panel::decode(&self.log())
    }
}

pub struct MockSpi {
    events: Arc<Mutex<Vec<Event>>>,
    id: LinkId,
    fail: bool,
    auto_complete: Option<&'static TransferSignal>,
}

impl MockSpi {
    fn log(&self) -> MutexGuard<'_, Vec<Event>> {
        lock(&self.events)
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Completes every background write as soon as it starts.
    pub fn auto_complete(&mut self, signal: &'static TransferSignal) {
        self.auto_complete = Some(signal);
    }
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiBus for MockSpi {
    async fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    async fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(spi::ErrorKind::Other);
        }
        self.log().push(Event::Write(words.to_vec()));
        Ok(())
    }

    async fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write).await?;
        read.fill(0);
        Ok(())
    }

    async fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let copy = words.to_vec();
        self.write(&copy).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl DmaWrite for MockSpi {
    fn link_id(&self) -> LinkId {
        self.id
    }

    unsafe fn start_write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(spi::ErrorKind::Other);
        }
        self.log().push(Event::DmaStart(data.to_vec()));
        if let Some(signal) = self.auto_complete {
            signal.complete();
        }
        Ok(())
    }
}

pub struct MockPin {
    events: Arc<Mutex<Vec<Event>>>,
    kind: PinKind,
}

impl MockPin {
    fn log(&self) -> MutexGuard<'_, Vec<Event>> {
        lock(&self.events)
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log().push(Event::Pin(self.kind, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log().push(Event::Pin(self.kind, true));
        Ok(())
    }
}

pub struct MockDelay;

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

/// Controller RAM rebuilt from recorded bus traffic.
#[derive(Debug, Default)]
pub struct Panel {
    /// Pixel values by controller RAM address.
    pub pixels: HashMap<(u16, u16), u16>,
    /// Every command with its parameter bytes, in order.
    pub commands: Vec<(u8, Vec<u8>)>,
    pub pixel_writes: usize,
    /// Bytes sent while chip select was high.
    pub unframed: usize,
}

impl Panel {
    fn decode(events: &[Event]) -> Self {
        let mut panel = Panel::default();
        let mut selected = false;
        let mut data_mode = false;
        let mut current: Option<(u8, Vec<u8>)> = None;
        let (mut xs, mut xe, mut ys, mut ye) = (0u16, 0u16, 0u16, 0u16);
        let (mut cx, mut cy) = (0u16, 0u16);
        let mut high_byte: Option<u8> = None;

        for event in events {
            let bytes = match event {
                Event::Pin(PinKind::Cs, high) => {
                    selected = !high;
                    continue;
                }
                Event::Pin(PinKind::Dc, high) => {
                    data_mode = *high;
                    continue;
                }
                Event::Pin(..) => continue,
                Event::Write(bytes) | Event::DmaStart(bytes) => bytes,
            };
            if !selected {
                panel.unframed += bytes.len();
            }

            if !data_mode {
                for &command in bytes {
                    if let Some(done) = current.take() {
                        panel.commands.push(done);
                    }
                    if command == 0x2C {
                        cx = xs;
                        cy = ys;
                        high_byte = None;
                    }
                    current = Some((command, Vec::new()));
                }
                continue;
            }

            let Some((command, params)) = current.as_mut() else {
                continue;
            };
            if *command != 0x2C {
                params.extend_from_slice(bytes);
                let range = |p: &[u8]| {
                    (
                        u16::from_be_bytes([p[0], p[1]]),
                        u16::from_be_bytes([p[2], p[3]]),
                    )
                };
                match (*command, params.len()) {
                    (0x2A, 4) => (xs, xe) = range(params.as_slice()),
                    (0x2B, 4) => (ys, ye) = range(params.as_slice()),
                    _ => {}
                }
                continue;
            }

            for &byte in bytes {
                let Some(high) = high_byte.take() else {
                    high_byte = Some(byte);
                    continue;
                };
                panel.pixels.insert((cx, cy), u16::from_be_bytes([high, byte]));
                panel.pixel_writes += 1;
                if cx >= xe {
                    cx = xs;
                    cy = if cy >= ye { ys } else { cy + 1 };
                } else {
                    cx += 1;
                }
            }
        }
        if let Some(done) = current.take() {
            panel.commands.push(done);
        }
        panel
    }

    pub fn color_at(&self, x: u16, y: u16) -> Option<u16> {
        self.pixels.get(&(x, y)).copied()
    }

    /// Parameters of the last occurrence of `command`.
    pub fn last_params(&self, command: u8) -> Option<&[u8]> {
        self.commands
            .iter()
            .rev()
            .find(|(c, _)| *c == command)
            .map(|(_, p)| p.as_slice())
    }

    pub fn command_codes(&self) -> Vec<u8> {
        self.commands.iter().map(|(c, _)| *c).collect()
    }
}

/// In-memory [`PixelWindow`] that checks the window protocol.
pub struct RecordingWindow {
    width: u16,
    height: u16,
    window: (u16, u16, u16, u16),
    cursor: (u16, u16),
    remaining: u32,
    high_byte: Option<u8>,
    /// Final colour of every written pixel.
    pub pixels: HashMap<(u16, u16), Rgb565>,
    /// Every pixel write in order, including overdraw.
    pub order: Vec<(u16, u16)>,
    pub windows: usize,
    pub flushes: Vec<bool>,
    pub resets: usize,
    /// Windows left before all their pixels arrived, plus pixels streamed past a window's end.
    pub desyncs: usize,
    /// Windows that reached outside the visible area.
    pub out_of_bounds: usize,
}

impl RecordingWindow {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            window: (0, 0, 0, 0),
            cursor: (0, 0),
            remaining: 0,
            high_byte: None,
            pixels: HashMap::new(),
            order: Vec::new(),
            windows: 0,
            flushes: Vec::new(),
            resets: 0,
            desyncs: 0,
            out_of_bounds: 0,
        }
    }

    pub fn color_at(&self, x: u16, y: u16) -> Option<Rgb565> {
        self.pixels.get(&(x, y)).copied()
    }

    /// Written coordinates, sorted.
    pub fn points(&self) -> Vec<(u16, u16)> {
        let mut points: Vec<_> = self.pixels.keys().copied().collect();
        points.sort_unstable();
        points
    }

    /// `true` once every selected window received exactly its pixel count.
    pub fn in_sync(&self) -> bool {
        self.desyncs == 0 && self.remaining == 0 && self.out_of_bounds == 0
    }

    fn plot(&mut self, color: Rgb565) {
        if self.remaining == 0 {
            self.desyncs += 1;
            return;
        }
        self.remaining -= 1;
        self.pixels.insert(self.cursor, color);
        self.order.push(self.cursor);
        let (x0, _, x1, _) = self.window;
        if self.cursor.0 >= x1 {
            self.cursor = (x0, self.cursor.1 + 1);
        } else {
            self.cursor.0 += 1;
        }
    }
}

impl PixelWindow for RecordingWindow {
    type Error = Infallible;

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    async fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), Self::Error> {
        if self.remaining != 0 {
            self.desyncs += 1;
        }
        if x0 > x1 || y0 > y1 || x1 >= self.width || y1 >= self.height {
            self.out_of_bounds += 1;
        }
        self.windows += 1;
        self.window = (x0, y0, x1, y1);
        self.cursor = (x0, y0);
        self.remaining = (u32::from(x1.saturating_sub(x0)) + 1) * (u32::from(y1.saturating_sub(y0)) + 1);
        Ok(())
    }

    async fn stream_pixel(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.plot(color);
        Ok(())
    }

    async fn stream_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            match self.high_byte.take() {
                None => self.high_byte = Some(byte),
                Some(high) => self.plot(RawU16::new(u16::from_be_bytes([high, byte])).into()),
            }
        }
        Ok(())
    }

    async fn write_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Self::Error> {
        self.set_window(x, y, x, y).await?;
        self.plot(color);
        Ok(())
    }

    async fn flush(&mut self, wait: bool) -> Result<(), Self::Error> {
        self.flushes.push(wait);
        Ok(())
    }

    fn reset_staging(&mut self) {
        self.resets += 1;
    }
}
