//! Double-buffered staging area for pixel data.

/// Staging buffer split into two halves.
///
/// Pixels are collected in the current half. When it is handed to the
/// transport, [`rotate`](Self::rotate) switches to the other half so a transfer
/// that is still reading the filled half never sees new pixels. A half is
/// written again only after the transfer that started from the other half,
/// which the transport starts only once the previous one has completed.
pub struct StagingBuffer<'a> {
    halves: [&'a mut [u8]; 2],
    active: usize,
    cursor: usize,
}

impl<'a> StagingBuffer<'a> {
    /// Splits `buffer` into two halves of equal, even length.
    ///
    /// A trailing byte that doesn't fit is left unused.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let half = (buffer.len() / 2) & !1;
        let (first, rest) = buffer.split_at_mut(half);
        let (second, _) = rest.split_at_mut(half);
        Self {
            halves: [first, second],
            active: 0,
            cursor: 0,
        }
    }

    /// Capacity of one half in bytes.
    pub fn capacity(&self) -> usize {
        self.halves[0].len()
    }

    /// Number of staged bytes.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Appends a word, most significant byte first.
    ///
    /// Returns `false` without writing anything if fewer than two bytes remain.
    pub fn push_word(&mut self, word: u16) -> bool {
        if self.remaining() < 2 {
            return false;
        }
        let at = self.cursor;
        self.halves[self.active][at..at + 2].copy_from_slice(&word.to_be_bytes());
        self.cursor += 2;
        true
    }

    /// Copies as much of `bytes` as fits and returns the number of bytes copied.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.remaining());
        let at = self.cursor;
        self.halves[self.active][at..at + n].copy_from_slice(&bytes[..n]);
        self.cursor += n;
        n
    }

    /// The staged bytes of the current half.
    pub fn filled(&self) -> &[u8] {
        &self.halves[self.active][..self.cursor]
    }

    /// Makes the other half current and empty.
    ///
    /// Call after the filled half was handed to the transport.
    pub fn rotate(&mut self) {
        self.active ^= 1;
        self.cursor = 0;
    }

    /// Discards the staged bytes of the current half.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
