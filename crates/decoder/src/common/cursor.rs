//! Little-endian byte cursor.
//!
//! Consumes fixed-width integers from the front of a byte window and tracks how
//! much of it has been used. Reads that would run past the end return `None`
//! and leave the cursor untouched.

/// Forward-only reader over an instruction or descriptor byte window.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at the start of `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub const fn consumed(&self) -> usize {
        self.pos
    }

    /// Number of bytes still available.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// The unread tail of the window.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Moves the cursor back (or forward) to a previously observed position.
    ///
    /// Positions past the end are clamped to the end of the window.
    #[inline]
    pub fn restore(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    /// Consumes `N` bytes as an array.
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let chunk = self.bytes.get(self.pos..self.pos + N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        self.pos += N;
        Some(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|b| b[0])
    }

    /// Reads a little-endian `u16`.
    pub fn read_u16(&mut self) -> Option<u16> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> Option<u32> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    /// Reads a little-endian `u64`.
    pub fn read_u64(&mut self) -> Option<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    /// Reads twelve bytes as a 96-bit little-endian value in the low bits of a `u128`.
    pub fn read_u96(&mut self) -> Option<u128> {
        let lo = self.bytes.get(self.pos..self.pos + 12)?;
        let value = lo
            .iter()
            .rev()
            .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
        self.pos += 12;
        Some(value)
    }

    /// Borrows the next `n` bytes and consumes them.
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let chunk = self.bytes.get(self.pos..self.pos.checked_add(n)?)?;
        self.pos += n;
        Some(chunk)
    }

    /// Skips `n` bytes.
    ///
    /// # Returns
    ///
    /// `false` (without moving) if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> bool {
        self.read_bytes(n).is_some()
    }
}
