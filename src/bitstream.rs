//! A bit-precision cursor over an immutable byte buffer.
//!
//! `BitStream` is the sole point of bit-level I/O in the library. It knows
//! nothing about schemas; the decoders in [`crate::packed`] and
//! [`crate::tagged`] drive it. A stream is created once per decode pass and
//! is not restartable — decoding a second root type requires a fresh stream
//! over the same buffer.

use crate::error::{Error, Result};

/// Bit-assembly policy, fixed at construction.
///
/// Bits are always consumed from the low end of each byte. `Big` places
/// earlier-consumed groups at the high end of the assembled value, `Little`
/// at the low end. Replay files use `Big` everywhere except the attribute
/// events blob, which is `Little`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// A forward-only bit cursor over a borrowed byte buffer.
///
/// The cursor position is monotonically non-decreasing; there is no seek.
pub struct BitStream<'a> {
    data: &'a [u8],
    // Bytes pulled into the bit cache so far.
    used: usize,
    // Unread bits of the current byte, low-justified.
    next: u8,
    next_bits: u32,
    endian: Endian,
}

impl<'a> BitStream<'a> {
    /// Creates a new stream over `data` with the given assembly policy.
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            used: 0,
            next: 0,
            next_bits: 0,
            endian,
        }
    }

    /// Buffer length in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Buffer length in bits.
    pub fn total_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Bits consumed so far (the cursor position).
    pub fn used_bits(&self) -> usize {
        self.used * 8 - self.next_bits as usize
    }

    /// True once every bit of the buffer has been consumed. Monotonic.
    pub fn is_done(&self) -> bool {
        self.used_bits() == self.total_bits()
    }

    fn remaining_bits(&self) -> usize {
        self.total_bits() - self.used_bits()
    }

    fn exhausted(&self, needed: usize) -> Error {
        Error::BufferExhausted {
            offset: self.used_bits(),
            needed,
            total: self.total_bits(),
        }
    }

    /// Consumes `bits` bits (0 ≤ `bits` ≤ 64) and assembles them into an
    /// unsigned value according to the stream's endianness.
    pub fn read_bits(&mut self, bits: u32) -> Result<u64> {
        debug_assert!(bits <= 64, "read_bits supports at most 64 bits");
        if bits as usize > self.remaining_bits() {
            return Err(self.exhausted(bits as usize));
        }

        let mut result: u64 = 0;
        let mut result_bits: u32 = 0;
        while result_bits != bits {
            if self.next_bits == 0 {
                self.next = self.data[self.used];
                self.used += 1;
                self.next_bits = 8;
            }
            let copy_bits = (bits - result_bits).min(self.next_bits);
            let copy = u64::from(self.next) & ((1u64 << copy_bits) - 1);
            match self.endian {
                Endian::Big => result |= copy << (bits - result_bits - copy_bits),
                Endian::Little => result |= copy << result_bits,
            }
            // copy_bits can be the full 8 of a freshly loaded byte; a plain
            // shift would overflow the u8.
            self.next = self.next.checked_shr(copy_bits).unwrap_or(0);
            self.next_bits -= copy_bits;
            result_bits += copy_bits;
        }
        Ok(result)
    }

    /// Advances the cursor to the next byte boundary, discarding any
    /// partially-consumed byte. No-op when already aligned; idempotent.
    pub fn byte_align(&mut self) {
        self.next_bits = 0;
    }

    /// Returns the next `bytes` bytes verbatim.
    ///
    /// The cursor must be byte-aligned; call [`byte_align`](Self::byte_align)
    /// first on paths that require it.
    pub fn read_aligned_bytes(&mut self, bytes: usize) -> Result<&'a [u8]> {
        debug_assert!(self.next_bits == 0, "cursor must be byte-aligned");
        if bytes > self.data.len() - self.used {
            return Err(self.exhausted(bytes * 8));
        }
        let out = &self.data[self.used..self.used + bytes];
        self.used += bytes;
        Ok(out)
    }

    /// Returns the next `bytes` bytes assembled bit-by-bit from the current
    /// (possibly mid-byte) offset, for payloads that are not pre-aligned.
    pub fn read_unaligned_bytes(&mut self, bytes: usize) -> Result<Vec<u8>> {
        if bytes > self.remaining_bits() / 8 {
            return Err(self.exhausted(bytes.saturating_mul(8)));
        }
        let mut out = Vec::with_capacity(bytes);
        for _ in 0..bytes {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for BitStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitStream")
            .field("size", &self.size())
            .field("used_bits", &self.used_bits())
            .field("endian", &self.endian)
            .finish()
    }
}
