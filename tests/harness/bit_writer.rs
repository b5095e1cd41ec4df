//! Test-side encoder that inverts `BitStream`'s read policy: bits fill each
//! byte from the low end, with `Big` taking the value's high-order group
//! first and `Little` the low-order group.
#![allow(dead_code)]

use replaystream::Endian;

pub struct BitWriter {
    out: Vec<u8>,
    cur: u8,
    cur_bits: u32,
    endian: Endian,
}

impl BitWriter {
    pub fn new(endian: Endian) -> Self {
        Self {
            out: Vec::new(),
            cur: 0,
            cur_bits: 0,
            endian,
        }
    }

    pub fn big() -> Self {
        Self::new(Endian::Big)
    }

    pub fn write_bits(&mut self, value: u64, bits: u32) -> &mut Self {
        assert!(bits <= 64);
        assert!(bits == 64 || value < (1u64 << bits), "value wider than field");
        let mut remaining = bits;
        while remaining > 0 {
            let take = (8 - self.cur_bits).min(remaining);
            let mask = (1u64 << take) - 1;
            let chunk = match self.endian {
                Endian::Big => (value >> (remaining - take)) & mask,
                Endian::Little => (value >> (bits - remaining)) & mask,
            };
            self.cur |= (chunk as u8) << self.cur_bits;
            self.cur_bits += take;
            remaining -= take;
            if self.cur_bits == 8 {
                self.out.push(self.cur);
                self.cur = 0;
                self.cur_bits = 0;
            }
        }
        self
    }

    pub fn write_bit(&mut self, bit: bool) -> &mut Self {
        self.write_bits(u64::from(bit), 1)
    }

    pub fn byte_align(&mut self) -> &mut Self {
        if self.cur_bits > 0 {
            self.out.push(self.cur);
            self.cur = 0;
            self.cur_bits = 0;
        }
        self
    }

    /// Writes bytes on a byte boundary, padding the current byte first.
    pub fn write_aligned_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.byte_align();
        self.out.extend_from_slice(bytes);
        self
    }

    /// Writes bytes bit-by-bit from the current offset.
    pub fn write_unaligned_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for &byte in bytes {
            self.write_bits(u64::from(byte), 8);
        }
        self
    }

    /// Unsigned LEB128, matching `TaggedDecoder::read_varint`.
    pub fn write_varint(&mut self, mut value: u64) -> &mut Self {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value > 0 {
                byte |= 0x80;
            }
            self.write_bits(u64::from(byte), 8);
            if value == 0 {
                return self;
            }
        }
    }

    pub fn finish(&mut self) -> Vec<u8> {
        self.byte_align();
        std::mem::take(&mut self.out)
    }
}
