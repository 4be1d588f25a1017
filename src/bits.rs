//! Bit-addressable reader and writer.
//!
//! Bits are numbered MSB-first within each byte, so a `read(n)` returns the
//! next `n` bits as a big-endian unsigned integer. Used by the LZW decoder,
//! the TIFF predictor and cross-reference stream field decoding.

use crate::error::BitRangeError;

const MAX_WIDTH: u32 = 32;

fn check_width(n: u32) -> Result<(), BitRangeError> {
    if n == 0 || n > MAX_WIDTH {
        return Err(BitRangeError::InvalidWidth(n));
    }
    Ok(())
}

/// Forward bit reader over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    pos: u64,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Total number of bits in the buffer.
    pub fn len_bits(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    /// Absolute bit position (`byte * 8 + bit`).
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Move to an absolute bit position. The end of the buffer is a valid position.
    pub fn set_position(&mut self, pos: u64) -> Result<(), BitRangeError> {
        if pos > self.len_bits() {
            return Err(BitRangeError::OutOfBounds {
                requested: 0,
                position: pos,
                len_bits: self.len_bits(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Bits left before the end of the buffer.
    pub fn remaining(&self) -> u64 {
        self.len_bits() - self.pos
    }

    pub fn is_eod(&self) -> bool {
        self.pos >= self.len_bits()
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Read `n` bits without advancing.
    pub fn peek(&self, n: u32) -> Result<u32, BitRangeError> {
        check_width(n)?;
        if u64::from(n) > self.remaining() {
            return Err(BitRangeError::OutOfBounds {
                requested: n,
                position: self.pos,
                len_bits: self.len_bits(),
            });
        }

        let mut value: u64 = 0;
        let mut pos = self.pos;
        let mut left = n;
        while left > 0 {
            let byte = u32::from(self.data[(pos / 8) as usize]);
            let avail = 8 - (pos % 8) as u32;
            let take = avail.min(left);
            let chunk = (byte >> (avail - take)) & ((1u32 << take) - 1);
            value = (value << take) | u64::from(chunk);
            pos += u64::from(take);
            left -= take;
        }
        Ok(value as u32)
    }

    /// Read `n` bits and advance past them.
    pub fn read(&mut self, n: u32) -> Result<u32, BitRangeError> {
        let value = self.peek(n)?;
        self.pos += u64::from(n);
        Ok(value)
    }
}

/// MSB-first bit accumulator.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    acc: u8,
    filled: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the low `n` bits of `value`, most significant first.
    pub fn write(&mut self, value: u32, n: u32) -> Result<(), BitRangeError> {
        check_width(n)?;
        for shift in (0..n).rev() {
            let bit = ((value >> shift) & 1) as u8;
            self.acc = (self.acc << 1) | bit;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.acc);
                self.acc = 0;
                self.filled = 0;
            }
        }
        Ok(())
    }

    /// Number of bits written so far, including flush padding.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64 * 8 + u64::from(self.filled)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pad the pending partial byte with zero bits.
    pub fn flush(&mut self) {
        if self.filled > 0 {
            self.bytes.push(self.acc << (8 - self.filled));
            self.acc = 0;
            self.filled = 0;
        }
    }

    /// Flush and return the written bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.flush();
        self.bytes
    }
}
