//! Fixed-width unsigned values packed into 64-bit words.
//!
//! The words form one continuous little-endian bit stream: bit 0 of word 0
//! comes first, bit 63 of word 0 is followed by bit 0 of word 1. Seen as
//! `(high, low)` halves, each word contributes its low half first, then its
//! high half, both least significant bit first. Every output value takes the
//! next `width` bits of the stream with the first bit as its bit 0, so values
//! may straddle word boundaries.

use retrograde_common::{Result, RetrogradeError};

pub use retrograde_nbt::text::{join_long, split_long};

pub const MAX_WIDTH: u32 = 32;

pub fn unpack_bits(words: &[i64], width: u32) -> Result<Vec<u32>> {
    if width == 0 || width > MAX_WIDTH {
        return Err(RetrogradeError::invalid_argument(format!(
            "bit width must be in 1..={}, got {}",
            MAX_WIDTH, width
        )));
    }

    let mask = (1u64 << width) - 1;
    let mut output = Vec::with_capacity(words.len() * 64 / width as usize);
    let mut pending: u128 = 0;
    let mut pending_bits = 0u32;

    for &word in words {
        pending |= (word as u64 as u128) << pending_bits;
        pending_bits += 64;
        while pending_bits >= width {
            output.push((pending as u64 & mask) as u32);
            pending >>= width;
            pending_bits -= width;
        }
    }

    Ok(output)
}

/// Same as [`unpack_bits`] for words supplied as signed `(high, low)` halves.
pub fn unpack_bit_pairs(pairs: &[(i32, i32)], width: u32) -> Result<Vec<u32>> {
    let words: Vec<i64> = pairs
        .iter()
        .map(|&(high, low)| join_long(high, low))
        .collect();
    unpack_bits(&words, width)
}
