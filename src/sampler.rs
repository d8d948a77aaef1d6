/*
Sample Quantization
===================

Mixed audio lives in f32 until the very last moment. The sampler turns each
float into an integer frame at a fixed bit depth:

    frame = round(value * multiplier + offset)

and clamps the result to the largest value the bit depth can hold. Only the
upper bound is clamped; a very negative sum quantizes to a negative integer.
Frames are serialized as their `bit_depth / 8` least-significant bytes,
least-significant byte first, so a negative frame lands in two's complement.

  depth   multiplier    offset   frame layout
  8-bit   127           128      unsigned, centered on 128
  16-bit  32767         128      signed little-endian
  24-bit  2^23 - 1      4096     signed little-endian

With these constants an 8-bit sampler maps -1.0 -> 1, 0.0 -> 128, 1.0 -> 255.

Wider depths keep the small positive offset, so their frames sit just above
the signed range at the top end. The ceiling is the unsigned 2^bits - 1, not
the signed maximum, so anything above roughly 0.9961 (16-bit) or 0.9995
(24-bit) quantizes past it and serializes as a near full-scale negative
frame:

    16-bit  convert(1.0) = 32895 = 0x807F  ->  bytes 7F 80  ->  reads back -32641

A full-volume tone therefore clicks at its peaks at 16 and 24 bits. Keep the
mix below those levels with the master volume.
*/

use crate::error::{Error, Result};

/// Float-to-integer quantization policy for one bit depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampler {
    bit_depth: u16,
    multiplier: f64,
    offset: i64,
    ceiling: i64,
}

impl Sampler {
    pub const EIGHT_BIT: Sampler = Sampler::new(8, ((1 << 7) - 1) as f64, 1 << 7);
    pub const SIXTEEN_BIT: Sampler = Sampler::new(16, ((1 << 15) - 1) as f64, 1 << 7);
    pub const TWENTY_FOUR_BIT: Sampler = Sampler::new(24, ((1 << 23) - 1) as f64, 1 << 12);

    const fn new(bit_depth: u16, multiplier: f64, offset: i64) -> Self {
        Self {
            bit_depth,
            multiplier,
            offset,
            ceiling: (1 << bit_depth) - 1,
        }
    }

    /// Look up the sampler for a bit depth (8, 16 or 24).
    pub fn for_bit_depth(bit_depth: u16) -> Result<Self> {
        match bit_depth {
            8 => Ok(Self::EIGHT_BIT),
            16 => Ok(Self::SIXTEEN_BIT),
            24 => Ok(Self::TWENTY_FOUR_BIT),
            other => Err(Error::UnsupportedFormat(other)),
        }
    }

    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bit_depth / 8)
    }

    /// Quantize one sample.
    #[inline]
    pub fn convert(&self, value: f32) -> i64 {
        let scaled = (f64::from(value) * self.multiplier + self.offset as f64).round();
        // Float-to-int casts saturate, so NaN becomes 0 and infinities pin to i64 bounds.
        (scaled as i64).min(self.ceiling)
    }

    /// Append the serialized frame for `frame` to `out`.
    #[inline]
    pub fn write_frame(&self, frame: i64, out: &mut Vec<u8>) {
        out.extend_from_slice(&frame.to_le_bytes()[..self.bytes_per_sample()]);
    }

    /// Quantize `value` and append its frame bytes to `out`.
    #[inline]
    pub fn encode(&self, value: f32, out: &mut Vec<u8>) {
        self.write_frame(self.convert(value), out);
    }

    /// Recover the integer frame from its serialized bytes.
    ///
    /// 8-bit frames are unsigned; wider frames are sign-extended.
    pub fn read_frame(&self, bytes: &[u8]) -> i64 {
        let width = self.bytes_per_sample().min(bytes.len());
        if width == 0 {
            return 0;
        }
        let mut raw = [0u8; 8];
        raw[..width].copy_from_slice(&bytes[..width]);
        let value = i64::from_le_bytes(raw);

        if self.bit_depth == 8 {
            value
        } else {
            let shift = 64 - 8 * width as u32;
            (value << shift) >> shift
        }
    }

    /// Invert a serialized frame back into a float sample.
    pub fn decode(&self, bytes: &[u8]) -> f32 {
        ((self.read_frame(bytes) - self.offset) as f64 / self.multiplier) as f32
    }
}
