/*
PCM File Source
===============

Plays back raw PCM from a fixed-layout container (the canonical 44-byte WAV
header). The header is read at fixed offsets rather than by walking chunks,
so files with extra chunks or an extended `fmt ` block are rejected.

  offset  len  field           required
  0       4    riff            "RIFF"
  4       4    file_size
  8       4    wave            "WAVE"
  12      4    fmt             "fmt "
  16      4    format_length   16
  20      2    format_type     1 (integer PCM)
  22      2    num_channels
  24      4    sample_rate
  28      4    bytes_per_sec
  32      2    sample_size
  34      2    bit_width
  36      4    data            "data"
  40      4    data_size
  44      ...  samples, little-endian signed, `bit_width / 8` bytes each

Amplitude
---------

By default samples come out as the raw integer scaled by 0.8, NOT normalized
to [-1, 1]. Tones are normalized, so mixing a tone with a file source at the
default amplitude lets the file dominate. `Amplitude::Normalized` divides by
the full-scale value of the file's bit width instead. 8-bit PCM is unsigned
and centred on 128, so in that mode its bytes are re-centred before scaling;
raw mode reads every width as signed.
*/

use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::debug;

use super::check_range;
use super::container::{FieldSpec, HeaderLayout, Literal};
use super::Waveform;
use crate::error::{FormatError, Result};

/// Fixed PCM container layout.
pub const PCM_LAYOUT: HeaderLayout = HeaderLayout::new(&[
    FieldSpec::text("riff", 0, 4).require(Literal::Text("RIFF")),
    FieldSpec::int("file_size", 4, 4),
    FieldSpec::text("wave", 8, 4).require(Literal::Text("WAVE")),
    FieldSpec::text("fmt", 12, 4).require(Literal::Text("fmt ")),
    FieldSpec::int("format_length", 16, 4).require(Literal::Int(16)),
    // 1 == PCM only
    FieldSpec::int("format_type", 20, 2).require(Literal::Int(1)),
    FieldSpec::int("num_channels", 22, 2),
    FieldSpec::int("sample_rate", 24, 4),
    // bytes per sample * channels * sample rate
    FieldSpec::int("bytes_per_sec", 28, 4),
    // bytes per sample * channels
    FieldSpec::int("sample_size", 32, 2),
    FieldSpec::int("bit_width", 34, 2),
    FieldSpec::text("data", 36, 4).require(Literal::Text("data")),
    FieldSpec::int("data_size", 40, 4),
]);

/// Start of the sample data.
pub const DATA_OFFSET: usize = 44;

/// Attenuation applied to raw file samples.
pub const ATTENUATION: f32 = 0.8;

/// How decoded integers are scaled into float samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Amplitude {
    /// `raw * 0.8`.
    #[default]
    Raw,
    /// `raw * 0.8 / full_scale`, comparable with tones. 8-bit data is
    /// re-centred from 128 to zero first.
    Normalized,
}

/// A waveform backed by an in-memory PCM container.
#[derive(Debug, Clone)]
pub struct PcmFile {
    data: Vec<u8>,
    sample_rate: u32,
    num_channels: u16,
    bit_width: u16,
    byte_width: usize,
    bytes_per_sec: u32,
    data_size: usize,
    duration: f64,
    amplitude: Amplitude,
}

impl PcmFile {
    /// Load and validate a container from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading pcm file");
        Self::from_bytes(fs::read(path)?)
    }

    /// Validate a container already in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        PCM_LAYOUT.validate(&data)?;

        let data_size = PCM_LAYOUT.int("data_size", &data)?;
        let bytes_per_sec = PCM_LAYOUT.int("bytes_per_sec", &data)?;
        let bit_width = PCM_LAYOUT.int("bit_width", &data)?;
        let sample_rate = PCM_LAYOUT.int("sample_rate", &data)?;
        let num_channels = PCM_LAYOUT.int("num_channels", &data)?;

        if bytes_per_sec == 0 || data_size % bytes_per_sec != 0 {
            return Err(FormatError::UnevenDataSize {
                data_size,
                bytes_per_sec,
            }
            .into());
        }

        if bit_width == 0 || bit_width % 8 != 0 {
            return Err(FormatError::UnalignedBitWidth(bit_width).into());
        }
        if bit_width > 64 {
            return Err(FormatError::BitWidthTooWide(bit_width).into());
        }

        // Header fields are at most four bytes wide, so these conversions are lossless.
        let data_size = data_size as usize;
        let available = data.len().saturating_sub(DATA_OFFSET);
        if available < data_size {
            return Err(FormatError::MissingData {
                declared: data_size,
                available,
            }
            .into());
        }

        let duration = data_size as f64 / bytes_per_sec as f64;
        debug!(
            sample_rate,
            bit_width, num_channels, data_size, duration, "parsed pcm header"
        );

        Ok(Self {
            data,
            sample_rate: sample_rate as u32,
            num_channels: num_channels as u16,
            bit_width: bit_width as u16,
            byte_width: (bit_width / 8) as usize,
            bytes_per_sec: bytes_per_sec as u32,
            data_size,
            duration,
            amplitude: Amplitude::Raw,
        })
    }

    /// Choose how samples are scaled.
    pub fn with_amplitude(mut self, amplitude: Amplitude) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn amplitude(&self) -> Amplitude {
        self.amplitude
    }

    pub fn bit_width(&self) -> u16 {
        self.bit_width
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    pub fn bytes_per_sec(&self) -> u32 {
        self.bytes_per_sec
    }

    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Raw signed sample at `index`.
    fn read_signed(&self, index: usize) -> Result<i64> {
        let start = DATA_OFFSET + index * self.byte_width;
        let end = start + self.byte_width;
        let bytes = self
            .data
            .get(start..end)
            .filter(|_| end <= DATA_OFFSET + self.data_size)
            .ok_or(FormatError::MissingData {
                declared: end - DATA_OFFSET,
                available: self.data_size,
            })?;

        let mut raw = [0u8; 8];
        raw[..self.byte_width].copy_from_slice(bytes);
        let shift = 64 - 8 * self.byte_width as u32;
        Ok((i64::from_le_bytes(raw) << shift) >> shift)
    }

    /// Sample `index` as an integer level. Normalized 8-bit data is unsigned
    /// around 128, so it is re-centred on zero first.
    fn level(&self, index: usize) -> Result<i64> {
        let raw = self.read_signed(index)?;
        match self.amplitude {
            Amplitude::Normalized if self.bit_width == 8 => Ok((raw & 0xff) - 128),
            _ => Ok(raw),
        }
    }

    fn scale(&self) -> f32 {
        match self.amplitude {
            Amplitude::Raw => ATTENUATION,
            Amplitude::Normalized => {
                let full_scale = (1u64 << (self.bit_width - 1)) as f32;
                ATTENUATION / full_scale
            }
        }
    }
}

impl Waveform for PcmFile {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn samples(&self, range: Range<usize>) -> Result<Vec<f32>> {
        check_range(&range, self.num_samples())?;

        let scale = self.scale();
        range
            .map(|i| self.level(i).map(|v| v as f32 * scale))
            .collect()
    }

    fn native_bit_depth(&self) -> Option<u16> {
        Some(self.bit_width)
    }
}
