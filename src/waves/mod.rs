//! Finite, sample-rate-bound sources of floating-point audio.
//!
//! Everything the mixer can play implements [`Waveform`]. The mixer only ever
//! asks a waveform for its length and for a contiguous run of samples, so a new
//! kind of source plugs in by implementing the trait.

/// Fixed-layout header reader used by file sources.
pub mod container;
/// Scientific pitch names to frequencies.
pub mod notes;
/// PCM samples decoded from a container file.
pub mod pcm;
/// Synthetic sine tones.
pub mod tone;

pub use pcm::{Amplitude, PcmFile};
pub use tone::Tone;

use std::ops::Range;

use crate::error::{Error, Result};

/// A unit of constant sound: a note, a rest or an audio snippet.
pub trait Waveform: Send {
    /// Length in seconds.
    fn duration(&self) -> f64;

    fn sample_rate(&self) -> u32;

    /// Number of samples, rounding down.
    fn num_samples(&self) -> usize {
        (self.duration() * f64::from(self.sample_rate())).floor() as usize
    }

    /// Samples `[range.start, range.end)`.
    ///
    /// Fails with [`Error::Range`] unless `start <= end <= num_samples`.
    fn samples(&self, range: Range<usize>) -> Result<Vec<f32>>;

    /// Bit depth this source was recorded at, if it has one.
    ///
    /// Sources with a native depth can only be mixed at that depth.
    fn native_bit_depth(&self) -> Option<u16> {
        None
    }
}

/// Allow boxed waveforms to be used as waveforms (for dynamic dispatch)
impl Waveform for Box<dyn Waveform> {
    fn duration(&self) -> f64 {
        (**self).duration()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn num_samples(&self) -> usize {
        (**self).num_samples()
    }

    fn samples(&self, range: Range<usize>) -> Result<Vec<f32>> {
        (**self).samples(range)
    }

    fn native_bit_depth(&self) -> Option<u16> {
        (**self).native_bit_depth()
    }
}

/// Reject ranges that run backwards or past the last sample.
pub(crate) fn check_range(range: &Range<usize>, len: usize) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(Error::Range {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}
