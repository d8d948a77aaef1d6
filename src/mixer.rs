//! Windowed mixing of timed waveforms into quantized chunks.

/*
Windowed Collapsing
===================

Playback walks a virtual clock forward in fixed steps. Each step "collapses"
every waveform that overlaps the window [t0, t0 + chunk) into one buffer of
frames.

Vocabulary
----------

  window        The half-open time span [t0, t0 + chunk) one call renders.

  chunk offset  Where in the window's buffer a waveform starts writing. Zero
                unless the waveform starts inside the window.

  wave offset   Which of the waveform's own samples lands at the chunk offset.
                Zero unless the waveform started before the window.


Selection
---------

Entries are sorted by start time, so the scan can stop early:

    time ──────────────────────────────────────────────────→
              t0                t0 + chunk
              │                     │
    [──A──]   │                     │          A ends before t0: skipped
         [────┼──B──]               │          B overlaps: selected
              │   [──C──]           │          C inside: selected
              │                [────┼──D──]    D starts inside: selected
              │                     │  [──E──] E starts after: scan stops

Nothing selected AND the scan ran off the end of the list means playback is
over. Nothing selected but the scan stopped early is a quiet stretch before a
later waveform, and renders as a silent chunk.


Accumulation
------------

    chunk_offset = max(0, round((time - t0) * sample_rate))
    wave_offset  = max(0, round((t0 - time) * sample_rate))
    wave_end     = min(num_samples, wave_offset + buffer_len - chunk_offset)

Samples [wave_offset, wave_end) are added into the buffer at chunk_offset.
Overlapping waveforms simply sum; chords get louder with every voice and
anything past full scale is left for the sampler to clamp.
*/

use tracing::debug;

use crate::{
    error::{Result, ValidationError},
    sampler::Sampler,
    tracks::TimedWaveform,
};

/// Slack allowed when checking that a chunk holds a whole number of frames.
const FRAME_TOLERANCE: f64 = 1e-6;

/// Lifecycle of a mixing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerState {
    /// More waveforms may still contribute.
    Active,
    /// The cursor is past every waveform.
    Done,
}

/// Result of scanning for waveforms that overlap a window.
#[derive(Debug)]
pub struct Selection<'a> {
    /// Overlapping entries, in track order.
    pub waves: Vec<&'a TimedWaveform>,
    /// How many entries were examined, including the one that stopped the scan.
    pub scanned: usize,
    /// Whether the scan ran off the end of the list.
    pub reached_end: bool,
}

/// Turns a track's sorted waveforms into chunks of frame bytes
pub struct Mixer<'a> {
    waveforms: &'a [TimedWaveform],
    sample_rate: u32,
    sampler: Sampler,
    chunk_duration: f64,
    volume: f32,
    chunk_index: u64,
    state: MixerState,
}

impl<'a> Mixer<'a> {
    /// Borrow `waveforms` (sorted by start time) for one session.
    ///
    /// `chunk_duration` must cover a whole number of frames at `sample_rate`.
    /// Every source with a native bit depth must match the sampler's.
    pub fn new(
        waveforms: &'a [TimedWaveform],
        sample_rate: u32,
        sampler: Sampler,
        chunk_duration: f64,
        volume: f32,
    ) -> Result<Self> {
        if !chunk_duration.is_finite() || chunk_duration <= 0.0 {
            return Err(ValidationError::InvalidChunkDuration(chunk_duration).into());
        }

        // Chunks advance by exactly the frames they emit, or seams repeat samples.
        let frames = f64::from(sample_rate) * chunk_duration;
        if (frames - frames.round()).abs() > FRAME_TOLERANCE {
            return Err(ValidationError::FractionalChunk {
                chunk_duration,
                sample_rate,
            }
            .into());
        }

        for entry in waveforms {
            if let Some(bits) = entry.waveform().native_bit_depth() {
                if bits != sampler.bit_depth() {
                    return Err(ValidationError::BitDepthMismatch {
                        source_bits: bits,
                        output_bits: sampler.bit_depth(),
                    }
                    .into());
                }
            }
        }

        debug_assert!(
            waveforms.windows(2).all(|w| w[0].time() <= w[1].time()),
            "waveforms must be sorted by start time"
        );

        Ok(Self {
            waveforms,
            sample_rate,
            sampler,
            chunk_duration,
            volume,
            chunk_index: 0,
            state: MixerState::Active,
        })
    }

    pub fn state(&self) -> MixerState {
        self.state
    }

    pub fn sampler(&self) -> Sampler {
        self.sampler
    }

    pub fn chunk_duration(&self) -> f64 {
        self.chunk_duration
    }

    /// Start of the next window.
    pub fn cursor(&self) -> f64 {
        self.chunk_index as f64 * self.chunk_duration
    }

    /// Samples in a window of `duration` seconds.
    pub fn chunk_len(&self, duration: f64) -> usize {
        (f64::from(self.sample_rate) * duration).round() as usize
    }

    /// Find the entries that overlap `[t0, t0 + duration)`.
    pub fn select(&self, t0: f64, duration: f64) -> Selection<'a> {
        let window_end = t0 + duration;
        let mut waves = Vec::new();
        let mut scanned = 0;
        let mut reached_end = true;

        for entry in self.waveforms {
            scanned += 1;
            if entry.end_time() < t0 {
                continue;
            }
            if entry.time() >= window_end {
                reached_end = false;
                break;
            }
            waves.push(entry);
        }

        Selection {
            waves,
            scanned,
            reached_end,
        }
    }

    /// Mix the window `[t0, t0 + duration)` at `volume` into frame bytes.
    ///
    /// Returns `None` once no waveform is left at or after `t0`.
    pub fn collapse(&self, t0: f64, duration: f64, volume: f32) -> Result<Option<Vec<u8>>> {
        let selection = self.select(t0, duration);
        debug!(
            t0,
            selected = selection.waves.len(),
            scanned = selection.scanned,
            "collapsing interval"
        );

        if selection.waves.is_empty() && selection.reached_end {
            return Ok(None);
        }

        let mut buffer = vec![0.0f32; self.chunk_len(duration)];
        let rate = f64::from(self.sample_rate);

        for entry in selection.waves {
            let wave = entry.waveform();
            let chunk_offset = ((entry.time() - t0) * rate).round().max(0.0) as usize;
            let wave_offset = ((t0 - entry.time()) * rate).round().max(0.0) as usize;
            let room = buffer.len().saturating_sub(chunk_offset);
            let wave_end = wave.num_samples().min(wave_offset + room);

            if wave_end <= wave_offset {
                continue;
            }

            debug!(
                time = entry.time(),
                start = wave_offset,
                end = wave_end,
                chunk_offset,
                "mixing waveform"
            );

            let samples = wave.samples(wave_offset..wave_end)?;
            sum_in_place(&mut buffer[chunk_offset..chunk_offset + samples.len()], &samples);
        }

        let mut frames = Vec::with_capacity(buffer.len() * self.sampler.bytes_per_sample());
        for value in buffer {
            self.sampler.encode(volume * value, &mut frames);
        }
        Ok(Some(frames))
    }

    /// Render the window at the cursor and advance it.
    ///
    /// After the first `None` (or error) the mixer is `Done` and keeps
    /// returning `None`.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.state == MixerState::Done {
            return Ok(None);
        }

        match self.collapse(self.cursor(), self.chunk_duration, self.volume) {
            Ok(Some(frames)) => {
                self.chunk_index += 1;
                Ok(Some(frames))
            }
            other => {
                self.state = MixerState::Done;
                other
            }
        }
    }
}

impl Iterator for Mixer<'_> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Add signal B into signal A in-place (summing).
///
/// ⚠️ WARNING: Can exceed [-1.0, +1.0] range!
#[inline]
fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}
