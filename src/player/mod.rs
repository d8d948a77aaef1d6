//! Playback driver: pulls chunks from a [`Mixer`] and writes them to a sink.
//!
//! # Example
//!
//! ```ignore
//! use tonemix::{player::{Player, PlaybackConfig, WavFileSink}, tracks::Track, waves::Tone};
//!
//! let mut track = Track::new("chord", 22_050);
//! for note in ["C4", "E4", "G4"] {
//!     track.add_waveform(0.0, Tone::new(note, 0.5, 22_050)?)?;
//! }
//!
//! Player::new(vec![track], PlaybackConfig::new().volume(0.3))?
//!     .play(|format| WavFileSink::create("chord.wav", format))?;
//! ```

#[cfg(feature = "device")]
mod device;
mod memory;
mod wav;

#[cfg(feature = "device")]
pub use device::DeviceSink;
pub use memory::MemorySink;
pub use wav::WavFileSink;

use tracing::{debug, info};

use crate::{
    error::Result,
    mixer::Mixer,
    sampler::Sampler,
    tracks::Track,
};

/// What a sink is asked to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFormat {
    pub bit_depth: u16,
    pub channels: u16,
    pub sample_rate: u32,
}

impl SinkFormat {
    /// Mono at `bit_depth` and `sample_rate`.
    pub fn mono(bit_depth: u16, sample_rate: u32) -> Self {
        Self {
            bit_depth,
            channels: 1,
            sample_rate,
        }
    }
}

/// Destination for quantized frame bytes.
///
/// `write` may block until the sink has room; that is the only backpressure
/// the driver sees.
pub trait OutputSink {
    fn write(&mut self, frames: &[u8]) -> Result<()>;

    /// Flush and release the sink. Called exactly once per session.
    fn close(&mut self) -> Result<()>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, frames: &[u8]) -> Result<()> {
        (**self).write(frames)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn write(&mut self, frames: &[u8]) -> Result<()> {
        (**self).write(frames)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaybackConfig {
    /// Output bit depth: 8, 16 or 24
    pub bit_depth: u16,
    /// Seconds of audio per chunk
    pub chunk_duration: f64,
    /// Master volume applied before quantization
    pub volume: f32,
}

impl PlaybackConfig {
    pub const DEFAULT_CHUNK_DURATION: f64 = 1.0;

    pub fn new() -> Self {
        Self {
            bit_depth: 8,
            chunk_duration: Self::DEFAULT_CHUNK_DURATION,
            volume: 1.0,
        }
    }

    pub fn bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = bit_depth;
        self
    }

    pub fn chunk_duration(mut self, seconds: f64) -> Self {
        self.chunk_duration = seconds;
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Totals for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackReport {
    pub chunks: usize,
    pub bytes: usize,
}

/// Plays one or more tracks.
#[derive(Debug)]
pub struct Player {
    track: Track,
    config: PlaybackConfig,
    sampler: Sampler,
}

impl Player {
    /// Merge `tracks` into one timeline. An empty list plays nothing.
    pub fn new(tracks: Vec<Track>, config: PlaybackConfig) -> Result<Self> {
        let sampler = Sampler::for_bit_depth(config.bit_depth)?;
        let track = Track::merge_all(tracks)?.unwrap_or_default();
        Ok(Self {
            track,
            config,
            sampler,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn format(&self) -> SinkFormat {
        SinkFormat::mono(self.config.bit_depth, self.track.sample_rate())
    }

    /// Open a sink with `open`, stream every chunk into it, and close it.
    ///
    /// The sink is closed on every path out, including a failure while
    /// mixing; the first error wins.
    pub fn play<S, F>(&self, open: F) -> Result<PlaybackReport>
    where
        S: OutputSink,
        F: FnOnce(SinkFormat) -> Result<S>,
    {
        let mixer = self.mixer()?;
        let format = self.format();

        info!(
            track = %self.track.name,
            waveforms = self.track.len(),
            sample_rate = format.sample_rate,
            bit_depth = format.bit_depth,
            "opening stream"
        );
        let mut sink = open(format)?;

        let streamed = stream(mixer, &mut sink);

        info!("closing stream");
        let closed = sink.close();

        let report = streamed?;
        closed?;
        info!(chunks = report.chunks, bytes = report.bytes, "playback finished");
        Ok(report)
    }

    fn mixer(&self) -> Result<Mixer<'_>> {
        Mixer::new(
            self.track.waveforms(),
            self.track.sample_rate(),
            self.sampler,
            self.config.chunk_duration,
            self.config.volume,
        )
    }
}

fn stream<S: OutputSink + ?Sized>(mixer: Mixer<'_>, sink: &mut S) -> Result<PlaybackReport> {
    let mut report = PlaybackReport::default();
    for chunk in mixer {
        let chunk = chunk?;
        sink.write(&chunk)?;
        report.chunks += 1;
        report.bytes += chunk.len();
        debug!(chunk = report.chunks, bytes = chunk.len(), "chunk written");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;
    use crate::error::Error;
    use crate::waves::{Tone, Waveform};

    #[test]
    fn plays_a_scale() {
        let mut track = Track::new("scale", 1_000);
        let notes = ["C5", "D5", "E5", "F5", "G5", "A5", "B5", "C6"];
        for (i, note) in notes.iter().enumerate() {
            track
                .add_waveform(i as f64 * 0.2, Tone::new(note, 0.2, 1_000).unwrap())
                .unwrap();
        }

        let player = Player::new(vec![track], PlaybackConfig::new()).unwrap();
        let mut sink = MemorySink::new();
        let report = player.play(|_| Ok(&mut sink)).unwrap();

        assert_eq!(report, PlaybackReport { chunks: 2, bytes: 2_000 });
        assert_eq!(sink.bytes().len(), 2_000);
        assert_eq!(sink.writes(), 2);
        assert!(sink.is_closed());
    }

    #[test]
    fn empty_track_opens_and_closes() {
        let player = Player::new(vec![Track::default()], PlaybackConfig::new()).unwrap();
        let mut sink = MemorySink::new();
        let report = player.play(|_| Ok(&mut sink)).unwrap();
        assert_eq!(report, PlaybackReport::default());
        assert!(sink.is_closed());
        assert!(sink.bytes().is_empty());
    }

    #[test]
    fn no_tracks_plays_nothing() {
        let player = Player::new(Vec::new(), PlaybackConfig::new()).unwrap();
        assert!(player.track().is_empty());
    }

    #[test]
    fn sink_format_follows_track_and_config() {
        let player =
            Player::new(vec![Track::new("", 44_100)], PlaybackConfig::new().bit_depth(16)).unwrap();
        assert_eq!(
            player.format(),
            SinkFormat {
                bit_depth: 16,
                channels: 1,
                sample_rate: 44_100
            }
        );
    }

    #[test]
    fn unsupported_bit_depth_fails_early() {
        assert!(matches!(
            Player::new(Vec::new(), PlaybackConfig::new().bit_depth(12)),
            Err(Error::UnsupportedFormat(12))
        ));
    }

    #[test]
    fn sink_is_closed_when_mixing_fails() {
        struct Failing;

        impl Waveform for Failing {
            fn duration(&self) -> f64 {
                3.0
            }

            fn sample_rate(&self) -> u32 {
                100
            }

            fn samples(&self, range: Range<usize>) -> Result<Vec<f32>> {
                if range.start >= 100 {
                    return Err(Error::Range {
                        start: range.start,
                        end: range.end,
                        len: 100,
                    });
                }
                Ok(vec![0.0; range.len()])
            }
        }

        let mut track = Track::new("broken", 100);
        track.add_waveform(0.0, Failing).unwrap();

        let player = Player::new(vec![track], PlaybackConfig::new()).unwrap();
        let mut sink = MemorySink::new();
        let err = player.play(|_| Ok(&mut sink)).unwrap_err();

        assert!(matches!(err, Error::Range { start: 100, .. }));
        assert!(sink.is_closed());
        assert_eq!(sink.writes(), 1);
    }

    #[test]
    fn open_failure_skips_playback() {
        let player = Player::new(vec![Track::default()], PlaybackConfig::new()).unwrap();
        let err = player
            .play(|_| -> Result<MemorySink> { Err(Error::Device("no device".into())) })
            .unwrap_err();
        assert!(matches!(err, Error::Device(_)));
    }
}
