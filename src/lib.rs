//! Tone synthesis and windowed mixing to 8, 16 and 24-bit PCM.
//!
//! Waveforms ([`waves::Tone`], [`waves::PcmFile`]) are placed on a
//! [`tracks::Track`] timeline. A [`mixer::Mixer`] walks that timeline in
//! fixed windows, sums whatever overlaps, and quantizes through a
//! [`sampler::Sampler`]. A [`player::Player`] feeds the resulting chunks to an
//! output sink.

pub mod error;
pub mod mixer; // Windowed collapse of overlapping waveforms
pub mod player; // Playback driver and output sinks
pub mod sampler; // Float to integer frame quantization
pub mod tracks; // Timelines and note authoring
pub mod waves; // Sample providers

pub use error::{Error, Result};

/// Sample rate used when none is given.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;
