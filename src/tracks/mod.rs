//! Timelines of waveforms.
//!
//! A [`Track`] owns its waveforms and keeps them sorted by start time.
//! [`NoteTrack`] layers a tempo and a write cursor on top for authoring
//! melodies note by note.

pub mod beats;
pub mod note_track;
pub mod track;

pub use beats::Beats;
pub use note_track::NoteTrack;
pub use track::{TimedWaveform, Track};
