use super::{Beats, Track};
use crate::{error::Result, waves::Tone};

/// Builds a melody one note at a time at a fixed tempo.
///
/// Each appended note starts where the previous one ended.
#[derive(Debug)]
pub struct NoteTrack {
    track: Track,
    /// Tempo in beats per minute
    tempo: f64,
    /// Where the next note starts, in seconds
    cursor: f64,
}

impl NoteTrack {
    pub fn new(name: impl Into<String>, tempo: f64, sample_rate: u32) -> Self {
        Self {
            track: Track::new(name, sample_rate),
            tempo,
            cursor: 0.0,
        }
    }

    /// Append `note` lasting `beats` at the cursor.
    pub fn append_note(&mut self, beats: impl Into<Beats>, note: &str) -> Result<&mut Self> {
        let duration = beats.into().to_seconds(self.tempo);
        let tone = Tone::new(note, duration, self.track.sample_rate())?;
        self.track.add_waveform(self.cursor, tone)?;
        self.cursor += duration;
        Ok(self)
    }

    /// Append several notes of the same length.
    pub fn append_notes(&mut self, beats: impl Into<Beats>, notes: &[&str]) -> Result<&mut Self> {
        let beats = beats.into();
        for note in notes {
            self.append_note(beats, note)?;
        }
        Ok(self)
    }

    /// Leave a silent gap without adding a waveform.
    pub fn append_rest(&mut self, beats: impl Into<Beats>) -> &mut Self {
        self.cursor += beats.into().to_seconds(self.tempo);
        self
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn into_track(self) -> Track {
        self.track
    }
}
