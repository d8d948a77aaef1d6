//! Built-in demo songs.

use clap::ValueEnum;
use tonemix::{
    tracks::{Beats, NoteTrack, Track},
    waves::Tone,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Song {
    /// C major scale, up and back down
    Scale,
    /// I-IV-V-I progression, one track per voice
    Chords,
    /// Twinkle Twinkle over a walking bass
    Melody,
}

impl Song {
    pub fn tracks(self, sample_rate: u32) -> Result<Vec<Track>> {
        match self {
            Song::Scale => scale(sample_rate),
            Song::Chords => chords(sample_rate),
            Song::Melody => melody(sample_rate),
        }
    }
}

fn scale(sample_rate: u32) -> Result<Vec<Track>> {
    const UP: [&str; 8] = ["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"];

    let mut track = NoteTrack::new("scale", 160.0, sample_rate);
    track.append_notes(Beats::ONE, &UP)?;
    for note in UP.iter().rev().skip(1) {
        track.append_note(Beats::ONE, note)?;
    }
    Ok(vec![track.into_track()])
}

fn chords(sample_rate: u32) -> Result<Vec<Track>> {
    const PROGRESSION: [[&str; 3]; 4] = [
        ["C4", "E4", "G4"],
        ["F4", "A4", "C5"],
        ["G4", "B4", "D5"],
        ["C4", "E4", "G4"],
    ];
    const LENGTH: f64 = 1.0;

    let mut voices: Vec<Track> = (0..3)
        .map(|v| Track::new(format!("voice {v}"), sample_rate))
        .collect();
    for (i, chord) in PROGRESSION.iter().enumerate() {
        let time = i as f64 * LENGTH;
        for (voice, note) in voices.iter_mut().zip(chord) {
            voice.add_waveform(time, Tone::new(note, LENGTH, sample_rate)?)?;
        }
    }
    Ok(voices)
}

fn melody(sample_rate: u32) -> Result<Vec<Track>> {
    let mut lead = NoteTrack::new("lead", 100.0, sample_rate);
    lead.append_notes(Beats::HALF, &["C5", "C5", "G5", "G5", "A5", "A5"])?
        .append_note(Beats::ONE, "G5")?
        .append_notes(Beats::HALF, &["F5", "F5", "E5", "E5", "D5", "D5"])?
        .append_note(Beats::ONE, "C5")?;
    lead.append_rest(Beats::HALF);
    lead.append_note(Beats::DOTTED_HALF, "G5")?
        .append_note(Beats::QUARTER, "F5")?
        .append_note(Beats::ONE, "E5")?;

    let mut bass = NoteTrack::new("bass", 100.0, sample_rate);
    for note in ["C3", "E3", "F3", "C3", "G2", "B2", "C3", "REST", "C3"] {
        bass.append_note(Beats::ONE, note)?;
    }

    Ok(vec![lead.into_track(), bass.into_track()])
}
