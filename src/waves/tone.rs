use std::f64::consts::TAU;
use std::ops::Range;

use super::{check_range, notes, Waveform};
use crate::error::{Result, ValidationError};

/// A single note rendered as a plain sine wave. No envelope, no harmonics.
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    note: String,
    frequency: f64,
    duration: f64,
    sample_rate: u32,
}

impl Tone {
    /// Create a tone for `note` (e.g. `"C5"`, `"A#3"`, `"REST"`).
    pub fn new(note: &str, duration: f64, sample_rate: u32) -> Result<Self> {
        let frequency =
            notes::frequency(note).ok_or_else(|| ValidationError::UnknownNote(note.to_owned()))?;
        Self::with_frequency(note, frequency, duration, sample_rate)
    }

    /// Silence lasting `duration` seconds.
    pub fn rest(duration: f64, sample_rate: u32) -> Result<Self> {
        Self::new(notes::REST, duration, sample_rate)
    }

    fn with_frequency(note: &str, frequency: f64, duration: f64, sample_rate: u32) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ValidationError::NegativeDuration(duration).into());
        }

        Ok(Self {
            note: note.to_owned(),
            frequency,
            duration,
            sample_rate,
        })
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl Waveform for Tone {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn samples(&self, range: Range<usize>) -> Result<Vec<f32>> {
        check_range(&range, self.num_samples())?;

        let step = TAU * self.frequency / f64::from(self.sample_rate);
        Ok(range.map(|t| (step * t as f64).sin() as f32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn invalid_note() {
        let err = Tone::new("A##5", 1.0, 22_050).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnknownNote(ref n)) if n == "A##5"
        ));
        assert!(err.to_string().ends_with("is not a valid note"));
    }

    #[test]
    fn correct_freq() {
        assert_eq!(Tone::new("F0", 1.0, 22_050).unwrap().frequency(), 21.83);
        assert_eq!(Tone::new("Ab1", 1.0, 22_050).unwrap().frequency(), 51.91);
    }

    #[test]
    fn num_samples_rounds_down() {
        let sample_rate = 100;
        assert_eq!(Tone::new("F0", 1.0, sample_rate).unwrap().num_samples(), 100);
        assert_eq!(Tone::new("F0", 1.5, sample_rate).unwrap().num_samples(), 150);
        assert_eq!(Tone::new("F0", 2.0, sample_rate).unwrap().num_samples(), 200);
        assert_eq!(Tone::new("F0", 0.019, sample_rate).unwrap().num_samples(), 1);
    }

    #[test]
    fn get_samples() {
        let sample_rate = 1000;

        let tone = Tone::new("F0", 1.0, sample_rate).unwrap();
        assert_eq!(tone.samples(0..tone.num_samples()).unwrap().len(), 1000);

        let tone = Tone::new("F0", 2.0, sample_rate).unwrap();
        assert_eq!(tone.samples(0..tone.num_samples()).unwrap().len(), 2000);

        let err = tone.samples(0..tone.num_samples() + 1).unwrap_err();
        assert!(matches!(err, Error::Range { end: 2001, len: 2000, .. }));

        #[allow(clippy::reversed_empty_ranges)]
        let backwards = tone.samples(10..5);
        assert!(backwards.is_err());
    }

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000;
        let tone = Tone::new("A4", 0.01, sample_rate).unwrap();
        let samples = tone.samples(0..tone.num_samples()).unwrap();

        // sample n should be sin(2pi f n / sr), where f = 440Hz
        let sample_index = 12;
        let expected = (TAU * 440.0 * sample_index as f64 / f64::from(sample_rate)).sin() as f32;
        let actual = samples[sample_index];
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn offset_ranges_continue_the_phase() {
        let tone = Tone::new("C5", 0.1, 8_000).unwrap();
        let whole = tone.samples(0..800).unwrap();
        let tail = tone.samples(300..800).unwrap();
        assert_eq!(&whole[300..], &tail[..]);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let tone = Tone::new("A#3", 0.5, 22_050).unwrap();
        let first = tone.samples(0..tone.num_samples()).unwrap();
        let second = tone.samples(0..tone.num_samples()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rest_is_silence() {
        let rest = Tone::rest(0.25, 1_000).unwrap();
        assert_eq!(rest.frequency(), 0.0);
        assert!(rest.samples(0..250).unwrap().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn negative_duration_is_rejected() {
        assert!(matches!(
            Tone::new("C4", -0.5, 22_050),
            Err(Error::Validation(ValidationError::NegativeDuration(_)))
        ));
    }
}
