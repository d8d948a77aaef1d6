//! Track - an ordered set of timed waveforms
//!
//! Entries stay sorted by start time at all times. The mixer relies on this to
//! stop scanning at the first entry that starts after its window.

use std::fmt;
use std::path::Path;

use crate::{
    error::{Result, ValidationError},
    waves::{PcmFile, Waveform},
    DEFAULT_SAMPLE_RATE,
};

/// A waveform with a start time in seconds.
pub struct TimedWaveform {
    time: f64,
    waveform: Box<dyn Waveform>,
}

impl TimedWaveform {
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn waveform(&self) -> &dyn Waveform {
        self.waveform.as_ref()
    }

    /// When this waveform stops sounding.
    pub fn end_time(&self) -> f64 {
        self.time + self.waveform.duration()
    }
}

impl fmt::Debug for TimedWaveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedWaveform")
            .field("time", &self.time)
            .field("duration", &self.waveform.duration())
            .finish()
    }
}

/// Waveforms on a shared timeline and sample rate
#[derive(Debug)]
pub struct Track {
    /// Display name
    pub name: String,
    sample_rate: u32,
    waveforms: Vec<TimedWaveform>,
}

impl Track {
    /// Create an empty track at `sample_rate`.
    pub fn new(name: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            sample_rate,
            waveforms: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Entries sorted by start time.
    pub fn waveforms(&self) -> &[TimedWaveform] {
        &self.waveforms
    }

    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    /// End of the last sounding waveform.
    pub fn duration(&self) -> f64 {
        self.waveforms
            .iter()
            .map(TimedWaveform::end_time)
            .fold(0.0, f64::max)
    }

    /// Add a waveform starting at `time` seconds.
    ///
    /// Entries with equal start times keep their insertion order.
    pub fn add_waveform<W: Waveform + 'static>(&mut self, time: f64, waveform: W) -> Result<()> {
        self.add_boxed(time, Box::new(waveform))
    }

    pub fn add_boxed(&mut self, time: f64, waveform: Box<dyn Waveform>) -> Result<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(ValidationError::NegativeTime(time).into());
        }

        if waveform.sample_rate() != self.sample_rate {
            return Err(ValidationError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: waveform.sample_rate(),
            }
            .into());
        }

        self.insert(TimedWaveform { time, waveform });
        Ok(())
    }

    /// Load a PCM container from disk and add it at `time`.
    pub fn add_pcm_file(&mut self, time: f64, path: impl AsRef<Path>) -> Result<()> {
        self.add_waveform(time, PcmFile::open(path)?)
    }

    fn insert(&mut self, entry: TimedWaveform) {
        // Upper bound keeps ties in insertion order.
        let idx = self.waveforms.partition_point(|w| w.time <= entry.time);
        self.waveforms.insert(idx, entry);
    }

    /// Combine two tracks with the same sample rate.
    ///
    /// For equal start times, entries from `self` come before entries from `other`.
    pub fn merge(mut self, other: Track) -> Result<Self> {
        if self.sample_rate != other.sample_rate {
            return Err(ValidationError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: other.sample_rate,
            }
            .into());
        }

        self.waveforms.reserve(other.waveforms.len());
        for entry in other.waveforms {
            self.insert(entry);
        }
        Ok(self)
    }

    /// Fold many tracks into one, left to right. `None` for no tracks.
    pub fn merge_all<I>(tracks: I) -> Result<Option<Track>>
    where
        I: IntoIterator<Item = Track>,
    {
        let mut tracks = tracks.into_iter();
        let Some(first) = tracks.next() else {
            return Ok(None);
        };
        tracks.try_fold(first, Track::merge).map(Some)
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new("", DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;
    use crate::error::Error;
    use crate::waves::Tone;

    /// One second of nothing, tagged so ordering can be checked.
    struct Marker {
        tag: char,
        sample_rate: u32,
    }

    impl Marker {
        fn new(tag: char) -> Self {
            Self {
                tag,
                sample_rate: DEFAULT_SAMPLE_RATE,
            }
        }
    }

    impl Waveform for Marker {
        fn duration(&self) -> f64 {
            1.0
        }

        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn samples(&self, range: Range<usize>) -> Result<Vec<f32>> {
            // Encode the tag so tests can tell entries apart after boxing.
            Ok(vec![self.tag as u32 as f32; range.len()])
        }
    }

    fn tags(track: &Track) -> Vec<(f64, char)> {
        track
            .waveforms()
            .iter()
            .map(|w| {
                let tag = w.waveform().samples(0..1).unwrap()[0] as u32;
                (w.time(), char::from_u32(tag).unwrap())
            })
            .collect()
    }

    #[test]
    fn track_order() {
        let mut track = Track::default();
        track.add_waveform(3.0, Marker::new('a')).unwrap();
        track.add_waveform(1.0, Marker::new('b')).unwrap();
        track.add_waveform(2.0, Marker::new('a')).unwrap();
        track.add_waveform(6.0, Marker::new('b')).unwrap();
        track.add_waveform(4.0, Marker::new('a')).unwrap();

        assert_eq!(
            tags(&track),
            vec![(1.0, 'b'), (2.0, 'a'), (3.0, 'a'), (4.0, 'a'), (6.0, 'b')]
        );
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut track = Track::default();
        track.add_waveform(1.0, Marker::new('x')).unwrap();
        track.add_waveform(0.0, Marker::new('a')).unwrap();
        track.add_waveform(0.0, Marker::new('b')).unwrap();
        track.add_waveform(0.0, Marker::new('c')).unwrap();

        assert_eq!(
            tags(&track),
            vec![(0.0, 'a'), (0.0, 'b'), (0.0, 'c'), (1.0, 'x')]
        );
    }

    #[test]
    fn simultaneous_waveforms() {
        let mut track = Track::default();
        track.add_waveform(0.0, Marker::new('a')).unwrap();
        track.add_waveform(0.0, Marker::new('b')).unwrap();
        assert_eq!(track.len(), 2);
    }

    #[test]
    fn negative_time_is_rejected() {
        let mut track = Track::default();
        let err = track.add_waveform(-0.1, Marker::new('a')).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NegativeTime(_))
        ));
        assert!(track
            .add_waveform(f64::NAN, Marker::new('a'))
            .is_err());
        assert!(track.is_empty());
    }

    #[test]
    fn mismatched_sample_rate() {
        let mut track = Track::new("", 20_000);
        let wave = Tone::new("C4", 1.0, 10_000).unwrap();
        assert!(matches!(
            track.add_waveform(0.0, wave),
            Err(Error::Validation(ValidationError::SampleRateMismatch {
                expected: 20_000,
                actual: 10_000
            }))
        ));
    }

    #[test]
    fn merge_interleaves_by_time() {
        let mut left = Track::new("left", DEFAULT_SAMPLE_RATE);
        left.add_waveform(0.0, Marker::new('a')).unwrap();
        left.add_waveform(2.0, Marker::new('c')).unwrap();

        let mut right = Track::new("right", DEFAULT_SAMPLE_RATE);
        right.add_waveform(0.0, Marker::new('x')).unwrap();
        right.add_waveform(1.0, Marker::new('b')).unwrap();

        let merged = left.merge(right).unwrap();
        assert_eq!(merged.name, "left");
        assert_eq!(
            tags(&merged),
            vec![(0.0, 'a'), (0.0, 'x'), (1.0, 'b'), (2.0, 'c')]
        );
    }

    #[test]
    fn merge_requires_equal_rates() {
        let left = Track::new("left", 22_050);
        let right = Track::new("right", 44_100);
        assert!(matches!(
            left.merge(right),
            Err(Error::Validation(ValidationError::SampleRateMismatch { .. }))
        ));
    }

    #[test]
    fn merge_all() {
        assert!(Track::merge_all(Vec::new()).unwrap().is_none());

        let tracks = (0..3).map(|i| {
            let mut t = Track::default();
            t.add_waveform(i as f64, Marker::new('m')).unwrap();
            t
        });
        let merged = Track::merge_all(tracks).unwrap().unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.duration(), 3.0);
    }
}
