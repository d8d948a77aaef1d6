/*
Note Name Table
===============

Tones are requested by scientific pitch name: a letter, an optional
accidental and an octave digit.

Naming Convention:
- Natural notes: C4, D4, E4, etc.
- Sharps: C#4, D#4, F#4, G#4, A#4
- Flats: Db4, Eb4, Gb4, Ab4, Bb4 (the same pitches as the sharps)
- "REST" is silence (0 Hz)

Octave Range:
- C0 (16.35 Hz) to B8 (7902.13 Hz)

Only black keys take an accidental, so names like E#4, Cb3 or A##5 are not in
the table. Frequencies follow equal temperament around A4 = 440 Hz,

    freq = 440 * 2^((midi - 69) / 12),  midi = 12 * (octave + 1) + semitone

rounded to two decimals, which is how printed frequency charts list them.
*/

/// Name of the silent entry.
pub const REST: &str = "REST";

pub const LOWEST_OCTAVE: u8 = 0;
pub const HIGHEST_OCTAVE: u8 = 8;

/// Resolve a note name to its frequency in Hz. `"REST"` is 0 Hz.
pub fn frequency(name: &str) -> Option<f64> {
    if name == REST {
        return Some(0.0);
    }
    midi_number(name).map(midi_to_frequency)
}

/// The MIDI note number for a pitched name, `None` for rests and unknowns.
pub fn midi_number(name: &str) -> Option<u8> {
    let bytes = name.as_bytes();
    let (pitch, octave) = match bytes {
        [letter, octave] => (semitone(*letter, None)?, *octave),
        [letter, accidental, octave] => (semitone(*letter, Some(*accidental))?, *octave),
        _ => return None,
    };

    if !octave.is_ascii_digit() {
        return None;
    }
    let octave = octave - b'0';
    if !(LOWEST_OCTAVE..=HIGHEST_OCTAVE).contains(&octave) {
        return None;
    }

    Some(12 * (octave + 1) + pitch)
}

fn semitone(letter: u8, accidental: Option<u8>) -> Option<u8> {
    let natural = match letter {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return None,
    };

    match accidental {
        None => Some(natural),
        Some(b'#') if matches!(letter, b'C' | b'D' | b'F' | b'G' | b'A') => Some(natural + 1),
        Some(b'b') if matches!(letter, b'D' | b'E' | b'G' | b'A' | b'B') => Some(natural - 1),
        Some(_) => None,
    }
}

fn midi_to_frequency(note: u8) -> f64 {
    let exact = 440.0 * 2.0_f64.powf((f64::from(note) - 69.0) / 12.0);
    (exact * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a440_is_69() {
        assert_eq!(midi_number("A4"), Some(69));
        assert_eq!(frequency("A4"), Some(440.0));
    }

    #[test]
    fn middle_c_is_60() {
        assert_eq!(midi_number("C4"), Some(60));
        assert_eq!(frequency("C4"), Some(261.63));
    }

    #[test]
    fn chart_values() {
        assert_eq!(frequency("F0"), Some(21.83));
        assert_eq!(frequency("Ab1"), Some(51.91));
        assert_eq!(frequency("C0"), Some(16.35));
        assert_eq!(frequency("B8"), Some(7902.13));
    }

    #[test]
    fn sharps_and_flats_are_equal() {
        assert_eq!(frequency("C#4"), frequency("Db4"));
        assert_eq!(frequency("F#2"), frequency("Gb2"));
        assert_eq!(frequency("A#3"), frequency("Bb3"));
    }

    #[test]
    fn octaves_are_12_apart() {
        let c4 = midi_number("C4").unwrap();
        let c5 = midi_number("C5").unwrap();
        assert_eq!(c5 - c4, 12);
    }

    #[test]
    fn rest_is_silent() {
        assert_eq!(frequency("REST"), Some(0.0));
        assert_eq!(midi_number("REST"), None);
    }

    #[test]
    fn unknown_names() {
        for name in ["", "A##5", "E#4", "Cb3", "C9", "H4", "a4", "A-1", "C#", "REST "] {
            assert_eq!(frequency(name), None, "{name:?} should not resolve");
        }
    }
}
