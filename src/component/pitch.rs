//! Pitch conversion (`Mtof`).

/// Convert a MIDI note number to frequency in Hz.
///
/// Standard tuning: A4 (MIDI 69) = 440 Hz.
pub fn midi_to_freq(note: i64) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_69_is_440() {
        assert!((midi_to_freq(69) - 440.0).abs() < 0.01);
    }

    #[test]
    fn midi_60_is_middle_c() {
        assert!((midi_to_freq(60) - 261.63).abs() < 0.1);
    }

    #[test]
    fn octave_doubles_frequency() {
        let f1 = midi_to_freq(57);
        let f2 = midi_to_freq(69);
        assert!((f2 / f1 - 2.0).abs() < 1e-6);
    }

    #[test]
    fn low_notes_are_low() {
        let f = midi_to_freq(0);
        assert!(f > 0.0 && f < 10.0);
    }
}
