//! Tone enumeration for the instrument selector registers.
//!
//! The device identifies a tone by a (bank, program) byte pair. The pairs
//! below are the 36 tones selectable from the panel of the FP/RP series;
//! firmware is free to report combinations outside this table, which map to
//! [`Instrument::Unknown`] instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A selectable tone, or `Unknown` for unmapped bank/program pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instrument {
    GrandPiano1,
    GrandPiano2,
    GrandPiano3,
    GrandPiano4,
    RagtimePiano,
    Harpsichord1,
    Harpsichord2,
    EPiano1,
    EPiano2,
    EPiano3,
    Clav,
    Vibraphone,
    Celesta,
    SynthBell,
    Strings1,
    Strings2,
    Harp,
    JazzOrgan1,
    JazzOrgan2,
    ChurchOrgan1,
    ChurchOrgan2,
    Accordion,
    Choir1,
    JazzScat,
    Choir2,
    Choir3,
    SynthPad,
    NylonStrGtr,
    SteelStrGtr,
    DecayStrings,
    DecayChoir,
    DecayChoirPad,
    AcousticBass,
    AcousticBassCymbal,
    FingeredBass,
    ThumVoice,
    Unknown,
}

struct ToneEntry {
    instrument: Instrument,
    name: &'static str,
    bank: u8,
    program: u8,
}

const fn tone(instrument: Instrument, name: &'static str, bank: u8, program: u8) -> ToneEntry {
    ToneEntry {
        instrument,
        name,
        bank,
        program,
    }
}

/// Panel tones; `Unknown` deliberately has no row.
const TONES: [ToneEntry; 36] = [
    tone(Instrument::GrandPiano1, "Grand Piano 1", 0, 0),
    tone(Instrument::GrandPiano2, "Grand Piano 2", 0, 1),
    tone(Instrument::GrandPiano3, "Grand Piano 3", 0, 2),
    tone(Instrument::GrandPiano4, "Grand Piano 4", 0, 3),
    tone(Instrument::RagtimePiano, "Ragtime Piano", 0, 4),
    tone(Instrument::Harpsichord1, "Harpsichord 1", 0, 5),
    tone(Instrument::Harpsichord2, "Harpsichord 2", 0, 6),
    tone(Instrument::EPiano1, "E. Piano 1", 1, 0),
    tone(Instrument::EPiano2, "E. Piano 2", 1, 1),
    tone(Instrument::EPiano3, "E. Piano 3", 1, 2),
    tone(Instrument::Clav, "Clav", 1, 3),
    tone(Instrument::Vibraphone, "Vibraphone", 1, 4),
    tone(Instrument::Celesta, "Celesta", 1, 5),
    tone(Instrument::SynthBell, "Synth Bell", 1, 6),
    tone(Instrument::Strings1, "Strings 1", 2, 0),
    tone(Instrument::Strings2, "Strings 2", 2, 1),
    tone(Instrument::Harp, "Harp", 2, 2),
    tone(Instrument::JazzOrgan1, "Jazz Organ 1", 2, 3),
    tone(Instrument::JazzOrgan2, "Jazz Organ 2", 2, 4),
    tone(Instrument::ChurchOrgan1, "Church Organ 1", 2, 5),
    tone(Instrument::ChurchOrgan2, "Church Organ 2", 2, 6),
    tone(Instrument::Accordion, "Accordion", 2, 7),
    tone(Instrument::Choir1, "Choir 1", 2, 8),
    tone(Instrument::JazzScat, "Jazz Scat", 2, 9),
    tone(Instrument::Choir2, "Choir 2", 2, 10),
    tone(Instrument::Choir3, "Choir 3", 2, 11),
    tone(Instrument::SynthPad, "Synth Pad", 2, 12),
    tone(Instrument::NylonStrGtr, "Nylon Str. Guitar", 2, 13),
    tone(Instrument::SteelStrGtr, "Steel Str. Guitar", 2, 14),
    tone(Instrument::DecayStrings, "Decay Strings", 2, 15),
    tone(Instrument::DecayChoir, "Decay Choir", 2, 16),
    tone(Instrument::DecayChoirPad, "Decay Choir Pad", 2, 17),
    tone(Instrument::AcousticBass, "Acoustic Bass", 2, 18),
    tone(Instrument::AcousticBassCymbal, "Acoustic Bass + Cymbal", 2, 19),
    tone(Instrument::FingeredBass, "Fingered Bass", 2, 20),
    tone(Instrument::ThumVoice, "Thum Voice", 2, 21),
];

impl Instrument {
    /// Resolve a (bank, program) pair reported by the device. Unmapped
    /// pairs yield `Unknown`, never an error.
    pub fn from_parts(bank: u8, program: u8) -> Self {
        TONES
            .iter()
            .find(|t| t.bank == bank && t.program == program)
            .map(|t| t.instrument)
            .unwrap_or(Instrument::Unknown)
    }

    /// The (bank, program) pair for this tone; `None` for `Unknown`.
    pub fn bank_program(self) -> Option<(u8, u8)> {
        TONES
            .iter()
            .find(|t| t.instrument == self)
            .map(|t| (t.bank, t.program))
    }

    /// Panel label for this tone.
    pub fn as_str(self) -> &'static str {
        TONES
            .iter()
            .find(|t| t.instrument == self)
            .map(|t| t.name)
            .unwrap_or("Unknown")
    }

    /// Match a tone by name, ignoring case and punctuation, so
    /// `"Grand Piano 2"`, `"grand-piano-2"` and `"grandpiano2"` all hit.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        TONES
            .iter()
            .find(|t| normalize(t.name) == wanted)
            .map(|t| t.instrument)
    }

    /// All panel tones, in bank/program order.
    pub fn all() -> impl Iterator<Item = Instrument> {
        TONES.iter().map(|t| t.instrument)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_from_parts_known() {
        assert_eq!(Instrument::from_parts(0, 1), Instrument::GrandPiano2);
        assert_eq!(Instrument::GrandPiano2.to_string(), "Grand Piano 2");
        assert_eq!(Instrument::from_parts(2, 21), Instrument::ThumVoice);
    }

    #[test]
    fn test_from_parts_unmapped() {
        assert_eq!(Instrument::from_parts(9, 9), Instrument::Unknown);
        assert_eq!(Instrument::from_parts(0, 7), Instrument::Unknown);
    }

    #[test]
    fn test_bank_program_round_trip() {
        for instrument in Instrument::all() {
            let (bank, program) = instrument.bank_program().unwrap();
            assert_eq!(Instrument::from_parts(bank, program), instrument);
        }
        assert_eq!(Instrument::Unknown.bank_program(), None);
    }

    #[test]
    fn test_pairs_unique() {
        let pairs: HashSet<(u8, u8)> = TONES.iter().map(|t| (t.bank, t.program)).collect();
        assert_eq!(pairs.len(), TONES.len());
    }

    #[test]
    fn test_from_name_is_forgiving() {
        assert_eq!(Instrument::from_name("Grand Piano 2"), Some(Instrument::GrandPiano2));
        assert_eq!(Instrument::from_name("grand-piano-2"), Some(Instrument::GrandPiano2));
        assert_eq!(Instrument::from_name("GRANDPIANO2"), Some(Instrument::GrandPiano2));
        assert_eq!(Instrument::from_name("e.piano 1"), Some(Instrument::EPiano1));
        assert_eq!(Instrument::from_name("flugelhorn"), None);
    }

    #[test]
    fn test_tone_count() {
        assert_eq!(Instrument::all().count(), 36);
    }
}
