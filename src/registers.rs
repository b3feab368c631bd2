//! Register catalog for the Roland FP/RP address map.
//!
//! Every readable or writable parameter on the instrument lives at a fixed
//! 4-byte address. The catalog is one static table in enum-discriminant
//! order; forward lookups index it directly, reverse lookups scan it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One catalog row: stable name, device address, payload width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub register: Register,
    pub name: &'static str,
    pub address: [u8; 4],
    pub width: u8,
}

/// A named register on the instrument.
///
/// The `Ro`/`Wo` suffixes mirror the device's address map: some parameters
/// are reported at one address and commanded at another (key transpose,
/// sequencer tempo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Register {
    // 01 00 00 xx
    ServerSetupFileName,
    // 01 00 01 xx
    SongToneLanguage,
    KeyTransposeRo,
    SongTransposeRo,
    SequencerStatus,
    SequencerMeasure,
    SequencerTempoNotation,
    SequencerTempoRo,
    SequencerBeatNumerator,
    SequencerBeatDenominator,
    SequencerPartSwAccomp,
    SequencerPartSwLeft,
    SequencerPartSwRight,
    MetronomeStatus,
    HeadphonesConnection,
    // 01 00 02 xx
    KeyboardMode,
    SplitPoint,
    SplitOctaveShift,
    SplitBalance,
    DualOctaveShift,
    DualBalance,
    TwinPianoMode,
    ToneForSingle,
    ToneForSplit,
    ToneForDual,
    SongNumber,
    MasterVolume,
    MasterVolumeLimit,
    AllSongPlayMode,
    SplitRightOctaveShift,
    DualTone1OctaveShift,
    MasterTuning,
    Ambience,
    #[serde(rename = "headphones-3d-ambience")]
    Headphones3dAmbience,
    Brilliance,
    KeyTouch,
    TransposeMode,
    MetronomeBeat,
    MetronomePattern,
    MetronomeVolume,
    MetronomeTone,
    MetronomeDownBeat,
    // 01 00 03 xx
    ApplicationMode,
    ScorePageTurn,
    ArrangerPedalFunction,
    ArrangerBalance,
    Connection,
    KeyTransposeWo,
    SongTransposeWo,
    SequencerTempoWo,
    TempoReset,
    // 01 00 04 xx
    SoundEffect,
    SoundEffectStopAll,
    // 01 00 05 xx
    SequencerRewind,
    SequencerFastForward,
    SequencerReset,
    SequencerTempoDown,
    SequencerTempoUp,
    SequencerPlayStopToggle,
    SequencerAccompPartSwToggle,
    SequencerLeftPartSwToggle,
    SequencerRightPartSwToggle,
    MetronomeSwToggle,
    SequencerPreviousSong,
    SequencerNextSong,
    // 01 00 06 xx
    PageTurnPreviousPage,
    PageTurnNextPage,
    // 01 00 07 xx
    Uptime,
    // 01 00 08 xx
    AddressMapVersion,
}

const fn desc(
    register: Register,
    name: &'static str,
    address: [u8; 4],
    width: u8,
) -> RegisterDescriptor {
    RegisterDescriptor {
        register,
        name,
        address,
        width,
    }
}

/// Catalog rows in `Register` discriminant order; `descriptor()` relies on
/// that ordering.
const TABLE: [RegisterDescriptor; 69] = [
    desc(Register::ServerSetupFileName, "server-setup-file-name", [0x01, 0x00, 0x00, 0x00], 32),
    desc(Register::SongToneLanguage, "song-tone-language", [0x01, 0x00, 0x01, 0x00], 1),
    desc(Register::KeyTransposeRo, "key-transpose-ro", [0x01, 0x00, 0x01, 0x01], 1),
    desc(Register::SongTransposeRo, "song-transpose-ro", [0x01, 0x00, 0x01, 0x02], 1),
    desc(Register::SequencerStatus, "sequencer-status", [0x01, 0x00, 0x01, 0x03], 1),
    desc(Register::SequencerMeasure, "sequencer-measure", [0x01, 0x00, 0x01, 0x05], 2),
    desc(Register::SequencerTempoNotation, "sequencer-tempo-notation", [0x01, 0x00, 0x01, 0x07], 1),
    desc(Register::SequencerTempoRo, "sequencer-tempo-ro", [0x01, 0x00, 0x01, 0x08], 2),
    desc(Register::SequencerBeatNumerator, "sequencer-beat-numerator", [0x01, 0x00, 0x01, 0x0A], 1),
    desc(Register::SequencerBeatDenominator, "sequencer-beat-denominator", [0x01, 0x00, 0x01, 0x0B], 1),
    desc(Register::SequencerPartSwAccomp, "sequencer-part-sw-accomp", [0x01, 0x00, 0x01, 0x0C], 1),
    desc(Register::SequencerPartSwLeft, "sequencer-part-sw-left", [0x01, 0x00, 0x01, 0x0D], 1),
    desc(Register::SequencerPartSwRight, "sequencer-part-sw-right", [0x01, 0x00, 0x01, 0x0E], 1),
    desc(Register::MetronomeStatus, "metronome-status", [0x01, 0x00, 0x01, 0x0F], 1),
    desc(Register::HeadphonesConnection, "headphones-connection", [0x01, 0x00, 0x01, 0x10], 1),
    desc(Register::KeyboardMode, "keyboard-mode", [0x01, 0x00, 0x02, 0x00], 1),
    desc(Register::SplitPoint, "split-point", [0x01, 0x00, 0x02, 0x01], 1),
    desc(Register::SplitOctaveShift, "split-octave-shift", [0x01, 0x00, 0x02, 0x02], 1),
    desc(Register::SplitBalance, "split-balance", [0x01, 0x00, 0x02, 0x03], 1),
    desc(Register::DualOctaveShift, "dual-octave-shift", [0x01, 0x00, 0x02, 0x04], 1),
    desc(Register::DualBalance, "dual-balance", [0x01, 0x00, 0x02, 0x05], 1),
    desc(Register::TwinPianoMode, "twin-piano-mode", [0x01, 0x00, 0x02, 0x06], 1),
    desc(Register::ToneForSingle, "tone-for-single", [0x01, 0x00, 0x02, 0x07], 3),
    desc(Register::ToneForSplit, "tone-for-split", [0x01, 0x00, 0x02, 0x0A], 3),
    desc(Register::ToneForDual, "tone-for-dual", [0x01, 0x00, 0x02, 0x0D], 3),
    desc(Register::SongNumber, "song-number", [0x01, 0x00, 0x02, 0x10], 3),
    desc(Register::MasterVolume, "master-volume", [0x01, 0x00, 0x02, 0x13], 1),
    desc(Register::MasterVolumeLimit, "master-volume-limit", [0x01, 0x00, 0x02, 0x14], 1),
    desc(Register::AllSongPlayMode, "all-song-play-mode", [0x01, 0x00, 0x02, 0x15], 1),
    desc(Register::SplitRightOctaveShift, "split-right-octave-shift", [0x01, 0x00, 0x02, 0x16], 1),
    desc(Register::DualTone1OctaveShift, "dual-tone1-octave-shift", [0x01, 0x00, 0x02, 0x17], 1),
    desc(Register::MasterTuning, "master-tuning", [0x01, 0x00, 0x02, 0x18], 2),
    desc(Register::Ambience, "ambience", [0x01, 0x00, 0x02, 0x1A], 1),
    desc(Register::Headphones3dAmbience, "headphones-3d-ambience", [0x01, 0x00, 0x02, 0x1B], 1),
    desc(Register::Brilliance, "brilliance", [0x01, 0x00, 0x02, 0x1C], 1),
    desc(Register::KeyTouch, "key-touch", [0x01, 0x00, 0x02, 0x1D], 1),
    desc(Register::TransposeMode, "transpose-mode", [0x01, 0x00, 0x02, 0x1E], 1),
    desc(Register::MetronomeBeat, "metronome-beat", [0x01, 0x00, 0x02, 0x1F], 1),
    desc(Register::MetronomePattern, "metronome-pattern", [0x01, 0x00, 0x02, 0x20], 1),
    desc(Register::MetronomeVolume, "metronome-volume", [0x01, 0x00, 0x02, 0x21], 1),
    desc(Register::MetronomeTone, "metronome-tone", [0x01, 0x00, 0x02, 0x22], 1),
    desc(Register::MetronomeDownBeat, "metronome-down-beat", [0x01, 0x00, 0x02, 0x23], 1),
    desc(Register::ApplicationMode, "application-mode", [0x01, 0x00, 0x03, 0x00], 1),
    desc(Register::ScorePageTurn, "score-page-turn", [0x01, 0x00, 0x03, 0x02], 1),
    desc(Register::ArrangerPedalFunction, "arranger-pedal-function", [0x01, 0x00, 0x03, 0x03], 2),
    desc(Register::ArrangerBalance, "arranger-balance", [0x01, 0x00, 0x03, 0x05], 1),
    desc(Register::Connection, "connection", [0x01, 0x00, 0x03, 0x06], 1),
    desc(Register::KeyTransposeWo, "key-transpose-wo", [0x01, 0x00, 0x03, 0x07], 1),
    desc(Register::SongTransposeWo, "song-transpose-wo", [0x01, 0x00, 0x03, 0x08], 1),
    desc(Register::SequencerTempoWo, "sequencer-tempo-wo", [0x01, 0x00, 0x03, 0x09], 2),
    desc(Register::TempoReset, "tempo-reset", [0x01, 0x00, 0x03, 0x0B], 1),
    desc(Register::SoundEffect, "sound-effect", [0x01, 0x00, 0x04, 0x00], 1),
    desc(Register::SoundEffectStopAll, "sound-effect-stop-all", [0x01, 0x00, 0x04, 0x02], 1),
    desc(Register::SequencerRewind, "sequencer-rewind", [0x01, 0x00, 0x05, 0x00], 1),
    desc(Register::SequencerFastForward, "sequencer-fast-forward", [0x01, 0x00, 0x05, 0x01], 1),
    desc(Register::SequencerReset, "sequencer-reset", [0x01, 0x00, 0x05, 0x02], 1),
    desc(Register::SequencerTempoDown, "sequencer-tempo-down", [0x01, 0x00, 0x05, 0x03], 1),
    desc(Register::SequencerTempoUp, "sequencer-tempo-up", [0x01, 0x00, 0x05, 0x04], 1),
    desc(Register::SequencerPlayStopToggle, "sequencer-play-stop-toggle", [0x01, 0x00, 0x05, 0x05], 1),
    desc(Register::SequencerAccompPartSwToggle, "sequencer-accomp-part-sw-toggle", [0x01, 0x00, 0x05, 0x06], 1),
    desc(Register::SequencerLeftPartSwToggle, "sequencer-left-part-sw-toggle", [0x01, 0x00, 0x05, 0x07], 1),
    desc(Register::SequencerRightPartSwToggle, "sequencer-right-part-sw-toggle", [0x01, 0x00, 0x05, 0x08], 1),
    desc(Register::MetronomeSwToggle, "metronome-sw-toggle", [0x01, 0x00, 0x05, 0x09], 1),
    desc(Register::SequencerPreviousSong, "sequencer-previous-song", [0x01, 0x00, 0x05, 0x0A], 1),
    desc(Register::SequencerNextSong, "sequencer-next-song", [0x01, 0x00, 0x05, 0x0B], 1),
    desc(Register::PageTurnPreviousPage, "page-turn-previous-page", [0x01, 0x00, 0x06, 0x00], 1),
    desc(Register::PageTurnNextPage, "page-turn-next-page", [0x01, 0x00, 0x06, 0x01], 1),
    desc(Register::Uptime, "uptime", [0x01, 0x00, 0x07, 0x00], 8),
    desc(Register::AddressMapVersion, "address-map-version", [0x01, 0x00, 0x08, 0x00], 1),
];

impl Register {
    /// Catalog row for this register.
    pub fn descriptor(self) -> &'static RegisterDescriptor {
        &TABLE[self as usize]
    }

    /// 4-byte device address.
    pub fn address(self) -> [u8; 4] {
        self.descriptor().address
    }

    /// Payload width in bytes (1 unless the device documents otherwise).
    pub fn payload_width(self) -> usize {
        self.descriptor().width as usize
    }

    /// Stable kebab-case name, the same string serde uses.
    pub fn as_str(self) -> &'static str {
        self.descriptor().name
    }

    /// Look a register up by its kebab-case name.
    pub fn from_name(name: &str) -> Result<Self> {
        TABLE
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.register)
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    /// Map an inbound frame's address back to its register.
    pub fn from_address(address: [u8; 4]) -> Result<Self> {
        TABLE
            .iter()
            .find(|d| d.address == address)
            .map(|d| d.register)
            .ok_or(Error::InvalidAddress(address))
    }

    /// All known registers, in address-map order.
    pub fn all() -> impl Iterator<Item = Register> {
        TABLE.iter().map(|d| d.register)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_order_matches_enum() {
        for (index, d) in TABLE.iter().enumerate() {
            assert_eq!(
                d.register as usize, index,
                "table row {} out of order: {}",
                index, d.name
            );
        }
    }

    #[test]
    fn test_addresses_unique() {
        let addresses: HashSet<[u8; 4]> = TABLE.iter().map(|d| d.address).collect();
        assert_eq!(addresses.len(), TABLE.len());
    }

    #[test]
    fn test_names_unique() {
        let names: HashSet<&str> = TABLE.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), TABLE.len());
    }

    #[test]
    fn test_known_addresses() {
        assert_eq!(Register::MasterVolume.address(), [0x01, 0x00, 0x02, 0x13]);
        assert_eq!(Register::Connection.address(), [0x01, 0x00, 0x03, 0x06]);
        assert_eq!(Register::ToneForSingle.address(), [0x01, 0x00, 0x02, 0x07]);
        assert_eq!(Register::SequencerTempoRo.address(), [0x01, 0x00, 0x01, 0x08]);
        assert_eq!(Register::SequencerTempoWo.address(), [0x01, 0x00, 0x03, 0x09]);
        assert_eq!(Register::Uptime.address(), [0x01, 0x00, 0x07, 0x00]);
    }

    #[test]
    fn test_width_exceptions() {
        assert_eq!(Register::ServerSetupFileName.payload_width(), 32);
        assert_eq!(Register::SequencerMeasure.payload_width(), 2);
        assert_eq!(Register::SequencerTempoRo.payload_width(), 2);
        assert_eq!(Register::SequencerTempoWo.payload_width(), 2);
        assert_eq!(Register::MasterTuning.payload_width(), 2);
        assert_eq!(Register::ArrangerPedalFunction.payload_width(), 2);
        assert_eq!(Register::ToneForSingle.payload_width(), 3);
        assert_eq!(Register::ToneForSplit.payload_width(), 3);
        assert_eq!(Register::ToneForDual.payload_width(), 3);
        assert_eq!(Register::SongNumber.payload_width(), 3);
        assert_eq!(Register::Uptime.payload_width(), 8);
        // everything else defaults to a single byte
        assert_eq!(Register::MasterVolume.payload_width(), 1);
        assert_eq!(Register::all().filter(|r| r.payload_width() == 1).count(), 58);
    }

    #[test]
    fn test_name_round_trip() {
        for register in Register::all() {
            assert_eq!(Register::from_name(register.as_str()).unwrap(), register);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = Register::from_name("no-such-register").unwrap_err();
        assert!(matches!(err, Error::UnknownRegister(_)));
    }

    #[test]
    fn test_from_address() {
        assert_eq!(
            Register::from_address([0x01, 0x00, 0x02, 0x13]).unwrap(),
            Register::MasterVolume
        );
        let err = Register::from_address([0x7F, 0x7F, 0x7F, 0x7F]).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn test_serde_uses_catalog_names() {
        for register in Register::all() {
            let json = serde_json::to_string(&register).unwrap();
            assert_eq!(json, format!("\"{}\"", register.as_str()));
            let back: Register = serde_json::from_str(&json).unwrap();
            assert_eq!(back, register);
        }
    }
}
