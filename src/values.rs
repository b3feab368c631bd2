//! Per-register value codec.
//!
//! The default transform is big-endian fixed-width: integers truncate to
//! the register's payload width on encode and fold back together on decode.
//! A handful of registers use bespoke layouts (7-bit tempo split, offset
//! transpose, tone triples, text) and are special-cased here; the dispatch
//! is one `match` so the full set of exceptions is visible in one place.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::instrument::Instrument;
use crate::registers::Register;

/// A decoded register value.
///
/// Most registers carry plain integers; the tone selector resolves to an
/// [`Instrument`] and the setup-name register to text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterValue {
    Number(i64),
    Instrument(Instrument),
    Text(String),
}

impl RegisterValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            RegisterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_instrument(&self) -> Option<Instrument> {
        match self {
            RegisterValue::Instrument(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RegisterValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterValue::Number(n) => write!(f, "{}", n),
            RegisterValue::Instrument(i) => write!(f, "{}", i),
            RegisterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RegisterValue {
    fn from(n: i64) -> Self {
        RegisterValue::Number(n)
    }
}

impl From<i32> for RegisterValue {
    fn from(n: i32) -> Self {
        RegisterValue::Number(n as i64)
    }
}

impl From<u8> for RegisterValue {
    fn from(n: u8) -> Self {
        RegisterValue::Number(n as i64)
    }
}

impl From<u16> for RegisterValue {
    fn from(n: u16) -> Self {
        RegisterValue::Number(n as i64)
    }
}

impl From<u64> for RegisterValue {
    fn from(n: u64) -> Self {
        RegisterValue::Number(n as i64)
    }
}

impl From<Instrument> for RegisterValue {
    fn from(i: Instrument) -> Self {
        RegisterValue::Instrument(i)
    }
}

impl From<&str> for RegisterValue {
    fn from(s: &str) -> Self {
        RegisterValue::Text(s.to_string())
    }
}

impl From<String> for RegisterValue {
    fn from(s: String) -> Self {
        RegisterValue::Text(s)
    }
}

/// Encode a value into the register's wire payload.
///
/// Out-of-range integers truncate/wrap silently; the device itself is that
/// tolerant, so callers wanting range checks do them first. Never produces
/// an empty payload.
pub fn encode(register: Register, value: &RegisterValue) -> Vec<u8> {
    match (register, value) {
        // 14-bit tempo split across two 7-bit bytes, high first
        (Register::SequencerTempoWo, RegisterValue::Number(v)) => {
            vec![((v >> 7) & 0x7F) as u8, (v & 0x7F) as u8]
        }
        // transpose is stored as an offset from 64
        (Register::KeyTransposeRo, RegisterValue::Number(v)) => vec![((v + 64) & 0xFF) as u8],
        _ => encode_default(register, value),
    }
}

fn encode_default(register: Register, value: &RegisterValue) -> Vec<u8> {
    let width = register.payload_width();
    match value {
        RegisterValue::Number(n) => be_bytes(*n, width),
        RegisterValue::Instrument(i) => {
            let (bank, program) = i.bank_program().unwrap_or((0, 0));
            fit(vec![bank, 0x00, program], width)
        }
        RegisterValue::Text(s) => fit(s.bytes().collect(), width),
    }
}

/// Decode a register's wire payload.
///
/// Fails only when a special-cased register's payload is shorter than its
/// layout requires; everything else tolerates odd lengths.
pub fn decode(register: Register, raw: &[u8]) -> Result<RegisterValue> {
    match register {
        Register::SequencerTempoRo => {
            need(register, raw, 2)?;
            let bpm = ((raw[0] as i64 & 0x7F) << 7) | (raw[1] as i64 & 0x7F);
            Ok(RegisterValue::Number(bpm))
        }
        Register::KeyTransposeRo => {
            need(register, raw, 1)?;
            Ok(RegisterValue::Number(raw[0] as i64 - 64))
        }
        Register::ToneForSingle => {
            need(register, raw, 3)?;
            Ok(RegisterValue::Instrument(Instrument::from_parts(raw[0], raw[2])))
        }
        Register::Uptime => {
            need(register, raw, 8)?;
            let ms = raw.iter().take(8).fold(0u64, |acc, &b| (acc << 8) | b as u64);
            Ok(RegisterValue::Number(ms as i64))
        }
        Register::ServerSetupFileName => {
            let name = String::from_utf8_lossy(raw)
                .trim_end_matches(['\0', ' '])
                .to_string();
            Ok(RegisterValue::Text(name))
        }
        _ => {
            let n = raw.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
            Ok(RegisterValue::Number(n as i64))
        }
    }
}

fn be_bytes(n: i64, width: usize) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    if width <= bytes.len() {
        bytes[bytes.len() - width..].to_vec()
    } else {
        let mut out = vec![0u8; width - bytes.len()];
        out.extend_from_slice(&bytes);
        out
    }
}

/// Pad with trailing zeros or truncate to exactly `width` bytes.
fn fit(mut bytes: Vec<u8>, width: usize) -> Vec<u8> {
    bytes.resize(width, 0x00);
    bytes
}

fn need(register: Register, raw: &[u8], expected: usize) -> Result<()> {
    if raw.len() < expected {
        return Err(Error::PayloadSize {
            register,
            expected,
            found: raw.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn num(n: i64) -> RegisterValue {
        RegisterValue::Number(n)
    }

    #[test]
    fn test_default_encode_is_fixed_width_be() {
        assert_eq!(encode(Register::MasterVolume, &num(77)), vec![77]);
        assert_eq!(encode(Register::MasterTuning, &num(300)), vec![0x01, 0x2C]);
        assert_eq!(
            encode(Register::Uptime, &num(260)),
            vec![0, 0, 0, 0, 0, 0, 0x01, 0x04]
        );
        // truncation, not an error
        assert_eq!(encode(Register::MasterVolume, &num(0x1FF)), vec![0xFF]);
    }

    #[test]
    fn test_default_round_trip() {
        for register in [Register::MasterVolume, Register::MasterTuning, Register::SongNumber] {
            let encoded = encode(register, &num(37));
            assert_eq!(encoded.len(), register.payload_width());
            assert_eq!(decode(register, &encoded).unwrap(), num(37));
        }
    }

    #[test]
    fn test_tempo_split_and_join() {
        // 140 bpm = high 1, low 12
        assert_eq!(encode(Register::SequencerTempoWo, &num(140)), vec![0x01, 0x0C]);
        assert_eq!(
            decode(Register::SequencerTempoRo, &[0x01, 0x0C]).unwrap(),
            num(140)
        );
    }

    #[test]
    fn test_transpose_offset() {
        assert_eq!(encode(Register::KeyTransposeRo, &num(6)), vec![70]);
        assert_eq!(decode(Register::KeyTransposeRo, &[70]).unwrap(), num(6));
        assert_eq!(encode(Register::KeyTransposeRo, &num(-5)), vec![59]);
        assert_eq!(decode(Register::KeyTransposeRo, &[59]).unwrap(), num(-5));
    }

    #[test]
    fn test_tone_decode() {
        assert_eq!(
            decode(Register::ToneForSingle, &[0, 0, 1]).unwrap(),
            RegisterValue::Instrument(Instrument::GrandPiano2)
        );
        // unmapped pairs degrade to Unknown instead of failing
        assert_eq!(
            decode(Register::ToneForSingle, &[9, 0, 9]).unwrap(),
            RegisterValue::Instrument(Instrument::Unknown)
        );
    }

    #[test]
    fn test_tone_encode() {
        let value = RegisterValue::Instrument(Instrument::GrandPiano2);
        assert_eq!(encode(Register::ToneForSingle, &value), vec![0, 0, 1]);
        // the packed-integer form the panel protocol documents: (bank << 16) | program
        assert_eq!(
            encode(Register::ToneForSingle, &num((2 << 16) | 5)),
            vec![2, 0, 5]
        );
    }

    #[test]
    fn test_uptime_decode() {
        let raw = [0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x04];
        assert_eq!(decode(Register::Uptime, &raw).unwrap(), num(65540));
    }

    #[test]
    fn test_setup_name_text() {
        let mut raw = b"My Piano".to_vec();
        raw.resize(32, 0x00);
        assert_eq!(
            decode(Register::ServerSetupFileName, &raw).unwrap(),
            RegisterValue::Text("My Piano".to_string())
        );
        let encoded = encode(Register::ServerSetupFileName, &"My Piano".into());
        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[..8], b"My Piano");
    }

    #[test]
    fn test_short_special_payload_is_an_error() {
        let err = decode(Register::SequencerTempoRo, &[0x01]).unwrap_err();
        assert!(matches!(err, Error::PayloadSize { expected: 2, found: 1, .. }));
        assert!(decode(Register::Uptime, &[0; 4]).is_err());
        assert!(decode(Register::ToneForSingle, &[0, 0]).is_err());
    }

    proptest! {
        #[test]
        fn prop_tempo_round_trips(bpm in 0i64..16384) {
            let encoded = encode(Register::SequencerTempoWo, &num(bpm));
            prop_assert_eq!(decode(Register::SequencerTempoRo, &encoded).unwrap(), num(bpm));
        }

        #[test]
        fn prop_single_byte_round_trips(v in 0i64..256) {
            let encoded = encode(Register::MasterVolume, &num(v));
            prop_assert_eq!(decode(Register::MasterVolume, &encoded).unwrap(), num(v));
        }
    }
}
