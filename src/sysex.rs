//! SysEx frame codec for the Roland register protocol.
//!
//! Frame body between the `F0`/`F7` delimiters:
//!
//! ```text
//! [device_id:6][opcode:1][address:4][payload:N][checksum:1]
//! ```
//!
//! Reads carry a size probe as payload (the device reports back that many
//! bytes); writes carry the encoded value. The checksum covers address and
//! payload only, not the device id or opcode.

use crate::error::{Error, Result};
use crate::registers::Register;
use crate::values::{self, RegisterValue};

/// Manufacturer, device and model bytes identifying the FP/RP family.
pub const DEVICE_ID: [u8; 6] = [0x41, 0x10, 0x00, 0x00, 0x00, 0x28];

/// Shortest well-formed frame body: id + opcode + address + checksum.
const MIN_FRAME_LEN: usize = DEVICE_ID.len() + 1 + 4 + 1;

/// Request direction, with its fixed wire opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Read,
    Write,
}

impl Command {
    pub fn opcode(self) -> u8 {
        match self {
            Command::Read => 0x11,
            Command::Write => 0x12,
        }
    }
}

/// Mod-128 two's-complement checksum over address + payload. Summed
/// together with the bytes it covers, the result is 0 mod 128.
pub fn checksum(address: &[u8], payload: &[u8]) -> u8 {
    let sum: u32 = address.iter().chain(payload).map(|&b| b as u32).sum();
    ((128 - (sum % 128)) & 0x7F) as u8
}

/// An outbound read or write request.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRequest {
    pub register: Register,
    pub command: Command,
    pub payload: Vec<u8>,
}

impl RegisterRequest {
    /// Build a request from explicit parts. Writes must carry a non-empty
    /// payload; reads ignore `payload` and use the size probe.
    pub fn new(register: Register, command: Command, payload: Option<Vec<u8>>) -> Result<Self> {
        let payload = match command {
            Command::Read => size_probe(register),
            Command::Write => match payload {
                Some(p) if !p.is_empty() => p,
                _ => return Err(Error::MissingPayload(register)),
            },
        };
        Ok(Self {
            register,
            command,
            payload,
        })
    }

    /// A read request for `register`.
    pub fn read(register: Register) -> Self {
        Self {
            register,
            command: Command::Read,
            payload: size_probe(register),
        }
    }

    /// A write request carrying `value` encoded per the register's codec.
    pub fn write(register: Register, value: &RegisterValue) -> Self {
        Self {
            register,
            command: Command::Write,
            payload: values::encode(register, value),
        }
    }

    /// The frame body, ready to wrap in F0/F7.
    pub fn frame(&self) -> Vec<u8> {
        let address = self.register.address();
        let mut out = Vec::with_capacity(MIN_FRAME_LEN + self.payload.len());
        out.extend_from_slice(&DEVICE_ID);
        out.push(self.command.opcode());
        out.extend_from_slice(&address);
        out.extend_from_slice(&self.payload);
        out.push(checksum(&address, &self.payload));
        out
    }
}

/// `[0, 0, 0, width]`: tells the device how many bytes to report.
fn size_probe(register: Register) -> Vec<u8> {
    vec![0x00, 0x00, 0x00, register.payload_width() as u8]
}

/// A validated, decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterResponse {
    pub register: Register,
    pub raw: Vec<u8>,
    pub value: RegisterValue,
}

impl RegisterResponse {
    /// Parse a frame body (no F0/F7). Validation order: length, device id,
    /// address, checksum, then the value codec.
    pub fn parse(frame: &[u8]) -> Result<Self> {
        if frame.len() < MIN_FRAME_LEN {
            return Err(Error::FrameTooShort(frame.len()));
        }
        if frame[..6] != DEVICE_ID {
            return Err(Error::DeviceIdMismatch);
        }
        // frame[6] is the opcode; the device always answers with the
        // data-set command, so it carries nothing worth checking
        let address = [frame[7], frame[8], frame[9], frame[10]];
        let register = Register::from_address(address)?;
        let raw = frame[11..frame.len() - 1].to_vec();
        let expected = checksum(&address, &raw);
        let found = frame[frame.len() - 1];
        if expected != found {
            return Err(Error::ChecksumMismatch { expected, found });
        }
        let value = values::decode(register, &raw)?;
        Ok(Self {
            register,
            raw,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_known_values() {
        // master volume address + a one-byte payload
        assert_eq!(checksum(&[0x01, 0x00, 0x02, 0x13], &[77]), 29);
        // sums that land on a multiple of 128 produce 0, not 128
        assert_eq!(checksum(&[0x40, 0x40], &[]), 0);
    }

    #[test]
    fn test_read_request_frame() {
        let frame = RegisterRequest::read(Register::MasterVolume).frame();
        assert_eq!(
            frame,
            vec![
                0x41, 0x10, 0x00, 0x00, 0x00, 0x28, // device id
                0x11, // read
                0x01, 0x00, 0x02, 0x13, // address
                0x00, 0x00, 0x00, 0x01, // size probe
                0x69, // checksum
            ]
        );
    }

    #[test]
    fn test_read_probe_uses_payload_width() {
        let request = RegisterRequest::read(Register::Uptime);
        assert_eq!(request.payload, vec![0x00, 0x00, 0x00, 0x08]);
        let request = RegisterRequest::read(Register::ServerSetupFileName);
        assert_eq!(request.payload, vec![0x00, 0x00, 0x00, 0x20]);
    }

    #[test]
    fn test_write_request_frame() {
        let frame = RegisterRequest::write(Register::MasterVolume, &100u8.into()).frame();
        assert_eq!(
            frame,
            vec![
                0x41, 0x10, 0x00, 0x00, 0x00, 0x28,
                0x12, // write
                0x01, 0x00, 0x02, 0x13,
                0x64,
                0x06,
            ]
        );
    }

    #[test]
    fn test_write_without_payload_is_rejected() {
        let err = RegisterRequest::new(Register::MasterVolume, Command::Write, None).unwrap_err();
        assert!(matches!(err, Error::MissingPayload(Register::MasterVolume)));
        let err =
            RegisterRequest::new(Register::MasterVolume, Command::Write, Some(vec![])).unwrap_err();
        assert!(matches!(err, Error::MissingPayload(_)));
    }

    #[test]
    fn test_response_round_trip() {
        // a device push uses the same layout as our writes
        let frame = RegisterRequest::write(Register::MasterVolume, &77u8.into()).frame();
        let response = RegisterResponse::parse(&frame).unwrap();
        assert_eq!(response.register, Register::MasterVolume);
        assert_eq!(response.raw, vec![77]);
        assert_eq!(response.value, RegisterValue::Number(77));
    }

    #[test]
    fn test_tempo_response_decodes_via_pair() {
        let frame =
            RegisterRequest::new(Register::SequencerTempoRo, Command::Write, Some(vec![0x01, 0x0C]))
                .unwrap()
                .frame();
        let response = RegisterResponse::parse(&frame).unwrap();
        assert_eq!(response.value, RegisterValue::Number(140));
    }

    #[test]
    fn test_reject_short_frame() {
        let err = RegisterResponse::parse(&[0x41, 0x10]).unwrap_err();
        assert!(matches!(err, Error::FrameTooShort(2)));
    }

    #[test]
    fn test_reject_foreign_device_id() {
        let mut frame = RegisterRequest::write(Register::MasterVolume, &77u8.into()).frame();
        frame[0] = 0x42;
        let err = RegisterResponse::parse(&frame).unwrap_err();
        assert!(matches!(err, Error::DeviceIdMismatch));
    }

    #[test]
    fn test_reject_unknown_address() {
        let mut frame = RegisterRequest::write(Register::MasterVolume, &77u8.into()).frame();
        frame[7] = 0x7F;
        let err = RegisterResponse::parse(&frame).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn test_reject_corrupted_checksum() {
        let mut frame = RegisterRequest::write(Register::MasterVolume, &77u8.into()).frame();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        let err = RegisterResponse::parse(&frame).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    proptest! {
        #[test]
        fn prop_checksum_balances_mod_128(
            address in proptest::array::uniform4(any::<u8>()),
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let sum: u32 = address.iter().chain(payload.iter()).map(|&b| b as u32).sum();
            let check = checksum(&address, &payload) as u32;
            prop_assert_eq!((sum + check) % 128, 0);
        }
    }
}
