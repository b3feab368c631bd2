//! Error types for the register protocol engine.

use std::time::Duration;

use thiserror::Error;

use crate::registers::Register;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no MIDI port matching '{0}' was found")]
    DeviceNotFound(String),

    #[error("'{0}' is not a known register")]
    UnknownRegister(String),

    #[error("address {0:02X?} does not map to a known register")]
    InvalidAddress([u8; 4]),

    #[error("write to '{0}' requires a non-empty payload")]
    MissingPayload(Register),

    #[error("frame is {0} bytes, too short for a register response")]
    FrameTooShort(usize),

    #[error("frame does not carry the Roland device id")]
    DeviceIdMismatch,

    #[error("checksum mismatch: expected {expected:#04X}, found {found:#04X}")]
    ChecksumMismatch { expected: u8, found: u8 },

    #[error("'{register}' payload is {found} bytes, codec needs {expected}")]
    PayloadSize {
        register: Register,
        expected: usize,
        found: usize,
    },

    #[error("no response for '{register}' within {timeout:?}")]
    ResponseTimeout { register: Register, timeout: Duration },

    #[error("MIDI backend error: {0}")]
    Midi(String),
}

impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::Midi(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::Midi(e.to_string())
    }
}

impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::Midi(e.to_string())
    }
}

impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::Midi(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
