//! Register protocol engine for Roland FP/RP series digital pianos.
//!
//! Talks the instrument's proprietary SysEx register protocol over MIDI:
//! a typed register catalog, per-register value codecs, the frame codec
//! with its mod-128 checksum, and a correlation session that turns the
//! device's asynchronous pushes into blocking reads with a fixed timeout.

pub mod error;
pub use error::{Error, Result};

pub mod registers;
pub use registers::{Register, RegisterDescriptor};

pub mod instrument;
pub use instrument::Instrument;

pub mod values;
pub use values::RegisterValue;

pub mod sysex;
pub use sysex::{checksum, Command, RegisterRequest, RegisterResponse, DEVICE_ID};

pub mod midi;
pub use midi::MidiMessage;

pub mod transport;
pub use transport::{discovery, MessageCallback, MidiTransport, Transport};

pub mod session;
pub use session::{Metronome, Piano, RESPONSE_TIMEOUT};
