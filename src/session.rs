//! Correlation session: synchronous-looking register reads over an
//! asynchronous callback transport.
//!
//! The device answers read requests (and announces panel changes) by
//! pushing SysEx frames at its own pace on the transport's thread. The
//! session stores every decoded push in a value map and marks the register
//! "fresh"; a pending `read_register` polls that freshness under the same
//! mutex. Correlation is by register identity, not by timestamps: a read
//! clears the fresh bit before sending, so only a value that arrives after
//! the request can satisfy it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::instrument::Instrument;
use crate::midi::MidiMessage;
use crate::registers::Register;
use crate::sysex::{RegisterRequest, RegisterResponse};
use crate::transport::{MessageCallback, MidiTransport, Transport};
use crate::values::RegisterValue;

/// How long a read waits for a matching response before giving up.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Poll granularity while a read is waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Grace period after releasing the ports so the OS MIDI stack settles.
const CLOSE_SETTLE: Duration = Duration::from_millis(500);

const CC_RESET_ALL_CONTROLLERS: u8 = 121;
const CC_ALL_NOTES_OFF: u8 = 123;

/// The one piece of shared mutable state: written by the transport
/// callback, drained by `read_register`. Map and set must stay under a
/// single lock or the check/remove in the poll loop races the insert.
#[derive(Default)]
struct CorrelationState {
    /// Last decoded value per register.
    values: HashMap<Register, RegisterValue>,
    /// Registers whose value arrived but hasn't been consumed by a read.
    fresh: HashSet<Register>,
}

/// An open session against one piano.
pub struct Piano {
    transport: Mutex<Box<dyn Transport>>,
    state: Arc<Mutex<CorrelationState>>,
}

impl Piano {
    /// Open a session on the first MIDI ports matching `pattern`.
    pub async fn connect(pattern: &str) -> Result<Self> {
        Self::open(Box::new(MidiTransport::open(pattern)?)).await
    }

    /// Open a session over an already-acquired transport.
    ///
    /// Registers the inbound handler, then writes the connection register
    /// so the device starts pushing register changes; without that write
    /// it stays silent. If the write fails the transport is released
    /// before the error surfaces.
    pub async fn open(mut transport: Box<dyn Transport>) -> Result<Self> {
        let state = Arc::new(Mutex::new(CorrelationState::default()));
        let shared = state.clone();
        let callback: MessageCallback = Arc::new(move |data| handle_message(&shared, data));
        transport.on_message(callback);

        let piano = Self {
            transport: Mutex::new(transport),
            state,
        };
        if let Err(e) = piano.write_register(Register::Connection, 1u8) {
            let _ = piano.transport.lock().close();
            return Err(e);
        }
        info!("session open, device switched to active push");
        Ok(piano)
    }

    /// Fire-and-forget write. The only acknowledgment is whatever the
    /// device chooses to push afterwards.
    pub fn write_register(&self, register: Register, value: impl Into<RegisterValue>) -> Result<()> {
        let value = value.into();
        debug!("write {} = {}", register, value);
        let request = RegisterRequest::write(register, &value);
        self.send_request(&request)
    }

    /// Blocking read: send a read request, then wait for a fresh value.
    ///
    /// Waits at most [`RESPONSE_TIMEOUT`], polling every 50 ms. A value
    /// already cached before the request was sent never satisfies the
    /// wait; on device silence this returns `ResponseTimeout` after the
    /// full budget.
    pub async fn read_register(&self, register: Register) -> Result<RegisterValue> {
        debug!("read {}", register);
        // clear stale freshness so only a post-send arrival qualifies
        self.state.lock().fresh.remove(&register);
        self.send_request(&RegisterRequest::read(register))?;

        let deadline = Instant::now() + RESPONSE_TIMEOUT;
        loop {
            {
                let mut state = self.state.lock();
                if state.fresh.remove(&register) {
                    if let Some(value) = state.values.get(&register) {
                        return Ok(value.clone());
                    }
                }
            }
            if Instant::now() >= deadline {
                warn!("timed out waiting for {}", register);
                return Err(Error::ResponseTimeout {
                    register,
                    timeout: RESPONSE_TIMEOUT,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Last value the session has seen for `register`, if any. Served
    /// from the cache; never waits and never consumes freshness.
    pub fn cached(&self, register: Register) -> Option<RegisterValue> {
        self.state.lock().values.get(&register).cloned()
    }

    /// Quiet the device and release the transport.
    ///
    /// Sends All Notes Off and Reset All Controllers on every channel
    /// (the transport-level reset a port teardown performs), closes the
    /// ports, then waits a short settle period.
    pub async fn close(&self) -> Result<()> {
        info!("closing session");
        {
            let mut transport = self.transport.lock();
            'reset: for channel in 0..16 {
                for cc in [CC_ALL_NOTES_OFF, CC_RESET_ALL_CONTROLLERS] {
                    let message = MidiMessage::ControlChange {
                        channel,
                        cc,
                        value: 0,
                    };
                    if let Err(e) = transport.send(&message.encode()) {
                        warn!("device reset incomplete: {}", e);
                        break 'reset;
                    }
                }
            }
            transport.close()?;
        }
        sleep(CLOSE_SETTLE).await;
        Ok(())
    }

    fn send_request(&self, request: &RegisterRequest) -> Result<()> {
        let message = MidiMessage::SysEx {
            data: request.frame(),
        };
        self.transport.lock().send(&message.encode())
    }

    // Typed helpers over the registers callers reach for most.

    /// Master volume, 0-100.
    pub async fn volume(&self) -> Result<u8> {
        let value = self.read_register(Register::MasterVolume).await?;
        Ok(value.as_number().unwrap_or(0) as u8)
    }

    pub fn set_volume(&self, volume: u8) -> Result<()> {
        self.write_register(Register::MasterVolume, volume)
    }

    /// Tone selected in single-keyboard mode.
    pub async fn instrument(&self) -> Result<Instrument> {
        let value = self.read_register(Register::ToneForSingle).await?;
        Ok(value.as_instrument().unwrap_or(Instrument::Unknown))
    }

    pub fn set_instrument(&self, instrument: Instrument) -> Result<()> {
        self.write_register(Register::ToneForSingle, instrument)
    }

    /// Key transpose in semitones, negative = down.
    pub async fn transpose(&self) -> Result<i8> {
        let value = self.read_register(Register::KeyTransposeRo).await?;
        Ok(value.as_number().unwrap_or(0) as i8)
    }

    pub fn set_transpose(&self, semitones: i8) -> Result<()> {
        self.write_register(Register::KeyTransposeRo, semitones as i64)
    }

    /// Milliseconds since the device powered on.
    pub async fn uptime(&self) -> Result<u64> {
        let value = self.read_register(Register::Uptime).await?;
        Ok(value.as_number().unwrap_or(0) as u64)
    }

    /// The device's stored setup name.
    pub async fn setup_name(&self) -> Result<String> {
        let value = self.read_register(Register::ServerSetupFileName).await?;
        Ok(value.as_text().unwrap_or_default().to_string())
    }

    /// Metronome controls.
    pub fn metronome(&self) -> Metronome<'_> {
        Metronome { piano: self }
    }
}

/// Metronome controls, grouped the way the panel groups them.
pub struct Metronome<'a> {
    piano: &'a Piano,
}

impl Metronome<'_> {
    /// Flip the metronome switch. The toggle register ignores its value.
    pub fn toggle(&self) -> Result<()> {
        self.piano.write_register(Register::MetronomeSwToggle, 0u8)
    }

    /// Whether the metronome is currently running.
    pub async fn status(&self) -> Result<bool> {
        let value = self.piano.read_register(Register::MetronomeStatus).await?;
        Ok(value.as_number().unwrap_or(0) != 0)
    }

    /// Bring the metronome to `on`, toggling only when the current status
    /// differs.
    pub async fn enable(&self, on: bool) -> Result<()> {
        if self.status().await? != on {
            self.toggle()?;
        }
        Ok(())
    }

    /// Current tempo in beats per minute.
    pub async fn bpm(&self) -> Result<u16> {
        let value = self.piano.read_register(Register::SequencerTempoRo).await?;
        Ok(value.as_number().unwrap_or(0) as u16)
    }

    pub fn set_bpm(&self, bpm: u16) -> Result<()> {
        self.piano.write_register(Register::SequencerTempoWo, bpm)
    }
}

/// Transport callback: classify, decode, store. Runs on the transport's
/// thread, so everything it touches sits behind the state mutex.
fn handle_message(state: &Mutex<CorrelationState>, data: &[u8]) {
    let frame = match MidiMessage::parse(data) {
        Some(MidiMessage::SysEx { data }) => data,
        Some(other) => {
            trace!("ignoring non-sysex message: {}", other);
            return;
        }
        None => {
            trace!("ignoring unparseable message: {:02X?}", data);
            return;
        }
    };
    match RegisterResponse::parse(&frame) {
        Ok(response) => {
            debug!("{} = {}", response.register, response.value);
            let mut state = state.lock();
            state.values.insert(response.register, response.value);
            state.fresh.insert(response.register);
        }
        // a malformed frame is dropped here and never tears the session down
        Err(e) => warn!("dropping malformed frame: {}", e),
    }
}
