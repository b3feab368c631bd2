//! MIDI transport: the seam between the session and the OS MIDI stack.
//!
//! `Transport` is what the session programs against; `MidiTransport` is the
//! midir-backed implementation. The inbound handler lives in a swappable
//! slot because midir wants the callback at connect time, while the session
//! only exists after the ports are open.

use std::sync::Arc;

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::midi::format_hex;

/// Handler invoked on the MIDI backend's thread for every inbound message.
pub type MessageCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// A bidirectional, message-oriented byte transport.
pub trait Transport: Send {
    /// Install the inbound-message handler, replacing any previous one.
    fn on_message(&mut self, callback: MessageCallback);

    /// Send one complete MIDI message.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Release the underlying ports. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// midir-backed transport over one input and one output port.
pub struct MidiTransport {
    port_name: String,
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
    handler: Arc<Mutex<Option<MessageCallback>>>,
}

impl MidiTransport {
    /// Open the first input and output ports whose names contain `pattern`
    /// (case-insensitive).
    pub fn open(pattern: &str) -> Result<Self> {
        let midi_in = MidiInput::new("roland-gw-in")?;
        let midi_out = MidiOutput::new("roland-gw-out")?;

        let (in_port, in_name) = find_input_port(&midi_in, pattern)
            .ok_or_else(|| Error::DeviceNotFound(pattern.to_string()))?;
        let (out_port, out_name) = find_output_port(&midi_out, pattern)
            .ok_or_else(|| Error::DeviceNotFound(pattern.to_string()))?;

        let handler: Arc<Mutex<Option<MessageCallback>>> = Arc::new(Mutex::new(None));

        let slot = handler.clone();
        let input = midi_in.connect(
            &in_port,
            "roland-gw-in",
            move |_timestamp, data, _| {
                trace!("RX {} bytes: {}", data.len(), format_hex(data));
                if let Some(callback) = slot.lock().as_ref() {
                    callback(data);
                }
            },
            (),
        )?;
        let output = midi_out.connect(&out_port, "roland-gw-out")?;

        debug!("MIDI transport open: in '{}', out '{}'", in_name, out_name);
        Ok(Self {
            port_name: in_name,
            input: Some(input),
            output: Some(output),
            handler,
        })
    }

    /// The input port name this transport connected to.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Transport for MidiTransport {
    fn on_message(&mut self, callback: MessageCallback) {
        *self.handler.lock() = Some(callback);
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!("TX {} bytes: {}", data.len(), format_hex(data));
        match self.output.as_mut() {
            Some(output) => Ok(output.send(data)?),
            None => Err(Error::Midi("output port already closed".to_string())),
        }
    }

    fn close(&mut self) -> Result<()> {
        // the handler slot stays; a handler on a closed transport simply
        // never fires again
        if let Some(input) = self.input.take() {
            input.close();
        }
        if let Some(output) = self.output.take() {
            output.close();
        }
        Ok(())
    }
}

fn find_input_port(midi_in: &MidiInput, pattern: &str) -> Option<(midir::MidiInputPort, String)> {
    let wanted = pattern.to_lowercase();
    for port in midi_in.ports() {
        if let Ok(name) = midi_in.port_name(&port) {
            if name.to_lowercase().contains(&wanted) {
                debug!("Found input port '{}' matching '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

fn find_output_port(
    midi_out: &MidiOutput,
    pattern: &str,
) -> Option<(midir::MidiOutputPort, String)> {
    let wanted = pattern.to_lowercase();
    for port in midi_out.ports() {
        if let Ok(name) = midi_out.port_name(&port) {
            if name.to_lowercase().contains(&wanted) {
                debug!("Found output port '{}' matching '{}'", name, pattern);
                return Some((port, name));
            }
        }
    }
    None
}

/// Port discovery helpers for finding connected pianos.
pub mod discovery {
    use midir::{MidiInput, MidiOutput};

    use crate::error::{Error, Result};

    /// Roland pianos advertise their USB MIDI ports under this prefix.
    pub const DEVICE_NAME_PREFIX: &str = "Roland Digital Piano";

    /// All MIDI input port names, in system order.
    pub fn list_input_ports() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("roland-gw-list")?;
        let mut names = Vec::new();
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// All MIDI output port names, in system order.
    pub fn list_output_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("roland-gw-list")?;
        let mut names = Vec::new();
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Port name of the `index`-th connected piano.
    pub fn discover(index: usize) -> Result<String> {
        list_input_ports()?
            .into_iter()
            .filter(|name| name.starts_with(DEVICE_NAME_PREFIX))
            .nth(index)
            .ok_or_else(|| Error::DeviceNotFound(format!("{} #{}", DEVICE_NAME_PREFIX, index)))
    }
}
