//! MIDI message classification and encoding.
//!
//! The register protocol rides on SysEx frames, so inbound handling only
//! needs to tell exclusive messages apart from the channel traffic a piano
//! also produces (notes, pedals, active sensing). Encoding covers SysEx
//! plus the channel voice messages the shutdown path emits.

use std::fmt;

/// A MIDI message, reduced to the kinds this crate inspects or sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// System Exclusive payload, without the F0/F7 delimiters
    SysEx { data: Vec<u8> },

    /// Anything else (aftertouch, pitch bend, clocks, active sensing);
    /// carried by status byte so monitors can still name it
    Other { status: u8 },
}

impl MidiMessage {
    /// Parse a complete MIDI message from raw bytes.
    ///
    /// midir always delivers whole messages with a leading status byte, so
    /// running status never reaches us; a dangling data byte returns None.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;
        if status < 0x80 {
            return None;
        }

        if status < 0xF0 {
            let channel = status & 0x0F;
            match status & 0xF0 {
                0x80 => {
                    if data.len() < 3 {
                        return None;
                    }
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data[1] & 0x7F,
                        velocity: data[2] & 0x7F,
                    })
                }
                0x90 => {
                    if data.len() < 3 {
                        return None;
                    }
                    let note = data[1] & 0x7F;
                    let velocity = data[2] & 0x7F;
                    // velocity 0 is Note Off by convention
                    if velocity == 0 {
                        Some(MidiMessage::NoteOff {
                            channel,
                            note,
                            velocity: 0,
                        })
                    } else {
                        Some(MidiMessage::NoteOn {
                            channel,
                            note,
                            velocity,
                        })
                    }
                }
                0xB0 => {
                    if data.len() < 3 {
                        return None;
                    }
                    Some(MidiMessage::ControlChange {
                        channel,
                        cc: data[1] & 0x7F,
                        value: data[2] & 0x7F,
                    })
                }
                0xC0 => {
                    if data.len() < 2 {
                        return None;
                    }
                    Some(MidiMessage::ProgramChange {
                        channel,
                        program: data[1] & 0x7F,
                    })
                }
                _ => Some(MidiMessage::Other { status }),
            }
        } else if status == 0xF0 {
            // System Exclusive - payload runs to the 0xF7 terminator
            let end = data.iter().position(|&b| b == 0xF7)?;
            Some(MidiMessage::SysEx {
                data: data[1..end].to_vec(),
            })
        } else {
            Some(MidiMessage::Other { status })
        }
    }

    /// Encode the message to wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            MidiMessage::SysEx { ref data } => {
                let mut result = Vec::with_capacity(data.len() + 2);
                result.push(0xF0);
                result.extend_from_slice(data);
                result.push(0xF7);
                result
            }
            MidiMessage::Other { status } => vec![status],
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity),
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::ProgramChange { channel, program } => {
                write!(f, "ProgramChange ch:{} p:{}", channel + 1, program)
            }
            MidiMessage::SysEx { ref data } => write!(f, "SysEx {} bytes", data.len()),
            MidiMessage::Other { status } => write!(f, "Status {:02X}", status),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_parsing() {
        let data = vec![0x90, 60, 100];
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 0,
                note: 60,
                velocity: 100,
            }
        );
    }

    #[test]
    fn test_note_on_velocity_zero() {
        let data = vec![0x90, 60, 0];
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 0,
                note: 60,
                velocity: 0,
            }
        );
    }

    #[test]
    fn test_control_change_round_trip() {
        let msg = MidiMessage::ControlChange {
            channel: 2,
            cc: 123,
            value: 0,
        };
        let bytes = msg.encode();
        assert_eq!(bytes, vec![0xB2, 123, 0]);
        assert_eq!(MidiMessage::parse(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_sysex_parse_strips_delimiters() {
        let data = vec![0xF0, 0x41, 0x10, 0x00, 0xF7];
        let msg = MidiMessage::parse(&data).unwrap();
        assert_eq!(
            msg,
            MidiMessage::SysEx {
                data: vec![0x41, 0x10, 0x00]
            }
        );
    }

    #[test]
    fn test_sysex_encode_wraps() {
        let msg = MidiMessage::SysEx {
            data: vec![0x41, 0x10],
        };
        assert_eq!(msg.encode(), vec![0xF0, 0x41, 0x10, 0xF7]);
    }

    #[test]
    fn test_unterminated_sysex_is_none() {
        assert_eq!(MidiMessage::parse(&[0xF0, 0x41, 0x10]), None);
    }

    #[test]
    fn test_active_sensing_is_other() {
        let msg = MidiMessage::parse(&[0xFE]).unwrap();
        assert_eq!(msg, MidiMessage::Other { status: 0xFE });
        assert_eq!(msg.to_string(), "Status FE");
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xF0, 0x41, 0x07]), "F0 41 07");
    }
}
