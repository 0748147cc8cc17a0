//! MPEG-TS packet parsing.
//!
//! This module handles the 188-byte transport packet header and the PID
//! filter placed in front of section reassembly.

/// TS packet size in bytes.
pub const TS_PACKET_SIZE: usize = 188;

/// TS sync byte (0x47).
pub const SYNC_BYTE: u8 = 0x47;

/// Largest value a 13-bit PID can take.
pub const MAX_PID: u16 = 0x1FFF;

/// Parsed TS packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsHeader {
    /// Transport error indicator.
    pub transport_error: bool,
    /// Payload unit start indicator.
    pub payload_unit_start: bool,
    /// Packet Identifier (13 bits).
    pub pid: u16,
    /// Transport scrambling control (2 bits).
    pub scrambling_control: u8,
    /// Adaptation field control (2 bits).
    pub adaptation_field_control: u8,
    /// Continuity counter (4 bits).
    pub continuity_counter: u8,
}

impl TsHeader {
    /// Check if packet has adaptation field.
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control & 0x02 != 0
    }

    /// Check if packet has payload.
    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control & 0x01 != 0
    }

    /// Check if packet is scrambled.
    pub fn is_scrambled(&self) -> bool {
        self.scrambling_control != 0
    }
}

/// A parsed TS packet.
#[derive(Debug, Clone)]
pub struct TsPacket<'a> {
    /// Packet header.
    pub header: TsHeader,
    /// Discontinuity indicator from the adaptation field.
    pub discontinuity: bool,
    /// Payload data.
    pub payload: &'a [u8],
}

impl<'a> TsPacket<'a> {
    /// Parse a TS packet from raw bytes.
    ///
    /// # Arguments
    /// * `data` - Slice containing at least 188 bytes
    ///
    /// # Returns
    /// Parsed packet or error message
    pub fn parse(data: &'a [u8]) -> Result<Self, &'static str> {
        if data.len() < TS_PACKET_SIZE {
            return Err("Packet too short");
        }

        if data[0] != SYNC_BYTE {
            return Err("Invalid sync byte");
        }

        let header = TsHeader {
            transport_error: data[1] & 0x80 != 0,
            payload_unit_start: data[1] & 0x40 != 0,
            pid: packet_pid(data),
            scrambling_control: (data[3] >> 6) & 0x03,
            adaptation_field_control: (data[3] >> 4) & 0x03,
            continuity_counter: data[3] & 0x0F,
        };

        let mut offset = 4;
        let mut discontinuity = false;
        if header.has_adaptation_field() {
            let af_length = data[4] as usize;
            if af_length > 0 {
                discontinuity = data[5] & 0x80 != 0;
            }
            offset = 5 + af_length;
        }

        let payload = if header.has_payload() && offset < TS_PACKET_SIZE {
            &data[offset..TS_PACKET_SIZE]
        } else {
            &[][..]
        };

        Ok(TsPacket {
            header,
            discontinuity,
            payload,
        })
    }
}

/// Extract the 13-bit PID from a packet.
///
/// The three flag bits above the PID in byte 1 are masked off.
pub fn packet_pid(data: &[u8]) -> u16 {
    ((data[1] as u16 & 0x1F) << 8) | data[2] as u16
}

/// Selects the packets of a single PID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidFilter {
    pid: u16,
}

impl PidFilter {
    pub fn new(pid: u16) -> Self {
        Self { pid: pid & MAX_PID }
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    /// Check whether the packet belongs to the selected PID.
    pub fn matches(&self, packet: &[u8]) -> bool {
        packet.len() >= 3 && packet_pid(packet) == self.pid
    }
}
