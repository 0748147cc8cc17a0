//! BAT (Bouquet Association Table) section parsing.
//!
//! The BAT shares its layout with the NIT: a bouquet descriptor loop followed
//! by a transport stream loop, each entry carrying its own descriptors.

use super::descriptors::{parse_descriptor_loop, Descriptor};
use super::psi::PsiSection;
use super::table_id;

/// Transport stream entry in the BAT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportStreamEntry {
    /// Transport stream ID.
    pub transport_stream_id: u16,
    /// Original network ID.
    pub original_network_id: u16,
    /// Transport descriptors.
    pub descriptors: Vec<Descriptor>,
}

/// The loops of one BAT section.
///
/// Bouquet ID, version and section numbers stay in the section's
/// [`PsiHeader`](super::psi::PsiHeader).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatSection {
    /// Bouquet descriptors.
    pub descriptors: Vec<Descriptor>,
    /// Transport stream loop.
    pub transport_streams: Vec<TransportStreamEntry>,
}

impl BatSection {
    /// Parse a BAT from a PSI section.
    ///
    /// A transport stream entry whose descriptors run past the section ends
    /// the loop; entries before it are kept.
    pub fn parse(section: &PsiSection) -> Result<Self, &'static str> {
        if section.header.table_id != table_id::BAT {
            return Err("Not a BAT section");
        }

        let data = section.data;
        if data.len() < 2 {
            return Err("BAT data too short");
        }

        let descriptors_length = ((data[0] as usize & 0x0F) << 8) | data[1] as usize;
        if data.len() < 2 + descriptors_length + 2 {
            return Err("Invalid bouquet descriptors length");
        }

        let mut bat = BatSection {
            descriptors: parse_descriptor_loop(&data[2..2 + descriptors_length]),
            transport_streams: Vec::new(),
        };

        let ts_loop_offset = 2 + descriptors_length;
        let ts_loop_length =
            ((data[ts_loop_offset] as usize & 0x0F) << 8) | data[ts_loop_offset + 1] as usize;

        let mut offset = ts_loop_offset + 2;
        let ts_loop_end = (offset + ts_loop_length).min(data.len());

        while offset + 6 <= ts_loop_end {
            let transport_stream_id = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let original_network_id = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
            let ts_descriptors_length =
                ((data[offset + 4] as usize & 0x0F) << 8) | data[offset + 5] as usize;

            offset += 6;

            if offset + ts_descriptors_length > ts_loop_end {
                break;
            }

            bat.transport_streams.push(TransportStreamEntry {
                transport_stream_id,
                original_network_id,
                descriptors: parse_descriptor_loop(&data[offset..offset + ts_descriptors_length]),
            });
            offset += ts_descriptors_length;
        }

        Ok(bat)
    }
}
