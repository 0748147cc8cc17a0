//! MPEG-TS (Transport Stream) Analyzer Module.
//!
//! This module turns a raw byte stream into complete bouquet association
//! table instances.
//!
//! # Pipeline
//! - [`PacketSynchronizer`] - byte stream to aligned 188-byte packets
//! - [`PidFilter`] - keeps the packets of the configured PID
//! - [`SectionReassembler`] - packets to CRC-checked, complete sub-tables
//!
//! # Usage
//! ```ignore
//! use batdump::ts_analyzer::{PacketSynchronizer, PidFilter, SectionReassembler};
//!
//! let mut sync = PacketSynchronizer::new(std::io::stdin().lock());
//! let filter = PidFilter::new(pid::FREESAT_BAT);
//! let mut reassembler = SectionReassembler::default();
//!
//! while let Some(packet) = sync.next_packet() {
//!     if filter.matches(packet) {
//!         reassembler.push_packet(packet, |table| println!("{:?}", table));
//!     }
//! }
//! ```

pub mod bat;
pub mod descriptors;
pub mod packet;
pub mod psi;
pub mod reassembler;
pub mod sync;

pub use bat::{BatSection, TransportStreamEntry};
pub use descriptors::{
    BouquetNameDescriptor, ChannelNumberDescriptor, Descriptor, RegionListDescriptor,
};
pub use packet::{PidFilter, TsHeader, TsPacket, MAX_PID, SYNC_BYTE, TS_PACKET_SIZE};
pub use psi::{PsiHeader, PsiSection, SectionCollector};
pub use reassembler::{ReassemblerConfig, ReassemblerStats, SectionReassembler, TableInstance};
pub use sync::{PacketSynchronizer, SyncStats, DEFAULT_BUFFER_SIZE};

/// Well-known PIDs.
pub mod pid {
    /// PID carrying the Freesat bouquet association table.
    pub const FREESAT_BAT: u16 = 0x0BBA;
}

/// Table IDs for SI tables.
pub mod table_id {
    /// Network Information Section - actual.
    pub const NIT_ACTUAL: u8 = 0x40;
    /// Bouquet Association Section.
    pub const BAT: u8 = 0x4A;
}

/// Descriptor tags used in the BAT.
pub mod descriptor_tag {
    /// Bouquet name descriptor (0x47).
    pub const BOUQUET_NAME: u8 = 0x47;
    /// Freesat channel number descriptor (0xD3).
    pub const CHANNEL_NUMBER: u8 = 0xD3;
    /// Freesat region list descriptor (0xD4).
    pub const REGION_LIST: u8 = 0xD4;
}
