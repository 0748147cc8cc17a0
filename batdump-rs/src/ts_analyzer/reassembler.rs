//! Section reassembly into complete table instances.
//!
//! Packets go in, complete sub-tables come out: sections are collected per
//! PID, validated, grouped by `(table_id, table_id_extension)`, and handed to
//! the callback once every section of one version has been seen.

use std::collections::HashMap;

use log::{debug, trace};

use super::bat::{BatSection, TransportStreamEntry};
use super::descriptors::Descriptor;
use super::packet::TsPacket;
use super::psi::{PsiSection, SectionCollector};
use super::table_id;

/// A complete, reassembled bouquet table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableInstance {
    /// Table ID.
    pub table_id: u8,
    /// Table ID extension (bouquet ID).
    pub extension: u16,
    /// Version number (5 bits).
    pub version: u8,
    /// Bouquet descriptors of all sections, in section order.
    pub descriptors: Vec<Descriptor>,
    /// Transport stream entries of all sections, in section order.
    pub transport_streams: Vec<TransportStreamEntry>,
}

/// Configuration for the reassembler.
#[derive(Debug, Clone)]
pub struct ReassemblerConfig {
    /// Whether to drop sections with a bad CRC.
    pub verify_crc: bool,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self { verify_crc: true }
    }
}

/// Counters kept by the reassembler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReassemblerStats {
    /// Complete sections extracted from packets.
    pub sections: u64,
    /// Sections dropped for a CRC mismatch.
    pub crc_errors: u64,
    /// Sections dropped as malformed.
    pub malformed: u64,
    /// Table instances delivered.
    pub instances: u64,
}

/// Sections of one sub-table collected so far.
#[derive(Debug)]
struct Subtable {
    version: u8,
    sections: Vec<Option<BatSection>>,
    /// Last version handed to the callback.
    delivered: Option<u8>,
}

impl Subtable {
    fn new(version: u8, last_section_number: u8) -> Self {
        Self {
            version,
            sections: vec![None; last_section_number as usize + 1],
            delivered: None,
        }
    }

    fn reset(&mut self, version: u8, last_section_number: u8) {
        self.version = version;
        self.sections.clear();
        self.sections.resize(last_section_number as usize + 1, None);
    }

    fn is_complete(&self) -> bool {
        self.sections.iter().all(Option::is_some)
    }

    /// Combine the collected sections into one instance.
    fn take_instance(&mut self, table_id: u8, extension: u16) -> TableInstance {
        let mut instance = TableInstance {
            table_id,
            extension,
            version: self.version,
            ..Default::default()
        };

        for section in self.sections.iter_mut().filter_map(Option::take) {
            instance.descriptors.extend(section.descriptors);
            instance.transport_streams.extend(section.transport_streams);
        }

        self.delivered = Some(self.version);
        instance
    }
}

/// Reassembles table instances from TS packets.
#[derive(Debug, Default)]
pub struct SectionReassembler {
    config: ReassemblerConfig,
    /// Section collectors by PID.
    collectors: HashMap<u16, SectionCollector>,
    /// Sub-tables by (table_id, table_id_extension).
    subtables: HashMap<(u8, u16), Subtable>,
    stats: ReassemblerStats,
}

impl SectionReassembler {
    pub fn new(config: ReassemblerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn stats(&self) -> ReassemblerStats {
        self.stats
    }

    /// Feed one TS packet.
    ///
    /// `on_table` is called once for every table instance the packet
    /// completes.
    pub fn push_packet<F>(&mut self, data: &[u8], mut on_table: F)
    where
        F: FnMut(TableInstance),
    {
        let packet = match TsPacket::parse(data) {
            Ok(p) => p,
            Err(e) => {
                trace!("Dropping packet: {}", e);
                return;
            }
        };

        let header = packet.header;
        if header.transport_error || header.is_scrambled() || !header.has_payload() {
            return;
        }

        let sections = self.collectors.entry(header.pid).or_default().add_data(
            packet.payload,
            header.continuity_counter,
            header.payload_unit_start,
            packet.discontinuity,
        );

        for raw in sections {
            self.stats.sections += 1;
            if let Some(instance) = self.process_section(&raw) {
                self.stats.instances += 1;
                on_table(instance);
            }
        }
    }

    /// Process a complete section, returning the instance it completes.
    fn process_section(&mut self, raw: &[u8]) -> Option<TableInstance> {
        let section = match PsiSection::parse(raw) {
            Ok(s) => s,
            Err(e) => {
                debug!("Malformed section: {}", e);
                self.stats.malformed += 1;
                return None;
            }
        };

        let header = section.header;
        if header.table_id != table_id::BAT {
            trace!("Skipping table 0x{:02X}", header.table_id);
            return None;
        }

        if self.config.verify_crc && !section.verify_crc(raw) {
            debug!(
                "CRC mismatch in table 0x{:02X} ext {} section {}",
                header.table_id, header.table_id_extension, header.section_number
            );
            self.stats.crc_errors += 1;
            return None;
        }

        if !header.current_next_indicator {
            return None;
        }

        if header.section_number > header.last_section_number {
            debug!(
                "Section number {} beyond last section {}",
                header.section_number, header.last_section_number
            );
            self.stats.malformed += 1;
            return None;
        }

        let bat = match BatSection::parse(&section) {
            Ok(b) => b,
            Err(e) => {
                debug!("Malformed BAT section: {}", e);
                self.stats.malformed += 1;
                return None;
            }
        };

        let key = (header.table_id, header.table_id_extension);
        let version = header.version_number;
        let last = header.last_section_number;
        let subtable = self
            .subtables
            .entry(key)
            .or_insert_with(|| Subtable::new(version, last));

        if subtable.delivered == Some(version) {
            return None;
        }

        if subtable.version != version || subtable.sections.len() != last as usize + 1 {
            subtable.reset(version, last);
        }

        subtable.sections[header.section_number as usize] = Some(bat);

        if !subtable.is_complete() {
            return None;
        }

        let instance = subtable.take_instance(key.0, key.1);
        debug!(
            "Table 0x{:02X} ext {} version {} complete ({} sections)",
            instance.table_id,
            instance.extension,
            instance.version,
            last as usize + 1
        );
        Some(instance)
    }
}
