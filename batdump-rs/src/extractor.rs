//! Bouquet extraction pipeline.
//!
//! This module wires the packet synchronizer, PID filter, section
//! reassembler and bouquet decoder together and owns the resulting
//! [`Document`].

use std::io::Read;

use log::info;

use batdump_document::Document;

use crate::decoder::{BouquetTableDecoder, DecoderStats};
use crate::ts_analyzer::{
    pid, PacketSynchronizer, PidFilter, ReassemblerConfig, ReassemblerStats, SectionReassembler,
    SyncStats, DEFAULT_BUFFER_SIZE,
};

/// Configuration for the extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// PID carrying the bouquet association table.
    pub pid: u16,
    /// Section reassembly settings.
    pub reassembler: ReassemblerConfig,
    /// Synchronizer buffer size in bytes.
    pub buffer_size: usize,
    /// Verify the following sync byte after a loss of sync.
    pub strict_sync: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            pid: pid::FREESAT_BAT,
            reassembler: ReassemblerConfig::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            strict_sync: false,
        }
    }
}

/// Statistics gathered over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractorStats {
    /// Packets processed.
    pub packets: u64,
    /// Packets on the configured PID.
    pub pid_packets: u64,
    /// Synchronizer counters (zero unless a synchronizer was run).
    pub sync: SyncStats,
    /// Section reassembly counters.
    pub reassembler: ReassemblerStats,
    /// Version gate counters.
    pub decoder: DecoderStats,
}

/// Extracts bouquet metadata from TS packets.
#[derive(Debug)]
pub struct BatExtractor {
    config: ExtractorConfig,
    filter: PidFilter,
    reassembler: SectionReassembler,
    decoder: BouquetTableDecoder,
    document: Document,
    packets: u64,
    pid_packets: u64,
    sync: SyncStats,
}

impl BatExtractor {
    /// Create a new extractor with the given configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            filter: PidFilter::new(config.pid),
            reassembler: SectionReassembler::new(config.reassembler.clone()),
            decoder: BouquetTableDecoder::new(),
            document: Document::new(),
            packets: 0,
            pid_packets: 0,
            sync: SyncStats::default(),
            config,
        }
    }

    /// Process a single aligned TS packet.
    pub fn process_packet(&mut self, packet: &[u8]) {
        self.packets += 1;
        if !self.filter.matches(packet) {
            return;
        }
        self.pid_packets += 1;

        let Self {
            reassembler,
            decoder,
            document,
            ..
        } = self;
        reassembler.push_packet(packet, |instance| {
            decoder.on_table_instance(&instance, document);
        });
    }

    /// Pull packets from `sync` until it is exhausted.
    pub fn run<R: Read>(&mut self, sync: &mut PacketSynchronizer<R>) {
        while let Some(packet) = sync.next_packet() {
            self.process_packet(packet);
        }
        self.sync = sync.stats();
        self.log_summary();
    }

    /// Read `source` to the end, synchronizing as configured.
    pub fn run_reader<R: Read>(&mut self, source: R) {
        let mut sync = PacketSynchronizer::with_capacity(source, self.config.buffer_size)
            .strict(self.config.strict_sync);
        self.run(&mut sync);
    }

    fn log_summary(&self) {
        let stats = self.stats();
        info!(
            "Processed {} packets ({} on PID {}), skipped {} bytes in {} sync losses",
            stats.packets,
            stats.pid_packets,
            self.filter.pid(),
            stats.sync.skipped_bytes,
            stats.sync.sync_losses
        );
        info!(
            "{} sections ({} CRC errors, {} malformed), {} tables accepted, {} bouquets",
            stats.reassembler.sections,
            stats.reassembler.crc_errors,
            stats.reassembler.malformed,
            stats.decoder.accepted,
            self.document.len()
        );
    }

    pub fn stats(&self) -> ExtractorStats {
        ExtractorStats {
            packets: self.packets,
            pid_packets: self.pid_packets,
            sync: self.sync,
            reassembler: self.reassembler.stats(),
            decoder: self.decoder.stats(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Take the document, consuming the extractor.
    pub fn into_document(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use batdump_document::Value;

    use crate::ts_analyzer::psi::tests::build_section;
    use crate::ts_analyzer::reassembler::tests::{bat_body, packetize};
    use crate::ts_analyzer::table_id;

    fn test_bat(bouquet_id: u16, version: u8) -> Vec<u8> {
        let descriptors = [
            &[0x47, 0x04, b'T', b'e', b's', b't'][..],
            &[0xD4, 0x0A, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x04, b'E', b'a', b's', b't'][..],
        ]
        .concat();
        let channels = vec![0xD3, 0x09, 0x00, 0x64, 0x00, 0x00, 0x04, 0x00, 0x65, 0x00, 0x01];
        build_section(
            table_id::BAT,
            bouquet_id,
            version,
            0,
            0,
            &bat_body(&descriptors, &[(2000, 2, channels)]),
        )
    }

    fn null_packet() -> Vec<u8> {
        let mut packet = vec![0xFFu8; 188];
        packet[..4].copy_from_slice(&[0x47, 0x1F, 0xFF, 0x10]);
        packet
    }

    #[test]
    fn test_end_to_end() {
        let mut stream = vec![0x00u8; 100];
        let mut cc = 0;
        stream.extend(null_packet());
        for packet in packetize(3002, &mut cc, &[test_bat(42, 1)]) {
            stream.extend(packet);
        }
        stream.extend(null_packet());

        let mut extractor = BatExtractor::new(ExtractorConfig::default());
        extractor.run_reader(Cursor::new(stream));

        let stats = extractor.stats();
        assert_eq!(stats.packets, 3);
        assert_eq!(stats.pid_packets, 1);
        assert_eq!(stats.sync.skipped_bytes, 100);

        let value = extractor.into_document().to_value();
        let root = value.as_object().unwrap();
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["42"]);

        let bouquet = value.get("42").unwrap();
        assert_eq!(bouquet.get("version").and_then(Value::as_i64), Ok(1));
        assert_eq!(bouquet.get("name").and_then(Value::as_str), Ok("Test"));
        assert_eq!(
            bouquet
                .get("regions")
                .and_then(|r| r.get("1"))
                .and_then(Value::as_str),
            Ok("East")
        );

        let channel = bouquet
            .get("services")
            .and_then(|s| s.get("100"))
            .and_then(|s| s.get("channelnumbers"))
            .and_then(|c| c.at(0))
            .unwrap();
        assert_eq!(channel.get("number").and_then(Value::as_i64), Ok(101));
        assert_eq!(channel.get("region").and_then(Value::as_i64), Ok(1));
    }

    #[test]
    fn test_written_json() {
        let mut cc = 0;
        let mut extractor = BatExtractor::new(ExtractorConfig::default());
        for packet in packetize(3002, &mut cc, &[test_bat(42, 1)]) {
            extractor.process_packet(&packet);
        }

        let mut out = Vec::new();
        extractor.document().write_json(&mut out, true).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "42": {
                    "version": 1,
                    "name": "Test",
                    "regions": { "1": "East" },
                    "services": {
                        "100": { "channelnumbers": [{ "number": 101, "region": 1 }] }
                    }
                }
            })
        );
    }

    #[test]
    fn test_other_pid_ignored() {
        let mut cc = 0;
        let mut extractor = BatExtractor::new(ExtractorConfig::default());
        for packet in packetize(0x0011, &mut cc, &[test_bat(42, 1)]) {
            extractor.process_packet(&packet);
        }

        assert!(extractor.document().is_empty());
        assert_eq!(extractor.stats().pid_packets, 0);
    }

    #[test]
    fn test_configured_pid() {
        let config = ExtractorConfig {
            pid: 0x0011,
            ..Default::default()
        };
        let mut cc = 0;
        let mut extractor = BatExtractor::new(config);
        for packet in packetize(0x0011, &mut cc, &[test_bat(1, 0), test_bat(2, 0)]) {
            extractor.process_packet(&packet);
        }

        assert_eq!(extractor.document().len(), 2);
    }

    #[test]
    fn test_repeated_tables_keep_newest() {
        let mut stream = Vec::new();
        let mut cc = 0;
        for version in [1, 3, 2, 3] {
            for packet in packetize(3002, &mut cc, &[test_bat(42, version)]) {
                stream.extend(packet);
            }
        }

        let mut extractor = BatExtractor::new(ExtractorConfig::default());
        extractor.run_reader(Cursor::new(stream));

        assert_eq!(extractor.document().version_of(42), Some(3));
        assert_eq!(extractor.stats().decoder.accepted, 2);
        assert_eq!(extractor.stats().decoder.stale, 2);
    }
}
