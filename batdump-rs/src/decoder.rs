//! Bouquet table decoding.
//!
//! Turns one reassembled BAT instance into a [`Bouquet`] and stores it in the
//! [`Document`], unless the document already holds that version or a newer
//! one.

use log::{debug, info, trace};

use batdump_document::{Bouquet, Document};

use crate::ts_analyzer::descriptors::{
    BouquetNameDescriptor, ChannelNumberDescriptor, RegionListDescriptor,
};
use crate::ts_analyzer::{descriptor_tag, table_id, TableInstance};

/// What happened to a table instance handed to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instance replaced the stored bouquet.
    Accepted,
    /// The document already holds this version or a newer one.
    Stale,
    /// Not a bouquet association table.
    Ignored,
}

/// Counters kept by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Instances that replaced the stored bouquet.
    pub accepted: u64,
    /// Instances not newer than the stored bouquet.
    pub stale: u64,
    /// Instances of other tables.
    pub ignored: u64,
}

/// Applies bouquet table instances to a document.
#[derive(Debug, Default)]
pub struct BouquetTableDecoder {
    stats: DecoderStats,
}

impl BouquetTableDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Decode one table instance into `doc`.
    ///
    /// Versions are compared as plain integers, so a version counter that
    /// wraps from 31 back to 0 is treated as older.
    pub fn on_table_instance(&mut self, instance: &TableInstance, doc: &mut Document) -> Outcome {
        let outcome = apply(instance, doc);
        match outcome {
            Outcome::Accepted => self.stats.accepted += 1,
            Outcome::Stale => self.stats.stale += 1,
            Outcome::Ignored => self.stats.ignored += 1,
        }
        outcome
    }
}

fn apply(instance: &TableInstance, doc: &mut Document) -> Outcome {
    if instance.table_id != table_id::BAT {
        trace!("Ignoring table 0x{:02X}", instance.table_id);
        return Outcome::Ignored;
    }

    let bouquet_id = instance.extension;
    if let Some(current) = doc.version_of(bouquet_id) {
        if current >= instance.version {
            debug!(
                "Bouquet {} version {} not newer than {}",
                bouquet_id, instance.version, current
            );
            return Outcome::Stale;
        }
    }

    let bouquet = decode_bouquet(instance);
    info!(
        "Bouquet {} version {}: {} regions, {} services",
        bouquet_id,
        bouquet.version,
        bouquet.regions.len(),
        bouquet.services.len()
    );
    doc.replace(bouquet_id, bouquet);
    Outcome::Accepted
}

/// Build a fresh bouquet record from the instance's descriptors.
fn decode_bouquet(instance: &TableInstance) -> Bouquet {
    let mut bouquet = Bouquet::new(instance.version);

    for desc in &instance.descriptors {
        match desc.tag {
            descriptor_tag::BOUQUET_NAME => {
                bouquet.set_name(&BouquetNameDescriptor::parse(&desc.data).name);
            }
            descriptor_tag::REGION_LIST => {
                for region in RegionListDescriptor::parse(&desc.data).regions {
                    bouquet.insert_region(region.region_id, &region.name);
                }
            }
            _ => {}
        }
    }

    for ts in &instance.transport_streams {
        for desc in &ts.descriptors {
            if desc.tag != descriptor_tag::CHANNEL_NUMBER {
                continue;
            }
            for service in ChannelNumberDescriptor::parse(&desc.data).services {
                bouquet
                    .service_mut(service.service_id)
                    .extend(service.channels);
            }
        }
    }

    bouquet
}

#[cfg(test)]
mod tests {
    use super::*;
    use batdump_document::ChannelNumber;

    use crate::ts_analyzer::{Descriptor, TransportStreamEntry};

    fn descriptor(tag: u8, data: &[u8]) -> Descriptor {
        Descriptor {
            tag,
            data: data.to_vec(),
        }
    }

    fn instance(bouquet_id: u16, version: u8) -> TableInstance {
        TableInstance {
            table_id: table_id::BAT,
            extension: bouquet_id,
            version,
            ..Default::default()
        }
    }

    fn ts_entry(descriptors: Vec<Descriptor>) -> TransportStreamEntry {
        TransportStreamEntry {
            transport_stream_id: 2000,
            original_network_id: 2,
            descriptors,
        }
    }

    #[test]
    fn test_version_gate() {
        let mut doc = Document::new();
        let mut decoder = BouquetTableDecoder::new();

        let outcomes: Vec<Outcome> = [3, 2, 5, 5]
            .into_iter()
            .map(|v| decoder.on_table_instance(&instance(7, v), &mut doc))
            .collect();

        assert_eq!(
            outcomes,
            vec![
                Outcome::Accepted,
                Outcome::Stale,
                Outcome::Accepted,
                Outcome::Stale
            ]
        );
        assert_eq!(doc.version_of(7), Some(5));
        assert_eq!(decoder.stats().accepted, 2);
        assert_eq!(decoder.stats().stale, 2);
    }

    #[test]
    fn test_stale_instance_has_no_side_effects() {
        let mut doc = Document::new();
        let mut decoder = BouquetTableDecoder::new();

        let mut first = instance(7, 4);
        first.descriptors.push(descriptor(0x47, b"First"));
        decoder.on_table_instance(&first, &mut doc);

        let mut same = instance(7, 4);
        same.descriptors.push(descriptor(0x47, b"Second"));
        decoder.on_table_instance(&same, &mut doc);

        assert_eq!(doc.get(7).unwrap().name.as_deref(), Some(&b"First"[..]));
    }

    #[test]
    fn test_newer_version_replaces_wholesale() {
        let mut doc = Document::new();
        let mut decoder = BouquetTableDecoder::new();

        let mut old = instance(7, 1);
        old.descriptors.push(descriptor(0x47, b"Old"));
        old.descriptors
            .push(descriptor(0xD4, &[0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x01, b'A']));
        decoder.on_table_instance(&old, &mut doc);

        decoder.on_table_instance(&instance(7, 2), &mut doc);

        let bouquet = doc.get(7).unwrap();
        assert_eq!(bouquet.version, 2);
        assert!(bouquet.name.is_none());
        assert!(bouquet.regions.is_empty());
    }

    #[test]
    fn test_region_descriptor() {
        let mut table = instance(1, 0);
        table.descriptors.push(descriptor(
            0xD4,
            &[
                0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x01, b'A',
                0x00, 0x02, 0xFF, 0xFF, 0xFF, 0x02, b'B', b'B',
            ],
        ));

        let mut doc = Document::new();
        BouquetTableDecoder::new().on_table_instance(&table, &mut doc);

        let regions = doc.to_value();
        let regions = regions.get("1").and_then(|b| b.get("regions")).unwrap();
        assert_eq!(regions.get("1").and_then(|r| r.as_str()), Ok("A"));
        assert_eq!(regions.get("2").and_then(|r| r.as_str()), Ok("BB"));
        assert_eq!(regions.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_channel_descriptor() {
        let mut table = instance(1, 0);
        table.transport_streams.push(ts_entry(vec![descriptor(
            0xD3,
            &[0x00, 0x64, 0x00, 0x00, 0x04, 0x12, 0x34, 0x00, 0x07],
        )]));

        let mut doc = Document::new();
        BouquetTableDecoder::new().on_table_instance(&table, &mut doc);

        assert_eq!(
            doc.get(1).unwrap().channels(100),
            Some(&[ChannelNumber::new(0x234, 7)][..])
        );
    }

    #[test]
    fn test_channel_lists_concatenate_across_entries() {
        let block = |number: u8, region: u8| {
            descriptor(0xD3, &[0x00, 0x64, 0x00, 0x00, 0x04, 0x00, number, 0x00, region])
        };

        let mut table = instance(1, 0);
        table.transport_streams.push(ts_entry(vec![block(101, 1)]));
        table
            .transport_streams
            .push(ts_entry(vec![block(101, 1), block(102, 2)]));

        let mut doc = Document::new();
        BouquetTableDecoder::new().on_table_instance(&table, &mut doc);

        assert_eq!(
            doc.get(1).unwrap().channels(100).unwrap(),
            &[
                ChannelNumber::new(101, 1),
                ChannelNumber::new(101, 1),
                ChannelNumber::new(102, 2)
            ]
        );
    }

    #[test]
    fn test_truncated_descriptors_keep_prior_records() {
        let mut table = instance(1, 0);
        table.descriptors.push(descriptor(
            0xD4,
            &[
                0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x01, b'A',
                0x00, 0x02, 0xFF, 0xFF, 0xFF, 0x05, b'B',
            ],
        ));
        table.transport_streams.push(ts_entry(vec![descriptor(
            0xD3,
            &[
                0x00, 0x01, 0x00, 0x00, 0x04, 0x00, 0x65, 0x00, 0x01,
                0x00, 0x02, 0x00, 0x00, 0x08, 0x00, 0x66,
            ],
        )]));

        let mut doc = Document::new();
        BouquetTableDecoder::new().on_table_instance(&table, &mut doc);

        let bouquet = doc.get(1).unwrap();
        assert_eq!(bouquet.regions.len(), 1);
        assert_eq!(bouquet.regions.get(&1).map(Vec::as_slice), Some(&b"A"[..]));
        assert_eq!(bouquet.services.len(), 1);
        assert!(bouquet.channels(2).is_none());
    }

    #[test]
    fn test_other_table_ignored() {
        let mut table = instance(1, 0);
        table.table_id = table_id::NIT_ACTUAL;

        let mut doc = Document::new();
        assert_eq!(
            BouquetTableDecoder::new().on_table_instance(&table, &mut doc),
            Outcome::Ignored
        );
        assert!(doc.is_empty());
    }
}
