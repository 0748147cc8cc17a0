//! Descriptor parsing for bouquet association tables.
//!
//! Region list and channel number descriptors are concatenations of
//! variable-length records. A record that does not fit in what is left of
//! the payload ends parsing; everything decoded before it is kept.

use batdump_document::ChannelNumber;

/// A raw descriptor from a descriptor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Descriptor tag.
    pub tag: u8,
    /// Payload (after tag and length).
    pub data: Vec<u8>,
}

/// Bouquet name descriptor (0x47).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BouquetNameDescriptor {
    /// Name bytes, undecoded.
    pub name: Vec<u8>,
}

impl BouquetNameDescriptor {
    pub fn parse(data: &[u8]) -> Self {
        BouquetNameDescriptor {
            name: data.to_vec(),
        }
    }
}

/// One entry of a region list descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    /// Region ID.
    pub region_id: u16,
    /// Region name bytes, undecoded.
    pub name: Vec<u8>,
}

/// Region list descriptor (0xD4).
///
/// ```text
/// region_id(16) reserved(24) name_length(8) name(name_length)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionListDescriptor {
    pub regions: Vec<RegionEntry>,
}

impl RegionListDescriptor {
    /// Fixed bytes before the region name.
    const HEADER_LENGTH: usize = 6;

    pub fn parse(data: &[u8]) -> Self {
        let mut regions = Vec::new();
        let mut rest = data;

        while rest.len() >= Self::HEADER_LENGTH {
            let region_id = u16::from_be_bytes([rest[0], rest[1]]);
            let name_length = rest[5] as usize;

            if rest.len() < Self::HEADER_LENGTH + name_length {
                break;
            }

            let name = &rest[Self::HEADER_LENGTH..Self::HEADER_LENGTH + name_length];
            regions.push(RegionEntry {
                region_id,
                name: name.to_vec(),
            });
            rest = &rest[Self::HEADER_LENGTH + name_length..];
        }

        RegionListDescriptor { regions }
    }
}

/// Channel numbers assigned to one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChannels {
    /// Service ID.
    pub service_id: u16,
    /// EPG presence flags. Only the low byte of the 16-bit field is kept.
    pub epg_flags: u8,
    /// Channel number records, in descriptor order.
    pub channels: Vec<ChannelNumber>,
}

/// Channel number descriptor (0xD3).
///
/// ```text
/// service_id(16) epg_flags(16) length(8)
///   { reserved(4) channel_number(12) region_id(16) } * (length / 4)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelNumberDescriptor {
    pub services: Vec<ServiceChannels>,
}

impl ChannelNumberDescriptor {
    /// Fixed bytes before the channel records of a service.
    const HEADER_LENGTH: usize = 5;
    /// Size of one channel record.
    const RECORD_LENGTH: usize = 4;

    pub fn parse(data: &[u8]) -> Self {
        let mut services = Vec::new();
        let mut rest = data;

        while rest.len() >= Self::HEADER_LENGTH {
            let service_id = u16::from_be_bytes([rest[0], rest[1]]);
            let epg_flags = u16::from_be_bytes([rest[2], rest[3]]) as u8;
            let length = rest[4] as usize;
            rest = &rest[Self::HEADER_LENGTH..];

            if rest.len() < length {
                break;
            }

            let channels = rest[..length]
                .chunks_exact(Self::RECORD_LENGTH)
                .map(|record| {
                    ChannelNumber::new(
                        u16::from_be_bytes([record[0], record[1]]),
                        u16::from_be_bytes([record[2], record[3]]),
                    )
                })
                .collect();

            services.push(ServiceChannels {
                service_id,
                epg_flags,
                channels,
            });
            rest = &rest[length..];
        }

        ChannelNumberDescriptor { services }
    }
}

/// Parse descriptors from a descriptor loop.
///
/// A descriptor whose length runs past the loop ends parsing.
pub fn parse_descriptor_loop(data: &[u8]) -> Vec<Descriptor> {
    let mut descriptors = Vec::new();
    let mut offset = 0;

    while offset + 2 <= data.len() {
        let tag = data[offset];
        let length = data[offset + 1] as usize;
        offset += 2;

        if offset + length > data.len() {
            break;
        }

        descriptors.push(Descriptor {
            tag,
            data: data[offset..offset + length].to_vec(),
        });
        offset += length;
    }

    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bouquet_name() {
        let desc = BouquetNameDescriptor::parse(b"Freesat");
        assert_eq!(desc.name, b"Freesat");
    }

    #[test]
    fn test_parse_region_list() {
        let data = [
            0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x01, b'A', // region 1, "A"
            0x00, 0x02, 0xFF, 0xFF, 0xFF, 0x02, b'B', b'B', // region 2, "BB"
        ];

        let desc = RegionListDescriptor::parse(&data);
        assert_eq!(
            desc.regions,
            vec![
                RegionEntry {
                    region_id: 1,
                    name: b"A".to_vec()
                },
                RegionEntry {
                    region_id: 2,
                    name: b"BB".to_vec()
                },
            ]
        );
    }

    #[test]
    fn test_region_list_truncated_name() {
        let data = [
            0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x01, b'A',
            0x00, 0x02, 0xFF, 0xFF, 0xFF, 0x09, b'B', b'B', // claims 9 bytes
        ];

        let desc = RegionListDescriptor::parse(&data);
        assert_eq!(desc.regions.len(), 1);
        assert_eq!(desc.regions[0].region_id, 1);
    }

    #[test]
    fn test_region_list_short_header() {
        let data = [0x00, 0x01, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x02, 0xFF];
        let desc = RegionListDescriptor::parse(&data);
        assert_eq!(desc.regions.len(), 1);
        assert!(desc.regions[0].name.is_empty());
    }

    #[test]
    fn test_parse_channel_numbers() {
        let data = [
            0x00, 0x64, // service_id = 100
            0xAB, 0xCD, // epg flags
            0x04, // length
            0x12, 0x34, 0x00, 0x07,
        ];

        let desc = ChannelNumberDescriptor::parse(&data);
        assert_eq!(desc.services.len(), 1);
        let service = &desc.services[0];
        assert_eq!(service.service_id, 100);
        assert_eq!(service.epg_flags, 0xCD);
        assert_eq!(service.channels, vec![ChannelNumber::new(0x234, 7)]);
    }

    #[test]
    fn test_channel_numbers_partial_record_ignored() {
        let data = [
            0x00, 0x01, 0x00, 0x00, 0x06, // length 6: one record plus 2 stray bytes
            0x00, 0x65, 0x00, 0x01, 0xAA, 0xBB,
            0x00, 0x02, 0x00, 0x00, 0x00, // no records
        ];

        let desc = ChannelNumberDescriptor::parse(&data);
        assert_eq!(desc.services.len(), 2);
        assert_eq!(desc.services[0].channels, vec![ChannelNumber::new(101, 1)]);
        assert_eq!(desc.services[1].service_id, 2);
        assert!(desc.services[1].channels.is_empty());
    }

    #[test]
    fn test_channel_numbers_truncated_block() {
        let data = [
            0x00, 0x01, 0x00, 0x00, 0x04, 0x00, 0x65, 0x00, 0x01,
            0x00, 0x02, 0x00, 0x00, 0x08, 0x00, 0x66, 0x00, 0x01, // 8 claimed, 4 present
        ];

        let desc = ChannelNumberDescriptor::parse(&data);
        assert_eq!(desc.services.len(), 1);
        assert_eq!(desc.services[0].service_id, 1);
    }

    #[test]
    fn test_parse_descriptor_loop() {
        let data = [
            0x47, 0x02, b'H', b'i',
            0xD4, 0x03, 0xCC, 0xDD, 0xEE,
            0xD3, 0x09, 0x00, // runs past the loop
        ];

        let descriptors = parse_descriptor_loop(&data);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].tag, 0x47);
        assert_eq!(descriptors[0].data, b"Hi");
        assert_eq!(descriptors[1].tag, 0xD4);
        assert_eq!(descriptors[1].data, vec![0xCC, 0xDD, 0xEE]);
    }
}
