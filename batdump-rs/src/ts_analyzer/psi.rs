//! PSI/SI section parsing.
//!
//! This module handles the common section header, CRC validation, and the
//! per-PID collection of section bytes spread over TS packets.

use log::{debug, trace};

/// Table ID value that marks stuffing after the last section in a packet.
const STUFFING_TABLE_ID: u8 = 0xFF;

/// PSI section header (common to all PSI tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsiHeader {
    /// Table ID.
    pub table_id: u8,
    /// Section syntax indicator.
    pub section_syntax_indicator: bool,
    /// Section length (12 bits).
    pub section_length: u16,
    /// Table ID extension (for long sections).
    pub table_id_extension: u16,
    /// Version number (5 bits).
    pub version_number: u8,
    /// Current/next indicator.
    pub current_next_indicator: bool,
    /// Section number.
    pub section_number: u8,
    /// Last section number.
    pub last_section_number: u8,
}

/// A parsed PSI section.
#[derive(Debug, Clone)]
pub struct PsiSection<'a> {
    /// Section header.
    pub header: PsiHeader,
    /// Section data (after header, before CRC).
    pub data: &'a [u8],
    /// CRC32 value.
    pub crc32: u32,
}

impl<'a> PsiSection<'a> {
    /// Parse a long-form section from raw bytes starting at table_id.
    pub fn parse(data: &'a [u8]) -> Result<Self, &'static str> {
        if data.len() < 3 {
            return Err("Section too short for header");
        }

        let table_id = data[0];
        let section_syntax_indicator = data[1] & 0x80 != 0;
        let section_length = ((data[1] as u16 & 0x0F) << 8) | data[2] as u16;

        if !section_syntax_indicator {
            return Err("Section has no extended header");
        }

        // extension(2) + version(1) + section numbers(2) + CRC(4)
        if section_length < 9 {
            return Err("Section length too small");
        }

        let total_length = 3 + section_length as usize;
        if data.len() < total_length {
            return Err("Incomplete section data");
        }

        let header = PsiHeader {
            table_id,
            section_syntax_indicator,
            section_length,
            table_id_extension: ((data[3] as u16) << 8) | data[4] as u16,
            version_number: (data[5] >> 1) & 0x1F,
            current_next_indicator: data[5] & 0x01 != 0,
            section_number: data[6],
            last_section_number: data[7],
        };

        let crc_offset = total_length - 4;
        let crc32 = u32::from_be_bytes([
            data[crc_offset],
            data[crc_offset + 1],
            data[crc_offset + 2],
            data[crc_offset + 3],
        ]);

        Ok(PsiSection {
            header,
            data: &data[8..crc_offset],
            crc32,
        })
    }

    /// Verify CRC32 of the section.
    pub fn verify_crc(&self, full_data: &[u8]) -> bool {
        let total_length = self.total_length();
        if full_data.len() < total_length {
            return false;
        }

        crc32_mpeg2(&full_data[..total_length - 4]) == self.crc32
    }

    /// Get the total section length including header and CRC.
    pub fn total_length(&self) -> usize {
        3 + self.header.section_length as usize
    }
}

/// Collects the sections carried on one PID.
#[derive(Debug, Default)]
pub struct SectionCollector {
    /// Bytes of the section currently being collected.
    buffer: Vec<u8>,
    /// Whether `buffer` starts at a section boundary.
    collecting: bool,
    /// Last continuity counter.
    last_cc: Option<u8>,
}

impl SectionCollector {
    /// Create a new section collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the payload of one TS packet.
    ///
    /// Returns every section completed by this packet, in stream order. The
    /// sections are returned raw (table_id through CRC) and unvalidated.
    pub fn add_data(
        &mut self,
        payload: &[u8],
        cc: u8,
        payload_unit_start: bool,
        discontinuity: bool,
    ) -> Vec<Vec<u8>> {
        let mut sections = Vec::new();

        if let Some(last) = self.last_cc {
            if !discontinuity {
                if cc == last {
                    trace!("Duplicate packet (cc={}), ignored", cc);
                    return sections;
                }
                if cc != (last + 1) & 0x0F {
                    if self.collecting && !self.buffer.is_empty() {
                        debug!(
                            "Continuity error (expected {}, got {}), dropping {} bytes",
                            (last + 1) & 0x0F,
                            cc,
                            self.buffer.len()
                        );
                    }
                    self.buffer.clear();
                    self.collecting = false;
                }
            }
        }
        self.last_cc = Some(cc);

        if payload_unit_start {
            let Some((&pointer, rest)) = payload.split_first() else {
                return sections;
            };
            let pointer = pointer as usize;
            if pointer > rest.len() {
                self.buffer.clear();
                self.collecting = false;
                return sections;
            }

            let (tail, head) = rest.split_at(pointer);
            if self.collecting {
                self.buffer.extend_from_slice(tail);
                self.drain_complete(&mut sections);
            }

            // Whatever is left of the previous section can no longer complete
            self.buffer.clear();
            self.buffer.extend_from_slice(head);
            self.collecting = true;
        } else if self.collecting {
            self.buffer.extend_from_slice(payload);
        } else {
            return sections;
        }

        self.drain_complete(&mut sections);
        sections
    }

    /// Move every complete section at the front of the buffer into `out`.
    fn drain_complete(&mut self, out: &mut Vec<Vec<u8>>) {
        while self.collecting && !self.buffer.is_empty() {
            if self.buffer[0] == STUFFING_TABLE_ID {
                self.buffer.clear();
                self.collecting = false;
                break;
            }

            if self.buffer.len() < 3 {
                break;
            }

            let section_length = ((self.buffer[1] as usize & 0x0F) << 8) | self.buffer[2] as usize;
            let total = 3 + section_length;
            if self.buffer.len() < total {
                break;
            }

            out.push(self.buffer.drain(..total).collect());
        }
    }

    /// Check if collector has data.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Calculate CRC32 for MPEG-2 (polynomial 0x04C11DB7).
pub fn crc32_mpeg2(data: &[u8]) -> u32 {
    static CRC_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = (i as u32) << 24;
            let mut j = 0;
            while j < 8 {
                if crc & 0x80000000 != 0 {
                    crc = (crc << 1) ^ 0x04C11DB7;
                } else {
                    crc <<= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    data.iter().fold(0xFFFFFFFFu32, |crc, &byte| {
        (crc << 8) ^ CRC_TABLE[((crc >> 24) ^ byte as u32) as usize]
    })
}
