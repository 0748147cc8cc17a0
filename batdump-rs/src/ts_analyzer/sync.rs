//! Packet synchronization over a byte stream.
//!
//! [`PacketSynchronizer`] pulls bulk reads from any [`Read`] source into a
//! bounded buffer and hands out 188-byte windows that start on a sync byte.
//! Leading garbage and mid-stream corruption are skipped byte by byte.

use std::io::{ErrorKind, Read};

use log::{debug, warn};

use super::packet::{SYNC_BYTE, TS_PACKET_SIZE};

/// Default buffer capacity (1 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Counters kept by the synchronizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Packets handed out.
    pub packets: u64,
    /// Bytes skipped while searching for a sync byte.
    pub skipped_bytes: u64,
    /// Number of times the stream was found out of alignment.
    pub sync_losses: u64,
}

/// Turns a byte source into a sequence of aligned TS packets.
pub struct PacketSynchronizer<R> {
    source: R,
    buffer: Vec<u8>,
    /// Bytes of `buffer` holding data.
    filled: usize,
    /// Start of the unread data.
    read_pos: usize,
    /// Source reported end of data or failed.
    exhausted: bool,
    /// Require the following packet to start with a sync byte after a loss.
    strict: bool,
    stats: SyncStats,
}

impl<R: Read> PacketSynchronizer<R> {
    /// Create a synchronizer with the default buffer size.
    pub fn new(source: R) -> Self {
        Self::with_capacity(source, DEFAULT_BUFFER_SIZE)
    }

    /// Create a synchronizer with a buffer of `capacity` bytes.
    ///
    /// The capacity is raised to at least two packets.
    pub fn with_capacity(source: R, capacity: usize) -> Self {
        let capacity = capacity.max(2 * TS_PACKET_SIZE);
        Self {
            source,
            buffer: vec![0u8; capacity],
            filled: 0,
            read_pos: 0,
            exhausted: false,
            strict: false,
            stats: SyncStats::default(),
        }
    }

    /// Only accept a sync byte found after a loss when the byte one packet
    /// later is a sync byte too.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Get the next aligned packet, or `None` once the source is exhausted.
    pub fn next_packet(&mut self) -> Option<&[u8]> {
        let mut lost = false;

        loop {
            if !self.ensure(TS_PACKET_SIZE) {
                return None;
            }

            if self.buffer[self.read_pos] != SYNC_BYTE {
                if !lost {
                    lost = true;
                    self.stats.sync_losses += 1;
                }
                self.skip_to_sync();
                continue;
            }

            if lost && self.strict && !self.confirm_next_sync() {
                self.read_pos += 1;
                self.stats.skipped_bytes += 1;
                continue;
            }

            if lost {
                debug!(
                    "Sync recovered after {} skipped bytes in total",
                    self.stats.skipped_bytes
                );
            }

            let start = self.read_pos;
            self.read_pos += TS_PACKET_SIZE;
            self.stats.packets += 1;
            return Some(&self.buffer[start..start + TS_PACKET_SIZE]);
        }
    }

    /// Advance the cursor to the next sync byte within the buffered data.
    fn skip_to_sync(&mut self) {
        let unread = &self.buffer[self.read_pos..self.filled];
        let skip = unread
            .iter()
            .position(|&b| b == SYNC_BYTE)
            .unwrap_or(unread.len());
        self.read_pos += skip;
        self.stats.skipped_bytes += skip as u64;
    }

    /// Check the byte one packet after the cursor.
    ///
    /// A source that ends before that byte is treated as confirmation.
    fn confirm_next_sync(&mut self) -> bool {
        if !self.ensure(TS_PACKET_SIZE + 1) {
            return true;
        }
        self.buffer[self.read_pos + TS_PACKET_SIZE] == SYNC_BYTE
    }

    /// Make sure `want` unread bytes are buffered.
    ///
    /// Returns false if the source ran out first.
    fn ensure(&mut self, want: usize) -> bool {
        while self.filled - self.read_pos < want {
            if self.exhausted {
                return false;
            }

            if self.read_pos > self.buffer.len() / 2 || self.filled == self.buffer.len() {
                self.compact();
            }

            match self.source.read(&mut self.buffer[self.filled..]) {
                Ok(0) => {
                    debug!("End of input reached");
                    self.exhausted = true;
                }
                Ok(n) => self.filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("Read error, stopping: {}", e);
                    self.exhausted = true;
                }
            }
        }
        true
    }

    /// Move unread bytes to the front of the buffer.
    fn compact(&mut self) {
        self.buffer.copy_within(self.read_pos..self.filled, 0);
        self.filled -= self.read_pos;
        self.read_pos = 0;
    }
}
