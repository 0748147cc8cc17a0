//! Error types for batdump setup and output.
//!
//! Stream content never produces an error: malformed packets, sections and
//! descriptors are skipped where they are found.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use batdump_document::WriteError;

#[derive(Error, Debug)]
pub enum BatdumpError {
    /// Config file could not be read.
    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    /// Config file is not valid TOML or has wrongly typed values.
    #[error("Failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// PID does not fit in 13 bits.
    #[error("Invalid PID 0x{0:04X} (max: 0x1FFF)")]
    InvalidPid(u16),

    /// Input file could not be opened.
    #[error("Failed to open input {}: {source}", .path.display())]
    OpenInput { path: PathBuf, source: io::Error },

    /// Output file could not be created.
    #[error("Failed to create output {}: {source}", .path.display())]
    CreateOutput { path: PathBuf, source: io::Error },

    /// Document could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),
}
