//! batdump library - bouquet metadata extraction from DVB transport streams
//!
//! This library reads an MPEG-TS byte stream, reassembles the bouquet
//! association table carried on one PID and collects the Freesat bouquet
//! names, regions and channel numbers into a [`Document`].

pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod ts_analyzer;

// Re-export commonly used types
pub use batdump_document::{Bouquet, ChannelNumber, Document, Value, ValueError};
pub use config::{ConfigFile, Overrides, Settings};
pub use decoder::{BouquetTableDecoder, Outcome};
pub use error::BatdumpError;
pub use extractor::{BatExtractor, ExtractorConfig, ExtractorStats};
