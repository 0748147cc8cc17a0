//! Bouquet document accumulated from decoded bouquet association tables.

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::WriteError;
use crate::value::{Object, Value};

/// One logical channel number assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelNumber {
    /// Logical channel number (12 bits).
    pub number: u16,
    /// Region the number applies in.
    pub region: u16,
}

impl ChannelNumber {
    /// Mask applied to the channel number field.
    pub const NUMBER_MASK: u16 = 0x0FFF;

    pub fn new(number: u16, region: u16) -> Self {
        Self {
            number: number & Self::NUMBER_MASK,
            region,
        }
    }

    fn to_value(self) -> Value {
        let mut item = Object::new();
        item.insert("number".to_string(), Value::from(self.number));
        item.insert("region".to_string(), Value::from(self.region));
        Value::Object(item)
    }
}

/// Metadata of a single bouquet, as carried by one table version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bouquet {
    /// Table version the data was taken from.
    pub version: u8,
    /// Bouquet name, raw bytes.
    pub name: Option<Vec<u8>>,
    /// Region names by region id, raw bytes.
    pub regions: BTreeMap<u16, Vec<u8>>,
    /// Channel numbers by service id.
    pub services: BTreeMap<u16, Vec<ChannelNumber>>,
}

impl Bouquet {
    /// Create an empty bouquet record for `version`.
    pub fn new(version: u8) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    pub fn set_name(&mut self, name: &[u8]) {
        self.name = Some(name.to_vec());
    }

    /// Set the name of a region, replacing any earlier one.
    pub fn insert_region(&mut self, region: u16, name: &[u8]) {
        self.regions.insert(region, name.to_vec());
    }

    /// Get the channel list of a service, creating an empty one if absent.
    pub fn service_mut(&mut self, service_id: u16) -> &mut Vec<ChannelNumber> {
        self.services.entry(service_id).or_default()
    }

    /// Get the channel list of a service.
    pub fn channels(&self, service_id: u16) -> Option<&[ChannelNumber]> {
        self.services.get(&service_id).map(Vec::as_slice)
    }

    /// Get the bouquet name as text.
    pub fn name_text(&self) -> Option<String> {
        self.name.as_deref().map(bytes_to_text)
    }

    /// Convert into the serialized value layout.
    pub fn to_value(&self) -> Value {
        let mut bouquet = Object::new();
        bouquet.insert("version".to_string(), Value::from(self.version));

        if let Some(name) = self.name_text() {
            bouquet.insert("name".to_string(), Value::String(name));
        }

        let regions: Object = self
            .regions
            .iter()
            .map(|(id, name)| (id.to_string(), Value::String(bytes_to_text(name))))
            .collect();
        bouquet.insert("regions".to_string(), Value::Object(regions));

        let services: Object = self
            .services
            .iter()
            .map(|(sid, channels)| {
                let numbers = channels.iter().map(|c| c.to_value()).collect();
                let mut service = Object::new();
                service.insert("channelnumbers".to_string(), Value::Array(numbers));
                (sid.to_string(), Value::Object(service))
            })
            .collect();
        bouquet.insert("services".to_string(), Value::Object(services));

        Value::Object(bouquet)
    }
}

/// All bouquets observed in a stream, keyed by bouquet id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    bouquets: BTreeMap<u16, Bouquet>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bouquet_id: u16) -> Option<&Bouquet> {
        self.bouquets.get(&bouquet_id)
    }

    /// Version currently held for a bouquet.
    pub fn version_of(&self, bouquet_id: u16) -> Option<u8> {
        self.bouquets.get(&bouquet_id).map(|b| b.version)
    }

    /// Store a bouquet, discarding whatever was held for the id.
    pub fn replace(&mut self, bouquet_id: u16, bouquet: Bouquet) -> Option<Bouquet> {
        self.bouquets.insert(bouquet_id, bouquet)
    }

    pub fn len(&self) -> usize {
        self.bouquets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bouquets.is_empty()
    }

    /// Convert the whole document into a value tree.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.bouquets
                .iter()
                .map(|(id, bouquet)| (id.to_string(), bouquet.to_value()))
                .collect(),
        )
    }

    /// Serialize the document as JSON followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W, pretty: bool) -> Result<(), WriteError> {
        self.to_value().write_json(&mut writer, pretty)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Render broadcast text bytes without charset decoding.
///
/// Valid UTF-8 (and therefore plain ASCII) passes through unchanged; other
/// bytes become U+FFFD.
fn bytes_to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
