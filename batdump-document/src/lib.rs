//! Document model for batdump.
//!
//! This crate holds the bouquet data decoded from bouquet association tables
//! and the value tree it is serialized through.
//!
//! # Output Layout
//!
//! ```text
//! {
//!   "<bouquet_id>": {
//!     "version": 3,
//!     "name": "...",
//!     "regions": { "<region_id>": "..." },
//!     "services": {
//!       "<service_id>": { "channelnumbers": [ { "number": 101, "region": 1 } ] }
//!     }
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```rust
//! use batdump_document::{Bouquet, ChannelNumber, Document, Value};
//!
//! let mut bouquet = Bouquet::new(1);
//! bouquet.set_name(b"Test");
//! bouquet.service_mut(100).push(ChannelNumber::new(0x1234, 7));
//!
//! let mut doc = Document::new();
//! doc.replace(42, bouquet);
//!
//! let value = doc.to_value();
//! let number = value
//!     .get("42")
//!     .and_then(|b| b.get("services"))
//!     .and_then(|s| s.get("100"))
//!     .and_then(|s| s.get("channelnumbers"))
//!     .and_then(|c| c.at(0))
//!     .and_then(|c| c.get("number"))
//!     .and_then(Value::as_i64);
//! assert_eq!(number, Ok(0x234));
//! ```

pub mod document;
pub mod error;
pub mod value;

pub use document::{Bouquet, ChannelNumber, Document};
pub use error::{ValueError, WriteError};
pub use value::{Object, Value};
