//! Reader for `WDBC` client database files.
//!
//! A DBC file is a 20-byte header, `record_count` fixed-size records made of
//! 4-byte fields, and a block of NUL-terminated strings that string fields
//! point into:
//!
//! ```text
//! Offset | Size | Field
//! -------|------|-------------------------
//! 0x00   |  4   | magic "WDBC"
//! 0x04   |  4   | record count
//! 0x08   |  4   | field count
//! 0x0C   |  4   | record size (field count * 4)
//! 0x10   |  4   | string block size
//! 0x14   |  ... | records, then strings
//! ```
//!
//! # Examples
//!
//! ```
//! use wow_cdbc::{DbcFile, DbcWriter, Value, read_maps};
//!
//! let mut writer = DbcWriter::new(2);
//! writer.push_record(&[Value::UInt32(0), "Azeroth".into()]).unwrap();
//! writer.push_record(&[Value::UInt32(1), "Kalimdor".into()]).unwrap();
//! let bytes = writer.to_bytes().unwrap();
//!
//! let dbc = DbcFile::parse(&bytes).unwrap();
//! let maps = read_maps(&dbc).unwrap();
//! assert_eq!(maps[1].directory, "Kalimdor");
//! ```

mod error;
mod header;
mod parser;
mod stringblock;
mod tables;
mod types;
mod writer;

pub use error::{Error, Result};
pub use header::{DBC_MAGIC, DbcHeader};
pub use parser::{DbcFile, Record};
pub use stringblock::StringBlock;
pub use tables::{AREA_TABLE_DBC, FlagTable, LIQUID_TYPE_DBC, MAP_DBC, MapEntry, read_maps};
pub use types::{Key, StringRef};
pub use writer::{DbcWriter, Value};
