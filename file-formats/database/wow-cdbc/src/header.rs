//! DBC header structure and parsing functionality.

use std::io::Cursor;

use binrw::{BinRead, BinWrite};

use crate::{Error, Result};

/// The magic signature at the beginning of a DBC file, stored as-is
pub const DBC_MAGIC: [u8; 4] = *b"WDBC";

/// Represents a DBC file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DbcHeader {
    pub magic: [u8; 4],
    pub record_count: u32,
    /// Every field is four bytes wide
    pub field_count: u32,
    pub record_size: u32,
    pub string_block_size: u32,
}

impl DbcHeader {
    /// The size of a DBC header in bytes
    pub const SIZE: usize = 20;

    pub fn new(record_count: u32, field_count: u32, string_block_size: u32) -> Self {
        Self {
            magic: DBC_MAGIC,
            record_count,
            field_count,
            record_size: field_count * 4,
            string_block_size,
        }
    }

    /// Parse and validate the header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let bytes = data.get(..Self::SIZE).ok_or_else(|| {
            Error::InvalidHeader(format!("file is {} bytes, header needs {}", data.len(), Self::SIZE))
        })?;
        let header = Self::read(&mut Cursor::new(bytes))?;

        if header.magic != DBC_MAGIC {
            return Err(Error::InvalidHeader(format!(
                "Invalid magic signature: {:?}, expected: {:?}",
                header.magic, DBC_MAGIC
            )));
        }

        if header.field_count == 0 && header.record_count > 0 {
            return Err(Error::InvalidHeader(
                "Field count cannot be 0 if record count is greater than 0".to_string(),
            ));
        }

        if u64::from(header.field_count) * 4 != u64::from(header.record_size) {
            return Err(Error::InvalidHeader(format!(
                "{} fields do not fill a {}-byte record",
                header.field_count, header.record_size
            )));
        }

        if header.total_size() > data.len() as u64 {
            return Err(Error::InvalidHeader(format!(
                "header describes {} bytes, file holds {}",
                header.total_size(),
                data.len()
            )));
        }

        Ok(header)
    }

    /// Calculates the offset to the string block
    pub fn string_block_offset(&self) -> u64 {
        Self::SIZE as u64 + u64::from(self.record_count) * u64::from(self.record_size)
    }

    /// Calculates the total size of the DBC file
    pub fn total_size(&self) -> u64 {
        self.string_block_offset() + u64::from(self.string_block_size)
    }
}
