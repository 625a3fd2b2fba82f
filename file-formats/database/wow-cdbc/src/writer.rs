//! DBC file writing functionality

use std::collections::HashMap;
use std::io::Write;

use binrw::BinWrite;

use crate::{DbcHeader, Error, Result};

/// A field value to be written
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt32(u32),
    Int32(i32),
    Float32(f32),
    /// Stored in the string block, the field holds its offset
    String(String),
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// Writer for DBC files with all-4-byte fields
#[derive(Debug, Clone)]
pub struct DbcWriter {
    field_count: usize,
    records: Vec<[u8; 4]>,
    string_block: Vec<u8>,
    string_offsets: HashMap<String, u32>,
}

impl DbcWriter {
    pub fn new(field_count: usize) -> Self {
        // First string is always empty
        let mut string_offsets = HashMap::new();
        string_offsets.insert(String::new(), 0);
        Self {
            field_count,
            records: Vec::new(),
            string_block: vec![0],
            string_offsets,
        }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.string_offsets.get(s) {
            return offset;
        }
        let offset = self.string_block.len() as u32;
        self.string_block.extend_from_slice(s.as_bytes());
        self.string_block.push(0);
        self.string_offsets.insert(s.to_string(), offset);
        offset
    }

    pub fn push_record(&mut self, values: &[Value]) -> Result<()> {
        if values.len() != self.field_count {
            return Err(Error::InvalidRecord(format!(
                "{} values for {} fields",
                values.len(),
                self.field_count
            )));
        }
        for value in values {
            let slot = match value {
                Value::UInt32(v) => v.to_le_bytes(),
                Value::Int32(v) => v.to_le_bytes(),
                Value::Float32(v) => v.to_le_bytes(),
                Value::String(s) => self.intern(s).to_le_bytes(),
            };
            self.records.push(slot);
        }
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.records.len() / self.field_count.max(1)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let header = DbcHeader::new(
            self.record_count() as u32,
            self.field_count as u32,
            self.string_block.len() as u32,
        );
        let mut head = std::io::Cursor::new(Vec::with_capacity(DbcHeader::SIZE));
        header.write(&mut head)?;
        writer.write_all(head.get_ref())?;
        for slot in &self.records {
            writer.write_all(slot)?;
        }
        writer.write_all(&self.string_block)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
