//! DBC file parsing functionality

use log::debug;

use crate::{DbcHeader, Error, Result, StringBlock, StringRef};

/// A parsed DBC file borrowing the buffer it was read from
#[derive(Debug, Clone, Copy)]
pub struct DbcFile<'a> {
    header: DbcHeader,
    records: &'a [u8],
    strings: StringBlock<'a>,
}

impl<'a> DbcFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = DbcHeader::parse(data)?;
        debug!(
            "DBC: {} records, {} fields, {} bytes per record, {} bytes of strings",
            header.record_count, header.field_count, header.record_size, header.string_block_size
        );

        // Sizes were checked against the buffer by the header.
        let strings_at = header.string_block_offset() as usize;
        let records = &data[DbcHeader::SIZE..strings_at];
        let strings = StringBlock::new(&data[strings_at..header.total_size() as usize]);

        Ok(Self {
            header,
            records,
            strings,
        })
    }

    pub fn header(&self) -> &DbcHeader {
        &self.header
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    pub fn field_count(&self) -> usize {
        self.header.field_count as usize
    }

    pub fn strings(&self) -> StringBlock<'a> {
        self.strings
    }

    pub fn record(&self, index: usize) -> Result<Record<'a>> {
        if index >= self.record_count() {
            return Err(Error::OutOfBounds(format!(
                "record {index} of {} requested",
                self.record_count()
            )));
        }
        let size = self.header.record_size as usize;
        let data = &self.records[index * size..(index + 1) * size];
        Ok(Record {
            index,
            data,
            strings: self.strings,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'a>> + '_ {
        let strings = self.strings;
        self.records
            .chunks_exact(self.header.record_size.max(1) as usize)
            .enumerate()
            .map(move |(index, data)| Record {
                index,
                data,
                strings,
            })
    }
}

/// One fixed-size record; every field is a 4-byte slot
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    index: usize,
    data: &'a [u8],
    strings: StringBlock<'a>,
}

impl<'a> Record<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn field_count(&self) -> usize {
        self.data.len() / 4
    }

    fn slot(&self, field: usize) -> Result<[u8; 4]> {
        self.data
            .get(field * 4..field * 4 + 4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                Error::InvalidRecord(format!(
                    "record {} has {} fields, field {field} requested",
                    self.index,
                    self.field_count()
                ))
            })
    }

    pub fn get_u32(&self, field: usize) -> Result<u32> {
        self.slot(field).map(u32::from_le_bytes)
    }

    pub fn get_i32(&self, field: usize) -> Result<i32> {
        self.slot(field).map(i32::from_le_bytes)
    }

    pub fn get_f32(&self, field: usize) -> Result<f32> {
        self.slot(field).map(f32::from_le_bytes)
    }

    /// Field interpreted as an offset into the string block
    pub fn get_string(&self, field: usize) -> Result<&'a str> {
        self.strings.get_string(StringRef(self.get_u32(field)?))
    }
}
