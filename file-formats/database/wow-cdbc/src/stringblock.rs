//! String block parsing functionality

use crate::{Error, Result, StringRef};

/// The string block of a DBC file, borrowed from the file buffer
#[derive(Debug, Clone, Copy)]
pub struct StringBlock<'a> {
    data: &'a [u8],
}

impl<'a> StringBlock<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Get a string from the string block using a string reference
    pub fn get_string(&self, string_ref: StringRef) -> Result<&'a str> {
        let offset = string_ref.offset() as usize;
        let tail = self.data.get(offset..).filter(|t| !t.is_empty()).ok_or_else(|| {
            Error::OutOfBounds(format!(
                "String reference offset out of bounds: {} (max: {})",
                offset,
                self.data.len()
            ))
        })?;

        let end = memchr::memchr(0, tail).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end])
            .map_err(|e| Error::TypeConversion(format!("Invalid UTF-8 string: {e}")))
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if an offset is the start of a string in the block
    ///
    /// A valid string start is either at offset 0 (beginning of block)
    /// or immediately after a NUL terminator (byte at offset-1 is 0).
    pub fn is_string_start(&self, offset: u32) -> bool {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return false;
        }
        offset == 0 || self.data[offset - 1] == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_end_at_nul_or_block_end() {
        let block = StringBlock::new(b"\0Azeroth\0Kalimdor");
        assert_eq!(block.get_string(StringRef(0)).unwrap(), "");
        assert_eq!(block.get_string(StringRef(1)).unwrap(), "Azeroth");
        assert_eq!(block.get_string(StringRef(9)).unwrap(), "Kalimdor");
        assert!(block.is_string_start(9));
        assert!(!block.is_string_start(10));
        assert!(matches!(
            block.get_string(StringRef(17)),
            Err(Error::OutOfBounds(_))
        ));
    }
}
