//! Field types shared by the reader and the tables.

/// Record id, always field 0 of the tables read here.
pub type Key = u32;

/// A string field: byte offset of a null-terminated string in the
/// string block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringRef(pub u32);

impl StringRef {
    pub fn offset(self) -> u32 {
        self.0
    }
}
