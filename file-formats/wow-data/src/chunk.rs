//! Chunk primitives shared by the ADT, WDT and WMO parsers.
//!
//! A chunk is an 8-byte header followed by `size` bytes of payload:
//!
//! ```text
//! Offset | Size | Field
//! -------|------|------------------------------------------
//! 0x00   |  4   | id, mnemonic stored reversed ("MVER" -> "REVM")
//! 0x04   |  4   | size of the payload, header excluded
//! 0x08   | size | payload
//! ```
//!
//! [`ChunkReader`] walks such chunks inside a flat byte buffer without
//! copying. Every access is bounds checked, so a truncated or corrupt file
//! surfaces as a [`DataError`] instead of a panic.

use std::fmt;
use std::io::Cursor;

use binrw::{BinRead, BinWrite};

use crate::cursor::ByteCursor;
use crate::error::{DataError, Result};

/// 4-byte chunk identifier, kept in on-disk byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    pub const MVER: Self = Self::from_mnemonic(b"MVER");

    /// Build an id from its documented mnemonic, reversing it to file order.
    pub const fn from_mnemonic(tag: &[u8; 4]) -> Self {
        Self([tag[3], tag[2], tag[1], tag[0]])
    }

    /// Build an id from bytes that are stored as-is (e.g. `MD20`, `WDBC`).
    pub const fn raw(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }

    /// The mnemonic as documented, i.e. the file bytes reversed.
    pub fn mnemonic(&self) -> [u8; 4] {
        let [a, b, c, d] = self.0;
        [d, c, b, a]
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.mnemonic();
        if tag.iter().all(u8::is_ascii_graphic) {
            f.write_str(&String::from_utf8_lossy(&tag))
        } else {
            write!(f, "{:02X?}", self.0)
        }
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({self})")
    }
}

/// Standard 8-byte chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ChunkHeader {
    pub id: ChunkId,
    pub size: u32,
}

impl ChunkHeader {
    pub const SIZE: usize = 8;

    /// Header plus payload.
    pub const fn total_size(&self) -> usize {
        Self::SIZE + self.size as usize
    }
}

/// A chunk located inside a buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub header: ChunkHeader,
    /// Offset of the chunk header inside the parent buffer.
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> Chunk<'a> {
    pub fn id(&self) -> ChunkId {
        self.header.id
    }

    pub fn size(&self) -> usize {
        self.header.size as usize
    }

    pub fn payload_offset(&self) -> usize {
        self.offset + ChunkHeader::SIZE
    }

    /// Offset of the chunk that follows this one.
    pub fn next_offset(&self) -> usize {
        ChunkReader::advance(self.offset, self.header.size)
    }

    /// Cursor over the payload; reported offsets are absolute in the parent buffer.
    pub fn cursor(&self) -> ByteCursor<'a> {
        ByteCursor::with_base(self.payload, self.payload_offset())
    }

    /// Split the payload into `size_of`-byte elements, rejecting ragged sizes.
    pub fn elements(&self, size_of: usize) -> Result<std::slice::ChunksExact<'a, u8>> {
        if size_of == 0 || self.payload.len() % size_of != 0 {
            return Err(DataError::InvariantViolation(format!(
                "{} payload of {} bytes is not a multiple of {size_of}",
                self.header.id,
                self.payload.len()
            )));
        }
        Ok(self.payload.chunks_exact(size_of))
    }
}

/// Bounds checked walker over the chunks of a flat buffer.
#[derive(Debug, Clone, Copy)]
pub struct ChunkReader<'a> {
    data: &'a [u8],
}

impl<'a> ChunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset of the next chunk after a chunk of `size` bytes starting at `offset`.
    pub const fn advance(offset: usize, size: u32) -> usize {
        offset + ChunkHeader::SIZE + size as usize
    }

    /// Read whatever chunk starts at `offset`.
    pub fn read_chunk(&self, offset: usize) -> Result<Chunk<'a>> {
        let header_bytes = self.slice(offset, ChunkHeader::SIZE)?;
        let header = ChunkHeader::read(&mut Cursor::new(header_bytes))?;
        let payload = self.slice(offset + ChunkHeader::SIZE, header.size as usize)?;
        Ok(Chunk {
            header,
            offset,
            payload,
        })
    }

    /// Read the chunk at `offset` and require it to carry `expected`.
    pub fn expect_chunk(&self, offset: usize, expected: ChunkId) -> Result<Chunk<'a>> {
        let found = self.peek_id(offset)?;
        if found != expected {
            return Err(DataError::InvalidMagic {
                expected,
                found,
                offset,
            });
        }
        self.read_chunk(offset)
    }

    /// Id at `offset` without validating the payload bounds.
    pub fn peek_id(&self, offset: usize) -> Result<ChunkId> {
        let bytes = self.slice(offset, 4)?;
        Ok(ChunkId([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Whether a chunk tagged `id` starts at `offset`.
    pub fn is_chunk_at(&self, offset: usize, id: ChunkId) -> bool {
        self.peek_id(offset).is_ok_and(|found| found == id)
    }

    /// Sequential iterator starting at `offset`, ending at the buffer end.
    pub fn chunks_from(&self, offset: usize) -> Chunks<'a> {
        Chunks {
            reader: *self,
            offset,
            failed: false,
        }
    }

    /// Read the version chunk at the start of the buffer and check it
    /// against the versions this parser understands.
    pub fn read_version(&self, format: &'static str, supported: &[u32]) -> Result<Chunk<'a>> {
        let chunk = self.expect_chunk(0, ChunkId::MVER)?;
        let version = chunk.cursor().read_u32()?;
        if !supported.contains(&version) {
            return Err(DataError::UnsupportedVersion { format, version });
        }
        Ok(chunk)
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(DataError::UnexpectedEof {
                offset,
                wanted: len,
                len: self.data.len(),
            })
    }
}

/// Iterator returned by [`ChunkReader::chunks_from`].
///
/// Yields an error once and stops if a chunk overruns the buffer.
pub struct Chunks<'a> {
    reader: ChunkReader<'a>,
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset + ChunkHeader::SIZE > self.reader.len() {
            return None;
        }
        match self.reader.read_chunk(self.offset) {
            Ok(chunk) => {
                self.offset = chunk.next_offset();
                Some(Ok(chunk))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
