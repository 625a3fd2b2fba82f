//! Little-endian cursor over a borrowed byte slice.

use std::io::Cursor;

use glam::Vec3;

use crate::error::{DataError, Result};
use crate::types::AaBox;

/// Sequential reader over a byte slice.
///
/// `base` is the absolute offset of `data` inside its parent buffer; it only
/// affects the offsets reported in errors.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(self.eof(pos, 0));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let start = self.pos;
        let bytes = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| self.eof(start, len))?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Six floats, low corner first.
    pub fn read_aabox(&mut self) -> Result<AaBox> {
        let low = self.read_vec3()?;
        let high = self.read_vec3()?;
        Ok(AaBox::new(low, high))
    }

    pub fn read_u16_vec(&mut self, count: usize) -> Result<Vec<u16>> {
        let bytes = self.read_bytes(count.saturating_mul(2))?;
        Ok(bytes
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect())
    }

    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>> {
        let bytes = self.read_bytes(count.saturating_mul(4))?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    pub fn read_vec3_vec(&mut self, count: usize) -> Result<Vec<Vec3>> {
        let floats = self.read_f32_vec(count.saturating_mul(3))?;
        Ok(floats
            .chunks_exact(3)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
            .collect())
    }

    /// Hand the next `len` bytes to a binrw reader, advancing past them.
    pub fn take_io(&mut self, len: usize) -> Result<Cursor<&'a [u8]>> {
        Ok(Cursor::new(self.read_bytes(len)?))
    }

    fn eof(&self, offset: usize, wanted: usize) -> DataError {
        DataError::UnexpectedEof {
            offset: self.base + offset,
            wanted,
            len: self.base + self.data.len(),
        }
    }
}

/// Null-terminated string starting at `offset` inside `block`.
///
/// Returns `None` when `offset` is past the end. A missing terminator
/// yields the remainder of the block.
pub fn cstr_at(block: &[u8], offset: usize) -> Option<String> {
    let tail = block.get(offset..)?;
    let end = memchr::memchr(0, tail).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}

/// Split a block of back to back null-terminated strings, keeping the
/// offset of each string.
pub fn cstr_table(block: &[u8]) -> Vec<(u32, String)> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < block.len() {
        let tail = &block[offset..];
        let end = memchr::memchr(0, tail).unwrap_or(tail.len());
        if end > 0 {
            out.push((
                offset as u32,
                String::from_utf8_lossy(&tail[..end]).into_owned(),
            ));
        }
        offset += end + 1;
    }
    out
}
