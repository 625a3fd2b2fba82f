use std::io::{Result, Write};

use glam::Vec3;

use crate::chunk::ChunkId;
use crate::types::AaBox;

/// Little-endian writes for the server-side output formats.
pub trait WriteExt: Write {
    fn write_u8(&mut self, n: u8) -> Result<()> {
        self.write_all(&[n])
    }

    fn write_u16_le(&mut self, n: u16) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_u32_le(&mut self, n: u32) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    fn write_f32_le(&mut self, n: f32) -> Result<()> {
        self.write_all(&n.to_le_bytes())
    }

    /// A magic tag written exactly as given, no reversal.
    fn write_tag(&mut self, tag: &[u8]) -> Result<()> {
        self.write_all(tag)
    }

    fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32_le(v.x)?;
        self.write_f32_le(v.y)?;
        self.write_f32_le(v.z)
    }

    fn write_aabox(&mut self, b: &AaBox) -> Result<()> {
        self.write_vec3(b.low)?;
        self.write_vec3(b.high)
    }

    fn write_u16_slice(&mut self, values: &[u16]) -> Result<()> {
        values.iter().try_for_each(|v| self.write_u16_le(*v))
    }

    fn write_u32_slice(&mut self, values: &[u32]) -> Result<()> {
        values.iter().try_for_each(|v| self.write_u32_le(*v))
    }

    fn write_f32_slice(&mut self, values: &[f32]) -> Result<()> {
        values.iter().try_for_each(|v| self.write_f32_le(*v))
    }

    /// Chunk header followed by its payload.
    fn write_chunk(&mut self, id: ChunkId, payload: &[u8]) -> Result<()> {
        self.write_all(&id.0)?;
        self.write_u32_le(payload.len() as u32)?;
        self.write_all(payload)
    }

    /// `u32` byte length followed by the raw bytes, no terminator.
    fn write_sized_str(&mut self, s: &str) -> Result<()> {
        self.write_u32_le(s.len() as u32)?;
        self.write_all(s.as_bytes())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

/// Pack names into a block of null-terminated strings, returning the block
/// and the offset of each name.
pub fn cstr_block<S: AsRef<str>>(names: &[S]) -> (Vec<u8>, Vec<u32>) {
    let mut block = Vec::new();
    let mut offsets = Vec::with_capacity(names.len());
    for name in names {
        offsets.push(block.len() as u32);
        block.extend_from_slice(name.as_ref().as_bytes());
        block.push(0);
    }
    (block, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::ByteCursor;

    #[test]
    fn written_values_read_back_through_cursor() {
        let mut out = Vec::new();
        out.write_tag(b"VERT").unwrap();
        out.write_aabox(&AaBox::new(Vec3::splat(-1.0), Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        out.write_sized_str("world\\a.wmo").unwrap();
        assert_eq!(out.len(), 4 + 24 + 4 + 11);

        let mut c = ByteCursor::new(&out);
        assert_eq!(&c.read_array::<4>().unwrap(), b"VERT");
        assert_eq!(c.read_aabox().unwrap().high, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(c.read_u32().unwrap(), 11);
    }
}
