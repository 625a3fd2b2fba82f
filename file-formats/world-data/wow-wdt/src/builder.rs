//! WDT writer used to synthesize map descriptors.

use std::io::Cursor;

use binrw::BinWrite;

use wow_adt::WmoPlacement;
use wow_data::{ChunkId, WriteExt};

use crate::error::Result;
use crate::mphd::{MPHD, MPHD_SIZE, MphdFlags};
use crate::{MAIN, MAP_TILE_SIZE, MODF, MWMO};

#[derive(Debug, Clone, Default)]
pub struct WdtBuilder {
    tiles: Vec<(usize, usize)>,
    global: Option<(String, WmoPlacement)>,
}

impl WdtBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark tile (x, y) as having an ADT.
    #[must_use]
    pub fn with_tile(mut self, x: usize, y: usize) -> Self {
        self.tiles.push((x, y));
        self
    }

    /// Make this a single-WMO map.
    #[must_use]
    pub fn with_global_object(mut self, name: impl Into<String>, placement: WmoPlacement) -> Self {
        self.global = Some((name.into(), placement));
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut flags = MphdFlags::empty();
        if self.global.is_some() {
            flags |= MphdFlags::WDT_USES_GLOBAL_MAP_OBJ;
        }
        let mut mphd = vec![0u8; MPHD_SIZE];
        mphd[..4].copy_from_slice(&flags.bits().to_le_bytes());

        let mut main = vec![0u8; MAP_TILE_SIZE * MAP_TILE_SIZE * 8];
        for &(x, y) in &self.tiles {
            if x < MAP_TILE_SIZE && y < MAP_TILE_SIZE {
                let at = (x * MAP_TILE_SIZE + y) * 8;
                main[at..at + 4].copy_from_slice(&1u32.to_le_bytes());
            }
        }

        let mut out = Vec::new();
        out.write_chunk(ChunkId::MVER, &18u32.to_le_bytes())?;
        out.write_chunk(MPHD, &mphd)?;
        out.write_chunk(MAIN, &main)?;
        match &self.global {
            Some((name, placement)) => {
                let mut block = name.as_bytes().to_vec();
                block.push(0);
                out.write_chunk(MWMO, &block)?;
                let mut record = Cursor::new(Vec::new());
                placement.write(&mut record)?;
                out.write_chunk(MODF, &record.into_inner())?;
            }
            None => out.write_chunk(MWMO, &[])?,
        }
        Ok(out)
    }
}
