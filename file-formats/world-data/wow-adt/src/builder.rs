//! Fluent builder producing v18 ADT bytes.
//!
//! Used to synthesize terrain tiles for tests and tooling. The layout
//! mirrors client files: MVER, MHDR, MCIN, the name/placement chunks, then
//! the 256 MCNK cells, each holding MCVT and an optional MCLQ whose own
//! size field is left at zero as in shipped tiles.

use std::io::{Cursor, Write};

use binrw::BinWrite;
use glam::Vec3;

use wow_data::{ChunkId, WriteExt, cstr_block};

use crate::error::Result;
use crate::header::{self, MHDR_DATA_OFFSET, McinEntry, Mhdr};
use crate::mcnk::{self, LiquidCategory, LiquidLayer, MCVT_COUNT, McnkFlags, McnkHeader};
use crate::placement::{self, DoodadPlacement, WmoPlacement};
use crate::CELLS_PER_SIDE;

const MTEX: ChunkId = ChunkId::from_mnemonic(b"MTEX");
const MCIN_OFFSET: usize = 12 + 8 + Mhdr::SIZE;
const BODY_OFFSET: usize = MCIN_OFFSET + 8 + McinEntry::SIZE * 256;
const MCVT_OFFSET: usize = 8 + McnkHeader::SIZE;
const MCLQ_OFFSET: usize = MCVT_OFFSET + 8 + MCVT_COUNT * 4;

/// Contents of one terrain cell.
#[derive(Debug, Clone)]
pub struct CellBuilder {
    area_id: u32,
    position: Vec3,
    heights: Vec<f32>,
    holes: u16,
    flags: McnkFlags,
    liquids: Vec<LiquidLayer>,
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self {
            area_id: 0,
            position: Vec3::ZERO,
            heights: vec![0.0; MCVT_COUNT],
            holes: 0,
            flags: McnkFlags::empty(),
            liquids: Vec::new(),
        }
    }
}

impl CellBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn area(mut self, area_id: u32) -> Self {
        self.area_id = area_id;
        self
    }

    #[must_use]
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Every MCVT value set to `height`.
    #[must_use]
    pub fn flat(mut self, height: f32) -> Self {
        self.heights = vec![height; MCVT_COUNT];
        self
    }

    /// Raw MCVT values; missing entries are zero, extra ones dropped.
    #[must_use]
    pub fn heights(mut self, heights: &[f32]) -> Self {
        self.heights = vec![0.0; MCVT_COUNT];
        let n = heights.len().min(MCVT_COUNT);
        self.heights[..n].copy_from_slice(&heights[..n]);
        self
    }

    #[must_use]
    pub fn holes(mut self, holes: u16) -> Self {
        self.holes = holes;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: McnkFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Add an MCLQ layer; the matching MCNK liquid flag is set.
    #[must_use]
    pub fn liquid(mut self, layer: LiquidLayer) -> Self {
        self.flags |= match layer.category {
            LiquidCategory::River => McnkFlags::RIVER,
            LiquidCategory::Ocean => McnkFlags::OCEAN,
            LiquidCategory::Magma => McnkFlags::MAGMA,
        };
        self.liquids.push(layer);
        self
    }

    fn encode(&self, x: usize, y: usize) -> Result<Vec<u8>> {
        let mut layers = self.liquids.clone();
        layers.sort_by_key(|l| l.category);

        let mclq_size = if layers.is_empty() {
            0
        } else {
            8 + LiquidLayer::SIZE * layers.len()
        };
        let header = McnkHeader {
            flags: self.flags,
            index_x: y as u32,
            index_y: x as u32,
            ofs_mcvt: MCVT_OFFSET as u32,
            area_id: self.area_id,
            holes: self.holes,
            ofs_mclq: if layers.is_empty() { 0 } else { MCLQ_OFFSET as u32 },
            size_liquid: mclq_size as u32,
            position: self.position.to_array(),
            ..Default::default()
        };

        let mut payload = Cursor::new(Vec::new());
        header.write(&mut payload)?;
        let mut heights = Vec::with_capacity(MCVT_COUNT * 4);
        heights.write_f32_slice(&self.heights)?;
        payload.write_chunk(mcnk::MCVT, &heights)?;
        if !layers.is_empty() {
            payload.write_all(&mcnk::MCLQ.0)?;
            payload.write_u32_le(0)?;
            for layer in &layers {
                layer.write(&mut payload)?;
            }
        }

        let mut out = Vec::new();
        out.write_chunk(mcnk::MCNK, &payload.into_inner())?;
        Ok(out)
    }
}

/// Builds a complete ADT buffer.
///
/// ```
/// use wow_adt::{Adt, AdtBuilder, CellBuilder};
///
/// let data = AdtBuilder::new()
///     .with_cell(2, 3, CellBuilder::new().area(12).flat(5.0))
///     .build()
///     .unwrap();
/// let adt = Adt::parse(&data).unwrap();
/// assert_eq!(adt.cell(2, 3).unwrap().area_id(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct AdtBuilder {
    cells: Vec<CellBuilder>,
    models: Vec<String>,
    wmos: Vec<String>,
    doodads: Vec<DoodadPlacement>,
    wmo_placements: Vec<WmoPlacement>,
}

impl Default for AdtBuilder {
    fn default() -> Self {
        Self {
            cells: vec![CellBuilder::default(); CELLS_PER_SIDE * CELLS_PER_SIDE],
            models: Vec::new(),
            wmos: Vec::new(),
            doodads: Vec::new(),
            wmo_placements: Vec::new(),
        }
    }
}

impl AdtBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace cell (x, y). Out of range coordinates are ignored.
    #[must_use]
    pub fn with_cell(mut self, x: usize, y: usize, cell: CellBuilder) -> Self {
        if x < CELLS_PER_SIDE && y < CELLS_PER_SIDE {
            self.cells[x * CELLS_PER_SIDE + y] = cell;
        }
        self
    }

    /// Apply `f` to every cell.
    #[must_use]
    pub fn with_all_cells(mut self, f: impl Fn(usize, usize, CellBuilder) -> CellBuilder) -> Self {
        for x in 0..CELLS_PER_SIDE {
            for y in 0..CELLS_PER_SIDE {
                let i = x * CELLS_PER_SIDE + y;
                self.cells[i] = f(x, y, std::mem::take(&mut self.cells[i]));
            }
        }
        self
    }

    /// Add an M2 name; its index is the `name_id` placements use.
    #[must_use]
    pub fn add_model(mut self, name: impl Into<String>) -> Self {
        self.models.push(name.into());
        self
    }

    #[must_use]
    pub fn add_wmo(mut self, name: impl Into<String>) -> Self {
        self.wmos.push(name.into());
        self
    }

    #[must_use]
    pub fn add_doodad_placement(mut self, placement: DoodadPlacement) -> Self {
        self.doodads.push(placement);
        self
    }

    #[must_use]
    pub fn add_wmo_placement(mut self, placement: WmoPlacement) -> Self {
        self.wmo_placements.push(placement);
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut body = Cursor::new(Vec::new());
        let mut mhdr = Mhdr {
            ofs_mcin: (MCIN_OFFSET - MHDR_DATA_OFFSET) as u32,
            ..Default::default()
        };
        let relative = |body: &Cursor<Vec<u8>>| (BODY_OFFSET + body.position() as usize - MHDR_DATA_OFFSET) as u32;

        mhdr.ofs_mtex = relative(&body);
        body.write_chunk(MTEX, &[])?;

        let (block, offsets) = cstr_block(&self.models);
        mhdr.ofs_mmdx = relative(&body);
        body.write_chunk(placement::MMDX, &block)?;
        mhdr.ofs_mmid = relative(&body);
        body.write_chunk(placement::MMID, &u32_bytes(&offsets))?;

        let (block, offsets) = cstr_block(&self.wmos);
        mhdr.ofs_mwmo = relative(&body);
        body.write_chunk(placement::MWMO, &block)?;
        mhdr.ofs_mwid = relative(&body);
        body.write_chunk(placement::MWID, &u32_bytes(&offsets))?;

        let mut records = Cursor::new(Vec::new());
        for p in &self.doodads {
            p.write(&mut records)?;
        }
        mhdr.ofs_mddf = relative(&body);
        body.write_chunk(placement::MDDF, &records.into_inner())?;

        let mut records = Cursor::new(Vec::new());
        for p in &self.wmo_placements {
            p.write(&mut records)?;
        }
        mhdr.ofs_modf = relative(&body);
        body.write_chunk(placement::MODF, &records.into_inner())?;

        let mut mcin = Cursor::new(Vec::new());
        for x in 0..CELLS_PER_SIDE {
            for y in 0..CELLS_PER_SIDE {
                let cell = self.cells[x * CELLS_PER_SIDE + y].encode(x, y)?;
                McinEntry {
                    offset: (BODY_OFFSET + body.position() as usize) as u32,
                    size: cell.len() as u32,
                    ..Default::default()
                }
                .write(&mut mcin)?;
                body.write_all(&cell)?;
            }
        }

        let mut mhdr_bytes = Cursor::new(Vec::new());
        mhdr.write(&mut mhdr_bytes)?;

        let mut out = Vec::new();
        out.write_chunk(ChunkId::MVER, &18u32.to_le_bytes())?;
        out.write_chunk(header::MHDR, &mhdr_bytes.into_inner())?;
        out.write_chunk(header::MCIN, &mcin.into_inner())?;
        out.write_all(&body.into_inner())?;
        Ok(out)
    }
}

fn u32_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
