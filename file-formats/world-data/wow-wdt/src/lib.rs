//! Parser for World of Warcraft WDT (World Data Table) files.
//!
//! A WDT lists which of the 64x64 ADT tiles of a map exist and, for
//! instance maps made of a single building, names the global WMO and its
//! placement.
//!
//! ```text
//! MVER  version 18
//! MPHD  flags + 28 unused bytes
//! MAIN  64x64 x {flags, async id}
//! MWMO  global WMO name (empty unless MPHD flag 0x1)
//! MODF  one placement, only with MPHD flag 0x1
//! ```
//!
//! # Examples
//!
//! ```
//! use wow_wdt::{Wdt, WdtBuilder};
//!
//! let data = WdtBuilder::new().with_tile(32, 48).build().unwrap();
//! let wdt = Wdt::parse(&data).unwrap();
//! assert!(wdt.has_adt(32, 48));
//! assert!(!wdt.has_adt(48, 32));
//! ```

pub mod builder;
pub mod error;
pub mod mphd;

use log::debug;

use wow_adt::WmoPlacement;
use wow_data::{ChunkId, ChunkReader, cstr_at};

pub use builder::WdtBuilder;
pub use error::{Error, Result};
pub use mphd::MphdFlags;

pub const MAIN: ChunkId = ChunkId::from_mnemonic(b"MAIN");
pub const MWMO: ChunkId = ChunkId::from_mnemonic(b"MWMO");
pub const MODF: ChunkId = ChunkId::from_mnemonic(b"MODF");

/// Tiles per side of a map.
pub const MAP_TILE_SIZE: usize = 64;

/// Supported WDT versions.
pub const SUPPORTED_VERSIONS: &[u32] = &[18];

const HAS_ADT: u32 = 0x1;

/// One MAIN entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileEntry {
    pub flags: u32,
    pub async_id: u32,
}

/// The single WMO an instance map is made of.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalObject {
    pub name: String,
    pub placement: WmoPlacement,
}

/// A parsed WDT.
#[derive(Debug, Clone)]
pub struct Wdt {
    pub flags: MphdFlags,
    tiles: Vec<TileEntry>,
    global: Option<GlobalObject>,
}

impl Wdt {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let reader = ChunkReader::new(data);
        let mver = reader.read_version("WDT", SUPPORTED_VERSIONS)?;

        let mphd = reader.expect_chunk(mver.next_offset(), mphd::MPHD)?;
        let flags = mphd::parse_flags(&mphd)?;

        let main = reader.expect_chunk(mphd.next_offset(), MAIN)?;
        if main.size() != MAP_TILE_SIZE * MAP_TILE_SIZE * 8 {
            return Err(Error::InvalidMainSize(main.size()));
        }
        let mut cursor = main.cursor();
        let mut tiles = Vec::with_capacity(MAP_TILE_SIZE * MAP_TILE_SIZE);
        for _ in 0..MAP_TILE_SIZE * MAP_TILE_SIZE {
            tiles.push(TileEntry {
                flags: cursor.read_u32()?,
                async_id: cursor.read_u32()?,
            });
        }

        let mwmo = reader.expect_chunk(main.next_offset(), MWMO)?;
        let global = if flags.contains(MphdFlags::WDT_USES_GLOBAL_MAP_OBJ) {
            let name = cstr_at(mwmo.payload, 0).unwrap_or_default();
            let modf = reader.expect_chunk(mwmo.next_offset(), MODF)?;
            let placement = WmoPlacement::parse(&modf)?
                .into_iter()
                .next()
                .ok_or(Error::MissingGlobalPlacement)?;
            debug!("WDT global WMO {name} (unique id {})", placement.unique_id);
            Some(GlobalObject { name, placement })
        } else {
            None
        };

        Ok(Self {
            flags,
            tiles,
            global,
        })
    }

    /// MAIN entry for tile (x, y), stored at `x * 64 + y`.
    pub fn tile(&self, x: usize, y: usize) -> Option<&TileEntry> {
        if x >= MAP_TILE_SIZE || y >= MAP_TILE_SIZE {
            return None;
        }
        self.tiles.get(x * MAP_TILE_SIZE + y)
    }

    pub fn has_adt(&self, x: usize, y: usize) -> bool {
        self.tile(x, y).is_some_and(|t| t.flags & HAS_ADT != 0)
    }

    /// Every (x, y) with an ADT, x major.
    pub fn adt_tiles(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..MAP_TILE_SIZE)
            .flat_map(|x| (0..MAP_TILE_SIZE).map(move |y| (x, y)))
            .filter(|&(x, y)| self.has_adt(x, y))
    }

    pub fn global_object(&self) -> Option<&GlobalObject> {
        self.global.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn presence_bitmap_is_x_major() {
        let data = WdtBuilder::new().with_tile(3, 5).with_tile(3, 6).build().unwrap();
        let wdt = Wdt::parse(&data).unwrap();
        assert!(wdt.has_adt(3, 5));
        assert!(!wdt.has_adt(5, 3));
        assert!(!wdt.has_adt(64, 0));
        assert_eq!(wdt.adt_tiles().collect::<Vec<_>>(), vec![(3, 5), (3, 6)]);
        assert!(wdt.global_object().is_none());
    }

    #[test]
    fn global_object_is_read_when_flagged() {
        let placement = WmoPlacement {
            unique_id: 42,
            position: [1.0, 2.0, 3.0],
            ..Default::default()
        };
        let data = WdtBuilder::new()
            .with_global_object("World\\wmo\\Dungeon\\Test.wmo", placement)
            .build()
            .unwrap();
        let wdt = Wdt::parse(&data).unwrap();
        assert!(wdt.flags.contains(MphdFlags::WDT_USES_GLOBAL_MAP_OBJ));
        let global = wdt.global_object().unwrap();
        assert_eq!(global.name, "World\\wmo\\Dungeon\\Test.wmo");
        assert_eq!(global.placement, placement);
    }

    #[test]
    fn short_main_is_rejected() {
        let mut data = WdtBuilder::new().build().unwrap();
        data.truncate(100);
        assert!(Wdt::parse(&data).is_err());
    }
}
