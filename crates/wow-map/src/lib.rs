//! Packs the terrain of one ADT tile into a server `.map` file.
//!
//! The 256 cells of a tile are merged into a 129x129 outer (V9) and a
//! 128x128 inner (V8) height grid, a 128x128 liquid grid and 16x16 area,
//! liquid type and hole grids. Each part is then written in the smallest
//! encoding the configured thresholds allow: a single value when the whole
//! tile agrees, `u8`/`u16` quantized heights when the range is small, and a
//! liquid rectangle clipped to the shown liquid points.
//!
//! ```
//! use wow_adt::{Adt, AdtBuilder, CellBuilder};
//! use wow_cdbc::FlagTable;
//! use wow_map::{HeightFlags, PackConfig, TerrainPacker, TileId};
//!
//! let data = AdtBuilder::new()
//!     .with_all_cells(|_, _, cell| cell.area(12).flat(40.0))
//!     .build()
//!     .unwrap();
//! let adt = Adt::parse(&data).unwrap();
//! let areas: FlagTable = [(12, 0x40)].into_iter().collect();
//!
//! let packer = TerrainPacker::new(PackConfig::default(), areas);
//! let map = packer.pack(&adt, TileId::new(0, 32, 48)).unwrap();
//! assert_eq!(map.area.area(3, 4), 0x40);
//! assert!(map.height.header.flags.contains(HeightFlags::NO_HEIGHT));
//! assert!(map.liquid.is_none());
//! assert_eq!(map.tile.file_name(), "0003248.map");
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod grid;
pub mod map_file;
pub mod pack;

pub use config::{MapVersion, PackConfig};
pub use error::{MapError, Result};
pub use format::{
    AreaFlags, AreaHeader, HeightFlags, HeightHeader, LiquidHeader, LiquidHeaderFlags,
    LiquidTypeFlags, MapHeader,
};
pub use grid::{NO_AREA_FLAG, TerrainGrid, area_flag};
pub use map_file::{AreaSection, CellGrid, HeightData, HeightSection, LiquidSection, MapFile, TileId};
pub use pack::TerrainPacker;
