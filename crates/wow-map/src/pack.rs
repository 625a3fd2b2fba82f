//! Lossy packing of a [`TerrainGrid`] into a [`MapFile`].

use log::{debug, trace};

use wow_adt::Adt;
use wow_cdbc::FlagTable;

use crate::config::{MapVersion, PackConfig};
use crate::error::Result;
use crate::format::{
    AreaFlags, AreaHeader, GRID, HOLES_SIZE, HeightFlags, HeightHeader, LiquidHeader,
    LiquidHeaderFlags, LiquidTypeFlags, MapHeader,
};
use crate::grid::TerrainGrid;
use crate::map_file::{AreaSection, HeightData, HeightSection, LiquidSection, MapFile, TileId};

/// Turns ADT tiles into `.map` files with a fixed configuration.
#[derive(Debug, Clone)]
pub struct TerrainPacker {
    config: PackConfig,
    areas: FlagTable,
    version: MapVersion,
}

impl TerrainPacker {
    pub fn new(config: PackConfig, areas: FlagTable) -> Self {
        Self {
            config,
            areas,
            version: MapVersion::default(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: MapVersion) -> Self {
        self.version = version;
        self
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Decode every cell of `adt` and pack the result.
    pub fn pack(&self, adt: &Adt<'_>, tile: TileId) -> Result<MapFile> {
        let grid = TerrainGrid::from_adt(adt, &self.areas, &self.config)?;
        Ok(grid.pack(&self.config, self.version, tile))
    }
}

impl TerrainGrid {
    pub fn pack(&self, config: &PackConfig, version: MapVersion, tile: TileId) -> MapFile {
        let area = self.pack_area();
        let height = self.pack_height(config);
        let liquid = self.pack_liquid(config);

        let area_offset = MapHeader::SIZE;
        let height_offset = area_offset + area.size();
        let after_height = height_offset + height.size();
        let (liquid_offset, liquid_size) = match &liquid {
            Some(l) => (after_height, l.size()),
            None => (0, 0),
        };
        let holes_offset = if liquid.is_some() {
            liquid_offset + liquid_size
        } else {
            after_height
        };

        let header = MapHeader {
            version_magic: version.magic,
            build: version.build,
            area_offset,
            area_size: area.size(),
            height_offset,
            height_size: height.size(),
            liquid_offset,
            liquid_size,
            holes_offset,
            holes_size: HOLES_SIZE,
        };
        trace!(
            "Packed {}: area {} B, height {} B, liquid {liquid_size} B",
            tile.file_name(),
            header.area_size,
            header.height_size
        );

        MapFile {
            tile,
            header,
            area,
            height,
            liquid,
            holes: self.holes,
        }
    }

    fn pack_area(&self) -> AreaSection {
        let first = self.area_flags[0][0];
        let uniform = self.area_flags.iter().flatten().all(|&a| a == first);
        if uniform {
            AreaSection {
                header: AreaHeader {
                    flags: AreaFlags::NO_AREA,
                    grid_area: first,
                },
                grid: None,
            }
        } else {
            AreaSection {
                header: AreaHeader::default(),
                grid: Some(self.area_flags),
            }
        }
    }

    fn pack_height(&self, config: &PackConfig) -> HeightSection {
        let (min, max) = self.height_range();
        let range = max - min;
        let mut header = HeightHeader {
            flags: HeightFlags::empty(),
            grid_height: min,
            grid_max_height: max,
        };

        let flat = min == max || (config.allow_float_to_int && range < config.flat_height_delta_limit);
        let data = if flat {
            header.flags |= HeightFlags::NO_HEIGHT;
            HeightData::Flat
        } else if config.allow_float_to_int && range < config.float_to_byte_limit {
            header.flags |= HeightFlags::AS_INT8;
            let step = 255.0 / range;
            HeightData::U8 {
                v9: quantize(&self.v9, min, step),
                v8: quantize(&self.v8, min, step),
            }
        } else if config.allow_float_to_int && range < config.float_to_short_limit {
            header.flags |= HeightFlags::AS_INT16;
            let step = 65535.0 / range;
            HeightData::U16 {
                v9: quantize(&self.v9, min, step),
                v8: quantize(&self.v8, min, step),
            }
        } else {
            HeightData::F32 {
                v9: self.v9.clone(),
                v8: self.v8.clone(),
            }
        };
        HeightSection { header, data }
    }

    fn pack_liquid(&self, config: &PackConfig) -> Option<LiquidSection> {
        let first = self.liquid_flags[0][0];
        let mixed = self.liquid_flags.iter().flatten().any(|&f| f != first);
        if first.is_empty() && !mixed {
            return None;
        }

        let mut rect: Option<(usize, usize, usize, usize)> = None;
        let (mut min_height, mut max_height) = (f32::INFINITY, f32::NEG_INFINITY);
        for y in 0..GRID {
            for x in 0..GRID {
                if !self.liquid_show[y * GRID + x] {
                    continue;
                }
                rect = Some(match rect {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
                let h = self.liquid_height[y * GRID + x];
                min_height = min_height.min(h);
                max_height = max_height.max(h);
            }
        }
        let Some((min_x, min_y, max_x, max_y)) = rect else {
            debug!("Liquid flags set but no liquid tile is shown, skipping liquid");
            return None;
        };

        let width = max_x - min_x + 2;
        let height = max_y - min_y + 2;
        let mut header = LiquidHeader {
            flags: LiquidHeaderFlags::empty(),
            liquid_type: 0,
            offset_x: min_x as u8,
            offset_y: min_y as u8,
            width: width as u8,
            height: height as u8,
            level: min_height,
        };

        let types = if mixed {
            Some((
                self.liquid_entry,
                self.liquid_flags.map(|row| row.map(|f: LiquidTypeFlags| f.bits())),
            ))
        } else {
            header.flags |= LiquidHeaderFlags::NO_TYPE;
            header.liquid_type = u16::from(first.bits());
            None
        };

        let flat = max_height == min_height
            || (config.allow_float_to_int
                && max_height - min_height < config.flat_liquid_delta_limit);
        let heights = if flat {
            header.flags |= LiquidHeaderFlags::NO_HEIGHT;
            None
        } else {
            let mut heights = Vec::with_capacity(width * height);
            for y in min_y..min_y + height {
                for x in min_x..min_x + width {
                    heights.push(self.liquid_point(x, y, config));
                }
            }
            Some(heights)
        };

        Some(LiquidSection {
            header,
            types,
            heights,
        })
    }

    /// Height of a shown liquid point, `use_min_height` for everything else.
    fn liquid_point(&self, x: usize, y: usize, config: &PackConfig) -> f32 {
        if x < GRID && y < GRID && self.liquid_show[y * GRID + x] {
            self.liquid_height[y * GRID + x]
        } else {
            config.use_min_height
        }
    }
}

fn quantize<T: FromQuantized>(heights: &[f32], min: f32, step: f32) -> Vec<T> {
    heights
        .iter()
        .map(|&h| T::from_scaled((h - min) * step + 0.5))
        .collect()
}

/// Truncating conversion of an already scaled height.
trait FromQuantized {
    fn from_scaled(v: f32) -> Self;
}

impl FromQuantized for u8 {
    fn from_scaled(v: f32) -> Self {
        v as u8
    }
}

impl FromQuantized for u16 {
    fn from_scaled(v: f32) -> Self {
        v as u16
    }
}
