//! Full-resolution terrain of one tile, merged from its 256 cells.

use log::{debug, warn};

use wow_adt::{Adt, CELLS_PER_SIDE, LiquidCategory, McnkCell};
use wow_cdbc::FlagTable;

use crate::config::PackConfig;
use crate::error::Result;
use crate::format::{CELL_GRID, CELLS, GRID, GRID_V9, LiquidTypeFlags};

/// Area flag written for cells whose area is unknown.
pub const NO_AREA_FLAG: u16 = 0xFFFF;

/// Unpacked tile. Cell grids are `[i][j]` with `i` the MCIN row; point
/// grids are flat and row major.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    pub area_flags: [[u16; CELLS]; CELLS],
    /// `GRID_V9 * GRID_V9` absolute heights.
    pub v9: Vec<f32>,
    /// `GRID * GRID` absolute heights.
    pub v8: Vec<f32>,
    pub liquid_show: Vec<bool>,
    pub liquid_height: Vec<f32>,
    pub liquid_entry: [[u16; CELLS]; CELLS],
    pub liquid_flags: [[LiquidTypeFlags; CELLS]; CELLS],
    pub holes: [[u16; CELLS]; CELLS],
}

impl Default for TerrainGrid {
    fn default() -> Self {
        Self {
            area_flags: [[0; CELLS]; CELLS],
            v9: vec![0.0; GRID_V9 * GRID_V9],
            v8: vec![0.0; GRID * GRID],
            liquid_show: vec![false; GRID * GRID],
            liquid_height: vec![0.0; GRID * GRID],
            liquid_entry: [[0; CELLS]; CELLS],
            liquid_flags: [[LiquidTypeFlags::empty(); CELLS]; CELLS],
            holes: [[0; CELLS]; CELLS],
        }
    }
}

/// Liquid entry and cell flag written for one MCLQ layer kind.
fn liquid_kind(category: LiquidCategory) -> (u16, LiquidTypeFlags) {
    match category {
        LiquidCategory::River => (1, LiquidTypeFlags::WATER),
        LiquidCategory::Ocean => (2, LiquidTypeFlags::OCEAN),
        LiquidCategory::Magma => (3, LiquidTypeFlags::MAGMA),
    }
}

impl TerrainGrid {
    /// Decode every cell of `adt` and merge it in.
    pub fn from_adt(adt: &Adt<'_>, areas: &FlagTable, config: &PackConfig) -> Result<Self> {
        let mut grid = Self::default();
        for i in 0..CELLS_PER_SIDE {
            for j in 0..CELLS_PER_SIDE {
                let cell = adt.cell(i, j)?;
                grid.add_cell(i, j, &cell, areas, config);
            }
        }
        Ok(grid)
    }

    pub fn add_cell(
        &mut self,
        i: usize,
        j: usize,
        cell: &McnkCell,
        areas: &FlagTable,
        config: &PackConfig,
    ) {
        self.area_flags[i][j] = area_flag(areas, cell.area_id(), (i, j));
        self.add_heights(i, j, cell, config);
        self.add_liquids(i, j, cell);
        self.holes[i][j] = cell.holes();
    }

    fn add_heights(&mut self, i: usize, j: usize, cell: &McnkCell, config: &PackConfig) {
        let base = cell.position().z;
        let clamp = |h: f32| {
            if config.allow_height_limit && h < config.use_min_height {
                config.use_min_height
            } else {
                h
            }
        };
        for y in 0..=CELL_GRID {
            let cy = i * CELL_GRID + y;
            for x in 0..=CELL_GRID {
                let cx = j * CELL_GRID + x;
                if y < CELL_GRID && x < CELL_GRID {
                    self.v8[cy * GRID + cx] = clamp(base + cell.inner_height(x, y));
                }
                self.v9[cy * GRID_V9 + cx] = clamp(base + cell.outer_height(x, y));
            }
        }
    }

    fn add_liquids(&mut self, i: usize, j: usize, cell: &McnkCell) {
        if cell.liquids.len() > 1 {
            debug!(
                "{} liquid layers in cell ({i}, {j}), later layers win",
                cell.liquids.len()
            );
        }
        for layer in &cell.liquids {
            let (entry, flag) = liquid_kind(layer.category);
            self.liquid_entry[i][j] = entry;
            self.liquid_flags[i][j] |= flag;
        }
        for layer in &cell.liquids {
            for y in 0..CELL_GRID {
                let cy = i * CELL_GRID + y;
                for x in 0..CELL_GRID {
                    if !layer.is_shown(x, y) {
                        continue;
                    }
                    let at = cy * GRID + j * CELL_GRID + x;
                    self.liquid_show[at] = true;
                    self.liquid_height[at] = layer.height(x, y);
                    if layer.is_dark(x, y) {
                        self.liquid_flags[i][j] |= LiquidTypeFlags::DARK_WATER;
                    }
                }
            }
        }
    }

    pub fn v9(&self, row: usize, col: usize) -> f32 {
        self.v9[row * GRID_V9 + col]
    }

    pub fn v8(&self, row: usize, col: usize) -> f32 {
        self.v8[row * GRID + col]
    }

    /// Lowest and highest height over both grids.
    pub fn height_range(&self) -> (f32, f32) {
        self.v9
            .iter()
            .chain(&self.v8)
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            })
    }
}

/// AreaTable flag for `area_id`, [`NO_AREA_FLAG`] when the id is 0, past the
/// table, or missing from it.
pub fn area_flag(areas: &FlagTable, area_id: u32, cell: (usize, usize)) -> u16 {
    if area_id == 0 || area_id > areas.max_id() {
        return NO_AREA_FLAG;
    }
    match areas.get(area_id) {
        Some(flag) => flag as u16,
        None => {
            warn!(
                "Can not find area flag for area {area_id} [{}, {}]",
                cell.0, cell.1
            );
            NO_AREA_FLAG
        }
    }
}
