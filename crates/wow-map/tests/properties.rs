use proptest::prelude::*;
use wow_map::{
    AreaFlags, HeightData, MapFile, MapVersion, PackConfig, TerrainGrid, TileId,
    format::{GRID, GRID_V9, LiquidTypeFlags},
};

/// A grid whose heights repeat `pattern` scaled into `[base, base + span]`.
fn terrain(base: f32, span: f32, pattern: &[f32]) -> TerrainGrid {
    let mut grid = TerrainGrid::default();
    for (i, h) in grid.v9.iter_mut().enumerate() {
        *h = base + span * pattern[i % pattern.len()];
    }
    for (i, h) in grid.v8.iter_mut().enumerate() {
        *h = base + span * pattern[(i * 7) % pattern.len()];
    }
    grid
}

fn repack(grid: &TerrainGrid, config: &PackConfig) -> MapFile {
    let tile = TileId::new(0, 1, 2);
    let map = grid.pack(config, MapVersion::CLASSIC, tile);
    MapFile::from_bytes(tile, &map.to_bytes().unwrap()).unwrap()
}

proptest! {
    #[test]
    fn quantized_heights_stay_within_one_step(
        base in -400.0f32..400.0,
        span in 0.05f32..1500.0,
        pattern in prop::collection::vec(0.0f32..=1.0, 2..64),
    ) {
        let config = PackConfig::default();
        let grid = terrain(base, span, &pattern);
        let map = repack(&grid, &config);
        let (min, max) = grid.height_range();
        let tolerance = match map.height.data {
            HeightData::U8 { .. } | HeightData::U16 { .. } => 1.0 / map.height.step() + 1e-3 * max.abs().max(1.0),
            HeightData::F32 { .. } => 0.0,
            HeightData::Flat => max - min,
        };
        for row in (0..GRID_V9).step_by(13) {
            for col in (0..GRID_V9).step_by(11) {
                prop_assert!((map.height.v9(row, col) - grid.v9(row, col)).abs() <= tolerance);
            }
        }
        for row in (0..GRID).step_by(17) {
            for col in (0..GRID).step_by(5) {
                prop_assert!((map.height.v8(row, col) - grid.v8(row, col)).abs() <= tolerance);
            }
        }
    }

    #[test]
    fn uniform_area_is_a_single_value(flag in any::<u16>()) {
        let mut grid = TerrainGrid::default();
        for row in &mut grid.area_flags {
            row.fill(flag);
        }
        let map = repack(&grid, &PackConfig::default());
        prop_assert_eq!(map.area.header.flags, AreaFlags::NO_AREA);
        prop_assert_eq!(map.area.header.grid_area, flag);
        prop_assert_eq!(map.header.area_size, 8);
    }

    #[test]
    fn liquid_rectangle_covers_every_shown_point(
        points in prop::collection::vec((0usize..GRID, 0usize..GRID, -50.0f32..50.0), 1..40),
    ) {
        let mut grid = TerrainGrid::default();
        for &(x, y, h) in &points {
            grid.liquid_show[y * GRID + x] = true;
            grid.liquid_height[y * GRID + x] = h;
            grid.liquid_flags[y / 8][x / 8] = LiquidTypeFlags::WATER;
            grid.liquid_entry[y / 8][x / 8] = 1;
        }
        let map = repack(&grid, &PackConfig::default());
        let liquid = map.liquid.unwrap();
        for &(x, y, _) in &points {
            prop_assert!(liquid.covers(y, x));
            let stored = liquid.height(y, x).unwrap();
            let expected = grid.liquid_height[y * GRID + x];
            prop_assert!(liquid.heights.is_none() || stored == expected);
        }
        prop_assert_eq!(
            map.header.holes_offset,
            map.header.liquid_offset + map.header.liquid_size
        );
    }
}
