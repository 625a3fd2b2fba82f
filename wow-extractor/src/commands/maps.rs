//! Terrain tiles to `.map` files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;
use wow_adt::Adt;
use wow_cdbc::{AREA_TABLE_DBC, FlagTable, MapEntry};
use wow_map::{MapVersion, TerrainPacker, TileId};

use super::{Summary, adt_path, load_flag_table, load_maps, load_wdt, log_unit_failure};
use crate::archive::ArchiveSource;
use crate::config::ExtractorConfig;
use crate::utils::create_progress_bar;

/// Pack every tile of every map that is not skipped. Tiles are packed in
/// parallel; a tile that fails is logged and left out.
pub fn export_maps(archive: &dyn ArchiveSource, config: &ExtractorConfig, version: MapVersion) -> Result<Summary> {
    info!("Extracting Maps..");
    let out_dir = config.maps_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let maps = load_maps(archive)?;
    let areas = load_flag_table(archive, AREA_TABLE_DBC, FlagTable::area_table)?;
    debug!("{} maps, {} areas (max id {})", maps.len(), areas.len(), areas.max_id());
    let packer = TerrainPacker::new(config.map.clone(), areas).with_version(version);

    let mut summary = Summary::default();
    for map in &maps {
        if config.skip.skips(map.id) {
            debug!("Skipping map {} ({})", map.id, map.directory);
            continue;
        }
        summary += export_map(archive, &packer, map, &out_dir);
    }

    info!("Map extraction summary: {summary} tiles");
    Ok(summary)
}

fn export_map(archive: &dyn ArchiveSource, packer: &TerrainPacker, map: &MapEntry, out_dir: &Path) -> Summary {
    info!("Loading WDT file {}.wdt ({})", map.directory, map.id);
    let Some(wdt) = load_wdt(archive, map) else {
        return Summary::default();
    };

    let tiles: Vec<(usize, usize)> = wdt.adt_tiles().collect();
    let pb = create_progress_bar(tiles.len() as u64, &map.directory);
    let done = tiles
        .par_iter()
        .filter(|&&(x, y)| {
            let result = export_tile(archive, packer, map, x, y, out_dir);
            pb.inc(1);
            match result {
                Ok(path) => {
                    debug!("Wrote {}", path.display());
                    true
                }
                Err(e) => {
                    log_unit_failure(&format!("tile ({x}, {y}) of map {}", map.id), &e);
                    false
                }
            }
        })
        .count();
    pb.finish_and_clear();

    Summary::new(done, tiles.len())
}

fn export_tile(
    archive: &dyn ArchiveSource,
    packer: &TerrainPacker,
    map: &MapEntry,
    x: usize,
    y: usize,
    out_dir: &Path,
) -> Result<PathBuf> {
    let name = adt_path(&map.directory, x, y);
    let data = archive.get(&name)?;
    let adt = Adt::parse(&data).with_context(|| format!("Error while parsing {name}"))?;
    let file = packer
        .pack(&adt, TileId::new(map.id, x as u32, y as u32))
        .with_context(|| format!("Error while packing {name}"))?;
    Ok(file.save(out_dir)?)
}
