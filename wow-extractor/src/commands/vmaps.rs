//! Collision models and spawn trees.
//!
//! Every map's tiles are walked in parallel. Each M2 and WMO a placement
//! names is converted once and shared through a [`ModelCache`]; placements
//! are gathered per map by unique id and written as one `.vmtree` plus one
//! `.vmtile` per tile. The `.vmo` files are written last, once every map has
//! been seen.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;
use wow_adt::Adt;
use wow_cdbc::MapEntry;
use wow_m2::M2Model;
use wow_vmap::{MapInstances, Model, ModelBuilder, ModelCache, ModelInstance};
use wow_wmo::{WmoGroup, WmoRoot, group_file_name};

use super::{Summary, adt_path, load_maps, load_wdt, log_unit_failure};
use crate::archive::ArchiveSource;
use crate::config::ExtractorConfig;
use crate::utils::create_progress_bar;

/// Converts models on first use and remembers the ones that failed.
struct ModelLoader<'a> {
    archive: &'a dyn ArchiveSource,
    builder: ModelBuilder,
    cache: ModelCache,
    failed: Mutex<HashSet<String>>,
}

impl<'a> ModelLoader<'a> {
    fn new(archive: &'a dyn ArchiveSource, builder: ModelBuilder) -> Self {
        Self {
            archive,
            builder,
            cache: ModelCache::new(),
            failed: Mutex::new(HashSet::new()),
        }
    }

    /// Static mesh named by a doodad placement. `.mdx` and `.mdl` names
    /// refer to the `.m2` file.
    fn m2(&self, path: &str) -> Option<Arc<Model>> {
        let path = m2_path(path);
        self.load(&path, || {
            let data = self.archive.get(&path)?;
            let m2 = M2Model::parse(&data).with_context(|| format!("Error while parsing {path}"))?;
            Ok(self.builder.build_m2(base_name(&path), &m2))
        })
    }

    /// World object with all of its group files.
    fn wmo(&self, path: &str) -> Option<Arc<Model>> {
        self.load(path, || {
            let data = self.archive.get(path)?;
            let root = WmoRoot::parse(&data).with_context(|| format!("Error while parsing {path}"))?;
            let groups = (0..root.group_count())
                .map(|index| {
                    let name = group_file_name(path, index);
                    let data = self.archive.get(&name)?;
                    WmoGroup::parse(&data).with_context(|| format!("Error while parsing {name}"))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(self.builder.build_wmo(base_name(path), &root, &groups)?)
        })
    }

    fn load(&self, path: &str, build: impl FnOnce() -> Result<Model>) -> Option<Arc<Model>> {
        let key = ModelCache::key(path);
        if self.failed.lock().contains(&key) {
            return None;
        }
        match self.cache.get_or_try_insert_with(path, build) {
            Ok(model) => Some(model),
            Err(e) => {
                log_unit_failure(&format!("model {path}"), &e);
                self.failed.lock().insert(key);
                None
            }
        }
    }

    fn failed_count(&self) -> usize {
        self.failed.lock().len()
    }
}

fn m2_path(path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    match lower.strip_suffix(".mdx").or_else(|| lower.strip_suffix(".mdl")) {
        Some(_) => format!("{}.m2", &path[..path.len() - 4]),
        None => path.to_string(),
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(['\\', '/']).next().unwrap_or(path)
}

/// Build the spawn trees of every map and the model files they reference.
/// Returns how many of the converted models were written.
pub fn generate_vmaps(archive: &dyn ArchiveSource, config: &ExtractorConfig) -> Result<Summary> {
    info!("Extracting Vmaps..");
    let out_dir = config.vmaps_dir();
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    debug!("{} world model roots in the archives", archive.world_model_roots().len());

    let loader = ModelLoader::new(archive, ModelBuilder::new(config.vmap.vector_mode()));
    let maps = load_maps(archive)?;

    let mut tiles = Summary::default();
    for map in &maps {
        if config.skip.skips(map.id) {
            debug!("Skipping map {} ({})", map.id, map.directory);
            continue;
        }
        tiles += generate_map(&loader, map, &out_dir);
    }
    info!("Spawn extraction summary: {tiles} tiles");

    let models = save_models(&loader, &out_dir);
    info!("Model extraction summary: {models}");
    Ok(models)
}

fn generate_map(loader: &ModelLoader<'_>, map: &MapEntry, out_dir: &Path) -> Summary {
    info!("Loading WDT file {}.wdt ({})", map.directory, map.id);
    let Some(wdt) = load_wdt(loader.archive, map) else {
        return Summary::default();
    };

    let global = wdt.global_object().and_then(|object| {
        debug!("Map {} is the single world object {}", map.id, object.name);
        loader
            .wmo(&object.name)
            .map(|model| ModelInstance::worldspawn(model, &object.placement))
    });

    let instances = MapInstances::new(map.id);
    let coords: Vec<(usize, usize)> = wdt.adt_tiles().collect();
    let pb = create_progress_bar(coords.len() as u64, &map.directory);
    let done = coords
        .par_iter()
        .filter(|&&(x, y)| {
            let result = place_tile(loader, &instances, map, x, y);
            pb.inc(1);
            match result {
                Ok(placed) => {
                    debug!("Tile ({x}, {y}) of map {}: {placed} new spawns", map.id);
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

    if instances.is_empty() && global.is_none() {
        debug!("No spawns on map {}", map.id);
        return Summary::new(done, coords.len());
    }

    let spawns = instances.len();
    let tree = instances.into_tree(global);
    match tree.save(out_dir) {
        Ok(paths) => debug!("Map {}: {spawns} spawns in {} files", map.id, paths.len()),
        Err(e) => error!("Error while writing the spawns of map {}: {e}", map.id),
    }
    Summary::new(done, coords.len())
}

/// Register every placement of one ADT. Returns the number of spawns that
/// were not already known from a neighbouring tile.
fn place_tile(loader: &ModelLoader<'_>, instances: &MapInstances, map: &MapEntry, x: usize, y: usize) -> Result<usize> {
    let name = adt_path(&map.directory, x, y);
    let data = loader.archive.get(&name)?;
    let adt = Adt::parse(&data).with_context(|| format!("Error while parsing {name}"))?;
    let placements = adt
        .placements()
        .with_context(|| format!("Error while reading the placements of {name}"))?;
    let (tile_x, tile_y) = (x as u32, y as u32);

    let mut placed = 0;
    for doodad in &placements.doodads {
        let Some(path) = placements.model_name(doodad) else {
            warn!("{name}: doodad {} names unknown model {}", doodad.unique_id, doodad.name_id);
            continue;
        };
        let Some(model) = loader.m2(path) else {
            continue;
        };
        if model.triangle_count() == 0 {
            continue;
        }
        let new = instances.insert_with(tile_x, tile_y, doodad.unique_id, || {
            ModelInstance::from_doodad(model, doodad, tile_x, tile_y)
        });
        placed += usize::from(new);
    }
    for wmo in &placements.wmo_placements {
        let Some(path) = placements.wmo_name(wmo) else {
            warn!("{name}: world object {} names unknown model {}", wmo.unique_id, wmo.name_id);
            continue;
        };
        let Some(model) = loader.wmo(path) else {
            continue;
        };
        let new = instances.insert_with(tile_x, tile_y, wmo.unique_id, || {
            ModelInstance::from_wmo(model, wmo, tile_x, tile_y)
        });
        placed += usize::from(new);
    }
    Ok(placed)
}

/// Write every converted model. Static meshes without collision are never
/// placed and not written.
fn save_models(loader: &ModelLoader<'_>, out_dir: &Path) -> Summary {
    let models: Vec<_> = loader
        .cache
        .models()
        .into_iter()
        .filter(|m| !m.is_m2() || m.triangle_count() > 0)
        .collect();
    let mut summary = Summary::new(0, models.len() + loader.failed_count());
    for model in &models {
        match model.save(out_dir) {
            Ok(path) => {
                debug!("Wrote {}", path.display());
                summary.done += 1;
            }
            Err(e) => error!("Error while writing model {}: {e}", model.name),
        }
    }
    summary
}
