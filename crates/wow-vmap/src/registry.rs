//! State shared between worker threads while a map is being converted.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::instance::ModelInstance;
use crate::model::Model;
use crate::tree::MapTree;

/// Models converted so far, keyed by normalized source path.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: Mutex<HashMap<String, Arc<Model>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive paths compare case-insensitively with either separator.
    pub fn key(path: &str) -> String {
        path.replace('/', "\\").to_ascii_lowercase()
    }

    pub fn get(&self, path: &str) -> Option<Arc<Model>> {
        self.models.lock().get(&Self::key(path)).cloned()
    }

    /// Return the cached model or build it. Building happens outside the
    /// lock; when two threads race the first insert is kept.
    pub fn get_or_try_insert_with<E>(
        &self,
        path: &str,
        build: impl FnOnce() -> Result<Model, E>,
    ) -> Result<Arc<Model>, E> {
        if let Some(model) = self.get(path) {
            return Ok(model);
        }
        let model = Arc::new(build()?);
        Ok(self
            .models
            .lock()
            .entry(Self::key(path))
            .or_insert(model)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every cached model, sorted by name.
    pub fn models(&self) -> Vec<Arc<Model>> {
        let mut models: Vec<_> = self.models.lock().values().cloned().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }
}

#[derive(Debug, Default)]
struct Instances {
    by_id: BTreeMap<u32, ModelInstance>,
    tiles: BTreeMap<(u32, u32), BTreeSet<u32>>,
}

/// Spawns of one map. A placement shared by several tiles is stored once
/// and listed by each of them.
#[derive(Debug, Default)]
pub struct MapInstances {
    map_id: u32,
    inner: Mutex<Instances>,
}

impl MapInstances {
    pub fn new(map_id: u32) -> Self {
        Self {
            map_id,
            inner: Mutex::default(),
        }
    }

    pub fn map_id(&self) -> u32 {
        self.map_id
    }

    /// Record `instance` as referenced by its tile. Returns `false` when the
    /// id was already known, in which case the first placement is kept.
    pub fn insert(&self, instance: ModelInstance) -> bool {
        self.insert_with(instance.tile_x, instance.tile_y, instance.id, || instance)
    }

    /// Record that tile (`tile_x`, `tile_y`) references spawn `id` and build
    /// the instance only if the id is new. `build` runs under the lock, so
    /// each id is constructed exactly once per map.
    pub fn insert_with(&self, tile_x: u32, tile_y: u32, id: u32, build: impl FnOnce() -> ModelInstance) -> bool {
        let mut inner = self.inner.lock();
        inner.tiles.entry((tile_x, tile_y)).or_default().insert(id);
        match inner.by_id.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(build());
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tile_ids(&self, tile_x: u32, tile_y: u32) -> Vec<u32> {
        self.inner
            .lock()
            .tiles
            .get(&(tile_x, tile_y))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Index every spawn and assign node indices.
    pub fn into_tree(self, global: Option<ModelInstance>) -> MapTree {
        let Instances { by_id, tiles } = self.inner.into_inner();
        let tiles = tiles
            .into_iter()
            .map(|(tile, ids)| (tile, ids.into_iter().collect()))
            .collect();
        MapTree::build(self.map_id, by_id, tiles, global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFlags;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wow_adt::WmoPlacement;

    fn model(name: &str) -> Model {
        Model::new(name, 0, ModelFlags::HAS_BOUND, Vec::new())
    }

    #[test]
    fn cache_is_case_insensitive() {
        let cache = ModelCache::new();
        let builds = AtomicUsize::new(0);
        for path in ["World\\wmo\\A.wmo", "world/WMO/a.WMO"] {
            let m = cache
                .get_or_try_insert_with(path, || {
                    builds.fetch_add(1, Ordering::Relaxed);
                    Ok::<_, ()>(model("A.wmo"))
                })
                .unwrap();
            assert_eq!(m.name, "A.wmo");
        }
        assert_eq!(builds.load(Ordering::Relaxed), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let cache = ModelCache::new();
        assert!(cache.get_or_try_insert_with("x.m2", || Err("broken")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn first_placement_wins() {
        let instances = MapInstances::new(1);
        let m = Arc::new(model("a.wmo"));
        let placement = WmoPlacement {
            unique_id: 5,
            position: [1.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(instances.insert(ModelInstance::from_wmo(m.clone(), &placement, 3, 4)));

        let moved = WmoPlacement {
            position: [9.0, 0.0, 0.0],
            ..placement
        };
        assert!(!instances.insert(ModelInstance::from_wmo(m, &moved, 3, 5)));

        assert_eq!(instances.len(), 1);
        assert_eq!(instances.tile_ids(3, 4), vec![5]);
        assert_eq!(instances.tile_ids(3, 5), vec![5]);
        let tree = instances.into_tree(None);
        assert_eq!(tree.instances()[&5].position.y, 1.0);
    }

    #[test]
    fn shared_spawn_is_built_once() {
        let instances = MapInstances::new(1);
        let m = Arc::new(model("a.wmo"));
        let placement = WmoPlacement {
            unique_id: 5,
            ..Default::default()
        };
        let builds = AtomicUsize::new(0);
        for (tile_x, tile_y) in [(3, 4), (3, 5)] {
            instances.insert_with(tile_x, tile_y, placement.unique_id, || {
                builds.fetch_add(1, Ordering::Relaxed);
                ModelInstance::from_wmo(m.clone(), &placement, tile_x, tile_y)
            });
        }

        assert_eq!(builds.load(Ordering::Relaxed), 1);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances.tile_ids(3, 4), vec![5]);
        assert_eq!(instances.tile_ids(3, 5), vec![5]);
    }
}
