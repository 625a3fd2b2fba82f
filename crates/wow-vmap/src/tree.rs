//! Per-map spatial index (`.vmtree`) and per-tile spawn lists (`.vmtile`).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

use wow_data::WriteExt;

use crate::VMAP_MAGIC;
use crate::bih::Bih;
use crate::error::Result;
use crate::instance::ModelInstance;

/// Spawn leaf size of the map tree.
pub const MAP_LEAF_SIZE: usize = 1;

/// Every spawn of one map, indexed.
#[derive(Debug, Clone)]
pub struct MapTree {
    map_id: u32,
    tree: Bih,
    instances: BTreeMap<u32, ModelInstance>,
    tiles: BTreeMap<(u32, u32), Vec<u32>>,
    global: Option<ModelInstance>,
}

impl MapTree {
    /// Build the tree over the instance bounds, in id order, and store
    /// each instance's slot in the tree's object array as its node index.
    pub fn build(
        map_id: u32,
        mut instances: BTreeMap<u32, ModelInstance>,
        tiles: BTreeMap<(u32, u32), Vec<u32>>,
        global: Option<ModelInstance>,
    ) -> Self {
        let tree = {
            let ordered: Vec<&ModelInstance> = instances.values().collect();
            Bih::build(&ordered, |i| i.bounds, MAP_LEAF_SIZE)
        };
        for (instance, slot) in instances.values_mut().zip(tree.object_slots()) {
            instance.node_index = slot;
        }
        debug!(
            "Map {map_id}: {} spawns over {} tiles, {} tree words",
            instances.len(),
            tiles.len(),
            tree.tree().len()
        );
        Self {
            map_id,
            tree,
            instances,
            tiles,
            global,
        }
    }

    pub fn map_id(&self) -> u32 {
        self.map_id
    }

    pub fn tree(&self) -> &Bih {
        &self.tree
    }

    pub fn instances(&self) -> &BTreeMap<u32, ModelInstance> {
        &self.instances
    }

    pub fn global(&self) -> Option<&ModelInstance> {
        self.global.as_ref()
    }

    /// Maps made of a single worldspawn object are not tiled.
    pub fn is_tiled(&self) -> bool {
        self.global.is_none()
    }

    pub fn file_name(&self) -> String {
        format!("{:03}.vmtree", self.map_id)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_tag(VMAP_MAGIC)?;
        writer.write_u8(u8::from(self.is_tiled()))?;
        writer.write_tag(b"NODE")?;
        self.tree.write_to(writer)?;
        writer.write_tag(b"GOBJ")?;
        if let Some(global) = &self.global {
            global.write_to(writer, false)?;
        }
        Ok(())
    }

    /// Spawn lists of every tile, in (x, y) order.
    pub fn tiles(&self) -> impl Iterator<Item = VmTile<'_>> {
        self.tiles.iter().map(|(&(tile_x, tile_y), ids)| VmTile {
            map_id: self.map_id,
            tile_x,
            tile_y,
            instances: ids.iter().filter_map(|id| self.instances.get(id)).collect(),
        })
    }

    /// Write the `.vmtree` and every `.vmtile` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        let path = dir.join(self.file_name());
        write_file(&path, |w| self.write_to(w))?;
        written.push(path);
        for tile in self.tiles() {
            written.push(tile.save(dir)?);
        }
        Ok(written)
    }
}

/// Spawns referenced by one ADT tile.
#[derive(Debug, Clone)]
pub struct VmTile<'a> {
    pub map_id: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub instances: Vec<&'a ModelInstance>,
}

impl VmTile<'_> {
    /// `MMM_YY_XX.vmtile`, y before x.
    pub fn file_name(&self) -> String {
        format!("{:03}_{:02}_{:02}.vmtile", self.map_id, self.tile_y, self.tile_x)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_tag(VMAP_MAGIC)?;
        writer.write_u32_le(self.instances.len() as u32)?;
        for instance in &self.instances {
            instance.write_to(writer, true)?;
        }
        Ok(())
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        write_file(&path, |w| self.write_to(w))?;
        Ok(path)
    }
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use wow_adt::WmoPlacement;

    use crate::model::{Model, ModelFlags};
    use crate::registry::MapInstances;

    fn placement(id: u32, x: f32) -> WmoPlacement {
        WmoPlacement {
            unique_id: id,
            extents_min: [x, 0.0, 0.0],
            extents_max: [x + 1.0, 1.0, 1.0],
            ..Default::default()
        }
    }

    fn sample_tree() -> MapTree {
        let model = Arc::new(Model::new("hut.wmo", 3, ModelFlags::HAS_BOUND, Vec::new()));
        let instances = MapInstances::new(1);
        for (id, x, tile) in [(30, 0.0, (10, 20)), (10, 5.0, (10, 20)), (20, 10.0, (11, 20))] {
            instances.insert(ModelInstance::from_wmo(model.clone(), &placement(id, x), tile.0, tile.1));
        }
        instances.into_tree(None)
    }

    #[test]
    fn node_indices_point_at_their_object_slot() {
        let tree = sample_tree();
        let objects = tree.tree().objects();
        // Primitives are the instances in id order.
        for (primitive, instance) in tree.instances().values().enumerate() {
            assert_eq!(objects[instance.node_index as usize] as usize, primitive);
        }
    }

    #[test]
    fn tile_files() {
        let tree = sample_tree();
        let tiles: Vec<_> = tree.tiles().collect();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].file_name(), "001_20_10.vmtile");
        assert_eq!(tiles[0].instances.iter().map(|i| i.id).collect::<Vec<_>>(), vec![10, 30]);

        let mut data = Vec::new();
        tiles[1].write_to(&mut data).unwrap();
        assert_eq!(&data[..8], b"VMAP_4.0");
        assert_eq!(u32::from_le_bytes(data[8..12].try_into().unwrap()), 1);
    }

    #[test]
    fn tiled_tree_header() {
        let tree = sample_tree();
        assert_eq!(tree.file_name(), "001.vmtree");
        let mut data = Vec::new();
        tree.write_to(&mut data).unwrap();
        assert_eq!(data[8], 1);
        assert_eq!(&data[9..13], b"NODE");
        assert_eq!(&data[data.len() - 4..], b"GOBJ");
    }

    #[test]
    fn worldspawn_tree() {
        let model = Arc::new(Model::new("dungeon.wmo", 3, ModelFlags::HAS_BOUND, Vec::new()));
        let global = ModelInstance::worldspawn(model, &placement(1, 0.0));
        let tree = MapInstances::new(33).into_tree(Some(global));
        assert!(!tree.is_tiled());
        assert_eq!(tree.tiles().count(), 0);

        let mut data = Vec::new();
        tree.write_to(&mut data).unwrap();
        assert_eq!(data[8], 0);
        let gobj = data.windows(4).position(|w| w == b"GOBJ").unwrap();
        let record = &data[gobj + 4..];
        let flags = u32::from_le_bytes(record[..4].try_into().unwrap());
        assert_eq!(flags, (ModelFlags::WORLDSPAWN | ModelFlags::HAS_BOUND).bits());
        assert!(record.ends_with(b"dungeon.wmo"));
    }

    #[test]
    fn save_writes_tree_and_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let written = sample_tree().save(dir.path()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["001.vmtree", "001_20_10.vmtile", "001_20_11.vmtile"]);
    }
}
