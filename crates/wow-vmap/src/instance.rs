//! Placed copies of a collision model.

use std::io::Write;
use std::sync::Arc;

use glam::{EulerRot, Mat3, Vec3};

use wow_adt::{DoodadPlacement, WmoPlacement};
use wow_data::{AaBox, WriteExt, to_engine_order};

use crate::error::Result;
use crate::model::{Model, ModelFlags};

/// Edge length of one ADT tile in world units.
pub const TILE_SIZE: f32 = 533.333_33;

/// Offset applied to a worldspawn WMO so that it sits in the tile grid.
pub const WORLDSPAWN_OFFSET: Vec3 = Vec3::new(TILE_SIZE * 32.0, TILE_SIZE * 32.0, 0.0);

/// Doodad scales are stored as fixed point with this denominator.
const DOODAD_SCALE_UNIT: f32 = 1024.0;

/// One placement of a model, positioned in engine order (z, x, y).
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub model: Arc<Model>,
    /// Unique id from the placement record.
    pub id: u32,
    pub adt_id: u16,
    /// Slot in the map tree's object array.
    pub node_index: u32,
    pub tile_x: u32,
    pub tile_y: u32,
    pub position: Vec3,
    /// Degrees, as stored in the placement.
    pub rotation: Vec3,
    pub scale: f32,
    pub bounds: AaBox,
    pub flags: ModelFlags,
}

impl ModelInstance {
    /// Place an M2. The bound is the model's own vertices rotated, scaled
    /// and moved to the placement.
    pub fn from_doodad(model: Arc<Model>, placement: &DoodadPlacement, tile_x: u32, tile_y: u32) -> Self {
        let position = to_engine_order(placement.position());
        let rotation = placement.rotation();
        let scale = f32::from(placement.scale) / DOODAD_SCALE_UNIT;

        let matrix = Mat3::from_euler(
            EulerRot::ZYX,
            rotation.y.to_radians(),
            rotation.x.to_radians(),
            rotation.z.to_radians(),
        );
        let vertices = model.groups.first().map(|g| g.vertices.as_slice()).unwrap_or_default();
        let local = AaBox::from_points(vertices.iter().map(|&v| matrix * (v * scale))).unwrap_or_default();

        Self {
            flags: model.flags | ModelFlags::HAS_BOUND,
            model,
            id: placement.unique_id,
            adt_id: 0,
            node_index: 0,
            tile_x,
            tile_y,
            position,
            rotation,
            scale,
            bounds: local + position,
        }
    }

    /// Place a WMO using the extents stored in the placement.
    pub fn from_wmo(model: Arc<Model>, placement: &WmoPlacement, tile_x: u32, tile_y: u32) -> Self {
        Self {
            flags: model.flags,
            model,
            id: placement.unique_id,
            adt_id: 0,
            node_index: 0,
            tile_x,
            tile_y,
            position: to_engine_order(placement.position()),
            rotation: placement.rotation(),
            scale: 1.0,
            bounds: placement.bounds().to_engine_order(),
        }
    }

    /// The single WMO of a map without terrain.
    pub fn worldspawn(model: Arc<Model>, placement: &WmoPlacement) -> Self {
        let mut instance = Self::from_wmo(model, placement, 0, 0);
        instance.flags |= ModelFlags::WORLDSPAWN;
        instance.position += WORLDSPAWN_OFFSET;
        instance.bounds = instance.bounds + WORLDSPAWN_OFFSET;
        instance
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// Spawn record. Tile files append the node index, the map tree's
    /// global object does not.
    pub fn write_to<W: Write>(&self, writer: &mut W, with_node_index: bool) -> Result<()> {
        writer.write_u32_le(self.flags.bits())?;
        writer.write_u16_le(self.adt_id)?;
        writer.write_u32_le(self.id)?;
        writer.write_vec3(self.position)?;
        writer.write_vec3(self.rotation)?;
        writer.write_f32_le(self.scale)?;
        if self.flags.contains(ModelFlags::HAS_BOUND) {
            writer.write_aabox(&self.bounds)?;
        }
        writer.write_sized_str(self.name())?;
        if with_node_index {
            writer.write_u32_le(self.node_index)?;
        }
        Ok(())
    }
}
