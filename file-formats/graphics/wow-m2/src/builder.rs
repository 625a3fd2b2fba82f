//! Minimal MD20 writer: a zeroed header with the collision fields filled in.

use glam::Vec3;

use wow_data::AaBox;

use crate::{BOUNDING_BOX, COLLISION_BOX, COLLISION_TRIANGLES, COLLISION_VERTICES, MAGIC};

/// End of the vanilla header, after the collision normals reference.
const HEADER_SIZE: usize = 0x104;

#[derive(Debug, Clone)]
pub struct M2Builder {
    version: u32,
    bounding_box: AaBox,
    vertices: Vec<Vec3>,
    indices: Vec<u16>,
}

impl Default for M2Builder {
    fn default() -> Self {
        Self {
            version: 256,
            bounding_box: AaBox::zero(),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl M2Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn bounding_box(mut self, bounds: AaBox) -> Self {
        self.bounding_box = bounds;
        self
    }

    #[must_use]
    pub fn vertices(mut self, vertices: &[Vec3]) -> Self {
        self.vertices = vertices.to_vec();
        self
    }

    #[must_use]
    pub fn triangles(mut self, triangles: &[[u16; 3]]) -> Self {
        self.indices = triangles.iter().flatten().copied().collect();
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&self.version.to_le_bytes());
        put_floats(&mut out, BOUNDING_BOX, &self.bounding_box.to_array());
        put_floats(&mut out, COLLISION_BOX, &self.bounding_box.to_array());

        let vertex_offset = out.len() as u32;
        for v in &self.vertices {
            out.extend(v.to_array().iter().flat_map(|f| f.to_le_bytes()));
        }
        let index_offset = out.len() as u32;
        out.extend(self.indices.iter().flat_map(|i| i.to_le_bytes()));

        put_u32s(&mut out, COLLISION_TRIANGLES, &[self.indices.len() as u32, index_offset]);
        put_u32s(&mut out, COLLISION_VERTICES, &[self.vertices.len() as u32, vertex_offset]);
        out
    }
}

fn put_floats(out: &mut [u8], at: usize, values: &[f32]) {
    for (i, v) in values.iter().enumerate() {
        out[at + i * 4..at + i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
}

fn put_u32s(out: &mut [u8], at: usize, values: &[u32]) {
    for (i, v) in values.iter().enumerate() {
        out[at + i * 4..at + i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
}
