//! Collision geometry reader for MD20 (M2) models.
//!
//! Only the parts of the model that matter for collision are decoded: the
//! bounding box from the header and the two collision arrays. Animations,
//! skins and textures are never touched.
//!
//! Relevant header fields of the vanilla layout (versions 256 and 257):
//!
//! ```text
//! Offset | Size | Field
//! -------|------|------------------------------
//! 0x000  |  4   | magic "MD20", stored as-is
//! 0x004  |  4   | version
//! 0x0B4  | 24   | bounding box
//! 0x0CC  |  4   | bounding sphere radius
//! 0x0D0  | 24   | collision box
//! 0x0E8  |  4   | collision sphere radius
//! 0x0EC  |  8   | collision triangles {count, offset}, u16 indices
//! 0x0F4  |  8   | collision vertices  {count, offset}, 3 x f32
//! 0x0FC  |  8   | collision normals   {count, offset}
//! ```
//!
//! ```
//! use wow_m2::{M2Builder, M2Model};
//! use glam::Vec3;
//!
//! let data = M2Builder::new()
//!     .vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y])
//!     .triangles(&[[0, 1, 2]])
//!     .build();
//! let model = M2Model::parse(&data).unwrap();
//! assert_eq!(model.triangle_count(), 1);
//! ```

pub mod builder;
pub mod error;

use glam::Vec3;
use log::trace;

use wow_data::{AaBox, ByteCursor, DataError};

pub use builder::M2Builder;
pub use error::{M2Error, Result};

pub const MAGIC: [u8; 4] = *b"MD20";

/// Vanilla model versions.
pub const SUPPORTED_VERSIONS: &[u32] = &[256, 257];

const BOUNDING_BOX: usize = 0xB4;
const COLLISION_BOX: usize = 0xD0;
const COLLISION_TRIANGLES: usize = 0xEC;
const COLLISION_VERTICES: usize = 0xF4;

/// `{count, offset}` reference to an array stored elsewhere in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct M2Array {
    pub count: u32,
    pub offset: u32,
}

impl M2Array {
    fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            count: cursor.read_u32()?,
            offset: cursor.read_u32()?,
        })
    }

    fn slice<'a>(&self, data: &'a [u8], name: &'static str, elem_size: usize) -> Result<&'a [u8]> {
        let start = self.offset as usize;
        (self.count as usize)
            .checked_mul(elem_size)
            .and_then(|len| start.checked_add(len))
            .and_then(|end| data.get(start..end))
            .ok_or(M2Error::ReferenceError {
                name,
                count: self.count,
                offset: self.offset,
                elem_size,
                len: data.len(),
            })
    }
}

/// Collision data of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct M2Model {
    pub version: u32,
    pub bounding_box: AaBox,
    pub bounding_radius: f32,
    pub collision_box: AaBox,
    pub collision_radius: f32,
    pub collision_vertices: Vec<Vec3>,
    /// Triangle list, three indices per triangle.
    pub collision_indices: Vec<u16>,
}

impl M2Model {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(data);
        let magic = cursor.read_array::<4>()?;
        if magic != MAGIC {
            return Err(M2Error::InvalidMagic(
                String::from_utf8_lossy(&magic).into_owned(),
            ));
        }
        let version = cursor.read_u32()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(DataError::UnsupportedVersion {
                format: "M2",
                version,
            }
            .into());
        }

        cursor.seek(BOUNDING_BOX)?;
        let bounding_box = cursor.read_aabox()?;
        let bounding_radius = cursor.read_f32()?;
        cursor.seek(COLLISION_BOX)?;
        let collision_box = cursor.read_aabox()?;
        let collision_radius = cursor.read_f32()?;

        cursor.seek(COLLISION_TRIANGLES)?;
        let triangles = M2Array::parse(&mut cursor)?;
        cursor.seek(COLLISION_VERTICES)?;
        let vertices = M2Array::parse(&mut cursor)?;

        if triangles.count % 3 != 0 {
            return Err(DataError::InvariantViolation(format!(
                "collision index count {} is not a multiple of 3",
                triangles.count
            ))
            .into());
        }

        let raw = vertices.slice(data, "collision vertices", 12)?;
        let collision_vertices = ByteCursor::with_base(raw, vertices.offset as usize)
            .read_vec3_vec(vertices.count as usize)?;
        let raw = triangles.slice(data, "collision triangles", 2)?;
        let collision_indices = ByteCursor::with_base(raw, triangles.offset as usize)
            .read_u16_vec(triangles.count as usize)?;

        if let Some(&index) = collision_indices
            .iter()
            .find(|&&i| usize::from(i) >= collision_vertices.len())
        {
            return Err(M2Error::IndexOutOfRange {
                index,
                vertices: collision_vertices.len(),
            });
        }

        trace!(
            "M2 v{version}: {} collision vertices, {} triangles",
            collision_vertices.len(),
            collision_indices.len() / 3
        );

        Ok(Self {
            version,
            bounding_box,
            bounding_radius,
            collision_box,
            collision_radius,
            collision_vertices,
            collision_indices,
        })
    }

    pub fn has_collision(&self) -> bool {
        !self.collision_indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.collision_indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u16; 3]> + '_ {
        self.collision_indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn reads_collision_arrays() {
        let verts = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 3.0),
        ];
        let data = M2Builder::new()
            .bounding_box(AaBox::new(Vec3::splat(-1.0), Vec3::splat(3.0)))
            .vertices(&verts)
            .triangles(&[[0, 1, 2], [0, 2, 3]])
            .build();
        let model = M2Model::parse(&data).unwrap();
        assert_eq!(model.version, 256);
        assert_eq!(model.collision_vertices, verts.to_vec());
        assert_eq!(model.triangles().collect::<Vec<_>>(), vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(model.bounding_box.high, Vec3::splat(3.0));
    }

    #[test]
    fn model_without_collision() {
        let model = M2Model::parse(&M2Builder::new().build()).unwrap();
        assert!(!model.has_collision());
        assert!(model.collision_vertices.is_empty());
    }

    #[test_case(255, false ; "too old")]
    #[test_case(256, true ; "vanilla")]
    #[test_case(257, true ; "late vanilla")]
    #[test_case(264, false ; "burning crusade")]
    fn version_whitelist(version: u32, ok: bool) {
        let data = M2Builder::new().version(version).build();
        assert_eq!(M2Model::parse(&data).is_ok(), ok);
    }

    #[test]
    fn magic_is_not_reversed() {
        let mut data = M2Builder::new().build();
        data[..4].copy_from_slice(b"02DM");
        assert!(matches!(M2Model::parse(&data), Err(M2Error::InvalidMagic(m)) if m == "02DM"));
    }

    #[test]
    fn dangling_array_is_rejected() {
        let mut data = M2Builder::new()
            .vertices(&[Vec3::ZERO; 3])
            .triangles(&[[0, 1, 2]])
            .build();
        data.truncate(data.len() - 4);
        assert!(matches!(
            M2Model::parse(&data),
            Err(M2Error::ReferenceError { .. })
        ));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let data = M2Builder::new()
            .vertices(&[Vec3::ZERO; 3])
            .triangles(&[[0, 1, 3]])
            .build();
        assert!(matches!(
            M2Model::parse(&data),
            Err(M2Error::IndexOutOfRange { index: 3, vertices: 3 })
        ));
    }
}
