//! Collision data for the server's line-of-sight and height queries.
//!
//! M2 and WMO files are reduced to [`Model`]s: per group, a vertex list, a
//! triangle list and a bounding interval hierarchy ([`Bih`]) over the
//! triangles. Placements from ADT and WDT files become [`ModelInstance`]s,
//! collected per map in [`MapInstances`] and finally indexed by a
//! [`MapTree`]. Three file kinds come out of it:
//!
//! - `<model>.vmo`, one per model;
//! - `MMM.vmtree`, the spawn tree of a map;
//! - `MMM_YY_XX.vmtile`, the spawns referenced by one tile.
//!
//! ```
//! use std::sync::Arc;
//!
//! use glam::Vec3;
//! use wow_adt::DoodadPlacement;
//! use wow_m2::{M2Builder, M2Model};
//! use wow_vmap::{MapInstances, ModelBuilder, ModelInstance};
//!
//! let data = M2Builder::new()
//!     .vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y])
//!     .triangles(&[[0, 1, 2]])
//!     .build();
//! let m2 = M2Model::parse(&data).unwrap();
//! let model = Arc::new(ModelBuilder::default().build_m2("Bush.m2", &m2));
//!
//! let placement = DoodadPlacement { unique_id: 1, scale: 1024, ..Default::default() };
//! let spawns = MapInstances::new(0);
//! spawns.insert(ModelInstance::from_doodad(model, &placement, 32, 48));
//!
//! let tree = spawns.into_tree(None);
//! assert!(tree.is_tiled());
//! assert_eq!(tree.tiles().next().unwrap().file_name(), "000_48_32.vmtile");
//! ```

pub mod bih;
pub mod error;
pub mod instance;
pub mod model;
pub mod registry;
pub mod tree;
pub mod vmo;

pub use bih::{Bih, Ray};
pub use error::{Result, VmapError};
pub use instance::{ModelInstance, TILE_SIZE, WORLDSPAWN_OFFSET};
pub use model::{
    FirstTileLiquid, LiquidTypeResolver, MeshTriangle, Model, ModelBuilder, ModelFlags, ModelGroup,
    ModelLiquid, VectorMode,
};
pub use registry::{MapInstances, ModelCache};
pub use tree::{MapTree, VmTile};

/// Leading tag of every vmap file.
pub const VMAP_MAGIC: &[u8; 8] = b"VMAP_4.0";
