//! Collision oriented reader for v17 WMO (world map object) files.
//!
//! A WMO is a root file plus one file per group. The root names the groups
//! and carries the WMO id and the liquid mode; each group carries its own
//! triangles, per-triangle collision flags and optionally a liquid surface.
//! Materials, portals, lights and doodads are validated for presence but
//! not decoded.
//!
//! ```
//! use wow_wmo::{GroupFlags, PolyFlags, WmoGroup, WmoGroupBuilder, WmoRoot, WmoRootBuilder};
//! use wow_data::{AaBox, Vec3};
//!
//! let root = WmoRootBuilder::new()
//!     .wmo_id(7)
//!     .group(GroupFlags::EXTERIOR, AaBox::new(Vec3::ZERO, Vec3::ONE))
//!     .build()
//!     .unwrap();
//! assert_eq!(WmoRoot::parse(&root).unwrap().group_count(), 1);
//!
//! let group = WmoGroupBuilder::new()
//!     .vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y])
//!     .triangle([0, 1, 2], PolyFlags::COLLISION)
//!     .build()
//!     .unwrap();
//! assert_eq!(WmoGroup::parse(&group).unwrap().triangle_count(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod group;
pub mod liquid;
pub mod root;

pub use builder::{WmoGroupBuilder, WmoRootBuilder};
pub use error::{Result, WmoError};
pub use group::{GroupFlags, MogpHeader, PolyFlags, PolyMaterial, WmoGroup};
pub use liquid::{MliqHeader, TileLiquid, WmoLiquid, flat_liquid};
pub use root::{GroupInfo, Mohd, RootFlags, WmoRoot, group_file_name};

/// Supported WMO versions, root and group alike.
pub const SUPPORTED_VERSIONS: &[u32] = &[17];
