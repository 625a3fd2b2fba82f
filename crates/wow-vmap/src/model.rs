//! Collision models built from M2 and WMO geometry.

use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use log::{debug, warn};

use wow_data::AaBox;
use wow_m2::M2Model;
use wow_wmo::{TileLiquid, WmoGroup, WmoLiquid, WmoRoot};

use crate::bih::Bih;
use crate::error::{Result, VmapError};

/// Leaf size of the per-group triangle tree.
pub const GROUP_LEAF_SIZE: usize = 3;
/// Leaf size of the tree over a model's groups.
pub const MODEL_LEAF_SIZE: usize = 1;

/// WMO whose slime is written with a dedicated liquid type.
const NAXXRAMAS_WMO_ID: u32 = 4489;
const NAXXRAMAS_SLIME: u32 = 21;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct ModelFlags: u32 {
        const M2 = 0x1;
        /// The single WMO of a WDT-only map.
        const WORLDSPAWN = 0x2;
        /// Instances carry their own bounding box.
        const HAS_BOUND = 0x4;
    }
}

pub type MeshTriangle = [u32; 3];

/// Liquid surface of one WMO group.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelLiquid {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub base: Vec3,
    pub liquid_type: u32,
    /// `(tiles_x + 1) * (tiles_y + 1)` heights.
    pub heights: Vec<f32>,
    /// `tiles_x * tiles_y` tile flags.
    pub flags: Vec<u8>,
}

impl ModelLiquid {
    fn from_wmo(liquid: &WmoLiquid, liquid_type: u32) -> Self {
        let header = &liquid.header;
        let verts = ((header.tiles_x + 1) * (header.tiles_y + 1)) as usize;
        let tiles = (header.tiles_x * header.tiles_y) as usize;
        if header.verts_x != header.tiles_x + 1 || header.verts_y != header.tiles_y + 1 {
            warn!(
                "Liquid has {}x{} vertices for {}x{} tiles",
                header.verts_x, header.verts_y, header.tiles_x, header.tiles_y
            );
        }
        let mut heights = liquid.heights.clone();
        heights.resize(verts, liquid.base().z);
        let mut flags = liquid.flags.clone();
        flags.resize(tiles, 0x0F);

        Self {
            tiles_x: header.tiles_x,
            tiles_y: header.tiles_y,
            base: liquid.base(),
            liquid_type,
            heights,
            flags,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    pub bounds: AaBox,
    pub flags: u32,
    /// WMOAreaTable id of the group.
    pub wmo_id: u32,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<MeshTriangle>,
    pub liquid: Option<ModelLiquid>,
    pub tree: Bih,
}

impl ModelGroup {
    pub fn new(
        bounds: AaBox,
        flags: u32,
        wmo_id: u32,
        vertices: Vec<Vec3>,
        triangles: Vec<MeshTriangle>,
        liquid: Option<ModelLiquid>,
    ) -> Self {
        let tree = Bih::build(&triangles, |t| triangle_bounds(&vertices, t), GROUP_LEAF_SIZE);
        Self {
            bounds,
            flags,
            wmo_id,
            vertices,
            triangles,
            liquid,
            tree,
        }
    }

    pub fn index_count(&self) -> usize {
        self.triangles.len() * 3
    }
}

fn triangle_bounds(vertices: &[Vec3], triangle: &MeshTriangle) -> AaBox {
    let at = |i: u32| vertices.get(i as usize).copied().unwrap_or(Vec3::ZERO);
    AaBox::from_points(triangle.iter().map(|&i| at(i))).unwrap_or_default()
}

/// A collision model shared by every instance of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub root_wmo_id: u32,
    pub flags: ModelFlags,
    pub groups: Vec<ModelGroup>,
    pub group_tree: Bih,
}

impl Model {
    pub fn new(name: impl Into<String>, root_wmo_id: u32, flags: ModelFlags, groups: Vec<ModelGroup>) -> Self {
        let group_tree = Bih::build(&groups, |g| g.bounds, MODEL_LEAF_SIZE);
        Self {
            name: name.into(),
            root_wmo_id,
            flags,
            groups,
            group_tree,
        }
    }

    pub fn is_m2(&self) -> bool {
        self.flags.contains(ModelFlags::M2)
    }

    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(|g| g.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(|g| g.triangles.len()).sum()
    }
}

/// Picks the liquid type written for a WMO group whose root does not take
/// it from LiquidType.dbc.
pub trait LiquidTypeResolver: Send + Sync {
    fn resolve(&self, root: &WmoRoot, liquid: &WmoLiquid) -> u32;
}

/// The kind of the first tile that has liquid decides, offset by one so
/// that 0 stays "no liquid".
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstTileLiquid;

impl LiquidTypeResolver for FirstTileLiquid {
    fn resolve(&self, root: &WmoRoot, liquid: &WmoLiquid) -> u32 {
        match liquid.first_tile_liquid() {
            Some(TileLiquid::Water) => 1,
            Some(TileLiquid::Ocean) => 2,
            Some(TileLiquid::Magma) => 3,
            Some(TileLiquid::Slime) if root.wmo_id() == NAXXRAMAS_WMO_ID => NAXXRAMAS_SLIME,
            Some(TileLiquid::Slime) => 4,
            None => 0,
        }
    }
}

/// Which WMO triangles end up in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorMode {
    /// Every triangle and vertex.
    Precise,
    /// Collidable triangles only, vertices renumbered densely.
    #[default]
    CollisionOnly,
}

/// Turns parsed M2 and WMO files into [`Model`]s.
pub struct ModelBuilder {
    mode: VectorMode,
    resolver: Box<dyn LiquidTypeResolver>,
}

impl fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBuilder").field("mode", &self.mode).finish_non_exhaustive()
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            mode: VectorMode::default(),
            resolver: Box::new(FirstTileLiquid),
        }
    }
}

impl ModelBuilder {
    pub fn new(mode: VectorMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl LiquidTypeResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn mode(&self) -> VectorMode {
        self.mode
    }

    /// One group with the raw collision mesh and a zero bound.
    pub fn build_m2(&self, name: impl Into<String>, m2: &M2Model) -> Model {
        let triangles = m2
            .triangles()
            .map(|t| t.map(u32::from))
            .collect::<Vec<_>>();
        let group = ModelGroup::new(
            AaBox::zero(),
            0,
            0,
            m2.collision_vertices.clone(),
            triangles,
            None,
        );
        Model::new(name, 0, ModelFlags::M2, vec![group])
    }

    /// One model group per WMO group, in root order.
    pub fn build_wmo(&self, name: impl Into<String>, root: &WmoRoot, groups: &[WmoGroup]) -> Result<Model> {
        let name = name.into();
        if groups.len() != root.group_count() as usize {
            return Err(VmapError::GroupCountMismatch {
                name,
                expected: root.group_count(),
                found: groups.len(),
            });
        }

        let groups = groups
            .iter()
            .map(|group| self.convert_group(root, group))
            .collect::<Vec<_>>();
        debug!(
            "WMO {name}: {} groups, {} triangles",
            groups.len(),
            groups.iter().map(|g| g.triangles.len()).sum::<usize>()
        );
        Ok(Model::new(name, root.wmo_id(), ModelFlags::HAS_BOUND, groups))
    }

    fn convert_group(&self, root: &WmoRoot, group: &WmoGroup) -> ModelGroup {
        let (vertices, triangles) = match self.mode {
            VectorMode::Precise => (
                group.vertices.clone(),
                group.triangles().map(|(t, _)| t.map(u32::from)).collect(),
            ),
            VectorMode::CollisionOnly => collision_mesh(group),
        };

        let liquid = group.liquid.as_ref().map(|liquid| {
            let liquid_type = if root.uses_liquid_from_dbc() {
                group.info.group_liquid
            } else {
                self.resolver.resolve(root, liquid)
            };
            ModelLiquid::from_wmo(liquid, liquid_type)
        });

        ModelGroup::new(
            group.info.bounds(),
            group.info.flags.bits(),
            group.info.wmo_area_table_id,
            vertices,
            triangles,
            liquid,
        )
    }
}

/// Collidable triangles with their vertices renumbered in original order.
fn collision_mesh(group: &WmoGroup) -> (Vec<Vec3>, Vec<MeshTriangle>) {
    const UNUSED: u32 = u32::MAX;

    let kept: Vec<[u16; 3]> = group
        .triangles()
        .filter(|(_, flags)| flags.is_collidable())
        .map(|(t, _)| t)
        .collect();

    let mut remap = vec![UNUSED; group.vertices.len()];
    for &i in kept.iter().flatten() {
        if let Some(slot) = remap.get_mut(usize::from(i)) {
            *slot = 0;
        }
    }
    let mut vertices = Vec::new();
    for (slot, v) in remap.iter_mut().zip(&group.vertices) {
        if *slot != UNUSED {
            *slot = vertices.len() as u32;
            vertices.push(*v);
        }
    }

    let triangles = kept
        .iter()
        .map(|t| t.map(|i| remap.get(usize::from(i)).copied().unwrap_or(0)))
        .collect();
    (vertices, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use wow_wmo::{GroupFlags, PolyFlags, RootFlags, WmoGroupBuilder, WmoRootBuilder, flat_liquid};

    fn root(wmo_id: u32, flags: RootFlags, groups: usize) -> WmoRoot {
        let mut builder = WmoRootBuilder::new().wmo_id(wmo_id).flags(flags);
        for _ in 0..groups {
            builder = builder.group(GroupFlags::EXTERIOR, AaBox::zero());
        }
        WmoRoot::parse(&builder.build().unwrap()).unwrap()
    }

    fn liquid_group(flag: u8) -> WmoGroup {
        let data = WmoGroupBuilder::new()
            .group_liquid(17)
            .liquid(flat_liquid(2, 2, Vec3::ZERO, flag))
            .build()
            .unwrap();
        WmoGroup::parse(&data).unwrap()
    }

    #[test_case(0x00, 1 ; "water")]
    #[test_case(0x01, 2 ; "ocean")]
    #[test_case(0x02, 3 ; "magma")]
    #[test_case(0x03, 4 ; "slime")]
    #[test_case(0x0F, 0 ; "dry")]
    fn first_tile_decides(flag: u8, expected: u32) {
        let model = ModelBuilder::default()
            .build_wmo("x.wmo", &root(100, RootFlags::empty(), 1), &[liquid_group(flag)])
            .unwrap();
        assert_eq!(model.groups[0].liquid.as_ref().unwrap().liquid_type, expected);
    }

    #[test]
    fn naxxramas_slime() {
        let model = ModelBuilder::default()
            .build_wmo("naxx.wmo", &root(NAXXRAMAS_WMO_ID, RootFlags::empty(), 1), &[liquid_group(0x03)])
            .unwrap();
        assert_eq!(model.groups[0].liquid.as_ref().unwrap().liquid_type, 21);
    }

    #[test]
    fn dbc_liquid_overrides_tiles() {
        let model = ModelBuilder::default()
            .build_wmo("x.wmo", &root(100, RootFlags::USE_LIQUID_FROM_DBC, 1), &[liquid_group(0x00)])
            .unwrap();
        let liquid = model.groups[0].liquid.as_ref().unwrap();
        assert_eq!(liquid.liquid_type, 17);
        assert_eq!(liquid.heights.len(), 9);
        assert_eq!(liquid.flags.len(), 4);
    }

    struct Fixed(u32);

    impl LiquidTypeResolver for Fixed {
        fn resolve(&self, _: &WmoRoot, _: &WmoLiquid) -> u32 {
            self.0
        }
    }

    #[test]
    fn custom_resolver() {
        let model = ModelBuilder::default()
            .with_resolver(Fixed(99))
            .build_wmo("x.wmo", &root(1, RootFlags::empty(), 1), &[liquid_group(0x00)])
            .unwrap();
        assert_eq!(model.groups[0].liquid.as_ref().unwrap().liquid_type, 99);
    }

    #[test]
    fn missing_groups_are_an_error() {
        let result = ModelBuilder::default().build_wmo("x.wmo", &root(1, RootFlags::empty(), 2), &[liquid_group(0)]);
        assert!(matches!(
            result,
            Err(VmapError::GroupCountMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn collision_only_drops_detail_triangles() {
        let data = WmoGroupBuilder::new()
            .vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z])
            .triangle([0, 1, 2], PolyFlags::COLLISION)
            .triangle([1, 2, 3], PolyFlags::COLLISION | PolyFlags::DETAIL)
            .build()
            .unwrap();
        let group = WmoGroup::parse(&data).unwrap();
        let (vertices, triangles) = collision_mesh(&group);
        assert_eq!(vertices, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(triangles, vec![[0, 1, 2]]);
    }
}
