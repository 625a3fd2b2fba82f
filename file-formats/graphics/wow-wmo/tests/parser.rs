use pretty_assertions::assert_eq;
use wow_data::{AaBox, DataError, Vec3};
use wow_wmo::{
    GroupFlags, PolyFlags, RootFlags, TileLiquid, WmoError, WmoGroup, WmoGroupBuilder, WmoRoot,
    WmoRootBuilder, flat_liquid,
};

fn quad() -> WmoGroupBuilder {
    WmoGroupBuilder::new()
        .vertices(&[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(4.0, 4.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
        ])
        .triangle([0, 1, 2], PolyFlags::COLLISION | PolyFlags::RENDER)
        .triangle([0, 2, 3], PolyFlags::RENDER)
}

#[test]
fn root_reads_groups_and_liquid_mode() {
    let data = WmoRootBuilder::new()
        .wmo_id(4489)
        .flags(RootFlags::USE_LIQUID_FROM_DBC)
        .group(
            GroupFlags::INTERIOR,
            AaBox::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
        )
        .group(GroupFlags::EXTERIOR, AaBox::new(Vec3::ZERO, Vec3::splat(8.0)))
        .convex_volumes()
        .build()
        .unwrap();

    let root = WmoRoot::parse(&data).unwrap();
    assert_eq!(root.version, 17);
    assert_eq!(root.wmo_id(), 4489);
    assert_eq!(root.group_count(), 2);
    assert!(root.uses_liquid_from_dbc());
    assert!(root.has_convex_volumes);
    assert_eq!(root.groups[1].bounds().high, Vec3::splat(8.0));
    assert_eq!(root.groups[0].flags, GroupFlags::INTERIOR);
}

#[test]
fn root_without_optional_chunk() {
    let root = WmoRoot::parse(&WmoRootBuilder::new().build().unwrap()).unwrap();
    assert!(!root.has_convex_volumes);
    assert!(!root.uses_liquid_from_dbc());
    assert_eq!(root.group_count(), 0);
}

#[test]
fn root_with_missing_mandatory_chunk_fails() {
    let mut data = WmoRootBuilder::new().build().unwrap();
    // MOHD payload ends at 12 + 8 + 64; the next tag is MOTX.
    data[84..88].copy_from_slice(b"XXXX");
    assert!(matches!(
        WmoRoot::parse(&data),
        Err(WmoError::Data(DataError::InvalidMagic { offset: 84, .. }))
    ));
}

#[test]
fn group_reads_geometry_through_every_gate() {
    let liquid = flat_liquid(2, 2, Vec3::new(0.0, 0.0, 3.0), 0x00);
    let data = quad()
        .flags(
            GroupFlags::HAS_LIGHTS
                | GroupFlags::HAS_DOODADS
                | GroupFlags::HAS_BSP_TREE
                | GroupFlags::HAS_VERTEX_COLORS
                | GroupFlags::HAS_TRIANGLE_STRIPS,
        )
        .area_id(1234)
        .group_liquid(5)
        .liquid(liquid.clone())
        .build()
        .unwrap();

    let group = WmoGroup::parse(&data).unwrap();
    assert_eq!(group.vertices.len(), 4);
    assert_eq!(group.triangle_count(), 2);
    assert_eq!(group.triangle(1), [0, 2, 3]);
    assert_eq!(group.info.wmo_area_table_id, 1234);
    assert_eq!(group.info.group_liquid, 5);
    assert!(group.info.flags.contains(GroupFlags::HAS_WATER));
    assert_eq!(group.liquid, Some(liquid));

    let collidable: Vec<_> = group
        .triangles()
        .filter(|(_, flags)| flags.is_collidable())
        .map(|(t, _)| t)
        .collect();
    assert_eq!(collidable, vec![[0, 1, 2]]);
}

#[test]
fn liquid_kind_comes_from_first_wet_tile() {
    let mut liquid = flat_liquid(3, 1, Vec3::ZERO, 0x0F);
    liquid.flags[2] = 0x03;
    let data = quad().liquid(liquid).build().unwrap();
    let group = WmoGroup::parse(&data).unwrap();
    assert_eq!(
        group.liquid.unwrap().first_tile_liquid(),
        Some(TileLiquid::Slime)
    );
}

#[test]
fn gated_chunk_missing_is_an_error() {
    let data = quad().flags(GroupFlags::HAS_WATER).build().unwrap();
    assert!(matches!(WmoGroup::parse(&data), Err(WmoError::Data(_))));
}

#[test]
fn out_of_range_index_is_rejected() {
    let data = quad()
        .triangle([0, 1, 9], PolyFlags::COLLISION)
        .build()
        .unwrap();
    assert!(matches!(
        WmoGroup::parse(&data),
        Err(WmoError::IndexOutOfRange {
            index: 9,
            vertices: 4
        })
    ));
}

#[test]
fn wrong_version_is_rejected() {
    let mut data = quad().build().unwrap();
    data[8..12].copy_from_slice(&16u32.to_le_bytes());
    assert!(matches!(
        WmoGroup::parse(&data),
        Err(WmoError::Data(DataError::UnsupportedVersion { version: 16, .. }))
    ));
}
