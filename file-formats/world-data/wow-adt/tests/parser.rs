use pretty_assertions::assert_eq;
use wow_adt::{
    Adt, AdtBuilder, AdtError, CellBuilder, DoodadPlacement, LiquidCategory, LiquidLayer, McnkFlags,
    WmoPlacement,
};
use wow_data::{DataError, Vec3};

fn river_layer(height: f32) -> LiquidLayer {
    let mut layer = LiquidLayer {
        category: LiquidCategory::River,
        min_height: height,
        max_height: height,
        ..Default::default()
    };
    for row in &mut layer.vertices {
        for v in row.iter_mut() {
            v.height = height;
        }
    }
    layer
}

#[test]
fn cells_decode_lazily_from_mcin() {
    let mut heights = vec![0.0; 145];
    heights[0] = 1.0;
    heights[9] = 2.0;
    heights[17] = 3.0;
    let data = AdtBuilder::new()
        .with_cell(
            4,
            7,
            CellBuilder::new()
                .area(331)
                .position(Vec3::new(100.0, 200.0, 50.0))
                .heights(&heights)
                .holes(0x8001),
        )
        .build()
        .unwrap();

    let adt = Adt::parse(&data).unwrap();
    let cell = adt.cell(4, 7).unwrap();
    assert_eq!(cell.area_id(), 331);
    assert_eq!(cell.holes(), 0x8001);
    assert_eq!(cell.position(), Vec3::new(100.0, 200.0, 50.0));
    assert_eq!(cell.outer_height(0, 0), 1.0);
    assert_eq!(cell.inner_height(0, 0), 2.0);
    assert_eq!(cell.outer_height(0, 1), 3.0);
    assert_eq!(cell.header.index_y, 4);
    assert_eq!(cell.header.index_x, 7);
    assert!(cell.liquids.is_empty());

    assert!(matches!(
        adt.cell(16, 0),
        Err(AdtError::CellOutOfRange { x: 16, y: 0 })
    ));
}

#[test]
fn liquid_layers_follow_flag_order() {
    let mut magma = river_layer(-3.0);
    magma.category = LiquidCategory::Magma;
    magma.tiles[0][0] = 0x0F;
    let data = AdtBuilder::new()
        .with_cell(
            0,
            0,
            CellBuilder::new().liquid(magma).liquid(river_layer(12.5)),
        )
        .build()
        .unwrap();

    let cell = Adt::parse(&data).unwrap().cell(0, 0).unwrap();
    assert!(cell.header.flags.contains(McnkFlags::RIVER | McnkFlags::MAGMA));
    assert_eq!(cell.liquids.len(), 2);
    assert_eq!(cell.liquids[0].category, LiquidCategory::River);
    assert_eq!(cell.liquids[0].height(3, 3), 12.5);
    assert_eq!(cell.liquids[1].category, LiquidCategory::Magma);
    assert!(!cell.liquids[1].is_shown(0, 0));
    assert!(cell.liquids[1].is_shown(1, 0));
}

#[test]
fn placements_resolve_names() {
    let data = AdtBuilder::new()
        .add_model("World\\Azeroth\\Elwynn\\Tree.m2")
        .add_model("World\\Generic\\Rock.m2")
        .add_wmo("World\\wmo\\Azeroth\\Buildings\\Inn.wmo")
        .add_doodad_placement(DoodadPlacement {
            name_id: 1,
            unique_id: 77,
            position: [1.0, 2.0, 3.0],
            scale: 1024,
            ..Default::default()
        })
        .add_wmo_placement(WmoPlacement {
            name_id: 0,
            unique_id: 9001,
            extents_min: [-1.0; 3],
            extents_max: [1.0; 3],
            ..Default::default()
        })
        .build()
        .unwrap();

    let placements = Adt::parse(&data).unwrap().placements().unwrap();
    assert_eq!(placements.models.len(), 2);
    assert_eq!(placements.doodads.len(), 1);
    assert_eq!(
        placements.model_name(&placements.doodads[0]),
        Some("World\\Generic\\Rock.m2")
    );
    assert_eq!(
        placements.wmo_name(&placements.wmo_placements[0]),
        Some("World\\wmo\\Azeroth\\Buildings\\Inn.wmo")
    );
    assert_eq!(placements.wmo_placements[0].unique_id, 9001);
}

#[test]
fn dangling_name_id_is_rejected() {
    let data = AdtBuilder::new()
        .add_doodad_placement(DoodadPlacement {
            name_id: 3,
            ..Default::default()
        })
        .build()
        .unwrap();
    let err = Adt::parse(&data).unwrap().placements().unwrap_err();
    assert!(matches!(
        err,
        AdtError::InvalidNameReference {
            table: "MDDF",
            index: 3,
            len: 0
        }
    ));
}

#[test]
fn wrong_version_is_unsupported() {
    let mut data = AdtBuilder::new().build().unwrap();
    data[8..12].copy_from_slice(&20u32.to_le_bytes());
    let err = Adt::parse(&data).unwrap_err();
    assert!(matches!(
        err,
        AdtError::Data(DataError::UnsupportedVersion { version: 20, .. })
    ));
}

#[test]
fn truncated_tile_is_a_format_error() {
    let data = AdtBuilder::new().build().unwrap();
    let adt_bytes = &data[..data.len() - 10];
    let adt = Adt::parse(adt_bytes).unwrap();
    let err = adt.cell(15, 15).unwrap_err();
    assert!(err.is_format_error());
}
