use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wow_adt::{Adt, AdtBuilder, CellBuilder, LiquidCategory, LiquidLayer};
use wow_cdbc::FlagTable;
use wow_data::Vec3;
use wow_map::{
    AreaFlags, HeightFlags, LiquidHeaderFlags, MapError, MapFile, NO_AREA_FLAG, PackConfig,
    TerrainPacker, TileId,
};

const HIDDEN: u8 = 0x0F;

fn areas() -> FlagTable {
    [(12, 0x40), (40, 0x07)].into_iter().collect()
}

/// Liquid over tiles `shown` only, every vertex at `height`.
fn layer(category: LiquidCategory, height: f32, shown: &[(usize, usize)]) -> LiquidLayer {
    let mut layer = LiquidLayer {
        category,
        min_height: height,
        max_height: height,
        ..Default::default()
    };
    for row in &mut layer.vertices {
        for v in row.iter_mut() {
            v.height = height;
        }
    }
    for row in &mut layer.tiles {
        row.fill(HIDDEN);
    }
    for &(x, y) in shown {
        layer.tiles[y][x] = 0;
    }
    layer
}

fn pack(builder: AdtBuilder, config: PackConfig) -> MapFile {
    let data = builder.build().unwrap();
    let adt = Adt::parse(&data).unwrap();
    TerrainPacker::new(config, areas())
        .pack(&adt, TileId::new(1, 30, 20))
        .unwrap()
}

#[test]
fn mixed_tile_round_trips_through_disk() {
    let builder = AdtBuilder::new()
        .with_all_cells(|i, j, cell| {
            cell.area(if i < 8 { 12 } else { 40 })
                .position(Vec3::new(0.0, 0.0, (i * 16 + j) as f32))
        })
        .with_cell(
            2,
            3,
            CellBuilder::new()
                .area(999)
                .position(Vec3::new(0.0, 0.0, 35.0))
                .holes(0x0F0F)
                .liquid(layer(LiquidCategory::Ocean, 20.0, &[(0, 0), (7, 7)]))
                .liquid(layer(LiquidCategory::River, 21.0, &[(4, 4)])),
        );
    let map = pack(builder, PackConfig::default());

    assert_eq!(map.area.header.flags, AreaFlags::empty());
    assert_eq!(map.area.area(0, 0), 0x40);
    assert_eq!(map.area.area(15, 15), 0x07);
    assert_eq!(map.area.area(2, 3), NO_AREA_FLAG);

    assert_eq!(map.height.header.flags, HeightFlags::AS_INT16);
    assert_eq!(map.height.header.grid_height, 0.0);
    assert_eq!(map.height.header.grid_max_height, 255.0);

    let liquid = map.liquid.as_ref().unwrap();
    assert_eq!(liquid.header.flags, LiquidHeaderFlags::empty());
    assert_eq!((liquid.header.offset_x, liquid.header.offset_y), (24, 16));
    assert_eq!((liquid.header.width, liquid.header.height), (9, 9));
    assert_eq!(liquid.header.level, 20.0);
    let (entries, flags) = liquid.types.unwrap();
    assert_eq!(entries[2][3], 2);
    assert_eq!(flags[2][3], 0x0A);
    assert_eq!(liquid.height(16, 24), Some(20.0));
    assert_eq!(liquid.height(20, 28), Some(21.0));
    assert_eq!(map.holes[2][3], 0x0F0F);

    let dir = TempDir::new().unwrap();
    let path = map.save(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "0013020.map");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len() as u32, map.header.holes_offset + 512);
    assert_eq!(&bytes[..8], b"MAPSz1.5");
    assert_eq!(MapFile::from_bytes(map.tile, &bytes).unwrap(), map);
}

#[test]
fn flat_dry_tile_is_minimal() {
    let map = pack(
        AdtBuilder::new().with_all_cells(|_, _, cell| cell.area(12).flat(3.0)),
        PackConfig::default(),
    );
    assert_eq!(map.header.area_size, 8);
    assert_eq!(map.header.height_size, 16);
    assert_eq!((map.header.liquid_offset, map.header.liquid_size), (0, 0));
    assert_eq!(map.header.holes_offset, 44 + 8 + 16);
    assert_eq!(map.area.header.grid_area, 0x40);
    assert_eq!(map.height.v9(64, 64), 3.0);
    assert_eq!(map.to_bytes().unwrap().len(), 44 + 8 + 16 + 512);
}

#[test]
fn heights_below_the_floor_are_clamped() {
    let map = pack(
        AdtBuilder::new().with_cell(0, 0, CellBuilder::new().flat(-900.0)),
        PackConfig::default(),
    );
    assert_eq!(map.height.header.grid_height, -500.0);
    assert_eq!(map.height.header.grid_max_height, 0.0);

    let unclamped = pack(
        AdtBuilder::new().with_cell(0, 0, CellBuilder::new().flat(-900.0)),
        PackConfig {
            allow_height_limit: false,
            ..Default::default()
        },
    );
    assert_eq!(unclamped.height.header.grid_height, -900.0);
}

#[test]
fn liquid_flags_without_shown_tiles_write_no_liquid() {
    let map = pack(
        AdtBuilder::new().with_cell(0, 0, CellBuilder::new().liquid(layer(LiquidCategory::Magma, 5.0, &[]))),
        PackConfig::default(),
    );
    assert!(map.liquid.is_none());
}

#[test]
fn corrupt_sizes_are_rejected() {
    let map = pack(AdtBuilder::new(), PackConfig::default());
    let mut bytes = map.to_bytes().unwrap();
    // area_size
    bytes[16..20].copy_from_slice(&520u32.to_le_bytes());
    assert!(matches!(
        MapFile::from_bytes(map.tile, &bytes),
        Err(MapError::InvalidSection { section: "area", .. })
    ));
}

#[test]
fn truncated_file_is_an_error() {
    let map = pack(AdtBuilder::new(), PackConfig::default());
    let bytes = map.to_bytes().unwrap();
    assert!(MapFile::from_bytes(map.tile, &bytes[..bytes.len() - 10]).is_err());
}
