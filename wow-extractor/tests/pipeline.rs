//! End-to-end runs of the three phases over an in-memory client.

use std::fs;
use std::path::Path;

use glam::Vec3;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wow_adt::{AdtBuilder, DoodadPlacement, WmoPlacement};
use wow_cdbc::{AREA_TABLE_DBC, DbcWriter, MAP_DBC, Value};
use wow_data::AaBox;
use wow_extractor::archive::MemoryArchive;
use wow_extractor::{ArchiveSource, ClientCapabilities, ExtractorConfig, RunSummary, Summary, extract};
use wow_m2::M2Builder;
use wow_wdt::WdtBuilder;
use wow_wmo::{GroupFlags, PolyFlags, WmoGroupBuilder, WmoRootBuilder};

const TOWER: &str = "World\\wmo\\Tower.wmo";

fn dbc(field_count: usize, records: &[Vec<Value>]) -> Vec<u8> {
    let mut writer = DbcWriter::new(field_count);
    for record in records {
        writer.push_record(record).unwrap();
    }
    writer.to_bytes().unwrap()
}

/// Map 2 marks tiles (3, 5) and (3, 6) but only ships the second ADT.
/// Map 33 is a single world object, map 13 has no WDT at all.
fn client() -> MemoryArchive {
    let maps = dbc(
        2,
        &[
            vec![2u32.into(), "Testmap".into()],
            vec![13u32.into(), "Junk".into()],
            vec![33u32.into(), "Dungeon".into()],
        ],
    );
    let areas = dbc(4, &[vec![1u32.into(), 0u32.into(), 0u32.into(), 0x40u32.into()]]);

    let testmap = WdtBuilder::new().with_tile(3, 5).with_tile(3, 6).build().unwrap();
    let dungeon = WdtBuilder::new()
        .with_global_object(
            TOWER,
            WmoPlacement {
                unique_id: 900,
                ..Default::default()
            },
        )
        .build()
        .unwrap();

    let adt = AdtBuilder::new()
        .add_model("World\\Bush.mdx")
        .add_model("World\\Missing.m2")
        .add_wmo(TOWER)
        .add_doodad_placement(DoodadPlacement {
            name_id: 0,
            unique_id: 1,
            position: [100.0, 20.0, 300.0],
            scale: 1024,
            ..Default::default()
        })
        .add_doodad_placement(DoodadPlacement {
            name_id: 1,
            unique_id: 2,
            scale: 1024,
            ..Default::default()
        })
        .add_wmo_placement(WmoPlacement {
            name_id: 0,
            unique_id: 3,
            position: [10.0, 0.0, 10.0],
            extents_min: [0.0, 0.0, 0.0],
            extents_max: [20.0, 5.0, 20.0],
            ..Default::default()
        })
        .build()
        .unwrap();

    let bush = M2Builder::new()
        .vertices(&[Vec3::ZERO, Vec3::X, Vec3::Y])
        .triangles(&[[0, 1, 2]])
        .build();

    let bounds = AaBox::new(Vec3::ZERO, Vec3::splat(4.0));
    let root = WmoRootBuilder::new()
        .wmo_id(7)
        .group(GroupFlags::EXTERIOR, bounds)
        .build()
        .unwrap();
    let group = WmoGroupBuilder::new()
        .flags(GroupFlags::EXTERIOR)
        .bounds(bounds)
        .vertices(&[Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 4.0)])
        .triangle([0, 1, 2], PolyFlags::COLLISION)
        .build()
        .unwrap();

    MemoryArchive::new()
        .with_file(MAP_DBC, maps)
        .with_file(AREA_TABLE_DBC, areas)
        .with_file("World\\Maps\\Testmap\\Testmap.wdt", testmap)
        .with_file("World\\Maps\\Testmap\\Testmap_6_3.adt", adt)
        .with_file("World\\Maps\\Dungeon\\Dungeon.wdt", dungeon)
        .with_file("World\\Bush.m2", bush)
        .with_file(TOWER, root)
        .with_file("World\\wmo\\Tower_000.wmo", group)
}

fn config(out: &Path, dbc: bool, maps: bool, vmaps: bool) -> ExtractorConfig {
    ExtractorConfig {
        output_path: out.to_path_buf(),
        extract_dbc: dbc,
        extract_maps: maps,
        generate_vmaps: vmaps,
        ..Default::default()
    }
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn dbc_tables_are_flattened() {
    let out = TempDir::new().unwrap();
    let summary = extract(&client(), &config(out.path(), true, false, false), &ClientCapabilities::CLASSIC).unwrap();

    assert_eq!(summary.dbc, Some(Summary::new(2, 2)));
    assert_eq!(listing(&out.path().join("dbc")), vec!["AreaTable.dbc", "Map.dbc"]);
    assert_eq!(
        fs::read(out.path().join("dbc").join("Map.dbc")).unwrap(),
        client().get(MAP_DBC).unwrap()
    );
}

#[test]
fn missing_adt_is_skipped_and_siblings_are_written() {
    let out = TempDir::new().unwrap();
    let summary = extract(&client(), &config(out.path(), false, true, false), &ClientCapabilities::CLASSIC).unwrap();

    assert_eq!(
        summary,
        RunSummary {
            maps: Some(Summary::new(1, 2)),
            ..Default::default()
        }
    );
    assert_eq!(listing(&out.path().join("maps")), vec!["0020306.map"]);
}

#[test]
fn spawns_and_models_are_written() {
    let out = TempDir::new().unwrap();
    let summary = extract(&client(), &config(out.path(), false, false, true), &ClientCapabilities::CLASSIC).unwrap();

    // Bush and Tower are written, the missing model counts as a failure.
    assert_eq!(summary.models, Some(Summary::new(2, 3)));
    assert_eq!(
        listing(&out.path().join("vmaps")),
        vec![
            "002.vmtree",
            "002_06_03.vmtile",
            "033.vmtree",
            "Bush.m2.vmo",
            "Tower.wmo.vmo",
        ]
    );

    let tile = fs::read(out.path().join("vmaps").join("002_06_03.vmtile")).unwrap();
    assert_eq!(&tile[..8], b"VMAP_4.0");
    assert_eq!(u32::from_le_bytes(tile[8..12].try_into().unwrap()), 2);
}

#[test]
fn single_object_map_is_not_tiled() {
    let out = TempDir::new().unwrap();
    extract(&client(), &config(out.path(), false, false, true), &ClientCapabilities::CLASSIC).unwrap();

    let tree = fs::read(out.path().join("vmaps").join("033.vmtree")).unwrap();
    assert_eq!(&tree[..8], b"VMAP_4.0");
    assert_eq!(tree[8], 0);

    let tiled = fs::read(out.path().join("vmaps").join("002.vmtree")).unwrap();
    assert_eq!(tiled[8], 1);
}

#[test]
fn map_without_wdt_is_ignored() {
    let out = TempDir::new().unwrap();
    let mut config = config(out.path(), false, true, false);
    // Map 13 is on the junk list and has no WDT.
    config.skip.junk = false;
    let summary = extract(&client(), &config, &ClientCapabilities::CLASSIC).unwrap();
    assert_eq!(summary.maps, Some(Summary::new(1, 2)));
    assert_eq!(listing(&out.path().join("maps")), vec!["0020306.map"]);
}
