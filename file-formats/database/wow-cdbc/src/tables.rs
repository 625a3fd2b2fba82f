//! The three tables the extractor reads: Map, AreaTable and LiquidType.

use std::collections::BTreeMap;

use log::debug;

use crate::{DbcFile, Key, Result};

pub const MAP_DBC: &str = "DBFilesClient\\Map.dbc";
pub const AREA_TABLE_DBC: &str = "DBFilesClient\\AreaTable.dbc";
pub const LIQUID_TYPE_DBC: &str = "DBFilesClient\\LiquidType.dbc";

/// One Map.dbc row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub id: Key,
    /// Directory under `World\Maps\`, also the WDT/ADT base name.
    pub directory: String,
}

impl MapEntry {
    const DIRECTORY_FIELD: usize = 1;
}

/// Every map, ordered by id.
pub fn read_maps(dbc: &DbcFile<'_>) -> Result<Vec<MapEntry>> {
    let mut maps = dbc
        .records()
        .map(|r| {
            Ok(MapEntry {
                id: r.get_u32(0)?,
                directory: r.get_string(MapEntry::DIRECTORY_FIELD)?.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    maps.sort_by_key(|m| m.id);
    for map in &maps {
        debug!("Map {}: {}", map.id, map.directory);
    }
    Ok(maps)
}

/// `id -> flags` read from one column of a table keyed by field 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable {
    entries: BTreeMap<Key, u32>,
}

impl FlagTable {
    /// AreaTable.dbc: the exploration flag is field 3.
    pub const AREA_FLAGS_FIELD: usize = 3;
    /// LiquidType.dbc: the liquid kind is field 2.
    pub const LIQUID_FLAGS_FIELD: usize = 2;

    pub fn from_dbc(dbc: &DbcFile<'_>, flags_field: usize) -> Result<Self> {
        let entries = dbc
            .records()
            .map(|r| Ok((r.get_u32(0)?, r.get_u32(flags_field)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { entries })
    }

    pub fn area_table(dbc: &DbcFile<'_>) -> Result<Self> {
        Self::from_dbc(dbc, Self::AREA_FLAGS_FIELD)
    }

    pub fn liquid_types(dbc: &DbcFile<'_>) -> Result<Self> {
        Self::from_dbc(dbc, Self::LIQUID_FLAGS_FIELD)
    }

    pub fn get(&self, id: Key) -> Option<u32> {
        self.entries.get(&id).copied()
    }

    pub fn contains(&self, id: Key) -> bool {
        self.entries.contains_key(&id)
    }

    /// Highest id, 0 for an empty table.
    pub fn max_id(&self) -> Key {
        self.entries.last_key_value().map_or(0, |(&id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Key, u32)> for FlagTable {
    fn from_iter<I: IntoIterator<Item = (Key, u32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
