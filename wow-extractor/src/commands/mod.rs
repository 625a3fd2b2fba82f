//! The extraction phases.

pub mod dbc;
pub mod maps;
pub mod vmaps;

use std::fmt;
use std::ops::AddAssign;

use anyhow::{Context, Result};
use log::{error, warn};
use wow_cdbc::{DbcFile, FlagTable, MAP_DBC, MapEntry, read_maps};
use wow_wdt::Wdt;

use crate::archive::{ArchiveError, ArchiveSource};

/// Units written out of units attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub done: usize,
    pub total: usize,
}

impl Summary {
    pub fn new(done: usize, total: usize) -> Self {
        Self { done, total }
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Self) {
        self.done += other.done;
        self.total += other.total;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.done, self.total)
    }
}

pub fn wdt_path(directory: &str) -> String {
    format!("World\\Maps\\{directory}\\{directory}.wdt")
}

/// ADT of WDT tile (x, y). The file name puts y first.
pub fn adt_path(directory: &str, x: usize, y: usize) -> String {
    format!("World\\Maps\\{directory}\\{directory}_{y}_{x}.adt")
}

pub(crate) fn load_maps(archive: &dyn ArchiveSource) -> Result<Vec<MapEntry>> {
    let data = archive.get(MAP_DBC).context("Cannot list the maps")?;
    let dbc = DbcFile::parse(&data).with_context(|| format!("Error while parsing {MAP_DBC}"))?;
    Ok(read_maps(&dbc)?)
}

pub(crate) fn load_flag_table(
    archive: &dyn ArchiveSource,
    name: &str,
    read: fn(&DbcFile<'_>) -> wow_cdbc::Result<FlagTable>,
) -> Result<FlagTable> {
    let data = archive.get(name)?;
    let dbc = DbcFile::parse(&data).with_context(|| format!("Error while parsing {name}"))?;
    read(&dbc).with_context(|| format!("Error while reading {name}"))
}

/// The WDT of `map`, `None` (logged) when missing or broken.
pub(crate) fn load_wdt(archive: &dyn ArchiveSource, map: &MapEntry) -> Option<Wdt> {
    let name = wdt_path(&map.directory);
    let data = match archive.get(&name) {
        Ok(data) => data,
        Err(e) if e.is_miss() => {
            warn!("WDT file {name} does not exist, no data is generated for map {}", map.id);
            return None;
        }
        Err(e) => {
            error!("Error while reading {name}: {e}");
            return None;
        }
    };
    Wdt::parse(&data)
        .inspect_err(|e| error!("Error while parsing {name}: {e}"))
        .ok()
}

/// Archive misses are expected for some tiles and only warned about.
pub(crate) fn log_unit_failure(unit: &str, err: &anyhow::Error) {
    match err.downcast_ref::<ArchiveError>() {
        Some(e) if e.is_miss() => warn!("Skipping {unit}: {err:#}"),
        _ => error!("Skipping {unit}: {err:#}"),
    }
}
