//! Extractor configuration, read from YAML and overridden by the command
//! line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use wow_map::PackConfig;
use wow_vmap::VectorMode;

/// Map ids grouped by the `--skip-*` toggles.
pub const CONTINENTS: &[u32] = &[0, 1, 530, 571];
pub const BATTLEGROUNDS: &[u32] = &[30, 489, 529, 566, 607, 628];
pub const JUNK_MAPS: &[u32] = &[13, 25, 29, 35, 37, 42, 44, 169, 451];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub client_path: PathBuf,
    pub output_path: PathBuf,
    pub extract_dbc: bool,
    pub extract_maps: bool,
    pub generate_vmaps: bool,
    pub generate_mmaps: bool,
    pub skip: SkipConfig,
    pub map: PackConfig,
    pub vmap: VmapConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            client_path: PathBuf::from("."),
            output_path: PathBuf::from("."),
            extract_dbc: true,
            extract_maps: true,
            generate_vmaps: true,
            generate_mmaps: false,
            skip: SkipConfig::default(),
            map: PackConfig::default(),
            vmap: VmapConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    pub continents: bool,
    pub junk: bool,
    pub battlegrounds: bool,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            continents: false,
            junk: true,
            battlegrounds: false,
        }
    }
}

impl SkipConfig {
    pub fn skips(&self, map_id: u32) -> bool {
        (self.continents && CONTINENTS.contains(&map_id))
            || (self.junk && JUNK_MAPS.contains(&map_id))
            || (self.battlegrounds && BATTLEGROUNDS.contains(&map_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct VmapConfig {
    /// Keep render-only WMO triangles too.
    pub precise_vector_data: bool,
}

impl VmapConfig {
    pub fn vector_mode(&self) -> VectorMode {
        if self.precise_vector_data {
            VectorMode::Precise
        } else {
            VectorMode::CollisionOnly
        }
    }
}

impl ExtractorConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml_ng::from_str(text).context("Invalid extractor configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("In {}", path.display()))
    }

    pub fn dbc_dir(&self) -> PathBuf {
        self.output_path.join("dbc")
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.output_path.join("maps")
    }

    pub fn vmaps_dir(&self) -> PathBuf {
        self.output_path.join("vmaps")
    }
}
