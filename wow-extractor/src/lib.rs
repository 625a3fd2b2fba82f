//! Extracts server data from a World of Warcraft client.
//!
//! Three phases run in order, each one optional:
//!
//! 1. DBC tables are copied to `<out>/dbc/`.
//! 2. Terrain tiles are packed into `<out>/maps/*.map`.
//! 3. Collision models and spawn trees are written to `<out>/vmaps/`.
//!
//! The phases only see the client through [`ArchiveSource`], so they run
//! just as well against an in-memory [`archive::MemoryArchive`].

pub mod archive;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod utils;

use std::fs;

use anyhow::{Context, Result, bail};
use log::{info, warn};

pub use archive::{ArchiveError, ArchiveSource, MpqIndex};
pub use client::{ClientCapabilities, ClientVersion};
pub use commands::Summary;
pub use config::ExtractorConfig;

/// What each phase produced, `None` for phases that did not run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dbc: Option<Summary>,
    pub maps: Option<Summary>,
    pub models: Option<Summary>,
}

/// Detect the client under `config.client_path`, open its archives and run
/// the enabled phases.
pub fn run(config: &ExtractorConfig) -> Result<RunSummary> {
    let version = client::detect(&config.client_path);
    info!("Detected client version: {version}");
    let Some(caps) = version.capabilities() else {
        bail!(
            "Client {version} is not supported (looked in {})",
            config.client_path.display()
        );
    };

    let paths = caps.archive_paths(&config.client_path);
    let archive = MpqIndex::load(&paths).context("Failed to open the client archives")?;
    extract(&archive, config, &caps)
}

/// Run the enabled phases against an already opened archive set.
pub fn extract(archive: &dyn ArchiveSource, config: &ExtractorConfig, caps: &ClientCapabilities) -> Result<RunSummary> {
    log_settings(config, caps);
    fs::create_dir_all(&config.output_path)
        .with_context(|| format!("Failed to create {}", config.output_path.display()))?;

    let mut summary = RunSummary::default();
    if config.extract_dbc {
        summary.dbc = Some(commands::dbc::export_dbc(archive, &config.dbc_dir())?);
    }
    if config.extract_maps {
        summary.maps = Some(commands::maps::export_maps(archive, config, caps.map_version)?);
    }
    if config.generate_vmaps {
        summary.models = Some(commands::vmaps::generate_vmaps(archive, config)?);
    }
    if config.generate_mmaps {
        warn!("Movement map generation is not available in this build");
    }
    Ok(summary)
}

fn log_settings(config: &ExtractorConfig, caps: &ClientCapabilities) {
    info!("Client: {} ({})", caps.version, config.client_path.display());
    info!("Output: {}", config.output_path.display());
    info!(
        "Phases: dbc={} maps={} vmaps={} mmaps={}",
        config.extract_dbc, config.extract_maps, config.generate_vmaps, config.generate_mmaps
    );
    info!(
        "Skip: continents={} junk={} battlegrounds={}",
        config.skip.continents, config.skip.junk, config.skip.battlegrounds
    );
    info!(
        "Float to int: {}, precise vectors: {}",
        config.map.allow_float_to_int, config.vmap.precise_vector_data
    );
}
