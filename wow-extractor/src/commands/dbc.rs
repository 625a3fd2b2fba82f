//! Copies the client tables out of the archives.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};

use super::Summary;
use crate::archive::ArchiveSource;
use crate::utils::create_progress_bar;

/// Extract every `DBFilesClient\*.dbc` into `out_dir`, flattened.
pub fn export_dbc(archive: &dyn ArchiveSource, out_dir: &Path) -> Result<Summary> {
    info!("Extracting DBCs..");
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let names = archive.dbc_names();
    let pb = create_progress_bar(names.len() as u64, "DBC");
    let mut summary = Summary::new(0, names.len());
    for name in &names {
        let file_name = name.rsplit(['\\', '/']).next().unwrap_or(name);
        match archive.extract(name, &out_dir.join(file_name)) {
            Ok(()) => summary.done += 1,
            Err(e) => error!("Error extracting DBC file {name}: {e}"),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("DBC extraction summary: {summary}");
    Ok(summary)
}
