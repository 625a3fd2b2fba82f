//! One case-insensitive namespace over the client's MPQ archives.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use parking_lot::Mutex;
use thiserror::Error;
use wow_mpq::Archive;

pub const DBC_PREFIX: &str = "DBFilesClient\\";

#[derive(Error, Debug)]
pub enum ArchiveError {
    /// No loaded archive has the file.
    #[error("{0} not found in any loaded archive")]
    ArchiveMiss(String),

    #[error("MPQ error in {name}: {source}")]
    Mpq {
        name: String,
        #[source]
        source: wow_mpq::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::ArchiveMiss(_))
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Archive paths compare case-insensitively with either separator.
pub fn normalize(name: &str) -> String {
    name.replace('/', "\\").to_ascii_lowercase()
}

/// Read access to the merged client files.
pub trait ArchiveSource: Send + Sync {
    /// Every member, with its original spelling, sorted case-insensitively.
    fn names(&self) -> Vec<String>;

    fn get(&self, name: &str) -> Result<Vec<u8>>;

    fn contains(&self, name: &str) -> bool;

    /// Copy one member to `dest`, creating missing parent directories.
    fn extract(&self, name: &str, dest: &Path) -> Result<()> {
        let data = self.get(name)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, data)?;
        Ok(())
    }

    fn list_by_prefix(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize(prefix);
        self.names()
            .into_iter()
            .filter(|n| normalize(n).starts_with(&prefix))
            .collect()
    }

    /// The client tables under `DBFilesClient\`.
    fn dbc_names(&self) -> Vec<String> {
        self.list_by_prefix(DBC_PREFIX)
            .into_iter()
            .filter(|n| normalize(n).ends_with(".dbc"))
            .collect()
    }

    /// WMO files that are roots rather than `_NNN` group files.
    fn world_model_roots(&self) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|n| is_world_model_root(n))
            .collect()
    }
}

fn is_world_model_root(name: &str) -> bool {
    let lower = normalize(name);
    let Some(stem) = lower.strip_suffix(".wmo") else {
        return false;
    };
    let bytes = stem.as_bytes();
    let group_suffix = bytes.len() > 4
        && bytes[bytes.len() - 4] == b'_'
        && bytes[bytes.len() - 3..].iter().all(u8::is_ascii_digit);
    !group_suffix
}

/// The client's archives. A name present in several archives is served by
/// the one loaded last.
pub struct MpqIndex {
    archives: Vec<Mutex<Archive>>,
    /// normalized name -> (archive index, original name)
    files: HashMap<String, (usize, String)>,
}

impl MpqIndex {
    /// Open `paths` in order. Archives that do not exist are skipped with a
    /// warning; one that fails to open is an error.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut index = Self {
            archives: Vec::new(),
            files: HashMap::new(),
        };

        for path in paths.iter().rev() {
            let path = path.as_ref();
            if !path.exists() {
                warn!("Archive {} not found, skipping", path.display());
                continue;
            }
            let display = path.display().to_string();
            let mut archive = Archive::open(path).map_err(|source| ArchiveError::Mpq {
                name: display.clone(),
                source,
            })?;
            let entries = archive.list().map_err(|source| ArchiveError::Mpq {
                name: display.clone(),
                source,
            })?;

            let slot = index.archives.len();
            let mut added = 0;
            for entry in entries {
                debug!("Handling file: {}", entry.name);
                index
                    .files
                    .entry(normalize(&entry.name))
                    .or_insert_with(|| {
                        added += 1;
                        (slot, entry.name)
                    });
            }
            if added == 0 {
                info!("No newer files loaded from {display}");
            }
            info!("Loaded MPQ: {display}");
            index.archives.push(Mutex::new(archive));
        }

        info!("Total MPQ files loaded: {}", index.files.len());
        info!("Total loaded DBC: {}", index.dbc_names().len());
        Ok(index)
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }
}

impl ArchiveSource for MpqIndex {
    fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.files.values().map(|(_, n)| n.clone()).collect();
        names.sort_by_cached_key(|n| normalize(n));
        names
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        let (slot, original) = self
            .files
            .get(&normalize(name))
            .ok_or_else(|| ArchiveError::ArchiveMiss(name.to_string()))?;
        let archive = self
            .archives
            .get(*slot)
            .ok_or_else(|| ArchiveError::ArchiveMiss(name.to_string()))?;
        archive
            .lock()
            .read_file(original)
            .map_err(|source| ArchiveError::Mpq {
                name: original.clone(),
                source,
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.files.contains_key(&normalize(name))
    }
}

/// Files held in memory, for synthesized clients.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    files: BTreeMap<String, (String, Vec<u8>)>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        self.files.insert(normalize(&name), (name, data));
    }
}

impl ArchiveSource for MemoryArchive {
    fn names(&self) -> Vec<String> {
        self.files.values().map(|(n, _)| n.clone()).collect()
    }

    fn get(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(&normalize(name))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| ArchiveError::ArchiveMiss(name.to_string()))
    }

    fn contains(&self, name: &str) -> bool {
        self.files.contains_key(&normalize(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn sample() -> MemoryArchive {
        MemoryArchive::new()
            .with_file("DBFilesClient\\Map.dbc", vec![1])
            .with_file("DBFilesClient\\AreaTable.dbc", vec![2])
            .with_file("DBFilesClient\\readme.txt", vec![3])
            .with_file("World\\wmo\\Azeroth\\Inn.wmo", vec![4])
            .with_file("World\\wmo\\Azeroth\\Inn_000.wmo", vec![5])
    }

    #[test]
    fn lookups_ignore_case_and_separator() {
        let archive = sample();
        assert_eq!(archive.get("dbfilesclient/MAP.DBC").unwrap(), vec![1]);
        assert!(archive.contains("world\\WMO\\azeroth\\inn.wmo"));
        assert!(archive.get("nope.dbc").unwrap_err().is_miss());
    }

    #[test]
    fn classification() {
        let archive = sample();
        assert_eq!(
            archive.dbc_names(),
            vec!["DBFilesClient\\AreaTable.dbc", "DBFilesClient\\Map.dbc"]
        );
        assert_eq!(archive.world_model_roots(), vec!["World\\wmo\\Azeroth\\Inn.wmo"]);
    }

    #[test_case("a\\Inn.wmo", true)]
    #[test_case("a\\Inn_000.wmo", false)]
    #[test_case("a\\Inn_12.wmo", true)]
    #[test_case("a\\Inn.m2", false)]
    fn world_model_root(name: &str, root: bool) {
        assert_eq!(is_world_model_root(name), root);
    }

    #[test]
    fn extract_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dbc").join("Map.dbc");
        sample().extract("DBFilesClient\\Map.dbc", &dest).unwrap();
        assert_eq!(std::fs::read(dest).unwrap(), vec![1]);
    }
}
