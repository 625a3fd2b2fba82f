//! Client build detection and the per-version capability set.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use memchr::memmem;
use wow_map::MapVersion;

/// Executable names tried in order.
pub const EXE_NAMES: &[&str] = &["WoW.exe", "Wow.exe", "wow.exe", "World of Warcraft.exe"];

const BUILD_MARKER: &[u8] = b"(build ";
/// Longest build string considered after the marker.
const BUILD_WINDOW: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientVersion {
    Classic,
    BurningCrusade,
    WrathOfTheLichKing,
    Cataclysm,
    MistsOfPandaria,
    Unknown,
}

impl ClientVersion {
    pub fn from_build(build: u32) -> Self {
        match build {
            5875 | 6005 | 6141 => Self::Classic,
            8606 => Self::BurningCrusade,
            12340 => Self::WrathOfTheLichKing,
            15595 => Self::Cataclysm,
            18414 => Self::MistsOfPandaria,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::BurningCrusade => "The Burning Crusade",
            Self::WrathOfTheLichKing => "Wrath of the Lich King",
            Self::Cataclysm => "Cataclysm",
            Self::MistsOfPandaria => "Mists of Pandaria",
            Self::Unknown => "Unknown",
        }
    }

    /// What the extractor can do with this client, `None` when unsupported.
    pub fn capabilities(self) -> Option<ClientCapabilities> {
        match self {
            Self::Classic => Some(ClientCapabilities::CLASSIC),
            _ => None,
        }
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything that differs between supported clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCapabilities {
    pub version: ClientVersion,
    /// Archives under `Data/`, lowest priority first.
    pub archives: &'static [&'static str],
    pub map_version: MapVersion,
    pub adt_versions: &'static [u32],
    pub wmo_versions: &'static [u32],
    pub m2_versions: &'static [u32],
}

impl ClientCapabilities {
    pub const CLASSIC: Self = Self {
        version: ClientVersion::Classic,
        archives: &[
            "dbc.MPQ",
            "model.MPQ",
            "terrain.MPQ",
            "wmo.MPQ",
            "patch.MPQ",
            "patch-2.MPQ",
        ],
        map_version: MapVersion::CLASSIC,
        adt_versions: wow_adt::SUPPORTED_VERSIONS,
        wmo_versions: wow_wmo::SUPPORTED_VERSIONS,
        m2_versions: wow_m2::SUPPORTED_VERSIONS,
    };

    /// Full paths of the archives inside `client_dir`.
    pub fn archive_paths(&self, client_dir: &Path) -> Vec<PathBuf> {
        let data = client_dir.join("Data");
        self.archives.iter().map(|name| data.join(name)).collect()
    }
}

/// Build number embedded in the client executable as `(build N)`.
pub fn detect_build(client_dir: &Path) -> Option<u32> {
    let data = EXE_NAMES
        .iter()
        .map(|name| client_dir.join(name))
        .find_map(|path| fs::read(&path).ok().inspect(|_| debug!("Scanning {}", path.display())))?;
    parse_build(&data)
}

fn parse_build(data: &[u8]) -> Option<u32> {
    let start = memmem::find(data, BUILD_MARKER)? + BUILD_MARKER.len();
    let window = &data[start..data.len().min(start + BUILD_WINDOW)];
    let end = memchr::memchr(b')', window)?;
    std::str::from_utf8(&window[..end]).ok()?.trim().parse().ok()
}

pub fn detect(client_dir: &Path) -> ClientVersion {
    detect_build(client_dir).map_or(ClientVersion::Unknown, ClientVersion::from_build)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(5875, ClientVersion::Classic)]
    #[test_case(6005, ClientVersion::Classic)]
    #[test_case(6141, ClientVersion::Classic)]
    #[test_case(8606, ClientVersion::BurningCrusade)]
    #[test_case(12340, ClientVersion::WrathOfTheLichKing)]
    #[test_case(15595, ClientVersion::Cataclysm)]
    #[test_case(18414, ClientVersion::MistsOfPandaria)]
    #[test_case(4044, ClientVersion::Unknown)]
    fn build_table(build: u32, version: ClientVersion) {
        assert_eq!(ClientVersion::from_build(build), version);
    }

    #[test]
    fn only_classic_is_supported() {
        assert!(ClientVersion::Classic.capabilities().is_some());
        assert!(ClientVersion::BurningCrusade.capabilities().is_none());
        assert!(ClientVersion::Unknown.capabilities().is_none());
    }

    #[test]
    fn build_string_is_found_in_the_binary() {
        let mut exe = vec![0u8; 1000];
        exe.extend_from_slice(b"Version 1.12.1 (build 5875) Release");
        exe.extend(vec![0xFF; 100]);
        assert_eq!(parse_build(&exe), Some(5875));
        assert_eq!(parse_build(b"(build 5875"), None);
        assert_eq!(parse_build(b"nothing here"), None);
    }

    #[test]
    fn detection_tries_every_exe_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(detect(dir.path()), ClientVersion::Unknown);
        std::fs::write(dir.path().join("World of Warcraft.exe"), b"xx(build 8606)xx").unwrap();
        assert_eq!(detect(dir.path()), ClientVersion::BurningCrusade);
    }

    #[test]
    fn archives_live_under_data() {
        let paths = ClientCapabilities::CLASSIC.archive_paths(Path::new("/wow"));
        assert_eq!(paths.first().unwrap(), &Path::new("/wow").join("Data").join("dbc.MPQ"));
        assert_eq!(paths.len(), 6);
    }
}
