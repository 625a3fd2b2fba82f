//! WMO root file: header, group directory and the chunks that only need to
//! be present.
//!
//! ```text
//! MVER  17
//! MOHD  64-byte header
//! MOTX MOMT MOGN MOGI MOSB MOPV MOPT MOPR MOVV MOVB MOLT MODS MODN MODD MFOG
//! MCVP  optional convex volume planes
//! ```

use std::io::Cursor;

use binrw::{BinRead, BinWrite};
use bitflags::bitflags;
use log::{debug, warn};

use wow_data::{AaBox, ChunkId, ChunkReader};

use crate::error::{Result, WmoError};
use crate::group::GroupFlags;
use crate::SUPPORTED_VERSIONS;

pub const MOHD: ChunkId = ChunkId::from_mnemonic(b"MOHD");
pub const MOTX: ChunkId = ChunkId::from_mnemonic(b"MOTX");
pub const MOMT: ChunkId = ChunkId::from_mnemonic(b"MOMT");
pub const MOGN: ChunkId = ChunkId::from_mnemonic(b"MOGN");
pub const MOGI: ChunkId = ChunkId::from_mnemonic(b"MOGI");
pub const MOSB: ChunkId = ChunkId::from_mnemonic(b"MOSB");
pub const MOPV: ChunkId = ChunkId::from_mnemonic(b"MOPV");
pub const MOPT: ChunkId = ChunkId::from_mnemonic(b"MOPT");
pub const MOPR: ChunkId = ChunkId::from_mnemonic(b"MOPR");
pub const MOVV: ChunkId = ChunkId::from_mnemonic(b"MOVV");
pub const MOVB: ChunkId = ChunkId::from_mnemonic(b"MOVB");
pub const MOLT: ChunkId = ChunkId::from_mnemonic(b"MOLT");
pub const MODS: ChunkId = ChunkId::from_mnemonic(b"MODS");
pub const MODN: ChunkId = ChunkId::from_mnemonic(b"MODN");
pub const MODD: ChunkId = ChunkId::from_mnemonic(b"MODD");
pub const MFOG: ChunkId = ChunkId::from_mnemonic(b"MFOG");
pub const MCVP: ChunkId = ChunkId::from_mnemonic(b"MCVP");

/// Mandatory chunks after MOHD, in file order.
pub const ROOT_SEQUENCE: [ChunkId; 15] = [
    MOTX, MOMT, MOGN, MOGI, MOSB, MOPV, MOPT, MOPR, MOVV, MOVB, MOLT, MODS, MODN, MODD, MFOG,
];

bitflags! {
    /// MOHD flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RootFlags: u16 {
        const DO_NOT_ATTENUATE_VERTICES = 0x1;
        const USE_UNIFIED_RENDER_PATH = 0x2;
        /// Group liquid types are LiquidType ids instead of legacy kinds.
        const USE_LIQUID_FROM_DBC = 0x4;
        const DO_NOT_FIX_VERTEX_COLOR_ALPHA = 0x8;
    }
}

/// MOHD, 64 bytes.
#[derive(Debug, Clone, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct Mohd {
    pub n_materials: u32,
    pub n_groups: u32,
    pub n_portals: u32,
    pub n_lights: u32,
    pub n_models: u32,
    pub n_doodads: u32,
    pub n_doodad_sets: u32,
    pub ambient_color: u32,
    /// WMOAreaTable root id.
    pub wmo_id: u32,
    pub bounding_box: [f32; 6],
    #[br(map = RootFlags::from_bits_retain)]
    #[bw(map = |f: &RootFlags| f.bits())]
    pub flags: RootFlags,
    pub num_lod: u16,
}

impl Mohd {
    pub const SIZE: usize = 64;
}

/// One MOGI entry, 32 bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, BinRead, BinWrite)]
#[brw(little)]
pub struct GroupInfo {
    #[br(map = GroupFlags::from_bits_retain)]
    #[bw(map = |f: &GroupFlags| f.bits())]
    pub flags: GroupFlags,
    pub bounding_box: [f32; 6],
    /// Offset into MOGN, -1 for unnamed groups.
    pub name_offset: i32,
}

impl GroupInfo {
    pub const SIZE: usize = 32;

    pub fn bounds(&self) -> AaBox {
        AaBox::from(self.bounding_box)
    }
}

/// A parsed WMO root.
#[derive(Debug, Clone)]
pub struct WmoRoot {
    pub version: u32,
    pub header: Mohd,
    pub groups: Vec<GroupInfo>,
    pub has_convex_volumes: bool,
}

impl WmoRoot {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let reader = ChunkReader::new(data);
        let mver = reader.read_version("WMO", SUPPORTED_VERSIONS)?;
        let version = mver.cursor().read_u32()?;

        let mohd = reader.expect_chunk(mver.next_offset(), MOHD)?;
        if mohd.size() < Mohd::SIZE {
            return Err(WmoError::ChunkTooSmall {
                chunk: MOHD,
                len: mohd.size(),
                min: Mohd::SIZE,
            });
        }
        let header = Mohd::read(&mut mohd.cursor().take_io(Mohd::SIZE)?)?;

        let mut offset = mohd.next_offset();
        let mut groups = Vec::new();
        for id in ROOT_SEQUENCE {
            let chunk = reader.expect_chunk(offset, id)?;
            if id == MOGI {
                groups = chunk
                    .elements(GroupInfo::SIZE)?
                    .map(|record| GroupInfo::read(&mut Cursor::new(record)))
                    .collect::<binrw::BinResult<Vec<_>>>()?;
            }
            offset = chunk.next_offset();
        }
        let has_convex_volumes = reader.is_chunk_at(offset, MCVP);

        if groups.len() != header.n_groups as usize {
            warn!(
                "WMO root declares {} groups but MOGI lists {}",
                header.n_groups,
                groups.len()
            );
        }
        debug!(
            "WMO root id {}: {} groups, flags {:?}",
            header.wmo_id, header.n_groups, header.flags
        );

        Ok(Self {
            version,
            header,
            groups,
            has_convex_volumes,
        })
    }

    pub fn group_count(&self) -> u32 {
        self.header.n_groups
    }

    pub fn wmo_id(&self) -> u32 {
        self.header.wmo_id
    }

    pub fn uses_liquid_from_dbc(&self) -> bool {
        self.header.flags.contains(RootFlags::USE_LIQUID_FROM_DBC)
    }

    pub fn bounds(&self) -> AaBox {
        AaBox::from(self.header.bounding_box)
    }
}

/// Archive name of group `index` of the root at `root_path`:
/// `foo\bar.wmo` becomes `foo\bar_003.wmo`.
pub fn group_file_name(root_path: &str, index: u32) -> String {
    let stem = root_path
        .len()
        .checked_sub(4)
        .filter(|&at| root_path.is_char_boundary(at) && root_path[at..].eq_ignore_ascii_case(".wmo"))
        .map_or(root_path, |at| &root_path[..at]);
    format!("{stem}_{index:03}.wmo")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn header_sizes() {
        let mut out = Cursor::new(Vec::new());
        Mohd::default().write(&mut out).unwrap();
        assert_eq!(out.into_inner().len(), Mohd::SIZE);

        let mut out = Cursor::new(Vec::new());
        GroupInfo::default().write(&mut out).unwrap();
        assert_eq!(out.into_inner().len(), GroupInfo::SIZE);
    }

    #[test_case("World\\wmo\\Inn.wmo", 0, "World\\wmo\\Inn_000.wmo" ; "lower case")]
    #[test_case("World\\wmo\\Inn.WMO", 12, "World\\wmo\\Inn_012.wmo" ; "upper case extension")]
    #[test_case("noext", 1, "noext_001.wmo" ; "no extension")]
    fn group_names(root: &str, index: u32, expected: &str) {
        assert_eq!(group_file_name(root, index), expected);
    }
}
