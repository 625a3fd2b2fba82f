//! Writers for minimal root and group files.

use std::io::Cursor;

use binrw::BinWrite;
use glam::Vec3;

use wow_data::{AaBox, ChunkId, WriteExt};

use crate::error::Result;
use crate::group::{
    GroupFlags, MOBA, MOBN, MOBR, MOCV, MODR, MOGP, MOLR, MONR, MOPY, MORI, MOTV, MOVI, MOVT,
    MogpHeader, PolyFlags,
};
use crate::liquid::{MLIQ, WmoLiquid};
use crate::root::{GroupInfo, MCVP, MOGI, MOHD, Mohd, ROOT_SEQUENCE, RootFlags};

const VERSION: u32 = 17;

fn to_bytes<T: for<'a> BinWrite<Args<'a> = ()> + binrw::meta::WriteEndian>(value: &T) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    value.write(&mut out)?;
    Ok(out.into_inner())
}

#[derive(Debug, Clone, Default)]
pub struct WmoRootBuilder {
    wmo_id: u32,
    flags: RootFlags,
    groups: Vec<GroupInfo>,
    convex_volumes: bool,
}

impl WmoRootBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn wmo_id(mut self, id: u32) -> Self {
        self.wmo_id = id;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: RootFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn group(mut self, flags: GroupFlags, bounds: AaBox) -> Self {
        self.groups.push(GroupInfo {
            flags,
            bounding_box: bounds.to_array(),
            name_offset: -1,
        });
        self
    }

    #[must_use]
    pub fn convex_volumes(mut self) -> Self {
        self.convex_volumes = true;
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let header = Mohd {
            n_groups: self.groups.len() as u32,
            wmo_id: self.wmo_id,
            flags: self.flags,
            ..Default::default()
        };

        let mut out = Vec::new();
        out.write_chunk(ChunkId::MVER, &VERSION.to_le_bytes())?;
        out.write_chunk(MOHD, &to_bytes(&header)?)?;
        for id in ROOT_SEQUENCE {
            if id == MOGI {
                let mut payload = Vec::new();
                for info in &self.groups {
                    payload.extend(to_bytes(info)?);
                }
                out.write_chunk(id, &payload)?;
            } else {
                out.write_chunk(id, &[])?;
            }
        }
        if self.convex_volumes {
            out.write_chunk(MCVP, &[])?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WmoGroupBuilder {
    info: MogpHeader,
    vertices: Vec<Vec3>,
    triangles: Vec<([u16; 3], PolyFlags)>,
    liquid: Option<WmoLiquid>,
}

impl WmoGroupBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra MOGP flags; `HAS_WATER` is managed by [`Self::liquid`].
    #[must_use]
    pub fn flags(mut self, flags: GroupFlags) -> Self {
        self.info.flags |= flags;
        self
    }

    #[must_use]
    pub fn bounds(mut self, bounds: AaBox) -> Self {
        self.info.bounding_box = bounds.to_array();
        self
    }

    #[must_use]
    pub fn group_liquid(mut self, liquid: u32) -> Self {
        self.info.group_liquid = liquid;
        self
    }

    #[must_use]
    pub fn area_id(mut self, id: u32) -> Self {
        self.info.wmo_area_table_id = id;
        self
    }

    #[must_use]
    pub fn vertices(mut self, vertices: &[Vec3]) -> Self {
        self.vertices = vertices.to_vec();
        self
    }

    #[must_use]
    pub fn triangle(mut self, indices: [u16; 3], flags: PolyFlags) -> Self {
        self.triangles.push((indices, flags));
        self
    }

    #[must_use]
    pub fn liquid(mut self, liquid: WmoLiquid) -> Self {
        self.info.flags |= GroupFlags::HAS_WATER;
        self.liquid = Some(liquid);
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut body = to_bytes(&self.info)?;
        let mopy: Vec<u8> = self
            .triangles
            .iter()
            .flat_map(|(_, f)| [f.bits(), 0])
            .collect();
        body.write_chunk(MOPY, &mopy)?;
        let mut movi = Vec::new();
        for (t, _) in &self.triangles {
            movi.write_u16_slice(t)?;
        }
        body.write_chunk(MOVI, &movi)?;
        let mut movt = Vec::new();
        for v in &self.vertices {
            movt.write_vec3(*v)?;
        }
        body.write_chunk(MOVT, &movt)?;
        for id in [MONR, MOTV, MOBA] {
            body.write_chunk(id, &[])?;
        }

        let flags = self.info.flags;
        if flags.contains(GroupFlags::HAS_LIGHTS) {
            body.write_chunk(MOLR, &[])?;
        }
        if flags.contains(GroupFlags::HAS_DOODADS) {
            body.write_chunk(MODR, &[])?;
        }
        if flags.contains(GroupFlags::HAS_BSP_TREE) {
            body.write_chunk(MOBN, &[])?;
            body.write_chunk(MOBR, &[])?;
        }
        if flags.contains(GroupFlags::HAS_VERTEX_COLORS) {
            body.write_chunk(MOCV, &[])?;
        }
        if let Some(liquid) = &self.liquid {
            body.write_chunk(MLIQ, &liquid.to_bytes()?)?;
        }
        if flags.contains(GroupFlags::HAS_TRIANGLE_STRIPS) {
            body.write_chunk(MORI, &[])?;
        }

        let mut out = Vec::new();
        out.write_chunk(ChunkId::MVER, &VERSION.to_le_bytes())?;
        out.write_chunk(MOGP, &body)?;
        Ok(out)
    }
}
