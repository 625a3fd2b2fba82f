//! `.vmo` model files.
//!
//! ```text
//! "VMAP_4.0"
//! "WMOD" u32 8, root WMO id
//! "GMOD" u32 group count            (only with groups)
//!   per group:
//!     bound (6 x f32), flags u32, WMO area id u32
//!     "VERT" u32 size, u32 count, count x 3 x f32
//!     "TRIM" u32 size, u32 triangle count, 3 x u32 per triangle
//!     "MBIH" triangle tree
//!     "LIQU" u32 size, then the liquid when size > 0
//!   "GBIH" group tree
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::trace;

use wow_data::WriteExt;

use crate::VMAP_MAGIC;
use crate::error::Result;
use crate::model::{Model, ModelGroup, ModelLiquid};

impl Model {
    pub fn file_name(&self) -> String {
        format!("{}.vmo", self.name)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_tag(VMAP_MAGIC)?;
        writer.write_tag(b"WMOD")?;
        writer.write_u32_le(8)?;
        writer.write_u32_le(self.root_wmo_id)?;

        if !self.groups.is_empty() {
            writer.write_tag(b"GMOD")?;
            writer.write_u32_le(self.groups.len() as u32)?;
            for group in &self.groups {
                group.write_to(writer)?;
            }
            writer.write_tag(b"GBIH")?;
            self.group_tree.write_to(writer)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Write `<name>.vmo` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        let mut writer = BufWriter::new(File::create(&path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        trace!("Wrote {}", path.display());
        Ok(path)
    }
}

impl ModelGroup {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_aabox(&self.bounds)?;
        writer.write_u32_le(self.flags)?;
        writer.write_u32_le(self.wmo_id)?;

        writer.write_tag(b"VERT")?;
        writer.write_u32_le(4 + 12 * self.vertices.len() as u32)?;
        writer.write_u32_le(self.vertices.len() as u32)?;
        for &v in &self.vertices {
            writer.write_vec3(v)?;
        }

        writer.write_tag(b"TRIM")?;
        writer.write_u32_le(4 + 4 * self.index_count() as u32)?;
        writer.write_u32_le(self.triangles.len() as u32)?;
        for triangle in &self.triangles {
            writer.write_u32_slice(triangle)?;
        }

        writer.write_tag(b"MBIH")?;
        self.tree.write_to(writer)?;

        writer.write_tag(b"LIQU")?;
        match &self.liquid {
            Some(liquid) => liquid.write_to(writer),
            None => Ok(writer.write_u32_le(0)?),
        }
    }
}

impl ModelLiquid {
    /// Payload size: tile counts, base, type, heights and flags.
    pub fn size(&self) -> u32 {
        (8 + 12 + 4 + 4 * self.heights.len() + self.flags.len()) as u32
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32_le(self.size())?;
        writer.write_u32_le(self.tiles_x)?;
        writer.write_u32_le(self.tiles_y)?;
        writer.write_vec3(self.base)?;
        writer.write_u32_le(self.liquid_type)?;
        writer.write_f32_slice(&self.heights)?;
        writer.write_all(&self.flags)?;
        Ok(())
    }
}
