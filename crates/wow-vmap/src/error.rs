use thiserror::Error;

use wow_data::DataError;

pub type Result<T> = std::result::Result<T, VmapError>;

#[derive(Error, Debug)]
pub enum VmapError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("M2 error: {0}")]
    M2(#[from] wow_m2::M2Error),

    #[error("WMO error: {0}")]
    Wmo(#[from] wow_wmo::WmoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The root names more groups than were supplied.
    #[error("WMO {name} declares {expected} groups, {found} were loaded")]
    GroupCountMismatch {
        name: String,
        expected: u32,
        found: usize,
    },

    /// A serialized tree points outside its own arrays.
    #[error("Corrupt BIH: {0}")]
    CorruptTree(String),
}
