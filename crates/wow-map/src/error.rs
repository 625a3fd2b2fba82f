use thiserror::Error;

use wow_adt::AdtError;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Error, Debug)]
pub enum MapError {
    /// The source tile could not be decoded.
    #[error("ADT error: {0}")]
    Adt(#[from] AdtError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary decoding error: {0}")]
    Binrw(#[from] binrw::Error),

    /// A section of a `.map` file disagrees with its header.
    #[error("Invalid {section} section: {reason}")]
    InvalidSection {
        section: &'static str,
        reason: String,
    },
}

impl MapError {
    pub(crate) fn section(section: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSection {
            section,
            reason: reason.into(),
        }
    }
}
