//! Error types for the WDT library

use thiserror::Error;

use wow_data::DataError;

/// Result type alias for WDT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a WDT
#[derive(Error, Debug)]
pub enum Error {
    /// Chunk level failure: magic, truncation or version
    #[error(transparent)]
    Data(#[from] DataError),

    /// MODF record decoding failure
    #[error(transparent)]
    Placement(#[from] wow_adt::AdtError),

    /// I/O error while building a WDT
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record decoding error
    #[error("Binary decoding error: {0}")]
    Binrw(#[from] binrw::Error),

    /// MAIN does not hold 64x64 entries
    #[error("MAIN holds {0} bytes, expected 32768")]
    InvalidMainSize(usize),

    /// Global object flag set but MODF is empty
    #[error("MPHD announces a global WMO but MODF has no placement")]
    MissingGlobalPlacement,
}
