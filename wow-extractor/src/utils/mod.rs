//! Shared utilities for the extractor

pub mod progress;

pub use progress::create_progress_bar;
