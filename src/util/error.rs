//! Error types for BVH construction and hierarchy files.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tribvh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A leaf holds more triangles than the compact count field can store
    #[error("Leaf node {node} spans {count} triangles (compact limit is {max})")]
    CapacityExceeded { node: usize, count: usize, max: usize },

    /// Unknown split-mode selector
    #[error("Unsupported split mode: {0}")]
    UnsupportedSplitMode(String),

    /// Hierarchy data is inconsistent or corrupted
    #[error("Malformed hierarchy data: {0}")]
    MalformedInput(String),

    /// Hierarchy data ended before a declared field
    #[error("Unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: u64, needed: u64 },

    /// Hierarchy file does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// Builder configuration cannot produce a valid hierarchy
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Build requested over an empty triangle list
    #[error("Cannot build a hierarchy over zero triangles")]
    EmptyGeometry,

    /// Triangle count does not fit the 32-bit file fields
    #[error("Too many triangles for a hierarchy: {0}")]
    TooManyTriangles(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a malformed-input error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// True for every error that means "this hierarchy file is unusable".
    ///
    /// Callers holding the triangle list are expected to rebuild on these.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_)
                | Self::UnexpectedEof { .. }
                | Self::FileNotFound(_)
                | Self::MmapFailed(_)
        )
    }
}

/// Result type alias for tribvh operations.
pub type Result<T> = std::result::Result<T, Error>;
