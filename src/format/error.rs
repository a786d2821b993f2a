//! Error types for scene file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing scene files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// NumPy array could not be read
    #[error("NPY read error: {0}")]
    NpyRead(#[from] ndarray_npy::ReadNpyError),

    /// NumPy array could not be written
    #[error("NPY write error: {0}")]
    NpyWrite(#[from] ndarray_npy::WriteNpyError),

    /// Required file is missing
    #[error("File not found: {path:?}")]
    FileNotFound {
        /// Path where the file was expected
        path: PathBuf,
    },

    /// PLY header is malformed or lacks a vertex element
    #[error("Invalid PLY file {path:?}: {message}")]
    InvalidPly {
        /// Path of the offending file
        path: PathBuf,
        /// Description of the problem
        message: String,
    },

    /// A segment group references a point index beyond the mesh
    #[error(
        "Segment group {group} references point {index}, but the mesh has {point_count} points"
    )]
    SegmentOutOfBounds {
        /// Object ID of the offending group
        group: u32,
        /// Out-of-range point index
        index: usize,
        /// Number of points in the mesh
        point_count: usize,
    },

    /// Two segment groups claim the same point under the strict overlap policy
    #[error("Point {index} is claimed by both object {first} and object {second}")]
    OverlappingSegments {
        /// Shared point index
        index: usize,
        /// Object that claimed the point first
        first: u32,
        /// Object that claimed it second
        second: u32,
    },

    /// Instance mask length does not match the mesh point count
    #[error("Instance mask has {mask_len} entries but the mesh has {point_count} points")]
    ShapeMismatch {
        /// Number of entries in the mask
        mask_len: usize,
        /// Number of points in the mesh
        point_count: usize,
    },

    /// Array file has an unexpected dimensionality or dtype
    #[error("Invalid array: {message}")]
    InvalidArray {
        /// Description of the problem
        message: String,
    },
}

impl FormatError {
    /// Create a file-not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create an invalid PLY error.
    pub fn invalid_ply(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidPly {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid array error.
    pub fn invalid_array(message: impl Into<String>) -> Self {
        Self::InvalidArray {
            message: message.into(),
        }
    }
}
