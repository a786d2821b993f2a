//! Trait-based mesh reading.
//!
//! Mesh geometry belongs to the external viewer; the annotator only needs to
//! know how many points a mesh has so instance masks can be sized and
//! validated against it. New formats can be added by implementing the
//! `MeshReader` trait and registering it.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::format::FormatError;

/// Number of leading bytes handed to `MeshReader::can_read`.
const DETECT_BYTES: usize = 16;

/// Trait for mesh/point-cloud formats the annotator can size.
pub trait MeshReader: Send + Sync {
    /// Unique identifier for this reader (e.g., "ply").
    fn id(&self) -> &'static str;

    /// File extensions this reader handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Check magic bytes at the start of the file.
    fn can_read(&self, header: &[u8]) -> bool;

    /// Number of points (vertices) in the mesh at `path`.
    fn point_count(&self, path: &Path) -> Result<usize, FormatError>;
}

/// Registry of available mesh readers.
pub struct MeshReaderRegistry {
    readers: Vec<Box<dyn MeshReader>>,
}

impl MeshReaderRegistry {
    /// Create a registry with all built-in readers.
    pub fn new() -> Self {
        let mut registry = Self {
            readers: Vec::new(),
        };
        registry.register(Box::new(super::loaders::PlyHeaderReader));
        registry
    }

    /// Register a new reader.
    pub fn register(&mut self, reader: Box<dyn MeshReader>) {
        self.readers.push(reader);
    }

    /// Count the points of a mesh file.
    ///
    /// Readers claiming the file's extension are tried first, then magic
    /// byte detection.
    pub fn point_count(&self, path: &Path) -> Result<usize, FormatError> {
        if !path.is_file() {
            return Err(FormatError::not_found(path));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        if let Some(ext) = extension
            && let Some(reader) = self
                .readers
                .iter()
                .find(|r| r.extensions().iter().any(|e| *e == ext))
        {
            log::trace!("Sizing {:?} with {} reader (by extension)", path, reader.id());
            return reader.point_count(path);
        }

        let mut header = Vec::with_capacity(DETECT_BYTES);
        File::open(path)?
            .take(DETECT_BYTES as u64)
            .read_to_end(&mut header)?;
        match self.readers.iter().find(|r| r.can_read(&header)) {
            Some(reader) => {
                log::trace!("Sizing {:?} with {} reader (by detection)", path, reader.id());
                reader.point_count(path)
            }
            None => Err(FormatError::invalid_ply(path, "no reader recognises this mesh format")),
        }
    }

    /// All registered readers.
    pub fn readers(&self) -> &[Box<dyn MeshReader>] {
        &self.readers
    }
}

impl Default for MeshReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registry_has_ply() {
        let registry = MeshReaderRegistry::new();
        assert!(registry.readers().iter().any(|r| r.id() == "ply"));
    }

    #[test]
    fn test_detects_ply_without_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mesh.bin");
        std::fs::write(&path, "ply\nformat ascii 1.0\nelement vertex 3\nend_header\n").unwrap();

        assert_eq!(MeshReaderRegistry::new().point_count(&path).unwrap(), 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = MeshReaderRegistry::new().point_count(&dir.path().join("x.ply"));
        assert!(matches!(result, Err(FormatError::FileNotFound { .. })));
    }
}
