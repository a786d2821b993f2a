//! Scene data: instance masks and the readers that feed them.
//!
//! This module provides:
//! - `InstanceMask`: per-point object IDs, built from segment groups
//! - `MaskBuilder`: per-scene and per-dataset mask generation
//! - `MeshReaderRegistry`: extensible mesh sizing (PLY built in)
//!
//! ## Adding New Mesh Formats
//!
//! 1. Create a reader in `loaders/` implementing `MeshReader`
//! 2. Register it in `MeshReaderRegistry::new()`

mod builder;
mod loader;
pub mod loaders;
mod mask;

pub use builder::{MaskBuilder, SceneMask};
pub use loader::{MeshReader, MeshReaderRegistry};
pub use mask::{InstanceMask, MaskBuildStats, OverlapPolicy};
