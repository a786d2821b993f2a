//! Built-in readers for scene data files.
//!
//! - `PlyHeaderReader`: implements `MeshReader` for `.ply` meshes
//! - `NpyMaskLoader`: reads and writes `.npy` instance masks

mod npy_loader;
mod ply_header;

pub use npy_loader::{NpyMaskLoader, ToObjectId};
pub use ply_header::PlyHeaderReader;
