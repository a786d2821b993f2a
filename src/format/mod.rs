//! Scene file formats and persistence.
//!
//! - `scene`: locating the mesh, instance mask and annotation files of a scene folder
//! - `json`: pretty-printed JSON reading and atomic writing
//! - `batch`: running a per-scene step over every folder of a dataset

mod batch;
mod error;
mod json;
mod scene;

pub use batch::{BatchReport, FolderOutcome, for_each_scene};
pub use error::FormatError;
pub use json::{read_json, to_pretty_json, write_atomic, write_json};
pub use scene::{SceneFiles, SceneLayout, scene_name};
