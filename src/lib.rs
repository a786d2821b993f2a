//! Scene Annotator - natural-language annotation of 3D scene meshes
//!
//! Annotations tie a description to the object instances a user picked in a
//! scene mesh, optionally together with the camera view it was written from.
//! The crate also builds the per-point instance masks the picking relies on
//! and migrates legacy annotation files to the current schema.
//!
//! Rendering and point picking are provided by an external viewer through
//! the [`viewer::SceneViewer`] trait.

pub mod cli;
pub mod config;
pub mod constants;
pub mod data;
pub mod format;
pub mod migration;
pub mod model;
pub mod state;
pub mod viewer;

pub use config::AppConfig;
pub use state::{Session, SessionError};
