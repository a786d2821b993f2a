//! Data models for scene annotations.

mod annotation;
pub mod camera;
mod segments;

pub use annotation::{Annotation, AnnotationError, ObjectId, compose_full_text};
pub use camera::{CameraPose, Extrinsic, IntrinsicParams, PinholeCameraParameters, PinholeIntrinsic};
pub use segments::{SegmentAnnotations, SegmentGroup};
