//! Global constants for the scene annotator

/// Segment-group metadata file present in every scene folder.
pub const SEGMENTS_FILE_NAME: &str = "segments_anno.json";

/// Suffix of the canonical per-scene annotation file (`<scene>_annotations.json`).
pub const ANNOTATIONS_SUFFIX: &str = "_annotations.json";

/// Suffix of the relational legacy annotation file (`<scene>_abs_annotations.json`).
pub const ABS_ANNOTATIONS_SUFFIX: &str = "_abs_annotations.json";

/// Output of migrating `<scene>_annotations.json`.
pub const PROCESSED_ANNOTATIONS_FILE: &str = "processed_annotations.json";

/// Output of migrating `<scene>_abs_annotations.json`.
pub const PROCESSED_ABS_ANNOTATIONS_FILE: &str = "processed_abs_annotations.json";

/// Mesh file extension.
pub const MESH_EXTENSION: &str = "ply";

/// Instance mask file extension.
pub const MASK_EXTENSION: &str = "npy";

/// Placeholder in configured mesh file names replaced by the scene folder name.
pub const SCENE_PLACEHOLDER: &str = "{scene}";

/// Name used when an object ID has no matching segment group.
pub const UNKNOWN_OBJECT_NAME: &str = "unknown";

/// Instance ID reserved for unassigned/background points.
pub const BACKGROUND_ID: u32 = 0;

/// Default viewer window width when no camera pose supplies one.
pub const DEFAULT_WINDOW_WIDTH: u32 = 1024;

/// Default viewer window height when no camera pose supplies one.
pub const DEFAULT_WINDOW_HEIGHT: u32 = 768;

/// Number of description characters shown in the annotation list.
pub const LIST_PREVIEW_CHARS: usize = 30;
