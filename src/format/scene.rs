//! Scene directory layout.
//!
//! A scene folder named `<scene>` holds one mesh (`.ply`), one instance mask
//! (`.npy`), `segments_anno.json`, and the annotation files keyed by scene
//! name. File discovery follows a fixed priority order so a folder with
//! several candidate meshes resolves the same way every time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ABS_ANNOTATIONS_SUFFIX, ANNOTATIONS_SUFFIX, MASK_EXTENSION, MESH_EXTENSION,
    PROCESSED_ABS_ANNOTATIONS_FILE, PROCESSED_ANNOTATIONS_FILE, SCENE_PLACEHOLDER,
    SEGMENTS_FILE_NAME,
};
use crate::format::error::FormatError;

/// Naming conventions used to locate scene files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneLayout {
    /// Mesh names tried in order; `{scene}` is replaced by the folder name.
    #[serde(default = "default_mesh_file_names")]
    pub mesh_file_names: Vec<String>,

    /// Case-insensitive substring that marks the instance mask file.
    #[serde(default = "default_mask_keyword")]
    pub mask_keyword: String,

    /// File the mask builder writes.
    #[serde(default = "default_mask_file_name")]
    pub mask_file_name: String,
}

fn default_mesh_file_names() -> Vec<String> {
    vec![
        "mesh_aligned_0.05.ply".to_string(),
        format!("{}.ply", SCENE_PLACEHOLDER),
        "mesh.ply".to_string(),
    ]
}

fn default_mask_keyword() -> String {
    "instance".to_string()
}

fn default_mask_file_name() -> String {
    "instance.npy".to_string()
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            mesh_file_names: default_mesh_file_names(),
            mask_keyword: default_mask_keyword(),
            mask_file_name: default_mask_file_name(),
        }
    }
}

/// Resolved paths of one scene folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneFiles {
    pub dir: PathBuf,
    pub name: String,
    /// Mesh file, if any `.ply` exists.
    pub mesh: Option<PathBuf>,
    /// Instance mask, if any `.npy` exists.
    pub mask: Option<PathBuf>,
}

impl SceneFiles {
    /// Scan `dir` and resolve the mesh and mask by priority.
    pub fn scan(dir: &Path, layout: &SceneLayout) -> Result<Self, FormatError> {
        if !dir.is_dir() {
            return Err(FormatError::not_found(dir));
        }
        let name = scene_name(dir);
        let mesh_files = list_with_extension(dir, MESH_EXTENSION)?;
        let mask_files = list_with_extension(dir, MASK_EXTENSION)?;

        let mesh = pick_mesh(&mesh_files, &name, layout).map(|f| dir.join(f));
        let mask = pick_mask(&mask_files, layout).map(|f| dir.join(f));
        log::debug!("Scene {:?}: mesh = {:?}, mask = {:?}", name, mesh, mask);

        Ok(Self {
            dir: dir.to_path_buf(),
            name,
            mesh,
            mask,
        })
    }

    /// `<dir>/<scene>_annotations.json`
    pub fn annotations_path(&self) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, ANNOTATIONS_SUFFIX))
    }

    /// `<dir>/<scene>_abs_annotations.json`
    pub fn abs_annotations_path(&self) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, ABS_ANNOTATIONS_SUFFIX))
    }

    /// `<dir>/segments_anno.json`
    pub fn segments_path(&self) -> PathBuf {
        self.dir.join(SEGMENTS_FILE_NAME)
    }

    pub fn processed_annotations_path(&self) -> PathBuf {
        self.dir.join(PROCESSED_ANNOTATIONS_FILE)
    }

    pub fn processed_abs_annotations_path(&self) -> PathBuf {
        self.dir.join(PROCESSED_ABS_ANNOTATIONS_FILE)
    }
}

/// Folder name of a scene directory.
pub fn scene_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File names in `dir` with the given extension, sorted.
fn list_with_extension(dir: &Path, extension: &str) -> Result<Vec<String>, FormatError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Configured names in order, then the first mesh present.
fn pick_mesh<'a>(candidates: &'a [String], scene: &str, layout: &SceneLayout) -> Option<&'a str> {
    layout
        .mesh_file_names
        .iter()
        .map(|pattern| pattern.replace(SCENE_PLACEHOLDER, scene))
        .find_map(|wanted| candidates.iter().find(|c| **c == wanted))
        .or_else(|| candidates.first())
        .map(String::as_str)
}

/// First file containing the keyword, else the first mask present.
fn pick_mask<'a>(candidates: &'a [String], layout: &SceneLayout) -> Option<&'a str> {
    let keyword = layout.mask_keyword.to_lowercase();
    candidates
        .iter()
        .find(|c| c.to_lowercase().contains(&keyword))
        .or_else(|| candidates.first())
        .map(String::as_str)
}
