//! Building instance masks for scene folders.

use std::path::{Path, PathBuf};

use crate::data::loader::MeshReaderRegistry;
use crate::data::mask::{InstanceMask, MaskBuildStats, OverlapPolicy};
use crate::format::{
    BatchReport, FolderOutcome, FormatError, SceneFiles, SceneLayout, for_each_scene,
};
use crate::model::SegmentAnnotations;

/// Builds `instance.npy` from `segments_anno.json` and the scene mesh.
pub struct MaskBuilder {
    layout: SceneLayout,
    policy: OverlapPolicy,
    readers: MeshReaderRegistry,
}

/// Result of building one scene's mask.
#[derive(Debug)]
pub struct SceneMask {
    pub path: PathBuf,
    pub mask: InstanceMask,
    pub stats: MaskBuildStats,
}

impl MaskBuilder {
    pub fn new(layout: SceneLayout, policy: OverlapPolicy) -> Self {
        Self {
            layout,
            policy,
            readers: MeshReaderRegistry::new(),
        }
    }

    /// Build and save the mask of one scene folder.
    ///
    /// Fails with `FileNotFound` when the mesh or the segment file is
    /// missing, and leaves any existing mask untouched on failure.
    pub fn build_scene(&self, scene_dir: &Path) -> Result<SceneMask, FormatError> {
        let files = SceneFiles::scan(scene_dir, &self.layout)?;
        let mesh = files.mesh.clone().ok_or_else(|| {
            let expected = self
                .layout
                .mesh_file_names
                .first()
                .cloned()
                .unwrap_or_default();
            FormatError::not_found(scene_dir.join(expected))
        })?;
        let segments = SegmentAnnotations::load(&files.segments_path())?;

        let point_count = self.readers.point_count(&mesh)?;
        let (mask, stats) = InstanceMask::build(&segments, point_count, self.policy)?;

        let path = scene_dir.join(&self.layout.mask_file_name);
        mask.save(&path)?;
        log::info!(
            "Scene {}: {} groups, {} of {} points assigned",
            files.name,
            stats.groups,
            stats.assigned_points,
            point_count
        );

        Ok(SceneMask { path, mask, stats })
    }

    /// Build masks for every scene folder under `root`.
    pub fn build_dataset(&self, root: &Path) -> Result<BatchReport, FormatError> {
        for_each_scene(root, |folder| {
            let built = self.build_scene(folder)?;
            Ok(FolderOutcome::Processed(vec![built.path]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::write_json;
    use crate::model::SegmentGroup;
    use ndarray::array;
    use tempfile::TempDir;

    fn write_ply(path: &Path, vertices: usize) {
        let mut text = format!(
            "ply\nformat ascii 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\nend_header\n",
            vertices
        );
        for i in 0..vertices {
            text.push_str(&format!("{} 0 0\n", i));
        }
        std::fs::write(path, text).unwrap();
    }

    fn scene(root: &Path, name: &str, vertices: usize, groups: Vec<SegmentGroup>) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir(&dir).unwrap();
        write_ply(&dir.join("mesh_aligned_0.05.ply"), vertices);
        write_json(
            &dir.join("segments_anno.json"),
            &SegmentAnnotations { seg_groups: groups },
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_build_scene_writes_mask() {
        let root = TempDir::new().unwrap();
        let dir = scene(
            root.path(),
            "scene0000",
            6,
            vec![
                SegmentGroup::new(1, "lamp", vec![0, 1, 2]),
                SegmentGroup::new(2, "table", vec![3, 4, 5]),
            ],
        );

        let builder = MaskBuilder::new(SceneLayout::default(), OverlapPolicy::default());
        let built = builder.build_scene(&dir).unwrap();

        assert_eq!(built.path, dir.join("instance.npy"));
        let loaded = InstanceMask::load(&built.path).unwrap();
        assert_eq!(loaded.as_array(), &array![1u32, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_missing_segments_file() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("scene0001");
        std::fs::create_dir(&dir).unwrap();
        write_ply(&dir.join("mesh.ply"), 3);

        let builder = MaskBuilder::new(SceneLayout::default(), OverlapPolicy::default());
        assert!(matches!(
            builder.build_scene(&dir),
            Err(FormatError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_mesh() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("scene0002");
        std::fs::create_dir(&dir).unwrap();

        let builder = MaskBuilder::new(SceneLayout::default(), OverlapPolicy::default());
        assert!(matches!(
            builder.build_scene(&dir),
            Err(FormatError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_dataset_isolates_bad_scene() {
        let root = TempDir::new().unwrap();
        scene(root.path(), "good", 2, vec![SegmentGroup::new(1, "a", vec![0])]);
        scene(root.path(), "bad", 2, vec![SegmentGroup::new(1, "a", vec![9])]);

        let builder = MaskBuilder::new(SceneLayout::default(), OverlapPolicy::default());
        let report = builder.build_dataset(root.path()).unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].1,
            FormatError::SegmentOutOfBounds { index: 9, .. }
        ));
        assert!(!root.path().join("bad").join("instance.npy").exists());
    }
}
