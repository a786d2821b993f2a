//! Per-point instance masks.
//!
//! An instance mask holds one object ID per mesh vertex, `0` meaning
//! background. It is built once per scene from the segment groups and read
//! back by the annotator to turn picked points into object IDs.

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::constants::BACKGROUND_ID;
use crate::data::loaders::NpyMaskLoader;
use crate::format::{FormatError, write_atomic};
use crate::model::{ObjectId, SegmentAnnotations};

/// What to do when two segment groups claim the same point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Later groups overwrite earlier ones; conflicts are counted and logged.
    #[default]
    LastWriteWins,
    /// Any conflict aborts the build.
    Reject,
}

/// Summary of a mask build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskBuildStats {
    /// Groups written into the mask.
    pub groups: usize,
    /// Groups skipped because they carry neither `objectId` nor `id`.
    pub skipped_groups: usize,
    /// Points assigned a non-background ID.
    pub assigned_points: usize,
    /// Points claimed by two groups with different IDs.
    pub conflicting_points: usize,
}

/// One object ID per mesh point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceMask {
    ids: Array1<ObjectId>,
}

impl InstanceMask {
    /// Mask of `point_count` background entries.
    pub fn zeros(point_count: usize) -> Self {
        Self {
            ids: Array1::from_elem(point_count, BACKGROUND_ID),
        }
    }

    pub fn from_array(ids: Array1<ObjectId>) -> Self {
        Self { ids }
    }

    /// Build a mask from segment groups in input order.
    ///
    /// Every segment index is validated against `point_count`; an index out
    /// of range aborts the build instead of being silently dropped.
    pub fn build(
        segments: &SegmentAnnotations,
        point_count: usize,
        policy: OverlapPolicy,
    ) -> Result<(Self, MaskBuildStats), FormatError> {
        let mut ids = vec![BACKGROUND_ID; point_count];
        let mut owner: Vec<Option<ObjectId>> = vec![None; point_count];
        let mut stats = MaskBuildStats::default();

        for group in &segments.seg_groups {
            let Some(object_id) = group.instance_id() else {
                log::warn!(
                    "Skipping segment group {:?} without objectId/id",
                    group.label.as_deref().unwrap_or_default()
                );
                stats.skipped_groups += 1;
                continue;
            };

            for &index in &group.segments {
                let slot = owner.get_mut(index).ok_or(FormatError::SegmentOutOfBounds {
                    group: object_id,
                    index,
                    point_count,
                })?;
                if let Some(previous) = *slot
                    && previous != object_id
                {
                    if policy == OverlapPolicy::Reject {
                        return Err(FormatError::OverlappingSegments {
                            index,
                            first: previous,
                            second: object_id,
                        });
                    }
                    stats.conflicting_points += 1;
                }
                *slot = Some(object_id);
                ids[index] = object_id;
            }
            stats.groups += 1;
        }

        stats.assigned_points = ids.iter().filter(|&&id| id != BACKGROUND_ID).count();
        if stats.conflicting_points > 0 {
            log::warn!(
                "{} points claimed by more than one object; later groups won",
                stats.conflicting_points
            );
        }

        Ok((Self { ids: Array1::from(ids) }, stats))
    }

    /// Load a mask from a `.npy` file.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        NpyMaskLoader::load_file(path).map(Self::from_array)
    }

    /// Write the mask as `.npy`, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> Result<(), FormatError> {
        let bytes = NpyMaskLoader::to_bytes(&self.ids)?;
        write_atomic(path, &bytes)?;
        log::info!("Saved instance mask with {} points to {:?}", self.len(), path);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ObjectId> {
        self.ids.get(index).copied()
    }

    pub fn as_array(&self) -> &Array1<ObjectId> {
        &self.ids
    }

    /// Fail unless the mask has exactly one entry per mesh point.
    pub fn check_point_count(&self, point_count: usize) -> Result<(), FormatError> {
        if self.len() != point_count {
            return Err(FormatError::ShapeMismatch {
                mask_len: self.len(),
                point_count,
            });
        }
        Ok(())
    }

    /// Object IDs under the picked points.
    ///
    /// Out-of-range indices and background points are ignored; each ID is
    /// reported once, in the order it was first picked.
    pub fn object_ids_at(&self, picked: &[usize]) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        for id in picked.iter().filter_map(|&index| self.get(index)) {
            if id != BACKGROUND_ID && !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Per-point flag: does the point belong to any of `object_ids`.
    pub fn highlight(&self, object_ids: &[ObjectId]) -> Array1<bool> {
        self.ids.mapv(|id| object_ids.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentGroup;
    use ndarray::array;
    use tempfile::TempDir;

    fn groups(list: Vec<SegmentGroup>) -> SegmentAnnotations {
        SegmentAnnotations { seg_groups: list }
    }

    #[test]
    fn test_build_two_groups() {
        let segments = groups(vec![
            SegmentGroup::new(1, "lamp", vec![0, 1, 2]),
            SegmentGroup::new(2, "table", vec![3, 4, 5]),
        ]);
        let (mask, stats) = InstanceMask::build(&segments, 6, OverlapPolicy::default()).unwrap();

        assert_eq!(mask.as_array(), &array![1u32, 1, 1, 2, 2, 2]);
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.assigned_points, 6);
        assert_eq!(stats.conflicting_points, 0);
    }

    #[test]
    fn test_unlisted_points_stay_background() {
        let segments = groups(vec![SegmentGroup::new(7, "door", vec![1])]);
        let (mask, stats) = InstanceMask::build(&segments, 3, OverlapPolicy::default()).unwrap();
        assert_eq!(mask.as_array(), &array![0u32, 7, 0]);
        assert_eq!(stats.assigned_points, 1);
    }

    #[test]
    fn test_last_write_wins() {
        let segments = groups(vec![
            SegmentGroup::new(1, "a", vec![0, 1]),
            SegmentGroup::new(2, "b", vec![1, 2]),
        ]);
        let (mask, stats) =
            InstanceMask::build(&segments, 3, OverlapPolicy::LastWriteWins).unwrap();
        assert_eq!(mask.as_array(), &array![1u32, 2, 2]);
        assert_eq!(stats.conflicting_points, 1);
    }

    #[test]
    fn test_reject_overlap() {
        let segments = groups(vec![
            SegmentGroup::new(1, "a", vec![0, 1]),
            SegmentGroup::new(2, "b", vec![1]),
        ]);
        let result = InstanceMask::build(&segments, 2, OverlapPolicy::Reject);
        assert!(matches!(
            result,
            Err(FormatError::OverlappingSegments { index: 1, first: 1, second: 2 })
        ));
    }

    #[test]
    fn test_same_object_twice_is_not_a_conflict() {
        let segments = groups(vec![
            SegmentGroup::new(4, "a", vec![0]),
            SegmentGroup::new(4, "a", vec![0, 1]),
        ]);
        let (_, stats) = InstanceMask::build(&segments, 2, OverlapPolicy::Reject).unwrap();
        assert_eq!(stats.conflicting_points, 0);
    }

    #[test]
    fn test_out_of_bounds_segment() {
        let segments = groups(vec![SegmentGroup::new(3, "x", vec![0, 6])]);
        let result = InstanceMask::build(&segments, 6, OverlapPolicy::default());
        assert!(matches!(
            result,
            Err(FormatError::SegmentOutOfBounds { group: 3, index: 6, point_count: 6 })
        ));
    }

    #[test]
    fn test_group_without_id_skipped() {
        let mut nameless = SegmentGroup::new(0, "ghost", vec![0]);
        nameless.object_id = None;
        let (mask, stats) =
            InstanceMask::build(&groups(vec![nameless]), 1, OverlapPolicy::default()).unwrap();
        assert_eq!(mask.get(0), Some(0));
        assert_eq!(stats.skipped_groups, 1);
    }

    #[test]
    fn test_object_ids_at() {
        let mask = InstanceMask::from_array(array![0u32, 5, 5, 3, 0, 9]);
        assert_eq!(mask.object_ids_at(&[2, 0, 3, 1, 100, 5]), vec![5, 3, 9]);
        assert!(mask.object_ids_at(&[0, 4]).is_empty());
    }

    #[test]
    fn test_highlight() {
        let mask = InstanceMask::from_array(array![0u32, 5, 3, 5]);
        assert_eq!(mask.highlight(&[5]), array![false, true, false, true]);
    }

    #[test]
    fn test_check_point_count() {
        let mask = InstanceMask::zeros(4);
        assert!(mask.check_point_count(4).is_ok());
        assert!(matches!(
            mask.check_point_count(5),
            Err(FormatError::ShapeMismatch { mask_len: 4, point_count: 5 })
        ));
    }

    #[test]
    fn test_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instance.npy");
        let mask = InstanceMask::from_array(array![0u32, 2, 2, 8]);

        mask.save(&path).unwrap();
        assert_eq!(InstanceMask::load(&path).unwrap(), mask);
    }
}
