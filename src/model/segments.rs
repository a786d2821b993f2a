//! Segment-group metadata (`segments_anno.json`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_OBJECT_NAME;
use crate::format::FormatError;
use crate::model::annotation::ObjectId;

/// Contents of `segments_anno.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentAnnotations {
    #[serde(rename = "segGroups", default)]
    pub seg_groups: Vec<SegmentGroup>,
}

/// A named cluster of point indices sharing one object identity.
///
/// Upstream tools write the identity as either `objectId` or `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentGroup {
    #[serde(rename = "objectId", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub segments: Vec<usize>,
}

impl SegmentGroup {
    pub fn new(object_id: ObjectId, label: impl Into<String>, segments: Vec<usize>) -> Self {
        Self {
            object_id: Some(object_id),
            id: None,
            label: Some(label.into()),
            segments,
        }
    }

    /// Whether this group is the given object (via `objectId` or `id`).
    pub fn matches(&self, object_id: ObjectId) -> bool {
        self.object_id == Some(object_id) || self.id == Some(object_id)
    }

    /// Instance ID written into the mask: `objectId`, falling back to `id`.
    pub fn instance_id(&self) -> Option<ObjectId> {
        self.object_id.or(self.id)
    }
}

impl SegmentAnnotations {
    /// Read `segments_anno.json`.
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        if !path.is_file() {
            return Err(FormatError::not_found(path));
        }
        let json = std::fs::read_to_string(path)?;
        let data: Self = serde_json::from_str(&json)?;
        log::debug!("Loaded {} segment groups from {:?}", data.seg_groups.len(), path);
        Ok(data)
    }

    /// Resolve an object ID to its label.
    ///
    /// The first matching group wins; no match or a missing label yields
    /// `"unknown"`.
    pub fn object_name(&self, object_id: ObjectId) -> String {
        self.seg_groups
            .iter()
            .find(|group| group.matches(object_id))
            .map(|group| group.label.as_deref().unwrap_or(UNKNOWN_OBJECT_NAME))
            .unwrap_or(UNKNOWN_OBJECT_NAME)
            .to_string()
    }

    /// Resolve every ID in order.
    pub fn object_names(&self, object_ids: &[ObjectId]) -> Vec<String> {
        let names: Vec<String> = object_ids.iter().map(|&id| self.object_name(id)).collect();
        for (id, name) in object_ids.iter().zip(&names) {
            if name == UNKNOWN_OBJECT_NAME {
                log::warn!("No segment group found for object {}", id);
            }
        }
        names
    }
}
