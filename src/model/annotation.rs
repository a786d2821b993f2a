//! Canonical annotation record.
//!
//! An annotation ties a natural-language description to the instance IDs the
//! user picked in the scene, optionally together with the camera pose the
//! description was written from. `full_text` is derived from the other fields
//! and is never edited on its own.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::LIST_PREVIEW_CHARS;
use crate::model::camera::CameraPose;

/// Instance ID as stored in the instance mask.
pub type ObjectId = u32;

/// Errors produced when building or editing an annotation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    /// Description is empty after trimming whitespace
    #[error("Description must not be empty")]
    EmptyDescription,
}

/// A single annotation as stored in `<scene>_annotations.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    description: String,
    object_ids: Vec<ObjectId>,
    full_text: String,
    /// Saved viewpoint; `None` means "use the scene default" and is written as `{}`.
    #[serde(default, with = "camera_params_serde")]
    camera_params: Option<CameraPose>,
}

impl Annotation {
    /// Build a new annotation.
    ///
    /// Duplicate IDs are dropped, keeping first occurrence. When `camera` has
    /// a non-empty view label, `full_text` is prefixed with `[label] `.
    pub fn new(
        description: &str,
        object_ids: impl IntoIterator<Item = ObjectId>,
        camera: Option<&CameraPose>,
    ) -> Result<Self, AnnotationError> {
        let description = normalize_description(description)?;

        let mut ids = Vec::new();
        for id in object_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let camera_params = camera.cloned();
        let full_text = compose_full_text(
            &description,
            camera_params.as_ref().and_then(CameraPose::view_label),
            &ids,
        );

        Ok(Self {
            description,
            object_ids: ids,
            full_text,
            camera_params,
        })
    }

    /// Replace the description and regenerate `full_text`.
    ///
    /// Uses the view label of the record's current camera pose and the
    /// unchanged object IDs. Returns `Ok(false)` when the trimmed text equals
    /// the current description. A blank description leaves the record as is.
    pub fn edit(&mut self, description: &str) -> Result<bool, AnnotationError> {
        let description = normalize_description(description)?;
        if description == self.description {
            return Ok(false);
        }

        self.full_text = compose_full_text(&description, self.view_label(), &self.object_ids);
        self.description = description;
        Ok(true)
    }

    /// Replace the saved viewpoint.
    ///
    /// `full_text` keeps the label it was composed with until the next edit.
    pub fn set_camera_params(&mut self, pose: Option<CameraPose>) {
        self.camera_params = pose;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn object_ids(&self) -> &[ObjectId] {
        &self.object_ids
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn camera_params(&self) -> Option<&CameraPose> {
        self.camera_params.as_ref()
    }

    /// Whether a viewpoint is attached.
    pub fn has_camera(&self) -> bool {
        self.camera_params.is_some()
    }

    /// Non-empty view label of the attached viewpoint.
    pub fn view_label(&self) -> Option<&str> {
        self.camera_params.as_ref().and_then(CameraPose::view_label)
    }

    /// One-line rendering for the annotation list (`position` is 0-based).
    pub fn list_label(&self, position: usize) -> String {
        let mut preview: String = self.description.chars().take(LIST_PREVIEW_CHARS).collect();
        if self.description.chars().count() > LIST_PREVIEW_CHARS {
            preview.push_str("...");
        }

        let mut label = match self.view_label() {
            Some(view) => format!("{}. [{}] {}", position + 1, view, preview),
            None => format!("{}. {}", position + 1, preview),
        };
        label.push_str(&format!(" [{}个实例]", self.object_ids.len()));
        if self.has_camera() {
            label.push_str(" 📷");
        }
        label
    }
}

/// Compose the full text: optional `[view] ` prefix, then one ` [id]` per ID.
pub fn compose_full_text(description: &str, view: Option<&str>, object_ids: &[ObjectId]) -> String {
    let mut text = match view {
        Some(view) if !view.is_empty() => format!("[{}] {}", view, description),
        _ => description.to_string(),
    };
    for id in object_ids {
        text.push_str(&format!(" [{}]", id));
    }
    text
}

fn normalize_description(description: &str) -> Result<String, AnnotationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(AnnotationError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// `camera_params` is `{}` on disk when no pose is attached.
mod camera_params_serde {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    use crate::model::camera::CameraPose;

    pub fn serialize<S: Serializer>(pose: &Option<CameraPose>, serializer: S) -> Result<S::Ok, S::Error> {
        match pose {
            Some(pose) => pose.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CameraPose>, D::Error> {
        let stored = Option::<Map<String, Value>>::deserialize(deserializer)?;
        match stored {
            Some(map) if !map.is_empty() => serde_json::from_value(Value::Object(map))
                .map(Some)
                .map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::camera::{IDENTITY_EXTRINSIC, PinholeCameraParameters, PinholeIntrinsic};

    fn pose(label: &str) -> CameraPose {
        let params = PinholeCameraParameters {
            intrinsic: PinholeIntrinsic::new(800, 600, 500.0, 500.0, 399.5, 299.5),
            extrinsic: IDENTITY_EXTRINSIC,
        };
        CameraPose::encode(&params, label)
    }

    #[test]
    fn test_full_text_without_camera() {
        let annotation = Annotation::new("a red chair", [3, 7], None).unwrap();
        assert_eq!(annotation.full_text(), "a red chair [3] [7]");
        assert!(!annotation.has_camera());
    }

    #[test]
    fn test_full_text_with_view_prefix() {
        let annotation = Annotation::new("  the lamp  ", [1], Some(&pose("top-down"))).unwrap();
        assert_eq!(annotation.description(), "the lamp");
        assert_eq!(annotation.full_text(), "[top-down] the lamp [1]");
        assert!(annotation.has_camera());
    }

    #[test]
    fn test_blank_view_label_has_no_prefix() {
        let annotation = Annotation::new("sofa", [2], Some(&pose(""))).unwrap();
        assert_eq!(annotation.full_text(), "sofa [2]");
        assert!(annotation.has_camera());
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let annotation = Annotation::new("x", [5, 2, 5, 2, 9], None).unwrap();
        assert_eq!(annotation.object_ids(), &[5, 2, 9]);
        assert_eq!(annotation.full_text(), "x [5] [2] [9]");
    }

    #[test]
    fn test_new_rejects_blank() {
        assert_eq!(
            Annotation::new(" \n\t", [1], None),
            Err(AnnotationError::EmptyDescription)
        );
    }

    #[test]
    fn test_edit_regenerates_with_current_camera() {
        let mut annotation = Annotation::new("old", [4], Some(&pose("front"))).unwrap();
        annotation.set_camera_params(Some(pose("close-up")));
        // camera change alone leaves full_text alone
        assert_eq!(annotation.full_text(), "[front] old [4]");

        assert_eq!(annotation.edit("new text"), Ok(true));
        assert_eq!(annotation.full_text(), "[close-up] new text [4]");
        assert_eq!(annotation.object_ids(), &[4]);
    }

    #[test]
    fn test_edit_blank_leaves_record_unchanged() {
        let mut annotation = Annotation::new("keep me", [1, 2], None).unwrap();
        let before = annotation.clone();

        assert_eq!(annotation.edit("   "), Err(AnnotationError::EmptyDescription));
        assert_eq!(annotation, before);
    }

    #[test]
    fn test_edit_same_text_is_noop() {
        let mut annotation = Annotation::new("same", [1], None).unwrap();
        assert_eq!(annotation.edit(" same "), Ok(false));
    }

    #[test]
    fn test_list_label() {
        let short = Annotation::new("chair", [1, 2], None).unwrap();
        assert_eq!(short.list_label(0), "1. chair [2个实例]");

        let long_text = "a".repeat(31);
        let long = Annotation::new(&long_text, [1], Some(&pose("top"))).unwrap();
        assert_eq!(
            long.list_label(4),
            format!("5. [top] {}... [1个实例] 📷", "a".repeat(30))
        );
    }

    #[test]
    fn test_empty_camera_params_serialized_as_object() {
        let annotation = Annotation::new("desk", [8], None).unwrap();
        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["camera_params"], serde_json::json!({}));
        assert_eq!(value["object_ids"], serde_json::json!([8]));
        assert_eq!(value["full_text"], "desk [8]");
    }

    #[test]
    fn test_missing_camera_params_backfilled() {
        let json = r#"{"description": "bed", "object_ids": [3], "full_text": "bed [3]"}"#;
        let annotation: Annotation = serde_json::from_str(json).unwrap();
        assert!(annotation.camera_params().is_none());

        let value = serde_json::to_value(&annotation).unwrap();
        assert_eq!(value["camera_params"], serde_json::json!({}));
    }

    #[test]
    fn test_camera_params_roundtrip_json() {
        let annotation = Annotation::new("tv", [6], Some(&pose("side"))).unwrap();
        let json = serde_json::to_string(&annotation).unwrap();
        let loaded: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, annotation);
    }

    #[test]
    fn test_malformed_camera_params_rejected() {
        let json = r#"{"description": "bed", "object_ids": [3], "full_text": "bed [3]",
                       "camera_params": {"view_description": "x"}}"#;
        assert!(serde_json::from_str::<Annotation>(json).is_err());
    }
}
